//! Rendering service tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::KeyError;

/// The rendering variant that produced a cached artifact.
///
/// `png` and `svg` are image services; every other name denotes a
/// text-producing service (MathML, speech text, LaTeX, ...). The same digest
/// rendered by two services is stored under two independent keys.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Service {
    /// PNG raster image.
    Png,
    /// SVG vector image.
    Svg,
    /// Any text-based service, identified by its name.
    Text(TextService),
}

/// Name of a text service.
///
/// Only [`Service::parse`] builds one, so the name is never empty, never
/// `png` or `svg`, and never contains anything but ASCII letters, digits,
/// `-` and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextService(String);

impl TextService {
    /// Returns the service name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TextService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Service {
    /// Parses a service name.
    ///
    /// `"png"` and `"svg"` map to the image variants. Other names must be
    /// non-empty and made of ASCII letters, digits, `-` or `_`, since they are
    /// embedded in the object key's extension.
    pub fn parse(name: &str) -> Result<Self, KeyError> {
        match name {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            "" => Err(KeyError::InvalidService {
                service: String::new(),
                reason: "service name must not be empty".to_string(),
            }),
            other => {
                if let Some(c) = other
                    .chars()
                    .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
                {
                    return Err(KeyError::InvalidService {
                        service: other.to_string(),
                        reason: format!("character '{c}' is not allowed"),
                    });
                }
                Ok(Self::Text(TextService(other.to_string())))
            }
        }
    }

    /// Returns the service name as given by callers.
    pub fn name(&self) -> &str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Text(name) => name.as_str(),
        }
    }
}

impl FromStr for Service {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Service {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Service> for String {
    fn from(service: Service) -> Self {
        match service {
            Service::Text(name) => name.0,
            other => other.name().to_string(),
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Service({})", self.name())
    }
}
