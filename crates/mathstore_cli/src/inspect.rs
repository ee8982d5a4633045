//! `mathstore digest` and `mathstore keys`: key computation without a store.

use mathstore_common::{
    cache_key, content_type_of, folder_of, formula_key, Digest, Service, DIGEST_ALGORITHM,
};
use serde_json::json;

use crate::stream::read_input;
use crate::{KeysArgs, ReportFormat};

/// Prints the digest of the input content.
pub fn digest(input: &str) -> Result<i32, Box<dyn std::error::Error>> {
    let content = read_input(input)?;
    println!("{}", Digest::compute(&content));
    Ok(0)
}

/// Prints the folder, formula key and optionally the artifact key of a digest.
pub fn keys(args: &KeysArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let digest = Digest::parse(&args.digest)?;
    let service = args.service.as_deref().map(Service::parse).transpose()?;

    match args.format {
        ReportFormat::Text => {
            println!("folder:  {}", folder_of(&digest));
            println!("formula: {}", formula_key(&digest));
            if let Some(service) = &service {
                println!("cache:   {}", cache_key(&digest, service));
                println!("type:    {}", content_type_of(service));
            }
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&keys_json(&digest, service.as_ref()))?);
        }
    }
    Ok(0)
}

fn keys_json(digest: &Digest, service: Option<&Service>) -> serde_json::Value {
    let mut value = json!({
        "algorithm": DIGEST_ALGORITHM,
        "digest": digest.as_str(),
        "folder": folder_of(digest),
        "formula_key": formula_key(digest),
    });
    if let Some(service) = service {
        value["service"] = json!(service.name());
        value["cache_key"] = json!(cache_key(digest, service));
        value["content_type"] = json!(content_type_of(service));
    }
    value
}
