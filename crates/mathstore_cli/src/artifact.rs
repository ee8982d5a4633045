//! `mathstore store` and `mathstore retrieve`: rendered artifacts.

use mathstore_common::{Digest, Service};

use crate::stream::{read_input, write_output};
use crate::{open_store, GlobalArgs, RetrieveArgs, StoreArgs, EXIT_MISS};

/// Stores the input as the artifact of a digest and service.
pub async fn store(
    args: &StoreArgs,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let digest = Digest::parse(&args.digest)?;
    let service = Service::parse(&args.service)?;
    let data = read_input(&args.input)?;
    let store = open_store(global)?;
    store.store_data(&digest, &service, &data).await?;
    tracing::debug!(%digest, service = service.name(), bytes = data.len(), "stored artifact");
    Ok(0)
}

/// Writes the artifact cached for a digest and service.
pub async fn retrieve(
    args: &RetrieveArgs,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let digest = Digest::parse(&args.digest)?;
    let service = Service::parse(&args.service)?;
    let store = open_store(global)?;
    match store.retrieve_data(&digest, &service).await? {
        Some(data) => {
            write_output(args.output.as_deref(), &data)?;
            Ok(0)
        }
        None => {
            if !global.quiet {
                eprintln!("no {} artifact cached for {digest}", service.name());
            }
            Ok(EXIT_MISS)
        }
    }
}
