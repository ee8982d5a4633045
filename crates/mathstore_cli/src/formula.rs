//! `mathstore code` and `mathstore decode`: formula source by digest.

use mathstore_common::Digest;

use crate::stream::{read_input, write_output};
use crate::{open_store, DecodeArgs, GlobalArgs, EXIT_MISS};

/// Stores the input as formula source and prints its digest.
pub async fn code(input: &str, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let content = read_input(input)?;
    let store = open_store(global)?;
    let digest = store.code_digest(&content).await?;
    println!("{digest}");
    Ok(0)
}

/// Writes the formula source stored for a digest.
pub async fn decode(
    args: &DecodeArgs,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let digest = Digest::parse(&args.digest)?;
    let store = open_store(global)?;
    match store.decode_digest(&digest).await? {
        Some(content) => {
            write_output(args.output.as_deref(), &content)?;
            Ok(0)
        }
        None => {
            if !global.quiet {
                eprintln!("no formula stored for {digest}");
            }
            Ok(EXIT_MISS)
        }
    }
}
