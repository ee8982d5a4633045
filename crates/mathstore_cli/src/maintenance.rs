//! `mathstore delete-cache`: wipe every stored object.

use mathstore_cache::DeleteReport;
use serde_json::json;

use crate::{open_store, DeleteCacheArgs, GlobalArgs, ReportFormat};

/// Deletes every object in the store and reports how many went away.
///
/// Refuses to run without `--yes`. An incomplete sweep exits with code 1.
pub async fn delete_cache(
    args: &DeleteCacheArgs,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    if !args.yes {
        eprintln!(
            "error: delete-cache removes every stored formula and artifact; pass --yes to confirm"
        );
        return Ok(1);
    }

    let store = open_store(global)?;
    let report = store.delete_cache().await?;

    match args.format {
        ReportFormat::Text => {
            if !global.quiet {
                eprintln!("     Deleted {} object(s)", report.deleted);
            }
            if let Some(err) = &report.error {
                eprintln!("error: delete sweep stopped early: {err}");
            }
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
        }
    }

    Ok(if report.is_complete() { 0 } else { 1 })
}

fn report_json(report: &DeleteReport) -> serde_json::Value {
    json!({
        "deleted": report.deleted,
        "complete": report.is_complete(),
        "error": report.error.as_ref().map(ToString::to_string),
    })
}
