//! `promote` command: copy raw tables into staging tables

use std::path::PathBuf;

use super::open_configured_database;
use crate::cli::error::CliError;
use crate::cli::output::format_promotions;
use crate::promote::promote_all;

/// Arguments for the `promote` command
pub struct PromoteArgs {
    /// Path to the database configuration file
    pub database_config: PathBuf,
    /// Print results as JSON
    pub json: bool,
}

/// Handle the `promote` command
pub fn handle_promote(args: &PromoteArgs) -> Result<(), CliError> {
    let mut db = open_configured_database(&args.database_config)?;
    let results = promote_all(&mut db)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", format_promotions(&results));
    }

    let failed = results.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        return Err(CliError::PromotionFailed {
            failed,
            total: results.len(),
        });
    }
    Ok(())
}
