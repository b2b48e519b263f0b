//! Check command implementation.

use crate::cli::CheckArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use pubload_store::SqliteStore;

/// Execute the check command.
///
/// Opens the database (creating the schema if needed), prints row counts and
/// closes the connection.
pub fn execute_check(args: CheckArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let database = config.resolve_database(args.database.as_deref())?;
    let store = SqliteStore::with_busy_timeout(&database, config.database.busy_timeout())?;

    let counts = store.table_counts()?;
    store.close()?;

    if !formatter.is_quiet() {
        println!("{}", formatter.success(&format!("Connected to {}", database)));
    }
    println!("{}", formatter.format_table_counts(&counts)?);
    Ok(())
}
