//! Load command implementation.

use crate::cli::LoadArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use pubload_domain::TagSchema;
use pubload_extractor::RecordExtractor;
use pubload_pipeline::{LoadSummary, Pipeline};
use pubload_reader::{Dtd, ReadError, ReaderOptions, StreamReader};
use pubload_store::{SqlScriptWriter, SqliteStore};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::sync::Arc;
use tracing::info;

/// Execute the load command.
///
/// With `--dry-run` the SQL script goes to stdout and the summary to stderr.
pub fn execute_load(
    args: LoadArgs,
    config: &mut Config,
    formatter: &Formatter,
) -> Result<LoadSummary> {
    config.apply_load_args(&args);
    config.validate()?;

    let database = if args.dry_run {
        None
    } else {
        Some(config.resolve_database(args.database.as_deref())?)
    };

    let mut reader = open_reader(config)?;
    let mut pipeline = build_pipeline(config);

    let outcome = match &database {
        Some(database) => load_into_database(&mut pipeline, &mut reader, config, database),
        None => write_script(&mut pipeline, &mut reader),
    };

    let report = formatter.format_summary(pipeline.summary())?;
    if args.dry_run || outcome.is_err() {
        eprintln!("{}", report);
    } else {
        println!("{}", report);
    }

    outcome
}

fn open_reader(config: &Config) -> Result<StreamReader<BufReader<File>>> {
    let input = config.input.path.as_ref().ok_or_else(|| {
        CliError::InvalidInput("No input document: pass --input or set [input].path".to_string())
    })?;

    let mut options = ReaderOptions {
        validate: config.input.validate,
        ..ReaderOptions::default()
    };
    if let Some(dtd) = &config.input.dtd {
        options.dtd = Some(Dtd::from_path(dtd).map_err(ReadError::from)?);
    }

    info!("Reading {}", input.display());
    Ok(StreamReader::from_path(input, options)?)
}

fn build_pipeline(config: &Config) -> Pipeline {
    let extractor = RecordExtractor::new(Arc::new(TagSchema::dblp()), config.extractor.clone());
    Pipeline::new(extractor, config.pipeline.clone())
}

fn load_into_database(
    pipeline: &mut Pipeline,
    reader: &mut StreamReader<BufReader<File>>,
    config: &Config,
    database: &str,
) -> Result<LoadSummary> {
    let mut store = SqliteStore::with_busy_timeout(database, config.database.busy_timeout())?;
    info!("Loading into {}", database);

    let result = pipeline.run(reader, &mut store);
    let closed = store.close();

    let summary = result?;
    closed?;
    Ok(summary)
}

fn write_script(
    pipeline: &mut Pipeline,
    reader: &mut StreamReader<BufReader<File>>,
) -> Result<LoadSummary> {
    let stdout = io::stdout();
    let mut writer = SqlScriptWriter::new(BufWriter::new(stdout.lock()));
    writer.write_schema()?;

    let result = pipeline.run(reader, &mut writer);
    writer.into_inner().flush()?;
    Ok(result?)
}
