//! Command implementations for logdiff CLI

use crate::cli::{Commands, OutputFormat};
use crate::driver::{DriverOptions, ParseDriver};
use crate::error::{LogdiffError, Result};
use crate::output::{JsonFormatter, PrettyPrinter};
use crate::record::RecordSet;
use crate::schema::Schema;
use crate::snapshot;
use crate::MAX_FAILURE_EXIT_CODE;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Execute a command and return the process exit status
pub fn execute_command(command: Commands, options: DriverOptions) -> Result<i32> {
    let driver = ParseDriver::new(options)?;

    match command {
        Commands::Parse { files, csv, output } => parse_command(&driver, &files, csv, output.as_deref()),
        Commands::Compare {
            golden,
            observed,
            diff,
            csv,
            subset,
            format,
        } => {
            let format = OutputFormat::parse(&format).map_err(LogdiffError::invalid_input)?;
            compare_command(&driver, &golden, &observed, &diff, csv, subset, format)
        }
    }
}

/// Exit status for a number of failing entries: zero when clean, clamped
/// below the fatal status otherwise
pub fn failure_exit_code(failures: usize) -> i32 {
    i32::try_from(failures)
        .unwrap_or(MAX_FAILURE_EXIT_CODE)
        .min(MAX_FAILURE_EXIT_CODE)
}

/// Merge every input into one store and write it as a snapshot
fn parse_command(driver: &ParseDriver, files: &[PathBuf], csv: bool, output: Option<&Path>) -> Result<i32> {
    let store = driver.load_sources(files)?;
    log::info!("Parsed {} records from {} inputs", store.len(), files.len());

    match output {
        Some(path) => write_records(driver.schema(), store.records(), csv, File::create(path)?)?,
        None => write_records(driver.schema(), store.records(), csv, io::stdout().lock())?,
    }
    Ok(0)
}

/// Diff observed against golden, report, and write the accepted records
fn compare_command(
    driver: &ParseDriver,
    golden: &Path,
    observed: &Path,
    diff_file: &Path,
    csv: bool,
    subset: bool,
    format: OutputFormat,
) -> Result<i32> {
    let expected = driver.load_sources(&[golden])?;
    let got = driver.load_sources(&[observed])?;
    let report = driver.do_diff(expected.records(), got.records())?;

    match format {
        OutputFormat::Pretty => PrettyPrinter::print_report(&report, subset),
        OutputFormat::Json => println!("{}", JsonFormatter::format_report(&report)?),
    }

    let accepted = report.accepted_records(subset);
    write_records(driver.schema(), &accepted, csv, File::create(diff_file)?)?;

    let failures = report.failure_count(subset);
    if failures > 0 {
        log::info!("{} of {} entries failed", failures, report.len());
    }
    Ok(failure_exit_code(failures))
}

fn write_records<W: Write>(schema: &Schema, records: &RecordSet, csv: bool, writer: W) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    if csv {
        snapshot::write_table(schema, records, &mut writer)?;
    } else {
        snapshot::write_json(schema, records, &mut writer)?;
    }
    writer.flush()?;
    Ok(())
}
