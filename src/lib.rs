//! Reconcile marketplace bank-statement exports by document number.
//!
//! A statement is loaded from a `;`-delimited file, its rows are grouped by
//! `NR. DOC` and every group holding a qualifying combination of operation
//! codes is reduced to one [`Summary`] row of the output report.

use std::{fs::File, io::BufReader, path::Path};

use tracing::info;

pub mod csv;
pub mod domain;
pub mod error;

pub use domain::{
    summary::{Rule, Summary},
    transaction::{OperationCode, Transaction},
};
pub use error::{Error, LoadError, Result, WriteError};

/// Run the whole reconciliation and return the number of summary rows
/// written.
///
/// The report is rendered in memory first, the output file is only created
/// once every row is ready.
pub fn process(input: &Path, output: &Path, rule: Rule) -> Result<usize> {
    let file = File::open(input).map_err(|source| LoadError::FileError {
        path: input.to_path_buf(),
        source,
    })?;
    let txns = crate::csv::read(BufReader::new(file))?;
    info!(rows = txns.len(), input = %input.display(), "statement loaded");

    let summaries = Summary::from_transactions(rule, txns)?;
    info!(groups = summaries.len(), ?rule, "statement reconciled");

    let mut report = Vec::new();
    crate::csv::write(rule, &summaries, &mut report)?;
    std::fs::write(output, report).map_err(|source| WriteError::FileError {
        path: output.to_path_buf(),
        source,
    })?;
    info!(output = %output.display(), "report written");

    Ok(summaries.len())
}

/// [`process`] for the command line: reports the outcome on the console
/// and returns whether the run succeeded.
pub fn run(input: &Path, output: &Path, rule: Rule) -> bool {
    match process(input, output, rule) {
        Ok(rows) => {
            println!("{}", confirmation(output, rows));
            true
        }
        Err(err) => {
            eprintln!("error: {err}");
            false
        }
    }
}

fn confirmation(output: &Path, rows: usize) -> String {
    format!(
        "Arquivo '{}' gerado com sucesso no formato BR ({rows} documentos conciliados)",
        output.display()
    )
}
