use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not open statement file {}: {source}", path.display())]
    FileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("statement is missing required column `{0}`")]
    MissingColumn(&'static str),
    #[error(transparent)]
    AmountError(#[from] crate::domain::error::Error),
    #[error("could not parse CSV rows to transaction: {0}")]
    CsvError(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("could not create output file {}: {source}", path.display())]
    FileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not serialize summary rows: {0}")]
    CsvError(#[from] csv::Error),
    #[error("could not write summary rows: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error(transparent)]
    BusinessError(#[from] crate::domain::error::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
