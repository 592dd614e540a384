use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("amount `{value}` of document {document} is out of range")]
    AmountOutOfRange { document: String, value: String },
    #[error("totals of document {document} overflow the amount range")]
    AmountOverflow { document: String },
}

pub type Result<T> = std::result::Result<T, Error>;
