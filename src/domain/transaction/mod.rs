use rust_decimal::Decimal;
use serde::Deserialize;

use super::{
    amount,
    error::{Error, Result},
};

/// Accounting purpose of a statement row, taken from the `CD.OPER` column.
#[derive(Debug, Deserialize, Hash, PartialEq, Eq, Clone)]
#[serde(from = "String")]
pub enum OperationCode {
    /// `1318`: marketplace liquidation credit.
    Liquidation,
    /// `1321`: commission and tax debit.
    Commission,
    /// `1322`: adjustment credit.
    Adjustment,
    /// `1326`: manual write-off debit.
    ManualWriteOff,
    Other(String),
}

impl From<String> for OperationCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "1318" => Self::Liquidation,
            "1321" => Self::Commission,
            "1322" => Self::Adjustment,
            "1326" => Self::ManualWriteOff,
            _ => Self::Other(code),
        }
    }
}

impl From<&str> for OperationCode {
    fn from(code: &str) -> Self {
        Self::from(code.to_owned())
    }
}

/// One row of the bank-statement export, exactly as loaded.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Transaction {
    pub document_id: String,
    pub operation_code: OperationCode,
    pub credit_amount: Decimal,
    pub debit_amount: Decimal,
}

/// Raw statement row; every field is text until amounts are parsed.
#[derive(Debug, Deserialize)]
pub(crate) struct StatementRow {
    #[serde(rename = "NR. DOC")]
    document_id: String,
    #[serde(rename = "CD.OPER")]
    operation_code: OperationCode,
    #[serde(rename = "CREDITO")]
    credit: String,
    #[serde(rename = "DEBITO")]
    debit: String,
}

impl TryFrom<StatementRow> for Transaction {
    type Error = Error;

    fn try_from(row: StatementRow) -> Result<Self> {
        let parse = |value: &str| {
            amount::parse(value).map_err(|_| Error::AmountOutOfRange {
                document: row.document_id.clone(),
                value: value.to_owned(),
            })
        };
        let credit_amount = parse(&row.credit)?;
        let debit_amount = parse(&row.debit)?;

        Ok(Transaction {
            document_id: row.document_id,
            operation_code: row.operation_code,
            credit_amount,
            debit_amount,
        })
    }
}
