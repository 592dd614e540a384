use std::io::{Read, Write};

use csv::{ReaderBuilder, StringRecord, Terminator, Trim, WriterBuilder};
use serde::Serialize;
use tracing::debug;

use crate::{
    domain::{
        amount,
        summary::{Rule, Summary},
        transaction::{StatementRow, Transaction},
    },
    error::{LoadError, WriteError},
};

const DELIMITER: u8 = b';';
const BOM: &str = "\u{feff}";

const REQUIRED_COLUMNS: [&str; 4] = ["NR. DOC", "CD.OPER", "CREDITO", "DEBITO"];

const WRITE_OFF_HEADER: [&str; 7] = [
    "NR. DOC",
    "CREDITO",
    "DEBITO",
    "DIFERENCA_TX-COMISSAO",
    "LIQ_MARKETPLACE",
    "BX_MARKETPLACE",
    "DIFERENCA_BX-MANUAL",
];

const THREE_CODE_HEADER: [&str; 4] = ["NR. DOC", "CREDITO", "DEBITO", "DIFERENCA"];

/// Parse [`Transaction`]s from a semicolon-delimited statement export.
///
/// Only the `NR. DOC`, `CD.OPER`, `CREDITO` and `DEBITO` columns are read,
/// any other column is ignored. A missing required column or a malformed
/// row fails the whole load.
pub fn read(reader: impl Read) -> Result<Vec<Transaction>, LoadError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .trim(Trim::All)
        .from_reader(reader);

    let headers: StringRecord = reader
        .headers()?
        .iter()
        .map(|header| header.trim_start_matches(BOM).trim())
        .collect();

    if let Some(column) = REQUIRED_COLUMNS
        .into_iter()
        .find(|column| !headers.iter().any(|header| header == *column))
    {
        return Err(LoadError::MissingColumn(column));
    }
    reader.set_headers(headers);

    let txns = reader
        .into_deserialize::<StatementRow>()
        .map(|row| -> Result<Transaction, LoadError> { Ok(Transaction::try_from(row?)?) })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(rows = txns.len(), "parsed statement rows");
    Ok(txns)
}

#[derive(Serialize)]
struct WriteOffRow<'a> {
    document_id: &'a str,
    credit_total: String,
    debit_total: String,
    commission_tax_difference: String,
    liquidation_marketplace: String,
    writeoff_marketplace: String,
    manual_writeoff_difference: String,
}

impl<'a> From<&'a Summary> for WriteOffRow<'a> {
    fn from(summary: &'a Summary) -> Self {
        WriteOffRow {
            document_id: &summary.document_id,
            credit_total: amount::format(summary.credit_total),
            debit_total: amount::format(summary.debit_total),
            commission_tax_difference: amount::format(summary.commission_tax_difference),
            liquidation_marketplace: amount::format(summary.liquidation_marketplace),
            writeoff_marketplace: amount::format(summary.writeoff_marketplace),
            manual_writeoff_difference: amount::format(summary.manual_writeoff_difference),
        }
    }
}

#[derive(Serialize)]
struct ThreeCodeRow<'a> {
    document_id: &'a str,
    credit_total: String,
    debit_total: String,
    difference: String,
}

impl<'a> From<&'a Summary> for ThreeCodeRow<'a> {
    fn from(summary: &'a Summary) -> Self {
        ThreeCodeRow {
            document_id: &summary.document_id,
            credit_total: amount::format(summary.credit_total),
            debit_total: amount::format(summary.debit_total),
            difference: amount::format(summary.commission_tax_difference),
        }
    }
}

/// Write the summary report: a UTF-8 BOM, the header for `rule` and one
/// row per summary. The header is written even when there are no rows.
pub fn write(rule: Rule, summaries: &[Summary], mut writer: impl Write) -> Result<(), WriteError> {
    writer.write_all(BOM.as_bytes())?;

    let mut writer = WriterBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    match rule {
        Rule::WriteOff => {
            writer.write_record(WRITE_OFF_HEADER)?;
            for summary in summaries {
                writer.serialize(WriteOffRow::from(summary))?;
            }
        }
        Rule::ThreeCode => {
            writer.write_record(THREE_CODE_HEADER)?;
            for summary in summaries {
                writer.serialize(ThreeCodeRow::from(summary))?;
            }
        }
    }

    writer.flush()?;
    Ok(())
}
