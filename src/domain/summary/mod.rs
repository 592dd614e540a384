use std::collections::HashMap;

use indexmap::IndexMap;
use itertools::Itertools;
use rust_decimal::Decimal;
use tracing::debug;

use super::{
    error::{Error, Result},
    transaction::{OperationCode, Transaction},
};

/// Reconciliation rule applied to each document group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Rule {
    /// Liquidation, commission and adjustment codes, deducting manual
    /// write-offs (`1326`) from the first liquidation when present.
    #[default]
    WriteOff,
    /// Earlier rule: groups holding `1318`, `1321` and `1322`, reported as
    /// the plain credit and debit sums of every row.
    ThreeCode,
}

/// Reconciled totals of one document group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub document_id: String,
    pub credit_total: Decimal,
    pub debit_total: Decimal,
    pub commission_tax_difference: Decimal,
    pub liquidation_marketplace: Decimal,
    pub writeoff_marketplace: Decimal,
    pub manual_writeoff_difference: Decimal,
}

/// Partition transactions by document number, keeping groups in the order
/// they first appear and rows in input order.
///
/// Rows without a document number belong to no group and are skipped.
pub fn group_by_document(
    txns: impl IntoIterator<Item = Transaction>,
) -> IndexMap<String, Vec<Transaction>> {
    let (groups, skipped) = txns.into_iter().fold(
        (IndexMap::new(), 0usize),
        |(mut groups, skipped), tx| {
            if tx.document_id.trim().is_empty() {
                return (groups, skipped + 1);
            }
            groups
                .entry(tx.document_id.clone())
                .or_insert_with(Vec::new)
                .push(tx);
            (groups, skipped)
        },
    );

    if skipped > 0 {
        debug!(rows = skipped, "skipping rows without a document number");
    }
    groups
}

impl Summary {
    /// Group transactions by document and reduce every qualifying group to a
    /// summary. Groups that don't qualify under `rule` are dropped.
    ///
    /// Fails when a group's totals leave the [`Decimal`] range.
    pub fn from_transactions(
        rule: Rule,
        txns: impl IntoIterator<Item = Transaction>,
    ) -> Result<Vec<Self>> {
        group_by_document(txns)
            .into_iter()
            .filter_map(|(document_id, txns)| {
                let summary = match rule {
                    Rule::WriteOff => Self::reconcile_write_off(&document_id, &txns),
                    Rule::ThreeCode => Self::reconcile_three_code(&document_id, &txns),
                };
                if matches!(summary, Ok(None)) {
                    debug!(document = %document_id, rows = txns.len(), "dropping unqualified group");
                }
                summary.transpose()
            })
            .collect()
    }

    fn reconcile_write_off(document_id: &str, txns: &[Transaction]) -> Result<Option<Summary>> {
        let codes = CodeGroups::new(txns);
        let has_write_off = codes.has(&OperationCode::ManualWriteOff);

        let qualifies = codes.has(&OperationCode::Liquidation)
            && (has_write_off
                || (codes.has(&OperationCode::Commission) && codes.has(&OperationCode::Adjustment)));
        if !qualifies {
            return Ok(None);
        }

        let liquidations = codes.rows(&OperationCode::Liquidation);
        let Some((first_liquidation, other_liquidations)) = liquidations.split_first() else {
            return Ok(None);
        };

        let overflow = || Error::AmountOverflow {
            document: document_id.to_owned(),
        };
        let adjustment_credit = credit(codes.rows(&OperationCode::Adjustment)).ok_or_else(overflow)?;

        let (liquidation_marketplace, writeoff_marketplace, liquidation_credit) = if has_write_off {
            (
                first_liquidation.credit_amount,
                debit(codes.rows(&OperationCode::ManualWriteOff)).ok_or_else(overflow)?,
                credit(other_liquidations).ok_or_else(overflow)?,
            )
        } else {
            (
                Decimal::ZERO,
                Decimal::ZERO,
                credit(liquidations).ok_or_else(overflow)?,
            )
        };

        let credit_total = liquidation_credit
            .checked_add(adjustment_credit)
            .ok_or_else(overflow)?;
        let manual_writeoff_difference = liquidation_marketplace
            .checked_sub(writeoff_marketplace)
            .ok_or_else(overflow)?;
        let debit_total = debit(codes.rows(&OperationCode::Commission)).ok_or_else(overflow)?;
        let commission_tax_difference = manual_writeoff_difference
            .checked_add(credit_total)
            .and_then(|total| total.checked_sub(debit_total))
            .ok_or_else(overflow)?;

        Ok(Some(Summary {
            document_id: document_id.to_owned(),
            credit_total,
            debit_total,
            commission_tax_difference,
            liquidation_marketplace,
            writeoff_marketplace,
            manual_writeoff_difference,
        }))
    }

    fn reconcile_three_code(document_id: &str, txns: &[Transaction]) -> Result<Option<Summary>> {
        let codes = CodeGroups::new(txns);
        let qualifies = [
            OperationCode::Liquidation,
            OperationCode::Commission,
            OperationCode::Adjustment,
        ]
        .iter()
        .all(|code| codes.has(code));
        if !qualifies {
            return Ok(None);
        }

        let overflow = || Error::AmountOverflow {
            document: document_id.to_owned(),
        };
        let credit_total = checked_sum(txns.iter().map(|tx| tx.credit_amount)).ok_or_else(overflow)?;
        let debit_total = checked_sum(txns.iter().map(|tx| tx.debit_amount)).ok_or_else(overflow)?;
        let difference = credit_total.checked_sub(debit_total).ok_or_else(overflow)?;

        Ok(Some(Summary {
            document_id: document_id.to_owned(),
            credit_total,
            debit_total,
            commission_tax_difference: difference,
            liquidation_marketplace: Decimal::ZERO,
            writeoff_marketplace: Decimal::ZERO,
            manual_writeoff_difference: Decimal::ZERO,
        }))
    }
}

/// Rows of a single group indexed by operation code, each in group order.
struct CodeGroups<'a>(HashMap<&'a OperationCode, Vec<&'a Transaction>>);

impl<'a> CodeGroups<'a> {
    fn new(txns: &'a [Transaction]) -> Self {
        Self(
            txns.iter()
                .map(|tx| (&tx.operation_code, tx))
                .into_group_map(),
        )
    }

    fn has(&self, code: &OperationCode) -> bool {
        self.0.contains_key(code)
    }

    fn rows(&self, code: &OperationCode) -> &[&'a Transaction] {
        self.0.get(code).map(Vec::as_slice).unwrap_or_default()
    }
}

/// `None` on overflow.
fn checked_sum(amounts: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
}

fn credit(rows: &[&Transaction]) -> Option<Decimal> {
    checked_sum(rows.iter().map(|tx| tx.credit_amount))
}

fn debit(rows: &[&Transaction]) -> Option<Decimal> {
    checked_sum(rows.iter().map(|tx| tx.debit_amount))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn tx(document_id: &str, code: &str, credit: Decimal, debit: Decimal) -> Transaction {
        Transaction {
            document_id: document_id.to_string(),
            operation_code: OperationCode::from(code),
            credit_amount: credit,
            debit_amount: debit,
        }
    }

    fn reconcile(rule: Rule, txns: Vec<Transaction>) -> Vec<Summary> {
        Summary::from_transactions(rule, txns).unwrap()
    }

    fn documents(summaries: &[Summary]) -> Vec<&str> {
        summaries.iter().map(|s| s.document_id.as_str()).collect()
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let groups = group_by_document(vec![
            tx("B", "1318", dec!(1), dec!(0)),
            tx("A", "1318", dec!(2), dec!(0)),
            tx("B", "1321", dec!(0), dec!(3)),
            tx("C", "1322", dec!(4), dec!(0)),
            tx("A", "1326", dec!(0), dec!(5)),
        ]);

        assert_eq!(groups.keys().collect::<Vec<_>>(), ["B", "A", "C"]);
        assert_eq!(
            groups["B"]
                .iter()
                .map(|tx| tx.operation_code.clone())
                .collect::<Vec<_>>(),
            [OperationCode::Liquidation, OperationCode::Commission]
        );
    }

    #[test]
    fn liquidation_with_commission_and_adjustment_skips_write_off() {
        let summaries = reconcile(
            Rule::WriteOff,
            vec![
                tx("100", "1318", dec!(1000.00), dec!(0)),
                tx("100", "1321", dec!(0), dec!(50.00)),
                tx("100", "1322", dec!(20.00), dec!(0)),
            ],
        );

        assert_eq!(
            summaries,
            [Summary {
                document_id: "100".to_string(),
                credit_total: dec!(1020.00),
                debit_total: dec!(50.00),
                commission_tax_difference: dec!(970.00),
                liquidation_marketplace: Decimal::ZERO,
                writeoff_marketplace: Decimal::ZERO,
                manual_writeoff_difference: Decimal::ZERO,
            }]
        );
    }

    #[test]
    fn manual_write_off_deducts_from_first_liquidation() {
        let summaries = reconcile(
            Rule::WriteOff,
            vec![
                tx("200", "1318", dec!(500.00), dec!(0)),
                tx("200", "1318", dec!(300.00), dec!(0)),
                tx("200", "1326", dec!(0), dec!(500.00)),
            ],
        );

        assert_eq!(
            summaries,
            [Summary {
                document_id: "200".to_string(),
                credit_total: dec!(300.00),
                debit_total: Decimal::ZERO,
                commission_tax_difference: dec!(300.00),
                liquidation_marketplace: dec!(500.00),
                writeoff_marketplace: dec!(500.00),
                manual_writeoff_difference: Decimal::ZERO,
            }]
        );
    }

    #[test]
    fn write_off_combines_every_code() {
        let summaries = reconcile(
            Rule::WriteOff,
            vec![
                tx("300", "1321", dec!(0), dec!(12.50)),
                tx("300", "1318", dec!(400.00), dec!(0)),
                tx("300", "1326", dec!(0), dec!(150.00)),
                tx("300", "1322", dec!(7.25), dec!(0)),
                tx("300", "1318", dec!(80.00), dec!(0)),
                tx("300", "1326", dec!(0), dec!(100.00)),
                tx("300", "9999", dec!(1000.00), dec!(1000.00)),
            ],
        );

        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!(summary.liquidation_marketplace, dec!(400.00));
        assert_eq!(summary.writeoff_marketplace, dec!(250.00));
        assert_eq!(summary.manual_writeoff_difference, dec!(150.00));
        assert_eq!(summary.credit_total, dec!(87.25));
        assert_eq!(summary.debit_total, dec!(12.50));
        assert_eq!(summary.commission_tax_difference, dec!(224.75));
    }

    #[test]
    fn write_off_qualification_per_code_combination() {
        let summaries = reconcile(
            Rule::WriteOff,
            vec![
                // 1318 + 1321 + 1322
                tx("full", "1318", dec!(10), dec!(0)),
                tx("full", "1321", dec!(0), dec!(1)),
                tx("full", "1322", dec!(2), dec!(0)),
                // 1318 + 1326
                tx("manual", "1318", dec!(10), dec!(0)),
                tx("manual", "1326", dec!(0), dec!(10)),
                // 1318 + 1321 only
                tx("no-adjustment", "1318", dec!(10), dec!(0)),
                tx("no-adjustment", "1321", dec!(0), dec!(1)),
                // 1321 + 1322 + 1326 without a liquidation
                tx("no-liquidation", "1321", dec!(0), dec!(1)),
                tx("no-liquidation", "1322", dec!(2), dec!(0)),
                tx("no-liquidation", "1326", dec!(0), dec!(3)),
                // unrelated codes
                tx("other", "1000", dec!(5), dec!(5)),
            ],
        );

        assert_eq!(documents(&summaries), ["full", "manual"]);
    }

    #[test]
    fn three_code_sums_every_row() {
        let summaries = reconcile(
            Rule::ThreeCode,
            vec![
                tx("100", "1318", dec!(1000.00), dec!(0)),
                tx("100", "1321", dec!(0), dec!(50.00)),
                tx("100", "1322", dec!(20.00), dec!(0)),
                tx("100", "1326", dec!(0), dec!(30.00)),
                tx("100", "4000", dec!(5.00), dec!(1.00)),
            ],
        );

        assert_eq!(
            summaries,
            [Summary {
                document_id: "100".to_string(),
                credit_total: dec!(1025.00),
                debit_total: dec!(81.00),
                commission_tax_difference: dec!(944.00),
                liquidation_marketplace: Decimal::ZERO,
                writeoff_marketplace: Decimal::ZERO,
                manual_writeoff_difference: Decimal::ZERO,
            }]
        );
    }

    #[test]
    fn three_code_ignores_manual_write_off_groups() {
        let summaries = reconcile(
            Rule::ThreeCode,
            vec![
                tx("200", "1318", dec!(500), dec!(0)),
                tx("200", "1326", dec!(0), dec!(500)),
                tx("300", "1318", dec!(1), dec!(0)),
                tx("300", "1321", dec!(0), dec!(1)),
                tx("300", "1322", dec!(1), dec!(0)),
            ],
        );

        assert_eq!(documents(&summaries), ["300"]);
    }

    #[test]
    fn rows_without_document_number_are_skipped() {
        let groups = group_by_document(vec![
            tx("", "1318", dec!(10), dec!(0)),
            tx("100", "1318", dec!(1), dec!(0)),
            tx("  ", "1326", dec!(0), dec!(5)),
        ]);
        assert_eq!(groups.keys().collect::<Vec<_>>(), ["100"]);

        let summaries = reconcile(
            Rule::WriteOff,
            vec![
                tx("", "1318", dec!(10.00), dec!(0)),
                tx("", "1326", dec!(0), dec!(5.00)),
            ],
        );
        assert!(summaries.is_empty());
    }

    #[test]
    fn totals_beyond_decimal_range_are_an_error() {
        let txns = vec![
            tx("1", "1318", Decimal::MAX, dec!(0)),
            tx("1", "1322", Decimal::MAX, dec!(0)),
            tx("1", "1321", dec!(0), dec!(1.00)),
        ];

        for rule in [Rule::WriteOff, Rule::ThreeCode] {
            let err = Summary::from_transactions(rule, txns.clone()).unwrap_err();
            assert!(matches!(
                err,
                Error::AmountOverflow { ref document } if document == "1"
            ));
        }
    }

    #[test]
    fn write_off_difference_below_decimal_range_is_an_error() {
        let err = Summary::from_transactions(
            Rule::WriteOff,
            vec![
                tx("2", "1318", Decimal::MIN, dec!(0)),
                tx("2", "1326", dec!(0), dec!(1)),
            ],
        )
        .unwrap_err();

        assert!(matches!(err, Error::AmountOverflow { .. }));
    }

    #[test]
    fn empty_input_has_no_summaries() {
        assert!(reconcile(Rule::default(), Vec::new()).is_empty());
    }
}
