//! CSV import: reads bank exports with arbitrary headers and normalizes rows
//!
//! Banks disagree on column names (`Description` vs `Transaction Description`,
//! `DR/CR` vs `Type`), so each field is looked up through an ordered alias list.
//! Normalization never rejects a row: missing or malformed values fall back to
//! defaults instead.

use std::io::Read;
use std::sync::LazyLock;

use csv::{ReaderBuilder, Trim};
use regex::Regex;
use tracing::debug;

use crate::categorize::categorize;
use crate::error::Result;
use crate::models::{AnnotatedRow, DrCr, RawRow, Transaction, DEFAULT_BALANCE, UNKNOWN_DATE};

const DESCRIPTION_COLUMNS: &[&str] = &[
    "Description",
    "description",
    "Transaction Description",
    "Narration",
    "Particulars",
];

/// `Transaction Amount` is the more specific column and wins when both exist
const AMOUNT_COLUMNS: &[&str] = &["Transaction Amount", "Amount", "amount"];

const DATE_COLUMNS: &[&str] = &[
    "Date",
    "date",
    "Transaction Date",
    "Txn Date",
    "Value Date",
];

const DRCR_COLUMNS: &[&str] = &["DR/CR", "Dr/Cr", "drcr", "DrCr", "Type"];

const BALANCE_COLUMNS: &[&str] = &[
    "Balance",
    "balance",
    "Running Balance",
    "Closing Balance",
    "Running Bal.",
];

/// Read every CSV record into a `RawRow` keyed by the header line
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut rows = Vec::new();

    for result in rdr.records() {
        let record = result?;
        let columns = headers
            .iter()
            .enumerate()
            .filter_map(|(i, header)| {
                record
                    .get(i)
                    .map(|value| (header.to_string(), value.to_string()))
            })
            .collect();
        rows.push(RawRow::new(columns));
    }

    debug!("Read {} CSV rows", rows.len());
    Ok(rows)
}

/// Normalize one raw row into a `Transaction`
pub fn normalize_row(row: &RawRow) -> Transaction {
    let description = row.get(DESCRIPTION_COLUMNS).map(str::to_string);

    let amount = row.get(AMOUNT_COLUMNS).and_then(parse_amount).unwrap_or(0.0).abs();

    let date = row
        .get(DATE_COLUMNS)
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_DATE.to_string());

    let drcr = row.get(DRCR_COLUMNS).map(DrCr::from_marker).unwrap_or_default();

    let balance = row
        .get(BALANCE_COLUMNS)
        .and_then(parse_amount)
        .unwrap_or(DEFAULT_BALANCE);

    Transaction {
        description,
        amount,
        date,
        drcr,
        balance,
    }
}

/// Parse CSV data into normalized transactions
pub fn parse_transactions<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let transactions: Vec<Transaction> = read_rows(reader)?.iter().map(normalize_row).collect();
    debug!("Normalized {} transactions", transactions.len());
    Ok(transactions)
}

/// Parse CSV data and tag every row with a keyword category
///
/// Rows are returned as read, plus a `Category` column.
pub fn annotate_rows<R: Read>(reader: R) -> Result<Vec<AnnotatedRow>> {
    let rows = read_rows(reader)?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let category = categorize(row.get(&["Description"]).unwrap_or(""));
            AnnotatedRow { row, category }
        })
        .collect())
}

/// Parse a money string, tolerating currency symbols and thousands separators
///
/// Returns None if nothing numeric is found.
fn parse_amount(s: &str) -> Option<f64> {
    let cleaned = s.replace(',', "");
    let m = NUMBER.find(&cleaned)?;

    // A minus sign before the number ("-₹300") or accounting parens ("(300)")
    let prefix = &cleaned[..m.start()];
    let trimmed = cleaned.trim();
    let negative = prefix.contains('-') || (trimmed.starts_with('(') && trimmed.ends_with(')'));

    let value: f64 = m.as_str().parse().ok()?;
    Some(if negative { -value } else { value })
}

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?(?:\d+(?:\.\d+)?|\.\d+)").expect("valid number regex"));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocalCategory;

    #[test]
    fn test_transaction_amount_column_defaults_to_debit() {
        let row = RawRow::from([("Transaction Amount", "45.00")]);
        let tx = normalize_row(&row);
        assert_eq!(tx.amount, 45.0);
        assert_eq!(tx.drcr, DrCr::Debit);

        // Same result whether an Amount column is empty, filled or absent
        let row = RawRow::from([("Amount", ""), ("Transaction Amount", "45.00")]);
        assert_eq!(normalize_row(&row).amount, 45.0);

        let row = RawRow::from([("Amount", "100"), ("Transaction Amount", "45.00")]);
        let tx = normalize_row(&row);
        assert_eq!(tx.amount, 45.0);
        assert_eq!(tx.drcr, DrCr::Debit);

        let row = RawRow::from([("Transaction Amount", "45.00"), ("amount", "7")]);
        assert_eq!(normalize_row(&row).amount, 45.0);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let tx = normalize_row(&RawRow::default());
        assert_eq!(tx.description, None);
        assert_eq!(tx.amount, 0.0);
        assert_eq!(tx.date, UNKNOWN_DATE);
        assert_eq!(tx.drcr, DrCr::Debit);
        assert_eq!(tx.balance, DEFAULT_BALANCE);
    }

    #[test]
    fn test_amount_is_absolute_and_tolerant() {
        let row = RawRow::from([("amount", "-1,250.50")]);
        assert_eq!(normalize_row(&row).amount, 1250.5);

        let row = RawRow::from([("Amount", "₹ 300")]);
        assert_eq!(normalize_row(&row).amount, 300.0);

        let row = RawRow::from([("Amount", "(99.00)")]);
        assert_eq!(normalize_row(&row).amount, 99.0);

        let row = RawRow::from([("Amount", "Rs. 500")]);
        assert_eq!(normalize_row(&row).amount, 500.0);

        let row = RawRow::from([("Amount", "n/a")]);
        assert_eq!(normalize_row(&row).amount, 0.0);
    }

    #[test]
    fn test_alias_spellings() {
        let row = RawRow::from([
            ("Transaction Description", "NETFLIX"),
            ("Txn Date", "2024-02-20"),
            ("Dr/Cr", "cr"),
            ("Running Balance", "850"),
        ]);
        let tx = normalize_row(&row);
        assert_eq!(tx.description.as_deref(), Some("NETFLIX"));
        assert_eq!(tx.date, "2024-02-20");
        assert_eq!(tx.drcr, DrCr::Credit);
        assert_eq!(tx.balance, 850.0);
    }

    #[test]
    fn test_balance_parsing() {
        let row = RawRow::from([("Balance", "--")]);
        assert_eq!(normalize_row(&row).balance, DEFAULT_BALANCE);

        let row = RawRow::from([("Balance", "-2,000.00")]);
        assert_eq!(normalize_row(&row).balance, -2000.0);
    }

    #[test]
    fn test_parse_transactions_keeps_malformed_rows() {
        let csv = "Description,Amount,Date,DR/CR\n\
                   Swiggy Order,250,2024-01-05,DR\n\
                   Salary,50000,2024-01-01,CR\n\
                   ,garbage,,\n";
        let txs = parse_transactions(csv.as_bytes()).unwrap();
        assert_eq!(txs.len(), 3);
        assert_eq!(txs[1].drcr, DrCr::Credit);
        assert_eq!(txs[2].description, None);
        assert_eq!(txs[2].amount, 0.0);
        assert_eq!(txs[2].date, UNKNOWN_DATE);
    }

    #[test]
    fn test_read_rows_handles_short_records_and_padded_headers() {
        let csv = " Description , Amount\nUber,120\nOla\n";
        let rows = read_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(&["Description"]), Some("Uber"));
        assert_eq!(rows[1].get(&["Amount"]), None);
    }

    #[test]
    fn test_annotate_rows() {
        let csv = "Date,Description,Amount\n\
                   2024-01-02,Zomato dinner,400\n\
                   2024-01-03,Electricity Bill,1200\n\
                   2024-01-04,Gym,1500\n";
        let rows = annotate_rows(csv.as_bytes()).unwrap();
        let categories: Vec<_> = rows.iter().map(|r| r.category).collect();
        assert_eq!(
            categories,
            vec![LocalCategory::Food, LocalCategory::Bills, LocalCategory::Other]
        );

        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["Description"], "Zomato dinner");
        assert_eq!(json["Category"], "Food");
    }
}
