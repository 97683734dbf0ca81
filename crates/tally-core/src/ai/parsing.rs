//! JSON parsing helpers for AI backend responses
//!
//! Models wrap their JSON in prose or code fences, so the payload is cut out
//! between the first `[` and the last `]` before parsing.

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};
use crate::models::{CategorizedTransaction, Category, Transaction};

/// How much of a bad response to echo back in error messages
const RAW_PREVIEW_CHARS: usize = 200;

/// One element of the categorization array returned by the model
///
/// Only `index` and `category` are read; description, amount and date always
/// come from the uploaded row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategorizationRecord {
    #[serde(default, deserialize_with = "deserialize_index")]
    pub index: Option<usize>,
    pub category: Category,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IndexValue {
    Number(usize),
    Text(String),
}

fn deserialize_index<'de, D>(deserializer: D) -> std::result::Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<IndexValue>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IndexValue::Number(n)) => Ok(Some(n)),
        Some(IndexValue::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid index: {}", s))),
    }
}

/// Slice out the outermost `[...]` span of a model response
pub fn extract_json_array(response: &str) -> Result<&str> {
    let response = response.trim();
    match (response.find('['), response.rfind(']')) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(Error::InvalidData(format!(
            "No JSON array found in AI response | Raw: {}",
            preview(response)
        ))),
    }
}

/// Parse the categorization array out of a model response
pub fn parse_categorizations(response: &str) -> Result<Vec<CategorizationRecord>> {
    let json_str = extract_json_array(response)?;
    serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid categorization JSON from AI: {} | Raw: {}",
            e,
            preview(json_str)
        ))
    })
}

/// Match model records back onto the uploaded rows
///
/// With indices, every 1-based index must be in range and used exactly once.
/// Without them, records are matched by position and the counts must agree.
pub fn reconcile(
    transactions: &[Transaction],
    records: Vec<CategorizationRecord>,
) -> Result<Vec<CategorizedTransaction>> {
    let indexed = records.iter().filter(|r| r.index.is_some()).count();

    let categories: Vec<Category> = if indexed == 0 {
        if records.len() != transactions.len() {
            return Err(Error::Reconciliation(format!(
                "expected {} records, got {}",
                transactions.len(),
                records.len()
            )));
        }
        records.into_iter().map(|r| r.category).collect()
    } else if indexed == records.len() {
        let mut slots: Vec<Option<Category>> = vec![None; transactions.len()];
        for record in records {
            let index = record.index.unwrap_or_default();
            let slot = index
                .checked_sub(1)
                .and_then(|i| slots.get_mut(i))
                .ok_or_else(|| {
                    Error::Reconciliation(format!(
                        "index {} out of range 1..={}",
                        index,
                        transactions.len()
                    ))
                })?;
            if slot.is_some() {
                return Err(Error::Reconciliation(format!("duplicate index {}", index)));
            }
            *slot = Some(record.category);
        }
        slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.ok_or_else(|| {
                    Error::Reconciliation(format!("transaction {} was not categorized", i + 1))
                })
            })
            .collect::<Result<_>>()?
    } else {
        return Err(Error::Reconciliation(format!(
            "{} of {} records carry an index",
            indexed,
            records.len()
        )));
    };

    Ok(transactions
        .iter()
        .zip(categories)
        .map(|(tx, category)| CategorizedTransaction {
            description: tx.description.clone(),
            category,
            amount: tx.amount,
            date: tx.date.clone(),
        })
        .collect())
}

fn preview(s: &str) -> String {
    if s.chars().count() > RAW_PREVIEW_CHARS {
        format!("{}...", s.chars().take(RAW_PREVIEW_CHARS).collect::<String>())
    } else {
        s.to_string()
    }
}
