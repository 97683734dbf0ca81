//! Domain models for Tally

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Date placeholder for rows without a usable date column
pub const UNKNOWN_DATE: &str = "Unknown Date";

/// Balance assumed for rows without a balance column (always above the crunch floor)
pub const DEFAULT_BALANCE: f64 = 10_000.0;

/// A CSV row exactly as read: column names in file order mapped to raw values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    columns: Vec<(String, String)>,
}

impl RawRow {
    pub fn new(columns: Vec<(String, String)>) -> Self {
        Self { columns }
    }

    /// First non-empty value among the given column spellings
    pub fn get(&self, aliases: &[&str]) -> Option<&str> {
        aliases.iter().find_map(|alias| {
            self.columns
                .iter()
                .find(|(name, _)| name == alias)
                .map(|(_, value)| value.trim())
                .filter(|value| !value.is_empty())
        })
    }

    pub fn columns(&self) -> &[(String, String)] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for RawRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self::new(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Debit/credit marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DrCr {
    #[default]
    #[serde(rename = "DR")]
    Debit,
    #[serde(rename = "CR")]
    Credit,
}

impl DrCr {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "DR",
            Self::Credit => "CR",
        }
    }

    /// Anything that is not recognizably a credit is a debit
    pub fn from_marker(marker: &str) -> Self {
        match marker.trim().to_uppercase().as_str() {
            "CR" | "CREDIT" => Self::Credit,
            _ => Self::Debit,
        }
    }
}

impl std::fmt::Display for DrCr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A normalized transaction
///
/// `amount` is always a non-negative magnitude; direction lives only in `drcr`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub description: Option<String>,
    pub amount: f64,
    pub date: String,
    pub drcr: DrCr,
    #[serde(default = "default_balance")]
    pub balance: f64,
}

fn default_balance() -> f64 {
    DEFAULT_BALANCE
}

impl Transaction {
    pub fn is_debit(&self) -> bool {
        self.drcr == DrCr::Debit
    }

    pub fn is_credit(&self) -> bool {
        self.drcr == DrCr::Credit
    }

    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// Spending categories assigned by the remote classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Category {
    Food,
    Travel,
    Shopping,
    Bills,
    Health,
    Groceries,
    Income,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Travel => "Travel",
            Self::Shopping => "Shopping",
            Self::Bills => "Bills",
            Self::Health => "Health",
            Self::Groceries => "Groceries",
            Self::Income => "Income",
        }
    }

    pub fn all() -> &'static [Category] {
        &[
            Self::Food,
            Self::Travel,
            Self::Shopping,
            Self::Bills,
            Self::Health,
            Self::Groceries,
            Self::Income,
        ]
    }

    pub fn is_income(&self) -> bool {
        matches!(self, Self::Income)
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "food" => Ok(Self::Food),
            "travel" => Ok(Self::Travel),
            "shopping" => Ok(Self::Shopping),
            "bills" | "bill" => Ok(Self::Bills),
            "health" => Ok(Self::Health),
            "groceries" | "grocery" => Ok(Self::Groceries),
            "income" => Ok(Self::Income),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Categories produced by the local keyword rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocalCategory {
    Food,
    Travel,
    Shopping,
    Bills,
    Other,
}

impl LocalCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Travel => "Travel",
            Self::Shopping => "Shopping",
            Self::Bills => "Bills",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for LocalCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transaction annotated with its remote category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedTransaction {
    pub description: Option<String>,
    pub category: Category,
    pub amount: f64,
    pub date: String,
}

/// A raw CSV row plus the locally computed `Category` column
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedRow {
    pub row: RawRow,
    pub category: LocalCategory,
}

impl Serialize for AnnotatedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in self.row.columns() {
            if name != "Category" {
                map.serialize_entry(name, value)?;
            }
        }
        map.serialize_entry("Category", self.category.as_str())?;
        map.end()
    }
}
