//! Keyword categorizer for the simple upload route
//!
//! Rules are evaluated in order and the first match wins, so a description like
//! "food delivery by uber" is Food, not Travel.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::LocalCategory;

static RULES: LazyLock<Vec<(Regex, LocalCategory)>> = LazyLock::new(|| {
    [
        (r"food|swiggy|zomato|restaurant", LocalCategory::Food),
        (r"uber|ola|bus|flight|train", LocalCategory::Travel),
        (r"amazon|shopping|flipkart", LocalCategory::Shopping),
        (r"rent|electricity|wifi|bill", LocalCategory::Bills),
    ]
    .into_iter()
    .map(|(pattern, category)| (Regex::new(pattern).expect("valid keyword regex"), category))
    .collect()
});

/// Map a free-text description to a category, or `Other` when no rule matches
pub fn categorize(description: &str) -> LocalCategory {
    let desc = description.to_lowercase();
    RULES
        .iter()
        .find(|(re, _)| re.is_match(&desc))
        .map(|(_, category)| *category)
        .unwrap_or(LocalCategory::Other)
}
