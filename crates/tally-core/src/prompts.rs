//! Prompt Library for the generative-language calls
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/tally/prompts/overrides/)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! This allows users to reword prompts without rebuilding, while automatically
//! getting new default prompts on upgrade.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const CATEGORIZE_TRANSACTIONS: &str =
        include_str!("../../../prompts/categorize_transactions.md");
    pub const SPENDING_TIP: &str = include_str!("../../../prompts/spending_tip.md");
    pub const ANSWER_QUESTION: &str = include_str!("../../../prompts/answer_question.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Batch classification of every uploaded transaction
    CategorizeTransactions,
    /// One-line saving tip attached to the analytics response
    SpendingTip,
    /// Free-text question answered from the session's transactions
    AnswerQuestion,
}

impl PromptId {
    /// Get the string identifier for this prompt
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CategorizeTransactions => "categorize_transactions",
            Self::SpendingTip => "spending_tip",
            Self::AnswerQuestion => "answer_question",
        }
    }

    /// Get all known prompt IDs
    pub fn all() -> &'static [PromptId] {
        &[
            Self::CategorizeTransactions,
            Self::SpendingTip,
            Self::AnswerQuestion,
        ]
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::CategorizeTransactions => defaults::CATEGORIZE_TRANSACTIONS,
            Self::SpendingTip => defaults::SPENDING_TIP,
            Self::AnswerQuestion => defaults::ANSWER_QUESTION,
        }
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    /// Unique identifier
    pub id: String,
    /// Version number for tracking changes
    pub version: u32,
}

/// A loaded prompt with metadata and content
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    pub content: String,
    /// Whether this came from an override file
    pub is_override: bool,
}

impl Prompt {
    /// Get the user section of the prompt
    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// Render the user section (or the whole body) with `{{var}}` placeholders replaced
    pub fn render_user(&self, vars: &HashMap<&str, &str>) -> String {
        let mut result = self.user_section().unwrap_or(&self.content).to_string();
        for (key, value) in vars {
            let pattern = format!("{{{{{}}}}}", key);
            result = result.replace(&pattern, value);
        }
        result
    }
}

/// Prompt library for loading and caching prompts
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Create a new prompt library with default paths
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with a custom override directory
    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with no override directory (embedded only)
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    /// Get a prompt by ID, loading from override or default
    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        if !self.cache.contains_key(&id) {
            let prompt = self.load(id)?;
            self.cache.insert(id, prompt);
        }
        self.cache
            .get(&id)
            .ok_or_else(|| Error::InvalidData(format!("Prompt {} not cached", id.as_str())))
    }

    /// Render a prompt's user section in one step
    pub fn render(&mut self, id: PromptId, vars: &HashMap<&str, &str>) -> Result<String> {
        Ok(self.get(id)?.render_user(vars))
    }

    fn load(&self, id: PromptId) -> Result<Prompt> {
        if let Some(ref override_dir) = self.override_dir {
            let override_path = override_dir.join(format!("{}.md", id.as_str()));
            if override_path.exists() {
                let content = fs::read_to_string(&override_path)?;
                let (metadata, body) = parse_prompt(&content)?;
                return Ok(Prompt {
                    metadata,
                    content: body,
                    is_override: true,
                });
            }
        }

        let (metadata, body) = parse_prompt(id.default_content())?;
        Ok(Prompt {
            metadata,
            content: body,
            is_override: false,
        })
    }

    /// Check if a prompt has an override file
    pub fn has_override(&self, id: PromptId) -> bool {
        self.override_dir
            .as_ref()
            .is_some_and(|dir| dir.join(format!("{}.md", id.as_str())).exists())
    }

    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tally").join("prompts").join("overrides"))
}

/// Parse a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    if !content.starts_with("---") {
        return Err(Error::InvalidData(
            "Prompt must start with YAML frontmatter (---)".into(),
        ));
    }

    let rest = &content[3..];
    let end = rest.find("---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 3..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)?;

    Ok((metadata, body.to_string()))
}

/// Extract a section from the prompt content
fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)?;
    let after_header = &content[start + header.len()..];
    let end = after_header.find("\n# ").unwrap_or(after_header.len());
    Some(after_header[..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prompt() {
        let content = r#"---
id: test_prompt
version: 3
---

# User
Test user prompt with {{variable}}.
"#;

        let (metadata, body) = parse_prompt(content).unwrap();
        assert_eq!(metadata.id, "test_prompt");
        assert_eq!(metadata.version, 3);
        assert!(body.starts_with("# User"));
    }

    #[test]
    fn test_parse_prompt_requires_frontmatter() {
        assert!(parse_prompt("# User\nhello").is_err());
        assert!(parse_prompt("---\nid: x\nversion: 1\n# User").is_err());
    }

    #[test]
    fn test_render_user_replaces_placeholders() {
        let prompt = Prompt {
            metadata: PromptMetadata {
                id: "t".into(),
                version: 1,
            },
            content: "# User\nSpent {{outflow}} of {{inflow}}.".into(),
            is_override: false,
        };
        let mut vars = HashMap::new();
        vars.insert("inflow", "5000");
        vars.insert("outflow", "250");
        assert_eq!(prompt.render_user(&vars), "Spent 250 of 5000.");
    }

    #[test]
    fn test_default_prompts_parse() {
        for id in PromptId::all() {
            let (metadata, body) = parse_prompt(id.default_content())
                .unwrap_or_else(|e| panic!("Failed to parse {}: {}", id.as_str(), e));
            assert_eq!(metadata.id, id.as_str());
            assert!(extract_section(&body, "# User").is_some());
        }
    }

    #[test]
    fn test_override_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("spending_tip.md"),
            "---\nid: spending_tip\nversion: 9\n---\n\n# User\nCustom tip for {{inflow}}",
        )
        .unwrap();

        let mut lib = PromptLibrary::with_override_dir(dir.path().to_path_buf());
        assert!(lib.has_override(PromptId::SpendingTip));
        assert!(!lib.has_override(PromptId::AnswerQuestion));

        let prompt = lib.get(PromptId::SpendingTip).unwrap();
        assert!(prompt.is_override);
        assert_eq!(prompt.metadata.version, 9);

        let mut vars = HashMap::new();
        vars.insert("inflow", "100");
        assert_eq!(
            lib.render(PromptId::SpendingTip, &vars).unwrap(),
            "Custom tip for 100"
        );
    }

    #[test]
    fn test_embedded_library_loads_everything() {
        let mut lib = PromptLibrary::embedded_only();
        for id in PromptId::all() {
            assert!(!lib.get(*id).unwrap().is_override);
        }
    }
}
