//! Prompt templates for docqa.
//!
//! The answer prompt can be customized by placing a `rag.toml` file in the
//! custom prompts directory.

use crate::error::{DocqaError, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Placeholders every answer template must contain.
const ANSWER_PLACEHOLDERS: [&str; 3] = ["context", "question", "unknown"];

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("placeholder pattern is valid"))
}

/// Collection of all prompt templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompt for grounded answer generation.
///
/// `{{context}}`, `{{question}}` and `{{unknown}}` are substituted at answer time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub answer: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            answer: r#"You are a helpful assistant answering questions based on the context below.
Context: {{context}}
Question: {{question}}
Answer concisely, using only the context. If the context lacks the answer, reply with "{{unknown}}"."#
                .to_string(),
        }
    }
}

impl RagPrompts {
    /// Require the context, question and unknown-answer placeholders.
    pub fn validate(&self) -> Result<()> {
        let present: Vec<&str> = placeholder_regex()
            .captures_iter(&self.answer)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .collect();

        let missing: Vec<String> = ANSWER_PLACEHOLDERS
            .into_iter()
            .filter(|name| !present.contains(name))
            .map(|name| format!("{{{{{}}}}}", name))
            .collect();

        if !missing.is_empty() {
            return Err(DocqaError::Config(format!(
                "answer prompt is missing {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}

impl Prompts {
    /// Load prompts, with optional custom directory and variables.
    ///
    /// A custom answer template without `{{context}}`, `{{question}}` and
    /// `{{unknown}}` is a configuration error.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                let rag: RagPrompts = toml::from_str(&content)?;
                rag.validate().map_err(|e| match e {
                    DocqaError::Config(reason) => {
                        DocqaError::Config(format!("{}: {}", rag_path.display(), reason))
                    }
                    other => other,
                })?;
                prompts.rag = rag;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are substituted in a single pass, so text inside a
    /// substituted value is never rendered again. Unknown placeholders are
    /// left as written.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        placeholder_regex()
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// Render the answer prompt.
    pub fn render_answer(&self, context: &str, question: &str, unknown: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.to_string());
        vars.insert("question".to_string(), question.to_string());
        vars.insert("unknown".to_string(), unknown.to_string());
        self.render_with_custom(&self.rag.answer, &vars)
    }
}
