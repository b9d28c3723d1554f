//! Prompt templates for Griot.
//!
//! Prompts can be customized by placing a `chat.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub chat: ChatPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the storytelling assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPrompts {
    /// Persona used when the knowledge document cannot be loaded.
    pub fallback_context: String,
    /// System message wrapping the context and the user's question.
    /// Placeholders: `{{context}}`, `{{query}}`.
    pub system: String,
}

impl Default for ChatPrompts {
    fn default() -> Self {
        Self {
            fallback_context: r#"You are The Griot, a wise keeper of stories and oral history for the Griot and Grits project.

Your role is to:
- Help visitors explore and discover stories in our oral history collection
- Provide guidance on finding specific types of narratives (resilience, heritage, community leadership, etc.)
- Answer questions about the stories and experiences preserved in our archive
- Connect people to relevant videos based on their interests

When you don't know something or can't find relevant information in the collection, you should honestly say so rather than making up information.

You speak with wisdom, warmth, and respect for the stories and people you represent. You understand the importance of preserving Black history and experiences for future generations."#.to_string(),

            system: r#"{{context}}

The user is asking: "{{query}}"

Please provide a helpful response that either:
1. Guides them to relevant stories/videos in our collection
2. Answers their question based on the available context
3. Honestly states that you don't have enough information if that's the case

Remember to stay in character as The Griot and be helpful while being honest about limitations."#.to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let chat_path = custom_path.join("chat.toml");
            if chat_path.exists() {
                let content = std::fs::read_to_string(&chat_path)?;
                prompts.chat = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single pass over the template, so placeholder-like
    /// text inside a substituted value is left untouched.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            let Some(len) = rest[start + 2..].find("}}") else {
                break;
            };
            let key = &rest[start + 2..start + 2 + len];
            result.push_str(&rest[..start]);
            match vars.get(key) {
                Some(value) => {
                    result.push_str(value);
                    rest = &rest[start + 4 + len..];
                }
                // Not a placeholder: keep the braces and rescan after them.
                None => {
                    result.push_str("{{");
                    rest = &rest[start + 2..];
                }
            }
        }

        result.push_str(rest);
        result
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
}
