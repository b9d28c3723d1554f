//! Configuration module for Griot.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ChatPrompts, Prompts};
pub use settings::{
    CatalogSettings, ContextSettings, GeneralSettings, LlamaCppSettings, OllamaSettings,
    OpenAiCompatibleSettings, PromptSettings, ProviderConfig, ServerSettings, Settings,
};
