//! Configuration module for Charla.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ExercisePrompts, Prompts, StructuringPrompts};
pub use settings::{
    EmbeddingSettings, GeneralSettings, GenerationSettings, PromptSettings, Settings,
    StructuringSettings, VectorStoreSettings,
};
