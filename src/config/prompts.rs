//! Prompt templates for Charla.
//!
//! Prompts can be customized by placing TOML files in the custom prompts
//! directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub structuring: StructuringPrompts,
    pub exercise: ExercisePrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for structuring raw transcripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuringPrompts {
    pub system: String,
    pub user: String,
}

impl Default for StructuringPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an expert Spanish language teacher. You receive transcripts from Spanish A1 level listening comprehension lessons and structure them into their parts.

A lesson transcript typically contains:
1. An introduction where the teacher presents the lesson
2. A short conversation between speakers
3. Comprehension questions about the conversation, each followed by its answer

Return only a JSON object, with no additional text or explanation."#
                .to_string(),

            user: r#"Analyze this transcript and structure it into a JSON object with the following shape:

{
    "introduction": "Introduction text here",
    "conversation": "Conversation text here",
    "qa_pairs": [
        {
            "question": "Question 1 text here",
            "answer": "Answer 1 text here"
        },
        {
            "question": "Question 2 text here",
            "answer": "Answer 2 text here"
        }
    ]
}

Keep questions and answers in the order they appear. If a part is missing from the transcript, use null for introduction or conversation, or an empty array for qa_pairs.

Here is the transcript:

{{transcript}}

Return only the JSON object."#
                .to_string(),
        }
    }
}

/// Prompts for exercise generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExercisePrompts {
    pub system: String,
    pub user: String,
}

impl Default for ExercisePrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an expert Spanish language teacher creating listening comprehension practice for A1 level students. You write new practice conversations modeled on real lesson material and ask one multiple choice question about each."#
                .to_string(),

            user: r#"Here is a sample conversation for reference:

{{context}}

Create a NEW conversation following a similar pattern but with different:
- Names
- Numbers
- Places
- Professions
- Details

The new conversation should:
- Be at A1 level Spanish
- Use similar grammar structures
- Cover similar topics
- Be about 3-4 lines long
- Include personal information (name, age, job, etc.)
- Include some numbers and locations

After creating the conversation, generate a {{question_type}} multiple choice question about it. Exactly one of the four answers must be correct.

Return your response in this exact JSON format:
{
    "conversation": "your new conversation in Spanish",
    "question": "your question about the NEW conversation in Spanish",
    "question_translation": "English translation of your question",
    "answers": [
        {
            "text": "correct answer in Spanish",
            "translation": "correct answer in English",
            "is_correct": true
        },
        {
            "text": "first incorrect answer in Spanish",
            "translation": "first incorrect answer in English",
            "is_correct": false
        },
        {
            "text": "second incorrect answer in Spanish",
            "translation": "second incorrect answer in English",
            "is_correct": false
        },
        {
            "text": "third incorrect answer in Spanish",
            "translation": "third incorrect answer in English",
            "is_correct": false
        }
    ]
}"#
            .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from defaults, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let structuring_path = custom_path.join("structuring.toml");
            if structuring_path.exists() {
                let content = std::fs::read_to_string(&structuring_path)?;
                prompts.structuring = toml::from_str(&content)?;
            }

            let exercise_path = custom_path.join("exercise.toml");
            if exercise_path.exists() {
                let content = std::fs::read_to_string(&exercise_path)?;
                prompts.exercise = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config
    /// variables. Provided variables take precedence.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.structuring.user.contains("{{transcript}}"));
        assert!(prompts.exercise.user.contains("{{context}}"));
        assert!(prompts.exercise.user.contains("{{question_type}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Generate a {{question_type}} question about: {{context}}";
        let mut vars = std::collections::HashMap::new();
        vars.insert("question_type".to_string(), "comprehension".to_string());
        vars.insert("context".to_string(), "Hola".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Generate a comprehension question about: Hola");
    }
}
