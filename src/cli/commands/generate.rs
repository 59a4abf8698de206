//! Generate command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::CharlaError;
use crate::exercise::ExerciseRequest;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use console::style;

/// Run the generate command.
pub async fn run_generate(query: &str, question_type: &str, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    orchestrator.ensure_ingested().await?;

    let request = ExerciseRequest::new(query, question_type);
    let spinner = Output::spinner("Generating exercise...");
    let result = orchestrator.generate_exercise(&request).await;
    spinner.finish_and_clear();

    let exercise = match result {
        Ok(exercise) => exercise,
        Err(e @ CharlaError::NoContext(_)) => {
            Output::error(&format!("{}", e));
            Output::info("Run 'charla structure --all' and 'charla ingest' to populate the store.");
            return Err(e.into());
        }
        Err(e @ (CharlaError::MalformedResponse(_) | CharlaError::Validation(_))) => {
            Output::error(&format!("{}", e));
            Output::info("The model returned unusable output; try generating again.");
            return Err(e.into());
        }
        Err(e) => {
            Output::error(&format!("Failed to generate exercise: {}", e));
            return Err(e.into());
        }
    };

    Output::header("Conversation");
    println!("{}", exercise.context);

    Output::header("Question");
    println!("{}", style(&exercise.question.question_text).bold());
    println!("{}", style(&exercise.question.translated_question_text).dim());

    println!();
    for (i, answer) in exercise.question.answers.iter().enumerate() {
        let letter = (b'a' + i as u8) as char;
        println!("  {}) {}", letter, answer.text);
        println!("     {}", style(&answer.translated_text).dim());
    }

    if let Some(correct) = exercise.question.correct_answer() {
        println!();
        Output::kv("Correct answer", &correct.text);
    }

    Ok(())
}
