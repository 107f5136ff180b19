//! Predefined question management.

use scooter_support_core::QuestionId;
use scooter_support_portal::identity::IdentityResolver;
use scooter_support_portal::models::{Question, QuestionInput};
use scooter_support_portal::services::QuestionService;
use scooter_support_portal::state::Portal;

use super::{CliError, parse_id};

/// List stored questions.
///
/// # Errors
///
/// Returns `BackendUnavailable` if the store fails.
pub async fn list(portal: &Portal) -> Result<(), CliError> {
    let store = portal.questions();
    let questions = QuestionService::new(&store).list().await?;

    #[allow(clippy::print_stdout)]
    {
        if questions.is_empty() {
            println!("No stored questions; the built-in catalog is in use");
        }
        for q in &questions {
            println!("{}  [{}] {}", q.id, q.category_id, q.question_text);
        }
    }
    Ok(())
}

/// Add a question, recording the logged-in identity as its author.
///
/// # Errors
///
/// Returns `Validation` or `BackendUnavailable`.
pub async fn add(portal: &Portal, input: QuestionInput) -> Result<(), CliError> {
    let sessions = portal.sessions();
    let profiles = portal.profiles();
    let author = IdentityResolver::new(&sessions, &profiles, portal.context())
        .resolve_ambient()
        .await?;

    let store = portal.questions();
    let question = QuestionService::new(&store).add(input, author).await?;
    print_saved("added", &question);
    Ok(())
}

/// Replace a question.
///
/// # Errors
///
/// Returns `InvalidArgument` for a malformed id, `Validation`, `NotFound`
/// or `BackendUnavailable`.
pub async fn update(portal: &Portal, id: &str, input: QuestionInput) -> Result<(), CliError> {
    let id: QuestionId = parse_id(id)?;
    let store = portal.questions();
    let question = QuestionService::new(&store).update(id, input).await?;
    print_saved("updated", &question);
    Ok(())
}

/// Delete a question.
///
/// # Errors
///
/// Returns `InvalidArgument` for a malformed id, `NotFound` or
/// `BackendUnavailable`.
pub async fn delete(portal: &Portal, id: &str) -> Result<(), CliError> {
    let id: QuestionId = parse_id(id)?;
    let store = portal.questions();
    QuestionService::new(&store).delete(id).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("Question {id} deleted");
    }
    Ok(())
}

fn print_saved(action: &str, question: &Question) {
    #[allow(clippy::print_stdout)]
    {
        println!("Question {action}: {}", question.id);
        println!(
            "  {} ({}, icon {})",
            question.category_title, question.category_id, question.category_icon
        );
        println!("  {}", question.question_text);
    }
}
