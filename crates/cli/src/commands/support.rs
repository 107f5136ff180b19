//! Support requests: the question catalog, submission and ticket listing.

use std::path::{Path, PathBuf};

use scooter_support_portal::identity::IdentityResolver;
use scooter_support_portal::models::{Attachment, QuestionCategory, SupportTicket};
use scooter_support_portal::services::{
    AttachmentUploader, QuestionService, SupportWorkflow, TicketSubmission, WorkflowState,
    check_size,
};
use scooter_support_portal::state::Portal;

use super::CliError;

/// What `support ask` was given.
pub struct AskRequest {
    pub category: String,
    /// 1-based index into the category's catalog questions.
    pub question: Option<usize>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub attach: Option<PathBuf>,
}

/// How the form gets its first values.
pub(super) enum Selection {
    Predefined { text: String, category: String },
    Custom { category: String },
}

/// Values typed over the pre-filled form.
#[derive(Default)]
pub(super) struct Overrides {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub attach: Option<PathBuf>,
}

/// Print the question catalog.
///
/// # Errors
///
/// Returns `BackendUnavailable` if the question store fails.
pub async fn questions(portal: &Portal) -> Result<(), CliError> {
    let store = portal.questions();
    let catalog = QuestionService::new(&store).catalog().await?;

    #[allow(clippy::print_stdout)]
    {
        for category in &catalog {
            println!("{} ({})", category.title, category.id);
            if !category.description.is_empty() {
                println!("  {}", category.description);
            }
            for (n, question) in category.questions.iter().enumerate() {
                println!("  {}. {question}", n + 1);
            }
            println!();
        }
    }
    Ok(())
}

/// Submit a support request through the workflow.
///
/// # Errors
///
/// Returns `InvalidArgument` for an unknown catalog question, `ReadFile` if
/// the attachment cannot be read, or whatever the submission returns.
pub async fn ask(portal: &Portal, request: AskRequest) -> Result<(), CliError> {
    let selection = match request.question {
        Some(n) => {
            let store = portal.questions();
            let catalog = QuestionService::new(&store).catalog().await?;
            Selection::Predefined {
                text: pick_question(&catalog, &request.category, n)?.to_owned(),
                category: request.category,
            }
        }
        None => Selection::Custom {
            category: request.category,
        },
    };

    let overrides = Overrides {
        title: request.title,
        description: request.description,
        priority: request.priority,
        attach: request.attach,
    };
    let ticket = submit(portal, selection, overrides).await?;
    print_submitted(&ticket);
    Ok(())
}

/// List the logged-in customer's tickets.
///
/// # Errors
///
/// Returns `Unauthenticated` when nobody is logged in, or `BackendUnavailable`.
pub async fn list_tickets(portal: &Portal) -> Result<(), CliError> {
    let sessions = portal.sessions();
    let profiles = portal.profiles();
    let tickets = portal.tickets();
    let resolver = IdentityResolver::new(&sessions, &profiles, portal.context());
    let uploader = AttachmentUploader::new(portal.blobs(), portal.config().max_attachment_bytes);
    let submission = TicketSubmission::new(&resolver, &tickets, uploader);

    let mine = submission.list_mine().await?;

    #[allow(clippy::print_stdout)]
    {
        if mine.is_empty() {
            println!("No tickets yet");
        }
        for ticket in &mine {
            println!(
                "{}  {:<11} {:<8} {:<10} {}",
                ticket.created_at.format("%Y-%m-%d %H:%M"),
                ticket.status,
                ticket.priority,
                ticket.category,
                ticket.title
            );
        }
    }
    Ok(())
}

/// Run one request from selection to submitted ticket.
pub(super) async fn submit(
    portal: &Portal,
    selection: Selection,
    overrides: Overrides,
) -> Result<SupportTicket, CliError> {
    let max_bytes = portal.config().max_attachment_bytes;
    let attachment = match &overrides.attach {
        Some(path) => Some(read_attachment(path, max_bytes).await?),
        None => None,
    };

    let sessions = portal.sessions();
    let profiles = portal.profiles();
    let tickets = portal.tickets();
    let resolver = IdentityResolver::new(&sessions, &profiles, portal.context());
    let uploader = AttachmentUploader::new(portal.blobs(), portal.config().max_attachment_bytes);
    let submission = TicketSubmission::new(&resolver, &tickets, uploader);
    let workflow = SupportWorkflow::new(&submission);

    let custom_category = match selection {
        Selection::Predefined { text, category } => {
            workflow.select_predefined_question(&text, &category)?;
            None
        }
        Selection::Custom { category } => {
            workflow.select_custom_question()?;
            Some(category)
        }
    };

    let WorkflowState::FillingForm { mut form, .. } = workflow.state() else {
        return Err(CliError::InvalidArgument(
            "support form is not open".to_owned(),
        ));
    };
    if let Some(category) = custom_category {
        form.category = category;
    }
    if let Some(title) = overrides.title {
        form.title = title;
    }
    if let Some(description) = overrides.description {
        form.description = description;
    }
    if let Some(priority) = overrides.priority {
        form.priority = priority;
    }

    Ok(workflow.submit(form, attachment.as_ref()).await?)
}

pub(super) fn print_submitted(ticket: &SupportTicket) {
    #[allow(clippy::print_stdout)]
    {
        println!("Support request submitted");
        println!("  Ticket:   {}", ticket.id);
        println!("  Title:    {}", ticket.title);
        println!("  Category: {}", ticket.category.title());
        println!("  Priority: {}", ticket.priority);
        if let Some(path) = &ticket.attachment_path {
            println!("  Attached: {path}");
        }
    }
}

fn pick_question<'c>(
    catalog: &'c [QuestionCategory],
    category: &str,
    n: usize,
) -> Result<&'c str, CliError> {
    let questions = &catalog
        .iter()
        .find(|c| c.id == category)
        .ok_or_else(|| CliError::InvalidArgument(format!("unknown category: {category}")))?
        .questions;

    n.checked_sub(1)
        .and_then(|i| questions.get(i))
        .map(String::as_str)
        .ok_or_else(|| {
            CliError::InvalidArgument(format!(
                "{category} has {} questions, not {n}",
                questions.len()
            ))
        })
}

/// Read a picked file, rejecting oversized ones from their metadata alone.
async fn read_attachment(path: &Path, max_bytes: u64) -> Result<Attachment, CliError> {
    let read_failed = |source| CliError::ReadFile {
        path: path.to_path_buf(),
        source,
    };
    let metadata = tokio::fs::metadata(path).await.map_err(read_failed)?;
    check_size(metadata.len(), max_bytes)?;

    let bytes = tokio::fs::read(path).await.map_err(read_failed)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Attachment::new(file_name, bytes))
}
