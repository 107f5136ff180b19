//! Predefined question catalog and its management.

use tracing::instrument;

use scooter_support_core::{IdentityId, QuestionId};

use crate::backend::QuestionStore;
use crate::db::RepositoryError;
use crate::error::{PortalError, Result};
use crate::models::{Question, QuestionCategory, QuestionInput};

fn not_found_as_question(e: RepositoryError) -> PortalError {
    match e {
        RepositoryError::NotFound => PortalError::NotFound("question".to_owned()),
        other => other.into(),
    }
}

/// Lists, groups and edits predefined questions.
pub struct QuestionService<'a, Q> {
    store: &'a Q,
}

impl<'a, Q: QuestionStore> QuestionService<'a, Q> {
    /// Create a question service.
    #[must_use]
    pub const fn new(store: &'a Q) -> Self {
        Self { store }
    }

    /// The catalog shown to customers. Falls back to the built-in catalog
    /// while no questions are stored.
    ///
    /// # Errors
    ///
    /// Returns `BackendUnavailable` if the store fails.
    pub async fn catalog(&self) -> Result<Vec<QuestionCategory>> {
        let stored = self.store.list().await?;
        if stored.is_empty() {
            return Ok(QuestionCategory::builtin());
        }
        Ok(QuestionCategory::group(&stored))
    }

    /// Every stored question, by category then age.
    ///
    /// # Errors
    ///
    /// Returns `BackendUnavailable` if the store fails.
    pub async fn list(&self) -> Result<Vec<Question>> {
        Ok(self.store.list().await?)
    }

    /// Add a question.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for missing fields, or `BackendUnavailable`.
    #[instrument(skip(self, input), fields(category = %input.category_id))]
    pub async fn add(
        &self,
        input: QuestionInput,
        created_by: Option<IdentityId>,
    ) -> Result<Question> {
        let input = input.validate()?;
        let question = self.store.insert(input, created_by).await?;
        tracing::info!(question_id = %question.id, "Question added");
        Ok(question)
    }

    /// Replace a question.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for missing fields, `NotFound`, or
    /// `BackendUnavailable`.
    #[instrument(skip(self, input), fields(question_id = %id))]
    pub async fn update(&self, id: QuestionId, input: QuestionInput) -> Result<Question> {
        let input = input.validate()?;
        self.store
            .update(id, input)
            .await
            .map_err(not_found_as_question)
    }

    /// Remove a question.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `BackendUnavailable`.
    #[instrument(skip(self), fields(question_id = %id))]
    pub async fn delete(&self, id: QuestionId) -> Result<()> {
        self.store.delete(id).await.map_err(not_found_as_question)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::memory::{MemoryBackend, Op};

    fn input(category: &str, text: &str) -> QuestionInput {
        QuestionInput {
            category_id: category.to_string(),
            category_title: format!("{category} questions"),
            category_description: String::new(),
            category_icon: String::new(),
            question_text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_store_serves_builtin_catalog() {
        let backend = MemoryBackend::new();
        let service = QuestionService::new(&backend);

        let catalog = service.catalog().await.unwrap();
        assert_eq!(catalog, QuestionCategory::builtin());
    }

    #[tokio::test]
    async fn test_crud() {
        let backend = MemoryBackend::new();
        let service = QuestionService::new(&backend);

        let q = service
            .add(input("safety", "Do you sell helmets?"), None)
            .await
            .unwrap();
        service.add(input("battery", "Spare batteries?"), None).await.unwrap();

        let catalog = service.catalog().await.unwrap();
        assert_eq!(catalog[0].id, "battery");
        assert_eq!(catalog[1].icon, "HelpCircle");

        let updated = service
            .update(q.id, input("safety", "Which helmets fit?"))
            .await
            .unwrap();
        assert_eq!(updated.question_text, "Which helmets fit?");

        service.delete(q.id).await.unwrap();
        assert!(matches!(
            service.delete(q.id).await,
            Err(PortalError::NotFound(_))
        ));
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_store() {
        let backend = MemoryBackend::new();
        let service = QuestionService::new(&backend);

        assert!(matches!(
            service.add(input("", "Orphan question"), None).await,
            Err(PortalError::Validation(_))
        ));
        assert_eq!(backend.calls(Op::InsertQuestion), 0);
    }
}
