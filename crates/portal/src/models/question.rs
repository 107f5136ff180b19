//! Predefined support questions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scooter_support_core::{IdentityId, QuestionId};

use crate::error::{Result, ValidationErrors};

/// Icon used when none is chosen.
pub const DEFAULT_ICON: &str = "HelpCircle";

/// A stored question row. Category fields are denormalized onto each row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub category_id: String,
    pub category_title: String,
    pub category_description: String,
    pub category_icon: String,
    pub question_text: String,
    pub created_by: Option<IdentityId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for adding or editing a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionInput {
    pub category_id: String,
    pub category_title: String,
    pub category_description: String,
    pub category_icon: String,
    pub question_text: String,
}

impl Default for QuestionInput {
    fn default() -> Self {
        Self {
            category_id: String::new(),
            category_title: String::new(),
            category_description: String::new(),
            category_icon: DEFAULT_ICON.to_owned(),
            question_text: String::new(),
        }
    }
}

impl QuestionInput {
    /// Require category id, category title and question text.
    ///
    /// A blank icon is replaced with [`DEFAULT_ICON`].
    ///
    /// # Errors
    ///
    /// Returns `PortalError::Validation` naming each missing field.
    pub fn validate(mut self) -> Result<Self> {
        let mut errors = ValidationErrors::new();
        for (field, value) in [
            ("category_id", &self.category_id),
            ("category_title", &self.category_title),
            ("question_text", &self.question_text),
        ] {
            if value.trim().is_empty() {
                errors.add(field, "Please fill in all required fields");
            }
        }
        errors.into_result()?;

        if self.category_icon.trim().is_empty() {
            DEFAULT_ICON.clone_into(&mut self.category_icon);
        }
        Ok(self)
    }
}

/// Questions grouped under one category, as shown to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionCategory {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub questions: Vec<String>,
}

impl QuestionCategory {
    /// Group rows by category id, keeping first-seen order of both categories
    /// and questions.
    #[must_use]
    pub fn group(rows: &[Question]) -> Vec<Self> {
        let mut categories: Vec<Self> = Vec::new();
        for row in rows {
            if let Some(category) = categories.iter_mut().find(|c| c.id == row.category_id) {
                category.questions.push(row.question_text.clone());
            } else {
                categories.push(Self {
                    id: row.category_id.clone(),
                    title: row.category_title.clone(),
                    description: row.category_description.clone(),
                    icon: row.category_icon.clone(),
                    questions: vec![row.question_text.clone()],
                });
            }
        }
        categories
    }

    /// The catalog shipped with the portal.
    #[must_use]
    pub fn builtin() -> Vec<Self> {
        BUILTIN
            .iter()
            .map(|(id, title, description, icon, questions)| Self {
                id: (*id).to_owned(),
                title: (*title).to_owned(),
                description: (*description).to_owned(),
                icon: (*icon).to_owned(),
                questions: questions.iter().map(|q| (*q).to_owned()).collect(),
            })
            .collect()
    }
}

type BuiltinCategory = (&'static str, &'static str, &'static str, &'static str, [&'static str; 4]);

const BUILTIN: [BuiltinCategory; 4] = [
    (
        "battery",
        "Battery Issues",
        "Battery not charging, low range, or power problems",
        "Zap",
        [
            "My scooter battery is not charging",
            "How can I improve my scooter battery life?",
            "Why does my battery drain so quickly?",
            "What is the expected battery range?",
        ],
    ),
    (
        "mechanical",
        "Mechanical Problems",
        "Brakes, wheels, steering, or motor issues",
        "Wrench",
        [
            "My brakes are making strange noises",
            "The scooter is not accelerating properly",
            "How do I adjust the brake tension?",
            "The wheels are wobbling while riding",
        ],
    ),
    (
        "safety",
        "Safety Concerns",
        "Safety features, helmet recommendations, or accident reports",
        "Shield",
        [
            "What safety gear do you recommend?",
            "How do I report a safety issue?",
            "My scooter suddenly stopped working while riding",
            "Are there age restrictions for using the scooter?",
        ],
    ),
    (
        "general",
        "General Questions",
        "Warranty, maintenance, or usage questions",
        DEFAULT_ICON,
        [
            "How do I maintain my electric scooter?",
            "What is covered under warranty?",
            "How often should I service my scooter?",
            "Can I ride in the rain?",
        ],
    ),
];
