//! Criminal law case record

use serde::{Deserialize, Serialize};

/// A criminal law case. Every field is free text; empty fields are left
/// out of the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Case {
    /// Case title (rubrum), e.g. the parties involved
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// File number (Aktenzeichen)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub court: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub opened_on: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub closed_on: String,
    /// Subject matter of the proceedings
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subject: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
}

impl Case {
    /// Create a case with only a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_file_number(mut self, file_number: impl Into<String>) -> Self {
        self.file_number = file_number.into();
        self
    }

    pub fn with_court(mut self, court: impl Into<String>) -> Self {
        self.court = court.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }
}
