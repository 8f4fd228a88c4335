//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Dining table row (桌台, `tables` collection)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiningTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Display name, also the key of the table's order
    pub name: String,
    /// Free-text info shown next to the table
    #[serde(default)]
    pub notes: Option<String>,
}

/// Create/replace dining table payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiningTableDraft {
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl DiningTableDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Update table notes payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableNotesUpdate {
    pub notes: String,
}
