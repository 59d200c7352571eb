//! Note documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    pub title: String,
    pub note: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

/// Fields accepted when creating a note.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub user_id: String,
    pub course_id: Option<String>,
    pub content_id: Option<String>,
    pub title: String,
    pub note: String,
}

/// Fields a note update may change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub note: Option<String>,
}

/// Equality filters for note search. Unset fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NoteFilter {
    pub user_id: Option<String>,
    pub course_id: Option<String>,
    pub content_id: Option<String>,
}

impl NoteFilter {
    pub fn matches(&self, note: &Note) -> bool {
        fn eq(want: &Option<String>, have: Option<&str>) -> bool {
            want.as_deref().map_or(true, |w| have == Some(w))
        }
        eq(&self.user_id, Some(&note.user_id))
            && eq(&self.course_id, note.course_id.as_deref())
            && eq(&self.content_id, note.content_id.as_deref())
    }
}
