//! Row structs shared across queries

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// Review states an event moves through
pub const REVIEW_PENDING: &str = "pending";
pub const REVIEW_APPROVED: &str = "approved";

/// An archived event (convention, signing, Q&A session)
#[derive(Debug, Clone)]
pub struct Event {
    pub guid: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub location: Option<String>,
    pub review_state: String,
    pub hidden: bool,
}

impl Event {
    pub fn visible(&self) -> bool {
        !self.hidden
    }
}

/// A transcribed excerpt belonging to an event
#[derive(Debug, Clone)]
pub struct Entry {
    pub guid: Uuid,
    pub event_id: Uuid,
    pub display_order: i64,
    pub approved: bool,
    pub hidden: bool,
}

/// One line of an entry's transcript
#[derive(Debug, Clone)]
pub struct EntryLine {
    pub guid: Uuid,
    pub entry_id: Uuid,
    pub line_order: i64,
    pub speaker: String,
    pub text: String,
}

/// An entry with its transcript lines and tag names, ready for rendering
#[derive(Debug, Clone)]
pub struct EntryDetail {
    pub entry: Entry,
    pub lines: Vec<EntryLine>,
    pub tags: Vec<String>,
}

/// A tag with combined usage counts
#[derive(Debug, Clone, Serialize)]
pub struct TagUsage {
    pub name: String,
    pub entry_count: i64,
    pub event_count: i64,
}

impl TagUsage {
    pub fn total(&self) -> i64 {
        self.entry_count + self.event_count
    }
}

/// An archived source (audio recording or image) attached to an event
#[derive(Debug, Clone)]
pub struct Source {
    pub guid: Uuid,
    pub event_id: Uuid,
    pub title: String,
    pub url: String,
    pub kind: SourceKind,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Audio,
    Image,
}

impl SourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Audio => "audio",
            SourceKind::Image => "image",
        }
    }
}

/// A link shown in the home page footer
#[derive(Debug, Clone)]
pub struct RelatedSite {
    pub name: String,
    pub url: String,
    pub image_url: Option<String>,
}

/// Per-user display settings
#[derive(Debug, Clone)]
pub struct UserSettings {
    pub user_id: Uuid,
    pub page_length: i64,
    pub timezone: String,
}
