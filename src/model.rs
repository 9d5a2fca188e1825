//! Domain types and pure domain rules.
//!
//! Defines the four device-scoped entities ([`Settings`], [`Stats`],
//! [`LibraryItem`], [`ChatSession`]) plus the rules the backend applies to
//! them: the calendar-day activity rollover, chat title/preview derivation,
//! and the session message cap. Wire JSON uses camelCase field names.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of messages retained per chat session.
pub const SESSION_MESSAGE_CAP: usize = 100;

/// Character budget for a derived session title.
pub const SESSION_TITLE_CHARS: usize = 15;

/// Character budget for a derived session preview.
pub const SESSION_PREVIEW_CHARS: usize = 30;

/// App color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
    Ink,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
            Self::Ink => "ink",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-device app settings. Singleton: one row per device, replaced wholesale
/// on save. Every section carries `#[serde(default)]` so a partial payload is
/// filled in from defaults rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme: Theme,
    pub notifications: NotificationSettings,
    pub privacy: PrivacySettings,
    pub accessibility: AccessibilitySettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub daily_fact: bool,
    pub exploration_goal: bool,
    pub system_updates: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            daily_fact: true,
            exploration_goal: true,
            system_updates: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivacySettings {
    pub clear_on_exit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessibilitySettings {
    pub high_contrast: bool,
    pub reduce_motion: bool,
}

/// Per-device activity stats. Singleton per device.
///
/// `items_saved` is derived: after any library mutation it equals the
/// device's library row count. `days_active` rolls forward at most once per
/// local calendar day via [`Stats::roll_daily`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    pub items_saved: i64,
    pub days_active: u32,
    pub last_login: DateTime<Utc>,
    pub join_date: DateTime<Utc>,
    pub xp: i64,
}

impl Default for Stats {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            items_saved: 0,
            days_active: 1,
            last_login: now,
            join_date: now,
            xp: 0,
        }
    }
}

impl Stats {
    /// Apply the calendar rule: if the stored `last_login` falls on a
    /// different local calendar date than `now`, bump `days_active` and move
    /// `last_login` forward. Returns whether anything changed.
    pub fn roll_daily(&mut self, now: DateTime<Utc>) -> bool {
        let last = self.last_login.with_timezone(&Local).date_naive();
        let today = now.with_timezone(&Local).date_naive();
        if last != today {
            self.days_active += 1;
            self.last_login = now;
            true
        } else {
            false
        }
    }
}

/// How a library item was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Saved from a camera scan result.
    Scan,
    /// Saved from a generated knowledge card.
    #[default]
    Card,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::Card => "card",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scan" => Ok(Self::Scan),
            "card" => Ok(Self::Card),
            _ => Err(format!("unknown item kind: {s}")),
        }
    }
}

/// A saved knowledge card or scan result. Ordered newest-first for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryItem {
    /// UUID v7 (time-sortable) primary key.
    pub id: String,
    pub kind: ItemKind,
    pub title: String,
    pub content: String,
    pub category: String,
    /// Image URL or inline data URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fun_fact: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LibraryItem {
    /// Build a full item from user-supplied fields plus a generated identity.
    pub fn from_new(new: NewLibraryItem, id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            kind: new.kind,
            title: new.title,
            content: new.content,
            category: new.category,
            thumbnail: new.thumbnail,
            fun_fact: new.fun_fact,
            created_at,
        }
    }
}

/// User-supplied fields of a library item being saved. Omitted fields take
/// the documented defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewLibraryItem {
    pub kind: ItemKind,
    pub title: String,
    pub content: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fun_fact: Option<String>,
}

impl Default for NewLibraryItem {
    fn default() -> Self {
        Self {
            kind: ItemKind::Card,
            title: String::new(),
            content: String::new(),
            category: "general".into(),
            thumbnail: None,
            fun_fact: None,
        }
    }
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A single chat message, owned by its session and persisted only inside the
/// session's message list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

/// A chat conversation: derived title and preview plus the capped message
/// list. Ordered newest-first by `updated_at` for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// Build a fresh session from the first user message, deriving the title
    /// and seeding the preview from it.
    pub fn from_first_message(first_message_text: &str, id: String, updated_at: DateTime<Utc>) -> Self {
        let title = session_title(first_message_text);
        Self {
            id,
            preview: title.clone(),
            title,
            updated_at,
            messages: Vec::new(),
        }
    }
}

/// Derive a session title: the first 15 characters of the trimmed first
/// message, `...`-suffixed when truncated.
pub fn session_title(first_message_text: &str) -> String {
    let text = first_message_text.trim();
    let mut title: String = text.chars().take(SESSION_TITLE_CHARS).collect();
    if text.chars().count() > SESSION_TITLE_CHARS {
        title.push_str("...");
    }
    title
}

/// Derive a session preview from the latest message: its first 30 characters,
/// always `...`-suffixed.
pub fn session_preview(latest_text: &str) -> String {
    let mut preview: String = latest_text.chars().take(SESSION_PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

/// Truncate a message list to the most recent [`SESSION_MESSAGE_CAP`]
/// entries, preserving order.
pub fn cap_messages(mut messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    if messages.len() > SESSION_MESSAGE_CAP {
        messages.drain(..messages.len() - SESSION_MESSAGE_CAP);
    }
    messages
}
