//! Conversation and message models as served by the marketplace API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marketplace role of an account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "chauffeur")]
    Driver,
    #[serde(alias = "employeur")]
    Employer,
    Admin,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Driver => "Chauffeur",
            Role::Employer => "Employeur",
            Role::Admin => "Admin",
            Role::Unknown => "?",
        }
    }

    /// Employers and admins publish offers; anyone else only browses
    pub fn can_publish_offers(&self) -> bool {
        matches!(self, Role::Employer | Role::Admin)
    }
}

/// The other side of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    pub content: String,
    pub sender_id: String,
    pub timestamp: DateTime<Utc>,
}

/// One row of the inbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    #[serde(alias = "_id")]
    pub id: String,
    pub other_participant: Participant,
    #[serde(default)]
    pub last_message: Option<LastMessage>,
    #[serde(default)]
    pub unread_count: u32,
}

/// A message inside an open conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(alias = "_id")]
    pub id: String,
    pub sender_id: String,
    pub content: String,
    #[serde(alias = "createdAt")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl Message {
    pub fn as_last_message(&self) -> LastMessage {
        LastMessage {
            content: self.content.clone(),
            sender_id: self.sender_id.clone(),
            timestamp: self.timestamp,
        }
    }
}

/// Sum of unread counts across the inbox
pub fn unread_total(conversations: &[ConversationSummary]) -> u32 {
    conversations
        .iter()
        .map(|conversation| conversation.unread_count)
        .fold(0u32, u32::saturating_add)
}

/// Compact relative time for list rows ("now", "5m", "3h", "2d")
pub fn format_age(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - timestamp).num_seconds().max(0);
    match secs {
        0..=59 => "now".to_string(),
        60..=3599 => format!("{}m", secs / 60),
        3600..=86_399 => format!("{}h", secs / 3600),
        _ => format!("{}d", secs / 86_400),
    }
}
