//! Chat events as seen by the dispatch layer.
//!
//! The transport that produces these events is external; [`Event`] only
//! carries what trigger matching, rate limiting and the built-in middlewares
//! need.

use serde::{Deserialize, Serialize};

/// Whether a message arrived in a private chat or a group conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Private,
    Group,
}

impl MessageType {
    /// Returns the wire name of this message type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Group => "group",
        }
    }
}

/// The category of an incoming event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// A chat message.
    Message,
    /// A notice such as a member joining or a message being recalled.
    Notice { notice_type: String },
}

/// An incoming chat event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub message_type: MessageType,
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default)]
    pub text: String,
}

impl Event {
    /// Creates a private message event.
    pub fn private(user_id: i64, text: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Message,
            message_type: MessageType::Private,
            user_id,
            group_id: None,
            sender: None,
            text: text.into(),
        }
    }

    /// Creates a group message event.
    pub fn group(group_id: i64, user_id: i64, text: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Message,
            message_type: MessageType::Group,
            user_id,
            group_id: Some(group_id),
            sender: None,
            text: text.into(),
        }
    }

    /// Creates a notice event. A notice without a group is treated as private.
    pub fn notice(notice_type: impl Into<String>, user_id: i64, group_id: Option<i64>) -> Self {
        Self {
            kind: EventKind::Notice {
                notice_type: notice_type.into(),
            },
            message_type: if group_id.is_some() {
                MessageType::Group
            } else {
                MessageType::Private
            },
            user_id,
            group_id,
            sender: None,
            text: String::new(),
        }
    }

    /// Sets the display name of the sender.
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Returns `true` for message events.
    pub fn is_message(&self) -> bool {
        matches!(self.kind, EventKind::Message)
    }

    /// Returns `true` for notice events.
    pub fn is_notice(&self) -> bool {
        matches!(self.kind, EventKind::Notice { .. })
    }

    /// The conversation this event belongs to: the group for group events,
    /// the sender for private ones.
    pub fn conversation_id(&self) -> i64 {
        self.group_id.unwrap_or(self.user_id)
    }
}
