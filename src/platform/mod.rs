pub mod stdio;

use serde::{Deserialize, Serialize};

/// Kind of content carried by a host event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContextType {
    Text,
    #[serde(other)]
    Other,
}

/// An identifier field on the platform message. Some gateways send the
/// bare string, others wrap it as `{"string": "..."}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum IdField {
    Plain(String),
    Wrapped { string: String },
}

impl IdField {
    pub fn as_str(&self) -> &str {
        match self {
            IdField::Plain(s) => s,
            IdField::Wrapped { string } => string,
        }
    }
}

/// The underlying platform message attached to a host event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub from_user_id: Option<IdField>,
    #[serde(default)]
    pub from_wxid: Option<IdField>,
    #[serde(default, rename = "FromUserName")]
    pub from_user_name: Option<IdField>,
}

impl ChatMessage {
    /// Identifier fields in lookup order.
    fn sender_fields(&self) -> [Option<&IdField>; 3] {
        [
            self.from_user_id.as_ref(),
            self.from_wxid.as_ref(),
            self.from_user_name.as_ref(),
        ]
    }
}

/// A message received from the host
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Context {
    #[serde(rename = "type")]
    pub kind: ContextType,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub msg: Option<ChatMessage>,
}

impl Context {
    #[cfg(test)]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: ContextType::Text,
            content: content.into(),
            session_id: None,
            msg: None,
        }
    }

    /// Resolve who sent this message: the session id if set, otherwise the
    /// first non-empty identifier on the platform message.
    pub fn sender_id(&self) -> Option<&str> {
        if let Some(session_id) = self.session_id.as_deref().filter(|s| !s.is_empty()) {
            return Some(session_id);
        }

        self.msg.as_ref().and_then(|msg| {
            msg.sender_fields()
                .into_iter()
                .flatten()
                .map(IdField::as_str)
                .find(|id| !id.is_empty())
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplyType {
    Text,
    Error,
}

/// Reply a plugin asks the host to send back to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    #[serde(rename = "type")]
    pub kind: ReplyType,
    pub content: String,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: ReplyType::Text,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            kind: ReplyType::Error,
            content: content.into(),
        }
    }
}

/// What the host should do with the event after a plugin ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventAction {
    /// Pass the event on to the next plugin.
    #[default]
    Continue,
    /// Stop the plugin chain and let the host's default handling run.
    #[allow(dead_code)]
    Break,
    /// Stop the plugin chain and skip the default handling.
    BreakPass,
}

impl EventAction {
    pub fn stops_chain(self) -> bool {
        !matches!(self, EventAction::Continue)
    }
}

/// Mutable envelope the host passes through the plugin chain.
#[derive(Debug, Clone)]
pub struct EventContext {
    pub context: Context,
    pub reply: Option<Reply>,
    pub action: EventAction,
}

impl EventContext {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            reply: None,
            action: EventAction::Continue,
        }
    }
}
