//! Wire types for the booking backend's `/talk` endpoint

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalkRequest {
    pub query: String,
    /// IANA timezone identifier, e.g. `Europe/Berlin`
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_time: Option<String>,
    /// Serialized as `null` before the backend has assigned one
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TalkResponse {
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// `null` reads the same as a missing list
    #[serde(default, deserialize_with = "null_as_empty")]
    pub messages: Vec<TalkMessage>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<TalkMessage>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<TalkMessage>>::deserialize(deserializer)?.unwrap_or_default())
}

impl TalkResponse {
    /// Content of the last message, if it has any
    pub fn reply(&self) -> Option<&str> {
        self.messages
            .last()
            .and_then(|m| m.content.as_deref())
            .filter(|c| !c.is_empty())
    }
}

/// One entry of the backend's message list; other fields are ignored
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TalkMessage {
    #[serde(default)]
    pub content: Option<String>,
}
