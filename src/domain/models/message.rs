#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use uuid::Uuid;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One ordered piece of a message. Only text is produced here, anything else
/// received over the wire is carried as `Other` and never sent to a provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MessagePart {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub parts: Vec<MessagePart>,
}

impl Message {
    pub fn new(role: Role, text: &str) -> Message {
        return Message {
            id: Uuid::new_v4().to_string(),
            role,
            parts: vec![MessagePart::Text {
                text: text.to_string(),
            }],
        };
    }

    pub fn empty(id: &str, role: Role) -> Message {
        return Message {
            id: id.to_string(),
            role,
            parts: vec![],
        };
    }

    /// All text parts joined in order.
    pub fn text(&self) -> String {
        return self
            .parts
            .iter()
            .filter_map(|part| {
                if let MessagePart::Text { text } = part {
                    return Some(text.as_str());
                }
                return None;
            })
            .collect::<Vec<&str>>()
            .join("");
    }

    pub fn push_text_part(&mut self, text: &str) {
        self.parts.push(MessagePart::Text {
            text: text.to_string(),
        });
    }

    pub fn append(&mut self, text: &str) {
        if let Some(MessagePart::Text { text: current }) = self.parts.last_mut() {
            current.push_str(text);
            return;
        }

        self.push_text_part(text);
    }
}
