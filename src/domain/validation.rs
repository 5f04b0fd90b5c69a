use crate::domain::text::parse_list;

/// Sent with a connection request when the sender leaves the message blank
pub const DEFAULT_CONNECTION_MESSAGE: &str =
    "Hi! I'd love to connect and learn from each other.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please fill in the {0}")]
    EmptyField(&'static str),

    #[error("You can't connect with yourself")]
    SelfConnection,
}

/// A post that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub community_id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl NewPost {
    pub fn validate(
        community_id: &str,
        author_id: &str,
        title: &str,
        content: &str,
        tags: &str,
    ) -> Result<Self, ValidationError> {
        let title = title.trim();
        let content = content.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyField("title"));
        }
        if content.is_empty() {
            return Err(ValidationError::EmptyField("content"));
        }

        Ok(Self {
            community_id: community_id.to_string(),
            author_id: author_id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            tags: parse_list(tags),
        })
    }
}

pub fn comment_body(content: &str) -> Result<String, ValidationError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ValidationError::EmptyField("comment"));
    }
    Ok(content.to_string())
}

pub fn connection_message(from_id: &str, to_id: &str, message: &str) -> Result<String, ValidationError> {
    if from_id == to_id {
        return Err(ValidationError::SelfConnection);
    }
    let message = message.trim();
    if message.is_empty() {
        Ok(DEFAULT_CONNECTION_MESSAGE.to_string())
    } else {
        Ok(message.to_string())
    }
}
