use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Stage of the curation conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatStep {
    Title,
    Content,
    Poster,
    Gallery,
}

/// What an exhibition already has, as far as step gating is concerned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub has_title: bool,
    pub content_blocks: usize,
    pub artworks: usize,
}

impl ChatStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatStep::Title => "title",
            ChatStep::Content => "content",
            ChatStep::Poster => "poster",
            ChatStep::Gallery => "gallery",
        }
    }

    /// Returns the missing prerequisite, if any, for entering this step.
    pub fn requirement(&self, progress: &ProgressSnapshot) -> Result<(), String> {
        match self {
            ChatStep::Title => Ok(()),
            ChatStep::Content if !progress.has_title => Err(
                "The exhibition needs a title before working on its content".to_string(),
            ),
            ChatStep::Poster if progress.content_blocks == 0 => Err(
                "The exhibition needs at least one content block before designing a poster"
                    .to_string(),
            ),
            ChatStep::Gallery if progress.artworks == 0 => Err(
                "The exhibition needs at least one artwork before arranging the gallery"
                    .to_string(),
            ),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_step_is_always_open() {
        assert!(ChatStep::Title
            .requirement(&ProgressSnapshot::default())
            .is_ok());
    }

    #[test]
    fn content_step_requires_title() {
        let mut progress = ProgressSnapshot::default();
        let err = ChatStep::Content.requirement(&progress).unwrap_err();
        assert!(err.contains("title"));

        progress.has_title = true;
        assert!(ChatStep::Content.requirement(&progress).is_ok());
    }

    #[test]
    fn poster_step_requires_content() {
        let progress = ProgressSnapshot {
            has_title: true,
            content_blocks: 0,
            artworks: 4,
        };
        let err = ChatStep::Poster.requirement(&progress).unwrap_err();
        assert!(err.contains("content block"));
    }

    #[test]
    fn gallery_step_requires_artwork() {
        let progress = ProgressSnapshot {
            has_title: true,
            content_blocks: 2,
            artworks: 0,
        };
        assert!(ChatStep::Gallery.requirement(&progress).is_err());
        assert!(ChatStep::Poster.requirement(&progress).is_ok());
    }

    #[test]
    fn step_deserializes_from_lowercase() {
        let step: ChatStep = serde_json::from_str("\"gallery\"").unwrap();
        assert_eq!(step, ChatStep::Gallery);
    }
}
