use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExhibitionStatus {
    Draft,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Public,
}

/// A user-owned curated show.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exhibition {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner_id: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub keywords: Vec<String>,
    pub description: Option<String>,
    pub status: ExhibitionStatus,
    pub visibility: Visibility,
    pub poster_url: Option<String>,
    pub poster_storage_key: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Exhibition {
    pub fn new(owner_id: String, keywords: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            title: None,
            subtitle: None,
            keywords: normalize_keywords(keywords),
            description: None,
            status: ExhibitionStatus::Draft,
            visibility: Visibility::Private,
            poster_url: None,
            poster_storage_key: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    /// Public exhibitions are visible to everyone, private ones only to
    /// their owner.
    pub fn can_view(&self, user_id: Option<&str>) -> bool {
        self.is_public() || user_id.is_some_and(|uid| self.is_owned_by(uid))
    }

    pub fn has_title(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// Storage prefix under which the exhibition's images live.
    pub fn storage_prefix(&self) -> String {
        storage_prefix(&self.id)
    }

    /// A private draft copy owned by `owner_id`. The poster is not carried
    /// over since its object belongs to the source exhibition.
    pub fn duplicate_for(&self, owner_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            title: self.title.as_ref().map(|t| format!("{} (copy)", t)),
            subtitle: self.subtitle.clone(),
            keywords: self.keywords.clone(),
            description: self.description.clone(),
            status: ExhibitionStatus::Draft,
            visibility: Visibility::Private,
            poster_url: None,
            poster_storage_key: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

pub fn storage_prefix(exhibition_id: &str) -> String {
    format!("exhibitions/{}/", exhibition_id)
}

/// Trim, drop empties and de-duplicate case-insensitively, keeping the first
/// spelling seen.
pub fn normalize_keywords(keywords: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_exhibition_is_private_draft() {
        let exhibition = Exhibition::new("user-1".to_string(), vec!["light".to_string()]);
        assert_eq!(exhibition.status, ExhibitionStatus::Draft);
        assert_eq!(exhibition.visibility, Visibility::Private);
        assert!(!exhibition.has_title());
    }

    #[test]
    fn private_exhibition_only_visible_to_owner() {
        let exhibition = Exhibition::new("owner".to_string(), vec![]);
        assert!(exhibition.can_view(Some("owner")));
        assert!(!exhibition.can_view(Some("someone-else")));
        assert!(!exhibition.can_view(None));
    }

    #[test]
    fn public_exhibition_visible_to_anyone() {
        let mut exhibition = Exhibition::new("owner".to_string(), vec![]);
        exhibition.visibility = Visibility::Public;
        assert!(exhibition.can_view(None));
        assert!(exhibition.can_view(Some("someone-else")));
    }

    #[test]
    fn duplicate_resets_state_and_suffixes_title() {
        let mut source = Exhibition::new("owner".to_string(), vec!["sea".to_string()]);
        source.title = Some("Tides".to_string());
        source.visibility = Visibility::Public;
        source.status = ExhibitionStatus::Completed;
        source.poster_url = Some("http://files/poster.png".to_string());

        let copy = source.duplicate_for("other");
        assert_ne!(copy.id, source.id);
        assert_eq!(copy.owner_id, "other");
        assert_eq!(copy.title.as_deref(), Some("Tides (copy)"));
        assert_eq!(copy.keywords, source.keywords);
        assert_eq!(copy.status, ExhibitionStatus::Draft);
        assert_eq!(copy.visibility, Visibility::Private);
        assert!(copy.poster_url.is_none());
    }

    #[test]
    fn keywords_are_trimmed_and_deduplicated() {
        let keywords = normalize_keywords(vec![
            " Memory ".to_string(),
            "".to_string(),
            "memory".to_string(),
            "Archive".to_string(),
        ]);
        assert_eq!(keywords, vec!["Memory".to_string(), "Archive".to_string()]);
    }

    #[test]
    fn status_serializes_as_snake_case() {
        let value = serde_json::to_value(ExhibitionStatus::InProgress).unwrap();
        assert_eq!(value, "in_progress");
    }
}
