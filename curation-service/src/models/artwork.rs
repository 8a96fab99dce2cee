use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An image plus metadata belonging to an exhibition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artwork {
    #[serde(rename = "_id")]
    pub id: String,
    pub exhibition_id: String,
    pub owner_id: String,
    pub title: String,
    pub artist: Option<String>,
    pub year: Option<String>,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    pub description: Option<String>,
    pub image_url: String,
    pub storage_key: Option<String>,
    pub position: i32,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Artwork {
    pub fn new(
        exhibition_id: String,
        owner_id: String,
        title: String,
        image_url: String,
        storage_key: Option<String>,
        position: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            exhibition_id,
            owner_id,
            title,
            artist: None,
            year: None,
            medium: None,
            dimensions: None,
            description: None,
            image_url,
            storage_key,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy into another exhibition. The copy references the same image
    /// object; only the record is duplicated.
    pub fn duplicate_into(&self, exhibition_id: &str, owner_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            exhibition_id: exhibition_id.to_string(),
            owner_id: owner_id.to_string(),
            storage_key: None,
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }

    /// One-line caption used in prompts.
    pub fn caption(&self) -> String {
        let mut caption = self.title.clone();
        if let Some(artist) = &self.artist {
            caption.push_str(&format!(" by {}", artist));
        }
        if let Some(year) = &self.year {
            caption.push_str(&format!(" ({})", year));
        }
        if let Some(medium) = &self.medium {
            caption.push_str(&format!(", {}", medium));
        }
        caption
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_includes_known_fields() {
        let mut artwork = Artwork::new(
            "ex-1".to_string(),
            "owner".to_string(),
            "Harbour at Dusk".to_string(),
            "http://files/a.png".to_string(),
            None,
            0,
        );
        assert_eq!(artwork.caption(), "Harbour at Dusk");

        artwork.artist = Some("M. Kim".to_string());
        artwork.year = Some("1998".to_string());
        artwork.medium = Some("oil on canvas".to_string());
        assert_eq!(
            artwork.caption(),
            "Harbour at Dusk by M. Kim (1998), oil on canvas"
        );
    }

    #[test]
    fn duplicate_shares_image_but_not_storage_ownership() {
        let artwork = Artwork::new(
            "ex-1".to_string(),
            "owner".to_string(),
            "Study".to_string(),
            "http://files/exhibitions/ex-1/a.png".to_string(),
            Some("exhibitions/ex-1/a.png".to_string()),
            3,
        );

        let copy = artwork.duplicate_into("ex-2", "owner");
        assert_ne!(copy.id, artwork.id);
        assert_eq!(copy.exhibition_id, "ex-2");
        assert_eq!(copy.image_url, artwork.image_url);
        assert_eq!(copy.position, 3);
        assert!(copy.storage_key.is_none());
    }
}
