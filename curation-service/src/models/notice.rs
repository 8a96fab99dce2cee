use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A site announcement written by an administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub body: String,
    pub pinned: bool,
    pub published: bool,
    pub author_id: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(author_id: String, title: String, body: String, pinned: bool, published: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            body,
            pinned,
            published,
            author_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Pinned notices first, then newest first.
pub fn sort_notices(notices: &mut [Notice]) {
    notices.sort_by(|a, b| {
        b.pinned
            .cmp(&a.pinned)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn pinned_notices_sort_first() {
        let mut old_pinned = Notice::new("a".into(), "Old".into(), "b".into(), true, true);
        old_pinned.created_at = Utc::now() - Duration::days(10);
        let new_plain = Notice::new("a".into(), "New".into(), "b".into(), false, true);
        let mut older_plain = Notice::new("a".into(), "Older".into(), "b".into(), false, true);
        older_plain.created_at = Utc::now() - Duration::days(1);

        let mut notices = vec![older_plain, new_plain, old_pinned];
        sort_notices(&mut notices);

        let titles: Vec<_> = notices.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Old", "New", "Older"]);
    }
}
