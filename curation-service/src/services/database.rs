//! Persistence for exhibitions and the records around them.
//!
//! [`CurationStore`] is the seam the handlers talk to. [`MongoStore`] is the
//! production implementation; `MemoryStore` backs tests and local demos.

use crate::models::{
    Artwork, ContactInquiry, Exhibition, ExhibitionContent, InquiryStatus, Notice,
    RegistrationNotification,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Client as MongoClient, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::{FindOptions, IndexOptions},
};
use service_core::error::AppError;

#[async_trait]
pub trait CurationStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    // Exhibitions
    async fn insert_exhibition(&self, exhibition: &Exhibition) -> Result<(), AppError>;
    async fn find_exhibition(&self, id: &str) -> Result<Option<Exhibition>, AppError>;
    /// Newest first.
    async fn list_exhibitions_by_owner(&self, owner_id: &str) -> Result<Vec<Exhibition>, AppError>;
    /// One page of public exhibitions (newest first) plus the total count.
    async fn list_public_exhibitions(&self, page: u64, page_size: u64) -> Result<(Vec<Exhibition>, u64), AppError>;
    async fn replace_exhibition(&self, exhibition: &Exhibition) -> Result<bool, AppError>;
    async fn delete_exhibition(&self, id: &str) -> Result<bool, AppError>;

    // Artworks
    async fn insert_artwork(&self, artwork: &Artwork) -> Result<(), AppError>;
    async fn insert_artworks(&self, artworks: &[Artwork]) -> Result<(), AppError>;
    async fn find_artwork(&self, id: &str) -> Result<Option<Artwork>, AppError>;
    /// Ordered by `position`.
    async fn list_artworks(&self, exhibition_id: &str) -> Result<Vec<Artwork>, AppError>;
    async fn replace_artwork(&self, artwork: &Artwork) -> Result<bool, AppError>;
    async fn delete_artwork(&self, id: &str) -> Result<bool, AppError>;
    async fn delete_artworks_by_exhibition(&self, exhibition_id: &str) -> Result<u64, AppError>;

    // Content
    async fn insert_content(&self, content: &ExhibitionContent) -> Result<(), AppError>;
    async fn insert_contents(&self, contents: &[ExhibitionContent]) -> Result<(), AppError>;
    /// Insert or replace the block keyed by `(exhibition_id, kind, artwork_id)`.
    /// An existing block keeps its id and creation time.
    async fn upsert_content(&self, content: ExhibitionContent) -> Result<ExhibitionContent, AppError>;
    async fn replace_content(&self, content: &ExhibitionContent) -> Result<bool, AppError>;
    /// Ordered by `(kind, position)`.
    async fn list_content(&self, exhibition_id: &str) -> Result<Vec<ExhibitionContent>, AppError>;
    async fn delete_content(&self, exhibition_id: &str, content_id: &str) -> Result<bool, AppError>;
    async fn delete_content_by_exhibition(&self, exhibition_id: &str) -> Result<u64, AppError>;

    // Contact inquiries
    async fn insert_inquiry(&self, inquiry: &ContactInquiry) -> Result<(), AppError>;
    async fn list_inquiries(&self) -> Result<Vec<ContactInquiry>, AppError>;
    async fn update_inquiry_status(&self, id: &str, status: InquiryStatus) -> Result<bool, AppError>;

    // Notices
    async fn insert_notice(&self, notice: &Notice) -> Result<(), AppError>;
    async fn find_notice(&self, id: &str) -> Result<Option<Notice>, AppError>;
    /// Pinned first, then newest.
    async fn list_notices(&self, include_unpublished: bool) -> Result<Vec<Notice>, AppError>;
    async fn replace_notice(&self, notice: &Notice) -> Result<bool, AppError>;
    async fn delete_notice(&self, id: &str) -> Result<bool, AppError>;

    // Registration notifications
    async fn insert_registration(&self, registration: &RegistrationNotification) -> Result<(), AppError>;
    async fn list_registrations(&self) -> Result<Vec<RegistrationNotification>, AppError>;
    async fn mark_registration_read(&self, id: &str) -> Result<bool, AppError>;
}

/// Sort content blocks by kind, then position. Stable, so equal keys keep
/// their fetch order.
pub fn sort_content(contents: &mut [ExhibitionContent]) {
    contents.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.position.cmp(&b.position)));
}

/// Number of records before `page`. Saturates rather than overflowing.
pub fn page_offset(page: u64, page_size: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(page_size)
}

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to MongoDB");
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Connected to MongoDB database");
        Ok(Self { db })
    }

    fn exhibitions(&self) -> Collection<Exhibition> {
        self.db.collection("exhibitions")
    }

    fn artworks(&self) -> Collection<Artwork> {
        self.db.collection("artworks")
    }

    fn content(&self) -> Collection<ExhibitionContent> {
        self.db.collection("exhibition_content")
    }

    fn inquiries(&self) -> Collection<ContactInquiry> {
        self.db.collection("contact_inquiries")
    }

    fn notices(&self) -> Collection<Notice> {
        self.db.collection("notices")
    }

    fn registrations(&self) -> Collection<RegistrationNotification> {
        self.db.collection("registration_notifications")
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for curation-service");

        create_index(&self.exhibitions(), doc! { "owner_id": 1, "created_at": -1 }, "owner_idx").await?;
        create_index(
            &self.exhibitions(),
            doc! { "visibility": 1, "created_at": -1 },
            "visibility_created_idx",
        )
        .await?;
        create_index(
            &self.artworks(),
            doc! { "exhibition_id": 1, "position": 1 },
            "exhibition_position_idx",
        )
        .await?;
        create_index(
            &self.content(),
            doc! { "exhibition_id": 1, "kind": 1, "artwork_id": 1 },
            "exhibition_kind_idx",
        )
        .await?;
        create_index(&self.inquiries(), doc! { "created_at": -1 }, "created_at_idx").await?;
        create_index(&self.notices(), doc! { "pinned": -1, "created_at": -1 }, "pinned_created_idx").await?;
        create_index(&self.registrations(), doc! { "created_at": -1 }, "created_at_idx").await?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }
}

async fn create_index<T>(collection: &Collection<T>, keys: Document, name: &str) -> Result<(), AppError> {
    let index = IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().name(name.to_string()).build())
        .build();

    collection.create_index(index, None).await.map_err(|e| {
        tracing::error!(collection = %collection.name(), index = %name, error = %e, "Failed to create index");
        AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
    })?;
    Ok(())
}

fn newest_first() -> FindOptions {
    FindOptions::builder().sort(doc! { "created_at": -1 }).build()
}

fn to_bson<T: serde::Serialize>(value: &T) -> Result<mongodb::bson::Bson, AppError> {
    mongodb::bson::to_bson(value).map_err(|e| AppError::InternalError(anyhow::Error::new(e)))
}

#[async_trait]
impl CurationStore for MongoStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    async fn insert_exhibition(&self, exhibition: &Exhibition) -> Result<(), AppError> {
        self.exhibitions().insert_one(exhibition, None).await?;
        Ok(())
    }

    async fn find_exhibition(&self, id: &str) -> Result<Option<Exhibition>, AppError> {
        Ok(self.exhibitions().find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_exhibitions_by_owner(&self, owner_id: &str) -> Result<Vec<Exhibition>, AppError> {
        let cursor = self
            .exhibitions()
            .find(doc! { "owner_id": owner_id }, newest_first())
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list_public_exhibitions(&self, page: u64, page_size: u64) -> Result<(Vec<Exhibition>, u64), AppError> {
        let filter = doc! { "visibility": "public" };
        let total = self.exhibitions().count_documents(filter.clone(), None).await?;

        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip(page_offset(page, page_size))
            .limit(page_size as i64)
            .build();
        let cursor = self.exhibitions().find(filter, options).await?;
        Ok((cursor.try_collect().await?, total))
    }

    async fn replace_exhibition(&self, exhibition: &Exhibition) -> Result<bool, AppError> {
        let result = self
            .exhibitions()
            .replace_one(doc! { "_id": exhibition.id.as_str() }, exhibition, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_exhibition(&self, id: &str) -> Result<bool, AppError> {
        let result = self.exhibitions().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_artwork(&self, artwork: &Artwork) -> Result<(), AppError> {
        self.artworks().insert_one(artwork, None).await?;
        Ok(())
    }

    async fn insert_artworks(&self, artworks: &[Artwork]) -> Result<(), AppError> {
        if artworks.is_empty() {
            return Ok(());
        }
        self.artworks().insert_many(artworks, None).await?;
        Ok(())
    }

    async fn find_artwork(&self, id: &str) -> Result<Option<Artwork>, AppError> {
        Ok(self.artworks().find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_artworks(&self, exhibition_id: &str) -> Result<Vec<Artwork>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "position": 1, "created_at": 1 })
            .build();
        let cursor = self
            .artworks()
            .find(doc! { "exhibition_id": exhibition_id }, options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn replace_artwork(&self, artwork: &Artwork) -> Result<bool, AppError> {
        let result = self
            .artworks()
            .replace_one(doc! { "_id": artwork.id.as_str() }, artwork, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_artwork(&self, id: &str) -> Result<bool, AppError> {
        let result = self.artworks().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_artworks_by_exhibition(&self, exhibition_id: &str) -> Result<u64, AppError> {
        let result = self
            .artworks()
            .delete_many(doc! { "exhibition_id": exhibition_id }, None)
            .await?;
        Ok(result.deleted_count)
    }

    async fn insert_content(&self, content: &ExhibitionContent) -> Result<(), AppError> {
        self.content().insert_one(content, None).await?;
        Ok(())
    }

    async fn insert_contents(&self, contents: &[ExhibitionContent]) -> Result<(), AppError> {
        if contents.is_empty() {
            return Ok(());
        }
        self.content().insert_many(contents, None).await?;
        Ok(())
    }

    async fn upsert_content(&self, mut content: ExhibitionContent) -> Result<ExhibitionContent, AppError> {
        let filter = doc! {
            "exhibition_id": content.exhibition_id.as_str(),
            "kind": content.kind.as_str(),
            "artwork_id": content.artwork_id.clone(),
        };

        match self.content().find_one(filter, None).await? {
            Some(existing) => {
                content.id = existing.id;
                content.created_at = existing.created_at;
                self.content()
                    .replace_one(doc! { "_id": content.id.as_str() }, &content, None)
                    .await?;
            }
            None => {
                self.content().insert_one(&content, None).await?;
            }
        }
        Ok(content)
    }

    async fn replace_content(&self, content: &ExhibitionContent) -> Result<bool, AppError> {
        let result = self
            .content()
            .replace_one(doc! { "_id": content.id.as_str() }, content, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn list_content(&self, exhibition_id: &str) -> Result<Vec<ExhibitionContent>, AppError> {
        let options = FindOptions::builder().sort(doc! { "position": 1 }).build();
        let cursor = self
            .content()
            .find(doc! { "exhibition_id": exhibition_id }, options)
            .await?;
        let mut contents: Vec<ExhibitionContent> = cursor.try_collect().await?;
        sort_content(&mut contents);
        Ok(contents)
    }

    async fn delete_content(&self, exhibition_id: &str, content_id: &str) -> Result<bool, AppError> {
        let result = self
            .content()
            .delete_one(doc! { "_id": content_id, "exhibition_id": exhibition_id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_content_by_exhibition(&self, exhibition_id: &str) -> Result<u64, AppError> {
        let result = self
            .content()
            .delete_many(doc! { "exhibition_id": exhibition_id }, None)
            .await?;
        Ok(result.deleted_count)
    }

    async fn insert_inquiry(&self, inquiry: &ContactInquiry) -> Result<(), AppError> {
        self.inquiries().insert_one(inquiry, None).await?;
        Ok(())
    }

    async fn list_inquiries(&self) -> Result<Vec<ContactInquiry>, AppError> {
        let cursor = self.inquiries().find(doc! {}, newest_first()).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update_inquiry_status(&self, id: &str, status: InquiryStatus) -> Result<bool, AppError> {
        let result = self
            .inquiries()
            .update_one(doc! { "_id": id }, doc! { "$set": { "status": to_bson(&status)? } }, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn insert_notice(&self, notice: &Notice) -> Result<(), AppError> {
        self.notices().insert_one(notice, None).await?;
        Ok(())
    }

    async fn find_notice(&self, id: &str) -> Result<Option<Notice>, AppError> {
        Ok(self.notices().find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_notices(&self, include_unpublished: bool) -> Result<Vec<Notice>, AppError> {
        let filter = if include_unpublished {
            doc! {}
        } else {
            doc! { "published": true }
        };
        let options = FindOptions::builder()
            .sort(doc! { "pinned": -1, "created_at": -1 })
            .build();
        let cursor = self.notices().find(filter, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn replace_notice(&self, notice: &Notice) -> Result<bool, AppError> {
        let result = self
            .notices()
            .replace_one(doc! { "_id": notice.id.as_str() }, notice, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_notice(&self, id: &str) -> Result<bool, AppError> {
        let result = self.notices().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_registration(&self, registration: &RegistrationNotification) -> Result<(), AppError> {
        self.registrations().insert_one(registration, None).await?;
        Ok(())
    }

    async fn list_registrations(&self) -> Result<Vec<RegistrationNotification>, AppError> {
        let cursor = self.registrations().find(doc! {}, newest_first()).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn mark_registration_read(&self, id: &str) -> Result<bool, AppError> {
        let result = self
            .registrations()
            .update_one(doc! { "_id": id }, doc! { "$set": { "read": true } }, None)
            .await?;
        Ok(result.matched_count > 0)
    }
}
