//! In-process [`CurationStore`] used by the test suite and for running the
//! service without a database (`STORE_BACKEND=memory`).

use crate::models::{
    Artwork, ContactInquiry, Exhibition, ExhibitionContent, InquiryStatus, Notice,
    RegistrationNotification, notice::sort_notices,
};
use crate::services::database::{CurationStore, page_offset, sort_content};
use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    exhibitions: RwLock<HashMap<String, Exhibition>>,
    artworks: RwLock<HashMap<String, Artwork>>,
    content: RwLock<HashMap<String, ExhibitionContent>>,
    inquiries: RwLock<HashMap<String, ContactInquiry>>,
    notices: RwLock<HashMap<String, Notice>>,
    registrations: RwLock<HashMap<String, RegistrationNotification>>,
    fail_exhibition_updates: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `replace_exhibition` return a database error, for exercising
    /// handler error paths.
    pub fn fail_exhibition_updates(&self, fail: bool) {
        self.fail_exhibition_updates.store(fail, Ordering::SeqCst);
    }
}

fn insert_unique<T: Clone>(map: &mut HashMap<String, T>, id: &str, value: &T) -> Result<(), AppError> {
    if map.contains_key(id) {
        return Err(AppError::Conflict(anyhow::anyhow!("Duplicate id {}", id)));
    }
    map.insert(id.to_string(), value.clone());
    Ok(())
}

fn replace_existing<T: Clone>(map: &mut HashMap<String, T>, id: &str, value: &T) -> bool {
    match map.get_mut(id) {
        Some(slot) => {
            *slot = value.clone();
            true
        }
        None => false,
    }
}

#[async_trait]
impl CurationStore for MemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn insert_exhibition(&self, exhibition: &Exhibition) -> Result<(), AppError> {
        insert_unique(&mut *self.exhibitions.write().await, &exhibition.id, exhibition)
    }

    async fn find_exhibition(&self, id: &str) -> Result<Option<Exhibition>, AppError> {
        Ok(self.exhibitions.read().await.get(id).cloned())
    }

    async fn list_exhibitions_by_owner(&self, owner_id: &str) -> Result<Vec<Exhibition>, AppError> {
        let mut items: Vec<Exhibition> = self
            .exhibitions
            .read()
            .await
            .values()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn list_public_exhibitions(&self, page: u64, page_size: u64) -> Result<(Vec<Exhibition>, u64), AppError> {
        let mut items: Vec<Exhibition> = self
            .exhibitions
            .read()
            .await
            .values()
            .filter(|e| e.is_public())
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = items.len() as u64;
        let skip = usize::try_from(page_offset(page, page_size)).unwrap_or(usize::MAX);
        let page_items = items.into_iter().skip(skip).take(page_size as usize).collect();
        Ok((page_items, total))
    }

    async fn replace_exhibition(&self, exhibition: &Exhibition) -> Result<bool, AppError> {
        if self.fail_exhibition_updates.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!("exhibition updates disabled")));
        }
        Ok(replace_existing(&mut *self.exhibitions.write().await, &exhibition.id, exhibition))
    }

    async fn delete_exhibition(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.exhibitions.write().await.remove(id).is_some())
    }

    async fn insert_artwork(&self, artwork: &Artwork) -> Result<(), AppError> {
        insert_unique(&mut *self.artworks.write().await, &artwork.id, artwork)
    }

    async fn insert_artworks(&self, artworks: &[Artwork]) -> Result<(), AppError> {
        let mut map = self.artworks.write().await;
        for artwork in artworks {
            insert_unique(&mut map, &artwork.id, artwork)?;
        }
        Ok(())
    }

    async fn find_artwork(&self, id: &str) -> Result<Option<Artwork>, AppError> {
        Ok(self.artworks.read().await.get(id).cloned())
    }

    async fn list_artworks(&self, exhibition_id: &str) -> Result<Vec<Artwork>, AppError> {
        let mut items: Vec<Artwork> = self
            .artworks
            .read()
            .await
            .values()
            .filter(|a| a.exhibition_id == exhibition_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.created_at.cmp(&b.created_at)));
        Ok(items)
    }

    async fn replace_artwork(&self, artwork: &Artwork) -> Result<bool, AppError> {
        Ok(replace_existing(&mut *self.artworks.write().await, &artwork.id, artwork))
    }

    async fn delete_artwork(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.artworks.write().await.remove(id).is_some())
    }

    async fn delete_artworks_by_exhibition(&self, exhibition_id: &str) -> Result<u64, AppError> {
        let mut map = self.artworks.write().await;
        let before = map.len();
        map.retain(|_, a| a.exhibition_id != exhibition_id);
        Ok((before - map.len()) as u64)
    }

    async fn insert_content(&self, content: &ExhibitionContent) -> Result<(), AppError> {
        insert_unique(&mut *self.content.write().await, &content.id, content)
    }

    async fn insert_contents(&self, contents: &[ExhibitionContent]) -> Result<(), AppError> {
        let mut map = self.content.write().await;
        for content in contents {
            insert_unique(&mut map, &content.id, content)?;
        }
        Ok(())
    }

    async fn upsert_content(&self, mut content: ExhibitionContent) -> Result<ExhibitionContent, AppError> {
        let mut map = self.content.write().await;
        let existing = map
            .values()
            .find(|c| {
                c.exhibition_id == content.exhibition_id
                    && c.kind == content.kind
                    && c.artwork_id == content.artwork_id
            })
            .map(|c| (c.id.clone(), c.created_at));

        if let Some((id, created_at)) = existing {
            content.id = id;
            content.created_at = created_at;
        }
        map.insert(content.id.clone(), content.clone());
        Ok(content)
    }

    async fn replace_content(&self, content: &ExhibitionContent) -> Result<bool, AppError> {
        Ok(replace_existing(&mut *self.content.write().await, &content.id, content))
    }

    async fn list_content(&self, exhibition_id: &str) -> Result<Vec<ExhibitionContent>, AppError> {
        let mut items: Vec<ExhibitionContent> = self
            .content
            .read()
            .await
            .values()
            .filter(|c| c.exhibition_id == exhibition_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        sort_content(&mut items);
        Ok(items)
    }

    async fn delete_content(&self, exhibition_id: &str, content_id: &str) -> Result<bool, AppError> {
        let mut map = self.content.write().await;
        if map.get(content_id).is_some_and(|c| c.exhibition_id == exhibition_id) {
            map.remove(content_id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn delete_content_by_exhibition(&self, exhibition_id: &str) -> Result<u64, AppError> {
        let mut map = self.content.write().await;
        let before = map.len();
        map.retain(|_, c| c.exhibition_id != exhibition_id);
        Ok((before - map.len()) as u64)
    }

    async fn insert_inquiry(&self, inquiry: &ContactInquiry) -> Result<(), AppError> {
        insert_unique(&mut *self.inquiries.write().await, &inquiry.id, inquiry)
    }

    async fn list_inquiries(&self) -> Result<Vec<ContactInquiry>, AppError> {
        let mut items: Vec<ContactInquiry> = self.inquiries.read().await.values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn update_inquiry_status(&self, id: &str, status: InquiryStatus) -> Result<bool, AppError> {
        Ok(match self.inquiries.write().await.get_mut(id) {
            Some(inquiry) => {
                inquiry.status = status;
                true
            }
            None => false,
        })
    }

    async fn insert_notice(&self, notice: &Notice) -> Result<(), AppError> {
        insert_unique(&mut *self.notices.write().await, &notice.id, notice)
    }

    async fn find_notice(&self, id: &str) -> Result<Option<Notice>, AppError> {
        Ok(self.notices.read().await.get(id).cloned())
    }

    async fn list_notices(&self, include_unpublished: bool) -> Result<Vec<Notice>, AppError> {
        let mut items: Vec<Notice> = self
            .notices
            .read()
            .await
            .values()
            .filter(|n| include_unpublished || n.published)
            .cloned()
            .collect();
        sort_notices(&mut items);
        Ok(items)
    }

    async fn replace_notice(&self, notice: &Notice) -> Result<bool, AppError> {
        Ok(replace_existing(&mut *self.notices.write().await, &notice.id, notice))
    }

    async fn delete_notice(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.notices.write().await.remove(id).is_some())
    }

    async fn insert_registration(&self, registration: &RegistrationNotification) -> Result<(), AppError> {
        insert_unique(&mut *self.registrations.write().await, &registration.id, registration)
    }

    async fn list_registrations(&self) -> Result<Vec<RegistrationNotification>, AppError> {
        let mut items: Vec<RegistrationNotification> =
            self.registrations.read().await.values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn mark_registration_read(&self, id: &str) -> Result<bool, AppError> {
        Ok(match self.registrations.write().await.get_mut(id) {
            Some(registration) => {
                registration.read = true;
                true
            }
            None => false,
        })
    }
}
