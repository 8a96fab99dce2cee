use crate::models::{ContactInquiry, InquiryStatus, RegistrationNotification};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct InquiryResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub status: InquiryStatus,
    pub created_at: String,
}

impl From<ContactInquiry> for InquiryResponse {
    fn from(inquiry: ContactInquiry) -> Self {
        Self {
            id: inquiry.id,
            name: inquiry.name,
            email: inquiry.email,
            subject: inquiry.subject,
            message: inquiry.message,
            status: inquiry.status,
            created_at: inquiry.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateInquiryRequest {
    pub status: InquiryStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub read: bool,
    pub created_at: String,
}

impl From<RegistrationNotification> for RegistrationResponse {
    fn from(registration: RegistrationNotification) -> Self {
        Self {
            id: registration.id,
            user_id: registration.user_id,
            email: registration.email,
            display_name: registration.display_name,
            read: registration.read,
            created_at: registration.created_at.to_rfc3339(),
        }
    }
}
