pub mod artwork;
pub mod chat;
pub mod content;
pub mod exhibition;
pub mod inquiry;
pub mod notice;
pub mod registration;

pub use artwork::Artwork;
pub use chat::{ChatMessage, ChatRole, ChatStep, ProgressSnapshot};
pub use content::{ContentKind, ExhibitionContent};
pub use exhibition::{Exhibition, ExhibitionStatus, Visibility};
pub use inquiry::{ContactInquiry, InquiryStatus};
pub use notice::Notice;
pub use registration::RegistrationNotification;
