pub mod admin;
pub mod artworks;
pub mod auth;
pub mod chat;
pub mod contact;
pub mod content;
pub mod exhibitions;
pub mod generation;
pub mod notices;

pub use artworks::*;
pub use auth::*;
pub use chat::*;
pub use contact::*;
pub use content::*;
pub use exhibitions::*;
pub use generation::*;
pub use notices::*;
