pub mod auth_provider;
pub mod database;
pub mod gallery;
pub mod json_extract;
pub mod jwt;
pub mod memory_store;
pub mod metrics;
pub mod prompts;
pub mod providers;
pub mod rag;
pub mod storage;

pub use auth_provider::{AuthProvider, GoTrueAuthProvider, MockAuthProvider};
pub use database::{CurationStore, MongoStore};
pub use jwt::{AccessTokenClaims, JwtService};
pub use memory_store::MemoryStore;
pub use rag::ReferenceLibrary;
pub use storage::{BucketStorage, LocalStorage, MemoryStorage, ObjectStorage};
