//! Exhibition curation backend: exhibitions, artworks and their texts, with a
//! generative assistant for titles, content, posters and gallery layout.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;

pub use startup::{AppState, Application, build_router};
