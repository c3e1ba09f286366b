//! pizzas-ecos - HTTP backend for recording pizza sales
//!
//! The interesting part lives in `routing`, `ratelimit`, `security` and
//! `middleware`: a hand-built dynamic path router plus the admission chain
//! (panic recovery, CORS, DDoS detection, per-IP rate limiting, request
//! logging and bearer-token authentication) composed around it.

use std::sync::Arc;

pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod ratelimit;
pub mod routing;
pub mod security;
pub mod token;

// Re-export commonly used types
pub use error::{AppError, Result};

/// Application state shared across middleware and handlers
#[derive(Clone)]
pub struct AppState {
    pub env: Arc<config::Config>,
    pub db: database::Database,
    pub router: Arc<routing::AppRouter>,
    pub rate_limiter: Arc<ratelimit::RateLimiter>,
    pub ddos: Arc<security::DdosDetector>,
}
