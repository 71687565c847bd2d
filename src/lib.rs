//! Workmatch - matching and messaging service for a workplace dating app
//!
//! Users like or reject colleagues, mutual likes become matches, and matched
//! users exchange messages. The like/reject lifecycle lives in
//! [`core::MatchEngine`]; persistence sits behind [`services::Store`].

pub mod auth;
pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{Conversations, Directory, LikeOutcome, MatchEngine, RejectOutcome};
pub use error::{ServiceError, ServiceResult};
pub use models::{Gender, Match, MatchStatus, Message, NewUser, PublicUser, User, UserId};
pub use routes::AppState;
pub use services::{MemoryStore, PostgresClient, Store, StoreError};
