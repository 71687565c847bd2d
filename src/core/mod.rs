// Core domain exports
pub mod conversation;
pub mod directory;
pub mod engine;

pub use conversation::Conversations;
pub use directory::{is_potential_match, Directory};
pub use engine::{decide_like, LikeDecision, LikeOutcome, MatchEngine, RejectOutcome, MAX_LIKE_ATTEMPTS};
