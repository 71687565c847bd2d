// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Gender, Match, MatchStatus, Message, NewUser, PublicUser, User, UserId};
pub use requests::{ProfileUpdate, SendMessageRequest};
pub use responses::{ErrorResponse, HealthResponse, LikeResponse, MatchView, MessageView};
