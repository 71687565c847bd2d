// Route exports
pub mod health;
pub mod matches;
pub mod messages;
pub mod users;

use actix_web::web;
use std::sync::Arc;

use crate::auth::JwtVerifier;
use crate::core::{Conversations, Directory, MatchEngine};
use crate::error::{handle_json_payload_error, handle_path_error};
use crate::services::Store;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub directory: Directory,
    pub engine: MatchEngine,
    pub conversations: Conversations,
    pub auth: Arc<JwtVerifier>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, auth: JwtVerifier) -> Self {
        let directory = Directory::new(store.clone());
        let engine = MatchEngine::new(store.clone(), directory.clone());
        let conversations = Conversations::new(store.clone(), directory.clone());

        Self {
            store,
            directory,
            engine,
            conversations,
            auth: Arc::new(auth),
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(health::configure)
            .configure(matches::configure)
            .configure(messages::configure)
            .configure(users::configure),
    );
}

/// State, extractor error handlers and routes for one app instance
pub fn configure_app(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(state))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error));
        configure_routes(cfg);
    }
}
