use actix_web::{web, HttpResponse};

use crate::auth::Principal;
use crate::error::ServiceResult;
use crate::models::{SendMessageRequest, UserId};
use crate::routes::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/messages")
            .route("/send", web::post().to(send_message))
            .route("/conversation/{user_id}", web::get().to(conversation))
            .route("/unread", web::get().to(unread)),
    );
}

/// Send a message to a matched user
///
/// POST /api/messages/send
///
/// Request body:
/// ```json
/// { "recipientId": 2, "content": "string" }
/// ```
async fn send_message(
    state: web::Data<AppState>,
    principal: Principal,
    req: web::Json<SendMessageRequest>,
) -> ServiceResult<HttpResponse> {
    let message = state
        .conversations
        .send(principal.user_id, req.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(message))
}

/// GET /api/messages/conversation/{userId}
///
/// Marks the caller's unread inbound messages in this conversation as read.
async fn conversation(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<UserId>,
) -> ServiceResult<HttpResponse> {
    let messages = state
        .conversations
        .conversation(principal.user_id, path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(messages))
}

/// GET /api/messages/unread
async fn unread(state: web::Data<AppState>, principal: Principal) -> ServiceResult<HttpResponse> {
    let messages = state.conversations.unread(principal.user_id).await?;
    Ok(HttpResponse::Ok().json(messages))
}
