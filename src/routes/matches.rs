use actix_web::{web, HttpResponse};

use crate::auth::Principal;
use crate::error::ServiceResult;
use crate::models::{LikeResponse, UserId};
use crate::routes::AppState;

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/matches")
            .route("/like/{target_id}", web::post().to(like_user))
            .route("/reject/{target_id}", web::post().to(reject_user))
            .route("/my-matches", web::get().to(my_matches))
            .route("/pending", web::get().to(pending_matches)),
    );
}

/// Like a user
///
/// POST /api/matches/like/{targetId}
///
/// Response body:
/// ```json
/// { "message": "It's a match!", "isMatch": true }
/// ```
async fn like_user(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<UserId>,
) -> ServiceResult<HttpResponse> {
    let target_id = path.into_inner();
    let outcome = state.engine.like(principal.user_id, target_id).await?;

    Ok(HttpResponse::Ok().json(LikeResponse {
        message: outcome.message().to_string(),
        is_match: outcome.is_match(),
    }))
}

/// Reject a user
///
/// POST /api/matches/reject/{targetId}
///
/// Always answers 200, also when there was no pending like to reject.
async fn reject_user(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<UserId>,
) -> ServiceResult<HttpResponse> {
    let target_id = path.into_inner();
    state.engine.reject(principal.user_id, target_id).await?;

    Ok(HttpResponse::Ok().json(LikeResponse {
        message: "User rejected".to_string(),
        is_match: false,
    }))
}

/// GET /api/matches/my-matches
async fn my_matches(state: web::Data<AppState>, principal: Principal) -> ServiceResult<HttpResponse> {
    let matches = state.engine.list_matches(principal.user_id).await?;
    Ok(HttpResponse::Ok().json(matches))
}

/// GET /api/matches/pending
async fn pending_matches(state: web::Data<AppState>, principal: Principal) -> ServiceResult<HttpResponse> {
    let pending = state.engine.list_pending(principal.user_id).await?;
    Ok(HttpResponse::Ok().json(pending))
}
