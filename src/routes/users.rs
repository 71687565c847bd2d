use actix_web::{web, HttpResponse};

use crate::auth::Principal;
use crate::error::ServiceResult;
use crate::models::ProfileUpdate;
use crate::routes::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .service(
                web::resource("/profile")
                    .route(web::get().to(get_profile))
                    .route(web::put().to(update_profile)),
            )
            .route("/matches", web::get().to(potential_matches)),
    );
}

/// GET /api/users/profile
async fn get_profile(state: web::Data<AppState>, principal: Principal) -> ServiceResult<HttpResponse> {
    let profile = state.directory.profile(principal.user_id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// Replace the caller's editable profile fields
///
/// PUT /api/users/profile
async fn update_profile(
    state: web::Data<AppState>,
    principal: Principal,
    req: web::Json<ProfileUpdate>,
) -> ServiceResult<HttpResponse> {
    let profile = state
        .directory
        .update_profile(principal.user_id, req.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(profile))
}

/// Users in the caller's department sharing one of the caller's gender interests
///
/// GET /api/users/matches
async fn potential_matches(state: web::Data<AppState>, principal: Principal) -> ServiceResult<HttpResponse> {
    let users = state.directory.potential_matches(principal.user_id).await?;
    Ok(HttpResponse::Ok().json(users))
}
