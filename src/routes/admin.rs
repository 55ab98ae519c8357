use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::put,
};
use validator::Validate;

use crate::{
    dto::official::{OfficialResultRequest, OfficialResultResponse},
    error::AppError,
    services::official_service,
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Admin-only endpoints for registering official results.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route(
            "/admin/matches/{match_id}/official-result",
            put(set_official_result),
        )
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Register the official lineup and tactics of a match. Allowed once per match.
#[utoipa::path(
    put,
    path = "/admin/matches/{match_id}/official-result",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Value of FANXI_ADMIN_TOKEN"),
        ("match_id" = u32, Path, description = "Match identifier")
    ),
    request_body = OfficialResultRequest,
    responses(
        (status = 200, description = "Registered official result", body = OfficialResultResponse),
        (status = 400, description = "Malformed roster, formation or tactics"),
        (status = 401, description = "Missing or wrong admin token"),
        (status = 404, description = "Unknown match"),
        (status = 409, description = "Official result already set"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn set_official_result(
    State(state): State<SharedState>,
    Path(match_id): Path<u32>,
    Json(payload): Json<OfficialResultRequest>,
) -> Result<Json<OfficialResultResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        official_service::set_official_result(&state, match_id, payload).await?,
    ))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    official_service::authorize_admin(&state, provided)?;
    Ok(next.run(req).await)
}
