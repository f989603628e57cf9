use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use upkeep_core::UserId;

use crate::context::ActorContext;

/// Header carrying the acting user's id. Authentication policy lives in the
/// gateway in front of this service; by the time a request arrives here the
/// header is trusted.
pub const ACTOR_HEADER: &str = "x-actor-id";

pub async fn actor_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let actor = extract_actor(req.headers())?;

    req.extensions_mut().insert(ActorContext::new(actor));

    Ok(next.run(req).await)
}

fn extract_actor(headers: &HeaderMap) -> Result<UserId, StatusCode> {
    let header = headers.get(ACTOR_HEADER).ok_or(StatusCode::UNAUTHORIZED)?;

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    header
        .trim()
        .parse()
        .map_err(|_| StatusCode::UNAUTHORIZED)
}
