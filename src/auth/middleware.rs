use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::AppState;

pub const OWNER_HEADER: &str = "x-owner-id";

/// The end user a request acts for, resolved from `X-Owner-Id`.
#[derive(Debug, Clone, Copy)]
pub struct AuthOwner {
    pub owner_id: i64,
}

/// Compare digests so the comparison time does not depend on how much of the
/// presented token matches.
fn token_matches(presented: &str, expected: &str) -> bool {
    let a = Sha256::digest(presented.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn owner_from_headers(headers: &HeaderMap) -> Result<i64, AppError> {
    let raw = headers
        .get(OWNER_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Validation("X-Owner-Id header is required".into()))?;

    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::Validation(
            "X-Owner-Id must be a positive integer".into(),
        )),
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    if !token_matches(token, &state.config.api_token) {
        tracing::warn!("Rejected request with invalid service token");
        return Err(AppError::Unauthorized);
    }

    let owner_id = owner_from_headers(req.headers())?;
    req.extensions_mut().insert(AuthOwner { owner_id });
    Ok(next.run(req).await)
}
