use std::sync::Arc;

use tracing::debug;
use warp::filters::path::FullPath;
use warp::http::HeaderMap;
use warp::{reject, Filter, Rejection};

use crate::error::AppError;
use crate::polls::User;
use super::{with_state, State};

pub const MAX_USERNAME_LEN: usize = 150;

/// Resolves the trusted identity header into a [`User`], or rejects the
/// request so that it gets redirected to the login page.
pub fn require_user(state: Arc<State>) -> impl Filter<Extract = (User,), Error = Rejection> + Clone {
    warp::header::headers_cloned()
        .and(warp::path::full())
        .and(with_state(state))
        .and_then(authenticate)
}

async fn authenticate(headers: HeaderMap, path: FullPath, state: Arc<State>) -> Result<User, Rejection> {
    match remote_user(&headers, &state.config.remote_user_header) {
        Some(username) => state
            .store
            .find_or_create_user(username)
            .await
            .map_err(reject::custom),
        None => {
            debug!(path = path.as_str(), "Unauthenticated request for protected page");
            Err(reject::custom(AppError::Unauthenticated {
                next: path.as_str().to_owned(),
            }))
        }
    }
}

pub fn remote_user(headers: &HeaderMap, header: &str) -> Option<String> {
    let username = headers.get(header)?.to_str().ok()?.trim();
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return None;
    }
    Some(username.to_owned())
}

pub fn login_location(login_url: &str, next: &str) -> String {
    let separator = if login_url.contains('?') { '&' } else { '?' };
    format!("{login_url}{separator}next={}", urlencoding::encode(next))
}
