use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use warp::reply::{self, Reply};
use warp::{reject, Rejection};

use crate::error::AppError;
use crate::polls::{QuestionId, QuestionWithChoices};
use super::{pages, State};

pub async fn index(state: Arc<State>) -> Result<impl Reply, Rejection> {
    let now = Utc::now();
    let questions = state.store.latest_published(now).await.map_err(reject::custom)?;
    Ok(reply::html(pages::index(&questions, now)))
}

pub async fn detail(id: QuestionId, state: Arc<State>) -> Result<impl Reply, Rejection> {
    let poll = get_internal(&state, id).await?;
    Ok(reply::html(pages::detail(&poll, None)))
}

/// Loads a published question or rejects with not-found.
pub(super) async fn get_internal(state: &State, id: QuestionId) -> Result<QuestionWithChoices, Rejection> {
    match state.store.published_question(id, Utc::now()).await {
        Ok(Some(poll)) => Ok(poll),
        Ok(None) => {
            debug!(question_id = %id, "No published question");
            Err(reject::custom(AppError::NotFound))
        }
        Err(err) => Err(reject::custom(err)),
    }
}
