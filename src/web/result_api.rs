use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use warp::reply::{self, Reply};
use warp::Rejection;

use crate::polls::{QuestionId, QuestionWithChoices};
use super::question_api::get_internal as get_poll;
use super::{pages, State};

#[derive(Serialize)]
struct Summary<'a> {
    #[serde(flatten)]
    poll: &'a QuestionWithChoices,
    was_published_recently: bool,
    total_votes: u64,
}

pub async fn results(id: QuestionId, state: Arc<State>) -> Result<impl Reply, Rejection> {
    let poll = get_poll(&state, id).await?;
    Ok(reply::html(pages::results(&poll)))
}

pub async fn summary(id: QuestionId, state: Arc<State>) -> Result<impl Reply, Rejection> {
    let poll = get_poll(&state, id).await?;
    Ok(reply::json(&Summary {
        was_published_recently: poll.question.was_published_recently(Utc::now()),
        total_votes: poll.total_votes(),
        poll: &poll,
    }))
}
