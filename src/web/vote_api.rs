use std::sync::Arc;

use tracing::{debug, info};
use warp::reply::{self, Reply, Response};
use warp::{reject, Rejection};

use crate::polls::forms::FormData;
use crate::polls::{ChoiceId, QuestionId};
use super::question_api::get_internal as get_poll;
use super::{pages, redirect, State};

pub async fn vote(id: QuestionId, state: Arc<State>, form: FormData) -> Result<Response, Rejection> {
    let poll = get_poll(&state, id).await?;

    let selected = form.get("choice").and_then(|raw| raw.parse::<ChoiceId>().ok());
    if let Some(choice_id) = selected {
        if state.store.cast_vote(id, choice_id).await.map_err(reject::custom)? {
            info!(question_id = %id, choice_id = %choice_id, "Vote counted");
            return Ok(redirect(format!("/{id}/results/")));
        }
    }

    debug!(question_id = %id, choice = ?form.get("choice"), "Vote without a valid choice");
    Ok(reply::html(pages::detail(&poll, Some(pages::NO_SELECTION))).into_response())
}
