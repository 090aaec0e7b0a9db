use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use warp::reply::{self, Reply, Response};
use warp::{reject, Rejection};

use crate::polls::forms::{CreateQuestionForm, FormData, FormErrors};
use crate::polls::User;
use super::{pages, redirect, State};

pub async fn simple_form(_user: User) -> Result<impl Reply, Rejection> {
    Ok(reply::html(pages::create_question(
        &CreateQuestionForm::blank_simple(),
        &FormErrors::default(),
    )))
}

pub async fn advanced_form(_user: User) -> Result<impl Reply, Rejection> {
    Ok(reply::html(pages::create_question(
        &CreateQuestionForm::blank_advanced(),
        &FormErrors::default(),
    )))
}

pub async fn create_simple(state: Arc<State>, user: User, data: FormData) -> Result<Response, Rejection> {
    create(&state, &user, CreateQuestionForm::simple(&data)).await
}

pub async fn create_advanced(state: Arc<State>, user: User, data: FormData) -> Result<Response, Rejection> {
    create(&state, &user, CreateQuestionForm::advanced(&data)).await
}

async fn create(state: &State, user: &User, form: CreateQuestionForm) -> Result<Response, Rejection> {
    let create = match form.validate() {
        Ok(create) => create,
        Err(errors) => {
            debug!(username = %user.username, ?errors, "Question form rejected");
            return Ok(reply::html(pages::create_question(&form, &errors)).into_response());
        }
    };

    let choices = create.choices.len();
    let id = state
        .store
        .create_question(create, Some(user.id), Utc::now())
        .await
        .map_err(reject::custom)?;
    info!(question_id = %id, username = %user.username, choices, "Question created");

    Ok(redirect(format!("/{id}/")))
}

pub async fn my_questions(state: Arc<State>, user: User) -> Result<impl Reply, Rejection> {
    let questions = state
        .store
        .questions_by_author(user.id)
        .await
        .map_err(reject::custom)?;
    Ok(reply::html(pages::my_questions(&user, &questions, Utc::now())))
}
