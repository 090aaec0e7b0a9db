mod auth;
mod create_api;
pub mod db;
mod pages;
mod question_api;
mod result_api;
mod vote_api;


use std::convert::Infallible;
use std::sync::Arc;

use tracing::{debug, error, info};
use warp::http::header::LOCATION;
use warp::http::StatusCode;
use warp::reply::{self, Reply, Response};
use warp::{Filter, Rejection};

use crate::config::Config;
use crate::error::AppError;
use crate::polls::forms::FormData;
use crate::polls::QuestionId;
use db::Store;

const MAX_FORM_BYTES: u64 = 64 * 1024;

pub struct State {
    pub store: Store,
    pub config: Config,
}

fn with_state(state: Arc<State>) -> impl Filter<Extract = (Arc<State>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn form_body() -> impl Filter<Extract = (FormData,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_FORM_BYTES).and(warp::body::form())
}

fn redirect(location: String) -> Response {
    reply::with_header(StatusCode::FOUND, LOCATION, location).into_response()
}

fn page(html: String, status: StatusCode) -> Response {
    reply::with_status(reply::html(html), status).into_response()
}

pub fn routes(state: Arc<State>) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let index = warp::get()
        .and(warp::path::end())
        .and(with_state(state.clone()))
        .and_then(question_api::index);

    let detail = warp::get()
        .and(warp::path!(QuestionId))
        .and(with_state(state.clone()))
        .and_then(question_api::detail);

    let results = warp::get()
        .and(warp::path!(QuestionId / "results"))
        .and(with_state(state.clone()))
        .and_then(result_api::results);

    let vote = warp::post()
        .and(warp::path!(QuestionId / "vote"))
        .and(with_state(state.clone()))
        .and(form_body())
        .and_then(vote_api::vote);

    let simple_form = warp::get()
        .and(warp::path!("create" / "simple"))
        .and(auth::require_user(state.clone()))
        .and_then(create_api::simple_form);

    let create_simple = warp::post()
        .and(warp::path!("create" / "simple"))
        .and(with_state(state.clone()))
        .and(auth::require_user(state.clone()))
        .and(form_body())
        .and_then(create_api::create_simple);

    let advanced_form = warp::get()
        .and(warp::path!("create" / "advanced"))
        .and(auth::require_user(state.clone()))
        .and_then(create_api::advanced_form);

    let create_advanced = warp::post()
        .and(warp::path!("create" / "advanced"))
        .and(with_state(state.clone()))
        .and(auth::require_user(state.clone()))
        .and(form_body())
        .and_then(create_api::create_advanced);

    let my_questions = warp::get()
        .and(warp::path!("my-questions"))
        .and(with_state(state.clone()))
        .and(auth::require_user(state.clone()))
        .and_then(create_api::my_questions);

    let summary = warp::get()
        .and(warp::path!("api" / "questions" / QuestionId))
        .and(with_state(state.clone()))
        .and_then(result_api::summary);

    index
        .or(detail)
        .or(results)
        .or(vote)
        .or(simple_form)
        .or(create_simple)
        .or(advanced_form)
        .or(create_advanced)
        .or(my_questions)
        .or(summary)
        .recover(move |err| handle_rejection(err, state.clone()))
        .with(warp::trace::request())
}

async fn handle_rejection(err: Rejection, state: Arc<State>) -> Result<Response, Infallible> {
    if let Some(app_err) = err.find::<AppError>() {
        let response = match app_err {
            AppError::Unauthenticated { next } => {
                redirect(auth::login_location(&state.config.login_url, next))
            }
            AppError::NotFound => page(pages::not_found(), StatusCode::NOT_FOUND),
            other => {
                error!("Request failed: {other}");
                page(pages::server_error(), other.status())
            }
        };
        return Ok(response);
    }

    if err.is_not_found() {
        return Ok(page(pages::not_found(), StatusCode::NOT_FOUND));
    }
    if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(reply::with_status("Method not allowed", StatusCode::METHOD_NOT_ALLOWED).into_response());
    }
    if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        return Ok(reply::with_status("Form too large", StatusCode::PAYLOAD_TOO_LARGE).into_response());
    }

    debug!("Rejected malformed request: {err:?}");
    Ok(reply::with_status("Bad request", StatusCode::BAD_REQUEST).into_response())
}

pub async fn serve(config: Config) -> Result<(), AppError> {
    let store = Store::open(&config.database_url, config.pool_size)?;
    let address = config.address();
    let state = Arc::new(State { store, config });

    let (bound, server) =
        warp::serve(routes(state)).try_bind_with_graceful_shutdown(address, shutdown_signal())?;
    info!("Serving polls on http://{bound}");
    server.await;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(err) => {
                error!("Failed to listen for Ctrl+C: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                error!("Failed to install terminate handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
