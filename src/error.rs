use std::fmt::{self, Display, Formatter};

use diesel::r2d2::PoolError;
use diesel::result::Error as DbError;
use thiserror::Error;
use tokio::task::JoinError;
use warp::http::StatusCode;

/// A single message attached to a form field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn field_required() -> ValidationError {
    ValidationError {
        message: String::from("This field is required."),
    }
}

pub fn field_too_long(max: usize, len: usize) -> ValidationError {
    ValidationError {
        message: format!("Ensure this value has at most {max} characters (it has {len})."),
    }
}

pub fn line_too_long(line: usize, max: usize, len: usize) -> ValidationError {
    ValidationError {
        message: format!("Line {line} must have at most {max} characters (it has {len})."),
    }
}

pub fn too_few_choices(min: usize) -> ValidationError {
    ValidationError {
        message: format!("Please submit at least {min} choices."),
    }
}

pub fn management_form_invalid() -> ValidationError {
    ValidationError {
        message: String::from("The choice count is missing or has been tampered with."),
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("requested question does not exist")]
    NotFound,

    #[error("authentication required for {next}")]
    Unauthenticated { next: String },

    #[error("database query failed: {0}")]
    Database(#[from] DbError),

    #[error("could not check out a database connection: {0}")]
    Pool(#[from] PoolError),

    #[error("migrations failed: {0}")]
    Migration(String),

    #[error("database task did not complete: {0}")]
    Blocking(#[from] JoinError),

    #[error("could not bind server address: {0}")]
    Bind(#[from] warp::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthenticated { .. } => StatusCode::FOUND,
            AppError::Database(_)
            | AppError::Pool(_)
            | AppError::Migration(_)
            | AppError::Blocking(_)
            | AppError::Bind(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl warp::reject::Reject for AppError {}
