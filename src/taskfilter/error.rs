use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Invalid schedule for task {id}: end {end} is before start {start}")]
    InvalidSchedule {
        id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Invalid filter expression at column {position}: {message}")]
    Expression { position: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid custom filter '{0}': expected TITLE=EXPRESSION")]
    InvalidCustomFilter(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl FilterError {
    pub(crate) fn expression(position: usize, message: impl Into<String>) -> Self {
        FilterError::Expression {
            position,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;
