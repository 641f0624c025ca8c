use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Shown when the service doesn't explain its failure
pub const UNKNOWN_ERROR: &str = "알 수 없는 오류";

#[derive(Debug, Error)]
pub enum Error {
    /// A wall-clock string that isn't `HH:MM`
    #[error("invalid time format: {0:?} (expected HH:MM)")]
    InvalidTimeFormat(String),

    /// A day label outside of the five weekdays
    #[error("unknown day label: {0:?}")]
    UnknownDay(String),

    /// A course whose end isn't strictly after its start
    #[error("course {course:?} ends at {end} but starts at {start}")]
    InvalidInterval {
        course: String,
        start: String,
        end: String,
    },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("server returned {status}: {}", detail.as_deref().unwrap_or(UNKNOWN_ERROR))]
    Api {
        status: u16,
        detail: Option<String>,
    },

    /// A success response whose body isn't what was expected
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid config file {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error(transparent)]
    Prompt(#[from] dialoguer::Error),
}

impl Error {
    /// Message shown to the user in place of the raw error, the same way the
    /// web page reported failures
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(_) => "서버에 연결할 수 없습니다.".to_owned(),
            Self::Api { detail, .. } => detail.as_deref().unwrap_or(UNKNOWN_ERROR).to_owned(),
            other => other.to_string(),
        }
    }
}
