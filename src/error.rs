//! Crate-wide error type.
use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    Reqwest(reqwest::Error),
    Join(tokio::task::JoinError),
    /// a batch of HTTP requests exhausted its retry budget on transient errors (429/timeout)
    HttpTransient(String),
    /// a non-2xx, non-429 response
    HttpFatal(String),
    UnknownLang(String),
    Config(String),
    Custom(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Csv(e) => write!(f, "csv error: {}", e),
            Error::Json(e) => write!(f, "json error: {}", e),
            Error::Reqwest(e) => write!(f, "http error: {}", e),
            Error::Join(e) => write!(f, "task join error: {}", e),
            Error::HttpTransient(s) => write!(f, "http transient failure: {}", s),
            Error::HttpFatal(s) => write!(f, "http fatal failure: {}", s),
            Error::UnknownLang(s) => write!(f, "unknown language code: {}", s),
            Error::Config(s) => write!(f, "configuration error: {}", s),
            Error::Custom(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Error {
        Error::Csv(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Json(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Error {
        Error::Reqwest(e)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Error {
        Error::Join(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}
