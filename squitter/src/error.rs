use std::io;

use squitter_core::{CprError, DecodeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("cannot read frame: {0}")]
    InvalidFrame(String),
    #[error("frame rejected: {0}")]
    Decode(#[from] DecodeError),
    #[error("not an airborne position message: {0}")]
    NotPosition(String),
    #[error("position unresolved: {0}")]
    Cpr(#[from] CprError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
