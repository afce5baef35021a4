pub mod cli;
pub mod pdf;
pub mod table;
pub mod writer;

use thiserror::Error;

use crate::input::ResolveError;

pub use cli::run_from_tokens;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// Malformed command tokens; the HTTP layer reports these as 400.
    #[error("{0}")]
    Args(String),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("failed to read PDF: {0}")]
    Pdf(String),
    #[error("failed to write output: {0}")]
    Output(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
