//! Error taxonomy shared by the core and the HTTP surface.

use thiserror::Error;

/// Failures the outlook engine can report.
///
/// `Data` and `EmptySeries` describe the inputs; `Upstream` describes the
/// forecast provider. They are kept apart so callers can tell "cannot
/// assess" from "try again later".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Malformed or missing input fields.
    #[error("Data error: {0}")]
    Data(String),

    /// Network failure or a non-success status from the forecast provider.
    #[error("Upstream error{}: {message}", code_suffix(.code))]
    Upstream {
        code: Option<String>,
        message: String,
    },

    /// A defined value was requested from an empty or unresolved set.
    #[error("Empty series: {0}")]
    EmptySeries(&'static str),
}

pub type CoreResult<T> = Result<T, CoreError>;

fn code_suffix(code: &Option<String>) -> String {
    code.as_ref()
        .map(|c| format!(" (code {c})"))
        .unwrap_or_default()
}

impl CoreError {
    pub fn data(message: impl Into<String>) -> Self {
        CoreError::Data(message.into())
    }

    pub fn upstream(code: Option<String>, message: impl Into<String>) -> Self {
        CoreError::Upstream {
            code,
            message: message.into(),
        }
    }
}
