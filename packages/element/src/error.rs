use thiserror::Error;
use webcell_dom::MarkupError;
use webcell_expression::{CompileError, EvalError};

pub type ElementResult<T> = Result<T, ElementError>;

/// Errors surfaced by definition-time operations.
///
/// Runtime failures (a binding that does not compile, an attribute that does
/// not decode) are logged and contained instead of returned.
#[derive(Error, Debug)]
pub enum ElementError {
    #[error("Compile error in `{expression}`: {source}")]
    Compile {
        expression: String,
        #[source]
        source: CompileError,
    },

    #[error("Evaluation error in `{expression}`: {source}")]
    Evaluation {
        expression: String,
        #[source]
        source: EvalError,
    },

    #[error("Cannot decode attribute `{attribute}`: {message}")]
    Decode { attribute: String, message: String },

    #[error("Cannot serialise property `{property}` as an attribute")]
    Serialization { property: String },

    #[error("Markup error: {0}")]
    Markup(#[from] MarkupError),

    #[error("Invalid custom element tag `{tag}`: {reason}")]
    InvalidTag { tag: String, reason: String },

    #[error("Tag `{0}` is already defined")]
    DuplicateTag(String),

    #[error("Component `{name}` extends unknown component `{parent}`")]
    UnknownParent { name: String, parent: String },

    #[error("Tag `{0}` is not defined")]
    UnknownTag(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid manifest: {0}")]
    Json(#[from] serde_json::Error),
}
