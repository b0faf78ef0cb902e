use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;
pub type EvalResult<T> = Result<T, EvalError>;

/// Failure to turn source text into a callable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Unexpected token at {pos}: expected {expected}, found {found}")]
    UnexpectedToken {
        pos: usize,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of expression at {pos}")]
    UnexpectedEnd { pos: usize },

    #[error("Invalid syntax at {pos}: {message}")]
    InvalidSyntax { pos: usize, message: String },

    #[error("Lexer error at {pos}")]
    LexerError { pos: usize },
}

impl CompileError {
    pub fn unexpected_token(pos: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            pos,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_end(pos: usize) -> Self {
        Self::UnexpectedEnd { pos }
    }

    pub fn invalid_syntax(pos: usize, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            pos,
            message: message.into(),
        }
    }

    pub fn lexer_error(pos: usize) -> Self {
        Self::LexerError { pos }
    }

    /// Byte offset into the source where the error was detected.
    pub fn position(&self) -> usize {
        match self {
            Self::UnexpectedToken { pos, .. }
            | Self::UnexpectedEnd { pos }
            | Self::InvalidSyntax { pos, .. }
            | Self::LexerError { pos } => *pos,
        }
    }

    /// Render the error against its source using ariadne.
    #[cfg(feature = "pretty-errors")]
    pub fn to_report(&self, source_name: &str, source: &str) -> String {
        use ariadne::{Color, Label, Report, ReportKind, Source};

        let pos = self.position().min(source.len());
        let end = (pos + 1).min(source.len()).max(pos);
        let mut output = Vec::new();
        let written = Report::build(ReportKind::Error, source_name, pos)
            .with_message("expression failed to compile")
            .with_label(
                Label::new((source_name, pos..end))
                    .with_message(self.to_string())
                    .with_color(Color::Red),
            )
            .finish()
            .write((source_name, Source::from(source)), &mut output);

        match written {
            Ok(()) => String::from_utf8_lossy(&output).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

/// Failure raised while a compiled expression runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("{name} is not defined")]
    NotDefined { name: String },

    #[error("{callee} is not a function")]
    NotCallable { callee: String },

    #[error("TypeError: {message}")]
    TypeError { message: String },

    #[error("{message}")]
    Thrown { message: String },
}

impl EvalError {
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::TypeError {
            message: message.into(),
        }
    }

    pub fn thrown(message: impl Into<String>) -> Self {
        Self::Thrown {
            message: message.into(),
        }
    }
}
