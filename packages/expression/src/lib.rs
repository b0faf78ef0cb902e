//! Expression language used by webcell attribute values and template bindings.
//!
//! Sources are compiled once against a list of parameter names and the
//! utility globals, then called positionally as often as needed.

pub mod ast;
pub mod compiler;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod template;
pub mod utilities;
pub mod value;

pub use compiler::{CompiledExpression, CompiledTemplate, ExpressionCompiler};
pub use error::{CompileError, CompileResult, EvalError, EvalResult};
pub use parser::parse;
pub use template::{has_interpolation, split_template, TemplatePart};
pub use utilities::{describe, utilities, UTILITY_NAMES};
pub use value::{format_number, parse_float, Function, Object, Value};

/// Either phase of running an expression failed.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}
