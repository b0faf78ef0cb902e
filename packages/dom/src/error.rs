use thiserror::Error;

pub type MarkupResult<T> = Result<T, MarkupError>;

#[derive(Error, Debug)]
pub enum MarkupError {
    #[error("Failed to parse markup: {0}")]
    Parse(#[from] std::io::Error),
}
