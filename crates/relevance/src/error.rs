use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelevanceError>;

#[derive(Error, Debug)]
pub enum RelevanceError {
    #[error("Text generation failed: {0}")]
    Generation(String),

    #[error("Text generator is not configured")]
    GeneratorDisabled,

    #[error("{0}")]
    Other(String),
}
