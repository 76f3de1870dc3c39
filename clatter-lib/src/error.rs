use crate::parser;

/// Boxed error handed back by a [`crate::source::Source`]
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Crate Error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Pest(Box<pest::error::Error<parser::Rule>>),
    #[error("malformed token `{0}`")]
    MalformedToken(String),
    #[error("invalid token `{0}`")]
    InvalidToken(String),
    #[error("choose a roll system (one of: {available})")]
    InvalidRollSystem { requested: String, available: String },
    #[error(transparent)]
    RandomSource(SourceError),
    #[error("invalid option: {0}")]
    InvalidOption(String),
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("{0}")]
    Command(#[from] clap::Error),
    #[error("this roll has already been evaluated")]
    AlreadyRolled,
    #[error("{0}")]
    Limit(String),
}

impl From<pest::error::Error<parser::Rule>> for Error {
    fn from(value: pest::error::Error<parser::Rule>) -> Self {
        Self::Pest(Box::new(value))
    }
}

/// Crate Result type
pub type Result<T> = std::result::Result<T, Error>;
