use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("challenge header is missing its scheme token")]
    MissingScheme,

    #[error("unsupported auth scheme: {0}")]
    UnsupportedScheme(String),

    #[error("challenge is missing required parameter {0}")]
    MissingParam(&'static str),
}
