use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Vote store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
