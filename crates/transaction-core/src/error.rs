use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransactionError>;

#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("no transaction matches this message")]
    NoMatch,

    #[error("duplicate request, cached response resent")]
    DuplicateRequest,

    #[error("no PRACK placeholder registered for RSeq {0}")]
    UnknownRSeq(u32),

    #[error("transaction already finalized")]
    AlreadyFinalized,
}
