use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("no UE registered for IMSI {0}")]
    UnknownUe(String),

    #[error("no session with Call-ID {0} on this UE")]
    UnknownSession(String),

    #[error("dialog error: {0}")]
    Dialog(#[from] ue_dialog_core::DialogError),

    #[error("call action {action} is invalid in session state {state:?}")]
    InvalidCallAction { action: &'static str, state: ue_dialog_core::SessionState },
}
