use std::io;

pub type InstrumentResult<T> = Result<T, InstrumentError>;

#[derive(Debug, thiserror::Error)]
pub enum InstrumentError {
    #[error("could not connect to {what}")]
    Connect {
        what: String,
        #[source]
        source: io::Error,
    },

    #[error("instrument I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{what} did not answer in time")]
    Timeout { what: String },

    #[error("could not parse {what}: {raw:?}")]
    Parse { what: &'static str, raw: String },

    #[error("malformed JSON reply: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] fc_core::CoreError),

    #[error(transparent)]
    Control(#[from] fc_controls::ControlError),
}

impl InstrumentError {
    /// Map a socket I/O error, folding read/write timeouts into `Timeout`.
    pub(crate) fn from_socket(what: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout {
                what: what.to_string(),
            },
            _ => Self::Io(err),
        }
    }
}
