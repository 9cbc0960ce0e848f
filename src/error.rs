use thiserror::Error;

use crate::{face::FaceId, tlv::TlvError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("malformed Link: {0}")]
    MalformedLink(String),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("unknown strategy {0}")]
    UnknownStrategy(String),

    #[error("face {0} is disconnected")]
    FaceDisconnected(FaceId),

    #[error("unknown face {0}")]
    UnknownFace(FaceId),
}

impl From<TlvError> for Error {
    fn from(value: TlvError) -> Self {
        Error::MalformedLink(value.to_string())
    }
}
