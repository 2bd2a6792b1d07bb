use crate::attribute::{AttributeId, MAX_ATTRIBUTE_SIZE};
use crate::frame::FrameError;
use crate::message::RejectReason;
use crate::status::AfStatus;
use std::boxed::Box;

#[derive(Debug, thiserror::Error)]
pub enum AflibError {
    // Caller errors
    #[error("attribute value is {0} bytes, the limit is {max}", max = MAX_ATTRIBUTE_SIZE)]
    ValueTooLarge(usize),
    #[error("no pending set request for attribute {0}")]
    NoPendingSet(AttributeId),

    // Hub link errors
    #[error("hub is not available")]
    Unavailable,
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
    #[error("malformed message")]
    Decode,
    #[error("unexpected {0} message")]
    UnexpectedMessage(&'static str),
    #[error("hub rejected the client: {0:?}")]
    Rejected(RejectReason),
    #[error("authentication failed: {0}")]
    Auth(&'static str),
}

impl AflibError {
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AflibError::Transport(Box::new(err))
    }

    /// Collapses the error into the flat status reported to callers.
    pub fn status(&self) -> AfStatus {
        match self {
            AflibError::ValueTooLarge(_) | AflibError::NoPendingSet(_) => AfStatus::InvalidParam,
            _ => AfStatus::Unavailable,
        }
    }
}

impl<'a> From<nom::Err<nom::error::Error<&'a [u8]>>> for AflibError {
    fn from(_: nom::Err<nom::error::Error<&'a [u8]>>) -> Self {
        AflibError::Decode
    }
}
