use std::io;

use thiserror::Error;

use crate::blurring::domain::processing_error::{ErrorCode, ProcessingError};

#[derive(Error, Debug)]
pub enum BlurError {
    /// A blur was requested before any target image was set.
    #[error("no target image set on the blur processor")]
    NoTargetImage,
    #[error(transparent)]
    Processing(#[from] ProcessingError),
    #[error("failed to start the processing queue: {0}")]
    QueueSpawn(#[source] io::Error),
}

impl BlurError {
    /// The numeric processing code, for failures that have one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Processing(err) => Some(err.code()),
            Self::NoTargetImage | Self::QueueSpawn(_) => None,
        }
    }
}
