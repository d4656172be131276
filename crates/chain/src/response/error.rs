use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("status already written: {current}")]
    StatusAlreadyWritten { current: StatusCode },

    #[error("body size too large, current: {current_size} exceed the limit {max_size}")]
    BodyTooLarge { current_size: usize, max_size: usize },
}

impl ResponseError {
    pub fn status_already_written(current: StatusCode) -> Self {
        Self::StatusAlreadyWritten { current }
    }

    pub fn body_too_large(current_size: usize, max_size: usize) -> Self {
        Self::BodyTooLarge { current_size, max_size }
    }
}
