pub mod frame;
pub mod wire;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("unknown mission mode code {0}")]
    InvalidMode(u8),
    #[error("frame of {0} bytes exceeds limit of {max} bytes", max = frame::MAX_FRAME_LEN)]
    FrameTooLarge(usize),
    #[error("malformed frame body: {0}")]
    Json(#[from] serde_json::Error),
}
