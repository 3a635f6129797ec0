use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unable to open video: {0}")]
    Open(PathBuf),

    #[error("video has no readable first frame")]
    NoFirstFrame,

    #[error("OpenCV Error: {0}")]
    OpenCv(#[from] opencv::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("metadata probe failed: {0}")]
    Probe(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Technical failure to decode the video, as opposed to a configuration
    /// or metadata problem. A decode error is never a fraud signal.
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Open(_) | Error::NoFirstFrame | Error::OpenCv(_))
    }
}
