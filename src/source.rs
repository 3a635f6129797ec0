use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture},
};
use std::collections::VecDeque;
use std::path::Path;
use tracing::{info, warn};

use crate::error::Error;
use crate::frame::Frame;

/// Supplies decoded frames in presentation order.
pub trait FrameSource {
    /// `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>, Error>;

    fn fps(&self) -> Option<f64> {
        None
    }
}

impl FrameSource for VecDeque<Frame> {
    #[inline]
    fn next_frame(&mut self) -> Result<Option<Frame>, Error> {
        Ok(self.pop_front())
    }
}

pub struct VideoFileSource {
    cap: VideoCapture,
    fps: f64,
}

impl VideoFileSource {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let name = path.to_str().ok_or_else(|| Error::Open(path.to_path_buf()))?;
        let mut cap = VideoCapture::from_file(name, videoio::CAP_ANY)?;

        if !cap.is_opened()? {
            return Err(Error::Open(path.to_path_buf()));
        }

        // rotation is compensated from container metadata instead
        if !cap.set(videoio::CAP_PROP_ORIENTATION_AUTO, 0.0)? {
            warn!("backend ignores CAP_PROP_ORIENTATION_AUTO for {}", path.display());
        }

        let fps = cap.get(videoio::CAP_PROP_FPS)?;
        let width = cap.get(videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = cap.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i32;
        let total = cap.get(videoio::CAP_PROP_FRAME_COUNT)? as i64;

        info!(
            "video {}: {}x{} @ {:.1} fps, {} frames",
            path.display(),
            width,
            height,
            fps,
            total
        );

        Ok(Self { cap, fps })
    }
}

impl FrameSource for VideoFileSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, Error> {
        let mut image = Mat::default();

        if !self.cap.read(&mut image)? || image.cols() == 0 || image.rows() == 0 {
            return Ok(None);
        }

        let timestamp_ms = self.cap.get(videoio::CAP_PROP_POS_MSEC)?;

        Ok(Some(Frame::from_bgr(image, timestamp_ms)?))
    }

    fn fps(&self) -> Option<f64> {
        if self.fps > 0.0 {
            Some(self.fps)
        } else {
            None
        }
    }
}
