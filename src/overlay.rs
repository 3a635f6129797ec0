use opencv::{
    core::{self, Mat},
    imgproc,
    prelude::*,
    videoio,
};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::error::Error;
use crate::frame::Frame;
use crate::motion::Angles;
use crate::tracker::PointPair;

const PALETTE: [(f64, f64, f64); 6] = [
    (255.0, 64.0, 64.0),
    (64.0, 255.0, 64.0),
    (64.0, 64.0, 255.0),
    (255.0, 255.0, 0.0),
    (255.0, 0.0, 255.0),
    (0.0, 255.0, 255.0),
];

/// Writes processed frames with point trails to a video file.
pub struct TrackOverlay {
    writer: Option<videoio::VideoWriter>,
    size: Option<(i32, i32)>,
    trails: Mat,
    out_file: PathBuf,
    fps: f64,
}

impl TrackOverlay {
    pub fn new<P: Into<PathBuf>>(out_file: P, fps: f64) -> Self {
        Self {
            writer: None,
            size: None,
            trails: Mat::default(),
            out_file: out_file.into(),
            fps,
        }
    }

    pub fn release(&mut self) {
        if let Some(mut w) = self.writer.take() {
            if let Err(err) = w.release() {
                warn!("failed to finalize overlay {}: {}", self.out_file.display(), err);
            }
        }
    }

    fn reinit(&mut self, size: (i32, i32)) -> Result<(), Error> {
        self.release();

        let name = self
            .out_file
            .to_str()
            .ok_or_else(|| Error::Open(self.out_file.clone()))?;

        let writer = videoio::VideoWriter::new(
            name,
            videoio::VideoWriter::fourcc('m', 'p', '4', 'v')?,
            self.fps,
            core::Size::new(size.0, size.1),
            true,
        )?;

        if !writer.is_opened()? {
            return Err(Error::Open(self.out_file.clone()));
        }

        info!("writing overlay to {}", self.out_file.display());

        self.trails = Mat::new_rows_cols_with_default(size.1, size.0, core::CV_8UC3, core::Scalar::all(0.0))?;
        self.size = Some(size);
        self.writer = Some(writer);

        Ok(())
    }

    pub fn feed(&mut self, frame: &Frame, pairs: &[PointPair], angles: Angles) -> Result<(), Error> {
        let mut canvas = match &frame.image {
            Some(image) if image.channels() == 3 => image.try_clone()?,
            _ => {
                let mut bgr = Mat::default();
                imgproc::cvt_color_def(&frame.gray, &mut bgr, imgproc::COLOR_GRAY2BGR)?;
                bgr
            }
        };

        let size = frame.dims();
        if self.writer.is_none() || self.size != Some(size) {
            self.reinit(size)?;
        }

        for (i, (old, new)) in pairs.iter().enumerate() {
            let (b, g, r) = PALETTE[i % PALETTE.len()];
            let color = core::Scalar::new(b, g, r, 0.0);
            let from = core::Point::new(old.x as i32, old.y as i32);
            let to = core::Point::new(new.x as i32, new.y as i32);

            imgproc::line(&mut self.trails, to, from, color, 2, imgproc::LINE_8, 0)?;
            imgproc::circle(&mut canvas, to, 5, color, -1, imgproc::LINE_8, 0)?;
        }

        let mut out = Mat::default();
        core::add(&canvas, &self.trails, &mut out, &core::no_array(), -1)?;

        imgproc::put_text(
            &mut out,
            &format!("{:.0}ms x={:.1} y={:.1}", frame.timestamp_ms, angles.x, angles.y),
            core::Point::new(10, 30),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.8,
            core::Scalar::new(255.0, 255.0, 0.0, 255.0),
            1,
            imgproc::LINE_AA,
            false,
        )?;

        if let Some(writer) = self.writer.as_mut() {
            writer.write(&out)?;
        }

        Ok(())
    }
}

impl Drop for TrackOverlay {
    fn drop(&mut self) {
        self.release();
    }
}
