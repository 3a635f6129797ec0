use opencv::{core::Mat, imgproc, prelude::*};

use crate::rotation::RotationCode;

pub struct Frame {
    /// Color (BGR) variant, when the source decoded one.
    pub image: Option<Mat>,
    pub gray: Mat,
    pub timestamp_ms: f64,
}

impl Frame {
    pub fn from_bgr(image: Mat, timestamp_ms: f64) -> opencv::Result<Self> {
        let gray = if image.channels() == 1 {
            image.try_clone()?
        } else {
            let mut gray = Mat::default();
            imgproc::cvt_color_def(&image, &mut gray, imgproc::COLOR_BGR2GRAY)?;
            gray
        };

        Ok(Self {
            image: Some(image),
            gray,
            timestamp_ms,
        })
    }

    pub fn from_gray(gray: Mat, timestamp_ms: f64) -> Self {
        Self {
            image: None,
            gray,
            timestamp_ms,
        }
    }

    /// (width, height)
    #[inline]
    pub fn dims(&self) -> (i32, i32) {
        (self.gray.cols(), self.gray.rows())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        let (w, h) = self.dims();
        w == 0 || h == 0
    }

    pub fn rotate(self, code: RotationCode) -> opencv::Result<Self> {
        if code == RotationCode::None {
            return Ok(self);
        }

        Ok(Self {
            image: self.image.map(|m| code.apply(m)).transpose()?,
            gray: code.apply(self.gray)?,
            timestamp_ms: self.timestamp_ms,
        })
    }
}
