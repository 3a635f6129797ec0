//! Pixel-only verification that a video pans from one claimed compass
//! direction to another.
//!
//! Points are tracked with sparse optical flow, their mean displacement is
//! converted to pan/tilt angles, and the time spent facing each claimed
//! direction decides the verdict.

pub mod classifier;
pub mod config;
pub mod decision;
pub mod error;
pub mod frame;
pub mod math;
pub mod metadata;
pub mod motion;
pub mod overlay;
pub mod rotation;
pub mod source;
pub mod tracker;
pub mod verifier;

pub use config::VerifierConfig;
pub use decision::VerificationResult;
pub use error::Error;
pub use frame::Frame;
pub use rotation::RotationCode;
pub use verifier::Verifier;

use std::path::Path;

/// Verifies a video file with the given configuration.
pub fn verify_video<P: AsRef<Path>>(
    path: P,
    direction: f64,
    second_direction: f64,
    config: &VerifierConfig,
) -> Result<VerificationResult, Error> {
    Verifier::new(config.clone()).verify_file(path, direction, second_direction)
}
