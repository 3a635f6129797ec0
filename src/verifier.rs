use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use crate::classifier::DirectionClassifier;
use crate::config::VerifierConfig;
use crate::decision::{VerificationDecision, VerificationResult};
use crate::error::Error;
use crate::metadata::Ffprobe;
use crate::motion::MotionAccumulator;
use crate::overlay::TrackOverlay;
use crate::rotation::{RotationCode, RotationResolver};
use crate::source::{FrameSource, VideoFileSource};
use crate::tracker::{FeatureTracker, PointTracker, TrackStep};

const DEFAULT_OVERLAY_FPS: f64 = 30.0;

/// Runs the decode-track-classify loop. Holds configuration only, so one
/// instance can serve any number of calls, concurrent or not.
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    config: VerifierConfig,
}

impl Verifier {
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn verify_file<P: AsRef<Path>>(
        &self,
        path: P,
        direction: f64,
        second_direction: f64,
    ) -> Result<VerificationResult, Error> {
        let path = path.as_ref();
        let rotation = RotationResolver::new(Ffprobe::new(&self.config.ffprobe)).resolve_file(path);

        let mut source = VideoFileSource::open(path)?;
        let mut tracker =
            FeatureTracker::new(self.config.features.clone(), self.config.flow.clone());

        self.run(&mut source, &mut tracker, rotation, direction, second_direction)
    }

    pub fn run<S, T>(
        &self,
        source: &mut S,
        tracker: &mut T,
        rotation: RotationCode,
        direction: f64,
        second_direction: f64,
    ) -> Result<VerificationResult, Error>
    where
        S: FrameSource,
        T: PointTracker,
    {
        let started = Instant::now();
        self.config.validate()?;

        let first = source
            .next_frame()?
            .filter(|f| !f.is_empty())
            .ok_or(Error::NoFirstFrame)?
            .rotate(rotation)?;

        let (width, height) = first.dims();
        tracker.seed(&first.gray)?;

        let mut motion = MotionAccumulator::new(width, height, self.config.field_of_view.clone());
        let mut classifier =
            DirectionClassifier::new(direction, second_direction, self.config.tolerances.clone());
        let mut overlay = self.config.overlay_path.as_ref().map(|path| {
            TrackOverlay::new(path, source.fps().unwrap_or(DEFAULT_OVERLAY_FPS))
        });

        info!(
            "verifying {}x{} video: direction={} second_direction={} rotation={:?}",
            width, height, direction, second_direction, rotation
        );

        let mut prev_gray = first.gray;
        let mut frames: u64 = 1;
        let mut lost: u64 = 0;

        loop {
            if let Some(limit) = self.limit_reached(frames, started.elapsed()) {
                warn!("stopping after {} frames: {} reached", frames, limit);
                break;
            }

            let frame = match source.next_frame() {
                Ok(Some(frame)) if !frame.is_empty() => frame,
                Ok(_) => break,
                Err(err) => {
                    warn!("treating read failure after frame {} as end of stream: {}", frames, err);
                    break;
                }
            };
            frames += 1;

            let frame = match frame.rotate(rotation) {
                Ok(frame) => frame,
                Err(err) => {
                    warn!("treating undecodable frame {} as end of stream: {}", frames, err);
                    break;
                }
            };

            if frame.dims() != (width, height) {
                warn!(
                    "frame {} is {:?}, expected {}x{}; treating as end of stream",
                    frames,
                    frame.dims(),
                    width,
                    height
                );
                break;
            }

            classifier.advance(frame.timestamp_ms);

            let pairs = match tracker.track(&prev_gray, &frame.gray) {
                Ok(TrackStep::Matched(pairs)) => pairs,
                Ok(TrackStep::Lost) => {
                    lost += 1;
                    debug!("tracking lost at {:.1}ms, reseeded", frame.timestamp_ms);
                    continue;
                }
                Err(err) => {
                    warn!("tracking failed at {:.1}ms, ending stream: {}", frame.timestamp_ms, err);
                    break;
                }
            };

            if motion.accumulate(&pairs) {
                classifier.classify(motion.angles());
            }
            classifier.accrue();

            trace!(
                "{:.1}ms: {} points, angles {:?}, state {:?}",
                frame.timestamp_ms,
                pairs.len(),
                motion.angles(),
                classifier.state()
            );

            if let Some(o) = overlay.as_mut() {
                if let Err(err) = o.feed(&frame, &pairs, motion.angles()) {
                    warn!("disabling overlay: {}", err);
                    overlay = None;
                }
            }

            prev_gray = frame.gray;
        }

        let result = VerificationDecision::new(self.config.thresholds.clone())
            .decide(classifier.state(), rotation);

        info!(
            "verified={} direction_time={}ms second_direction_time={}ms ({} frames, {} lost, {:?})",
            result.is_verified,
            result.direction_time_ms,
            result.second_direction_time_ms,
            frames,
            lost,
            started.elapsed()
        );

        Ok(result)
    }

    fn limit_reached(&self, frames: u64, elapsed: Duration) -> Option<&'static str> {
        let limits = &self.config.limits;

        if matches!(limits.max_frames, Some(max) if frames >= max) {
            return Some("frame cap");
        }

        if matches!(limits.max_processing_ms, Some(max) if elapsed >= Duration::from_millis(max)) {
            return Some("processing deadline");
        }

        None
    }
}
