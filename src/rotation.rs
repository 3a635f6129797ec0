use opencv::{core, prelude::*};
use serde_derive::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::metadata::{MetadataSource, ProbeOutput};

/// Display rotation needed to present decoded pixels upright.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationCode {
    #[default]
    None,
    Rotate90Clockwise,
    Rotate180,
    Rotate90CounterClockwise,
}

impl RotationCode {
    /// Maps an effective rotation in degrees. Only exactly 90, 180 and 270
    /// carry a correction; negative or wrapped values yield `None`.
    pub fn from_degrees(degrees: i64) -> Self {
        match degrees {
            90 => RotationCode::Rotate90Clockwise,
            180 => RotationCode::Rotate180,
            270 => RotationCode::Rotate90CounterClockwise,
            _ => RotationCode::None,
        }
    }

    /// OpenCV `RotateFlags` value, `None` when no rotation is applied.
    pub fn flag(self) -> Option<i32> {
        match self {
            RotationCode::None => None,
            RotationCode::Rotate90Clockwise => Some(core::ROTATE_90_CLOCKWISE),
            RotationCode::Rotate180 => Some(core::ROTATE_180),
            RotationCode::Rotate90CounterClockwise => Some(core::ROTATE_90_COUNTERCLOCKWISE),
        }
    }

    pub fn inverse(self) -> Self {
        match self {
            RotationCode::Rotate90Clockwise => RotationCode::Rotate90CounterClockwise,
            RotationCode::Rotate90CounterClockwise => RotationCode::Rotate90Clockwise,
            other => other,
        }
    }

    pub fn apply(self, src: Mat) -> opencv::Result<Mat> {
        match self.flag() {
            Some(flag) => {
                let mut dst = Mat::default();
                core::rotate(&src, &mut dst, flag)?;
                Ok(dst)
            }
            None => Ok(src),
        }
    }
}

/// Effective correction: the stream `rotate` tag minus the side-data
/// rotation, which describes device orientation rather than compensation.
pub fn resolve(meta: &ProbeOutput) -> RotationCode {
    let mut effective: i64 = 0;

    if let Some(tag) = meta.rotate_tag() {
        effective = match effective.checked_add(tag) {
            Some(v) => v,
            None => return RotationCode::None,
        };
    }

    if let Some(screen) = meta.side_data_rotation() {
        effective = match effective.checked_sub(screen) {
            Some(v) => v,
            None => return RotationCode::None,
        };
    }

    RotationCode::from_degrees(effective)
}

pub struct RotationResolver<M> {
    source: M,
}

impl<M: MetadataSource> RotationResolver<M> {
    pub fn new(source: M) -> Self {
        Self { source }
    }

    /// Never fails: unreadable metadata means no correction.
    pub fn resolve_file(&self, path: &Path) -> RotationCode {
        match self.source.probe(path) {
            Ok(meta) => {
                let code = resolve(&meta);
                debug!(
                    "rotation for {}: tag={:?} side_data={:?} -> {:?}",
                    path.display(),
                    meta.rotate_tag(),
                    meta.side_data_rotation(),
                    code
                );
                code
            }
            Err(err) => {
                warn!(
                    "rotation metadata unavailable for {}: {}",
                    path.display(),
                    err
                );
                RotationCode::None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn meta(json: &str) -> ProbeOutput {
        ProbeOutput::from_json(json).unwrap()
    }

    #[test]
    fn tag_only() {
        let m = meta(r#"{"streams": [{"codec_type": "video", "tags": {"rotate": "90"}}]}"#);
        assert_eq!(resolve(&m), RotationCode::Rotate90Clockwise);

        let m = meta(r#"{"streams": [{"codec_type": "video", "tags": {"rotate": "180"}}]}"#);
        assert_eq!(resolve(&m), RotationCode::Rotate180);

        let m = meta(r#"{"streams": [{"codec_type": "video", "tags": {"rotate": "270"}}]}"#);
        assert_eq!(resolve(&m), RotationCode::Rotate90CounterClockwise);
    }

    #[test]
    fn side_data_is_subtracted() {
        let m = meta(
            r#"{"streams": [{"codec_type": "video",
                "side_data_list": [{"side_data_type": "Display Matrix", "rotation": -90}]}]}"#,
        );
        assert_eq!(resolve(&m), RotationCode::Rotate90Clockwise);

        let m = meta(
            r#"{"streams": [{"codec_type": "video",
                "side_data_list": [{"side_data_type": "Display Matrix", "rotation": 90}]}]}"#,
        );
        assert_eq!(resolve(&m), RotationCode::None);

        let m = meta(
            r#"{"streams": [{"codec_type": "video",
                "side_data_list": [{"side_data_type": "Display Matrix", "rotation": 180}]}]}"#,
        );
        assert_eq!(resolve(&m), RotationCode::None);

        let m = meta(
            r#"{"streams": [{"codec_type": "video",
                "side_data_list": [{"side_data_type": "Display Matrix", "rotation": -270}]}]}"#,
        );
        assert_eq!(resolve(&m), RotationCode::Rotate90CounterClockwise);
    }

    #[test]
    fn only_exact_quarter_turns_map() {
        assert_eq!(RotationCode::from_degrees(-90), RotationCode::None);
        assert_eq!(RotationCode::from_degrees(-180), RotationCode::None);
        assert_eq!(RotationCode::from_degrees(-270), RotationCode::None);
        assert_eq!(RotationCode::from_degrees(450), RotationCode::None);
        assert_eq!(RotationCode::from_degrees(540), RotationCode::None);
        assert_eq!(RotationCode::from_degrees(i64::MIN), RotationCode::None);
    }

    #[test]
    fn huge_metadata_values_fall_back_to_none() {
        let m = meta(
            r#"{"streams": [{"codec_type": "video", "tags": {"rotate": "1e300"},
                "side_data_list": [{"rotation": -1}]}]}"#,
        );
        assert_eq!(resolve(&m), RotationCode::None);

        let m = meta(
            r#"{"streams": [{"codec_type": "video", "tags": {"rotate": "-9223372036854775808"},
                "side_data_list": [{"rotation": 1}]}]}"#,
        );
        assert_eq!(resolve(&m), RotationCode::None);
    }

    #[test]
    fn tag_and_side_data_cancel() {
        let m = meta(
            r#"{"streams": [{"codec_type": "video", "tags": {"rotate": "90"},
                "side_data_list": [{"rotation": 90}]}]}"#,
        );
        assert_eq!(resolve(&m), RotationCode::None);
    }

    #[test]
    fn absent_metadata_is_none() {
        assert_eq!(resolve(&meta(r#"{}"#)), RotationCode::None);
        assert_eq!(
            resolve(&meta(r#"{"streams": [{"codec_type": "audio", "tags": {"rotate": "90"}}]}"#)),
            RotationCode::None
        );
        assert_eq!(RotationCode::from_degrees(45), RotationCode::None);
        assert_eq!(RotationCode::from_degrees(360), RotationCode::None);
    }

    struct FailingProbe;

    impl MetadataSource for FailingProbe {
        fn probe(&self, _path: &Path) -> Result<ProbeOutput, Error> {
            Err(Error::Probe("broken container".into()))
        }
    }

    #[test]
    fn probe_failure_falls_back_to_none() {
        let resolver = RotationResolver::new(FailingProbe);

        assert_eq!(
            resolver.resolve_file(Path::new("broken.mp4")),
            RotationCode::None
        );
    }

    #[test]
    fn flags_follow_opencv() {
        assert_eq!(RotationCode::None.flag(), None);
        assert_eq!(RotationCode::Rotate90Clockwise.flag(), Some(0));
        assert_eq!(RotationCode::Rotate180.flag(), Some(1));
        assert_eq!(RotationCode::Rotate90CounterClockwise.flag(), Some(2));
    }

    #[test]
    fn apply_then_inverse_restores_frame() -> opencv::Result<()> {
        let mut src = Mat::new_rows_cols_with_default(4, 6, core::CV_8UC1, core::Scalar::all(0.0))?;
        *src.at_2d_mut::<u8>(1, 4)? = 200;

        let rotated = RotationCode::Rotate90Clockwise.apply(src.try_clone()?)?;
        assert_eq!((rotated.cols(), rotated.rows()), (4, 6));

        let restored = RotationCode::Rotate90Clockwise.inverse().apply(rotated)?;
        assert_eq!(*restored.at_2d::<u8>(1, 4)?, 200);

        Ok(())
    }
}
