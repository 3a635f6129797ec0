use serde::Serializer;
use serde_derive::Serialize;

use crate::classifier::ClassificationState;
use crate::config::Thresholds;
use crate::math::round2;
use crate::rotation::RotationCode;

/// Outcome of one verification. `is_verified == false` is a legitimate
/// verdict, not a failure.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct VerificationResult {
    pub is_verified: bool,
    #[serde(rename = "direction_time")]
    pub direction_time_ms: f64,
    #[serde(rename = "second_direction_time")]
    pub second_direction_time_ms: f64,
    #[serde(serialize_with = "rotate_code")]
    pub rotate_code: RotationCode,
}

fn rotate_code<S: Serializer>(code: &RotationCode, s: S) -> Result<S::Ok, S::Error> {
    match code.flag() {
        Some(flag) => s.serialize_some(&flag),
        None => s.serialize_none(),
    }
}

pub struct VerificationDecision {
    thresholds: Thresholds,
}

impl VerificationDecision {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn decide(&self, state: &ClassificationState, rotate_code: RotationCode) -> VerificationResult {
        let is_verified = state.direction_time_ms > self.thresholds.direction_ms
            && state.second_direction_time_ms > self.thresholds.second_direction_ms;

        VerificationResult {
            is_verified,
            direction_time_ms: round2(state.direction_time_ms),
            second_direction_time_ms: round2(state.second_direction_time_ms),
            rotate_code,
        }
    }
}
