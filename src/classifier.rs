use crate::config::Tolerances;
use crate::math::{circular_distance, wrap_degrees};
use crate::motion::Angles;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationState {
    pub in_direction: bool,
    pub in_second_direction: bool,
    pub direction_time_ms: f64,
    pub second_direction_time_ms: f64,
    pub previous_time_ms: f64,
    pub current_time_ms: f64,
}

/// Decides whether the camera faces the first or the second claimed
/// direction and accrues dwell time for each.
///
/// The first direction is where recording starts, so it is judged purely
/// from the accumulated angles staying near zero. The second is judged on
/// the circle, relative to the first.
pub struct DirectionClassifier {
    direction: f64,
    second_direction: f64,
    tolerances: Tolerances,
    state: ClassificationState,
}

impl DirectionClassifier {
    pub fn new(direction: f64, second_direction: f64, tolerances: Tolerances) -> Self {
        let mut classifier = Self {
            direction: wrap_degrees(direction),
            second_direction: wrap_degrees(second_direction),
            tolerances,
            state: ClassificationState {
                in_direction: false,
                in_second_direction: false,
                direction_time_ms: 0.0,
                second_direction_time_ms: 0.0,
                previous_time_ms: 0.0,
                current_time_ms: 0.0,
            },
        };

        classifier.classify(Angles::default());
        classifier
    }

    #[inline]
    pub fn state(&self) -> &ClassificationState {
        &self.state
    }

    pub fn into_state(self) -> ClassificationState {
        self.state
    }

    pub fn classify(&mut self, angles: Angles) {
        let level = angles.y.abs() < self.tolerances.vertical_deg;
        let heading = wrap_degrees(self.direction + angles.x);

        self.state.in_direction = level && angles.x.abs() < self.tolerances.horizontal_deg;
        self.state.in_second_direction = level
            && circular_distance(self.second_direction, heading).abs()
                < self.tolerances.horizontal_deg;
    }

    /// Moves the clock to the timestamp of the frame just read.
    #[inline]
    pub fn advance(&mut self, timestamp_ms: f64) {
        self.state.previous_time_ms = self.state.current_time_ms;
        self.state.current_time_ms = timestamp_ms;
    }

    /// Credits the last clock interval to every state that currently holds.
    /// Stalled or backwards timestamps credit nothing.
    pub fn accrue(&mut self) {
        let s = &mut self.state;

        if s.current_time_ms > s.previous_time_ms {
            let dt = s.current_time_ms - s.previous_time_ms;

            if s.in_direction {
                s.direction_time_ms += dt;
            }

            if s.in_second_direction {
                s.second_direction_time_ms += dt;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier(direction: f64, second: f64) -> DirectionClassifier {
        DirectionClassifier::new(direction, second, Tolerances::default())
    }

    fn at(x: f64, y: f64) -> Angles {
        Angles { x, y }
    }

    #[test]
    fn starts_facing_first_direction() {
        let c = classifier(0.0, 237.0);

        assert!(c.state().in_direction);
        assert!(!c.state().in_second_direction);
    }

    #[test]
    fn second_direction_window_wraps() {
        let mut c = classifier(350.0, 20.0);

        c.classify(at(25.0, 0.0));
        assert!(c.state().in_direction);
        assert!(c.state().in_second_direction);

        c.classify(at(65.0, 0.0));
        assert!(!c.state().in_direction);
        assert!(!c.state().in_second_direction);

        c.classify(at(-5.0, 0.0));
        assert!(!c.state().in_second_direction);
    }

    #[test]
    fn negative_pan_reaches_second_direction() {
        let mut c = classifier(10.0, 300.0);

        c.classify(at(-65.0, 0.0));
        assert!(c.state().in_second_direction);
        assert!(!c.state().in_direction);
    }

    #[test]
    fn tilt_breaks_both_states() {
        let mut c = classifier(0.0, 20.0);

        c.classify(at(10.0, 31.0));
        assert!(!c.state().in_direction);
        assert!(!c.state().in_second_direction);

        c.classify(at(10.0, -29.0));
        assert!(c.state().in_direction);
        assert!(c.state().in_second_direction);
    }

    #[test]
    fn both_states_accrue_together() {
        let mut c = classifier(0.0, 15.0);
        c.classify(at(5.0, 0.0));
        c.advance(40.0);
        c.accrue();

        assert_eq!(c.state().direction_time_ms, 40.0);
        assert_eq!(c.state().second_direction_time_ms, 40.0);
    }

    #[test]
    fn stalled_or_backwards_clock_accrues_nothing() {
        let mut c = classifier(0.0, 15.0);

        c.advance(100.0);
        c.accrue();
        c.advance(100.0);
        c.accrue();
        c.advance(80.0);
        c.accrue();

        assert_eq!(c.state().direction_time_ms, 100.0);
        assert_eq!(c.state().second_direction_time_ms, 100.0);

        c.advance(120.0);
        c.accrue();
        assert_eq!(c.state().direction_time_ms, 140.0);
    }
}
