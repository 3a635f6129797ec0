use nalgebra as na;

use crate::config::FieldOfView;
use crate::tracker::PointPair;

/// Camera orientation relative to the first frame, in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Angles {
    pub x: f64,
    pub y: f64,
}

/// Cumulative pixel displacement. Frame size is fixed on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionState {
    pub x_movement: f64,
    pub y_movement: f64,
    width: f64,
    height: f64,
}

impl MotionState {
    #[inline]
    pub fn dims(&self) -> (f64, f64) {
        (self.width, self.height)
    }
}

pub struct MotionAccumulator {
    state: MotionState,
    fov: FieldOfView,
    angles: Angles,
}

impl MotionAccumulator {
    pub fn new(width: i32, height: i32, fov: FieldOfView) -> Self {
        Self {
            state: MotionState {
                x_movement: 0.0,
                y_movement: 0.0,
                width: width as f64,
                height: height as f64,
            },
            fov,
            angles: Angles::default(),
        }
    }

    #[inline]
    pub fn state(&self) -> &MotionState {
        &self.state
    }

    #[inline]
    pub fn angles(&self) -> Angles {
        self.angles
    }

    /// Folds the mean displacement of `pairs` into the running totals.
    ///
    /// Leftward scene motion (camera panning right) counts as positive x,
    /// downward scene motion (camera tilting up) as positive y. Returns `false` and leaves the
    /// state untouched when there is nothing to average.
    pub fn accumulate(&mut self, pairs: &[PointPair]) -> bool {
        if pairs.is_empty() {
            return false;
        }

        let sum = pairs
            .iter()
            .fold(na::Vector2::<f64>::zeros(), |acc, (old, new)| {
                acc + na::Vector2::new((old.x - new.x) as f64, (new.y - old.y) as f64)
            });
        let mean = sum / pairs.len() as f64;

        self.state.x_movement += mean.x;
        self.state.y_movement += mean.y;

        self.angles = Angles {
            x: self.state.x_movement / self.state.width * self.fov.degrees_per_width(),
            y: self.state.y_movement / self.state.height * self.fov.degrees_per_height(),
        };

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(ox: f32, oy: f32, nx: f32, ny: f32) -> PointPair {
        (na::Point2::new(ox, oy), na::Point2::new(nx, ny))
    }

    #[test]
    fn averages_and_converts_to_degrees() {
        let mut acc = MotionAccumulator::new(400, 300, FieldOfView::default());

        // scene slides 40px left and 30px up the image
        assert!(acc.accumulate(&[
            pair(100.0, 100.0, 60.0, 70.0),
            pair(200.0, 150.0, 160.0, 120.0),
        ]));

        assert_eq!(acc.state().x_movement, 40.0);
        assert_eq!(acc.state().y_movement, -30.0);

        let angles = acc.angles();
        assert!((angles.x - 4.5).abs() < 1e-9);
        assert!((angles.y + 3.6).abs() < 1e-9);
    }

    #[test]
    fn downward_scene_motion_is_positive_y() {
        let mut acc = MotionAccumulator::new(100, 100, FieldOfView::default());
        acc.accumulate(&[pair(10.0, 10.0, 10.0, 20.0)]);

        assert_eq!(acc.state().y_movement, 10.0);
        assert_eq!(acc.state().x_movement, 0.0);
    }

    #[test]
    fn empty_set_carries_forward() {
        let mut acc = MotionAccumulator::new(400, 300, FieldOfView::default());
        acc.accumulate(&[pair(50.0, 50.0, 30.0, 50.0)]);
        let before = (acc.state().clone(), acc.angles());

        assert!(!acc.accumulate(&[]));
        assert_eq!((acc.state().clone(), acc.angles()), before);
        assert_eq!(acc.state().dims(), (400.0, 300.0));
    }

    #[test]
    fn divisors_are_configurable() {
        let fov = FieldOfView {
            horizontal_divisor: 2.0,
            vertical_divisor: 2.0,
        };
        let mut acc = MotionAccumulator::new(100, 100, fov);
        acc.accumulate(&[pair(100.0, 0.0, 50.0, 0.0)]);

        assert!((acc.angles().x - 45.0).abs() < 1e-9);
    }
}
