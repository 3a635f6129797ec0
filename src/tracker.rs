use nalgebra as na;
use opencv::{
    core::{self, Mat, Point2f, Vector},
    imgproc,
    prelude::*,
    video,
};
use tracing::debug;

use crate::config::{FeatureConfig, FlowConfig};
use crate::error::Error;

/// A tracked point in the previous frame and where it landed in the next.
pub type PointPair = (na::Point2<f32>, na::Point2<f32>);

#[derive(Debug, Clone, PartialEq)]
pub enum TrackStep {
    /// Correspondences for the points that survived. May be empty.
    Matched(Vec<PointPair>),
    /// Flow produced nothing at all; the tracker has reseeded.
    Lost,
}

pub trait PointTracker {
    fn seed(&mut self, gray: &Mat) -> Result<(), Error>;
    fn track(&mut self, prev: &Mat, next: &Mat) -> Result<TrackStep, Error>;
}

/// Bounded set of points currently being followed.
#[derive(Default)]
pub struct TrackSet {
    points: Vector<Point2f>,
}

impl TrackSet {
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = na::Point2<f32>> + '_ {
        self.points.iter().map(|p| na::Point2::new(p.x, p.y))
    }
}

/// Shi-Tomasi seeding plus pyramidal Lucas-Kanade flow.
pub struct FeatureTracker {
    features: FeatureConfig,
    flow: FlowConfig,
    tracks: TrackSet,
}

impl FeatureTracker {
    pub fn new(features: FeatureConfig, flow: FlowConfig) -> Self {
        Self {
            features,
            flow,
            tracks: TrackSet::default(),
        }
    }

    #[inline]
    pub fn tracks(&self) -> &TrackSet {
        &self.tracks
    }

    fn detect(&self, gray: &Mat) -> Result<Vector<Point2f>, Error> {
        let mut corners = Vector::<Point2f>::new();

        imgproc::good_features_to_track(
            gray,
            &mut corners,
            self.features.max_corners,
            self.features.quality_level,
            self.features.min_distance,
            &core::no_array(),
            self.features.block_size,
            false,
            0.04,
        )?;

        Ok(corners)
    }
}

impl PointTracker for FeatureTracker {
    fn seed(&mut self, gray: &Mat) -> Result<(), Error> {
        self.tracks.points = self.detect(gray)?;
        debug!("seeded {} features", self.tracks.len());

        Ok(())
    }

    fn track(&mut self, prev: &Mat, next: &Mat) -> Result<TrackStep, Error> {
        let mut next_pts = Vector::<Point2f>::new();
        let mut status = Vector::<u8>::new();
        let mut err = Vector::<f32>::new();

        if !self.tracks.is_empty() {
            let criteria = core::TermCriteria::new(
                core::TermCriteria_COUNT | core::TermCriteria_EPS,
                self.flow.max_iterations,
                self.flow.epsilon,
            )?;

            video::calc_optical_flow_pyr_lk(
                prev,
                next,
                &self.tracks.points,
                &mut next_pts,
                &mut status,
                &mut err,
                core::Size::new(self.flow.win_size, self.flow.win_size),
                self.flow.max_level,
                criteria,
                0,
                1e-4,
            )?;
        }

        if next_pts.is_empty() {
            self.seed(prev)?;
            return Ok(TrackStep::Lost);
        }

        let mut survivors = Vector::<Point2f>::with_capacity(next_pts.len());
        let mut pairs = Vec::with_capacity(next_pts.len());

        for ((old, new), st) in self.tracks.points.iter().zip(next_pts.iter()).zip(status.iter()) {
            if st == 1 {
                survivors.push(new);
                pairs.push((na::Point2::new(old.x, old.y), na::Point2::new(new.x, new.y)));
            }
        }

        self.tracks.points = survivors;

        Ok(TrackStep::Matched(pairs))
    }
}
