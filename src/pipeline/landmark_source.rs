use crate::camera::FrameMetadata;
use crate::common::{PointF3D, Pose};
use crate::error::AppError;
use crate::pipeline::classification::pose_sample::{SampleRecord, read_sample_lines};
use std::io::BufRead;

/// Pose landmark detector for raw camera frames.
///
/// Returns an empty [`Pose`] when no body is visible. Errors are handled by
/// the frame scheduler, which logs them and moves on to the next frame.
pub trait LandmarkSource: Send {
    fn detect(&mut self, data: &[u8], metadata: &FrameMetadata) -> Result<Pose, AppError>;
}

/// Replays recorded poses in a loop, ignoring frame contents.
pub struct ReplayLandmarkSource {
    poses: Vec<Pose>,
    next: usize,
}

impl ReplayLandmarkSource {
    pub fn new(poses: Vec<Pose>) -> Self {
        Self { poses, next: 0 }
    }

    /// Reads poses from sample-formatted lines (`name,class,x1,y1,z1,...`).
    ///
    /// Lines are read the same way as pose samples: malformed lines are
    /// skipped and a read error keeps the poses read so far.
    pub fn from_reader(reader: impl BufRead, separator: &str) -> Self {
        let poses = read_sample_lines(reader, |line| {
            SampleRecord::parse(line, separator)
                .map(|record| Pose::from_positions(&record.landmarks))
        });
        Self::new(poses)
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }
}

impl LandmarkSource for ReplayLandmarkSource {
    fn detect(&mut self, data: &[u8], _metadata: &FrameMetadata) -> Result<Pose, AppError> {
        if data.is_empty() {
            return Err(AppError::LandmarkDetection("empty frame".to_string()));
        }
        if self.poses.is_empty() {
            return Ok(Pose::empty());
        }
        let pose = self.poses[self.next].clone();
        self.next = (self.next + 1) % self.poses.len();
        Ok(pose)
    }
}

/// Convenience for tests and fixed scenes.
impl From<Vec<Vec<PointF3D>>> for ReplayLandmarkSource {
    fn from(poses: Vec<Vec<PointF3D>>) -> Self {
        Self::new(poses.iter().map(|p| Pose::from_positions(p)).collect())
    }
}
