//! Translation and scale invariant pose embedding.
//!
//! Landmarks are centered on the hips, scaled by the pose size and then
//! turned into a fixed list of deltas between landmark pairs. Live poses and
//! reference samples must go through the same function so the vectors line
//! up index by index.

use crate::common::{LandmarkType, NUM_LANDMARKS, PointF3D};
use crate::error::EmbeddingError;

/// Multiplier applied to the torso to get the minimal body size. Picked by experimentation.
const TORSO_MULTIPLIER: f32 = 2.5;

/// Landmarks are scaled to this range after normalization.
const NORMALIZED_SCALE: f32 = 100.0;

/// Number of vectors in a pose embedding.
pub const EMBEDDING_SIZE: usize = 23;

pub fn pose_embedding(landmarks: &[PointF3D]) -> Result<Vec<PointF3D>, EmbeddingError> {
    if landmarks.len() < NUM_LANDMARKS {
        return Err(EmbeddingError::TooFewLandmarks {
            expected: NUM_LANDMARKS,
            actual: landmarks.len(),
        });
    }
    let normalized = normalize(landmarks)?;
    Ok(embedding(&normalized))
}

fn normalize(landmarks: &[PointF3D]) -> Result<Vec<PointF3D>, EmbeddingError> {
    let center = PointF3D::average(
        landmarks[LandmarkType::LeftHip.index()],
        landmarks[LandmarkType::RightHip.index()],
    );
    let centered: Vec<PointF3D> = landmarks.iter().map(|&p| p - center).collect();

    let pose_size = pose_size(&centered);
    if !pose_size.is_finite() || pose_size < f32::EPSILON {
        return Err(EmbeddingError::DegeneratePose(pose_size));
    }

    let scale = NORMALIZED_SCALE / pose_size;
    Ok(centered.into_iter().map(|p| p * scale).collect())
}

// Only x/y are used; depth did not help in experimentation.
fn pose_size(landmarks: &[PointF3D]) -> f32 {
    let hips_center = PointF3D::average(
        landmarks[LandmarkType::LeftHip.index()],
        landmarks[LandmarkType::RightHip.index()],
    );
    let shoulders_center = PointF3D::average(
        landmarks[LandmarkType::LeftShoulder.index()],
        landmarks[LandmarkType::RightShoulder.index()],
    );
    let torso_size = (hips_center - shoulders_center).l2_norm_2d();

    landmarks
        .iter()
        .map(|&landmark| (hips_center - landmark).l2_norm_2d())
        .fold(torso_size * TORSO_MULTIPLIER, f32::max)
}

fn embedding(lm: &[PointF3D]) -> Vec<PointF3D> {
    use LandmarkType::*;

    let at = |landmark_type: LandmarkType| lm[landmark_type.index()];
    let delta = |from: LandmarkType, to: LandmarkType| at(from) - at(to);

    vec![
        // One joint.
        PointF3D::average(at(LeftHip), at(RightHip))
            - PointF3D::average(at(LeftShoulder), at(RightShoulder)),
        delta(LeftShoulder, LeftElbow),
        delta(RightShoulder, RightElbow),
        delta(LeftElbow, LeftWrist),
        delta(RightElbow, RightWrist),
        delta(LeftHip, LeftKnee),
        delta(RightHip, RightKnee),
        delta(LeftKnee, LeftAnkle),
        delta(RightKnee, RightAnkle),
        // Two joints.
        delta(LeftShoulder, LeftWrist),
        delta(RightShoulder, RightWrist),
        delta(LeftHip, LeftAnkle),
        delta(RightHip, RightAnkle),
        // Four joints.
        delta(LeftHip, LeftWrist),
        delta(RightHip, RightWrist),
        // Five joints.
        delta(LeftShoulder, LeftAnkle),
        delta(RightShoulder, RightAnkle),
        delta(LeftHip, LeftWrist),
        delta(RightHip, RightWrist),
        // Cross body.
        delta(LeftElbow, RightElbow),
        delta(LeftKnee, RightKnee),
        delta(LeftWrist, RightWrist),
        delta(LeftAnkle, RightAnkle),
    ]
}
