pub mod landmark;
pub mod point;

pub use landmark::{LandmarkType, NUM_LANDMARKS, Pose, PoseLandmark};
pub use point::PointF3D;
