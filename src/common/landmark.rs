use crate::common::point::PointF3D;

/// Number of landmarks produced by the pose detector for a single body.
pub const NUM_LANDMARKS: usize = 33;

/// Body landmark types in detector output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum LandmarkType {
    Nose = 0,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    LeftMouth,
    RightMouth,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl LandmarkType {
    pub const ALL: [LandmarkType; NUM_LANDMARKS] = [
        LandmarkType::Nose,
        LandmarkType::LeftEyeInner,
        LandmarkType::LeftEye,
        LandmarkType::LeftEyeOuter,
        LandmarkType::RightEyeInner,
        LandmarkType::RightEye,
        LandmarkType::RightEyeOuter,
        LandmarkType::LeftEar,
        LandmarkType::RightEar,
        LandmarkType::LeftMouth,
        LandmarkType::RightMouth,
        LandmarkType::LeftShoulder,
        LandmarkType::RightShoulder,
        LandmarkType::LeftElbow,
        LandmarkType::RightElbow,
        LandmarkType::LeftWrist,
        LandmarkType::RightWrist,
        LandmarkType::LeftPinky,
        LandmarkType::RightPinky,
        LandmarkType::LeftIndex,
        LandmarkType::RightIndex,
        LandmarkType::LeftThumb,
        LandmarkType::RightThumb,
        LandmarkType::LeftHip,
        LandmarkType::RightHip,
        LandmarkType::LeftKnee,
        LandmarkType::RightKnee,
        LandmarkType::LeftAnkle,
        LandmarkType::RightAnkle,
        LandmarkType::LeftHeel,
        LandmarkType::RightHeel,
        LandmarkType::LeftFootIndex,
        LandmarkType::RightFootIndex,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseLandmark {
    pub landmark_type: LandmarkType,
    pub position: PointF3D,
}

/// Detector output for one frame. An empty pose means no body was found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pose {
    landmarks: Vec<PoseLandmark>,
}

impl Pose {
    pub fn new(landmarks: Vec<PoseLandmark>) -> Self {
        Self { landmarks }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a pose from positions given in detector order; extra points are ignored.
    pub fn from_positions(positions: &[PointF3D]) -> Self {
        let landmarks = LandmarkType::ALL
            .iter()
            .zip(positions)
            .map(|(&landmark_type, &position)| PoseLandmark {
                landmark_type,
                position,
            })
            .collect();
        Self { landmarks }
    }

    pub fn all_landmarks(&self) -> &[PoseLandmark] {
        &self.landmarks
    }

    pub fn landmark(&self, landmark_type: LandmarkType) -> Option<&PoseLandmark> {
        self.landmarks
            .iter()
            .find(|landmark| landmark.landmark_type == landmark_type)
    }

    pub fn positions(&self) -> Vec<PointF3D> {
        self.landmarks.iter().map(|landmark| landmark.position).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}
