use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to spawn frame processing thread: {0}")]
    WorkerSpawn(std::io::Error),
    #[error("Landmark detection failed: {0}")]
    LandmarkDetection(String),
    #[error("Embedding Error: {0}")]
    Embedding(#[from] EmbeddingError),
}

// Pose normalization / embedding errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    #[error("Expected at least {expected} landmarks, got {actual}")]
    TooFewLandmarks { expected: usize, actual: usize },
    #[error("Degenerate pose, pose size is {0}")]
    DegeneratePose(f32),
}

// Reference sample parsing errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SampleError {
    #[error("Invalid number of tokens for pose sample: expected {expected}, got {actual}")]
    InvalidTokenCount { expected: usize, actual: usize },
    #[error("Invalid value {0} for landmark position")]
    InvalidValue(String),
    #[error("Unusable sample landmarks: {0}")]
    Embedding(#[from] EmbeddingError),
}
