pub mod camera;
pub mod common;
pub mod config;
pub mod error;
pub mod pipeline;

pub use config::Configuration;
pub use error::{AppError, EmbeddingError, SampleError};
