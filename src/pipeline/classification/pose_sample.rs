use crate::common::{NUM_LANDMARKS, PointF3D};
use crate::error::{AppError, SampleError};
use crate::pipeline::classification::pose_embedding::pose_embedding;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const NUM_DIMS: usize = 3;
// Name and class come before the coordinates.
const HEADER_TOKENS: usize = 2;

/// A labeled reference pose, stored as its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSample {
    name: String,
    class_name: String,
    embedding: Vec<PointF3D>,
}

impl PoseSample {
    pub fn new(
        name: impl Into<String>,
        class_name: impl Into<String>,
        landmarks: &[PointF3D],
    ) -> Result<Self, SampleError> {
        Ok(Self {
            name: name.into(),
            class_name: class_name.into(),
            embedding: pose_embedding(landmarks)?,
        })
    }

    /// Parses `name,class,x1,y1,z1,...,x33,y33,z33`.
    pub fn from_csv_line(line: &str, separator: &str) -> Result<Self, SampleError> {
        let record = SampleRecord::parse(line, separator)?;
        Self::new(record.name, record.class_name, &record.landmarks)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn embedding(&self) -> &[PointF3D] {
        &self.embedding
    }
}

/// One sample line split into its fields, landmarks not yet embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord<'a> {
    pub name: &'a str,
    pub class_name: &'a str,
    pub landmarks: Vec<PointF3D>,
}

impl<'a> SampleRecord<'a> {
    pub fn parse(line: &'a str, separator: &str) -> Result<Self, SampleError> {
        let tokens: Vec<&str> = line.trim_end().split(separator).collect();
        let expected = NUM_LANDMARKS * NUM_DIMS + HEADER_TOKENS;
        if tokens.len() != expected {
            return Err(SampleError::InvalidTokenCount {
                expected,
                actual: tokens.len(),
            });
        }

        Ok(Self {
            name: tokens[0],
            class_name: tokens[1],
            landmarks: parse_landmarks(&tokens[HEADER_TOKENS..])?,
        })
    }
}

/// Parses coordinate tokens (`x1,y1,z1,x2,...`) into points.
pub fn parse_landmarks(tokens: &[&str]) -> Result<Vec<PointF3D>, SampleError> {
    tokens
        .chunks(NUM_DIMS)
        .map(|chunk| {
            if chunk.len() != NUM_DIMS {
                return Err(SampleError::InvalidTokenCount {
                    expected: NUM_DIMS,
                    actual: chunk.len(),
                });
            }
            let mut coords = [0.0f32; NUM_DIMS];
            for (coord, token) in coords.iter_mut().zip(chunk) {
                *coord = token
                    .trim()
                    .parse()
                    .map_err(|_| SampleError::InvalidValue(token.to_string()))?;
            }
            Ok(PointF3D::from(coords))
        })
        .collect()
}

/// Applies `parse` to every non-blank line, skipping the lines it rejects.
///
/// A read error ends reading early; the values parsed so far are kept.
pub fn read_sample_lines<T>(
    reader: impl BufRead,
    mut parse: impl FnMut(&str) -> Result<T, SampleError>,
) -> Vec<T> {
    let mut values = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("Error when reading pose samples: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse(&line) {
            Ok(value) => values.push(value),
            Err(e) => tracing::debug!("Skipping pose sample on line {}: {}", line_number + 1, e),
        }
    }
    values
}

/// Reads every valid sample from `reader`, skipping malformed lines.
pub fn load_pose_samples(reader: impl BufRead, separator: &str) -> Vec<PoseSample> {
    let samples = read_sample_lines(reader, |line| PoseSample::from_csv_line(line, separator));
    tracing::info!("Loaded {} pose samples", samples.len());
    samples
}

pub fn load_pose_samples_from_path(
    path: &Path,
    separator: &str,
) -> Result<Vec<PoseSample>, AppError> {
    let file = File::open(path)?;
    Ok(load_pose_samples(BufReader::new(file), separator))
}
