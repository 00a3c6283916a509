/// Describes the geometry of a raw camera frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameMetadata {
    pub width: u32,
    pub height: u32,
    pub rotation_degrees: u32,
}

impl FrameMetadata {
    pub fn builder() -> FrameMetadataBuilder {
        FrameMetadataBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct FrameMetadataBuilder {
    width: u32,
    height: u32,
    rotation_degrees: u32,
}

impl FrameMetadataBuilder {
    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    // Rotation is normalized to one of 0, 90, 180 or 270.
    pub fn rotation_degrees(mut self, rotation_degrees: u32) -> Self {
        self.rotation_degrees = (rotation_degrees / 90 % 4) * 90;
        self
    }

    pub fn build(self) -> FrameMetadata {
        FrameMetadata {
            width: self.width,
            height: self.height,
            rotation_degrees: self.rotation_degrees,
        }
    }
}
