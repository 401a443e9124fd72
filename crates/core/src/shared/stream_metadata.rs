use crate::source::domain::source_descriptor::{ContainerKind, SourceDescriptor};

/// What is known about a stream once its session is open.
///
/// For AVI sources the dimensions come from the container header; for raw
/// MJPEG and HTTP sources they are the configured defaults until the first
/// frame is decoded.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamMetadata {
    pub width: u32,
    pub height: u32,
    pub declared_fps: Option<f64>,
    pub declared_frames: Option<u32>,
    pub container: ContainerKind,
    /// The strf FourCC for AVI, `mjpeg` otherwise.
    pub codec: String,
    pub source: SourceDescriptor,
}

impl StreamMetadata {
    pub fn with_defaults(source: SourceDescriptor, container: ContainerKind, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            declared_fps: None,
            declared_frames: None,
            container,
            codec: "mjpeg".to_string(),
            source,
        }
    }
}
