use std::fmt;
use std::path::{Path, PathBuf};

use crate::shared::constants::{AVI_CONTENT_TYPES, AVI_EXTENSIONS, MJPEG_CONTENT_TYPES, MJPEG_EXTENSIONS};

/// Where a stream comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceDescriptor {
    Path(PathBuf),
    Url(String),
}

impl SourceDescriptor {
    /// Interprets `http://` and `https://` strings as URLs, anything else as a path.
    pub fn parse(input: &str) -> Self {
        let lower = input.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            SourceDescriptor::Url(input.to_string())
        } else {
            SourceDescriptor::Path(PathBuf::from(input))
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, SourceDescriptor::Url(_))
    }

    /// Container guessed from the path or URL extension, if any.
    pub fn container_from_extension(&self) -> Option<ContainerKind> {
        let ext = match self {
            SourceDescriptor::Path(path) => extension_of(path)?,
            SourceDescriptor::Url(url) => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                let last = path.rsplit('/').next()?;
                extension_of(Path::new(last))?
            }
        };
        ContainerKind::from_extension(&ext)
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceDescriptor::Path(path) => write!(f, "{}", path.display()),
            SourceDescriptor::Url(url) => write!(f, "{url}"),
        }
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Container layout of the byte stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerKind {
    RawMjpeg,
    Avi,
}

impl ContainerKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        if AVI_EXTENSIONS.contains(&ext.as_str()) {
            Some(ContainerKind::Avi)
        } else if MJPEG_EXTENSIONS.contains(&ext.as_str()) {
            Some(ContainerKind::RawMjpeg)
        } else {
            None
        }
    }

    /// Parses the `--format` style names `avi` and `mjpeg`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "avi" => Some(ContainerKind::Avi),
            "mjpeg" | "mjpg" => Some(ContainerKind::RawMjpeg),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::RawMjpeg => write!(f, "mjpeg"),
            ContainerKind::Avi => write!(f, "avi"),
        }
    }
}

/// Result of inspecting an HTTP `Content-Type` header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentFormat {
    Mjpeg,
    Avi,
    Unsupported(String),
    Unknown,
}

impl ContentFormat {
    pub fn from_content_type(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return ContentFormat::Unknown;
        };
        let mime = value
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if mime.is_empty() {
            ContentFormat::Unknown
        } else if MJPEG_CONTENT_TYPES.contains(&mime.as_str()) {
            ContentFormat::Mjpeg
        } else if AVI_CONTENT_TYPES.contains(&mime.as_str()) {
            ContentFormat::Avi
        } else {
            ContentFormat::Unsupported(mime)
        }
    }
}

/// Sniffs a container from the first bytes of a local file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sniffed {
    Container(ContainerKind),
    Unsupported(&'static str),
    Unknown,
}

pub fn sniff_container(head: &[u8]) -> Sniffed {
    if head.len() >= 12 && &head[0..4] == b"RIFF" && &head[8..12] == b"AVI " {
        Sniffed::Container(ContainerKind::Avi)
    } else if head.starts_with(&[0xFF, 0xD8]) {
        Sniffed::Container(ContainerKind::RawMjpeg)
    } else if head.len() >= 8 && &head[4..8] == b"ftyp" {
        Sniffed::Unsupported("mp4")
    } else {
        Sniffed::Unknown
    }
}
