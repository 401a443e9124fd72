use std::time::Duration;

/// JPEG Start-Of-Image marker.
pub const SOI_MARKER: [u8; 2] = [0xFF, 0xD8];
/// JPEG End-Of-Image marker.
pub const EOI_MARKER: [u8; 2] = [0xFF, 0xD9];

/// FourCC carried in `strf.biCompression` for motion-JPEG video streams.
pub const MJPEG_FOURCC: [u8; 4] = *b"MJPG";

pub const DEFAULT_TARGET_FPS: u32 = 10;
pub const DEFAULT_SCRATCH_CAPACITY: usize = 32 * 1024;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_WIDTH: u32 = 128;
pub const DEFAULT_HEIGHT: u32 = 64;

/// Connection attempts per HTTP fetch before the fetch fails.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Consecutive failed reads after which the scheduler stops itself.
pub const READ_ERROR_THRESHOLD: u32 = 5;

/// How long `stop()` waits for the worker before detaching it.
pub const STOP_GRACE: Duration = Duration::from_millis(100);

/// Frames between two progress lines (~3 seconds at 10 fps).
pub const PROGRESS_INTERVAL: u64 = 30;

pub const MJPEG_EXTENSIONS: &[&str] = &["mjpeg", "mjpg", "jpg", "jpeg"];
pub const AVI_EXTENSIONS: &[&str] = &["avi"];

pub const MJPEG_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "multipart/x-mixed-replace",
    "video/x-motion-jpeg",
    "video/mjpeg",
];
pub const AVI_CONTENT_TYPES: &[&str] = &["video/avi", "video/x-msvideo", "video/msvideo"];
