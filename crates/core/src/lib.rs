//! Motion-JPEG video pump.
//!
//! Reads MJPEG frames from raw concatenated JPEG files, RIFF/AVI containers
//! or HTTP endpoints, decodes them to RGB565 and hands them to a sink at a
//! fixed pace on a dedicated thread.

pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod pixel_format;
    pub mod pump_config;
    pub mod sleeper;
    pub mod stream_metadata;
}

pub mod source {
    pub mod domain {
        pub mod byte_source;
        pub mod source_descriptor;
        pub mod source_error;
    }
    pub mod infrastructure {
        pub mod backoff;
        pub mod file_source;
        pub mod http_source;
    }
}

pub mod demux {
    pub mod domain {
        pub mod demux_error;
        pub mod frame_reader;
        pub mod scratch_buffer;
    }
    pub mod infrastructure {
        #[cfg(test)]
        pub(crate) mod avi_fixtures;
        pub mod avi_index;
        pub mod avi_reader;
        pub mod marker_scan;
        pub mod mjpeg_reader;
        pub mod reader_factory;
        pub mod riff;
    }
}

pub mod decode {
    pub mod domain {
        pub mod jpeg_decoder;
    }
    pub mod infrastructure {
        pub mod image_jpeg_decoder;
    }
}

pub mod pipeline {
    pub mod frame_scheduler;
    pub mod frame_sink;
    pub mod latest_frame_sink;
    pub mod pipeline_logger;
    pub mod playback_session;
    pub mod player;
    pub mod session_stats;
    pub mod stop_signal;
}
