/*!
    Output profiles.
*/

use avsync_encode::{FullFrameConfig, VideoEncoder};
use avsync_mux::SESSION_TIME_BASE;
use avsync_types::CodecId;

/**
    How video frames become packets in the output container.

    A closed set, chosen per recording. `Mpeg4` re-encodes raw pixel
    frames and carries the encoder tuning; `Mjpeg` muxes pre-compressed
    JPEG frames untouched.
*/
#[derive(Clone, Copy, Debug)]
pub enum VideoProfile {
    /// MPEG-4 full-frame encoding of raw pixel frames.
    Mpeg4(FullFrameConfig),
    /// MJPEG passthrough of pre-compressed frames.
    Mjpeg,
}

impl VideoProfile {
    /**
        MPEG-4 with default encoder tuning.
    */
    pub fn mpeg4() -> Self {
        Self::Mpeg4(FullFrameConfig::default())
    }

    /**
        The video codec this profile writes.
    */
    pub fn codec(&self) -> CodecId {
        match self {
            Self::Mpeg4(_) => CodecId::Mpeg4,
            Self::Mjpeg => CodecId::Mjpeg,
        }
    }

    /**
        File extensions this profile is known to produce sane output for.
    */
    pub fn supported_extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Mpeg4(_) => &["mp4", "mov", "mkv"],
            Self::Mjpeg => &["mp4"],
        }
    }

    pub(crate) fn build_encoder(&self) -> VideoEncoder {
        match self {
            Self::Mpeg4(config) => VideoEncoder::full_frame(*config, SESSION_TIME_BASE),
            Self::Mjpeg => VideoEncoder::passthrough(SESSION_TIME_BASE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_codecs() {
        assert_eq!(VideoProfile::mpeg4().codec(), CodecId::Mpeg4);
        assert_eq!(VideoProfile::Mjpeg.codec(), CodecId::Mjpeg);
    }

    #[test]
    fn mjpeg_only_supports_mp4() {
        let extensions = VideoProfile::Mjpeg.supported_extensions();
        assert_eq!(extensions.len(), 1);
        assert!(extensions.contains(&"mp4"));
        assert!(VideoProfile::mpeg4().supported_extensions().contains(&"mkv"));
    }

    #[test]
    fn mpeg4_profile_carries_tuning() {
        let profile = VideoProfile::Mpeg4(FullFrameConfig {
            bit_rate: 8_000_000,
            bit_rate_tolerance: 400_000,
            thread_count: 2,
        });
        match profile {
            VideoProfile::Mpeg4(config) => assert_eq!(config.bit_rate, 8_000_000),
            VideoProfile::Mjpeg => unreachable!(),
        }
    }
}
