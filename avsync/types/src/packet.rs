/*!
    Encoded packet type.
*/

use crate::{MediaDuration, Pts, Rational};

/**
    Type of media stream a packet belongs to.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamType {
    /// Video stream
    Video,
    /// Audio stream
    Audio,
}

/**
    An encoded media packet.

    The unit of data between encoder and container writer. A packet is
    consumed exactly once by the writer; it is never re-muxed.
*/
#[derive(Clone, Debug)]
pub struct Packet {
    /// Compressed data.
    pub data: Vec<u8>,
    /// Presentation timestamp (when to display/play).
    pub pts: Option<Pts>,
    /// Decode timestamp (when to decode).
    pub dts: Option<Pts>,
    /// Duration of this packet's content.
    pub duration: MediaDuration,
    /// Time base for interpreting timestamps.
    pub time_base: Rational,
    /// Whether this packet can be decoded independently.
    pub is_keyframe: bool,
    /// Stream this packet belongs to.
    pub stream_type: StreamType,
}

impl Packet {
    /**
        Create a new packet.
    */
    pub fn new(
        data: Vec<u8>,
        pts: Option<Pts>,
        dts: Option<Pts>,
        duration: MediaDuration,
        time_base: Rational,
        is_keyframe: bool,
        stream_type: StreamType,
    ) -> Self {
        Self {
            data,
            pts,
            dts,
            duration,
            time_base,
            is_keyframe,
            stream_type,
        }
    }

    /**
        Returns the presentation offset in seconds, if PTS is set.
    */
    pub fn presentation_seconds(&self) -> Option<f64> {
        self.pts.map(|pts| pts.to_seconds(self.time_base))
    }

    /**
        Returns the packet duration in seconds.
    */
    pub fn duration_seconds(&self) -> f64 {
        self.duration.to_seconds(self.time_base)
    }

    /**
        Returns true if this packet carries video data.
    */
    pub fn is_video(&self) -> bool {
        self.stream_type == StreamType::Video
    }

    /**
        Returns true if this packet carries audio data.
    */
    pub fn is_audio(&self) -> bool {
        self.stream_type == StreamType::Audio
    }
}

static_assertions::assert_impl_all!(Packet: Send, Sync);
