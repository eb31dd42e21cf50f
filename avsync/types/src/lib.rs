/*!
    Shared types for the avsync crate ecosystem.

    This crate defines the vocabulary of the ecosystem — the types that cross
    crate boundaries. It has no dependency on FFmpeg, so the synchronization
    engine and its tests can depend on it without pulling in codec bindings.

    # Core Types

    - [`Rational`] - Rational numbers for time bases
    - [`Pts`] and [`MediaDuration`] - Timestamps in time_base units
    - [`MonotonicPts`] - Per-stream strictly-increasing timestamp sequencer
    - [`VideoFrame`] and [`AudioFrame`] - Raw frame data
    - [`Packet`] - Encoded packet data

    # Format Types

    - [`PixelFormat`] and [`PixelData`] - Video pixel layouts
    - [`SampleFormat`] - Audio sample formats
    - [`ChannelLayout`] - Audio channel layouts
    - [`CodecId`] - Codec identifiers

    # Stream Information

    - [`AudioTemplate`] - Source audio description mirrored by the output
    - [`AudioStreamSpec`] - Opened output encoder parameters

    # Pipeline Seams

    - [`VideoEncode`], [`AudioEncode`] - Encoder capability traits
    - [`PacketSink`] - Container writer boundary
    - [`AudioFrameSource`] - Decoded segment audio

    # Error Handling

    - [`Error`] and [`Result`] - Common error types
*/

mod codec;
mod error;
mod format;
mod frame;
mod packet;
mod pipeline;
mod rational;
mod stream;
mod timestamp;

pub use codec::CodecId;
pub use error::{Error, Result};
pub use format::{ChannelLayout, PixelFormat, SampleFormat};
pub use frame::{AudioFrame, PixelData, VideoFrame};
pub use packet::{Packet, StreamType};
pub use pipeline::{AudioEncode, AudioFrameSource, PacketSink, VideoEncode};
pub use rational::Rational;
pub use stream::{AudioStreamSpec, AudioTemplate};
pub use timestamp::{MediaDuration, MonotonicPts, Pts};
