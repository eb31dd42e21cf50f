/*!
    Seam traits between the synchronization engine and the encoding backend.

    The engine never talks to FFmpeg directly; it drives these capability
    interfaces. The `avsync-encode`/`avsync-sink` crates provide the real
    implementations, and tests substitute deterministic fakes.
*/

use crate::{AudioFrame, AudioStreamSpec, Packet, Pts, Result, VideoFrame};

/**
    Video frame encoding capability.

    One implementation exists per codec variant (full-frame re-encoding,
    pre-compressed passthrough); the variant is selected at construction
    time and never changes for the life of a session.
*/
pub trait VideoEncode {
    /**
        One-time setup driven by the first frame of the session — binds
        width, height and pixel format to the underlying stream.
    */
    fn configure(&mut self, first_frame: &VideoFrame) -> Result<()>;

    /**
        Encode one frame with the given presentation timestamp.

        Returns zero or more packets. Zero packets means the encoder kept
        the frame buffered (or dropped it); the caller decides what that
        implies for the session.
    */
    fn encode(&mut self, frame: &VideoFrame, pts: Pts) -> Result<Vec<Packet>>;

    /**
        Signal end-of-stream and drain whatever the encoder still holds.
    */
    fn finish(&mut self) -> Result<Vec<Packet>>;
}

/**
    Audio frame encoding capability for the single exported audio stream.

    Both segment re-encoding and silence synthesis go through the same
    instance so that all audio packets share one codec context.
*/
pub trait AudioEncode {
    /**
        Operating parameters of the opened encoder.
    */
    fn spec(&self) -> AudioStreamSpec;

    /**
        Encode one decoded frame, returning zero or more packets.
    */
    fn encode(&mut self, frame: &AudioFrame) -> Result<Vec<Packet>>;
}

/**
    Container writer boundary.

    Packets are consumed exactly once, in the order submitted; `finish`
    finalizes the container (trailer, index) and must be called for the
    output to be playable.
*/
pub trait PacketSink {
    /**
        Hand one packet to the container.
    */
    fn submit(&mut self, packet: Packet) -> Result<()>;

    /**
        Finalize the container.
    */
    fn finish(&mut self) -> Result<()>;
}

/**
    A source of decoded audio frames, in decode order.

    Returns `Ok(None)` at end of stream. Errors are not retried; the
    segment that produced them is skipped.
*/
pub trait AudioFrameSource {
    fn next_frame(&mut self) -> Result<Option<AudioFrame>>;
}
