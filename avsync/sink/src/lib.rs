/*!
    Container output and muxing for the avsync crate ecosystem.

    This crate owns the output side of the recording pipeline: it opens
    the container, declares its streams, and writes encoded packets with
    interleaving. The container header is written lazily on the first
    packet — by then every stream's codec parameters have been bound, and
    the muxer has fixed the authoritative stream time bases.

    # Usage

    ```ignore
    use avsync_sink::{SharedSink, Sink};

    let mut sink = Sink::create("world.mp4", CodecId::Mpeg4, SESSION_TIME_BASE)?;
    sink.add_audio_stream(CodecId::Aac, audio_encoder.parameters(), audio_time_base)?;

    // one handle feeds packets, the other binds video parameters after
    // the first frame opens the encoder
    let shared = SharedSink::new(sink);
    ```

    # Finalization

    Always call `finish()` (the `PacketSink` impl does) so the trailer is
    written; without it the file may not be seekable or even playable.
*/

pub use avsync_types::{CodecId, Error, Packet, PacketSink, Rational, Result, StreamType};

mod sink;

pub use sink::{SharedSink, Sink};
