/*!
    A/V synchronization engine for the avsync crate ecosystem.

    This crate is the core of the recording pipeline: it reconciles three
    independent, imprecise clocks (the frame capture clock, the audio
    segment clocks, and the container time base) into one gap-free,
    strictly ordered packet stream. It never touches FFmpeg; encoders and
    the container writer are driven through the seam traits defined in
    `avsync-types`, which is what makes the whole engine testable with
    deterministic fakes.

    # Components

    - [`InterleavingWriter`] - the session orchestrator: stamps monotonic
      video PTS values, muxes video packets, and drains audio up to each
      frame's presentation time
    - [`AudioPacketStream`] - pull-based audio path: segment sequencing,
      gap filling, PTS assignment
    - [`AudioSegment`] - one pre-recorded audio part with per-frame
      wall-clock timestamps
    - [`TimestampLedger`] / [`TimestampFormat`] - the frame-to-time
      mapping persisted next to the finished video

    # Interleaving protocol

    For every accepted video frame the writer muxes the frame's packet,
    then pulls audio packets (silence included) up to and including the
    first one whose presentation time passes the frame's. The audio
    cursor then simply rests until the next frame arrives; there is no
    thread or task behind it.

    ```no_run
    use avsync_mux::{AudioPacketStream, AudioSegment, InterleavingWriter};
    # fn demo(video: Box<dyn avsync_types::VideoEncode>,
    #         audio_encoder: Box<dyn avsync_types::AudioEncode>,
    #         sink: Box<dyn avsync_types::PacketSink>,
    #         segments: Vec<AudioSegment>,
    #         frame: avsync_types::VideoFrame) -> avsync_types::Result<()> {
    let start_time = 1024.25; // shared recording epoch, seconds
    let audio = AudioPacketStream::new(segments, audio_encoder, start_time, true);
    let mut writer = InterleavingWriter::new("world.mp4", start_time, video, Some(audio), sink);
    writer.write_video_frame(&frame)?;
    writer.close_with_format("csv")?;
    # Ok(())
    # }
    ```
*/

mod audio;
mod gap;
mod ledger;
mod segment;
mod writer;

#[cfg(test)]
pub(crate) mod testutil;

pub use audio::AudioPacketStream;
pub use ledger::{LedgerEntry, TimestampFormat, TimestampLedger};
pub use segment::AudioSegment;
pub use writer::{InterleavingWriter, SESSION_TIME_BASE, WriteOutcome};
