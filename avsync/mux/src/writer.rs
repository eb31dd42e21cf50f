/*!
    The interleaving writer.

    Drives one recording session: every incoming video frame is stamped
    with a strictly monotonic PTS and encoded, then the audio stream is
    drained up to that frame's presentation time. The container only ever
    sees timestamps that increase within each stream.
*/

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use avsync_types::{
    Error, MonotonicPts, PacketSink, Pts, Rational, Result, VideoEncode, VideoFrame,
};

use crate::audio::AudioPacketStream;
use crate::ledger::{TimestampFormat, TimestampLedger};

/// Session video time base. High resolution so that derived PTS values
/// almost never collide; the muxer may still lower it when writing the
/// container header.
pub const SESSION_TIME_BASE: Rational = Rational::new(1, 65535);

/**
    What happened to a frame handed to [`InterleavingWriter::write_video_frame`].

    Recoverable conditions are reported here instead of being buried in
    log output; only a source timestamp regression is an `Err`.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The frame was encoded and muxed; the ledger grew by one entry.
    Written,
    /// The frame predates the session start and was dropped.
    SkippedPreStart,
    /// The encoder yielded no video packet for this frame; it was dropped.
    SkippedEmptyEncode,
    /// The session is already closed; the frame was ignored.
    IgnoredClosed,
}

/**
    Owns one recording session: container sink, video encoder, optional
    audio stream, and the frame timestamp ledger.

    The session epoch is `start_time`; all presentation timestamps are
    offsets from it. Exactly one writer owns a container — the sink is
    consumed at construction and never shared.
*/
pub struct InterleavingWriter {
    sink: Box<dyn PacketSink>,
    video: Box<dyn VideoEncode>,
    audio: Option<AudioPacketStream>,
    start_time: f64,
    time_base: Rational,
    sequencer: MonotonicPts,
    ledger: TimestampLedger,
    output_path: PathBuf,
    configured: bool,
    closed: bool,
}

impl InterleavingWriter {
    /**
        Create a writer for one output file.

        `output_path` is only used to derive the timestamp ledger's export
        location; the sink has already been opened on it.
    */
    pub fn new(
        output_path: impl Into<PathBuf>,
        start_time: f64,
        video: Box<dyn VideoEncode>,
        audio: Option<AudioPacketStream>,
        sink: Box<dyn PacketSink>,
    ) -> Self {
        Self {
            sink,
            video,
            audio,
            start_time,
            time_base: SESSION_TIME_BASE,
            sequencer: MonotonicPts::new(),
            ledger: TimestampLedger::new(),
            output_path: output_path.into(),
            configured: false,
            closed: false,
        }
    }

    /**
        Encode and mux one video frame, then drain audio up to it.

        The first call binds the encoder to the frame's dimensions and
        pixel format. Frames captured before the session start are
        dropped. A frame whose timestamp regresses below the previously
        accepted one is a hard error: the session is closed (flushed, with
        the default ledger export) before the error is returned, so the
        container stays valid up to the last good frame.
    */
    pub fn write_video_frame(&mut self, frame: &VideoFrame) -> Result<WriteOutcome> {
        if self.closed {
            warn!("container was closed already");
            return Ok(WriteOutcome::IgnoredClosed);
        }

        if !self.configured {
            self.video.configure(frame)?;
            self.configured = true;
        }

        let timestamp = frame.timestamp;

        if timestamp < self.start_time {
            // A frame can already be in flight when the recording starts;
            // the processes are not yet synced at that point.
            debug!("skipping frame that arrived before sync time");
            return Ok(WriteOutcome::SkippedPreStart);
        }

        if let Some(last) = self.ledger.last_timestamp() {
            if timestamp < last {
                let _ = self.close(Some(TimestampFormat::default()));
                return Err(Error::NonMonotonicTimestamp {
                    last,
                    given: timestamp,
                });
            }
        }

        let pts = Pts(
            self.sequencer
                .sequence(self.time_base.ticks(timestamp - self.start_time)),
        );

        let packets = self.video.encode(frame, pts)?;
        let mut video_packets = 0usize;
        for packet in packets {
            if packet.is_video() {
                video_packets += 1;
                if video_packets > 1 {
                    // the frame/packet PTS equivalence in the ledger relies
                    // on one packet per frame
                    warn!("single frame yielded more than one packet");
                }
            }
            self.sink.submit(packet)?;
        }

        let outcome = if video_packets == 0 {
            warn!("encoding frame {} failed", frame.index);
            WriteOutcome::SkippedEmptyEncode
        } else {
            self.sequencer.commit(pts.0);
            self.ledger.push(timestamp, pts);
            WriteOutcome::Written
        };

        self.drain_audio(pts)?;
        Ok(outcome)
    }

    /**
        Mux audio packets up to and including the first one past the
        current frame's presentation time, then pause until the next frame.
    */
    fn drain_audio(&mut self, video_pts: Pts) -> Result<()> {
        let frame_secs = video_pts.to_seconds(self.time_base);
        let Self { sink, audio, .. } = self;
        let Some(audio) = audio.as_mut() else {
            return Ok(());
        };
        while let Some(packet) = audio.next_packet() {
            let packet_secs = packet.presentation_seconds().unwrap_or(f64::MIN);
            sink.submit(packet)?;
            if packet_secs > frame_secs {
                break;
            }
        }
        Ok(())
    }

    /**
        Finalize the session: flush the video encoder, close the container,
        export the ledger.

        Idempotent — a second call warns and does nothing. The export only
        happens if at least one frame configured the session and a format
        was requested.
    */
    pub fn close(&mut self, export: Option<TimestampFormat>) -> Result<()> {
        if self.closed {
            warn!("trying to close container multiple times");
            return Ok(());
        }

        if self.configured {
            // at least one frame has been written, flush the stream
            for packet in self.video.finish()? {
                self.sink.submit(packet)?;
            }
        }

        self.sink.finish()?;
        self.closed = true;

        if self.configured {
            if let Some(format) = export {
                self.ledger.export(&self.output_path, format)?;
            }
        }
        Ok(())
    }

    /**
        Parse an export format string, then close.

        Parsing happens first, so an unknown format string fails without
        touching the output file.
    */
    pub fn close_with_format(&mut self, format: &str) -> Result<()> {
        let format: TimestampFormat = format.parse()?;
        self.close(Some(format))
    }

    /**
        Whether the session has been closed.
    */
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /**
        The frame ledger accumulated so far.
    */
    pub fn ledger(&self) -> &TimestampLedger {
        &self.ledger
    }

    /**
        The output file this session writes to.
    */
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avsync_types::{PixelData, StreamType};

    use crate::audio::AudioPacketStream;
    use crate::testutil::{FakeAudioEncode, FakeSink, FakeVideoEncode, SinkLog, segment_at};

    use std::rc::Rc;

    fn frame_at(timestamp: f64, index: u64) -> VideoFrame {
        VideoFrame::new(64, 48, PixelData::Bgr24(vec![7; 64 * 48 * 3]), timestamp, index)
    }

    fn writer(
        start_time: f64,
        audio: Option<AudioPacketStream>,
    ) -> (InterleavingWriter, Rc<SinkLog>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let (sink, log) = FakeSink::new();
        let writer = InterleavingWriter::new(
            dir.path().join("out.mp4"),
            start_time,
            Box::new(FakeVideoEncode::new()),
            audio,
            Box::new(sink),
        );
        (writer, log, dir)
    }

    fn audio_for(segments: Vec<crate::segment::AudioSegment>, start: f64) -> AudioPacketStream {
        AudioPacketStream::new(segments, Box::new(FakeAudioEncode::default()), start, true)
    }

    #[test]
    fn pre_start_frames_are_dropped() {
        let (mut writer, _log, _dir) = writer(100.0, None);
        let outcome = writer.write_video_frame(&frame_at(99.0, 0)).unwrap();
        assert_eq!(outcome, WriteOutcome::SkippedPreStart);
        assert!(writer.ledger().is_empty());
    }

    #[test]
    fn session_scenario_two_frames_one_dropped() {
        // start 100.0, frames at 99.0 / 100.5 / 101.0, no audio
        let (mut writer, log, _dir) = writer(100.0, None);
        writer.write_video_frame(&frame_at(99.0, 0)).unwrap();
        writer.write_video_frame(&frame_at(100.5, 1)).unwrap();
        writer.write_video_frame(&frame_at(101.0, 2)).unwrap();

        assert_eq!(writer.ledger().len(), 2);
        let pts: Vec<i64> = writer.ledger().entries().iter().map(|e| e.pts).collect();
        assert!(pts[1] >= pts[0] + 1);
        assert_eq!(log.packets().len(), 2);
    }

    #[test]
    fn identical_timestamps_are_accepted_with_bumped_pts() {
        let (mut writer, _log, _dir) = writer(0.0, None);
        writer.write_video_frame(&frame_at(1.0, 0)).unwrap();
        writer.write_video_frame(&frame_at(1.0, 1)).unwrap();
        let pts: Vec<i64> = writer.ledger().entries().iter().map(|e| e.pts).collect();
        assert_eq!(pts[1], pts[0] + 1);
    }

    #[test]
    fn regressing_timestamp_closes_and_errors() {
        let (mut writer, log, _dir) = writer(0.0, None);
        writer.write_video_frame(&frame_at(1.0, 0)).unwrap();
        let err = writer.write_video_frame(&frame_at(0.5, 1)).unwrap_err();
        assert!(err.is_non_monotonic());
        assert!(writer.is_closed());
        // prior frame flushed, container finalized
        assert_eq!(log.finished(), 1);
        assert_eq!(log.packets().len(), 1);
    }

    #[test]
    fn writes_after_close_are_ignored_not_fatal() {
        let (mut writer, log, _dir) = writer(0.0, None);
        writer.write_video_frame(&frame_at(1.0, 0)).unwrap();
        writer.close(None).unwrap();
        let outcome = writer.write_video_frame(&frame_at(2.0, 1)).unwrap();
        assert_eq!(outcome, WriteOutcome::IgnoredClosed);
        assert_eq!(log.packets().len(), 1);
    }

    #[test]
    fn close_is_idempotent() {
        let (mut writer, log, _dir) = writer(0.0, None);
        writer.write_video_frame(&frame_at(1.0, 0)).unwrap();
        writer.close(None).unwrap();
        writer.close(None).unwrap();
        assert_eq!(log.finished(), 1);
    }

    #[test]
    fn close_without_frames_skips_encoder_flush() {
        let (mut writer, log, _dir) = writer(0.0, None);
        writer.close(None).unwrap();
        assert_eq!(log.finished(), 1);
        assert!(log.packets().is_empty());
    }

    #[test]
    fn empty_encode_drops_frame_without_advancing_pts() {
        let (sink, log) = FakeSink::new();
        let mut encoder = FakeVideoEncode::new();
        encoder.fail_on(1);
        let mut writer = InterleavingWriter::new(
            "/tmp/out.mp4",
            0.0,
            Box::new(encoder),
            None,
            Box::new(sink),
        );

        writer.write_video_frame(&frame_at(1.0, 0)).unwrap();
        let outcome = writer.write_video_frame(&frame_at(2.0, 1)).unwrap();
        assert_eq!(outcome, WriteOutcome::SkippedEmptyEncode);
        writer.write_video_frame(&frame_at(3.0, 2)).unwrap();

        // the failed frame left no ledger entry and no packet
        assert_eq!(writer.ledger().len(), 2);
        assert_eq!(log.packets().len(), 2);
        let pts: Vec<i64> = writer.ledger().entries().iter().map(|e| e.pts).collect();
        assert_eq!(pts, vec![SESSION_TIME_BASE.ticks(1.0), SESSION_TIME_BASE.ticks(3.0)]);
    }

    #[test]
    fn audio_drains_up_to_current_frame() {
        // segment A spans [0, 2), segment B spans [5, 7) relative to start;
        // FakeAudioEncode runs at 10 Hz with 4-sample frames
        let segments = vec![segment_at(100.0, 5, 4), segment_at(105.0, 5, 4)];
        let audio = audio_for(segments, 100.0);
        let (mut writer, log, _dir) = writer(100.0, Some(audio));

        writer.write_video_frame(&frame_at(106.0, 0)).unwrap();

        let audio_packets: Vec<_> = log
            .packets()
            .iter()
            .filter(|p| p.stream_type == StreamType::Audio)
            .cloned()
            .collect();

        // all of A (5 packets), 3 s of silence (30 samples in 4-sample
        // chunks -> 8 packets), then B up to the frame at 6 s
        let silence: Vec<_> = audio_packets
            .iter()
            .filter(|p| p.data.iter().all(|&b| b == 0))
            .collect();
        assert_eq!(silence.iter().map(|p| p.duration.0).sum::<i64>(), 30);

        let real: Vec<_> = audio_packets
            .iter()
            .filter(|p| !p.data.iter().all(|&b| b == 0))
            .collect();
        // A contributes 5 packets; B contributes those up to 6 s, plus the
        // first packet past the frame time which pauses the drain
        assert!(real.len() >= 7, "expected A plus B head, got {}", real.len());

        // drain stopped just past the frame: exactly one audio packet
        // beyond 6 s relative
        let past: Vec<_> = audio_packets
            .iter()
            .filter(|p| p.presentation_seconds().unwrap() > 6.0)
            .collect();
        assert_eq!(past.len(), 1);

        // per-stream monotonicity of everything muxed
        let mut last = i64::MIN;
        for p in &audio_packets {
            let pts = p.pts.unwrap().0;
            assert!(pts > last);
            last = pts;
        }
    }

    #[test]
    fn audio_drain_resumes_on_next_frame() {
        let segments = vec![segment_at(0.0, 10, 4)]; // 4 s of audio at 10 Hz
        let audio = audio_for(segments, 0.0);
        let (mut writer, log, _dir) = writer(0.0, Some(audio));

        writer.write_video_frame(&frame_at(1.0, 0)).unwrap();
        let after_first = log
            .packets()
            .iter()
            .filter(|p| p.stream_type == StreamType::Audio)
            .count();
        writer.write_video_frame(&frame_at(3.0, 1)).unwrap();
        let after_second = log
            .packets()
            .iter()
            .filter(|p| p.stream_type == StreamType::Audio)
            .count();

        assert!(after_first >= 3, "first drain too small: {after_first}");
        assert!(after_second > after_first);
        assert!(after_second <= 10);
    }

    #[test]
    fn unknown_export_format_fails_before_closing() {
        let (mut writer, log, _dir) = writer(0.0, None);
        writer.write_video_frame(&frame_at(1.0, 0)).unwrap();
        let err = writer.close_with_format("npy").unwrap_err();
        assert!(matches!(err, Error::UnknownExportFormat { .. }));
        assert!(!writer.is_closed());
        assert_eq!(log.finished(), 0);
        // the session is still usable
        writer.write_video_frame(&frame_at(2.0, 1)).unwrap();
        writer.close(None).unwrap();
    }

    #[test]
    fn close_exports_ledger_in_requested_format() {
        let dir = tempfile::tempdir().unwrap();
        let video_path = dir.path().join("world.mp4");
        let (sink, _log) = FakeSink::new();
        let mut writer = InterleavingWriter::new(
            &video_path,
            0.0,
            Box::new(FakeVideoEncode::new()),
            None,
            Box::new(sink),
        );
        writer.write_video_frame(&frame_at(0.5, 0)).unwrap();
        writer.close(Some(TimestampFormat::All)).unwrap();

        assert!(dir.path().join("world_timestamps.json").exists());
        assert!(dir.path().join("world_timestamps.csv").exists());
    }

    #[test]
    fn close_without_configure_exports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let video_path = dir.path().join("world.mp4");
        let (sink, _log) = FakeSink::new();
        let mut writer = InterleavingWriter::new(
            &video_path,
            0.0,
            Box::new(FakeVideoEncode::new()),
            None,
            Box::new(sink),
        );
        writer.close(Some(TimestampFormat::All)).unwrap();
        assert!(!dir.path().join("world_timestamps.json").exists());
    }

    #[test]
    fn video_pts_strictly_increase_for_nondecreasing_input() {
        let (mut writer, _log, _dir) = writer(0.0, None);
        let inputs = [0.0, 0.01, 0.01, 0.02, 0.02, 0.5, 0.5001];
        for (i, ts) in inputs.iter().enumerate() {
            writer.write_video_frame(&frame_at(*ts, i as u64)).unwrap();
        }
        let pts: Vec<i64> = writer.ledger().entries().iter().map(|e| e.pts).collect();
        for pair in pts.windows(2) {
            assert!(pair[1] > pair[0], "pts not strictly increasing: {pts:?}");
        }
    }
}
