/*!
    Deterministic fakes for the pipeline seam traits.

    The engine's contract is observable entirely through packets, so the
    fakes are passthrough codecs: one packet per frame, payload equal to
    the frame data (silence stays all-zero and is recognizable as such).
    Audio runs at 10 Hz with 4-sample frames to keep test arithmetic
    readable.
*/

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use avsync_types::{
    AudioEncode, AudioFrame, AudioFrameSource, AudioStreamSpec, ChannelLayout, Error,
    MediaDuration, Packet, PacketSink, Pts, Result, SampleFormat, StreamType, VideoEncode,
    VideoFrame,
};

use crate::segment::AudioSegment;
use crate::writer::SESSION_TIME_BASE;

pub(crate) const TEST_RATE: u32 = 10;
pub(crate) const TEST_FRAME_SIZE: usize = 4;

#[derive(Default)]
struct LogInner {
    packets: Vec<Packet>,
    finished: usize,
}

/// Shared, inspectable record of everything a [`FakeSink`] received.
pub(crate) struct SinkLog {
    inner: RefCell<LogInner>,
}

impl SinkLog {
    pub(crate) fn packets(&self) -> Vec<Packet> {
        self.inner.borrow().packets.clone()
    }

    pub(crate) fn finished(&self) -> usize {
        self.inner.borrow().finished
    }
}

pub(crate) struct FakeSink {
    log: Rc<SinkLog>,
}

impl FakeSink {
    pub(crate) fn new() -> (Self, Rc<SinkLog>) {
        let log = Rc::new(SinkLog {
            inner: RefCell::default(),
        });
        (Self { log: Rc::clone(&log) }, log)
    }
}

impl PacketSink for FakeSink {
    fn submit(&mut self, packet: Packet) -> Result<()> {
        self.log.inner.borrow_mut().packets.push(packet);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.log.inner.borrow_mut().finished += 1;
        Ok(())
    }
}

/// One video packet per frame, or none for registered failure indices.
pub(crate) struct FakeVideoEncode {
    configured: bool,
    fail_indices: HashSet<u64>,
}

impl FakeVideoEncode {
    pub(crate) fn new() -> Self {
        Self {
            configured: false,
            fail_indices: HashSet::new(),
        }
    }

    /// Make the encoder yield zero packets for the frame with this index.
    pub(crate) fn fail_on(&mut self, index: u64) {
        self.fail_indices.insert(index);
    }
}

impl VideoEncode for FakeVideoEncode {
    fn configure(&mut self, _first_frame: &VideoFrame) -> Result<()> {
        self.configured = true;
        Ok(())
    }

    fn encode(&mut self, frame: &VideoFrame, pts: Pts) -> Result<Vec<Packet>> {
        assert!(self.configured, "encode called before configure");
        if self.fail_indices.contains(&frame.index) {
            return Ok(Vec::new());
        }
        Ok(vec![Packet::new(
            vec![0xF0, frame.index as u8],
            Some(pts),
            Some(pts),
            MediaDuration(0),
            SESSION_TIME_BASE,
            true,
            StreamType::Video,
        )])
    }

    fn finish(&mut self) -> Result<Vec<Packet>> {
        Ok(Vec::new())
    }
}

/// Passthrough audio "codec": 10 Hz, mono S16, 4-sample native frames.
pub(crate) struct FakeAudioEncode {
    spec: AudioStreamSpec,
}

impl Default for FakeAudioEncode {
    fn default() -> Self {
        Self {
            spec: AudioStreamSpec {
                sample_rate: TEST_RATE,
                channels: ChannelLayout::Mono,
                format: SampleFormat::S16,
                frame_size: TEST_FRAME_SIZE,
            },
        }
    }
}

impl AudioEncode for FakeAudioEncode {
    fn spec(&self) -> AudioStreamSpec {
        self.spec
    }

    fn encode(&mut self, frame: &AudioFrame) -> Result<Vec<Packet>> {
        Ok(vec![Packet::new(
            frame.data.clone(),
            None,
            None,
            MediaDuration(frame.samples as i64),
            self.spec.time_base(),
            true,
            StreamType::Audio,
        )])
    }
}

pub(crate) struct VecSource {
    frames: VecDeque<AudioFrame>,
}

impl VecSource {
    pub(crate) fn new(frames: Vec<AudioFrame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

impl AudioFrameSource for VecSource {
    fn next_frame(&mut self) -> Result<Option<AudioFrame>> {
        Ok(self.frames.pop_front())
    }
}

/// A source whose very first decode fails.
pub(crate) struct FailingSource;

impl AudioFrameSource for FailingSource {
    fn next_frame(&mut self) -> Result<Option<AudioFrame>> {
        Err(Error::codec("decode failed"))
    }
}

/// `count` mono S16 frames of `samples` samples, filled with a nonzero
/// pattern so tests can tell real audio from synthesized silence.
pub(crate) fn frames(count: usize, samples: usize) -> Vec<AudioFrame> {
    (0..count)
        .map(|i| {
            AudioFrame::new(
                vec![(i + 1) as u8; samples * 2],
                samples,
                TEST_RATE,
                ChannelLayout::Mono,
                SampleFormat::S16,
            )
        })
        .collect()
}

/// A segment of `count` frames starting at wall clock `start`, with
/// timestamps spaced by the frame duration (contiguous audio).
pub(crate) fn segment_at(start: f64, count: usize, samples: usize) -> AudioSegment {
    let duration = samples as f64 / TEST_RATE as f64;
    let timestamps = (0..count).map(|i| start + i as f64 * duration).collect();
    AudioSegment::new(Box::new(VecSource::new(frames(count, samples))), timestamps)
}
