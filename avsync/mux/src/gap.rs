/*!
    Gap detection and silence synthesis.

    Consecutive audio segments rarely abut exactly: the recorder may have
    been muted between them, or the very first segment may start after the
    recording itself. [`GapFiller`] watches the raw segment sequence for
    boundary sentinels and fills every positive gap with zero-amplitude
    frames encoded through the same output encoder as real audio, so the
    exported audio timeline stays continuous.
*/

use std::collections::VecDeque;

use tracing::warn;

use avsync_types::{AudioEncode, AudioFrame, Packet};

use crate::segment::{AudioSegment, SegmentEvent, SegmentStream};

/**
    Wraps a [`SegmentStream`], inserting silence packets at segment
    boundaries.

    Keeps a one-element history: the wall-clock end of the last real
    packet (`timestamp + duration`). The recording start acts as a
    synthetic boundary, so audio that begins after the session start gets
    a leading silence span. Silence is only ever generated at boundaries;
    consecutive real packets are passed through untouched.
*/
pub(crate) struct GapFiller {
    stream: SegmentStream,
    fill_gaps: bool,
    /// Wall-clock end of the previous real packet; starts at the session
    /// start time.
    prev_end: f64,
    /// Set while the previous event was a boundary (or the stream start).
    gap_armed: bool,
    queue: VecDeque<(Packet, f64)>,
}

impl GapFiller {
    pub(crate) fn new(segments: Vec<AudioSegment>, start_time: f64, fill_gaps: bool) -> Self {
        Self {
            stream: SegmentStream::new(segments),
            fill_gaps,
            prev_end: start_time,
            gap_armed: fill_gaps,
            queue: VecDeque::new(),
        }
    }

    /**
        Next (packet, wall-clock timestamp) pair, silence included.
    */
    pub(crate) fn next(&mut self, encoder: &mut dyn AudioEncode) -> Option<(Packet, f64)> {
        loop {
            if let Some(item) = self.queue.pop_front() {
                return Some(item);
            }
            match self.stream.next_event(encoder)? {
                SegmentEvent::Boundary => {
                    if self.fill_gaps {
                        self.gap_armed = true;
                    }
                }
                SegmentEvent::Packet { packet, wall_clock } => {
                    if std::mem::take(&mut self.gap_armed) {
                        let span = wall_clock - self.prev_end;
                        if span > 0.0 {
                            self.synthesize(encoder, self.prev_end, span);
                        }
                    }
                    self.prev_end = wall_clock + packet.duration_seconds();
                    self.queue.push_back((packet, wall_clock));
                }
            }
        }
    }

    /**
        Encode `duration` seconds of silence starting at `start`, chunked
        at the codec's native frame size (the last chunk may be shorter).
    */
    fn synthesize(&mut self, encoder: &mut dyn AudioEncode, start: f64, duration: f64) {
        let spec = encoder.spec();
        // rounded, not truncated: the span itself comes out of float
        // subtraction and sits arbitrarily close to a whole sample count
        let total_samples = (spec.sample_rate as f64 * duration).round() as usize;
        let frame_size = spec.frame_size.max(1);

        let mut produced = 0usize;
        let mut timestamp = start;
        while produced < total_samples {
            let samples = frame_size.min(total_samples - produced);
            let frame = AudioFrame::silence(samples, &spec);
            match encoder.encode(&frame) {
                Ok(packets) => {
                    for packet in packets {
                        self.queue.push_back((packet, timestamp));
                    }
                }
                Err(e) => warn!("failed to encode silence frame: {e}"),
            }
            timestamp += samples as f64 / spec.sample_rate as f64;
            produced += samples;
        }
    }
}
