/*!
    Audio segment sequencing.

    A recording's audio arrives as discrete, time-ordered segments, each
    with one wall-clock timestamp per decoded frame. [`SegmentStream`]
    walks the segments in order, re-encodes every decoded frame against
    the single exported audio stream, and emits a boundary sentinel
    between segments so the gap filler can detect discontinuities.
*/

use std::collections::VecDeque;

use tracing::warn;

use avsync_types::{AudioEncode, AudioFrameSource, Packet};

/**
    One pre-recorded audio segment.

    `timestamps` holds the wall-clock capture time of each decoded frame,
    aligned 1:1 with the frames the source yields. The shorter of the two
    sequences ends the segment.
*/
pub struct AudioSegment {
    source: Box<dyn AudioFrameSource>,
    timestamps: Vec<f64>,
}

impl AudioSegment {
    /**
        Create a segment from a decodable source and its frame timestamps.
    */
    pub fn new(source: Box<dyn AudioFrameSource>, timestamps: Vec<f64>) -> Self {
        Self { source, timestamps }
    }
}

/**
    One item of the raw, pre-gap-filling packet sequence.
*/
pub(crate) enum SegmentEvent {
    /// A re-encoded packet paired with the wall-clock time of the frame
    /// that produced it.
    Packet { packet: Packet, wall_clock: f64 },
    /// Sentinel separating two consecutive segments.
    Boundary,
}

struct ActiveSegment {
    source: Box<dyn AudioFrameSource>,
    timestamps: std::vec::IntoIter<f64>,
}

/**
    Explicit cursor over the segment list.

    Decoding, re-encoding and boundary emission all happen lazily from
    `next_event`; nothing is pulled from a source until asked for.
*/
pub(crate) struct SegmentStream {
    segments: VecDeque<AudioSegment>,
    current: Option<ActiveSegment>,
    queue: VecDeque<SegmentEvent>,
    segment_index: usize,
}

impl SegmentStream {
    pub(crate) fn new(segments: Vec<AudioSegment>) -> Self {
        Self {
            segments: segments.into(),
            current: None,
            queue: VecDeque::new(),
            segment_index: 0,
        }
    }

    /**
        Produce the next event, or `None` once every segment is exhausted.

        A segment whose source fails to decode is skipped with a warning;
        it still emits its boundary so downstream gap detection stays
        consistent.
    */
    pub(crate) fn next_event(&mut self, encoder: &mut dyn AudioEncode) -> Option<SegmentEvent> {
        loop {
            if let Some(event) = self.queue.pop_front() {
                return Some(event);
            }
            match self.current.as_mut() {
                None => {
                    let segment = self.segments.pop_front()?;
                    self.current = Some(ActiveSegment {
                        source: segment.source,
                        timestamps: segment.timestamps.into_iter(),
                    });
                }
                Some(active) => match active.source.next_frame() {
                    Ok(Some(frame)) => {
                        let Some(wall_clock) = active.timestamps.next() else {
                            // ran out of timestamps: the segment is over
                            self.finish_segment();
                            continue;
                        };
                        match encoder.encode(&frame) {
                            Ok(packets) => {
                                for packet in packets {
                                    self.queue
                                        .push_back(SegmentEvent::Packet { packet, wall_clock });
                                }
                            }
                            Err(e) => {
                                warn!("failed to re-encode audio frame: {e}");
                            }
                        }
                    }
                    Ok(None) => self.finish_segment(),
                    Err(e) => {
                        warn!(
                            "skipping undecodable audio segment {}: {e}",
                            self.segment_index
                        );
                        self.finish_segment();
                    }
                },
            }
        }
    }

    fn finish_segment(&mut self) {
        self.current = None;
        self.segment_index += 1;
        self.queue.push_back(SegmentEvent::Boundary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeAudioEncode, FailingSource, VecSource, frames};

    fn collect(stream: &mut SegmentStream, encoder: &mut FakeAudioEncode) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(event) = stream.next_event(encoder) {
            match event {
                SegmentEvent::Packet { wall_clock, .. } => out.push(format!("p@{wall_clock}")),
                SegmentEvent::Boundary => out.push("boundary".into()),
            }
        }
        out
    }

    #[test]
    fn empty_segment_list_is_empty_sequence() {
        let mut stream = SegmentStream::new(Vec::new());
        let mut encoder = FakeAudioEncode::default();
        assert!(stream.next_event(&mut encoder).is_none());
    }

    #[test]
    fn each_segment_ends_with_a_boundary() {
        let segments = vec![
            AudioSegment::new(Box::new(VecSource::new(frames(2, 4))), vec![0.0, 0.4]),
            AudioSegment::new(Box::new(VecSource::new(frames(1, 4))), vec![1.0]),
        ];
        let mut stream = SegmentStream::new(segments);
        let mut encoder = FakeAudioEncode::default();
        assert_eq!(
            collect(&mut stream, &mut encoder),
            vec!["p@0", "p@0.4", "boundary", "p@1", "boundary"]
        );
    }

    #[test]
    fn shorter_timestamp_list_ends_the_segment() {
        let segments = vec![AudioSegment::new(
            Box::new(VecSource::new(frames(3, 4))),
            vec![0.0, 0.4],
        )];
        let mut stream = SegmentStream::new(segments);
        let mut encoder = FakeAudioEncode::default();
        assert_eq!(
            collect(&mut stream, &mut encoder),
            vec!["p@0", "p@0.4", "boundary"]
        );
    }

    #[test]
    fn undecodable_segment_is_skipped_not_fatal() {
        let segments = vec![
            AudioSegment::new(Box::new(FailingSource), vec![0.0, 0.4]),
            AudioSegment::new(Box::new(VecSource::new(frames(1, 4))), vec![1.0]),
        ];
        let mut stream = SegmentStream::new(segments);
        let mut encoder = FakeAudioEncode::default();
        assert_eq!(
            collect(&mut stream, &mut encoder),
            vec!["boundary", "p@1", "boundary"]
        );
    }
}
