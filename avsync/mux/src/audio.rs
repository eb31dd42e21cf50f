/*!
    The exported audio packet stream.

    Final stage of the audio path: takes gap-filled (packet, wall-clock)
    pairs, rebases them against the recording start, discards anything that
    predates it, and stamps strictly monotonic presentation timestamps in
    the output stream's time base.
*/

use tracing::debug;

use avsync_types::{AudioEncode, MonotonicPts, Packet, Rational};

use crate::gap::GapFiller;
use crate::segment::AudioSegment;

/**
    Pull-based source of finalized audio packets.

    This is the resumable half of the interleaving protocol: the writer
    drains packets up to the current video frame's presentation time, then
    simply stops calling [`next_packet`](Self::next_packet) until the next
    frame arrives. No task or thread is parked; the cursor just rests.
*/
pub struct AudioPacketStream {
    encoder: Box<dyn AudioEncode>,
    filler: GapFiller,
    sequencer: MonotonicPts,
    start_time: f64,
    time_base: Rational,
}

impl AudioPacketStream {
    /**
        Build the audio path for one recording session.

        `start_time` is the session epoch shared with the video stream;
        `fill_gaps` controls whether silence is synthesized at segment
        boundaries.
    */
    pub fn new(
        segments: Vec<AudioSegment>,
        encoder: Box<dyn AudioEncode>,
        start_time: f64,
        fill_gaps: bool,
    ) -> Self {
        let time_base = encoder.spec().time_base();
        Self {
            filler: GapFiller::new(segments, start_time, fill_gaps),
            encoder,
            sequencer: MonotonicPts::new(),
            start_time,
            time_base,
        }
    }

    /**
        The output audio stream's time base.
    */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /**
        Next packet ready for muxing, or `None` when all audio is spent.

        Packets whose wall-clock time predates the recording start are
        dropped here — the session effectively seeks into the audio.
    */
    pub fn next_packet(&mut self) -> Option<Packet> {
        loop {
            let (mut packet, wall_clock) = self.filler.next(&mut *self.encoder)?;
            let relative = wall_clock - self.start_time;
            if relative < 0.0 {
                debug!("seeking audio: {relative:.4}s before recording start");
                continue;
            }
            let pts = self.sequencer.next(self.time_base.ticks(relative));
            packet.pts = Some(pts);
            packet.dts = Some(pts);
            packet.time_base = self.time_base;
            return Some(packet);
        }
    }
}
