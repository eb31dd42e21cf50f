/*!
    Recording writer assembly.
*/

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use avsync_decode::SegmentReader;
use avsync_encode::{AudioEncoder, VideoEncoder};
use avsync_mux::{
    AudioPacketStream, AudioSegment, InterleavingWriter, SESSION_TIME_BASE, TimestampLedger,
    WriteOutcome,
};
use avsync_sink::{SharedSink, Sink};
use avsync_types::{Result, VideoEncode, VideoFrame};

use crate::profile::VideoProfile;

/**
    One pre-recorded audio part: a media file plus the wall-clock capture
    time of each of its decoded frames, in decode order.
*/
#[derive(Clone, Debug)]
pub struct AudioPart {
    pub path: PathBuf,
    pub timestamps: Vec<f64>,
}

impl AudioPart {
    pub fn new(path: impl Into<PathBuf>, timestamps: Vec<f64>) -> Self {
        Self {
            path: path.into(),
            timestamps,
        }
    }
}

/// Binds the video encoder's codec parameters onto the output stream as
/// soon as the first frame opens the encoder. The container header is
/// not written until the first packet, so the binding always lands in
/// time.
struct BoundVideoEncoder {
    inner: VideoEncoder,
    sink: SharedSink,
}

impl VideoEncode for BoundVideoEncoder {
    fn configure(&mut self, first_frame: &VideoFrame) -> Result<()> {
        self.inner.configure(first_frame)?;
        if let Some(parameters) = self.inner.parameters() {
            self.sink.bind_video_parameters(parameters)?;
        }
        Ok(())
    }

    fn encode(
        &mut self,
        frame: &VideoFrame,
        pts: avsync_types::Pts,
    ) -> Result<Vec<avsync_types::Packet>> {
        self.inner.encode(frame, pts)
    }

    fn finish(&mut self) -> Result<Vec<avsync_types::Packet>> {
        self.inner.finish()
    }
}

/**
    The user-facing recording writer.

    Owns the whole session: container, video encoder, optional audio
    path, timestamp ledger. Feed it video frames in capture order and
    close it exactly once; the audio (segments plus synthesized silence)
    is interleaved automatically.
*/
pub struct RecordingWriter {
    inner: InterleavingWriter,
}

impl RecordingWriter {
    /**
        Open a recording at `output_path`.

        `start_time` is the wall-clock session epoch: frames and audio
        are timed relative to it, and anything captured earlier is
        dropped. Audio parts that cannot be opened are skipped with a
        warning; when none survive, the recording is video-only. An
        unsupported file extension is warned about but honored.
    */
    pub fn create(
        output_path: impl AsRef<Path>,
        start_time: f64,
        profile: VideoProfile,
        audio_parts: Vec<AudioPart>,
    ) -> Result<Self> {
        let path = output_path.as_ref();
        check_extension(path, &profile);

        let mut sink = Sink::create(path, profile.codec(), SESSION_TIME_BASE)?;
        debug!("opened '{}' for writing", path.display());

        let mut segments = Vec::new();
        let mut template = None;
        for part in audio_parts {
            match SegmentReader::open(&part.path) {
                Ok(reader) => {
                    template.get_or_insert(reader.template());
                    segments.push(AudioSegment::new(Box::new(reader), part.timestamps));
                }
                Err(e) => {
                    warn!("skipping unreadable audio part {}: {e}", part.path.display());
                }
            }
        }

        let audio = match template {
            Some(template) => {
                let encoder = AudioEncoder::from_template(&template)?;
                sink.add_audio_stream(
                    template.codec,
                    encoder.parameters(),
                    encoder.spec().time_base(),
                )?;
                Some(AudioPacketStream::new(
                    segments,
                    Box::new(encoder),
                    start_time,
                    true,
                ))
            }
            None => {
                debug!("could not mux audio: no decodable parts");
                None
            }
        };

        let shared = SharedSink::new(sink);
        let video = BoundVideoEncoder {
            inner: profile.build_encoder(),
            sink: shared.clone(),
        };

        let inner = InterleavingWriter::new(
            path,
            start_time,
            Box::new(video),
            audio,
            Box::new(shared),
        );
        Ok(Self { inner })
    }

    /**
        Encode and mux one captured frame; see
        [`InterleavingWriter::write_video_frame`] for the full contract.
    */
    pub fn write_frame(&mut self, frame: &VideoFrame) -> Result<WriteOutcome> {
        self.inner.write_video_frame(frame)
    }

    /**
        Close the session, exporting the ledger in the default format.
    */
    pub fn close(&mut self) -> Result<()> {
        self.inner.close(Some(Default::default()))
    }

    /**
        Close the session with an explicit ledger format (`"json"`,
        `"csv"` or `"all"`). Unknown format strings fail before the
        container is touched.
    */
    pub fn close_with_format(&mut self, format: &str) -> Result<()> {
        self.inner.close_with_format(format)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /**
        The frame ledger accumulated so far.
    */
    pub fn ledger(&self) -> &TimestampLedger {
        self.inner.ledger()
    }
}

fn check_extension(path: &Path, profile: &VideoProfile) {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if !profile.supported_extensions().contains(&extension.as_str()) {
        warn!(
            "opening media file writer for .{extension}; only {:?} are supported, \
             using a different container is risky",
            profile.supported_extensions()
        );
    }
}
