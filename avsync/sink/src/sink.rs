/*!
    Sink implementation.
*/

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use ffmpeg_next::{Rational as AvRational, codec, format};

use tracing::warn;

use avsync_types::{CodecId, Error, Packet, PacketSink, Rational, Result, StreamType};

/**
    One output container with a video stream and an optional audio stream.

    Owned by exactly one recording session. Packets are rescaled from
    their encoder time base to the muxer-assigned stream time base on
    submission, then written interleaved.
*/
pub struct Sink {
    output: format::context::Output,
    video_index: usize,
    audio_index: Option<usize>,
    header_written: bool,
    trailer_written: bool,
}

impl Sink {
    /**
        Open the container at `path` and declare its video stream.

        The muxer is guessed from the file extension. The video stream's
        codec parameters are bound later, once the first frame has opened
        the encoder; `time_base` is only a hint until the header is
        written.
    */
    pub fn create(path: impl AsRef<Path>, video_codec: CodecId, time_base: Rational) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        let mut output =
            format::output(&path).map_err(|e| Error::codec(e.to_string()))?;

        let codec = ffmpeg_next::encoder::find(codec_id(video_codec)).ok_or_else(|| {
            Error::codec(format!("no encoder for {}", video_codec.name()))
        })?;
        let mut stream = output
            .add_stream(codec)
            .map_err(|e| Error::codec(e.to_string()))?;
        stream.set_time_base(to_av_rational(time_base));
        let video_index = stream.index();

        Ok(Self {
            output,
            video_index,
            audio_index: None,
            header_written: false,
            trailer_written: false,
        })
    }

    /**
        Declare the audio stream from an opened encoder's parameters.

        Must happen before the first packet is submitted; the container
        header fixes the stream table.
    */
    pub fn add_audio_stream(
        &mut self,
        audio_codec: CodecId,
        parameters: codec::Parameters,
        time_base: Rational,
    ) -> Result<()> {
        let codec = ffmpeg_next::encoder::find(codec_id(audio_codec)).ok_or_else(|| {
            Error::codec(format!("no encoder for {}", audio_codec.name()))
        })?;
        let mut stream = self
            .output
            .add_stream(codec)
            .map_err(|e| Error::codec(e.to_string()))?;
        stream.set_time_base(to_av_rational(time_base));
        stream.set_parameters(parameters);
        self.audio_index = Some(stream.index());
        Ok(())
    }

    /**
        Bind the video stream's codec parameters.

        Called once the first frame has opened the video encoder, before
        any packet is submitted.
    */
    pub fn bind_video_parameters(&mut self, parameters: codec::Parameters) -> Result<()> {
        let mut stream = self
            .output
            .stream_mut(self.video_index)
            .ok_or_else(|| Error::invalid_data("video stream vanished from output"))?;
        stream.set_parameters(parameters);
        Ok(())
    }

    /**
        Write one packet, interleaved.

        The first submission writes the container header.
    */
    pub fn submit(&mut self, packet: Packet) -> Result<()> {
        let stream_index = match packet.stream_type {
            StreamType::Video => self.video_index,
            StreamType::Audio => self
                .audio_index
                .ok_or_else(|| Error::invalid_data("no audio stream configured"))?,
        };

        if !self.header_written {
            self.output
                .write_header()
                .map_err(|e| Error::codec(e.to_string()))?;
            self.header_written = true;
        }

        let mut av_packet = if packet.data.is_empty() {
            ffmpeg_next::Packet::empty()
        } else {
            ffmpeg_next::Packet::copy(&packet.data)
        };
        av_packet.set_stream(stream_index);
        av_packet.set_pts(packet.pts.map(|pts| pts.0));
        av_packet.set_dts(packet.dts.map(|dts| dts.0));
        av_packet.set_duration(packet.duration.0);
        if packet.is_keyframe {
            av_packet.set_flags(codec::packet::Flags::KEY);
        }

        // the muxer may have chosen a different stream time base when the
        // header was written
        let stream_time_base = self
            .output
            .stream(stream_index)
            .map(|stream| stream.time_base())
            .unwrap_or_else(|| to_av_rational(packet.time_base));
        av_packet.rescale_ts(to_av_rational(packet.time_base), stream_time_base);

        av_packet
            .write_interleaved(&mut self.output)
            .map_err(|e| Error::codec(e.to_string()))
    }

    /**
        Finalize the container.

        A session that never saw a frame still attempts a header so the
        trailer has something to close; failure to do so is logged, not
        fatal — there is nothing of value in an empty container.
    */
    pub fn finish(&mut self) -> Result<()> {
        if self.trailer_written {
            return Ok(());
        }
        if !self.header_written {
            match self.output.write_header() {
                Ok(()) => self.header_written = true,
                Err(e) => {
                    warn!("finalizing container without any packets failed: {e}");
                    return Ok(());
                }
            }
        }
        self.output
            .write_trailer()
            .map_err(|e| Error::codec(e.to_string()))?;
        self.trailer_written = true;
        Ok(())
    }
}

impl PacketSink for Sink {
    fn submit(&mut self, packet: Packet) -> Result<()> {
        Sink::submit(self, packet)
    }

    fn finish(&mut self) -> Result<()> {
        Sink::finish(self)
    }
}

/**
    Clonable handle to a [`Sink`].

    The recording session is single-threaded and cooperative, but two
    collaborators need the sink: the writer submits packets, and the
    session wiring binds video parameters after the first frame opens the
    encoder. `Rc<RefCell<..>>` keeps both on one thread with no locking.
*/
#[derive(Clone)]
pub struct SharedSink {
    inner: Rc<RefCell<Sink>>,
}

impl SharedSink {
    pub fn new(sink: Sink) -> Self {
        Self {
            inner: Rc::new(RefCell::new(sink)),
        }
    }

    /**
        Bind the video stream's codec parameters on the shared sink.
    */
    pub fn bind_video_parameters(&self, parameters: codec::Parameters) -> Result<()> {
        self.inner.borrow_mut().bind_video_parameters(parameters)
    }
}

impl PacketSink for SharedSink {
    fn submit(&mut self, packet: Packet) -> Result<()> {
        self.inner.borrow_mut().submit(packet)
    }

    fn finish(&mut self) -> Result<()> {
        self.inner.borrow_mut().finish()
    }
}

fn to_av_rational(rational: Rational) -> AvRational {
    AvRational::new(rational.num, rational.den)
}

fn codec_id(codec: CodecId) -> codec::Id {
    match codec {
        CodecId::Mpeg4 => codec::Id::MPEG4,
        CodecId::Mjpeg => codec::Id::MJPEG,
        CodecId::Aac => codec::Id::AAC,
        CodecId::Mp3 => codec::Id::MP3,
        CodecId::Opus => codec::Id::OPUS,
        CodecId::Vorbis => codec::Id::VORBIS,
        CodecId::Flac => codec::Id::FLAC,
        CodecId::PcmS16Le => codec::Id::PCM_S16LE,
        CodecId::PcmF32Le => codec::Id::PCM_F32LE,
    }
}
