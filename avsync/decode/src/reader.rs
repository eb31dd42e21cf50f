/*!
    Segment reader implementation.
*/

use std::collections::VecDeque;
use std::path::Path;

use ffmpeg_next::{
    codec, format, media,
    util::error::EAGAIN,
    util::frame::audio::Audio as AudioFrameFFmpeg,
};

use tracing::warn;

use avsync_types::{
    AudioFrame, AudioFrameSource, AudioTemplate, ChannelLayout, CodecId, Error, Result,
    SampleFormat,
};

/**
    Demuxes and decodes the audio stream of one segment file.

    Frames are pulled lazily: nothing is read from disk until
    [`next_frame`](Self::next_frame) asks for it. Decoded planar audio is
    interleaved during conversion, so consumers always see packed data.
*/
pub struct SegmentReader {
    input: format::context::Input,
    decoder: codec::decoder::Audio,
    stream_index: usize,
    template: AudioTemplate,
    pending: VecDeque<AudioFrame>,
    flushed: bool,
}

impl SegmentReader {
    /**
        Open a segment file and bind a decoder to its best audio stream.
    */
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        let input = format::input(&path).map_err(|e| Error::codec(e.to_string()))?;

        let (stream_index, parameters) = {
            let stream = input
                .streams()
                .best(media::Type::Audio)
                .ok_or_else(|| Error::invalid_data("segment has no audio stream"))?;
            (stream.index(), stream.parameters())
        };

        let decoder_ctx = codec::context::Context::from_parameters(parameters)
            .map_err(|e| Error::codec(e.to_string()))?;
        let decoder = decoder_ctx
            .decoder()
            .audio()
            .map_err(|e| Error::codec(e.to_string()))?;

        let template = probe_template(&decoder)?;

        Ok(Self {
            input,
            decoder,
            stream_index,
            template,
            pending: VecDeque::new(),
            flushed: false,
        })
    }

    /**
        The source stream description the output audio stream mirrors.
    */
    pub fn template(&self) -> AudioTemplate {
        self.template
    }

    /**
        Decode the next audio frame, or `None` at end of stream.
    */
    pub fn next_frame(&mut self) -> Result<Option<AudioFrame>> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(Some(frame));
            }
            if self.flushed {
                return Ok(None);
            }
            // detach the packet from the demuxer borrow before decoding
            let next = self
                .input
                .packets()
                .next()
                .map(|(stream, packet)| (stream.index(), packet));
            match next {
                Some((index, packet)) => {
                    if index != self.stream_index {
                        continue;
                    }
                    self.decoder
                        .send_packet(&packet)
                        .map_err(|e| Error::codec(e.to_string()))?;
                    self.receive_frames()?;
                }
                None => {
                    self.decoder
                        .send_eof()
                        .map_err(|e| Error::codec(e.to_string()))?;
                    self.receive_frames()?;
                    self.flushed = true;
                }
            }
        }
    }

    /**
        Receive all frames the decoder currently has ready.
    */
    fn receive_frames(&mut self) -> Result<()> {
        let mut decoded = AudioFrameFFmpeg::empty();
        loop {
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => match convert_frame(&decoded) {
                    Ok(frame) => self.pending.push_back(frame),
                    Err(e) => {
                        warn!("audio frame conversion error: {e}");
                    }
                },
                Err(ffmpeg_next::Error::Other { errno }) if errno == EAGAIN => break,
                Err(ffmpeg_next::Error::Eof) => break,
                Err(e) => return Err(Error::codec(e.to_string())),
            }
        }
        Ok(())
    }
}

impl AudioFrameSource for SegmentReader {
    fn next_frame(&mut self) -> Result<Option<AudioFrame>> {
        SegmentReader::next_frame(self)
    }
}

/**
    Describe the source stream for mirroring by the output.
*/
fn probe_template(decoder: &codec::decoder::Audio) -> Result<AudioTemplate> {
    let codec = codec_from_ffmpeg(decoder.id()).ok_or_else(|| {
        Error::unsupported_format(format!("unsupported audio codec: {:?}", decoder.id()))
    })?;
    let format = sample_format_from_ffmpeg(decoder.format()).ok_or_else(|| {
        Error::unsupported_format(format!("unsupported sample format: {:?}", decoder.format()))
    })?;
    let channels = match decoder.channels() {
        1 => ChannelLayout::Mono,
        _ => ChannelLayout::Stereo,
    };
    Ok(AudioTemplate {
        codec,
        sample_rate: decoder.rate(),
        channels,
        format,
    })
}

/**
    Convert an FFmpeg audio frame to our interleaved AudioFrame type.
*/
fn convert_frame(frame: &AudioFrameFFmpeg) -> Result<AudioFrame> {
    let samples = frame.samples();
    if samples == 0 {
        return Err(Error::invalid_data("audio frame has zero samples"));
    }

    let format = sample_format_from_ffmpeg(frame.format()).ok_or_else(|| {
        Error::unsupported_format(format!("unsupported sample format: {:?}", frame.format()))
    })?;

    let channel_count = frame.channels() as u16;
    let channels = match channel_count {
        1 => ChannelLayout::Mono,
        _ => ChannelLayout::Stereo,
    };

    let data = copy_audio_data(frame, format, samples, channel_count)?;

    Ok(AudioFrame::new(data, samples, frame.rate(), channels, format))
}

/**
    Copy sample data out of an FFmpeg frame, interleaving planar layouts.
*/
fn copy_audio_data(
    frame: &AudioFrameFFmpeg,
    format: SampleFormat,
    samples: usize,
    channels: u16,
) -> Result<Vec<u8>> {
    let bytes_per_sample = format.bytes_per_sample();

    if frame.is_planar() {
        let total_bytes = samples * channels as usize * bytes_per_sample;
        let mut output = vec![0u8; total_bytes];

        for ch in 0..channels as usize {
            let plane_data = frame.data(ch);
            for s in 0..samples {
                let src_offset = s * bytes_per_sample;
                let dst_offset = (s * channels as usize + ch) * bytes_per_sample;
                output[dst_offset..dst_offset + bytes_per_sample]
                    .copy_from_slice(&plane_data[src_offset..src_offset + bytes_per_sample]);
            }
        }

        Ok(output)
    } else {
        let plane_data = frame.data(0);
        let total_bytes = samples * channels as usize * bytes_per_sample;
        Ok(plane_data[..total_bytes].to_vec())
    }
}

fn codec_from_ffmpeg(id: codec::Id) -> Option<CodecId> {
    match id {
        codec::Id::AAC => Some(CodecId::Aac),
        codec::Id::MP3 => Some(CodecId::Mp3),
        codec::Id::OPUS => Some(CodecId::Opus),
        codec::Id::VORBIS => Some(CodecId::Vorbis),
        codec::Id::FLAC => Some(CodecId::Flac),
        codec::Id::PCM_S16LE => Some(CodecId::PcmS16Le),
        codec::Id::PCM_F32LE => Some(CodecId::PcmF32Le),
        _ => None,
    }
}

fn sample_format_from_ffmpeg(format: ffmpeg_next::format::Sample) -> Option<SampleFormat> {
    use ffmpeg_next::format::Sample;

    match format {
        Sample::F32(_) => Some(SampleFormat::F32),
        Sample::F64(_) => Some(SampleFormat::F64),
        Sample::I16(_) => Some(SampleFormat::S16),
        Sample::I32(_) => Some(SampleFormat::S32),
        Sample::U8(_) => Some(SampleFormat::U8),
        _ => None,
    }
}

impl std::fmt::Debug for SegmentReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentReader")
            .field("stream_index", &self.stream_index)
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}
