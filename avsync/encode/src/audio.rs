/*!
    Output audio encoder.
*/

use ffmpeg_next::{
    codec,
    util::error::EAGAIN,
    util::frame::audio::Audio as AudioFrameFFmpeg,
};

use avsync_types::{
    AudioEncode, AudioFrame, AudioStreamSpec, AudioTemplate, Error, MediaDuration, Packet, Pts,
    Rational, Result, StreamType,
};

use crate::convert::{sample_matches, to_av_channel_layout, to_av_codec_id, to_av_rational, to_av_sample};

/**
    Encodes decoded audio frames against the single exported audio stream.

    Built from an [`AudioTemplate`] so the output mirrors the codec, rate
    and layout of the source segments — decoded segment frames feed
    straight in without sample conversion. Silence frames synthesized by
    the gap filler go through the same instance.
*/
pub struct AudioEncoder {
    encoder: codec::encoder::audio::Encoder,
    spec: AudioStreamSpec,
    frame_format: ffmpeg_next::format::Sample,
    layout: ffmpeg_next::channel_layout::ChannelLayout,
}

impl AudioEncoder {
    /**
        Open an encoder mirroring the given source template.
    */
    pub fn from_template(template: &AudioTemplate) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        let codec = ffmpeg_next::encoder::find(to_av_codec_id(template.codec))
            .ok_or_else(|| {
                Error::codec(format!("no encoder for {}", template.codec.name()))
            })?;

        // pick the codec's layout variant of the template's sample format
        // (e.g. AAC consumes planar f32 while decoded frames are packed)
        let frame_format = codec
            .audio()
            .ok()
            .and_then(|caps| {
                caps.formats().and_then(|formats| {
                    formats
                        .filter(|f| sample_matches(*f, template.format))
                        .next()
                })
            })
            .unwrap_or_else(|| to_av_sample(template.format, false));

        let layout = to_av_channel_layout(template.channels);
        let time_base = Rational::new(1, template.sample_rate as i32);

        let context = codec::context::Context::new_with_codec(codec);
        let mut audio = context
            .encoder()
            .audio()
            .map_err(|e| Error::codec(e.to_string()))?;
        audio.set_rate(template.sample_rate as i32);
        audio.set_format(frame_format);
        audio.set_channel_layout(layout);
        audio.set_time_base(to_av_rational(time_base));

        let encoder = audio
            .open_as(codec)
            .map_err(|e| Error::codec(e.to_string()))?;

        let mut frame_size = encoder.frame_size() as usize;
        if frame_size == 0 {
            // frame-size-free codecs (PCM) report zero; chunk at a sane size
            tracing::debug!("{} reports no frame size, chunking at 1024", template.codec.name());
            frame_size = 1024;
        }
        let spec = AudioStreamSpec {
            sample_rate: template.sample_rate,
            channels: template.channels,
            format: template.format,
            frame_size,
        };

        Ok(Self {
            encoder,
            spec,
            frame_format,
            layout,
        })
    }

    /**
        Codec parameters of the opened encoder, for binding the output
        stream.
    */
    pub fn parameters(&self) -> codec::Parameters {
        codec::Parameters::from(&self.encoder)
    }

    fn receive_packets(&mut self) -> Result<Vec<Packet>> {
        let time_base = self.spec.time_base();
        let mut packets = Vec::new();
        let mut encoded = ffmpeg_next::Packet::empty();
        loop {
            match self.encoder.receive_packet(&mut encoded) {
                Ok(()) => {
                    packets.push(Packet::new(
                        encoded.data().map(|d| d.to_vec()).unwrap_or_default(),
                        encoded.pts().map(Pts),
                        encoded.dts().map(Pts),
                        MediaDuration(encoded.duration()),
                        time_base,
                        encoded.is_key(),
                        StreamType::Audio,
                    ));
                }
                Err(ffmpeg_next::Error::Other { errno }) if errno == EAGAIN => break,
                Err(ffmpeg_next::Error::Eof) => break,
                Err(e) => return Err(Error::codec(e.to_string())),
            }
        }
        Ok(packets)
    }
}

impl AudioEncode for AudioEncoder {
    fn spec(&self) -> AudioStreamSpec {
        self.spec
    }

    fn encode(&mut self, frame: &AudioFrame) -> Result<Vec<Packet>> {
        if frame.data.len() < frame.expected_data_len() {
            return Err(Error::invalid_data(format!(
                "audio frame holds {} bytes, expected {}",
                frame.data.len(),
                frame.expected_data_len()
            )));
        }

        let mut av_frame = AudioFrameFFmpeg::new(self.frame_format, frame.samples, self.layout);
        av_frame.set_rate(self.spec.sample_rate);
        fill_audio_frame(&mut av_frame, frame);
        // timestamps are assigned downstream from the segment's wall clock
        av_frame.set_pts(None);

        self.encoder
            .send_frame(&av_frame)
            .map_err(|e| Error::codec(e.to_string()))?;
        self.receive_packets()
    }
}

/**
    Copy interleaved sample data into the FFmpeg frame, splitting into
    planes when the encoder consumes a planar layout.
*/
fn fill_audio_frame(target: &mut AudioFrameFFmpeg, frame: &AudioFrame) {
    let bytes_per_sample = frame.format.bytes_per_sample();
    let channels = frame.channels.channels() as usize;

    if target.is_planar() && channels > 1 {
        for ch in 0..channels {
            let plane = target.data_mut(ch);
            for s in 0..frame.samples {
                let src = (s * channels + ch) * bytes_per_sample;
                let dst = s * bytes_per_sample;
                plane[dst..dst + bytes_per_sample]
                    .copy_from_slice(&frame.data[src..src + bytes_per_sample]);
            }
        }
    } else {
        let len = frame.expected_data_len();
        target.data_mut(0)[..len].copy_from_slice(&frame.data[..len]);
    }
}

impl std::fmt::Debug for AudioEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEncoder")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}
