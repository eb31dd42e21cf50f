/*!
    Video encoder variants.

    Two ways a captured frame becomes a packet:

    - [`FullFrameEncoder`] re-encodes raw pixel frames with MPEG-4,
      reusing one encoder-owned frame buffer per call
    - [`PassthroughEncoder`] wraps frames that already carry a compressed
      JPEG payload into packets as-is, one packet per frame

    [`VideoEncoder`] is the closed set over both, selected when the
    session is created.
*/

use ffmpeg_next::{
    codec,
    software::scaling::{context::Context as Scaler, flag::Flags as ScalerFlags},
    threading,
    util::error::EAGAIN,
    util::frame::video::Video as VideoFrameFFmpeg,
};

use avsync_types::{
    Error, MediaDuration, Packet, PixelData, Pts, Rational, Result, StreamType, VideoEncode,
    VideoFrame,
};

use crate::convert::{to_av_pixel, to_av_rational};

/**
    Tuning knobs for the full-frame MPEG-4 encoder.

    `bit_rate` defaults to the long-standing 150 Mbps production value;
    it is exposed here rather than hard-coded so deployments can tune it.
*/
#[derive(Clone, Copy, Debug)]
pub struct FullFrameConfig {
    /// Target bit rate in bits per second.
    pub bit_rate: usize,
    /// Allowed bit rate deviation, in bits per second.
    pub bit_rate_tolerance: usize,
    /// Encoder thread count.
    pub thread_count: usize,
}

impl Default for FullFrameConfig {
    fn default() -> Self {
        let bit_rate = 150_000_000;
        let threads = std::thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1))
            .unwrap_or(1)
            .max(1);
        Self {
            bit_rate,
            bit_rate_tolerance: bit_rate / 20,
            thread_count: threads,
        }
    }
}

struct OpenedFullFrame {
    encoder: codec::encoder::video::Encoder,
    /// Reusable input buffer in the source pixel format.
    source: VideoFrameFFmpeg,
    /// Present when the codec consumes a different pixel format than the
    /// capture source delivers.
    scaler: Option<(Scaler, VideoFrameFFmpeg)>,
}

/**
    MPEG-4 full-frame encoder.

    Lazily opened by the first frame, which fixes width, height and pixel
    format for the whole session. Pixel planes are copied into one
    reusable frame buffer per call instead of allocating per frame.
*/
pub struct FullFrameEncoder {
    config: FullFrameConfig,
    time_base: Rational,
    state: Option<OpenedFullFrame>,
}

impl FullFrameEncoder {
    pub fn new(config: FullFrameConfig, time_base: Rational) -> Self {
        Self {
            config,
            time_base,
            state: None,
        }
    }

    /**
        Codec parameters of the opened encoder, for binding the output
        stream. `None` until the first frame configured the encoder.
    */
    pub fn parameters(&self) -> Option<codec::Parameters> {
        self.state
            .as_ref()
            .map(|state| codec::Parameters::from(&state.encoder))
    }

    fn open(&mut self, first: &VideoFrame) -> Result<()> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        let source_format = match &first.pixels {
            PixelData::Jpeg(_) => {
                return Err(Error::invalid_data(
                    "full-frame encoder cannot consume pre-compressed frames",
                ));
            }
            other => to_av_pixel(other.format()),
        };

        let codec = ffmpeg_next::encoder::find(codec::Id::MPEG4)
            .ok_or_else(|| Error::codec("mpeg4 encoder not available"))?;

        // prefer the codec's native pixel format; scale into it if the
        // capture source delivers something else
        let target_format = codec
            .video()
            .ok()
            .and_then(|caps| caps.formats().and_then(|mut formats| formats.next()))
            .unwrap_or(source_format);

        let mut context = codec::context::Context::new_with_codec(codec);
        context.set_threading(threading::Config {
            kind: threading::Type::Frame,
            count: self.config.thread_count,
        });

        let mut video = context
            .encoder()
            .video()
            .map_err(|e| Error::codec(e.to_string()))?;
        video.set_width(first.width);
        video.set_height(first.height);
        video.set_format(target_format);
        video.set_time_base(to_av_rational(self.time_base));
        video.set_bit_rate(self.config.bit_rate);
        unsafe {
            // bit_rate_tolerance has no safe setter
            (*video.as_mut_ptr()).bit_rate_tolerance = self.config.bit_rate_tolerance as i32;
        }

        let encoder = video
            .open_as(codec)
            .map_err(|e| Error::codec(e.to_string()))?;

        let source = VideoFrameFFmpeg::new(source_format, first.width, first.height);
        let scaler = if target_format != source_format {
            tracing::debug!("scaling {source_format:?} input to {target_format:?} for the codec");
            let scaler = Scaler::get(
                source_format,
                first.width,
                first.height,
                target_format,
                first.width,
                first.height,
                ScalerFlags::BILINEAR,
            )
            .map_err(|e| Error::codec(e.to_string()))?;
            let scaled = VideoFrameFFmpeg::new(target_format, first.width, first.height);
            Some((scaler, scaled))
        } else {
            None
        };

        self.state = Some(OpenedFullFrame {
            encoder,
            source,
            scaler,
        });
        Ok(())
    }
}

impl VideoEncode for FullFrameEncoder {
    fn configure(&mut self, first_frame: &VideoFrame) -> Result<()> {
        self.open(first_frame)
    }

    fn encode(&mut self, frame: &VideoFrame, pts: Pts) -> Result<Vec<Packet>> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| Error::invalid_data("encoder has not been configured"))?;

        fill_source_frame(&mut state.source, frame)?;

        match state.scaler.as_mut() {
            Some((scaler, scaled)) => {
                scaler
                    .run(&state.source, scaled)
                    .map_err(|e| Error::codec(e.to_string()))?;
                scaled.set_pts(Some(pts.0));
                state
                    .encoder
                    .send_frame(scaled)
                    .map_err(|e| Error::codec(e.to_string()))?;
            }
            None => {
                state.source.set_pts(Some(pts.0));
                state
                    .encoder
                    .send_frame(&state.source)
                    .map_err(|e| Error::codec(e.to_string()))?;
            }
        }

        receive_packets(&mut state.encoder, self.time_base)
    }

    fn finish(&mut self) -> Result<Vec<Packet>> {
        let Some(state) = self.state.as_mut() else {
            // no frame ever arrived, nothing to flush
            return Ok(Vec::new());
        };
        state
            .encoder
            .send_eof()
            .map_err(|e| Error::codec(e.to_string()))?;
        receive_packets(&mut state.encoder, self.time_base)
    }
}

/**
    Pre-compressed frame passthrough (MJPEG).

    Each frame already carries a complete JPEG image; it is wrapped into
    exactly one packet with PTS = DTS. No codec state exists at all.
*/
pub struct PassthroughEncoder {
    time_base: Rational,
    dimensions: Option<(u32, u32)>,
}

impl PassthroughEncoder {
    pub fn new(time_base: Rational) -> Self {
        Self {
            time_base,
            dimensions: None,
        }
    }

    /**
        Raw codec parameters for binding the output stream. `None` until
        the first frame fixed the dimensions.
    */
    pub fn parameters(&self) -> Option<codec::Parameters> {
        use ffmpeg_next::ffi;

        let (width, height) = self.dimensions?;
        let mut parameters = codec::Parameters::new();
        unsafe {
            let par = parameters.as_mut_ptr();
            (*par).codec_type = ffi::AVMediaType::AVMEDIA_TYPE_VIDEO;
            (*par).codec_id = ffi::AVCodecID::AV_CODEC_ID_MJPEG;
            (*par).width = width as i32;
            (*par).height = height as i32;
            (*par).format = ffi::AVPixelFormat::AV_PIX_FMT_YUVJ422P as i32;
        }
        Some(parameters)
    }
}

impl VideoEncode for PassthroughEncoder {
    fn configure(&mut self, first_frame: &VideoFrame) -> Result<()> {
        self.dimensions = Some((first_frame.width, first_frame.height));
        Ok(())
    }

    fn encode(&mut self, frame: &VideoFrame, pts: Pts) -> Result<Vec<Packet>> {
        let PixelData::Jpeg(payload) = &frame.pixels else {
            return Err(Error::invalid_data(
                "passthrough encoder requires pre-compressed frames",
            ));
        };
        Ok(vec![Packet::new(
            payload.clone(),
            Some(pts),
            Some(pts),
            MediaDuration(0),
            self.time_base,
            true,
            StreamType::Video,
        )])
    }

    fn finish(&mut self) -> Result<Vec<Packet>> {
        Ok(Vec::new())
    }
}

/**
    The closed set of video encoder variants.
*/
pub enum VideoEncoder {
    FullFrame(FullFrameEncoder),
    Passthrough(PassthroughEncoder),
}

impl VideoEncoder {
    /**
        MPEG-4 full-frame encoding.
    */
    pub fn full_frame(config: FullFrameConfig, time_base: Rational) -> Self {
        Self::FullFrame(FullFrameEncoder::new(config, time_base))
    }

    /**
        MJPEG pre-compressed passthrough.
    */
    pub fn passthrough(time_base: Rational) -> Self {
        Self::Passthrough(PassthroughEncoder::new(time_base))
    }

    /**
        Codec parameters for the output stream, once configured.
    */
    pub fn parameters(&self) -> Option<codec::Parameters> {
        match self {
            Self::FullFrame(encoder) => encoder.parameters(),
            Self::Passthrough(encoder) => encoder.parameters(),
        }
    }
}

impl VideoEncode for VideoEncoder {
    fn configure(&mut self, first_frame: &VideoFrame) -> Result<()> {
        match self {
            Self::FullFrame(encoder) => encoder.configure(first_frame),
            Self::Passthrough(encoder) => encoder.configure(first_frame),
        }
    }

    fn encode(&mut self, frame: &VideoFrame, pts: Pts) -> Result<Vec<Packet>> {
        match self {
            Self::FullFrame(encoder) => encoder.encode(frame, pts),
            Self::Passthrough(encoder) => encoder.encode(frame, pts),
        }
    }

    fn finish(&mut self) -> Result<Vec<Packet>> {
        match self {
            Self::FullFrame(encoder) => encoder.finish(),
            Self::Passthrough(encoder) => encoder.finish(),
        }
    }
}

/**
    Copy the frame's pixel planes into the encoder-owned buffer,
    honoring the buffer's per-plane strides.
*/
fn fill_source_frame(target: &mut VideoFrameFFmpeg, frame: &VideoFrame) -> Result<()> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    match &frame.pixels {
        PixelData::Yuv422 { y, u, v } => {
            copy_plane(target, 0, y, width, height)?;
            copy_plane(target, 1, u, width / 2, height)?;
            copy_plane(target, 2, v, width / 2, height)?;
        }
        PixelData::Bgr24(data) => {
            copy_plane(target, 0, data, width * 3, height)?;
        }
        PixelData::Jpeg(_) => {
            return Err(Error::invalid_data(
                "full-frame encoder cannot consume pre-compressed frames",
            ));
        }
    }
    Ok(())
}

fn copy_plane(
    target: &mut VideoFrameFFmpeg,
    plane: usize,
    source: &[u8],
    row_bytes: usize,
    rows: usize,
) -> Result<()> {
    let expected = row_bytes * rows;
    if source.len() < expected {
        return Err(Error::invalid_data(format!(
            "pixel plane {plane} holds {} bytes, expected {expected}",
            source.len()
        )));
    }
    let stride = target.stride(plane);
    let data = target.data_mut(plane);
    if stride == row_bytes {
        data[..expected].copy_from_slice(&source[..expected]);
    } else {
        for row in 0..rows {
            let dst = row * stride;
            let src = row * row_bytes;
            data[dst..dst + row_bytes].copy_from_slice(&source[src..src + row_bytes]);
        }
    }
    Ok(())
}

/**
    Drain every packet the encoder has ready.
*/
fn receive_packets(
    encoder: &mut codec::encoder::video::Encoder,
    time_base: Rational,
) -> Result<Vec<Packet>> {
    let mut packets = Vec::new();
    let mut encoded = ffmpeg_next::Packet::empty();
    loop {
        match encoder.receive_packet(&mut encoded) {
            Ok(()) => {
                packets.push(Packet::new(
                    encoded.data().map(|d| d.to_vec()).unwrap_or_default(),
                    encoded.pts().map(Pts),
                    encoded.dts().map(Pts),
                    MediaDuration(encoded.duration()),
                    time_base,
                    encoded.is_key(),
                    StreamType::Video,
                ));
            }
            Err(ffmpeg_next::Error::Other { errno }) if errno == EAGAIN => break,
            Err(ffmpeg_next::Error::Eof) => break,
            Err(e) => return Err(Error::codec(e.to_string())),
        }
    }
    Ok(packets)
}
