/*!
    Conversions between ecosystem types and their FFmpeg counterparts.
*/

use ffmpeg_next::{
    Rational as AvRational,
    channel_layout::ChannelLayout as AvChannelLayout,
    codec,
    format::{Pixel, Sample, sample::Type as SampleType},
};

use avsync_types::{ChannelLayout, CodecId, Rational, SampleFormat};

pub(crate) fn to_av_rational(rational: Rational) -> AvRational {
    AvRational::new(rational.num, rational.den)
}

pub(crate) fn to_av_codec_id(codec: CodecId) -> codec::Id {
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

pub(crate) fn to_av_channel_layout(channels: ChannelLayout) -> AvChannelLayout {
    match channels {
        ChannelLayout::Mono => AvChannelLayout::MONO,
        ChannelLayout::Stereo => AvChannelLayout::STEREO,
    }
}

pub(crate) fn to_av_sample(format: SampleFormat, planar: bool) -> Sample {
    let kind = if planar {
        SampleType::Planar
    } else {
        SampleType::Packed
    };
    match format {
        SampleFormat::F32 => Sample::F32(kind),
        SampleFormat::F64 => Sample::F64(kind),
        SampleFormat::S16 => Sample::I16(kind),
        SampleFormat::S32 => Sample::I32(kind),
        SampleFormat::U8 => Sample::U8(kind),
    }
}

/// True when `sample` stores the same scalar type as `format`,
/// regardless of packed/planar layout.
pub(crate) fn sample_matches(sample: Sample, format: SampleFormat) -> bool {
    matches!(
        (sample, format),
        (Sample::F32(_), SampleFormat::F32)
            | (Sample::F64(_), SampleFormat::F64)
            | (Sample::I16(_), SampleFormat::S16)
            | (Sample::I32(_), SampleFormat::S32)
            | (Sample::U8(_), SampleFormat::U8)
    )
}

pub(crate) fn to_av_pixel(format: avsync_types::PixelFormat) -> Pixel {
    match format {
        avsync_types::PixelFormat::Yuv422p => Pixel::YUV422P,
        avsync_types::PixelFormat::Bgr24 => Pixel::BGR24,
        avsync_types::PixelFormat::Yuvj422p => Pixel::YUVJ422P,
    }
}
