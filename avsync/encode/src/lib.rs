/*!
    Media encoding for the avsync crate ecosystem.

    This crate turns raw frames into packets for the container writer:

    - [`VideoEncoder`] - the closed set of video variants: MPEG-4
      full-frame re-encoding and MJPEG pre-compressed passthrough, both
      behind the `VideoEncode` capability trait
    - [`AudioEncoder`] - the single output audio encoder, mirroring a
      source [`AudioTemplate`](avsync_types::AudioTemplate) so decoded
      segment frames re-encode without conversion

    # Example

    ```ignore
    use avsync_encode::{FullFrameConfig, VideoEncoder};
    use avsync_types::VideoEncode;

    let mut encoder = VideoEncoder::full_frame(FullFrameConfig::default(), time_base);
    encoder.configure(&first_frame)?;
    for packet in encoder.encode(&frame, pts)? {
        sink.submit(packet)?;
    }
    ```
*/

pub use avsync_types::{Error, Packet, Result, VideoEncode};

mod audio;
mod convert;
mod video;

pub use audio::AudioEncoder;
pub use video::{FullFrameConfig, FullFrameEncoder, PassthroughEncoder, VideoEncoder};
