/*!
    Synchronized recording writer.

    Muxes a live stream of captured video frames together with
    pre-recorded audio parts into one container, keeping every stream's
    presentation timestamps strictly monotonic and filling audio gaps
    with silence. Alongside the video it persists a timestamp ledger
    mapping each muxed frame back to its wall-clock capture time.

    # Example

    ```ignore
    use recwriter::{AudioPart, RecordingWriter, VideoProfile};

    let parts = vec![AudioPart::new("audio_00010.mp4", timestamps)];
    let mut writer = RecordingWriter::create("world.mp4", start_time, VideoProfile::mpeg4(), parts)?;

    for frame in capture {
        writer.write_frame(&frame)?;
    }
    writer.close_with_format("all")?;
    ```

    The heavy lifting lives in the `avsync-*` crates: `avsync-mux` is the
    synchronization engine, `avsync-encode`/`avsync-decode`/`avsync-sink`
    wrap the codecs and the container.
*/

pub use avsync_mux::{LedgerEntry, TimestampFormat, TimestampLedger, WriteOutcome};
pub use avsync_types::{Error, PixelData, Result, VideoFrame};

mod profile;
mod writer;

pub use profile::VideoProfile;
pub use writer::{AudioPart, RecordingWriter};
