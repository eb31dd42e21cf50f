/*!
    Audio segment reading for the avsync crate ecosystem.

    A recording's audio parts are ordinary media files; this crate demuxes
    and decodes them into the interleaved [`AudioFrame`]s the
    synchronization engine consumes, and probes the [`AudioTemplate`] that
    the exported audio stream mirrors.

    # Example

    ```ignore
    use avsync_decode::SegmentReader;

    let mut reader = SegmentReader::open("audio_00010.mp4")?;
    let template = reader.template();

    while let Some(frame) = reader.next_frame()? {
        // pair the frame with its wall-clock timestamp
    }
    ```
*/

pub use avsync_types::{AudioFrame, AudioTemplate, Error, Result};

mod reader;

pub use reader::SegmentReader;
