/*!
    The frame timestamp ledger and its export formats.

    Every successfully muxed video frame appends one entry pairing its
    wall-clock capture time with the presentation timestamp it was muxed
    under. The ledger is exported next to the finished video for
    downstream frame-accurate lookup.
*/

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use avsync_types::{Error, Pts, Result};

/**
    Timestamp export format.

    - `Json`: numeric array of wall-clock timestamps
    - `Csv`: tabular `timestamps [seconds],pts` pairs
    - `All`: both of the above
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimestampFormat {
    #[default]
    Json,
    Csv,
    All,
}

impl FromStr for TimestampFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "all" => Ok(Self::All),
            other => Err(Error::UnknownExportFormat {
                format: other.to_string(),
            }),
        }
    }
}

/**
    One muxed video frame: wall-clock capture time and muxed PTS.
*/
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LedgerEntry {
    pub timestamp: f64,
    pub pts: i64,
}

/**
    Append-only record of every muxed video frame, in mux order.
*/
#[derive(Debug, Default)]
pub struct TimestampLedger {
    entries: Vec<LedgerEntry>,
}

impl TimestampLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Record a muxed frame.
    */
    pub fn push(&mut self, timestamp: f64, pts: Pts) {
        self.entries.push(LedgerEntry {
            timestamp,
            pts: pts.0,
        });
    }

    /**
        Wall-clock timestamp of the most recently recorded frame.
    */
    pub fn last_timestamp(&self) -> Option<f64> {
        self.entries.last().map(|e| e.timestamp)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /**
        Write the ledger next to `video_path` as
        `<stem>_timestamps.json` and/or `.csv`.
    */
    pub fn export(&self, video_path: &Path, format: TimestampFormat) -> Result<()> {
        let base = ledger_base_path(video_path);
        if matches!(format, TimestampFormat::Json | TimestampFormat::All) {
            self.export_json(&base.with_extension("json"))?;
        }
        if matches!(format, TimestampFormat::Csv | TimestampFormat::All) {
            self.export_csv(&base.with_extension("csv"))?;
        }
        Ok(())
    }

    fn export_json(&self, path: &Path) -> Result<()> {
        let timestamps: Vec<f64> = self.entries.iter().map(|e| e.timestamp).collect();
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &timestamps)
            .map_err(|e| Error::invalid_data(e.to_string()))?;
        Ok(())
    }

    fn export_csv(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "timestamps [seconds],pts")?;
        for entry in &self.entries {
            writeln!(writer, "{:.6},{}", entry.timestamp, entry.pts)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn ledger_base_path(video_path: &Path) -> PathBuf {
    let stem = video_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "recording".to_string());
    video_path.with_file_name(format!("{stem}_timestamps"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parse_known() {
        assert_eq!("json".parse::<TimestampFormat>().unwrap(), TimestampFormat::Json);
        assert_eq!("csv".parse::<TimestampFormat>().unwrap(), TimestampFormat::Csv);
        assert_eq!("all".parse::<TimestampFormat>().unwrap(), TimestampFormat::All);
    }

    #[test]
    fn format_parse_unknown_is_rejected() {
        let err = "npy".parse::<TimestampFormat>().unwrap_err();
        assert!(matches!(err, Error::UnknownExportFormat { format } if format == "npy"));
    }

    #[test]
    fn push_and_last_timestamp() {
        let mut ledger = TimestampLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.last_timestamp(), None);
        ledger.push(1.5, Pts(100));
        ledger.push(2.0, Pts(150));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.last_timestamp(), Some(2.0));
        assert_eq!(ledger.entries()[0].pts, 100);
    }

    #[test]
    fn base_path_is_sibling_of_video() {
        let base = ledger_base_path(Path::new("/tmp/session/world.mp4"));
        assert_eq!(base, Path::new("/tmp/session/world_timestamps"));
    }

    #[test]
    fn export_json_writes_numeric_array() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("eye0.mp4");
        let mut ledger = TimestampLedger::new();
        ledger.push(0.5, Pts(0));
        ledger.push(1.0, Pts(32767));
        ledger.export(&video, TimestampFormat::Json).unwrap();

        let text = std::fs::read_to_string(dir.path().join("eye0_timestamps.json")).unwrap();
        let values: Vec<f64> = serde_json::from_str(&text).unwrap();
        assert_eq!(values, vec![0.5, 1.0]);
        assert!(!dir.path().join("eye0_timestamps.csv").exists());
    }

    #[test]
    fn export_csv_pairs_timestamp_with_pts() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("eye0.mp4");
        let mut ledger = TimestampLedger::new();
        ledger.push(0.5, Pts(0));
        ledger.push(1.0, Pts(32767));
        ledger.export(&video, TimestampFormat::Csv).unwrap();

        let text = std::fs::read_to_string(dir.path().join("eye0_timestamps.csv")).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("timestamps [seconds],pts"));
        assert_eq!(lines.next(), Some("0.500000,0"));
        assert_eq!(lines.next(), Some("1.000000,32767"));
    }

    #[test]
    fn export_all_writes_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("eye0.mp4");
        let mut ledger = TimestampLedger::new();
        ledger.push(0.5, Pts(0));
        ledger.export(&video, TimestampFormat::All).unwrap();
        assert!(dir.path().join("eye0_timestamps.json").exists());
        assert!(dir.path().join("eye0_timestamps.csv").exists());
    }
}
