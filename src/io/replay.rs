//! Recorded detection logs.
//!
//! A log is a headerless CSV with one row per detection:
//!
//! ```text
//! # frame, id, tx, ty, tz, r00, r01, r02, r10, r11, r12, r20, r21, r22
//! 0, 2, 0.0, 0.0, 1.0, 1, 0, 0, 0, 1, 0, 0, 0, 1
//! 0, 5, 1.0, 0.0, 1.0, 1, 0, 0, 0, 1, 0, 0, 0, 1
//! 3, 5, 1.0, 0.0, 1.0, 1, 0, 0, 0, 1, 0, 0, 0, 1
//! ```
//!
//! Frame indices must not decrease. Frames with no rows (1 and 2 above)
//! are replayed as empty frames.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, StringRecord};
use nalgebra::{Matrix3, Vector3};

use crate::detection::{RawDetection, TagId};

const FIELDS_PER_ROW: usize = 14;

/// Per-frame detection sets loaded from a log.
#[derive(Debug, Clone, Default)]
pub struct DetectionLog {
    frames: Vec<Vec<RawDetection>>,
}

impl DetectionLog {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .from_path(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        Self::from_csv(rdr).with_context(|| format!("Failed to read {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .from_reader(reader);
        Self::from_csv(rdr)
    }

    fn from_csv<R: Read>(mut rdr: csv::Reader<R>) -> Result<Self> {
        let mut frames: Vec<Vec<RawDetection>> = Vec::new();
        for rec in rdr.records() {
            let rec = rec?;
            let line = rec.position().map_or(0, |p| p.line());
            if rec.len() != FIELDS_PER_ROW {
                bail!(
                    "line {}: expected {} fields, got {}",
                    line,
                    FIELDS_PER_ROW,
                    rec.len()
                );
            }
            let (frame, detection) =
                parse_row(&rec).with_context(|| format!("line {}: malformed row", line))?;

            if frame + 1 < frames.len() {
                bail!("line {}: frame {} appears after frame {}", line, frame, frames.len() - 1);
            }
            if frames.len() <= frame {
                frames.resize_with(frame + 1, Vec::new);
            }
            frames[frame].push(detection);
        }
        Ok(Self { frames })
    }

    /// Number of frames, including empty ones.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, idx: usize) -> Option<&[RawDetection]> {
        self.frames.get(idx).map(Vec::as_slice)
    }

    pub fn frames(&self) -> impl Iterator<Item = &[RawDetection]> {
        self.frames.iter().map(Vec::as_slice)
    }
}

fn parse_row(rec: &StringRecord) -> Result<(usize, RawDetection)> {
    let frame: usize = rec[0].trim().parse()?;
    let id: i32 = rec[1].trim().parse()?;
    let translation = Vector3::new(
        rec[2].trim().parse()?,
        rec[3].trim().parse()?,
        rec[4].trim().parse()?,
    );
    let mut r = [0.0f64; 9];
    for (i, v) in r.iter_mut().enumerate() {
        *v = rec[5 + i].trim().parse()?;
    }
    let rotation = Matrix3::from_row_slice(&r);
    Ok((frame, RawDetection::from_pose(TagId(id), translation, rotation)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
# frame, id, tx, ty, tz, r00..r22
0, 2, 0.0, 0.0, 1.0, 1, 0, 0, 0, 1, 0, 0, 0, 1
0, 5, 1.0, 0.0, 1.0, 1, 0, 0, 0, 1, 0, 0, 0, 1
3, 5, 1.0, 0.5, 1.0, 0, -1, 0, 1, 0, 0, 0, 0, 1
";

    #[test]
    fn test_parses_frames_and_keeps_gaps_empty() {
        let log = DetectionLog::from_reader(LOG.as_bytes()).unwrap();
        assert_eq!(log.len(), 4);
        assert_eq!(log.frame(0).unwrap().len(), 2);
        assert!(log.frame(1).unwrap().is_empty());
        assert!(log.frame(2).unwrap().is_empty());

        let last = &log.frame(3).unwrap()[0];
        assert_eq!(last.id, TagId(5));
        assert_eq!(last.translation, Vector3::new(1.0, 0.5, 1.0));
        assert_eq!(last.rotation[(0, 1)], -1.0);
        assert_eq!(last.rotation[(1, 0)], 1.0);
    }

    #[test]
    fn test_rejects_wrong_field_count_with_line() {
        let bad = "0, 2, 0.0, 0.0, 1.0\n";
        let err = DetectionLog::from_reader(bad.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 1"), "{}", err);
    }

    #[test]
    fn test_rejects_unparsable_number() {
        let bad = "0, 2, abc, 0.0, 1.0, 1, 0, 0, 0, 1, 0, 0, 0, 1\n";
        assert!(DetectionLog::from_reader(bad.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_decreasing_frames() {
        let bad = "\
2, 2, 0.0, 0.0, 1.0, 1, 0, 0, 0, 1, 0, 0, 0, 1
1, 2, 0.0, 0.0, 1.0, 1, 0, 0, 0, 1, 0, 0, 0, 1
";
        assert!(DetectionLog::from_reader(bad.as_bytes()).is_err());
    }

    #[test]
    fn test_empty_input_is_empty_log() {
        let log = DetectionLog::from_reader("# nothing\n".as_bytes()).unwrap();
        assert!(log.is_empty());
        assert_eq!(log.frames().count(), 0);
    }
}
