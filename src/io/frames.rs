//! Observation stream reader.
//!
//! One CSV row per detected tag, `#` comments allowed, no header:
//!
//! ```text
//! # frame, tag_id, tx, ty, tz, qx, qy, qz, qw
//! 0, 7, 0.01, -0.02, 1.10, 0.0, 0.0, 0.0, 1.0
//! 1, 7, 0.02, -0.02, 1.08, 0.0, 0.0, 0.0, 1.0
//! 1, 12, 0.95, 0.00, 1.20, 0.0, 0.0, 0.0, 1.0
//! ```
//!
//! Consecutive rows sharing a frame value form one [`Frame`]. A row whose tag
//! field is `cam` carries an external camera estimate (`T_world_cam`) for its
//! frame instead of an observation. Malformed rows (bad numbers, invalid
//! rotation, too few fields) never reach the tracker: they are logged and
//! skipped. Only reader failures end the stream with an error.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, Trim};
use tracing::warn;

use crate::geometry::SE3;
use crate::tracking::{Frame, Observation};
use crate::world::TagId;

const FIELDS_PER_ROW: usize = 9;

/// Tag field marking a row as the external camera estimate `T_world_cam`.
const CAMERA_ESTIMATE_TAG: &str = "cam";

/// Iterator over the frames of an observation CSV.
pub struct FrameStream<R: Read> {
    records: StringRecordsIntoIter<R>,
    pending: Option<(u64, Row)>,
}

impl FrameStream<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        Ok(Self::from_reader(file))
    }
}

impl<R: Read> FrameStream<R> {
    pub fn from_reader(reader: R) -> Self {
        let records = ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader)
            .into_records();

        Self {
            records,
            pending: None,
        }
    }

    /// Next usable row, skipping short and invalid ones.
    fn next_row(&mut self) -> Option<Result<(u64, Row)>> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e).context("Failed to read observation row")),
            };
            if let Some(row) = parse_record(&record) {
                return Some(Ok(row));
            }
        }
    }
}

impl<R: Read> Iterator for FrameStream<R> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        let (frame_idx, first) = match self.pending.take() {
            Some(row) => row,
            None => match self.next_row()? {
                Ok(row) => row,
                Err(e) => return Some(Err(e)),
            },
        };

        let mut frame = Frame::default();
        let mut row = first;
        loop {
            match row {
                Row::Tag(obs) => frame.observations.push(obs),
                Row::CameraEstimate(estimate) => frame.camera_estimate = Some(estimate),
            }
            row = match self.next_row() {
                None => break,
                Some(Err(e)) => return Some(Err(e)),
                Some(Ok((idx, next))) if idx == frame_idx => next,
                Some(Ok(next)) => {
                    self.pending = Some(next);
                    break;
                }
            };
        }

        Some(Ok(frame))
    }
}

/// One usable CSV row.
enum Row {
    Tag(Observation),
    CameraEstimate(SE3),
}

fn parse_record(rec: &StringRecord) -> Option<(u64, Row)> {
    let line = rec.position().map_or(0, |p| p.line());
    if rec.len() < FIELDS_PER_ROW {
        warn!("line {}: expected {} fields, got {}; skipped", line, FIELDS_PER_ROW, rec.len());
        return None;
    }

    let Ok(frame_idx) = rec[0].parse::<u64>() else {
        warn!("line {}: bad frame index {:?}; skipped", line, &rec[0]);
        return None;
    };
    let tag = if rec[1].eq_ignore_ascii_case(CAMERA_ESTIMATE_TAG) {
        None
    } else {
        match rec[1].parse::<u32>() {
            Ok(tag) => Some(TagId::new(tag)),
            Err(_) => {
                warn!("line {}: bad tag id {:?}; skipped", line, &rec[1]);
                return None;
            }
        }
    };

    let mut values = [0.0f64; 7];
    for (i, value) in values.iter_mut().enumerate() {
        let field = &rec[i + 2];
        match field.parse() {
            Ok(v) => *value = v,
            Err(_) => {
                warn!("line {}: bad number {:?}; skipped", line, field);
                return None;
            }
        }
    }
    let translation = [values[0], values[1], values[2]];
    let rotation = [values[3], values[4], values[5], values[6]];

    let transform = match SE3::try_from_parts(translation, rotation) {
        Ok(transform) => transform,
        Err(e) => {
            warn!("line {}: {} skipped: {}", line, &rec[1], e);
            return None;
        }
    };

    let row = match tag {
        Some(tag) => Row::Tag(Observation::new(tag, transform)),
        None => Row::CameraEstimate(transform),
    };
    Some((frame_idx, row))
}
