use crate::candidate::record::{BeamMask, Candidate};
use crate::prelude::{CoreError, CoreResult};
use std::io::BufRead;

/// Column count of a plain single-beam candidate file.
pub const SINGLE_BEAM_COLUMNS: usize = 10;
/// Column count of a coincidenced multi-beam candidate file.
pub const COINCIDENCE_COLUMNS: usize = 14;

/// Reads whitespace-separated candidate records.
///
/// Two layouts are accepted, chosen per line by column count:
///
/// ```text
/// snr samp_idx time filter dm_trial dm members begin end beam
/// snr samp_idx time filter dm_trial dm members begin end nbeams beam_mask prim_beam max_snr beam
/// ```
///
/// Beam numbers on disk are 1-based and are returned 0-based. Blank lines and
/// lines starting with `#` are skipped.
pub fn read_candidates<R: BufRead>(reader: R) -> CoreResult<Vec<Candidate>> {
    let mut candidates = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|err| CoreError::Parse {
            line: line_no,
            reason: err.to_string(),
        })?;
        if let Some(candidate) = parse_line(&line, line_no)? {
            candidates.push(candidate);
        }
    }
    Ok(candidates)
}

/// Convenience wrapper over [`read_candidates`] for in-memory text.
pub fn parse_candidates(text: &str) -> CoreResult<Vec<Candidate>> {
    read_candidates(text.as_bytes())
}

fn parse_line(line: &str, line_no: usize) -> CoreResult<Option<Candidate>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    let cols = Columns {
        fields: &fields,
        line: line_no,
    };

    match fields.len() {
        SINGLE_BEAM_COLUMNS => {
            let beam = cols.beam(9, "beam")?;
            Ok(Some(Candidate::single_beam(
                cols.float(0, "snr")? as f32,
                cols.int(1, "samp_idx")?,
                cols.float(2, "time")?,
                cols.narrow(3, "filter")?,
                cols.narrow(4, "dm_trial")?,
                cols.float(5, "dm")? as f32,
                cols.narrow(6, "members")?,
                cols.int(7, "begin")?,
                cols.int(8, "end")?,
                beam,
            )))
        }
        COINCIDENCE_COLUMNS => Ok(Some(Candidate {
            snr: cols.float(0, "snr")? as f32,
            sample_index: cols.int(1, "samp_idx")?,
            time: cols.float(2, "time")?,
            filter_width: cols.narrow(3, "filter")?,
            dm_trial: cols.narrow(4, "dm_trial")?,
            dm: cols.float(5, "dm")? as f32,
            members: cols.narrow(6, "members")?,
            begin: cols.int(7, "begin")?,
            end: cols.int(8, "end")?,
            nbeams_detected: cols.narrow(9, "nbeams")?,
            beam_mask: BeamMask(cols.int(10, "beam_mask")?),
            primary_beam: cols.beam(11, "prim_beam")?,
            max_snr: cols.float(12, "max_snr")? as f32,
            beam: cols.beam(13, "beam")?,
        })),
        other => Err(CoreError::Parse {
            line: line_no,
            reason: format!(
                "expected {} or {} columns, found {}",
                SINGLE_BEAM_COLUMNS, COINCIDENCE_COLUMNS, other
            ),
        }),
    }
}

struct Columns<'a> {
    fields: &'a [&'a str],
    line: usize,
}

impl Columns<'_> {
    fn error(&self, column: &str, reason: String) -> CoreError {
        CoreError::Parse {
            line: self.line,
            reason: format!("column '{}': {}", column, reason),
        }
    }

    fn float(&self, idx: usize, column: &str) -> CoreResult<f64> {
        let raw = self.fields[idx];
        raw.parse::<f64>()
            .map_err(|err| self.error(column, format!("'{}' ({})", raw, err)))
    }

    /// Integer columns are sometimes written as integral floats (`12.0`).
    fn int(&self, idx: usize, column: &str) -> CoreResult<u64> {
        let raw = self.fields[idx];
        if let Ok(value) = raw.parse::<u64>() {
            return Ok(value);
        }
        let value = self.float(idx, column)?;
        if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
            Ok(value as u64)
        } else {
            Err(self.error(
                column,
                format!("'{}' is not a non-negative integer", raw),
            ))
        }
    }

    fn narrow(&self, idx: usize, column: &str) -> CoreResult<u32> {
        let value = self.int(idx, column)?;
        u32::try_from(value).map_err(|_| self.error(column, format!("{} out of range", value)))
    }

    fn beam(&self, idx: usize, column: &str) -> CoreResult<u32> {
        let one_based = self.narrow(idx, column)?;
        one_based
            .checked_sub(1)
            .ok_or_else(|| self.error(column, "beam numbers are 1-based, found 0".to_string()))
    }
}
