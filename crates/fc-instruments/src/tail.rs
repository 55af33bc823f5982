//! Follow an instrument's CSV log as it grows.
//!
//! Vendor software appends one comma-separated record per sample. The source
//! starts at the current end of the file, so historic records and headers are
//! skipped, and only complete (newline-terminated) lines are parsed.

use crate::error::{InstrumentError, InstrumentResult};
use crate::streaming::SampleSource;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Turns one log line (terminator included) into a sample.
///
/// `Ok(None)` marks a line that carries no sample, such as a short or blank
/// record.
pub trait LineParser: Send + 'static {
    fn parse(&self, line: &str) -> InstrumentResult<Option<f64>>;
}

/// Flow meter export: the rate sits in the fourth field wrapped in one
/// leading and two trailing characters, in raw counts that a linear
/// calibration maps to mL/min.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowMeterParser {
    pub slope: f64,
    pub intercept: f64,
}

impl FlowMeterParser {
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }
}

impl LineParser for FlowMeterParser {
    fn parse(&self, line: &str) -> InstrumentResult<Option<f64>> {
        let Some(field) = line.split(',').nth(3) else {
            return Ok(None);
        };
        let raw = trim_chars(field, 1, 2);
        let counts: f64 = raw.trim().parse().map_err(|_| InstrumentError::Parse {
            what: "flow meter record",
            raw: field.to_string(),
        })?;
        Ok(Some(counts * self.slope + self.intercept))
    }
}

/// Temperature controller export: °C in the second field followed by one
/// trailing character.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TemperatureParser;

impl LineParser for TemperatureParser {
    fn parse(&self, line: &str) -> InstrumentResult<Option<f64>> {
        let Some(field) = line.split(',').nth(1) else {
            return Ok(None);
        };
        let raw = trim_chars(field, 0, 1);
        raw.trim()
            .parse()
            .map(Some)
            .map_err(|_| InstrumentError::Parse {
                what: "temperature record",
                raw: field.to_string(),
            })
    }
}

/// Drop `head` chars from the front and `tail` chars from the back.
fn trim_chars(s: &str, head: usize, tail: usize) -> &str {
    let mut chars = s.char_indices();
    let start = chars.nth(head).map_or(s.len(), |(i, _)| i);
    let body = &s[start..];
    let keep = body.chars().count().saturating_sub(tail);
    let end = body.char_indices().nth(keep).map_or(body.len(), |(i, _)| i);
    &body[..end]
}

pub struct TailSource<P> {
    path: PathBuf,
    reader: BufReader<File>,
    pending: String,
    parser: P,
}

impl<P: LineParser> TailSource<P> {
    /// Open `path` and position at its end.
    pub fn open(path: impl AsRef<Path>, parser: P) -> InstrumentResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;
        file.seek(SeekFrom::End(0))?;
        tracing::debug!(path = %path.display(), "tailing instrument log");
        Ok(Self {
            path,
            reader: BufReader::new(file),
            pending: String::new(),
            parser,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<P: LineParser> SampleSource for TailSource<P> {
    fn next_sample(&mut self) -> InstrumentResult<Option<f64>> {
        loop {
            let read = self.reader.read_line(&mut self.pending)?;
            if read == 0 || !self.pending.ends_with('\n') {
                // Partial record: wait for the writer to finish it.
                return Ok(None);
            }
            let mut line = std::mem::take(&mut self.pending);
            if line.ends_with("\r\n") {
                line.truncate(line.len() - 2);
                line.push('\n');
            }
            match self.parser.parse(&line)? {
                Some(sample) => return Ok(Some(sample)),
                None => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn flow_line_is_calibrated() {
        let p = FlowMeterParser::new(0.0038, -0.7274);
        let v = p.parse("10:00:01,ok,1,\"1000\"\n").unwrap().unwrap();
        assert!((v - (1000.0 * 0.0038 - 0.7274)).abs() < 1e-12);
    }

    #[test]
    fn short_lines_carry_no_sample() {
        assert_eq!(FlowMeterParser::new(1.0, 0.0).parse("a,b\n").unwrap(), None);
        assert_eq!(TemperatureParser.parse("\n").unwrap(), None);
    }

    #[test]
    fn temperature_line_drops_terminator() {
        assert_eq!(TemperatureParser.parse("12:00:00,150.25\n").unwrap(), Some(150.25));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = TemperatureParser.parse("12:00:00,hot\n").unwrap_err();
        assert!(matches!(err, InstrumentError::Parse { .. }));
    }

    #[test]
    fn trim_chars_is_char_aware() {
        assert_eq!(trim_chars("\"12\"\n", 1, 2), "12");
        assert_eq!(trim_chars("°5", 1, 0), "5");
        assert_eq!(trim_chars("x", 1, 2), "");
    }

    #[test]
    fn tail_skips_existing_content_and_partial_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Time,Temperature").unwrap();
        writeln!(file, "09:59:59,20.0").unwrap();
        file.flush().unwrap();

        let mut source = TailSource::open(file.path(), TemperatureParser).unwrap();
        assert_eq!(source.next_sample().unwrap(), None);

        write!(file, "10:00:00,14").unwrap();
        file.flush().unwrap();
        assert_eq!(source.next_sample().unwrap(), None);

        writeln!(file, "9.5").unwrap();
        writeln!(file, "10:00:01,150.0").unwrap();
        file.flush().unwrap();
        assert_eq!(source.next_sample().unwrap(), Some(149.5));
        assert_eq!(source.next_sample().unwrap(), Some(150.0));
        assert_eq!(source.next_sample().unwrap(), None);
    }

    #[test]
    fn crlf_records_parse_like_lf() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut source = TailSource::open(file.path(), TemperatureParser).unwrap();
        write!(file, "10:00:00,151.0\r\n").unwrap();
        file.flush().unwrap();
        assert_eq!(source.next_sample().unwrap(), Some(151.0));
    }
}
