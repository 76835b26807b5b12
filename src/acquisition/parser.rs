//! Inbound line protocol
//!
//! The sensor board prints one reading per line as ASCII
//! `x,y,z\r\n`. Anything else (boot banners, half lines after a flush,
//! timed-out partial reads) is skipped with an explicit reason so the
//! caller can count and log it without touching any window.

use crate::types::RawTriple;

/// Number of comma-separated fields in a valid line.
pub const FIELDS_PER_LINE: usize = 3;

/// Result of decoding one inbound line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParseOutcome {
    Sample(RawTriple),
    Skip(SkipReason),
}

/// Why a line did not produce a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing but a line terminator
    Empty,
    /// Bytes were not valid UTF-8
    Decode,
    /// Wrong number of comma-separated fields
    Arity(usize),
    /// Field at this index is not a number
    Number { field: usize },
    /// Field at this index parsed to NaN or infinity
    NonFinite { field: usize },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Empty => write!(f, "empty line"),
            SkipReason::Decode => write!(f, "invalid UTF-8"),
            SkipReason::Arity(n) => write!(f, "expected {FIELDS_PER_LINE} fields, got {n}"),
            SkipReason::Number { field } => write!(f, "field {field} is not a number"),
            SkipReason::NonFinite { field } => write!(f, "field {field} is not finite"),
        }
    }
}

/// Decode one raw line into a reading.
pub fn parse_triple(line: &[u8]) -> ParseOutcome {
    let line = strip_terminator(line);
    if line.is_empty() {
        return ParseOutcome::Skip(SkipReason::Empty);
    }

    let Ok(text) = std::str::from_utf8(line) else {
        return ParseOutcome::Skip(SkipReason::Decode);
    };

    let fields: Vec<&str> = text.split(',').collect();
    if fields.len() != FIELDS_PER_LINE {
        return ParseOutcome::Skip(SkipReason::Arity(fields.len()));
    }

    let mut values = [0.0_f64; FIELDS_PER_LINE];
    for (field, (raw, slot)) in fields.iter().zip(values.iter_mut()).enumerate() {
        let Ok(value) = raw.trim().parse::<f64>() else {
            return ParseOutcome::Skip(SkipReason::Number { field });
        };
        if !value.is_finite() {
            return ParseOutcome::Skip(SkipReason::NonFinite { field });
        }
        *slot = value;
    }

    ParseOutcome::Sample(RawTriple::new(values[0], values[1], values[2]))
}

fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
