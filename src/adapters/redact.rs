//! Log redaction for clinical readings and identifiers.
//!
//! Formatted log lines pass through [`RedactingMakeWriter`], which replaces:
//! - Blood pressure readings (`142/91 mmHg`, `ap_hi=142`)
//! - BMI values (`bmi=31.2`, `BMI: 31.2`)
//! - UUIDs, emails, SSN- and MRN-like identifiers
//! - Hex or base64 key material
//!
//! Structured logging that never carries raw readings remains the primary
//! protection; this is a fallback at the sink.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

/// Per-call cap on redacted input. Longer input is truncated.
const DEFAULT_REDACT_MAX_BYTES: usize = 16 * 1024;

static RULES: OnceLock<Rules> = OnceLock::new();

struct Rules {
    set: RegexSet,
    patterns: Vec<(Regex, &'static str)>,
}

const RULE_TABLE: &[(&str, &str)] = &[
    (
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
        "[REDACTED-UUID]",
    ),
    (r"\b\d{3}-\d{2}-\d{4}\b", "[REDACTED-SSN]"),
    (r"\bMRN[:\s]?\d{6,10}\b", "[REDACTED-MRN]"),
    (
        r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
    (r"\b\d{2,3}\s?/\s?\d{2,3}\s?mmHg\b", "[REDACTED-BP]"),
    (
        r"(?i)\b(?:ap_hi|ap_lo|systolic|diastolic)\b\s*[:=]\s*\d+(?:\.\d+)?",
        "[REDACTED-BP]",
    ),
    (r"(?i)\bbmi\b\s*[:=]\s*\d+(?:\.\d+)?", "[REDACTED-BMI]"),
    (
        r"(?i)\b(?:private[_-]?key|secret|seed|signing[_-]?key|token)\b\s*[:=]\s*[A-Za-z0-9+/]{32,}={0,2}",
        "[REDACTED-SECRET]",
    ),
    (r"\b[0-9a-fA-F]{32,}\b", "[REDACTED-KEY]"),
];

fn rules() -> &'static Rules {
    RULES.get_or_init(|| {
        let set = RegexSet::new(RULE_TABLE.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let patterns = RULE_TABLE
            .iter()
            .map(|(p, r)| (Regex::new(p).expect("Valid regex"), *r))
            .collect();
        Rules { set, patterns }
    })
}

fn max_redact_bytes() -> usize {
    std::env::var("CARDIORISK_REDACT_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_REDACT_MAX_BYTES)
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Redact clinical readings and identifiers from the first `max_bytes` of `input`.
fn redact(input: &str, max_bytes: usize) -> String {
    let rules = rules();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut out = prefix.to_string();
    for idx in rules.set.matches(prefix).into_iter() {
        let (regex, replacement) = &rules.patterns[idx];
        out = regex.replace_all(&out, *replacement).into_owned();
    }

    if truncated {
        out.push_str(" [TRUNCATED]");
    }
    out
}

/// A `tracing_subscriber` writer wrapper that redacts each formatted log line
/// before it reaches the underlying sink.
#[derive(Debug, Clone)]
pub struct RedactingMakeWriter<M> {
    inner: M,
}

impl<M> RedactingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

pub struct RedactingWriter<W: std::io::Write> {
    inner: W,
    buffer: Vec<u8>,
    max_bytes: usize,
}

impl<W: std::io::Write> RedactingWriter<W> {
    fn write_complete_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let redacted = redact(&String::from_utf8_lossy(&line), self.max_bytes);
            self.inner.write_all(redacted.as_bytes())?;
        }
        Ok(())
    }

    fn write_remainder(&mut self) -> std::io::Result<()> {
        if !self.buffer.is_empty() {
            let rest = redact(&String::from_utf8_lossy(&self.buffer), self.max_bytes);
            self.inner.write_all(rest.as_bytes())?;
            self.buffer.clear();
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        self.write_complete_lines()?;

        // An unterminated line larger than the cap is flushed early (redacted, truncated).
        if self.buffer.len() > self.max_bytes.saturating_mul(2) {
            self.write_remainder()?;
            self.inner.write_all(b"\n")?;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.write_complete_lines()?;
        self.write_remainder()?;
        self.inner.flush()
    }
}

impl<W: std::io::Write> Drop for RedactingWriter<W> {
    fn drop(&mut self) {
        let _ = self.write_remainder();
    }
}

impl<'a, M> MakeWriter<'a> for RedactingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = RedactingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: self.inner.make_writer(),
            buffer: Vec::new(),
            max_bytes: max_redact_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn redact_default(input: &str) -> String {
        redact(input, DEFAULT_REDACT_MAX_BYTES)
    }

    #[test]
    fn test_redact_blood_pressure() {
        let out = redact_default("reading 142/91 mmHg recorded");
        assert!(out.contains("[REDACTED-BP]"));
        assert!(!out.contains("142"));

        let out = redact_default("features ap_hi=150 ap_lo: 95");
        assert!(!out.contains("150"));
        assert!(!out.contains("95"));
    }

    #[test]
    fn test_redact_bmi() {
        let out = redact_default("derived bmi=31.14 for request");
        assert!(out.contains("[REDACTED-BMI]"));
        assert!(!out.contains("31.14"));
    }

    #[test]
    fn test_redact_identifiers() {
        let out =
            redact_default("patient 550e8400-e29b-41d4-a716-446655440000 MRN:12345678 a@b.org");
        assert!(out.contains("[REDACTED-UUID]"));
        assert!(out.contains("[REDACTED-MRN]"));
        assert!(out.contains("[REDACTED-EMAIL]"));
    }

    #[test]
    fn test_redact_key_material() {
        let out = redact_default("manifest sha 0123456789abcdef0123456789abcdef");
        assert!(out.contains("[REDACTED-KEY]"));
    }

    #[test]
    fn test_plain_text_untouched() {
        let line = "Loaded classifier (n_features=11, threshold=0.5)";
        assert_eq!(redact_default(line), line);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let out = redact("≥≥≥≥", 4);
        assert!(out.starts_with('≥'));
        assert!(out.ends_with("[TRUNCATED]"));
    }

    #[test]
    fn test_writer_redacts_per_line() {
        let mut sink = Vec::new();
        {
            let mut writer = RedactingWriter {
                inner: &mut sink,
                buffer: Vec::new(),
                max_bytes: DEFAULT_REDACT_MAX_BYTES,
            };
            writer.write_all(b"first systolic=").expect("write");
            writer.write_all(b"150\nsecond ok").expect("write");
            writer.flush().expect("flush");
        }

        let text = String::from_utf8(sink).expect("utf8");
        assert_eq!(text, "first [REDACTED-BP]\nsecond ok");
    }

    #[test]
    fn test_writer_keeps_complete_lines_when_buffer_overflows() {
        let mut sink = Vec::new();
        {
            let mut writer = RedactingWriter {
                inner: &mut sink,
                buffer: Vec::new(),
                max_bytes: 16,
            };
            writer
                .write_all(b"line one is ok\nline two is ok\nline 3 is ok\npartial")
                .expect("write");
            writer.flush().expect("flush");
        }

        let text = String::from_utf8(sink).expect("utf8");
        assert_eq!(text, "line one is ok\nline two is ok\nline 3 is ok\npartial");
    }

    #[test]
    fn test_writer_truncates_oversized_unterminated_line() {
        let mut sink = Vec::new();
        {
            let mut writer = RedactingWriter {
                inner: &mut sink,
                buffer: Vec::new(),
                max_bytes: 8,
            };
            writer.write_all(b"short\n").expect("write");
            writer.write_all(&[b'x'; 20]).expect("write");
        }

        let text = String::from_utf8(sink).expect("utf8");
        assert_eq!(text, "short\nxxxxxxxx [TRUNCATED]\n");
    }
}
