use anyhow::Context;
use std::path::Path;

use super::{end_marker, normalize_newlines, Framing, END_PREFIX, LENGTH_KEY, START_PREFIX};
use crate::{HarvestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    Inside,
}

/// Line-driven splitter for sentinel-framed documents.
///
/// Lenient mode follows the marker lines without complaint: a start marker always opens
/// a fresh section (dropping an open one), an end marker closes the open section, lines
/// outside sections are dropped and an unterminated section at the end is lost. Strict
/// mode reports each of those cases as [`HarvestError::MalformedDocument`].
#[derive(Debug)]
pub struct Segmenter {
    state: State,
    buffer: Vec<String>,
    sections: Vec<String>,
    strict: bool,
    line: usize,
}

impl Segmenter {
    pub fn new(strict: bool) -> Self {
        Self {
            state: State::Outside,
            buffer: Vec::new(),
            sections: Vec::new(),
            strict,
            line: 0,
        }
    }

    /// Feed one line, without its line terminator
    pub fn feed(&mut self, line: &str) -> Result<()> {
        self.line += 1;

        if line.starts_with(START_PREFIX) {
            if self.state == State::Inside {
                if self.strict {
                    return Err(self.malformed("start marker inside an open section"));
                }
                tracing::debug!("Start marker at line {} discards the open section", self.line);
            }
            self.buffer.clear();
            self.state = State::Inside;
        } else if line.starts_with(END_PREFIX) {
            match self.state {
                State::Inside => {
                    self.sections.push(self.buffer.join("\n"));
                    self.buffer.clear();
                    self.state = State::Outside;
                }
                State::Outside if self.strict => {
                    return Err(self.malformed("end marker without a start marker"));
                }
                State::Outside => {}
            }
        } else if self.state == State::Inside {
            self.buffer.push(line.to_string());
        }

        Ok(())
    }

    /// Sections in encounter order
    pub fn finish(self) -> Result<Vec<String>> {
        if self.state == State::Inside {
            if self.strict {
                return Err(self.malformed("section not terminated before end of input"));
            }
            tracing::debug!("Dropping unterminated section at end of input");
        }
        Ok(self.sections)
    }

    fn malformed(&self, reason: &str) -> anyhow::Error {
        HarvestError::MalformedDocument {
            line: self.line,
            reason: reason.to_string(),
        }
        .into()
    }
}

fn segment_sentinel(text: &str, strict: bool) -> Result<Vec<String>> {
    let mut segmenter = Segmenter::new(strict);
    for line in text.lines() {
        segmenter.feed(line)?;
    }
    segmenter.finish()
}

/// Next line starting at byte `pos`, without its terminator, and where the following line starts
fn next_line(text: &str, pos: usize) -> Option<(&str, usize)> {
    if pos >= text.len() {
        return None;
    }
    let rest = &text[pos..];
    let (line, advance) = match rest.find('\n') {
        Some(i) => (&rest[..i], i + 1),
        None => (rest, rest.len()),
    };
    Some((line.strip_suffix('\r').unwrap_or(line), pos + advance))
}

/// Split a `START <name> ----- length=<n>` marker into name and byte count
fn parse_frame_header(line: &str) -> Option<(&str, usize)> {
    let (marker, length) = line.rsplit_once(LENGTH_KEY)?;
    let name = marker
        .strip_prefix(START_PREFIX)?
        .strip_prefix(' ')?
        .strip_suffix(" -----")?;
    Some((name, length.trim().parse().ok()?))
}

fn invalid_frame(name: &str, reason: impl Into<String>) -> anyhow::Error {
    HarvestError::InvalidFrame {
        name: name.to_string(),
        reason: reason.into(),
    }
    .into()
}

fn segment_length_prefixed(text: &str, strict: bool) -> Result<Vec<String>> {
    let mut sections = Vec::new();
    let mut pos = 0;
    let mut line_no = 0;

    while let Some((line, next)) = next_line(text, pos) {
        line_no += 1;
        pos = next;

        if line.starts_with(START_PREFIX) {
            let (name, length) = parse_frame_header(line)
                .ok_or_else(|| invalid_frame(line, "start marker has no length"))?;

            let end = pos
                .checked_add(length)
                .filter(|end| text.is_char_boundary(*end) && *end <= text.len())
                .ok_or_else(|| invalid_frame(name, format!("content shorter than {} bytes", length)))?;
            let content = &text[pos..end];

            let trailer = format!("\n{}", end_marker(name));
            if !text[end..].starts_with(&trailer) {
                return Err(invalid_frame(name, "end marker does not follow the content"));
            }

            line_no += content.matches('\n').count() + 2;
            sections.push(normalize_newlines(content));
            pos = end + 1;
            // Skip the end marker line itself
            pos = next_line(text, pos).map(|(_, after)| after).unwrap_or(text.len());
        } else if strict && line.starts_with(END_PREFIX) {
            return Err(HarvestError::MalformedDocument {
                line: line_no,
                reason: "end marker without a start marker".to_string(),
            }
            .into());
        }
    }

    Ok(sections)
}

/// Split a merged document into sections, in encounter order
pub fn segment(text: &str, framing: Framing, strict: bool) -> Result<Vec<String>> {
    match framing {
        Framing::Sentinel => segment_sentinel(text, strict),
        Framing::LengthPrefixed => segment_length_prefixed(text, strict),
    }
}

/// Segment the document at `input` and write its sections, last first, to the CSV at `output`
pub fn segment_file(input: &Path, output: &Path, framing: Framing, strict: bool) -> Result<usize> {
    let text = fs_err::read_to_string(input).context("Failed to read merged document")?;

    let mut sections = segment(&text, framing, strict)?;
    sections.reverse();

    crate::output::write_section_table(output, &sections)?;
    tracing::info!("Wrote {} sections to {}", sections.len(), output.display());
    Ok(sections.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{merge_into, TextFilter};

    fn merged(files: &[(&str, &str)], framing: Framing) -> String {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs_err::write(dir.path().join(name), content).unwrap();
        }
        let mut out = Vec::new();
        merge_into(dir.path(), &mut out, &TextFilter::default(), framing, None).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_merge_then_segment_keeps_name_order() {
        let doc = merged(&[("b.txt", "B-content"), ("a.txt", "A-content"), ("c.txt", "C-content")], Framing::Sentinel);
        let sections = segment(&doc, Framing::Sentinel, false).unwrap();
        assert_eq!(sections, ["A-content", "B-content", "C-content"]);
    }

    #[test]
    fn test_multiline_content_and_crlf() {
        let doc = merged(&[("a.txt", "line one\r\nline two\n")], Framing::Sentinel);
        let sections = segment(&doc, Framing::Sentinel, false).unwrap();
        assert_eq!(sections, ["line one\nline two\n"]);
    }

    #[test]
    fn test_content_end_marker_terminates_section_early() {
        let doc = merged(&[("a.txt", "before\n----- END of story\nafter")], Framing::Sentinel);
        let sections = segment(&doc, Framing::Sentinel, false).unwrap();
        assert_eq!(sections, ["before"]);
    }

    #[test]
    fn test_repeated_start_discards_open_section() {
        let doc = "----- START a -----\nlost\n----- START b -----\nkept\n----- END b -----\n";
        assert_eq!(segment(doc, Framing::Sentinel, false).unwrap(), ["kept"]);
        assert!(segment(doc, Framing::Sentinel, true).is_err());
    }

    #[test]
    fn test_unterminated_section_is_dropped() {
        let doc = "----- START a -----\ndone\n----- END a -----\n----- START b -----\ndangling\n";
        assert_eq!(segment(doc, Framing::Sentinel, false).unwrap(), ["done"]);

        let err = segment(doc, Framing::Sentinel, true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarvestError>(),
            Some(HarvestError::MalformedDocument { line: 5, .. })
        ));
    }

    #[test]
    fn test_lines_outside_sections_and_stray_end() {
        let doc = "preamble\n----- END x -----\n----- START a -----\nbody\n----- END a -----\ntrailer\n";
        assert_eq!(segment(doc, Framing::Sentinel, false).unwrap(), ["body"]);
        assert!(segment(doc, Framing::Sentinel, true).is_err());
    }

    #[test]
    fn test_length_prefixed_survives_marker_lines_in_content() {
        let files = [
            ("a.txt", "before\n----- END of story\nafter"),
            ("b.txt", "----- START fake -----\n"),
        ];
        let doc = merged(&files, Framing::LengthPrefixed);
        let sections = segment(&doc, Framing::LengthPrefixed, true).unwrap();
        assert_eq!(sections, ["before\n----- END of story\nafter", "----- START fake -----\n"]);
    }

    #[test]
    fn test_framings_agree_on_plain_content() {
        let files = [("x.txt", "hello\r\nthere\n"), ("y.txt", "world"), ("z.txt", "")];
        let sentinel = segment(&merged(&files, Framing::Sentinel), Framing::Sentinel, true).unwrap();
        let framed = segment(&merged(&files, Framing::LengthPrefixed), Framing::LengthPrefixed, true).unwrap();
        assert_eq!(sentinel, framed);
    }

    #[test]
    fn test_length_prefixed_rejects_truncated_document() {
        let doc = "\n----- START a.txt ----- length=50\nshort\n----- END a.txt -----\n";
        let err = segment(doc, Framing::LengthPrefixed, false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarvestError>(),
            Some(HarvestError::InvalidFrame { .. })
        ));
    }

    #[test]
    fn test_length_prefixed_rejects_overflowing_length() {
        let doc = format!(
            "\n----- START a.txt ----- length={}\nx\n----- END a.txt -----\n",
            usize::MAX
        );
        let err = segment(&doc, Framing::LengthPrefixed, false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarvestError>(),
            Some(HarvestError::InvalidFrame { .. })
        ));
    }

    #[test]
    fn test_segment_file_writes_reversed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("merged_output.txt");
        let output = dir.path().join("merged_for_sheets.csv");
        fs_err::write(&input, merged(&[("x.txt", "hello"), ("y.txt", "world")], Framing::Sentinel)).unwrap();

        let rows = segment_file(&input, &output, Framing::Sentinel, false).unwrap();

        assert_eq!(rows, 2);
        assert_eq!(fs_err::read_to_string(&output).unwrap(), "\"world\"\r\n\"hello\"\r\n");
    }
}
