//! Sectioned key/value profile files (`.ini`).
//!
//! Lookups follow the host platform's profile-string rules: section and key
//! names compare ASCII case-insensitively, whitespace around keys and values
//! is ignored, a matching pair of surrounding quotes is stripped, and lines
//! starting with `;` are comments. The first matching section and key win.

use std::borrow::Cow;
use std::fs;
use std::io::ErrorKind;
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// First buffer size tried when reading a value.
pub const INITIAL_BUFFER_SIZE: usize = 1024;

/// Buffer sizes stop doubling once they reach this bound.
pub const MAX_BUFFER_SIZE: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write profile {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{field} must not contain line breaks")]
    LineBreak { field: &'static str },
    #[error("{field} {name:?} would not read back: {reason}")]
    InvalidName {
        field: &'static str,
        name: String,
        reason: &'static str,
    },
}

/// Reads `key` from `section`, or `None` when the file, section or key is
/// missing, the value is empty, or the value is too long for any read buffer.
pub fn read_string(file: &Path, section: &str, key: &str) -> Result<Option<String>, ProfileError> {
    let Some(profile) = Profile::load(file)? else {
        return Ok(None);
    };

    let mut size = INITIAL_BUFFER_SIZE;
    while size < MAX_BUFFER_SIZE {
        let mut buf = vec![0u8; size];
        let copied = profile.copy_value(section, key, &mut buf);
        if copied == 0 {
            return Ok(None);
        }
        if copied != size - 1 {
            return Ok(Some(String::from_utf8_lossy(&buf[..copied]).into_owned()));
        }
        size *= 2;
    }

    tracing::debug!(
        file = %file.display(),
        section,
        key,
        "profile value exceeds the largest read buffer"
    );
    Ok(None)
}

/// Sets `key` in `section`, creating the file, its directory and the section
/// as needed. Other lines are preserved as-is.
///
/// Values with surrounding whitespace or quotes are written quoted so they
/// read back unchanged. An empty value reads back as absent.
pub fn write_string(file: &Path, section: &str, key: &str, value: &str) -> Result<(), ProfileError> {
    for (field, text) in [("section", section), ("key", key), ("value", value)] {
        if text.contains(['\r', '\n']) {
            return Err(ProfileError::LineBreak { field });
        }
    }
    check_name("section", section, ']')?;
    check_name("key", key, '=')?;
    if key.starts_with([';', '[']) {
        return Err(ProfileError::InvalidName {
            field: "key",
            name: key.to_string(),
            reason: "starts like a comment or section header",
        });
    }

    let mut profile = Profile::load(file)?.unwrap_or_default();
    profile.set(section, key, value);

    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).map_err(|source| ProfileError::Write {
            path: file.to_path_buf(),
            source,
        })?;
    }
    fs::write(file, profile.render()).map_err(|source| ProfileError::Write {
        path: file.to_path_buf(),
        source,
    })
}

fn check_name(field: &'static str, name: &str, terminator: char) -> Result<(), ProfileError> {
    let reason = if name.is_empty() {
        "empty"
    } else if name.trim() != name {
        "surrounding whitespace"
    } else if name.contains(terminator) {
        if terminator == ']' {
            "contains ']'"
        } else {
            "contains '='"
        }
    } else {
        return Ok(());
    };
    Err(ProfileError::InvalidName {
        field,
        name: name.to_string(),
        reason,
    })
}

/// Quotes `value` when reading it back would otherwise trim or unquote it.
fn encode_value(value: &str) -> Cow<'_, str> {
    if value.trim() != value || unquote(value).len() != value.len() {
        Cow::Owned(format!("\"{value}\""))
    } else {
        Cow::Borrowed(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Section(String),
    Entry { key: String, value: String },
    Other,
}

fn parse_line(raw: &str) -> Line {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix('[') {
        let name = rest.split(']').next().unwrap_or(rest);
        return Line::Section(name.trim().to_string());
    }
    if trimmed.starts_with(';') {
        return Line::Other;
    }
    match trimmed.split_once('=') {
        Some((key, value)) => Line::Entry {
            key: key.trim().to_string(),
            value: unquote(value.trim()).to_string(),
        },
        None => Line::Other,
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[derive(Debug, Clone)]
struct Profile {
    raw: Vec<String>,
    parsed: Vec<Line>,
    newline: &'static str,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            raw: Vec::new(),
            parsed: Vec::new(),
            newline: if cfg!(windows) { "\r\n" } else { "\n" },
        }
    }
}

impl Profile {
    fn load(path: &Path) -> Result<Option<Self>, ProfileError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ProfileError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Ok(Some(Self::parse(&String::from_utf8_lossy(&bytes))))
    }

    fn parse(contents: &str) -> Self {
        let raw: Vec<String> = contents.lines().map(str::to_string).collect();
        let parsed = raw.iter().map(|line| parse_line(line)).collect();
        let newline = if contents.contains("\r\n") {
            "\r\n"
        } else if contents.contains('\n') {
            "\n"
        } else {
            Self::default().newline
        };
        Self {
            raw,
            parsed,
            newline,
        }
    }

    /// Line range of the first section called `name`, header excluded.
    fn section_range(&self, name: &str) -> Option<Range<usize>> {
        let header = self.parsed.iter().position(
            |line| matches!(line, Line::Section(s) if s.eq_ignore_ascii_case(name)),
        )?;
        let start = header + 1;
        let end = self.parsed[start..]
            .iter()
            .position(|line| matches!(line, Line::Section(_)))
            .map(|offset| start + offset)
            .unwrap_or(self.parsed.len());
        Some(start..end)
    }

    fn find_entry(&self, section: &str, key: &str) -> Option<usize> {
        let range = self.section_range(section)?;
        range.into_iter().find(
            |&idx| matches!(&self.parsed[idx], Line::Entry { key: k, .. } if k.eq_ignore_ascii_case(key)),
        )
    }

    fn value(&self, section: &str, key: &str) -> Option<&str> {
        match &self.parsed[self.find_entry(section, key)?] {
            Line::Entry { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Copies the value into `buf` the way the platform profile API does:
    /// truncated to `buf.len() - 1` bytes and NUL-terminated. Returns the
    /// number of bytes copied, excluding the terminator.
    fn copy_value(&self, section: &str, key: &str, buf: &mut [u8]) -> usize {
        let Some(last) = buf.len().checked_sub(1) else {
            return 0;
        };
        let value = self.value(section, key).unwrap_or_default().as_bytes();
        let copied = value.len().min(last);
        buf[..copied].copy_from_slice(&value[..copied]);
        buf[copied] = 0;
        copied
    }

    fn set(&mut self, section: &str, key: &str, value: &str) {
        let line = format!("{key}={}", encode_value(value));
        let entry = parse_line(&line);

        if let Some(idx) = self.find_entry(section, key) {
            self.raw[idx] = line;
            self.parsed[idx] = entry;
            return;
        }

        if let Some(range) = self.section_range(section) {
            // insert after the last non-blank line so trailing spacing stays put
            let insert_at = range
                .clone()
                .rev()
                .find(|&idx| !self.raw[idx].trim().is_empty())
                .map(|idx| idx + 1)
                .unwrap_or(range.start);
            self.raw.insert(insert_at, line);
            self.parsed.insert(insert_at, entry);
            return;
        }

        if self.raw.last().is_some_and(|last| !last.trim().is_empty()) {
            self.raw.push(String::new());
            self.parsed.push(Line::Other);
        }
        self.raw.push(format!("[{section}]"));
        self.parsed.push(Line::Section(section.to_string()));
        self.raw.push(line);
        self.parsed.push(entry);
    }

    fn render(&self) -> String {
        let mut out = self.raw.join(self.newline);
        out.push_str(self.newline);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
; comment line
[General]
Name = Example Plugin
Quoted = \"  spaced  \"
empty=

[Limits]
MaxLaps=12
";

    fn write_sample(dir: &Path) -> PathBuf {
        let path = dir.join("sample.ini");
        fs::write(&path, SAMPLE).unwrap();
        path
    }

    #[test]
    fn reads_values_case_insensitively() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_sample(tmp.path());

        assert_eq!(
            read_string(&path, "general", "NAME").unwrap().as_deref(),
            Some("Example Plugin")
        );
        assert_eq!(
            read_string(&path, "Limits", "maxlaps").unwrap().as_deref(),
            Some("12")
        );
    }

    #[test]
    fn strips_matching_quotes_only() {
        assert_eq!(unquote("\"abc\""), "abc");
        assert_eq!(unquote("'abc'"), "abc");
        assert_eq!(unquote("\"abc'"), "\"abc'");
        assert_eq!(unquote("\""), "\"");

        let tmp = tempfile::tempdir().unwrap();
        let path = write_sample(tmp.path());
        assert_eq!(
            read_string(&path, "General", "Quoted").unwrap().as_deref(),
            Some("  spaced  ")
        );
    }

    #[test]
    fn missing_things_are_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_sample(tmp.path());

        assert_eq!(read_string(&path, "General", "nope").unwrap(), None);
        assert_eq!(read_string(&path, "Nope", "Name").unwrap(), None);
        assert_eq!(read_string(&path, "General", "empty").unwrap(), None);
        assert_eq!(
            read_string(&tmp.path().join("missing.ini"), "General", "Name").unwrap(),
            None
        );
    }

    #[test]
    fn keys_outside_their_section_are_not_found() {
        let profile = Profile::parse("orphan=1\n[A]\nx=1\n[B]\ny=2\n");
        assert_eq!(profile.value("A", "orphan"), None);
        assert_eq!(profile.value("A", "y"), None);
        assert_eq!(profile.value("B", "y"), Some("2"));
    }

    #[test]
    fn long_values_grow_the_read_buffer() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("long.ini");
        // exactly fills the first buffer, forcing a larger read
        let long = "x".repeat(INITIAL_BUFFER_SIZE - 1);
        let longer = "y".repeat(INITIAL_BUFFER_SIZE * 5);
        fs::write(&path, format!("[S]\na={long}\nb={longer}\n")).unwrap();

        assert_eq!(read_string(&path, "S", "a").unwrap(), Some(long));
        assert_eq!(read_string(&path, "S", "b").unwrap(), Some(longer));
    }

    #[test]
    fn values_larger_than_every_buffer_are_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("huge.ini");
        let huge = "z".repeat(MAX_BUFFER_SIZE);
        fs::write(&path, format!("[S]\nhuge={huge}\n")).unwrap();

        assert_eq!(read_string(&path, "S", "huge").unwrap(), None);
    }

    #[test]
    fn copy_value_truncates_and_terminates() {
        let profile = Profile::parse("[S]\nk=abcdef\n");
        let mut buf = [0xffu8; 4];
        assert_eq!(profile.copy_value("S", "k", &mut buf), 3);
        assert_eq!(&buf, b"abc\0");
        assert_eq!(profile.copy_value("S", "k", &mut []), 0);
    }

    #[test]
    fn write_updates_in_place_and_preserves_other_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_sample(tmp.path());

        write_string(&path, "general", "name", "Renamed").unwrap();
        write_string(&path, "General", "Added", "1").unwrap();
        write_string(&path, "New", "key", "value").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("; comment line\n[General]\nname=Renamed\n"));
        assert!(contents.contains("empty=\nAdded=1\n\n[Limits]"));
        assert!(contents.ends_with("MaxLaps=12\n\n[New]\nkey=value\n"));
        assert_eq!(
            read_string(&path, "General", "Name").unwrap().as_deref(),
            Some("Renamed")
        );
    }

    #[test]
    fn write_creates_missing_file_and_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Plugins").join("Example").join("Example.ini");

        write_string(&path, "section1", "foo", "100").unwrap();

        assert_eq!(
            read_string(&path, "section1", "foo").unwrap().as_deref(),
            Some("100")
        );
    }

    #[test]
    fn write_rejects_line_breaks() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("x.ini");
        let result = write_string(&path, "S", "k", "two\nlines");
        assert!(matches!(
            result,
            Err(ProfileError::LineBreak { field: "value" })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn padded_and_quoted_values_survive_a_rewrite() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("quoted.ini");

        for value in ["  padded  ", "\"quoted\"", "'x'", "a\"b", "\"", " \""] {
            write_string(&path, "S", "k", value).unwrap();
            assert_eq!(read_string(&path, "S", "k").unwrap().as_deref(), Some(value));
        }

        write_string(&path, "S", "plain", "as is").unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("plain=as is"));
    }

    #[test]
    fn write_rejects_names_that_cannot_be_found_again() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("names.ini");

        for (section, key, field) in [
            ("v2]x", "k", "section"),
            (" S", "k", "section"),
            ("", "k", "section"),
            ("S", "a=b", "key"),
            ("S", " k", "key"),
            ("S", "", "key"),
            ("S", ";k", "key"),
            ("S", "[k", "key"),
        ] {
            let result = write_string(&path, section, key, "1");
            assert!(
                matches!(&result, Err(ProfileError::InvalidName { field: f, .. }) if *f == field),
                "{section:?}/{key:?} gave {result:?}"
            );
        }
        assert!(!path.exists());
    }

    #[test]
    fn crlf_files_keep_crlf() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("crlf.ini");
        fs::write(&path, "[S]\r\na=1\r\n").unwrap();

        write_string(&path, "S", "b", "2").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[S]\r\na=1\r\nb=2\r\n");
    }
}
