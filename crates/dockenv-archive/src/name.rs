//! Entry name rewriting
//!
//! Archives copied out of a container are rooted at the basename of the
//! requested path: copying `/data/logs` yields `logs/`, `logs/a.log`, ...
//! The helpers here turn those names into names relative to the requested
//! directory itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the leading part of each entry name is removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StripMode {
    /// Strip the longest leading run of characters drawn from
    /// `basename + "/"`.
    ///
    /// This over-strips when a child name starts with characters that also
    /// occur in the basename: with basename `logs`, `logs/slogs_extra`
    /// becomes `_extra`. Existing consumers depend on the exact output, so
    /// it stays the default.
    #[default]
    CharClass,

    /// Strip the literal `basename + "/"` prefix. The entry naming the
    /// requested directory itself becomes empty.
    Prefix,
}

impl StripMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StripMode::CharClass => "char-class",
            StripMode::Prefix => "prefix",
        }
    }
}

impl fmt::Display for StripMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StripMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "char-class" | "char_class" | "charclass" => Ok(StripMode::CharClass),
            "prefix" => Ok(StripMode::Prefix),
            _ => Err(format!(
                "Invalid strip mode '{}'. Valid options: char-class, prefix",
                s
            )),
        }
    }
}

/// Final element of a slash-separated path.
///
/// Trailing slashes are ignored, an empty path yields `.` and a path made
/// only of slashes yields `/`.
pub fn basename(path: &str) -> &str {
    if path.is_empty() {
        return ".";
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Remove every leading character of `name` that occurs in `basename` or is
/// a `/`.
///
/// Works on raw bytes since tar names are not guaranteed to be UTF-8. An
/// invalid byte sequence counts as U+FFFD, so it only matches when the
/// basename itself contains the replacement character.
pub fn strip_char_class<'a>(name: &'a [u8], basename: &str) -> &'a [u8] {
    let in_set = |c: char| c == '/' || basename.contains(c);

    let mut offset = 0;
    for chunk in name.utf8_chunks() {
        let valid = chunk.valid();
        for (idx, c) in valid.char_indices() {
            if !in_set(c) {
                return &name[offset + idx..];
            }
        }
        offset += valid.len();

        let invalid = chunk.invalid();
        if !invalid.is_empty() {
            if !in_set(char::REPLACEMENT_CHARACTER) {
                return &name[offset..];
            }
            offset += invalid.len();
        }
    }
    &name[name.len()..]
}

/// Remove the literal `basename/` prefix from `name`.
///
/// `basename` and `basename/` both map to the empty name. Names outside the
/// requested directory are returned unchanged.
pub fn strip_prefix<'a>(name: &'a [u8], basename: &str) -> &'a [u8] {
    if basename == "/" {
        return name.strip_prefix(b"/").unwrap_or(name);
    }

    let Some(rest) = name.strip_prefix(basename.as_bytes()) else {
        return name;
    };
    if rest.is_empty() {
        return rest;
    }
    match rest.strip_prefix(b"/") {
        Some(child) => child,
        None => name,
    }
}

/// Per-call rewrite state: the requested path, its basename and the mode.
///
/// The basename is computed once and applied to every entry of the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebaseContext {
    requested_path: String,
    basename: String,
    mode: StripMode,
}

impl RebaseContext {
    pub fn new(requested_path: impl Into<String>, mode: StripMode) -> Self {
        let requested_path = requested_path.into();
        let basename = basename(&requested_path).to_string();
        RebaseContext {
            requested_path,
            basename,
            mode,
        }
    }

    pub fn requested_path(&self) -> &str {
        &self.requested_path
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    pub fn mode(&self) -> StripMode {
        self.mode
    }

    /// Rewrite one entry name.
    pub fn rewrite<'a>(&self, name: &'a [u8]) -> &'a [u8] {
        match self.mode {
            StripMode::CharClass => strip_char_class(name, &self.basename),
            StripMode::Prefix => strip_prefix(name, &self.basename),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basename() {
        assert_eq!(basename("/data/logs"), "logs");
        assert_eq!(basename("/data/logs/"), "logs");
        assert_eq!(basename("/data/logs//"), "logs");
        assert_eq!(basename("logs"), "logs");
        assert_eq!(basename("/etc/hosts"), "hosts");
        assert_eq!(basename("/"), "/");
        assert_eq!(basename("///"), "/");
        assert_eq!(basename(""), ".");
    }

    #[test]
    fn test_char_class_children() {
        assert_eq!(strip_char_class(b"logs/a.log", "logs"), b"a.log");
        assert_eq!(strip_char_class(b"logs/b.log", "logs"), b"b.log");
        assert_eq!(strip_char_class(b"logs/", "logs"), b"");
        assert_eq!(strip_char_class(b"logs", "logs"), b"");
    }

    #[test]
    fn test_char_class_over_strips() {
        assert_eq!(strip_char_class(b"logs/slogs_extra", "logs"), b"_extra");
        assert_eq!(strip_char_class(b"logs/good.txt", "logs"), b"d.txt");
        assert_eq!(strip_char_class(b"logs/sub/os.log", "logs"), b"ub/os.log");
    }

    #[test]
    fn test_char_class_root_path() {
        // Copying "/" gives a cut set of just the slash.
        assert_eq!(strip_char_class(b"/etc/hosts", "/"), b"etc/hosts");
        assert_eq!(strip_char_class(b"etc/hosts", "/"), b"etc/hosts");
    }

    #[test]
    fn test_char_class_multibyte() {
        assert_eq!(strip_char_class("données/é.txt".as_bytes(), "données"), b".txt");
        assert_eq!(strip_char_class("données/x".as_bytes(), "données"), b"x");
    }

    #[test]
    fn test_char_class_invalid_utf8_stops() {
        let name = b"logs/\xffsl";
        assert_eq!(strip_char_class(name, "logs"), b"\xffsl");

        // Only a basename holding U+FFFD lets invalid bytes be trimmed.
        assert_eq!(strip_char_class(b"\xff\xfeab", "\u{FFFD}"), b"ab");
    }

    #[test]
    fn test_prefix_mode() {
        assert_eq!(strip_prefix(b"logs/a.log", "logs"), b"a.log");
        assert_eq!(strip_prefix(b"logs/slogs_extra", "logs"), b"slogs_extra");
        assert_eq!(strip_prefix(b"logs/", "logs"), b"");
        assert_eq!(strip_prefix(b"logs", "logs"), b"");
        assert_eq!(strip_prefix(b"logsx/a", "logs"), b"logsx/a");
        assert_eq!(strip_prefix(b"other/a", "logs"), b"other/a");
        assert_eq!(strip_prefix(b"/etc", "/"), b"etc");
    }

    #[test]
    fn test_context_computes_basename_once() {
        let ctx = RebaseContext::new("/data/logs/", StripMode::CharClass);
        assert_eq!(ctx.requested_path(), "/data/logs/");
        assert_eq!(ctx.basename(), "logs");
        assert_eq!(ctx.rewrite(b"logs/a.log"), b"a.log");

        let ctx = RebaseContext::new("/data/logs", StripMode::Prefix);
        assert_eq!(ctx.rewrite(b"logs/slogs_extra"), b"slogs_extra");
    }

    #[test]
    fn test_strip_mode_parse() {
        assert_eq!("char-class".parse::<StripMode>().unwrap(), StripMode::CharClass);
        assert_eq!("PREFIX".parse::<StripMode>().unwrap(), StripMode::Prefix);
        assert!("suffix".parse::<StripMode>().is_err());
        assert_eq!(StripMode::default(), StripMode::CharClass);
        assert_eq!(StripMode::Prefix.to_string(), "prefix");
    }
}
