//! Include/exclude admission filter for repository paths.
//!
//! Patterns are glob strings (`*`, `?`, `[...]`) written with `/`
//! separators, the way git reports paths. A pattern without wildcards also
//! admits everything beneath the directory it names.

use std::borrow::Cow;

use glob::{MatchOptions, Pattern};

/// `*` and `?` never cross a path separator.
///
/// `\` is not an escape character here. Under `PathStyle::Unix` the `glob`
/// crate reads it literally, so `a\*b` is a literal `a\` followed by a
/// wildcard. Escape a special character with a class instead, e.g. `a[*]b`.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Path convention used when cleaning paths and checking directory prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStyle {
    /// `/` separators; paths are matched as given
    Unix,
    /// `\` separators (`/` also accepted). Paths are additionally matched in
    /// cleaned form since git reports them with `/`.
    Windows,
}

impl PathStyle {
    /// Style of the target platform
    pub const fn native() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }

    pub fn separator(self) -> char {
        match self {
            Self::Unix => '/',
            Self::Windows => '\\',
        }
    }

    fn is_separator(self, c: char) -> bool {
        match self {
            Self::Unix => c == '/',
            Self::Windows => c == '/' || c == '\\',
        }
    }

    /// Whether paths also need matching in cleaned form
    fn matches_cleaned(self) -> bool {
        self == Self::Windows
    }

    /// Rewrite separators to `/` before glob matching, so `*` and `?` stop at
    /// `\` under `Windows` style regardless of the host platform.
    fn glob_form(self, s: &str) -> Cow<'_, str> {
        match self {
            Self::Windows if s.contains('\\') => Cow::Owned(s.replace('\\', "/")),
            _ => Cow::Borrowed(s),
        }
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::native()
    }
}

/// Include/exclude path filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathFilter {
    includes: Vec<String>,
    excludes: Vec<String>,
    style: PathStyle,
}

impl PathFilter {
    pub fn new<I, E>(includes: I, excludes: E) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            includes: includes.into_iter().map(Into::into).collect(),
            excludes: excludes.into_iter().map(Into::into).collect(),
            style: PathStyle::native(),
        }
    }

    pub fn with_style(mut self, style: PathStyle) -> Self {
        self.style = style;
        self
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }

    pub fn style(&self) -> PathStyle {
        self.style
    }

    /// True when the filter admits every path
    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }

    /// Decide whether `path` should be processed.
    ///
    /// With includes set, the path must match at least one of them. Any
    /// matching exclude rejects the path, even if an include matched.
    pub fn admit(&self, path: &str) -> bool {
        admit_with(path, self.includes.as_slice(), self.excludes.as_slice(), self.style)
    }
}

/// Whether `path` passes `includes` and `excludes`, using the native path style
pub fn filename_passes_filter(path: &str, includes: &[String], excludes: &[String]) -> bool {
    admit_with(path, includes, excludes, PathStyle::native())
}

fn admit_with<S: AsRef<str>>(path: &str, includes: &[S], excludes: &[S], style: PathStyle) -> bool {
    if includes.is_empty() && excludes.is_empty() {
        return true;
    }

    let cleaned = clean_path(path, style);

    if !includes.is_empty()
        && !includes
            .iter()
            .any(|pattern| pattern_matches(pattern.as_ref(), path, &cleaned, style))
    {
        tracing::trace!(path, "rejected: no include matched");
        return false;
    }

    if let Some(pattern) = excludes
        .iter()
        .map(AsRef::as_ref)
        .find(|pattern| pattern_matches(pattern, path, &cleaned, style))
    {
        tracing::trace!(path, pattern, "rejected by exclude");
        return false;
    }

    true
}

fn pattern_matches(pattern: &str, path: &str, cleaned: &str, style: PathStyle) -> bool {
    // A malformed pattern never glob-matches, but its text can still name
    // a parent directory.
    if let Ok(glob) = Pattern::new(&style.glob_form(pattern)) {
        if glob.matches_with(&style.glob_form(path), MATCH_OPTIONS) {
            return true;
        }
        if style.matches_cleaned() && glob.matches_with(&style.glob_form(cleaned), MATCH_OPTIONS) {
            return true;
        }
    }

    cleaned
        .strip_prefix(pattern)
        .and_then(|rest| rest.strip_prefix(style.separator()))
        .is_some()
}

/// Lexically clean `path`.
///
/// Repeated separators collapse, `.` segments are dropped, `..` removes the
/// preceding segment where there is one, and trailing separators are removed.
/// The result uses the separator of `style`; an empty result becomes `.`.
pub fn clean_path(path: &str, style: PathStyle) -> String {
    let sep = style.separator();
    let rooted = path.starts_with(|c: char| style.is_separator(c));

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(|c: char| style.is_separator(c)) {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                // `..` at the root stays at the root
                _ if rooted => {}
                _ => segments.push(".."),
            },
            _ => segments.push(segment),
        }
    }

    let mut cleaned = String::with_capacity(path.len());
    if rooted {
        cleaned.push(sep);
    }
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            cleaned.push(sep);
        }
        cleaned.push_str(segment);
    }

    if cleaned.is_empty() {
        cleaned.push('.');
    }
    cleaned
}
