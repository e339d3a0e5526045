//! Filesystem-safe names.
//!
//! Catalog names are free text. Before they become directory or file names they
//! lose the characters common filesystems reject, reserved Windows device names
//! and whatever would push the full destination past the path-length ceiling.

use std::path::Path;

/// Full destination path ceiling used when nothing else is configured.
pub const MAX_PATH_LENGTH: usize = 200;

/// Replacement for illegal characters and for names that are unusable as a whole.
pub const PLACEHOLDER: char = '_';

/// Longest suffix still treated as an extension rather than part of the name.
const MAX_EXTENSION_LENGTH: usize = 16;

const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Extra information that refines how a name is sanitized.
#[derive(Debug, Default, Clone, Copy)]
pub struct SanitizeContext<'a> {
    /// Name of the owning model folder. Repetitions of it are removed from the
    /// candidate so files don't all restate the model name.
    pub folder_name: Option<&'a str>,
    /// Directory the name will live in. Enables truncation to the path budget.
    pub parent: Option<&'a Path>,
    /// Already-safe text placed before the name. Counted in the budget, never cut.
    pub prefix: Option<&'a str>,
}

impl<'a> SanitizeContext<'a> {
    pub fn folder(folder_name: &'a str) -> Self {
        Self {
            folder_name: Some(folder_name),
            ..Self::default()
        }
    }

    pub fn parent(mut self, parent: &'a Path) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn prefix(mut self, prefix: &'a str) -> Self {
        self.prefix = Some(prefix);
        self
    }
}

/// Turns arbitrary names into safe path components.
#[derive(Debug, Clone, Copy)]
pub struct NameSanitizer {
    max_path_length: usize,
}

impl Default for NameSanitizer {
    fn default() -> Self {
        Self::new(MAX_PATH_LENGTH)
    }
}

impl NameSanitizer {
    pub fn new(max_path_length: usize) -> Self {
        Self { max_path_length }
    }

    pub fn max_path_length(&self) -> usize {
        self.max_path_length
    }

    /// Sanitize a name without any context.
    pub fn sanitize(&self, name: &str) -> String {
        self.sanitize_with(name, SanitizeContext::default())
    }

    /// Sanitize a name that will be stored directly inside `parent`.
    pub fn sanitize_in(&self, name: &str, parent: &Path) -> String {
        self.sanitize_with(name, SanitizeContext::default().parent(parent))
    }

    /// Sanitize a name with the full context.
    ///
    /// ```rust
    /// use civitai_mirror::layout::{NameSanitizer, SanitizeContext};
    ///
    /// let sanitizer = NameSanitizer::default();
    /// assert_eq!(sanitizer.sanitize("a<b>:c?.txt"), "a_b_c.txt");
    /// assert_eq!(
    ///     sanitizer.sanitize_with("Foxy_v2.safetensors", SanitizeContext::folder("Foxy")),
    ///     "v2.safetensors"
    /// );
    /// ```
    pub fn sanitize_with(&self, name: &str, context: SanitizeContext<'_>) -> String {
        let name = name.trim();
        let (base, extension) = split_extension(name);

        let mut base = base.to_string();
        if let Some(folder) = context.folder_name.filter(|f| !f.is_empty()) {
            // A name that *is* the folder name is already right; only make it safe.
            if base != folder {
                let stripped = base.replace(folder, "");
                let stripped = stripped.trim_matches(PLACEHOLDER).trim();
                if !stripped.is_empty() {
                    base = stripped.to_string();
                }
            }
        }

        let mut base = unreserved(clean(&base));
        let extension = replace_illegal(extension);
        let prefix = context.prefix.unwrap_or_default();

        if let Some(parent) = context.parent {
            let used = parent.to_string_lossy().chars().count()
                + 1
                + prefix.chars().count()
                + extension.chars().count();
            let budget = self.max_path_length.saturating_sub(used).max(1);
            base = unreserved(truncate(&base, budget));
        }

        format!("{prefix}{base}{extension}")
    }
}

/// Split `name` into base and extension (with its dot), the way a file name reads.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => {
            let extension = &name[idx..];
            let plausible = extension.chars().count() <= MAX_EXTENSION_LENGTH
                && !extension.chars().any(char::is_whitespace);
            if plausible {
                (&name[..idx], extension)
            } else {
                (name, "")
            }
        }
        _ => (name, ""),
    }
}

fn is_illegal(c: char) -> bool {
    matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*')
        || c.is_control()
        || ('\u{7f}'..='\u{9f}').contains(&c)
}

fn replace_illegal(s: &str) -> String {
    s.chars()
        .map(|c| if is_illegal(c) { PLACEHOLDER } else { c })
        .collect()
}

fn unreserved(base: String) -> String {
    if RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(&base))
    {
        PLACEHOLDER.to_string()
    } else {
        base
    }
}

/// Replace illegal characters, collapse placeholder runs and trim the edges.
fn clean(base: &str) -> String {
    let mut out = String::with_capacity(base.len());
    for c in replace_illegal(base).chars() {
        if c == PLACEHOLDER && out.ends_with(PLACEHOLDER) {
            continue;
        }
        out.push(c);
    }
    let trimmed = trim_separators(&out);
    if trimmed.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

fn trim_separators(s: &str) -> &str {
    s.trim_matches(|c: char| c == PLACEHOLDER || c == '.' || c.is_whitespace())
}

/// Cut `base` to at most `budget` chars, backing up to the last separator.
fn truncate(base: &str, budget: usize) -> String {
    if base.chars().count() <= budget {
        return base.to_string();
    }
    let cut: String = base.chars().take(budget).collect();
    let at_boundary = match cut.rfind(|c: char| c == PLACEHOLDER || c == ' ') {
        Some(idx) if idx > 0 => &cut[..idx],
        _ => cut.as_str(),
    };
    let trimmed = trim_separators(at_boundary);
    if trimmed.is_empty() {
        // Nothing but separators survived the cut; keep the hard cut instead.
        let hard = trim_separators(&cut);
        if hard.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            hard.to_string()
        }
    } else {
        trimmed.to_string()
    }
}
