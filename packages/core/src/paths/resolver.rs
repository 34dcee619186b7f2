//! Filename sanitization and include-path arithmetic
//!
//! Include specs and node names come from externally supplied, potentially
//! malicious documents. Everything that turns them into real paths funnels
//! through this module.

use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::store::DocumentFormat;

/// Maximum length of a sanitized filename, in characters
const MAX_NAME_LEN: usize = 100;

/// Fallback filename when sanitization leaves nothing usable
const FALLBACK_NAME: &str = "untitled";

/// Characters illegal in filenames across platforms, plus control chars
static ILLEGAL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).unwrap());

/// Runs of two or more dots (collapsed so `..` can never survive)
static DOT_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{2,}").unwrap());

/// Whitespace runs, collapsed to single hyphens
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Known serialization extensions a pattern may already carry
const FORMAT_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Extensions stripped when humanizing a filename into a display name
const STRIP_EXTENSIONS: [&str; 6] = ["yaml", "yml", "json", "codex", "md", "txt"];

/// Context for expanding an explode output pattern
#[derive(Debug, Clone, Copy)]
pub struct PatternContext<'a> {
    pub node_type: &'a str,
    pub name: &'a str,
    pub id: &'a str,
    /// 1-based ordinal of the child within the extraction batch
    pub index: usize,
}

/// Sanitize a node name into a safe filename component.
///
/// Guarantees: the output never contains path separators, never starts with
/// `.` (no hidden files), never equals `..`, and is never empty.
///
/// # Examples
///
/// ```rust
/// use codex_core::paths::sanitize_name;
///
/// assert_eq!(sanitize_name("My First Chapter"), "My-First-Chapter");
/// assert_eq!(sanitize_name("../../etc/passwd"), "etcpasswd");
/// assert_eq!(sanitize_name(".."), "untitled");
/// ```
pub fn sanitize_name(name: &str) -> String {
    let trimmed = name.trim();
    let no_illegal = ILLEGAL_CHARS.replace_all(trimmed, "");
    let no_dot_runs = DOT_RUNS.replace_all(&no_illegal, ".");
    let no_leading_dots = no_dot_runs.trim_start_matches('.');
    let hyphenated = WHITESPACE.replace_all(no_leading_dots, "-");

    let truncated: String = hyphenated.chars().take(MAX_NAME_LEN).collect();
    if truncated.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        truncated
    }
}

/// Expand an output pattern (`{type}`, `{name}`, `{id}`, `{index}`) into an
/// absolute output path.
///
/// `{name}` is substituted with its sanitized form. Relative results are
/// resolved against `parent_dir`; a serialization extension matching
/// `format` is appended if the pattern does not already carry one.
pub fn resolve_output_path(
    pattern: &str,
    ctx: &PatternContext<'_>,
    parent_dir: &Path,
    format: DocumentFormat,
) -> PathBuf {
    let expanded = pattern
        .replace("{type}", ctx.node_type)
        .replace("{name}", &sanitize_name(ctx.name))
        .replace("{id}", ctx.id)
        .replace("{index}", &ctx.index.to_string());

    let path = PathBuf::from(&expanded);
    let mut resolved = if path.is_absolute() {
        path
    } else {
        parent_dir.join(path)
    };

    let has_format_ext = resolved
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FORMAT_EXTENSIONS.contains(&ext))
        .unwrap_or(false);
    if !has_format_ext {
        let with_ext = format!(
            "{}.{}",
            resolved.file_name().unwrap_or_default().to_string_lossy(),
            format.extension()
        );
        resolved.set_file_name(with_ext);
    }
    normalize_path(&resolved)
}

/// Resolve an include spec to an absolute path.
///
/// A leading `/` means "relative to the owning document's directory root";
/// anything else is resolved against `base_dir` (which differs from
/// `document_dir` during recursive resolution). No containment guard is
/// applied here; callers run the result through [`is_contained`].
pub fn resolve_include_path(include: &str, base_dir: &Path, document_dir: &Path) -> PathBuf {
    if let Some(rooted) = include.strip_prefix('/') {
        document_dir.join(rooted)
    } else {
        base_dir.join(include)
    }
}

/// Produce the include spec for an extracted file: a POSIX-style,
/// forward-slash path prefixed with `/`, relative to `parent_dir`.
///
/// Falls back to the absolute path when the output is not under
/// `parent_dir`.
pub fn generate_include_path(output: &Path, parent_dir: &Path) -> String {
    let output = normalize_path(output);
    let parent = normalize_path(parent_dir);
    match output.strip_prefix(&parent) {
        Ok(relative) => format!("/{}", to_posix(relative)),
        Err(_) => to_posix(&output),
    }
}

/// Lexically normalize a path: fold `.` components and resolve `..`
/// against preceding components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if can_pop {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Whether `path` stays inside `root` after lexical normalization.
///
/// Closes the traversal gap left open by [`resolve_include_path`]: an
/// include target that climbs out of the owning document's root is rejected
/// by callers before any read.
pub fn is_contained(path: &Path, root: &Path) -> bool {
    let path = normalize_path(path);
    let root = normalize_path(root);
    path.starts_with(&root)
        && !path
            .components()
            .any(|c| matches!(c, Component::ParentDir))
}

/// Turn a leaf include filename into a display name: extensions stripped,
/// separators spaced, words capitalized.
pub fn humanize_filename(filename: &str) -> String {
    let mut stem = filename;
    loop {
        let path = Path::new(stem);
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if STRIP_EXTENSIONS.contains(&ext) => {
                stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or(stem);
            }
            _ => break,
        }
    }

    let spaced = stem.replace(['-', '_'], " ");
    WHITESPACE
        .replace_all(spaced.trim(), " ")
        .split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn to_posix(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::RootDir => out.push('/'),
            Component::Prefix(prefix) => out.push_str(&prefix.as_os_str().to_string_lossy()),
            other => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&other.as_os_str().to_string_lossy());
            }
        }
    }
    out
}
