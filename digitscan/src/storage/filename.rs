use chrono::NaiveDateTime;
use unicode_normalization::UnicodeNormalization;

/// Inserted between stem and extension: date, time and microseconds.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%6f";

/// Used when sanitizing leaves nothing of the original stem.
const FALLBACK_STEM: &str = "upload";

const WINDOWS_DEVICE_FILES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Whether `filename` ends in one of the `allowed` extensions.
///
/// The extension is whatever follows the last `.`, compared case-insensitively.
/// A name without a dot is never allowed.
pub fn allowed_file(filename: &str, allowed: &[String]) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_lowercase();
            allowed.iter().any(|candidate| *candidate == ext)
        }
        None => false,
    }
}

/// Reduce a client-supplied name to a single safe path component.
///
/// Characters are NFKD-decomposed and whatever is left outside ASCII is
/// dropped, so accents fall away (`résumé` becomes `resume`). Path separators and whitespace runs
/// become `_`, anything outside `[A-Za-z0-9_.-]` is removed and leading or
/// trailing dots and underscores are stripped, so `../../etc/passwd` comes
/// out as `etc_passwd`. Reserved Windows device names get a `_` prefix.
/// The result may be empty.
pub fn secure_filename(filename: &str) -> String {
    let spaced: String = filename
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');

    let device = trimmed.split('.').next().unwrap_or("").to_uppercase();
    if WINDOWS_DEVICE_FILES.contains(&device.as_str()) {
        format!("_{trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// Storage name for an upload received at `at`:
/// `<safe stem>_<YYYYMMDD_HHMMSS_ffffff><.ext>`.
///
/// Two uploads of the same file get different names as long as their
/// timestamps differ by at least a microsecond.
pub fn unique_name(original: &str, at: NaiveDateTime) -> String {
    let safe = secure_filename(original);
    let (stem, ext) = split_extension(&safe);

    let stem = if stem.is_empty() { FALLBACK_STEM } else { stem };
    let ext = if ext.len() > 1 {
        ext.to_string()
    } else {
        original_extension(original)
    };

    format!("{stem}_{}{ext}", at.format(TIMESTAMP_FORMAT))
}

/// Split at the last dot, keeping the dot with the extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// The original extension in lowercase with its dot, or an empty string.
fn original_extension(original: &str) -> String {
    original
        .rsplit_once('.')
        .map(|(_, ext)| {
            ext.chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}
