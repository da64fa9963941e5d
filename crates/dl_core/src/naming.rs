use url::Url;

/// Widest name shown on a progress indicator.
pub const MAX_DISPLAY_NAME: usize = 30;

const CONTINUATION: &str = "...";
const FALLBACK_NAME: &str = "download";

/// Output name for a source location: its last path segment, sanitized.
///
/// Query strings and fragments are ignored. Sources without a usable segment
/// fall back to `"download"`.
pub fn extract_name(source: &str) -> String {
    let segment = match Url::parse(source) {
        Ok(url) => url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(ToOwned::to_owned),
        Err(_) => source
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').find(|s| !s.is_empty()))
            .map(ToOwned::to_owned),
    };
    sanitize_name(segment.as_deref().unwrap_or(FALLBACK_NAME))
}

/// Filesystem-safe name: forbidden characters become `_`, runs of `_` collapse,
/// and reserved Windows device names get a trailing `_`.
pub fn sanitize_name(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);
    if cleaned.is_empty() {
        return FALLBACK_NAME.to_string();
    }

    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }

    if is_reserved_windows_name(&compacted) {
        compacted.push('_');
    }
    compacted
}

/// Shortens `name` to at most `max` characters as `prefix...ext`, keeping the
/// extension when it fits.
pub fn short_name(name: &str, max: usize) -> String {
    let len = name.chars().count();
    if len <= max {
        return name.to_string();
    }

    let budget = max.saturating_sub(CONTINUATION.len());
    let extension = name
        .rfind('.')
        .filter(|&i| i > 0)
        .map(|i| &name[i..])
        .filter(|ext| ext.chars().count() < budget);

    match extension {
        Some(ext) => {
            let keep = budget - ext.chars().count();
            let prefix: String = name.chars().take(keep).collect();
            format!("{prefix}{CONTINUATION}{ext}")
        }
        None => {
            let prefix: String = name.chars().take(budget).collect();
            format!("{prefix}{CONTINUATION}")
        }
    }
}

/// Label for a callback indicator: `"{name} - {operation}"`, shortened.
pub fn display_label(name: &str, operation: &str) -> String {
    if operation.is_empty() {
        short_name(name, MAX_DISPLAY_NAME)
    } else {
        short_name(&format!("{name} - {operation}"), MAX_DISPLAY_NAME)
    }
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
