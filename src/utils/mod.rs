use std::time::Duration;

use url::Url;

/// Sanitize filename to remove invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Derives a file name from the last path segment of a URL.
///
/// The segment is percent-decoded, a `?` that only shows up after decoding
/// is treated as the start of a query and dropped, and the rest is
/// sanitized. Returns `None` when the URL has no usable segment.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed
        .path_segments()?
        .rev()
        .find(|segment| !segment.is_empty())?
        .to_string();

    let bytes = urlencoding::decode_binary(segment.as_bytes());
    let decoded = String::from_utf8_lossy(&bytes);

    let base = decoded.split('?').next().unwrap_or_default();
    let name = sanitize_filename(base);

    match name.trim_matches('.') {
        "" => None,
        _ => Some(name),
    }
}

/// Renders a duration the way a status line reads it.
pub fn format_elapsed(elapsed: Duration) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;

    let secs = elapsed.as_secs();
    let plural = |n: u64, unit: &str| {
        if n == 1 {
            format!("1 {}", unit)
        } else {
            format!("{} {}s", n, unit)
        }
    };

    if secs < MINUTE {
        return "less than a minute".to_string();
    }

    let minutes = (secs + MINUTE / 2) / MINUTE;
    if minutes < 60 {
        return plural(minutes, "minute");
    }

    let hours = (secs + HOUR / 2) / HOUR;
    if hours < 24 {
        return format!("about {}", plural(hours, "hour"));
    }

    plural((secs + DAY / 2) / DAY, "day")
}
