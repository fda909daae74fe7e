//! Text formatting helpers shared by the metadata panel and the download action.

use percent_encoding::percent_decode_str;
use url::Url;

const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Format seconds as `M:SS`, or `H:MM:SS` when `show_hours` is set or the
/// value reaches an hour. Unknown (NaN) and negative values render as zero.
pub fn format_time(secs: f64, show_hours: bool) -> String {
    if secs.is_nan() || secs < 0.0 {
        return if show_hours { "0:00:00".into() } else { "0:00".into() };
    }

    let total_seconds = secs.round() as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if show_hours || hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Make a string safe to use as a file name.
///
/// Reserved characters become `_`, whitespace runs become a single `_`, and
/// repeated underscores collapse. Applying it twice gives the same result.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if FORBIDDEN.contains(&c) || c.is_whitespace() { '_' } else { c };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Lower-cased extension of the URL's last path segment, `mp4` when absent.
pub fn file_extension(url: &Url) -> String {
    let segment = last_segment(url).unwrap_or_default();
    match segment.rfind('.') {
        Some(dot) if dot > 0 && dot < segment.len() - 1 => segment[dot + 1..].to_lowercase(),
        _ => "mp4".to_string(),
    }
}

fn last_segment(url: &Url) -> Option<&str> {
    url.path_segments()?.next_back().filter(|s| !s.is_empty())
}

/// Whether a displayed title is a loading placeholder rather than a real name.
pub fn is_placeholder_title(title: &str) -> bool {
    let title = title.trim();
    title.is_empty() || title.to_lowercase().contains("loading")
}

/// File name used when saving the video: the display title when it is a
/// real title, otherwise the URL's last segment without its extension.
pub fn download_filename(title: Option<&str>, url: &Url) -> String {
    let base = match title {
        Some(t) if !is_placeholder_title(t) => t.trim().to_string(),
        _ => last_segment(url)
            .and_then(|seg| seg.split('.').next())
            .filter(|stem| !stem.is_empty())
            .map(|stem| percent_decode_str(stem).decode_utf8_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string()),
    };

    format!("{}.{}", sanitize_filename(&base), file_extension(url))
}

/// Title shown before the page knows anything better: the decoded last
/// path segment.
pub fn title_from_url(url: &Url) -> Option<String> {
    last_segment(url).map(|seg| percent_decode_str(seg).decode_utf8_lossy().into_owned())
}

/// Render an estimated byte count for the metadata panel.
pub fn format_size(bytes: f64) -> String {
    let mb = bytes / (1024.0 * 1024.0);
    if mb.is_nan() || bytes <= 0.0 {
        "Size: N/A".to_string()
    } else if mb > 0.1 {
        format!("Size: ~{:.1} MB", mb)
    } else {
        format!("Size: ~{:.0} KB", bytes / 1024.0)
    }
}
