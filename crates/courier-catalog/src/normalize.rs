//! Text and URL cleanup applied to catalog fields.

use url::Url;

/// Normalize a message body from a spreadsheet cell.
///
/// Spreadsheets deliver line breaks three ways: real CRLF/CR, the literal
/// two-character `\n` escape, and the `/n` typo operators keep producing.
/// All become real newlines. Tabs collapse to spaces and trailing whitespace
/// (including NBSP) is stripped from every line.
pub fn normalize_text(raw: &str) -> String {
    let mut s = raw.replace("\r\n", "\n").replace('\r', "\n");
    for esc in ["\\n", "\\N", "/n", "/N"] {
        s = s.replace(esc, "\n");
    }
    let s = s.replace('\t', " ");

    let normalized: Vec<&str> = s
        .split('\n')
        .map(|line| line.trim_end_matches([' ', '\u{a0}']))
        .collect();
    normalized.join("\n").trim().to_string()
}

/// Rewrite Google Drive viewer links to their direct-download form.
///
/// `https://drive.google.com/file/d/<id>/view` →
/// `https://drive.google.com/uc?export=download&id=<id>`
///
/// Telegram fetches media by URL server-side and the viewer page is HTML,
/// not the file. Anything unrecognized passes through trimmed.
pub fn convert_drive_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let Ok(url) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };

    let is_drive = url
        .host_str()
        .is_some_and(|h| h.contains("drive.google.com"));
    if !is_drive {
        return trimmed.to_string();
    }

    let mut segments = url.path_segments().into_iter().flatten();
    if segments.next() == Some("file") && segments.next() == Some("d") {
        if let Some(id) = segments.next().filter(|id| !id.is_empty()) {
            return format!("https://drive.google.com/uc?export=download&id={id}");
        }
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_newlines_become_real() {
        assert_eq!(normalize_text("one\\ntwo"), "one\ntwo");
        assert_eq!(normalize_text("one/ntwo"), "one\ntwo");
    }

    #[test]
    fn crlf_and_cr_normalize() {
        assert_eq!(normalize_text("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn tabs_and_trailing_spaces_collapse() {
        assert_eq!(normalize_text("a\tb  \nc\u{a0}\n"), "a b\nc");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(normalize_text("  hello  "), "hello");
    }

    #[test]
    fn drive_viewer_link_rewrites() {
        let out = convert_drive_url("https://drive.google.com/file/d/FILE123/view?usp=sharing");
        assert_eq!(
            out,
            "https://drive.google.com/uc?export=download&id=FILE123"
        );
    }

    #[test]
    fn non_drive_urls_pass_through() {
        let url = "https://example.com/cat.jpg";
        assert_eq!(convert_drive_url(url), url);
    }

    #[test]
    fn unparseable_input_passes_through_trimmed() {
        assert_eq!(convert_drive_url("  not a url  "), "not a url");
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(convert_drive_url("   "), "");
    }
}
