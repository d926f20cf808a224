//! Low-level CSV parsing: separator sniffing and quote-aware record splitting.
//!
//! Spreadsheet exports in the wild disagree on the separator (Excel in many
//! locales writes `;`), so the separator is detected from the header line
//! rather than configured.

/// A parsed record: one row of raw field values.
pub type Record = Vec<String>;

/// Detect the field separator by counting `,` vs `;` in the header line,
/// ignoring anything inside double quotes.
pub fn detect_separator(src: &str) -> char {
    let mut in_quotes = false;
    let mut commas = 0usize;
    let mut semis = 0usize;

    let mut chars = src.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            '\n' if !in_quotes => break,
            ',' if !in_quotes => commas += 1,
            ';' if !in_quotes => semis += 1,
            _ => {}
        }
    }

    if semis > commas {
        ';'
    } else {
        ','
    }
}

/// Parse `src` into records.
///
/// Handles a UTF-8 BOM, CRLF/CR line endings, quoted fields with embedded
/// separators and newlines, and doubled-quote escapes. Rows whose fields are
/// all blank are dropped.
pub fn parse(src: &str) -> Vec<Record> {
    let src = src.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    let src = src.replace('\r', "\n");
    if src.trim().is_empty() {
        return Vec::new();
    }

    let sep = detect_separator(&src);

    let mut records: Vec<Record> = Vec::new();
    let mut record: Record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = src.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            c if c == sep && !in_quotes => {
                record.push(std::mem::take(&mut field));
            }
            '\n' if !in_quotes => {
                record.push(std::mem::take(&mut field));
                if record.iter().any(|f| !f.trim().is_empty()) {
                    records.push(std::mem::take(&mut record));
                } else {
                    record.clear();
                }
            }
            c => field.push(c),
        }
    }

    // Final record when the file has no trailing newline.
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        if record.iter().any(|f| !f.trim().is_empty()) {
            records.push(record);
        }
    }

    records
}
