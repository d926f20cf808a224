//! Header-keyed row mapping: raw CSV records → [`Post`] values.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use courier_core::{Post, PostButton};
use tracing::debug;

use crate::normalize::{convert_drive_url, normalize_text};
use crate::reader::Record;

/// Maximum number of `btnN_text`/`btnN_url` column pairs recognized.
const MAX_BUTTONS: usize = 4;

/// Convert raw records (header row first) into posts, preserving catalog
/// order. Rows with an unparseable date or time come back with
/// `scheduled_at: None` so the caller can count them.
pub fn build_posts(records: Vec<Record>) -> Vec<Post> {
    let mut records = records.into_iter();
    let Some(header) = records.next() else {
        return Vec::new();
    };
    let header: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();

    records
        .map(|record| {
            let mut fields: HashMap<&str, &str> = HashMap::new();
            for (i, name) in header.iter().enumerate() {
                fields.insert(name.as_str(), record.get(i).map(String::as_str).unwrap_or(""));
            }
            build_post(&fields)
        })
        .collect()
}

fn build_post(fields: &HashMap<&str, &str>) -> Post {
    let get = |key: &str| fields.get(key).copied().unwrap_or("").trim();

    let date = get("date");
    let time = get("time");
    let scheduled_at = parse_schedule(date, time);
    if scheduled_at.is_none() && (!date.is_empty() || !time.is_empty()) {
        debug!(date, time, "row has unparseable schedule");
    }

    // Legacy exports used bare `photo`/`video` column names.
    let photo = non_empty(get("photo_url")).or_else(|| non_empty(get("photo")));
    let video = non_empty(get("video_url")).or_else(|| non_empty(get("video")));

    let mut buttons = Vec::new();
    for i in 1..=MAX_BUTTONS {
        let label = get(&format!("btn{i}_text")).to_string();
        let url = get(&format!("btn{i}_url")).to_string();
        if !label.is_empty() && !url.is_empty() {
            buttons.push(PostButton { label, url });
        }
    }

    Post {
        scheduled_at,
        text: normalize_text(get("text")),
        photo_url: photo.map(convert_drive_url),
        video_url: video.map(convert_drive_url),
        buttons,
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn parse_schedule(date: &str, time: &str) -> Option<NaiveDateTime> {
    if date.is_empty() || time.is_empty() {
        return None;
    }
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
        .ok()?;
    Some(NaiveDateTime::new(date, time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader;

    fn posts_from(csv: &str) -> Vec<Post> {
        build_posts(reader::parse(csv))
    }

    #[test]
    fn minimal_text_row_builds() {
        let posts = posts_from("date,time,text\n2024-05-01,14:00,Hello world\n");
        assert_eq!(posts.len(), 1);
        let p = &posts[0];
        assert_eq!(
            p.scheduled_at,
            Some(
                NaiveDate::from_ymd_opt(2024, 5, 1)
                    .unwrap()
                    .and_hms_opt(14, 0, 0)
                    .unwrap()
            )
        );
        assert_eq!(p.text, "Hello world");
        assert!(p.is_well_formed());
    }

    #[test]
    fn seconds_in_time_are_accepted() {
        let posts = posts_from("date,time,text\n2024-05-01,14:00:30,hi\n");
        let at = posts[0].scheduled_at.unwrap();
        assert_eq!(at.format("%H:%M:%S").to_string(), "14:00:30");
    }

    #[test]
    fn bad_date_yields_malformed_post() {
        let posts = posts_from("date,time,text\nnot-a-date,14:00,hi\n");
        assert_eq!(posts.len(), 1);
        assert!(posts[0].scheduled_at.is_none());
        assert!(!posts[0].is_well_formed());
    }

    #[test]
    fn missing_text_is_malformed_but_kept() {
        let posts = posts_from("date,time,text,photo_url\n2024-05-01,14:00,,http://x/i.jpg\n");
        assert_eq!(posts.len(), 1);
        assert!(!posts[0].is_well_formed());
    }

    #[test]
    fn photo_alias_column_is_honored() {
        let posts = posts_from("date,time,text,photo\n2024-05-01,14:00,hi,https://example.com/a.jpg\n");
        assert_eq!(posts[0].photo_url.as_deref(), Some("https://example.com/a.jpg"));
    }

    #[test]
    fn canonical_column_wins_over_alias() {
        let posts = posts_from(
            "date,time,text,photo_url,photo\n2024-05-01,14:00,hi,https://a.test/1.jpg,https://b.test/2.jpg\n",
        );
        assert_eq!(posts[0].photo_url.as_deref(), Some("https://a.test/1.jpg"));
    }

    #[test]
    fn drive_links_are_rewritten() {
        let posts = posts_from(
            "date,time,text,video_url\n2024-05-01,14:00,hi,https://drive.google.com/file/d/VID9/view\n",
        );
        assert_eq!(
            posts[0].video_url.as_deref(),
            Some("https://drive.google.com/uc?export=download&id=VID9")
        );
    }

    #[test]
    fn buttons_require_both_label_and_url() {
        let posts = posts_from(
            "date,time,text,btn1_text,btn1_url,btn2_text,btn2_url\n\
             2024-05-01,14:00,hi,Open,https://example.com,Dangling,\n",
        );
        assert_eq!(posts[0].buttons.len(), 1);
        assert_eq!(posts[0].buttons[0].label, "Open");
    }

    #[test]
    fn escaped_newline_in_text_is_normalized() {
        let posts = posts_from("date,time,text\n2024-05-01,14:00,line one\\nline two\n");
        assert_eq!(posts[0].text, "line one\nline two");
    }

    #[test]
    fn catalog_order_is_preserved() {
        let posts = posts_from(
            "date,time,text\n2024-05-02,10:00,second\n2024-05-01,10:00,first\n",
        );
        assert_eq!(posts[0].text, "second");
        assert_eq!(posts[1].text, "first");
    }
}
