use chrono::{DateTime, Duration, Local, LocalResult, NaiveDateTime, TimeZone};

/// `2020:05:14 10:22:00`
pub const EXIF_PATTERN: &str = "%Y:%m:%d %H:%M:%S";
/// `Wed Dec 17 22:56:46 -08:00 2008`
pub const LOCALE_PATTERN: &str = "%a %b %d %H:%M:%S %:z %Y";
/// `THU DEC 07 22:09:22 2006`
pub const VIDEO_PATTERN: &str = "%a %b %d %H:%M:%S %Y";

const EXIF_PATTERN_WITH_OFFSET: &str = "%Y:%m:%d %H:%M:%S%:z";

/// Parses an image metadata string: EXIF layout first, then the locale layout
/// with or without an offset.
pub fn parse_image_datetime(raw: &str) -> Option<DateTime<Local>> {
    let input = clean(raw);
    if input.is_empty() {
        return None;
    }

    parse_naive(input, EXIF_PATTERN)
        .or_else(|| parse_with_offset(input, LOCALE_PATTERN))
        .or_else(|| parse_naive(input, VIDEO_PATTERN))
}

pub fn parse_video_datetime(raw: &str) -> Option<DateTime<Local>> {
    let input = clean(raw);
    if input.is_empty() {
        return None;
    }
    parse_naive(input, VIDEO_PATTERN)
}

/// exiftool prints QuickTime dates either bare or with an offset appended.
pub fn parse_shell_datetime(raw: &str) -> Option<DateTime<Local>> {
    let input = clean(raw);
    if input.is_empty() {
        return None;
    }
    parse_with_offset(input, EXIF_PATTERN_WITH_OFFSET).or_else(|| parse_naive(input, EXIF_PATTERN))
}

pub fn format_locale_datetime(date: &DateTime<Local>) -> String {
    date.format(LOCALE_PATTERN).to_string()
}

fn clean(raw: &str) -> &str {
    raw.trim_matches(|c: char| c == '\0' || c.is_whitespace())
}

fn parse_naive(input: &str, pattern: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(input, pattern).ok()?;
    Some(from_wall_clock(&Local, &naive))
}

/// Maps a camera wall-clock reading onto `tz`. A reading inside a
/// spring-forward gap is moved past the gap; it is never dropped.
fn from_wall_clock<Tz: TimeZone>(tz: &Tz, naive: &NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(date) | LocalResult::Ambiguous(date, _) => date,
        LocalResult::None => tz
            .from_local_datetime(&(*naive + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(naive)),
    }
}

fn parse_with_offset(input: &str, pattern: &str) -> Option<DateTime<Local>> {
    DateTime::parse_from_str(input, pattern)
        .ok()
        .map(|dt| dt.with_timezone(&Local))
}
