use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub fn read_exif_date(path: &Path) -> Result<Option<DateTime<Local>>> {
    let file = File::open(path)
        .with_context(|| format!("EXIF読み込み対象を開けませんでした: {}", path.display()))?;
    let mut buf = BufReader::new(file);
    let exif = Reader::new()
        .read_from_container(&mut buf)
        .with_context(|| format!("EXIFを解析できませんでした: {}", path.display()))?;

    let tags = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];
    for tag in tags {
        let Some(field) = exif.get_field(tag, In::PRIMARY) else {
            continue;
        };
        if let Some(raw) = ascii_value(&field.value) {
            if let Some(date) = parse_date(&raw) {
                return Ok(Some(date));
            }
        }
    }

    Ok(None)
}

fn ascii_value(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(lines) => lines
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).to_string()),
        _ => None,
    }
}

fn parse_date(input: &str) -> Option<DateTime<Local>> {
    let normalized = input.trim().trim_matches('\0').trim();

    let candidates = [
        "%Y:%m:%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%:z",
        "%Y-%m-%dT%H:%M:%S%.f%:z",
    ];

    for fmt in candidates {
        if let Ok(dt) = DateTime::parse_from_str(normalized, fmt) {
            return Some(dt.with_timezone(&Local));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(normalized, fmt) {
            if let Some(local) = Local.from_local_datetime(&naive).single() {
                return Some(local);
            }
        }
    }

    None
}
