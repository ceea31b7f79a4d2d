use crate::exif_reader::read_exif_date;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DateSource {
    Exif,
    FileModified,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhotoDate {
    pub source: DateSource,
    pub taken: DateTime<Local>,
}

pub fn resolve_photo_date(path: &Path) -> Result<PhotoDate> {
    if let Some(taken) = read_exif_date(path).ok().flatten() {
        return Ok(PhotoDate {
            source: DateSource::Exif,
            taken,
        });
    }

    let modified = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .with_context(|| format!("更新日時を取得できませんでした: {}", path.display()))?;

    Ok(PhotoDate {
        source: DateSource::FileModified,
        taken: DateTime::from(modified),
    })
}
