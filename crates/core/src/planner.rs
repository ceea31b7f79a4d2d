use crate::hash::same_content;
use crate::metadata::{resolve_photo_date, PhotoDate};
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub qualifier: Option<String>,
    pub recursive: bool,
    pub include_hidden: bool,
    pub prefix_filter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlannedAction {
    Move { target: PathBuf, date: PhotoDate },
    SkipDuplicate { existing: PathBuf, date: PhotoDate },
    Unresolvable { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortCandidate {
    pub source_path: PathBuf,
    pub action: PlannedAction,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SortStats {
    pub scanned_files: usize,
    pub skipped_hidden: usize,
    pub skipped_filtered: usize,
    pub planned_moves: usize,
    pub duplicates: usize,
    pub unresolvable: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortPlan {
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub qualifier: Option<String>,
    pub candidates: Vec<SortCandidate>,
    pub stats: SortStats,
}

pub fn generate_plan(options: &PlanOptions) -> Result<SortPlan> {
    if !options.source_dir.is_dir() {
        anyhow::bail!(
            "移動元フォルダが存在しません: {}",
            options.source_dir.display()
        );
    }

    let mut stats = SortStats::default();
    let files = collect_source_files(
        &options.source_dir,
        options.recursive,
        options.include_hidden,
        options.prefix_filter.as_deref(),
        &mut stats,
    )?;

    let mut candidates = Vec::with_capacity(files.len());
    let mut claimed = HashSet::<PathBuf>::new();

    for source_path in files {
        let date = match resolve_photo_date(&source_path) {
            Ok(date) => date,
            Err(err) => {
                stats.unresolvable += 1;
                candidates.push(SortCandidate {
                    source_path,
                    action: PlannedAction::Unresolvable {
                        reason: format!("{err:#}"),
                    },
                });
                continue;
            }
        };

        let month_dir = month_dir(&options.dest_dir, options.qualifier.as_deref(), &date.taken);
        let action = plan_placement(&source_path, &month_dir, date, &mut claimed);
        match &action {
            PlannedAction::Move { .. } => stats.planned_moves += 1,
            PlannedAction::SkipDuplicate { .. } => stats.duplicates += 1,
            PlannedAction::Unresolvable { .. } => stats.unresolvable += 1,
        }
        candidates.push(SortCandidate {
            source_path,
            action,
        });
    }

    Ok(SortPlan {
        source_dir: options.source_dir.clone(),
        dest_dir: options.dest_dir.clone(),
        qualifier: options.qualifier.clone(),
        candidates,
        stats,
    })
}

fn month_dir(dest_root: &Path, qualifier: Option<&str>, taken: &DateTime<Local>) -> PathBuf {
    let mut dir = dest_root.to_path_buf();
    if let Some(qualifier) = qualifier.filter(|q| !q.is_empty()) {
        dir.push(qualifier);
    }
    dir.push(format!("{:04}", taken.year()));
    dir.push(format!("{:02}", taken.month()));
    dir
}

fn plan_placement(
    source_path: &Path,
    month_dir: &Path,
    date: PhotoDate,
    claimed: &mut HashSet<PathBuf>,
) -> PlannedAction {
    let Some(file_name) = source_path.file_name() else {
        return PlannedAction::Unresolvable {
            reason: format!("ファイル名を取得できませんでした: {}", source_path.display()),
        };
    };

    let exact = month_dir.join(file_name);
    if exact.exists() {
        if same_content(source_path, &exact).unwrap_or(false) {
            return PlannedAction::SkipDuplicate {
                existing: exact,
                date,
            };
        }
    } else if !claimed.contains(&exact) {
        claimed.insert(exact.clone());
        return PlannedAction::Move {
            target: exact,
            date,
        };
    }

    let stem = Path::new(file_name)
        .file_stem()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    let ext = Path::new(file_name)
        .extension()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut n = 1usize;
    loop {
        let mut name = format!("{}_{}", stem, n);
        if !ext.is_empty() {
            name.push('.');
            name.push_str(&ext);
        }
        let next = month_dir.join(name);
        if !next.exists() && !claimed.contains(&next) {
            claimed.insert(next.clone());
            return PlannedAction::Move { target: next, date };
        }
        n += 1;
    }
}

fn collect_source_files(
    root: &Path,
    recursive: bool,
    include_hidden: bool,
    prefix_filter: Option<&str>,
    stats: &mut SortStats,
) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();

    if recursive {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("フォルダ走査に失敗しました: {}", root.display()))?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            consider_file(path.to_path_buf(), include_hidden, prefix_filter, stats, &mut out);
        }
    } else {
        for entry in fs::read_dir(root)
            .with_context(|| format!("フォルダを読めませんでした: {}", root.display()))?
        {
            let entry =
                entry.with_context(|| format!("エントリ読み取り失敗: {}", root.display()))?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            consider_file(path, include_hidden, prefix_filter, stats, &mut out);
        }
        out.sort();
    }

    Ok(out)
}

fn consider_file(
    path: PathBuf,
    include_hidden: bool,
    prefix_filter: Option<&str>,
    stats: &mut SortStats,
    out: &mut Vec<PathBuf>,
) {
    stats.scanned_files += 1;

    if is_hidden(&path) && !include_hidden {
        stats.skipped_hidden += 1;
        return;
    }

    if let Some(prefix) = prefix_filter {
        if !matches_prefix(&path, prefix) {
            stats.skipped_filtered += 1;
            return;
        }
    }

    out.push(path);
}

fn matches_prefix(path: &Path, prefix: &str) -> bool {
    path.file_name()
        .map(|name| {
            name.to_string_lossy()
                .to_ascii_uppercase()
                .starts_with(&prefix.to_ascii_uppercase())
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::{generate_plan, month_dir, PlanOptions, PlannedAction};
    use crate::metadata::DateSource;
    use chrono::{Local, TimeZone};
    use filetime::{set_file_mtime, FileTime};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn write_dated(path: &Path, contents: &[u8], year: i32, month: u32, day: u32) {
        fs::write(path, contents).expect("write source file");
        let date = Local
            .with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .expect("fixture date");
        set_file_mtime(path, FileTime::from_unix_time(date.timestamp(), 0)).expect("set mtime");
    }

    fn move_target(action: &PlannedAction) -> &PathBuf {
        match action {
            PlannedAction::Move { target, .. } => target,
            other => panic!("expected Move, got {:?}", other),
        }
    }

    #[test]
    fn month_dir_is_year_then_zero_padded_month() {
        let taken = Local
            .with_ymd_and_hms(2021, 5, 1, 10, 0, 0)
            .single()
            .expect("date");
        let dir = month_dir(Path::new("/dest"), None, &taken);
        assert_eq!(dir, Path::new("/dest/2021/05"));
    }

    #[test]
    fn qualifier_is_inserted_directly_under_root() {
        let taken = Local
            .with_ymd_and_hms(2021, 5, 2, 10, 0, 0)
            .single()
            .expect("date");
        let dir = month_dir(Path::new("/dest"), Some("trip"), &taken);
        assert_eq!(dir, Path::new("/dest/trip/2021/05"));

        let dir = month_dir(Path::new("/dest"), Some(""), &taken);
        assert_eq!(dir, Path::new("/dest/2021/05"));
    }

    #[test]
    fn plain_files_use_modified_date() {
        let temp = tempdir().expect("tempdir");
        let source = temp.path().join("src");
        let dest = temp.path().join("dest");
        fs::create_dir_all(&source).expect("create source");
        write_dated(&source.join("a.txt"), b"a", 2021, 5, 1);

        let plan = generate_plan(&PlanOptions {
            source_dir: source,
            dest_dir: dest.clone(),
            ..PlanOptions::default()
        })
        .expect("plan");

        assert_eq!(plan.candidates.len(), 1);
        let action = &plan.candidates[0].action;
        assert_eq!(move_target(action), &dest.join("2021").join("05").join("a.txt"));
        match action {
            PlannedAction::Move { date, .. } => assert_eq!(date.source, DateSource::FileModified),
            other => panic!("expected Move, got {:?}", other),
        }
    }

    #[test]
    fn qualifier_groups_all_dates_under_one_folder() {
        let temp = tempdir().expect("tempdir");
        let source = temp.path().join("src");
        let dest = temp.path().join("dest");
        fs::create_dir_all(&source).expect("create source");
        write_dated(&source.join("day1.jpg"), b"1", 2021, 5, 1);
        write_dated(&source.join("day2.jpg"), b"2", 2021, 5, 2);

        let plan = generate_plan(&PlanOptions {
            source_dir: source,
            dest_dir: dest.clone(),
            qualifier: Some("trip".to_string()),
            ..PlanOptions::default()
        })
        .expect("plan");

        let month = dest.join("trip").join("2021").join("05");
        for candidate in &plan.candidates {
            assert_eq!(move_target(&candidate.action).parent(), Some(month.as_path()));
        }
    }

    #[test]
    fn existing_file_with_different_content_gets_suffix() {
        let temp = tempdir().expect("tempdir");
        let source = temp.path().join("src");
        let dest = temp.path().join("dest");
        fs::create_dir_all(&source).expect("create source");
        write_dated(&source.join("photo.jpg"), b"mine", 2021, 5, 1);

        let month = dest.join("2021").join("05");
        fs::create_dir_all(&month).expect("create month dir");
        fs::write(month.join("photo.jpg"), b"theirs").expect("write existing");

        let plan = generate_plan(&PlanOptions {
            source_dir: source,
            dest_dir: dest,
            ..PlanOptions::default()
        })
        .expect("plan");

        assert_eq!(
            move_target(&plan.candidates[0].action),
            &month.join("photo_1.jpg")
        );
    }

    #[test]
    fn same_name_sources_claim_distinct_targets() {
        let temp = tempdir().expect("tempdir");
        let source = temp.path().join("src");
        let dest = temp.path().join("dest");
        fs::create_dir_all(source.join("a")).expect("create a");
        fs::create_dir_all(source.join("b")).expect("create b");
        write_dated(&source.join("a").join("photo.jpg"), b"first", 2021, 5, 1);
        write_dated(&source.join("b").join("photo.jpg"), b"second", 2021, 5, 1);

        let plan = generate_plan(&PlanOptions {
            source_dir: source,
            dest_dir: dest.clone(),
            recursive: true,
            ..PlanOptions::default()
        })
        .expect("plan");

        let month = dest.join("2021").join("05");
        let targets: Vec<PathBuf> = plan
            .candidates
            .iter()
            .map(|c| move_target(&c.action).clone())
            .collect();
        assert_eq!(
            targets,
            vec![month.join("photo.jpg"), month.join("photo_1.jpg")]
        );
        assert_eq!(plan.stats.planned_moves, 2);
    }

    #[test]
    fn identical_destination_file_is_skipped_as_duplicate() {
        let temp = tempdir().expect("tempdir");
        let source = temp.path().join("src");
        let dest = temp.path().join("dest");
        fs::create_dir_all(&source).expect("create source");
        write_dated(&source.join("photo.jpg"), b"same bytes", 2021, 5, 1);

        let month = dest.join("2021").join("05");
        fs::create_dir_all(&month).expect("create month dir");
        fs::write(month.join("photo.jpg"), b"same bytes").expect("write existing");

        let plan = generate_plan(&PlanOptions {
            source_dir: source,
            dest_dir: dest,
            ..PlanOptions::default()
        })
        .expect("plan");

        match &plan.candidates[0].action {
            PlannedAction::SkipDuplicate { existing, .. } => {
                assert_eq!(existing, &month.join("photo.jpg"));
            }
            other => panic!("expected SkipDuplicate, got {:?}", other),
        }
        assert_eq!(plan.stats.duplicates, 1);
        assert_eq!(plan.stats.planned_moves, 0);
    }

    #[test]
    fn prefix_filter_excludes_other_files() {
        let temp = tempdir().expect("tempdir");
        let source = temp.path().join("src");
        let dest = temp.path().join("dest");
        fs::create_dir_all(&source).expect("create source");
        write_dated(&source.join("PXL_0001.jpg"), b"1", 2021, 5, 1);
        write_dated(&source.join("IMG_0002.jpg"), b"2", 2021, 5, 1);

        let plan = generate_plan(&PlanOptions {
            source_dir: source,
            dest_dir: dest,
            prefix_filter: Some("pxl".to_string()),
            ..PlanOptions::default()
        })
        .expect("plan");

        assert_eq!(plan.candidates.len(), 1);
        assert_eq!(
            plan.candidates[0].source_path.file_name().and_then(|v| v.to_str()),
            Some("PXL_0001.jpg")
        );
        assert_eq!(plan.stats.skipped_filtered, 1);
    }

    #[test]
    fn hidden_files_are_skipped_unless_included() {
        let temp = tempdir().expect("tempdir");
        let source = temp.path().join("src");
        let dest = temp.path().join("dest");
        fs::create_dir_all(&source).expect("create source");
        write_dated(&source.join(".hidden.jpg"), b"h", 2021, 5, 1);
        write_dated(&source.join("visible.jpg"), b"v", 2021, 5, 1);

        let options = PlanOptions {
            source_dir: source,
            dest_dir: dest,
            ..PlanOptions::default()
        };

        let plan = generate_plan(&options).expect("plan");
        assert_eq!(plan.candidates.len(), 1);
        assert_eq!(plan.stats.skipped_hidden, 1);

        let plan = generate_plan(&PlanOptions {
            include_hidden: true,
            ..options
        })
        .expect("plan");
        assert_eq!(plan.candidates.len(), 2);
    }

    #[test]
    fn nonrecursive_enumeration_ignores_subdirectories() {
        let temp = tempdir().expect("tempdir");
        let source = temp.path().join("src");
        let dest = temp.path().join("dest");
        fs::create_dir_all(source.join("nested")).expect("create nested");
        write_dated(&source.join("top.jpg"), b"t", 2021, 5, 1);
        write_dated(&source.join("nested").join("deep.jpg"), b"d", 2021, 5, 1);

        let options = PlanOptions {
            source_dir: source,
            dest_dir: dest,
            ..PlanOptions::default()
        };

        let plan = generate_plan(&options).expect("plan");
        assert_eq!(plan.candidates.len(), 1);

        let plan = generate_plan(&PlanOptions {
            recursive: true,
            ..options
        })
        .expect("plan");
        assert_eq!(plan.candidates.len(), 2);
    }

    #[test]
    fn missing_source_dir_is_rejected_up_front() {
        let temp = tempdir().expect("tempdir");
        let err = generate_plan(&PlanOptions {
            source_dir: temp.path().join("nope"),
            dest_dir: temp.path().join("dest"),
            ..PlanOptions::default()
        })
        .expect_err("missing source should fail");
        assert!(err.to_string().contains("移動元フォルダが存在しません"));
    }
}
