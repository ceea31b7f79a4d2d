use crate::metadata::DateSource;
use crate::planner::{generate_plan, PlanOptions, PlannedAction, SortCandidate, SortPlan, SortStats};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("移動先フォルダを作成できませんでした: {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("移動に失敗しました: {} -> {}: {source}", from.display(), to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    #[error("コピー後の元ファイルを削除できませんでした: {}: {source}", path.display())]
    RemoveSource { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlacementOutcome {
    Moved { target: PathBuf },
    Simulated { target: PathBuf },
    SkippedDuplicate { existing: PathBuf },
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub source_path: PathBuf,
    pub date_source: Option<DateSource>,
    pub outcome: PlacementOutcome,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SortSummary {
    pub moved: usize,
    pub simulated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SortSummary {
    pub fn tally(outcomes: &[FileOutcome]) -> Self {
        let mut summary = Self::default();
        for entry in outcomes {
            match entry.outcome {
                PlacementOutcome::Moved { .. } => summary.moved += 1,
                PlacementOutcome::Simulated { .. } => summary.simulated += 1,
                PlacementOutcome::SkippedDuplicate { .. } => summary.skipped += 1,
                PlacementOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortReport {
    pub outcomes: Vec<FileOutcome>,
    pub stats: SortStats,
    pub summary: SortSummary,
}

/// プラン生成と配置を続けて実行する。結果は列挙順のまま一括で返す。
pub fn sort_photos(options: &PlanOptions, dry_run: bool) -> Result<SortReport> {
    let plan = generate_plan(options)?;
    let outcomes = apply_plan(&plan, dry_run);
    let summary = SortSummary::tally(&outcomes);
    Ok(SortReport {
        outcomes,
        stats: plan.stats,
        summary,
    })
}

pub fn apply_plan(plan: &SortPlan, dry_run: bool) -> Vec<FileOutcome> {
    plan.candidates
        .iter()
        .map(|candidate| FileOutcome {
            source_path: candidate.source_path.clone(),
            date_source: date_source_of(candidate),
            outcome: place(candidate, dry_run),
        })
        .collect()
}

fn date_source_of(candidate: &SortCandidate) -> Option<DateSource> {
    match &candidate.action {
        PlannedAction::Move { date, .. } | PlannedAction::SkipDuplicate { date, .. } => {
            Some(date.source)
        }
        PlannedAction::Unresolvable { .. } => None,
    }
}

fn place(candidate: &SortCandidate, dry_run: bool) -> PlacementOutcome {
    match &candidate.action {
        PlannedAction::Move { target, .. } => {
            if dry_run {
                return PlacementOutcome::Simulated {
                    target: target.clone(),
                };
            }
            match move_file(&candidate.source_path, target) {
                Ok(()) => PlacementOutcome::Moved {
                    target: target.clone(),
                },
                Err(err) => PlacementOutcome::Failed {
                    reason: err.to_string(),
                },
            }
        }
        PlannedAction::SkipDuplicate { existing, .. } => PlacementOutcome::SkippedDuplicate {
            existing: existing.clone(),
        },
        PlannedAction::Unresolvable { reason } => PlacementOutcome::Failed {
            reason: reason.clone(),
        },
    }
}

fn move_file(source: &Path, target: &Path) -> Result<(), PlacementError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|err| PlacementError::CreateDir {
            path: parent.to_path_buf(),
            source: err,
        })?;
    }

    if fs::rename(source, target).is_ok() {
        return Ok(());
    }

    // rename は別ボリュームでは使えないためコピーと削除で代替する
    if let Err(err) = fs::copy(source, target) {
        let _ = fs::remove_file(target);
        return Err(PlacementError::Move {
            from: source.to_path_buf(),
            to: target.to_path_buf(),
            source: err,
        });
    }
    if let Err(err) = fs::remove_file(source) {
        let _ = fs::remove_file(target);
        return Err(PlacementError::RemoveSource {
            path: source.to_path_buf(),
            source: err,
        });
    }

    Ok(())
}
