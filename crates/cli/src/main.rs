use anyhow::Result;
use clap::{Parser, ValueEnum};
use photo_sorter_core::{
    load_config, sort_photos, DateSource, PlacementOutcome, PlanOptions, SortReport,
};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "photo-sorter")]
#[command(about = "写真を撮影日時ベースで YYYY/MM フォルダへ整理します")]
struct Cli {
    source_dir: PathBuf,
    dest_dir: PathBuf,
    #[arg(long)]
    qualifier: Option<String>,
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    #[arg(long, default_value_t = false)]
    recursive: bool,
    #[arg(long, default_value_t = false)]
    include_hidden: bool,
    #[arg(long)]
    prefix: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config()?;

    let options = PlanOptions {
        source_dir: cli.source_dir,
        dest_dir: cli.dest_dir,
        qualifier: cli.qualifier,
        recursive: cli.recursive || config.recursive_default,
        include_hidden: cli.include_hidden || config.include_hidden_default,
        prefix_filter: cli.prefix.or(config.prefix_filter),
    };

    let report = sort_photos(&options, cli.dry_run)?;

    match cli.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_table(&report),
    }

    if cli.dry_run {
        eprintln!("dry-runモード: 実ファイルは変更していません。");
    }

    Ok(())
}

fn print_table(report: &SortReport) {
    println!("元ファイル -> 移動先 (date source)");
    for entry in &report.outcomes {
        match &entry.outcome {
            PlacementOutcome::Moved { target } => println!(
                "{} -> {} ({})",
                entry.source_path.display(),
                target.display(),
                source_label(entry.date_source)
            ),
            PlacementOutcome::Simulated { target } => println!(
                "{} -> {} ({}) [dry-run]",
                entry.source_path.display(),
                target.display(),
                source_label(entry.date_source)
            ),
            PlacementOutcome::SkippedDuplicate { existing } => println!(
                "{} == {} [重複スキップ]",
                entry.source_path.display(),
                existing.display()
            ),
            PlacementOutcome::Failed { reason } => {
                println!("{} [失敗] {}", entry.source_path.display(), reason)
            }
        }
    }

    println!(
        "\n集計: scanned={} moved={} simulated={} duplicate_skip={} failed={} hidden_skip={} filter_skip={}",
        report.stats.scanned_files,
        report.summary.moved,
        report.summary.simulated,
        report.summary.skipped,
        report.summary.failed,
        report.stats.skipped_hidden,
        report.stats.skipped_filtered,
    );

    for entry in &report.outcomes {
        if let PlacementOutcome::Failed { reason } = &entry.outcome {
            eprintln!("失敗: {}: {}", entry.source_path.display(), reason);
        }
    }
}

fn source_label(source: Option<DateSource>) -> &'static str {
    match source {
        Some(DateSource::Exif) => "exif",
        Some(DateSource::FileModified) => "mtime",
        None => "-",
    }
}
