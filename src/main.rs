use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use console::Emoji;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use podfold::{
    Config, FeedOptions, NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter,
    UnreadablePolicy, generate_feeds,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "[?] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

/// Generate podcast RSS feeds from folders of audio files
#[derive(Parser, Debug)]
#[command(name = "podfold")]
#[command(about = "Generate podcast RSS feeds from folders of audio files")]
#[command(version)]
struct Args {
    /// Root folder containing config.json, or path to a JSON config file
    path: PathBuf,

    /// Keep files no decoder can read, without a duration
    #[arg(long)]
    keep_unreadable: bool,

    /// Quiet mode - suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

/// Progress reporter using indicatif for terminal output
struct IndicatifReporter {
    multi: MultiProgress,
    folder_bar: Mutex<Option<ProgressBar>>,
    main_bar: ProgressBar,
}

impl IndicatifReporter {
    fn new() -> Self {
        let multi = MultiProgress::new();

        let main_style = ProgressStyle::default_bar()
            .template("{spinner:.green} {wide_msg}")
            .unwrap();

        let main_bar = multi.add(ProgressBar::new_spinner());
        main_bar.set_style(main_style);
        main_bar.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            multi,
            folder_bar: Mutex::new(None),
            main_bar,
        }
    }

    fn start_folder_bar(&self, total: usize) {
        let style = ProgressStyle::default_bar()
            .template("  [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap()
            .progress_chars("█▓░");

        let bar = self.multi.add(ProgressBar::new(total as u64));
        bar.set_style(style);

        let mut slot = self.folder_bar.lock().unwrap();
        if let Some(previous) = slot.replace(bar) {
            previous.finish_and_clear();
        }
    }

    fn with_folder_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Some(bar) = self.folder_bar.lock().unwrap().as_ref() {
            f(bar);
        }
    }

    fn finish_folder_bar(&self) {
        if let Some(bar) = self.folder_bar.lock().unwrap().take() {
            bar.finish_and_clear();
        }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::ScanningRoot { root } => {
                self.main_bar.set_message(format!(
                    "{SEARCH}Scanning {}",
                    root.display().to_string().cyan()
                ));
            }

            ProgressEvent::FolderStarted {
                folder,
                audio_files,
            } => {
                self.main_bar.set_message(format!(
                    "{HEADPHONES}{} • {} audio files",
                    folder.bold().green(),
                    audio_files.to_string().cyan()
                ));
                self.start_folder_bar(audio_files);
            }

            ProgressEvent::EpisodeProcessed {
                file_name, index, ..
            } => {
                self.with_folder_bar(|bar| {
                    bar.set_position(index as u64 + 1);
                    bar.set_message(truncate_title(&file_name, 40));
                });
            }

            ProgressEvent::DurationUnknown { path, .. } => {
                self.multi
                    .println(format!(
                        "  {WARNING}{} {}",
                        "Unknown duration:".yellow(),
                        path.display().to_string().dimmed()
                    ))
                    .ok();
            }

            ProgressEvent::FileExcluded { path, reason, .. } => {
                self.multi
                    .println(format!(
                        "  {CROSS}{} - {}",
                        path.display().to_string().yellow(),
                        reason.dimmed()
                    ))
                    .ok();
            }

            ProgressEvent::FolderSkipped { .. } => {}

            ProgressEvent::FeedWritten {
                folder, episodes, ..
            } => {
                self.finish_folder_bar();
                self.multi
                    .println(format!(
                        "{SUCCESS}{} ({} episodes)",
                        folder.green(),
                        episodes.to_string().cyan()
                    ))
                    .ok();
            }

            ProgressEvent::FolderFailed { folder, error } => {
                self.finish_folder_bar();
                self.multi
                    .println(format!("{FAILURE}{} - {}", folder.red(), error.red()))
                    .ok();
            }

            ProgressEvent::RunCompleted {
                feeds_written,
                folders_skipped,
                folders_failed,
                files_excluded,
            } => {
                self.finish_folder_bar();
                self.main_bar.finish_and_clear();
                println!(
                    "\n{PARTY}{} {} feeds written, {} folders skipped, {} failed, {} files excluded",
                    "Done:".bold().green(),
                    feeds_written.to_string().green().bold(),
                    folders_skipped.to_string().yellow(),
                    if folders_failed > 0 {
                        folders_failed.to_string().red().bold()
                    } else {
                        folders_failed.to_string().green()
                    },
                    files_excluded.to_string().yellow()
                );
            }
        }
    }
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let kept: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn load_config(path: &Path) -> Result<Config> {
    let path = std::fs::canonicalize(path)
        .with_context(|| format!("Cannot access {}", path.display()))?;

    let config = if path.is_dir() {
        Config::load_for_root(&path)?
    } else {
        Config::load(&path)?
    };

    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if !args.quiet {
        println!(
            "\n{}{} {}\n",
            MICROPHONE,
            "podfold".bold().magenta(),
            "- Podcast Feed Generator".dimmed()
        );
    }

    let config = load_config(&args.path).context("Failed to load configuration")?;

    let options = FeedOptions {
        unreadable: if args.keep_unreadable {
            UnreadablePolicy::Keep
        } else {
            UnreadablePolicy::Skip
        },
    };

    let reporter: SharedProgressReporter = if args.quiet {
        NoopReporter::shared()
    } else {
        Arc::new(IndicatifReporter::new())
    };

    let result =
        generate_feeds(&config, &options, reporter).context("Failed to generate feeds")?;

    if !args.quiet && !result.failed.is_empty() {
        println!("\n{}", "Failed folders:".red().bold());
        for (folder, error) in &result.failed {
            println!(
                "  {}{} - {}",
                CROSS,
                folder.display().to_string().yellow(),
                error.dimmed()
            );
        }
    }

    if !args.quiet {
        for written in &result.written {
            println!(
                "{FOLDER}{}",
                written.path.display().to_string().cyan()
            );
        }
        println!();
    }

    if result.all_failed() {
        std::process::exit(1);
    }

    Ok(())
}
