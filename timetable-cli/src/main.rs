//! Timetable CLI Tool
//!
//! Command-line interface for inspecting and editing the recording timetable
//! of a project stored as a JSON snapshot.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::executor::block_on;
use std::path::{Path, PathBuf};
use timetable_core::duration::format_duration_text;
use timetable_core::time_grid::minutes_to_time;
use timetable_core::{Editor, EditorConfig, ItemId, ScheduleItemKind, TrackGeometry};
use timetable_sync::{FlushReport, MemoryBackend, ProjectSnapshot, ScheduleSession};

#[derive(Parser, Debug)]
#[command(name = "timetable")]
#[command(about = "Recording timetable editor - segments, breaks and preparation on one time axis")]
#[command(version)]
struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbosity: u8,

    /// Duration given to segments whose duration text cannot be parsed
    #[arg(long, default_value = "30", global = true)]
    default_segment_minutes: i32,

    /// Duration of items created by `add`
    #[arg(long, default_value = "10", global = true)]
    new_item_minutes: i32,

    /// Track width in pixels used for the layout columns
    #[arg(long, default_value = "1000", global = true)]
    track_width: f64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every item with its time, lane, layout and conflicts
    Show {
        /// Project snapshot (JSON)
        project: PathBuf,
    },

    /// Print the 10-minute ruler of the recording window
    Grid {
        /// Project snapshot (JSON)
        project: PathBuf,
    },

    /// List segments scheduled outside a participant's availability
    Conflicts {
        /// Project snapshot (JSON)
        project: PathBuf,
    },

    /// Move an item to a new start time
    Move {
        /// Project snapshot (JSON)
        project: PathBuf,

        /// Item id (`segment:<id>`, `item:<id>` or a bare segment id)
        item: String,

        /// New start time (HH:MM), snapped to the grid
        time: String,
    },

    /// Change the duration of an item
    Resize {
        /// Project snapshot (JSON)
        project: PathBuf,

        /// Item id (`segment:<id>`, `item:<id>` or a bare segment id)
        item: String,

        /// New duration in minutes, or text such as `1時間30分`
        duration: String,
    },

    /// Append a break, preparation or custom block after the last item
    Add {
        /// Project snapshot (JSON)
        project: PathBuf,

        /// break, preparation or custom
        #[arg(long, default_value = "break")]
        kind: ScheduleItemKind,

        /// Title; defaults to the kind's name
        #[arg(long)]
        title: Option<String>,
    },

    /// Remove a break, preparation or custom block
    Remove {
        /// Project snapshot (JSON)
        project: PathBuf,

        /// Item id (`item:<id>`)
        item: String,
    },

    /// Write the full state of every item back to the project
    SaveAll {
        /// Project snapshot (JSON)
        project: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity);
    log::debug!("Command-line args: {:?}", cli);

    let config = EditorConfig {
        default_segment_minutes: cli.default_segment_minutes,
        new_item_minutes: cli.new_item_minutes,
        track: TrackGeometry {
            width: cli.track_width,
            ..TrackGeometry::default()
        },
        ..EditorConfig::default()
    };

    match cli.command {
        Commands::Show { project } => {
            let session = open_session(&project, config)?;
            print_items(session.editor());
        }

        Commands::Grid { project } => {
            let session = open_session(&project, config)?;
            print_grid(session.editor());
        }

        Commands::Conflicts { project } => {
            let session = open_session(&project, config)?;
            print_conflicts(session.editor());
        }

        Commands::Move { project, item, time } => {
            let mut session = open_session(&project, config)?;
            let id = ItemId::parse(&item);
            let span = session
                .editor_mut()
                .edit_time(&id, &time)
                .with_context(|| format!("Failed to move {}", id))?;
            println!("Moved {} to {}", id, minutes_to_time(span.start));
            commit(&mut session, &project)?;
        }

        Commands::Resize {
            project,
            item,
            duration,
        } => {
            let mut session = open_session(&project, config)?;
            let id = ItemId::parse(&item);
            let span = session
                .editor_mut()
                .edit_duration(&id, &duration)
                .with_context(|| format!("Failed to resize {}", id))?;
            println!(
                "Resized {} to {} ({}-{})",
                id,
                format_duration_text(span.duration),
                minutes_to_time(span.start),
                minutes_to_time(span.end())
            );
            commit(&mut session, &project)?;
        }

        Commands::Add {
            project,
            kind,
            title,
        } => {
            let mut session = open_session(&project, config)?;
            let id = session
                .editor_mut()
                .add_item(kind, title.as_deref())
                .context("Failed to add item")?;
            commit(&mut session, &project)?;
            // The id is only meaningful once the store has assigned one
            match session
                .editor()
                .store()
                .get(&id)
                .and_then(|item| item.external_id.clone())
            {
                Some(external_id) => println!("Added {}", ItemId::schedule(&external_id)),
                None => println!("Added {} (not persisted)", id),
            }
        }

        Commands::Remove { project, item } => {
            let mut session = open_session(&project, config)?;
            let id = ItemId::parse(&item);
            let removed = session
                .editor_mut()
                .remove_item(&id)
                .with_context(|| format!("Failed to remove {}", id))?;
            println!("Removed {} ({})", id, removed.title);
            commit(&mut session, &project)?;
        }

        Commands::SaveAll { project } => {
            let mut session = open_session(&project, config)?;
            let outcome = block_on(session.save_all()).context("Bulk save failed")?;
            write_snapshot(&session, &project)?;
            println!(
                "Saved {} requests at {}",
                outcome.requests,
                outcome.saved_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }

    Ok(())
}

/// Console logging from `-v` counts; `RUST_LOG` wins when set
fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

fn open_session(path: &Path, config: EditorConfig) -> Result<ScheduleSession<MemoryBackend>> {
    let snapshot = ProjectSnapshot::load(path)
        .with_context(|| format!("Failed to read project {}", path.display()))?;
    block_on(ScheduleSession::open(MemoryBackend::new(snapshot), config))
        .context("Failed to open project")
}

/// Flushes queued changes and writes the project back
fn commit(session: &mut ScheduleSession<MemoryBackend>, path: &Path) -> Result<()> {
    let report = block_on(session.flush());
    print_flush(&report);
    write_snapshot(session, path)
}

fn write_snapshot(session: &ScheduleSession<MemoryBackend>, path: &Path) -> Result<()> {
    session
        .backend()
        .snapshot()
        .context("Failed to read backend state")?
        .save(path)
        .with_context(|| format!("Failed to write project {}", path.display()))
}

fn print_flush(report: &FlushReport) {
    if report.is_clean() {
        log::info!("Persisted {} changes", report.sent);
        return;
    }
    for failed in &report.failed {
        eprintln!("Not persisted: {:?} ({})", failed.notification, failed.error);
    }
}

fn print_items(editor: &Editor) {
    let window = editor.window();
    println!("\n=== Timetable {} ===", window.to_field());
    println!("Items: {}", editor.store().len());
    println!(
        "{:<24} {:<12} {:<13} {:>10} {:>5} {:>8} {:>8} {:<8} {}",
        "ID", "KIND", "TIME", "DURATION", "LANE", "LEFT%", "WIDTH%", "COLOR", "TITLE"
    );

    let store = editor.store();
    for id in store.sorted_ids() {
        let (Some(item), Some(layout)) = (store.get(&id), editor.layout(&id)) else {
            continue;
        };
        println!(
            "{:<24} {:<12} {:<13} {:>10} {:>5} {:>8.2} {:>8.2} {:<8} {}",
            id.to_string(),
            format!("{:?}", item.kind),
            format!("{}-{}", minutes_to_time(item.start), minutes_to_time(item.end())),
            format_duration_text(item.duration),
            layout.lane,
            layout.left_percent,
            layout.width_percent,
            item.color().hex(),
            item.title
        );
        let conflicts = editor.conflicts(&id);
        if !conflicts.is_empty() {
            println!("{:<24} ! outside availability: {}", "", conflicts.join(", "));
        }
    }
}

fn print_grid(editor: &Editor) {
    for mark in editor.grid() {
        let tick = if mark.is_hour_mark {
            "|"
        } else if mark.is_half_hour_mark {
            ":"
        } else {
            "."
        };
        println!("{} {} {:>6.2}%", tick, mark.time, mark.position_percent);
    }
}

fn print_conflicts(editor: &Editor) {
    let report = editor.conflict_report();
    if report.is_empty() {
        println!("No availability conflicts");
        return;
    }
    for (id, names) in report {
        let title = editor
            .store()
            .get(&id)
            .map(|item| item.title.as_str())
            .unwrap_or_default();
        println!("{} {}: {}", id, title, names.join(", "));
    }
}
