//! uireplay CLI - record and replay page interaction sessions

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::sync::atomic::Ordering;
use uireplay_core::prelude::*;
use uireplay_recorder::prelude::*;

#[derive(Parser)]
#[command(name = "uireplay")]
#[command(about = "Record and replay UI interaction sessions against page fixtures")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a capture session from a page fixture and a signal script
    Record {
        /// Page fixture (JSON)
        page: String,

        /// Interaction script (JSON array of steps)
        script: String,
    },

    /// Replay a stored recording against a page fixture
    Replay {
        /// Page fixture (JSON)
        page: String,

        /// Recording file
        file: String,

        /// Playback speed (1.0 = recorded pacing, 2.0 = 2x)
        #[arg(short, long, default_value = "1.0")]
        speed: f64,
    },

    /// List saved recordings
    List,

    /// Show recording info
    Show {
        /// Recording file
        file: String,

        /// Show all events
        #[arg(long)]
        all: bool,
    },

    /// Delete a recording
    Delete {
        /// Recording file
        file: String,
    },
}

/// One step of a scripted capture session.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ScriptStep {
    Click {
        target: String,
        x: Option<f64>,
        y: Option<f64>,
    },
    Input {
        target: String,
        value: String,
    },
    Change {
        target: String,
        value: String,
        index: Option<i32>,
    },
    Key {
        target: String,
        key: String,
    },
    Scroll {
        target: String,
        top: f64,
        #[serde(default)]
        left: f64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Record { page, script } => record(&page, &script)?,
        Commands::Replay { page, file, speed } => replay(&page, &file, speed)?,
        Commands::List => list()?,
        Commands::Show { file, all } => show(&file, all)?,
        Commands::Delete { file } => delete(&file)?,
    }

    Ok(())
}

fn load_page(path: &str) -> Result<PageTree> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("read {}", path))?;
    Ok(PageTree::from_json(&raw)?)
}

/// `#name` looks up a stable identifier; anything else is a structural path.
fn resolve_target(page: &PageTree, target: &str) -> Result<NodeId> {
    if let Some(id) = target.strip_prefix('#') {
        return page
            .find_by_id(id)
            .ok_or_else(|| anyhow!("no element with id '{}'", id));
    }
    Ok(Locator::new(page).resolve_str(target)?)
}

fn record(page_file: &str, script_file: &str) -> Result<()> {
    let mut page = load_page(page_file)?;
    let raw = std::fs::read_to_string(script_file).with_context(|| format!("read {}", script_file))?;
    let steps: Vec<ScriptStep> = serde_json::from_str(&raw).context("parse script")?;

    let mut registry = EditableRegistry::new();
    registry.scan(&mut page);

    let session = RecorderSession::new();
    session.start();

    for step in steps {
        apply_step(&mut page, &session, step)?;
    }

    let recording = session.stop();
    println!("{} events captured", recording.events.len());

    let store = RecordingStore::new()?;
    let path = store.save(&recording)?;
    println!("Saved: {}", path.display());

    Ok(())
}

fn apply_step(page: &mut PageTree, session: &RecorderSession, step: ScriptStep) -> Result<()> {
    match step {
        ScriptStep::Click { target, x, y } => {
            let node = resolve_target(page, &target)?;
            let center = page
                .element(node)
                .map(|e| e.bounds.center())
                .unwrap_or_default();
            session.on_signal(
                page,
                Signal::PointerDown {
                    x: x.unwrap_or(center.0),
                    y: y.unwrap_or(center.1),
                    target: node,
                },
            );
        }
        ScriptStep::Input { target, value } => {
            let node = resolve_target(page, &target)?;
            page.set_value(node, &value)?;
            session.on_signal(page, Signal::Input { target: node, genuine: true });
        }
        ScriptStep::Change { target, value, index } => {
            let node = resolve_target(page, &target)?;
            page.set_value(node, &value)?;
            if let Some(index) = index {
                page.set_selected_index(node, index)?;
            }
            session.on_signal(page, Signal::Change { target: node, genuine: true });
        }
        ScriptStep::Key { target, key } => {
            let node = resolve_target(page, &target)?;
            session.on_signal(page, Signal::KeyDown { target: node, key });
        }
        ScriptStep::Scroll { target, top, left } => {
            let node = resolve_target(page, &target)?;
            page.set_scroll(node, top, left)?;
            session.on_signal(page, Signal::Scroll { target: node });
        }
    }
    Ok(())
}

fn replay(page_file: &str, file: &str, speed: f64) -> Result<()> {
    let mut page = load_page(page_file)?;

    // Re-scan so anonymous editable elements get the same synthetic ids
    // they carried at record time (scan order is document order).
    let mut registry = EditableRegistry::new();
    registry.scan(&mut page);

    let store = RecordingStore::new()?;
    let recording = store.load(file)?;

    println!(
        "Replaying {} ({} events) at {}x speed... (Ctrl+C to stop)",
        recording.id,
        recording.events.len(),
        speed
    );

    let replayer = Replayer::new().speed(speed);
    let stop = replayer.stop_flag();
    ctrlc::set_handler(move || {
        stop.store(true, Ordering::SeqCst);
    })?;

    let stats = replayer.play(&recording, &mut page);

    println!(
        "Done! {} clicks, {} inputs, {} keys, {} scrolls ({} skipped, {} not found, {} failed)",
        stats.clicks, stats.inputs, stats.keys, stats.scrolls, stats.skipped, stats.misses, stats.failures
    );

    Ok(())
}

fn list() -> Result<()> {
    let store = RecordingStore::new()?;
    let files = store.list()?;

    if files.is_empty() {
        println!("No recordings saved.");
    } else {
        for f in files {
            println!("{}", f);
        }
    }

    Ok(())
}

fn show(file: &str, all: bool) -> Result<()> {
    let store = RecordingStore::new()?;
    let recording = store.load(file)?;

    println!("Id: {}", recording.id);
    println!("Recorded: {}", recording.timestamp);
    println!("Events: {}", recording.events.len());
    println!("Network calls: {}", recording.http_events.len());

    let mut clicks = 0;
    let mut touches = 0;
    let mut inputs = 0;
    let mut changes = 0;
    let mut keys = 0;
    let mut scrolls = 0;
    let mut network = 0;

    for e in &recording.events {
        match &e.data {
            EventData::PointerDown { .. } => clicks += 1,
            EventData::Touch { .. } => touches += 1,
            EventData::Input { .. } => inputs += 1,
            EventData::Change { .. } => changes += 1,
            EventData::Key { .. } => keys += 1,
            EventData::Scroll { .. } => scrolls += 1,
            EventData::Network { .. } => network += 1,
        }
    }

    println!("\nSummary:");
    println!("  Clicks: {}", clicks);
    println!("  Touches: {}", touches);
    println!("  Inputs: {}", inputs);
    println!("  Changes: {}", changes);
    println!("  Keys: {}", keys);
    println!("  Scrolls: {}", scrolls);
    println!("  Network markers: {}", network);

    if all {
        println!("\nEvents:");
        for (i, e) in recording.events.iter().enumerate() {
            println!("{}: {:?}", i, e);
        }
    }

    Ok(())
}

fn delete(file: &str) -> Result<()> {
    let store = RecordingStore::new()?;
    store.delete(file)?;
    println!("Deleted: {}", file);
    Ok(())
}
