//! Schedule, validate and watch commands
//!
//! `watch` keeps an edit session over the document. Saves made by other
//! tools are grouped into undo steps, and typing `u`, `r` or `q` on stdin
//! undoes, redoes or stops. Undo and redo write the restored document back.

use std::io::{self, BufRead};
use std::path::Path;
use std::str::FromStr;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult};

use super::app::Workspace;
use super::output::Output;
use crate::domain::Project;
use crate::history::EditSession;
use crate::schedule::{
    compute_schedule, DateRange, PlacementSource, Schedule, ScheduleContext, ScheduleMode,
};

fn context_for(ws: &Workspace, window: Option<(NaiveDate, NaiveDate)>) -> Result<ScheduleContext> {
    let mut ctx = ws.config.schedule.context();
    if let Some((from, to)) = window {
        if to < from {
            bail!("--to ({}) is before --from ({})", to, from);
        }
        ctx.range = Some(DateRange::new(from, to));
    }
    Ok(ctx)
}

fn mode_for(relative: bool) -> ScheduleMode {
    if relative {
        ScheduleMode::Relative
    } else {
        ScheduleMode::Absolute
    }
}

/// Computes and prints the schedule
pub fn show(
    ws: &Workspace,
    output: &Output,
    relative: bool,
    window: Option<(NaiveDate, NaiveDate)>,
) -> Result<()> {
    let project = ws.load()?;
    let ctx = context_for(ws, window)?;
    let schedule = compute_schedule(
        &project.tasks,
        &project.dependencies,
        mode_for(relative),
        &ctx,
    );
    output.verbose_ctx(
        "schedule",
        &format!(
            "{} task(s), {} link(s), {} issue(s)",
            project.tasks.len(),
            project.dependencies.len(),
            schedule.issues.len()
        ),
    );
    print_schedule(&project, &schedule, &ctx, output);
    Ok(())
}

fn print_schedule(project: &Project, schedule: &Schedule, ctx: &ScheduleContext, output: &Output) {
    if output.is_json() {
        output.data(schedule);
        return;
    }

    if let Some(origin) = schedule.origin {
        println!("Origin: {}", origin);
    }
    for entry in &schedule.tasks {
        let name = project
            .task(&entry.task_id)
            .map(|t| t.name.as_str())
            .unwrap_or("?");
        let Some(placement) = entry.placement else {
            println!("{} {}  unscheduled", entry.task_id, name);
            continue;
        };

        let span = match (entry.start_date, entry.end_date) {
            (Some(start), Some(end)) => format!("{} .. {}", start, end),
            _ => format!("day {} +{}d", placement.relative_start, placement.duration),
        };
        let source = match &entry.source {
            PlacementSource::Dependency(dep) => format!(" (via {})", dep),
            PlacementSource::Default => " (default)".to_string(),
            _ => String::new(),
        };
        let (x, width) = placement.pixel_span(ctx);
        println!(
            "{} {}  {}{}  [x={} w={}]",
            entry.task_id, name, span, source, x, width
        );
    }

    for issue in &schedule.issues {
        output.warn(&issue.to_string());
    }
}

/// Reports document problems; fails if there are any
pub fn validate(ws: &Workspace, output: &Output) -> Result<()> {
    let project = ws.load()?;
    let problems = project.validate();

    if output.is_json() {
        let messages: Vec<String> = problems.iter().map(|p| p.to_string()).collect();
        output.data(&serde_json::json!({
            "valid": problems.is_empty(),
            "problems": messages,
        }));
    } else if problems.is_empty() {
        output.success(&format!("{} is valid", ws.path().display()));
    } else {
        for problem in &problems {
            println!("  {}", problem);
        }
    }

    if !problems.is_empty() {
        bail!("{} problem(s) found", problems.len());
    }
    Ok(())
}

/// A line typed while watching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchCommand {
    Undo,
    Redo,
    Quit,
}

impl FromStr for WatchCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "u" | "undo" => Ok(Self::Undo),
            "r" | "redo" => Ok(Self::Redo),
            "q" | "quit" => Ok(Self::Quit),
            other => Err(format!("Unknown command '{}' (u = undo, r = redo, q = quit)", other)),
        }
    }
}

enum WatchEvent {
    Changed(DebounceEventResult),
    Input(String),
}

/// Applies undo/redo to the session; returns false if there was nothing to do
fn replay(session: &mut EditSession, command: WatchCommand, now: Duration) -> bool {
    match command {
        WatchCommand::Undo => session.undo(now),
        WatchCommand::Redo => session.redo(now),
        WatchCommand::Quit => false,
    }
}

fn print_current(session: &EditSession, mode: ScheduleMode, ctx: &ScheduleContext, output: &Output) {
    let project = session.project();
    let schedule = compute_schedule(&project.tasks, &project.dependencies, mode, ctx);
    print_schedule(project, &schedule, ctx, output);
}

/// Reprints the schedule each time the document changes on disk
pub fn watch(ws: &Workspace, output: &Output, relative: bool) -> Result<()> {
    let ctx = ws.config.schedule.context();
    let mode = mode_for(relative);
    let history = &ws.config.history;
    let started = Instant::now();

    let project = ws.load()?;
    let mut session = EditSession::with_config(project, history, started.elapsed());
    print_current(&session, mode, &ctx, output);

    let watch_dir = ws
        .path()
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let file_name = ws
        .path()
        .file_name()
        .context("Document path has no file name")?
        .to_os_string();

    let (tx, rx) = mpsc::channel();

    let fs_tx = tx.clone();
    let mut debouncer = new_debouncer(history.debounce(), move |result: DebounceEventResult| {
        let _ = fs_tx.send(WatchEvent::Changed(result));
    })?;
    debouncer
        .watcher()
        .watch(&watch_dir, RecursiveMode::NonRecursive)?;

    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            if tx.send(WatchEvent::Input(line)).is_err() {
                break;
            }
        }
    });

    if !output.is_json() {
        eprintln!("Watching {} (u = undo, r = redo, q = quit)", ws.path().display());
    }
    output.verbose_ctx(
        "watch",
        &format!("Debounce {}ms, history capacity {}", history.debounce_ms, history.capacity),
    );

    loop {
        match rx.recv_timeout(history.debounce()) {
            Ok(WatchEvent::Changed(Ok(events))) => {
                if !events
                    .iter()
                    .any(|e| e.path.file_name() == Some(file_name.as_os_str()))
                {
                    continue;
                }

                let project = match ws.load() {
                    Ok(project) => project,
                    Err(e) => {
                        output.warn(&format!("{:#}", e));
                        continue;
                    }
                };
                if session.project() == &project {
                    // Our own undo/redo write, or a save without changes
                    continue;
                }
                session.edit(started.elapsed(), |current| *current = project);
                print_current(&session, mode, &ctx, output);
            }
            Ok(WatchEvent::Changed(Err(e))) => output.warn(&format!("Watch error: {:?}", e)),
            Ok(WatchEvent::Input(line)) => {
                let command = match line.parse::<WatchCommand>() {
                    Ok(command) => command,
                    Err(e) => {
                        output.warn(&e);
                        continue;
                    }
                };
                if command == WatchCommand::Quit {
                    break;
                }

                if replay(&mut session, command, started.elapsed()) {
                    ws.save(session.project())?;
                    output.verbose_ctx(
                        "history",
                        &format!(
                            "{:?} applied ({} undo, {} redo left)",
                            command,
                            session.history().past_len(),
                            session.history().future_len()
                        ),
                    );
                    print_current(&session, mode, &ctx, output);
                } else {
                    let verb = if command == WatchCommand::Undo { "undo" } else { "redo" };
                    output.warn(&format!("Nothing to {}", verb));
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if session.tick(started.elapsed()) {
                    output.verbose_ctx(
                        "history",
                        &format!("{} step(s) recorded", session.history().past_len()),
                    );
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn parse_watch_commands() {
        assert_eq!("u".parse::<WatchCommand>(), Ok(WatchCommand::Undo));
        assert_eq!(" Redo ".parse::<WatchCommand>(), Ok(WatchCommand::Redo));
        assert_eq!("q".parse::<WatchCommand>(), Ok(WatchCommand::Quit));
        assert!("x".parse::<WatchCommand>().is_err());
    }

    #[test]
    fn replay_walks_recorded_changes() {
        let original = Project::new("Demo");
        let mut session = EditSession::new(original.clone(), ms(0));

        // An external save picked up by the watcher
        let mut changed = original.clone();
        changed.name = "Renamed".into();
        session.edit(ms(10), |current| *current = changed.clone());
        assert!(session.tick(ms(400)));

        assert!(replay(&mut session, WatchCommand::Undo, ms(500)));
        assert_eq!(session.project(), &original);
        assert!(!replay(&mut session, WatchCommand::Undo, ms(510)));

        assert!(replay(&mut session, WatchCommand::Redo, ms(520)));
        assert_eq!(session.project(), &changed);
        assert!(!replay(&mut session, WatchCommand::Redo, ms(530)));
        assert!(!replay(&mut session, WatchCommand::Quit, ms(540)));
    }
}
