//! Watch command: periodic sampling plus an interactive menu.
//!
//! A background thread runs one aggregation pass per poll interval. The
//! store lives behind a mutex held for the whole pass, so the menu only
//! ever prints a snapshot taken between passes.

use std::io::{BufRead, Write};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use hours_core::StatsStore;

use crate::commands::{dump, status};
use crate::repo::Repo;

pub fn run<R: BufRead, W: Write>(
    input: R,
    output: &mut W,
    repo: Repo,
    interval: Duration,
) -> Result<()> {
    let _lock = repo.lock()?;
    let store = Arc::new(Mutex::new(repo.load_store()));
    let sampler = Sampler::spawn(Arc::new(repo), Arc::clone(&store), interval)?;

    let result = run_menu(input, output, &store);
    sampler.stop();
    result
}

/// Background thread that samples the repository until stopped.
pub struct Sampler {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl Sampler {
    pub fn spawn(repo: Arc<Repo>, store: Arc<Mutex<StatsStore>>, interval: Duration) -> Result<Self> {
        let (stop, stopped) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("hours-sampler".to_string())
            .spawn(move || {
                tracing::debug!(interval_secs = interval.as_secs(), "sampler started");
                loop {
                    match stopped.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let mut store = store.lock().unwrap_or_else(PoisonError::into_inner);
                            if let Err(e) = repo.sample(&mut store) {
                                tracing::warn!("sampling pass not saved: {e:#}");
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                tracing::debug!("sampler stopped");
            })
            .context("failed to start sampler thread")?;
        Ok(Self { stop, handle })
    }

    /// Stops sampling, letting an in-flight pass finish first.
    pub fn stop(self) {
        let _ = self.stop.send(());
        if self.handle.join().is_err() {
            tracing::warn!("sampler thread panicked");
        }
    }
}

/// Menu entries, numbered as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    Exit,
    PrintJson,
    PrintTime,
}

impl MenuChoice {
    fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "0" => Some(Self::Exit),
            "1" => Some(Self::PrintJson),
            "2" => Some(Self::PrintTime),
            _ => None,
        }
    }
}

/// Reads menu choices from `input` until exit or end of input.
pub fn run_menu<R: BufRead, W: Write>(
    mut input: R,
    output: &mut W,
    store: &Mutex<StatsStore>,
) -> Result<()> {
    let mut line = String::new();
    loop {
        writeln!(output, "Choose an option")?;
        writeln!(output, "    0) Exit")?;
        writeln!(output, "    1) Print json")?;
        writeln!(output, "    2) Print time")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line).context("failed to read menu choice")? == 0 {
            return Ok(());
        }

        let Some(choice) = MenuChoice::parse(&line) else {
            writeln!(output, "Unknown option: {}", line.trim())?;
            continue;
        };
        if choice == MenuChoice::Exit {
            return Ok(());
        }

        let snapshot = store.lock().unwrap_or_else(PoisonError::into_inner).clone();
        match choice {
            MenuChoice::PrintJson => dump::write_dump(output, &snapshot)?,
            MenuChoice::PrintTime => status::write_status(output, &snapshot)?,
            MenuChoice::Exit => {}
        }
    }
}
