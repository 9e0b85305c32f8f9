//! Dump command for printing every tracked path.

use std::io::Write;

use anyhow::{Context, Result};
use hours_core::StatsStore;

use crate::repo::Repo;

pub fn run<W: Write>(writer: &mut W, repo: &Repo) -> Result<()> {
    let store = repo.load_store();
    write_dump(writer, &store)
}

/// Writes `store` as pretty-printed JSON, sorted by path.
pub fn write_dump<W: Write>(writer: &mut W, store: &StatsStore) -> Result<()> {
    let json = serde_json::to_string_pretty(store).context("failed to encode stats")?;
    writeln!(writer, "{json}")?;
    Ok(())
}
