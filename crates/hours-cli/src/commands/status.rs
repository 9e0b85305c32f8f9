//! Status command for showing the time worked on the repository.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat};
use hours_core::{StatsStore, WorkedTime};

use crate::repo::Repo;

pub fn run<W: Write>(writer: &mut W, repo: &Repo) -> Result<()> {
    let store = repo.load_store();
    write_status(writer, &store)
}

/// Writes the repository total, or a notice that nothing is recorded yet.
pub fn write_status<W: Write>(writer: &mut W, store: &StatsStore) -> Result<()> {
    let Some(root) = store.root() else {
        writeln!(writer, "No time has been recorded for this repository yet.")?;
        return Ok(());
    };

    writeln!(
        writer,
        "You have spent {} working on this repo",
        WorkedTime::from_secs(root.total_worked)
    )?;
    if let Some(last) = DateTime::from_timestamp(root.last_seen_mod_time, 0) {
        writeln!(
            writer,
            "Last activity: {}",
            last.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use hours_core::PathStats;
    use insta::assert_snapshot;

    #[test]
    fn status_reports_root_total() {
        let store: StatsStore = [(
            ".".to_string(),
            PathStats {
                last_seen_mod_time: 1_700_000_000,
                total_worked: 3725,
            },
        )]
        .into_iter()
        .collect();

        let mut output = Vec::new();
        write_status(&mut output, &store).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        You have spent 1 hours, 2 minutes, 5 seconds working on this repo
        Last activity: 2023-11-14T22:13:20Z
        ");
    }

    #[test]
    fn status_without_root_entry() {
        let mut output = Vec::new();
        write_status(&mut output, &StatsStore::new()).unwrap();

        assert_snapshot!(
            String::from_utf8(output).unwrap(),
            @"No time has been recorded for this repository yet."
        );
    }
}
