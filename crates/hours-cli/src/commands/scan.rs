//! Scan command for running a single sampling pass.

use std::io::Write;

use anyhow::Result;

use crate::commands::status;
use crate::repo::Repo;

pub fn run<W: Write>(writer: &mut W, repo: &Repo) -> Result<()> {
    let _lock = repo.lock()?;
    let mut store = repo.load_store();
    repo.sample(&mut store)?;
    status::write_status(writer, &store)
}
