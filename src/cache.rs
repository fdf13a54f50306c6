//! Flat JSON dump of fetched issues, reused on later runs.

use crate::error::{BurndownError, Result};
use crate::models::RawIssue;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub fn write_issues(path: &Path, issues: &[RawIssue]) -> Result<()> {
    let file = File::create(path).map_err(|err| BurndownError::io(path, err))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, issues).map_err(|source| BurndownError::Cache {
        path: path.to_path_buf(),
        source,
    })?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .map_err(|err| BurndownError::io(path, err))?;
    log::info!("wrote {} issues to {}", issues.len(), path.display());
    Ok(())
}

pub fn read_issues(path: &Path) -> Result<Vec<RawIssue>> {
    let file = File::open(path).map_err(|err| BurndownError::io(path, err))?;
    let issues: Vec<RawIssue> =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| BurndownError::Cache {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!("read {} issues from {}", issues.len(), path.display());
    Ok(issues)
}
