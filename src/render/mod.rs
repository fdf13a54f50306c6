//! Chart output: an interactive HTML page and a static PNG.

pub mod html;
pub mod png;

use crate::burndown::Burndown;
use crate::error::{BurndownError, Result};
use std::path::Path;

pub use png::write_png;

pub fn write_html(burndown: &Burndown, title: &str, path: &Path) -> Result<()> {
    let mut page = String::new();
    html::generate(burndown, title, &mut page)
        .map_err(|_| BurndownError::Render(format!("could not format {}", path.display())))?;
    std::fs::write(path, page).map_err(|err| BurndownError::io(path, err))?;
    log::info!("wrote interactive chart {}", path.display());
    Ok(())
}
