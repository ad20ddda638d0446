use std::path::Path;

use super::{list_artifacts, EntryOrder, TextFilter};
use crate::Result;

/// Full content of every text file in `dir`, one cell per file, in visiting order.
///
/// Files that cannot be read as UTF-8 text are logged and left out of the table.
pub fn collect_cells(dir: &Path, order: EntryOrder, filter: &TextFilter) -> Result<Vec<String>> {
    let listing = list_artifacts(dir, order, filter)?;

    let cells = listing
        .artifacts
        .iter()
        .filter_map(|artifact| match fs_err::read_to_string(&artifact.path) {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::warn!("Skipping {}: {}", artifact.name, e);
                None
            }
        })
        .collect();

    Ok(cells)
}

/// Write each text file of `dir` as one CSV row, last visited first
pub fn tabulate_directory(
    dir: &Path,
    output: &Path,
    order: EntryOrder,
    filter: &TextFilter,
) -> Result<usize> {
    let mut cells = collect_cells(dir, order, filter)?;
    cells.reverse();

    crate::output::write_section_table(output, &cells)?;
    tracing::info!("Wrote {} files to {}", cells.len(), output.display());
    Ok(cells.len())
}
