use anyhow::Context;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{end_marker, list_artifacts, start_marker, EntryOrder, Framing, TextFilter, LENGTH_KEY};
use crate::Result;

/// What a merge run wrote and skipped
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Names of merged files, in merge order
    pub merged: Vec<String>,
    /// Names of regular files that were not text
    pub skipped: Vec<String>,
}

/// Write every text file of `dir`, name-sorted and wrapped in markers, to `writer`
pub fn merge_into<W: Write>(
    dir: &Path,
    writer: &mut W,
    filter: &TextFilter,
    framing: Framing,
    exclude: Option<&Path>,
) -> Result<MergeSummary> {
    let listing = list_artifacts(dir, EntryOrder::Name, filter)?;
    let mut summary = MergeSummary {
        merged: Vec::with_capacity(listing.artifacts.len()),
        skipped: listing.skipped,
    };

    for artifact in listing.artifacts {
        if let Some(excluded) = exclude {
            if is_same_file(&artifact.path, excluded) {
                tracing::debug!("Not merging the output document into itself: {}", artifact.name);
                continue;
            }
        }

        let content = fs_err::read(&artifact.path)
            .with_context(|| format!("Failed to read {}", artifact.name))?;

        let start = match framing {
            Framing::Sentinel => start_marker(&artifact.name),
            Framing::LengthPrefixed => {
                format!("{}{}{}", start_marker(&artifact.name), LENGTH_KEY, content.len())
            }
        };

        write!(writer, "\n{}\n", start)?;
        writer.write_all(&content)?;
        write!(writer, "\n{}\n", end_marker(&artifact.name))?;

        summary.merged.push(artifact.name);
    }

    writer.flush()?;
    Ok(summary)
}

/// Merge `dir` into the document at `output`, replacing any previous contents
pub fn merge_directory(
    dir: &Path,
    output: &Path,
    filter: &TextFilter,
    framing: Framing,
) -> Result<MergeSummary> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent)?;
    }

    let file = fs_err::File::create(output).context("Failed to create merged document")?;
    let mut writer = BufWriter::new(file);
    let summary = merge_into(dir, &mut writer, filter, framing, Some(output))?;

    tracing::info!(
        "Merged {} files into {} ({} skipped)",
        summary.merged.len(),
        output.display(),
        summary.skipped.len()
    );
    Ok(summary)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs_err::canonicalize(a), fs_err::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
