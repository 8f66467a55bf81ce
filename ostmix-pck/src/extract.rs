//! Stream extraction

use crate::error::Result;
use crate::index::PckIndex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Write every stream of the container at `pck_path` to `<out_dir>/<id>.wem`
///
/// The output directory is created if needed. Returns the written paths in
/// index order; a stream id listed twice keeps its last entry.
pub fn extract(pck_path: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let data = fs::read(pck_path)?;
    let index = PckIndex::parse(&data)?;
    fs::create_dir_all(out_dir)?;

    info!(
        "Extracting {} stream(s) from {}",
        index.len(),
        pck_path.display()
    );

    let mut written = Vec::with_capacity(index.len());
    for entry in &index.entries {
        let range = entry.range(data.len())?;
        let path = out_dir.join(format!("{}.wem", entry.id));
        fs::write(&path, &data[range])?;
        debug!("Wrote {} ({} bytes)", path.display(), entry.length);
        if !written.contains(&path) {
            written.push(path);
        }
    }

    Ok(written)
}
