use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use roadflow_core::{
    Error,
    cycle::{SnapshotDocument, SnapshotSink},
};

/// Writes every document to `<dir>/<cycle>.json`.
///
/// The file is written under a temporary name and renamed into place, so a
/// document either exists completely or not at all.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, cycle_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", stem(cycle_id)))
    }

    /// Marker left by a cycle that could not be processed
    pub fn failed_path_for(&self, cycle_id: &str) -> PathBuf {
        self.dir.join(format!("{}.failed", stem(cycle_id)))
    }
}

fn stem(cycle_id: &str) -> &str {
    cycle_id.split('.').next().unwrap_or(cycle_id)
}

impl SnapshotSink for JsonFileSink {
    fn store(&mut self, document: &SnapshotDocument) -> Result<(), Error> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&document.meta.filename);
        let partial = path.with_extension("json.partial");

        let mut writer = BufWriter::new(File::create(&partial)?);
        serde_json::to_writer(&mut writer, document)?;
        writer.flush()?;
        fs::rename(&partial, &path)?;

        tracing::debug!("Stored {} links to {}", document.links.len(), path.display());
        Ok(())
    }
}
