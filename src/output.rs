//! Encoding of the run artifacts and their staged, all-or-nothing commit.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempPath};

use crate::classifier::Record;
use crate::error::{PipelineError, Result};
use crate::summary::Summary;

/// One email per row, no header, default `,` delimiter.
pub fn write_records<W: Write>(writer: W, records: &[Record]) -> csv::Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    for record in records {
        csv_writer.write_record([record.email_candidate()])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Header row followed by the data row.
pub fn write_summary<W: Write>(writer: W, summary: &Summary, delimiter: u8) -> csv::Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .from_writer(writer);
    csv_writer.write_record(Summary::header_row())?;
    csv_writer.write_record(summary.data_row())?;
    csv_writer.flush()?;
    Ok(())
}

pub fn create_file(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn store_records(path: &Path, records: &[Record]) -> Result<()> {
    let file = create_file(path)?;
    write_records(file, records).map_err(|source| PipelineError::CsvWrite {
        path: path.to_path_buf(),
        source,
    })
}

pub fn store_summary(path: &Path, summary: &Summary, delimiter: u8) -> Result<()> {
    let file = create_file(path)?;
    write_summary(file, summary, delimiter).map_err(|source| PipelineError::CsvWrite {
        path: path.to_path_buf(),
        source,
    })
}

pub fn store_text(path: &Path, text: &str) -> Result<()> {
    let mut file = create_file(path)?;
    file.write_all(text.as_bytes())
        .map_err(|source| PipelineError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Artifacts written to temporary files next to their destinations.
/// Nothing reaches a destination until `commit`; dropping the stage removes the temporaries.
#[derive(Default)]
pub struct StagedOutput {
    staged: Vec<(NamedTempFile, PathBuf)>,
}

impl StagedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    pub fn stage_records(&mut self, destination: &Path, records: &[Record]) -> Result<()> {
        let mut file = Self::temp_file_for(destination)?;
        write_records(file.as_file_mut(), records).map_err(|source| {
            PipelineError::CsvWrite {
                path: destination.to_path_buf(),
                source,
            }
        })?;
        self.staged.push((file, destination.to_path_buf()));
        Ok(())
    }

    pub fn stage_summary(
        &mut self,
        destination: &Path,
        summary: &Summary,
        delimiter: u8,
    ) -> Result<()> {
        let mut file = Self::temp_file_for(destination)?;
        write_summary(file.as_file_mut(), summary, delimiter).map_err(|source| {
            PipelineError::CsvWrite {
                path: destination.to_path_buf(),
                source,
            }
        })?;
        self.staged.push((file, destination.to_path_buf()));
        Ok(())
    }

    pub fn stage_text(&mut self, destination: &Path, text: &str) -> Result<()> {
        let mut file = Self::temp_file_for(destination)?;
        file.write_all(text.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|source| PipelineError::Write {
                path: destination.to_path_buf(),
                source,
            })?;
        self.staged.push((file, destination.to_path_buf()));
        Ok(())
    }

    /// Moves every staged file onto its destination, overwriting existing files.
    ///
    /// Existing destinations are moved aside first. If any rename fails, the
    /// files already committed are removed and the previous ones restored.
    pub fn commit(self) -> Result<Vec<PathBuf>> {
        for (_, destination) in &self.staged {
            if destination.is_dir() {
                return Err(PipelineError::Persist {
                    path: destination.clone(),
                    source: io::Error::other("destination is a directory"),
                });
            }
        }

        let mut committed = Vec::with_capacity(self.staged.len());
        for (file, destination) in self.staged {
            match Self::persist(file, &destination) {
                Ok(backup) => committed.push((destination, backup)),
                Err(e) => {
                    roll_back(committed);
                    return Err(e);
                }
            }
        }

        Ok(committed
            .into_iter()
            .map(|(destination, _backup)| {
                log::debug!("Wrote {}", destination.display());
                destination
            })
            .collect())
    }

    fn persist(file: NamedTempFile, destination: &Path) -> Result<Option<TempPath>> {
        let persist_error = |source| PipelineError::Persist {
            path: destination.to_path_buf(),
            source,
        };

        let backup = if destination.exists() {
            let backup = Self::temp_file_for(destination)?.into_temp_path();
            fs::rename(destination, &backup).map_err(persist_error)?;
            Some(backup)
        } else {
            None
        };

        if let Err(e) = file.persist(destination) {
            if let Some(backup) = &backup {
                if let Err(restore) = fs::rename(backup, destination) {
                    log::warn!("Failed to restore {}: {restore}", destination.display());
                }
            }
            return Err(persist_error(e.error));
        }
        Ok(backup)
    }

    fn temp_file_for(destination: &Path) -> Result<NamedTempFile> {
        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        NamedTempFile::new_in(dir).map_err(|source| PipelineError::Write {
            path: destination.to_path_buf(),
            source,
        })
    }
}

/// Undoes committed renames, newest first. Dropping a backup deletes it.
fn roll_back(committed: Vec<(PathBuf, Option<TempPath>)>) {
    for (destination, backup) in committed.into_iter().rev() {
        let undone = match &backup {
            Some(backup) => fs::rename(backup, &destination),
            None => fs::remove_file(&destination),
        };
        if let Err(e) = undone {
            log::warn!("Failed to roll back {}: {e}", destination.display());
        }
    }
}
