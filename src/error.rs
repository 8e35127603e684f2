use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::summary::SummaryError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("source file path not set")]
    SourceNotSet,

    #[error("cannot read input file {}: {source}", .path.display())]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse {} as CSV: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Summary(#[from] SummaryError),

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write CSV rows to {}: {source}", .path.display())]
    CsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("cannot move staged output into {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
