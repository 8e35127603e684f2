pub mod classifier;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod summary;
pub mod validator;

pub use classifier::{Classification, Record, RecordClassifier};
pub use config::Config;
pub use error::PipelineError;
pub use pipeline::{CsvPipeline, OutputPaths, RunReport};
pub use summary::{summarize, Summary, SummaryError};
pub use validator::{EmailValidator, SyntaxValidator, ValidationMode};
