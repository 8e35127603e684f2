use std::fs::File;
use std::path::{Path, PathBuf};

use crate::classifier::{Classification, Record, RecordClassifier};
use crate::error::{PipelineError, Result};
use crate::output::{self, StagedOutput};
use crate::summary::{summarize, Summary};
use crate::validator::EmailValidator;

/// Destinations of the four artifacts of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub proper_emails: PathBuf,
    pub wrong_emails: PathBuf,
    pub summary_csv: PathBuf,
    pub summary_txt: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub summary: Summary,
    pub message: String,
    pub written: Vec<PathBuf>,
}

/// Loads a CSV of email candidates, classifies them and writes the results.
///
/// Records and the classification are memoized per instance; setting a new
/// source path invalidates both.
pub struct CsvPipeline<V> {
    classifier: RecordClassifier<V>,
    summary_delimiter: u8,
    source_path: Option<PathBuf>,
    records: Option<Vec<Record>>,
    classification: Option<Classification>,
}

impl<V: EmailValidator> CsvPipeline<V> {
    pub fn new(classifier: RecordClassifier<V>) -> Self {
        Self {
            classifier,
            summary_delimiter: b';',
            source_path: None,
            records: None,
            classification: None,
        }
    }

    pub fn with_summary_delimiter(mut self, delimiter: u8) -> Self {
        self.summary_delimiter = delimiter;
        self
    }

    pub fn set_source_path(&mut self, path: impl Into<PathBuf>) {
        self.source_path = Some(path.into());
        self.records = None;
        self.classification = None;
    }

    pub fn records(&mut self) -> Result<&[Record]> {
        if self.records.is_none() {
            let path = self.source_path.as_deref().ok_or(PipelineError::SourceNotSet)?;
            self.records = Some(load_records(path)?);
        }
        Ok(self.records.as_deref().unwrap_or_default())
    }

    pub fn classification(&mut self) -> Result<&Classification> {
        if self.classification.is_none() {
            self.records()?;
            let records = self.records.as_deref().unwrap_or_default();
            self.classification = Some(self.classifier.classify(records));
        }
        Ok(self
            .classification
            .get_or_insert_with(Classification::default))
    }

    pub fn proper_emails(&mut self) -> Result<&[Record]> {
        Ok(self.classification()?.proper.as_slice())
    }

    pub fn wrong_emails(&mut self) -> Result<&[Record]> {
        Ok(self.classification()?.wrong.as_slice())
    }

    pub fn summary(&mut self) -> Result<Summary> {
        let classification = self.classification()?;
        Ok(summarize(&classification.proper, &classification.wrong)?)
    }

    pub fn store_proper_emails(&mut self, path: &Path) -> Result<()> {
        output::store_records(path, self.proper_emails()?)
    }

    pub fn store_wrong_emails(&mut self, path: &Path) -> Result<()> {
        output::store_records(path, self.wrong_emails()?)
    }

    pub fn store_summary(&mut self, path: &Path) -> Result<()> {
        let summary = self.summary()?;
        output::store_summary(path, &summary, self.summary_delimiter)
    }

    pub fn store_summary_message(&mut self, path: &Path, file_name: &str) -> Result<()> {
        let summary = self.summary()?;
        output::store_text(path, &summary.message(file_name))
    }

    /// Runs every step for the current source. `file_name` is the name the
    /// operator gave for the source and appears verbatim in the message.
    ///
    /// The summary is computed before anything is written and the four files
    /// only appear once all of them were written successfully.
    pub fn run(&mut self, outputs: &OutputPaths, file_name: &str) -> Result<RunReport> {
        let summary = self.summary()?;
        let message = summary.message(file_name);
        let delimiter = self.summary_delimiter;

        let classification = self.classification()?;
        let mut stage = StagedOutput::new();
        stage.stage_records(&outputs.proper_emails, &classification.proper)?;
        stage.stage_records(&outputs.wrong_emails, &classification.wrong)?;
        stage.stage_summary(&outputs.summary_csv, &summary, delimiter)?;
        stage.stage_text(&outputs.summary_txt, &message)?;
        let written = stage.commit()?;

        log::info!(
            "Processed {}: {} proper, {} wrong",
            file_name,
            summary.proper_count,
            summary.wrong_count
        );
        Ok(RunReport {
            summary,
            message,
            written,
        })
    }
}

/// Reads every row of a header-less CSV file into memory.
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let file = File::open(path).map_err(|source| PipelineError::InputNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|source| PipelineError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        records.push(Record::from(&row));
    }

    log::debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::SummaryError;
    use crate::validator::SyntaxValidator;
    use std::cell::Cell;
    use std::fs;
    use tempfile::TempDir;

    struct CountingValidator {
        calls: Cell<usize>,
    }

    impl EmailValidator for CountingValidator {
        fn is_valid(&self, candidate: &str) -> bool {
            self.calls.set(self.calls.get() + 1);
            SyntaxValidator::default().is_valid(candidate)
        }
    }

    fn pipeline() -> CsvPipeline<SyntaxValidator> {
        CsvPipeline::new(RecordClassifier::new(SyntaxValidator::default()))
    }

    fn outputs(dir: &Path) -> OutputPaths {
        OutputPaths {
            proper_emails: dir.join("proper_emails.csv"),
            wrong_emails: dir.join("wrong_emails.csv"),
            summary_csv: dir.join("validaion_summary.csv"),
            summary_txt: dir.join("validaion_summary.txt"),
        }
    }

    fn write_input(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_end_to_end_run() {
        let dir = TempDir::new().unwrap();
        let input = write_input(dir.path(), "input.csv", "a@b.com\nnot-an-email\nx@y.org\n");
        let outputs = outputs(dir.path());

        let mut pipeline = pipeline();
        pipeline.set_source_path(&input);
        let report = pipeline.run(&outputs, "input.csv").unwrap();

        assert_eq!(lines(&outputs.proper_emails), vec!["a@b.com", "x@y.org"]);
        assert_eq!(lines(&outputs.wrong_emails), vec!["not-an-email"]);
        assert_eq!(
            lines(&outputs.summary_csv),
            vec![
                "Proper emails number;Wrong emails number",
                "2 (66.67%);1 (33.33%)"
            ]
        );
        assert_eq!(
            fs::read_to_string(&outputs.summary_txt).unwrap(),
            "File input.csv was successfully processed. There were 2 proper emails and 1 wrong emails"
        );
        assert_eq!(report.message, fs::read_to_string(&outputs.summary_txt).unwrap());
        assert_eq!(
            report.summary.data_row(),
            ["2 (66.67%)".to_string(), "1 (33.33%)".to_string()]
        );
        assert_eq!(report.written.len(), 4);
    }

    #[test]
    fn test_all_invalid_leaves_empty_proper_file() {
        let dir = TempDir::new().unwrap();
        let input = write_input(dir.path(), "bad.csv", "nope\nstill nope\n@x.com\n");
        let outputs = outputs(dir.path());

        let mut pipeline = pipeline();
        pipeline.set_source_path(&input);
        let report = pipeline.run(&outputs, "input.csv").unwrap();

        assert!(outputs.proper_emails.exists());
        assert_eq!(fs::read_to_string(&outputs.proper_emails).unwrap(), "");
        assert_eq!(lines(&outputs.wrong_emails).len(), 3);
        assert_eq!(report.summary.proper_percentage, "0.00%");
        assert_eq!(report.summary.wrong_percentage, "100.00%");
    }

    #[test]
    fn test_empty_input_fails_with_division_by_zero_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = write_input(dir.path(), "empty.csv", "");
        let out_dir = dir.path().join("result");
        fs::create_dir(&out_dir).unwrap();
        let outputs = outputs(&out_dir);

        let mut pipeline = pipeline();
        pipeline.set_source_path(&input);

        let classification = pipeline.classification().unwrap();
        assert!(classification.proper.is_empty());
        assert!(classification.wrong.is_empty());
        assert!(matches!(
            pipeline.summary(),
            Err(PipelineError::Summary(SummaryError::DivisionByZero))
        ));

        let err = pipeline.run(&outputs, "input.csv").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Summary(SummaryError::DivisionByZero)
        ));
        assert_eq!(fs::read_dir(&out_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_input_is_input_not_found() {
        let dir = TempDir::new().unwrap();
        let mut pipeline = pipeline();
        pipeline.set_source_path(dir.path().join("absent.csv"));

        assert!(matches!(
            pipeline.records(),
            Err(PipelineError::InputNotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binary.csv");
        fs::write(&path, [0x61, 0x40, 0xff, 0xfe, 0x2e, 0x63, 0x6f, b'\n']).unwrap();

        let mut pipeline = pipeline();
        pipeline.set_source_path(&path);

        assert!(matches!(
            pipeline.records(),
            Err(PipelineError::Parse { .. })
        ));
    }

    #[test]
    fn test_source_not_set() {
        let mut pipeline = pipeline();
        assert!(matches!(pipeline.records(), Err(PipelineError::SourceNotSet)));

        let dir = TempDir::new().unwrap();
        assert!(matches!(
            pipeline.run(&outputs(dir.path()), "input.csv"),
            Err(PipelineError::SourceNotSet)
        ));
    }

    #[test]
    fn test_records_are_cached_until_source_changes() {
        let dir = TempDir::new().unwrap();
        let input = write_input(dir.path(), "input.csv", "a@b.com\n");

        let mut pipeline = pipeline();
        pipeline.set_source_path(&input);
        assert_eq!(pipeline.records().unwrap().len(), 1);

        fs::write(&input, "a@b.com\nc@d.com\n").unwrap();
        assert_eq!(pipeline.records().unwrap().len(), 1);

        pipeline.set_source_path(&input);
        assert_eq!(pipeline.records().unwrap().len(), 2);
    }

    #[test]
    fn test_classification_runs_once_per_source() {
        let dir = TempDir::new().unwrap();
        let input = write_input(dir.path(), "input.csv", "a@b.com\nnot-an-email\nx@y.org\n");

        let validator = CountingValidator {
            calls: Cell::new(0),
        };
        let mut pipeline = CsvPipeline::new(RecordClassifier::new(validator));
        pipeline.set_source_path(&input);

        pipeline.run(&outputs(dir.path()), "input.csv").unwrap();
        pipeline.proper_emails().unwrap();
        pipeline.wrong_emails().unwrap();
        pipeline.summary().unwrap();

        assert_eq!(pipeline.classifier.validator().calls.get(), 3);
    }

    #[test]
    fn test_multi_column_rows_keep_first_field() {
        let dir = TempDir::new().unwrap();
        let input = write_input(
            dir.path(),
            "wide.csv",
            "a@b.com,Alice,42\nbob,Bob\n\"quoted@example.com\"\n",
        );
        let outputs = outputs(dir.path());

        let mut pipeline = pipeline();
        pipeline.set_source_path(&input);
        pipeline.run(&outputs, "input.csv").unwrap();

        assert_eq!(
            lines(&outputs.proper_emails),
            vec!["a@b.com", "quoted@example.com"]
        );
        assert_eq!(lines(&outputs.wrong_emails), vec!["bob"]);
    }

    #[test]
    fn test_first_row_is_data() {
        let dir = TempDir::new().unwrap();
        let input = write_input(dir.path(), "input.csv", "email\na@b.com\n");

        let mut pipeline = pipeline();
        pipeline.set_source_path(&input);

        assert_eq!(pipeline.records().unwrap().len(), 2);
        assert_eq!(pipeline.wrong_emails().unwrap()[0].email_candidate(), "email");
    }

    #[test]
    fn test_store_steps_write_directly() {
        let dir = TempDir::new().unwrap();
        let input = write_input(dir.path(), "input.csv", "a@b.com\nnot-an-email\n");
        let outputs = outputs(dir.path());

        let mut pipeline = pipeline().with_summary_delimiter(b',');
        pipeline.set_source_path(&input);
        pipeline.store_proper_emails(&outputs.proper_emails).unwrap();
        pipeline.store_wrong_emails(&outputs.wrong_emails).unwrap();
        pipeline.store_summary(&outputs.summary_csv).unwrap();
        pipeline
            .store_summary_message(&outputs.summary_txt, "input.csv")
            .unwrap();

        assert_eq!(lines(&outputs.proper_emails), vec!["a@b.com"]);
        assert_eq!(lines(&outputs.wrong_emails), vec!["not-an-email"]);
        assert_eq!(
            lines(&outputs.summary_csv),
            vec![
                "Proper emails number,Wrong emails number",
                "1 (50.00%),1 (50.00%)"
            ]
        );
        assert!(fs::read_to_string(&outputs.summary_txt)
            .unwrap()
            .starts_with("File input.csv was successfully processed."));
    }

    #[test]
    fn test_write_failure_leaves_no_partial_output() {
        let dir = TempDir::new().unwrap();
        let input = write_input(dir.path(), "input.csv", "a@b.com\nnot-an-email\n");
        let mut outputs = outputs(dir.path());
        outputs.summary_txt = dir.path().join("missing").join("validaion_summary.txt");

        let mut pipeline = pipeline();
        pipeline.set_source_path(&input);
        let err = pipeline.run(&outputs, "input.csv").unwrap_err();

        assert!(matches!(err, PipelineError::Write { .. }));
        assert!(!outputs.proper_emails.exists());
        assert!(!outputs.wrong_emails.exists());
        assert!(!outputs.summary_csv.exists());
    }

    #[test]
    fn test_directory_destination_keeps_previous_results() {
        let dir = TempDir::new().unwrap();
        let input = write_input(dir.path(), "input.csv", "a@b.com\nnot-an-email\n");
        let mut outputs = outputs(dir.path());
        fs::write(&outputs.proper_emails, "old@previous.run\n").unwrap();
        outputs.summary_txt = dir.path().join("txt_is_a_dir");
        fs::create_dir(&outputs.summary_txt).unwrap();
        fs::write(outputs.summary_txt.join("keep.txt"), "x").unwrap();

        let mut pipeline = pipeline();
        pipeline.set_source_path(&input);
        let err = pipeline.run(&outputs, "input.csv").unwrap_err();

        assert!(matches!(err, PipelineError::Persist { ref path, .. } if *path == outputs.summary_txt));
        assert_eq!(lines(&outputs.proper_emails), vec!["old@previous.run"]);
        assert!(!outputs.wrong_emails.exists());
        assert!(!outputs.summary_csv.exists());
        assert!(outputs.summary_txt.join("keep.txt").exists());
    }

    #[test]
    fn test_message_uses_given_file_name() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        let input = write_input(&nested, "input.csv", "a@b.com\nnot-an-email\n");

        let mut pipeline = pipeline();
        pipeline.set_source_path(&input);
        let report = pipeline
            .run(&outputs(dir.path()), "nested/input.csv")
            .unwrap();

        assert_eq!(
            report.message,
            "File nested/input.csv was successfully processed. There were 1 proper emails and 1 wrong emails"
        );
    }
}
