use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::pipeline::OutputPaths;
use crate::validator::ValidationMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory the input filename is resolved against
    pub data_dir: PathBuf,
    pub result_dir: PathBuf,
    pub proper_emails_file: String,
    pub wrong_emails_file: String,
    pub summary_csv_file: String,
    pub summary_txt_file: String,
    pub summary_delimiter: char,
    pub validation_mode: ValidationMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("data"),
            result_dir: PathBuf::from("data/result"),
            proper_emails_file: "proper_emails.csv".to_string(),
            wrong_emails_file: "wrong_emails.csv".to_string(),
            summary_csv_file: "validaion_summary.csv".to_string(),
            summary_txt_file: "validaion_summary.txt".to_string(),
            summary_delimiter: ';',
            validation_mode: ValidationMode::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {path}"))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {path}"))?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.summary_delimiter.is_ascii() || self.summary_delimiter.is_ascii_control() {
            bail!(
                "summary_delimiter must be a printable ASCII character, got {:?}",
                self.summary_delimiter
            );
        }
        if self.summary_delimiter == '"' {
            bail!("summary_delimiter must not be the CSV quote character");
        }

        let names = [
            &self.proper_emails_file,
            &self.wrong_emails_file,
            &self.summary_csv_file,
            &self.summary_txt_file,
        ];
        for name in names {
            if name.trim().is_empty() {
                bail!("output file names must not be empty");
            }
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                bail!("output file name {name} is used more than once");
            }
        }
        Ok(())
    }

    /// Delimiter as the single byte the CSV writer expects
    pub fn delimiter_byte(&self) -> u8 {
        let mut buf = [0u8; 4];
        self.summary_delimiter.encode_utf8(&mut buf);
        buf[0]
    }

    pub fn input_path(&self, filename: &str) -> PathBuf {
        self.data_dir.join(filename)
    }

    pub fn output_paths(&self) -> OutputPaths {
        let dir: &Path = &self.result_dir;
        OutputPaths {
            proper_emails: dir.join(&self.proper_emails_file),
            wrong_emails: dir.join(&self.wrong_emails_file),
            summary_csv: dir.join(&self.summary_csv_file),
            summary_txt: dir.join(&self.summary_txt_file),
        }
    }
}
