use crate::validator::EmailValidator;

/// One input row. Only the first field carries the email candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<String>,
}

impl Record {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Field 0, or the empty string for a row without fields
    pub fn email_candidate(&self) -> &str {
        self.fields.first().map(String::as_str).unwrap_or("")
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl From<&csv::StringRecord> for Record {
    fn from(row: &csv::StringRecord) -> Self {
        Record::new(row.iter())
    }
}

/// Stable partition of the input records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub proper: Vec<Record>,
    pub wrong: Vec<Record>,
}

impl Classification {
    pub fn total(&self) -> usize {
        self.proper.len() + self.wrong.len()
    }
}

/// Splits records into proper and wrong email addresses using the injected validator.
pub struct RecordClassifier<V> {
    validator: V,
}

impl<V: EmailValidator> RecordClassifier<V> {
    pub fn new(validator: V) -> Self {
        Self { validator }
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    pub fn classify(&self, records: &[Record]) -> Classification {
        let mut classification = Classification::default();

        for record in records {
            if self.is_proper(record) {
                classification.proper.push(record.clone());
            } else {
                classification.wrong.push(record.clone());
            }
        }

        log::debug!(
            "Classified {} records: {} proper, {} wrong",
            records.len(),
            classification.proper.len(),
            classification.wrong.len()
        );
        classification
    }

    pub fn proper_emails(&self, records: &[Record]) -> Vec<Record> {
        records
            .iter()
            .filter(|record| self.is_proper(record))
            .cloned()
            .collect()
    }

    pub fn wrong_emails(&self, records: &[Record]) -> Vec<Record> {
        records
            .iter()
            .filter(|record| !self.is_proper(record))
            .cloned()
            .collect()
    }

    fn is_proper(&self, record: &Record) -> bool {
        self.validator.is_valid(record.email_candidate())
    }
}
