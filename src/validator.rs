use clap::ValueEnum;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    // WHATWG input[type=email] grammar
    static ref HTML5_EMAIL: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$"
    )
    .unwrap();
    static ref LOOSE_EMAIL: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// Decides whether a candidate string is a syntactically proper email address.
pub trait EmailValidator {
    fn is_valid(&self, candidate: &str) -> bool;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    #[default]
    Html5,
    Loose,
}

/// Regex based syntax check. Never touches the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntaxValidator {
    mode: ValidationMode,
}

impl SyntaxValidator {
    pub fn new(mode: ValidationMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }
}

impl EmailValidator for SyntaxValidator {
    fn is_valid(&self, candidate: &str) -> bool {
        if candidate.is_empty() || candidate.chars().any(char::is_control) {
            return false;
        }

        match self.mode {
            ValidationMode::Html5 => HTML5_EMAIL.is_match(candidate),
            ValidationMode::Loose => LOOSE_EMAIL.is_match(candidate),
        }
    }
}
