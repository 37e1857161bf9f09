//! Program label normalization.
//!
//! Normalized labels decide program-level grouping: two records land in the
//! same program node iff their normalized labels are equal.

//!
//! Rule data is held in values rather than map keys: layered config sources
//! fold map keys to lowercase.

use serde::{Deserialize, Serialize};

/// Label used when a record has no program at all.
pub const UNKNOWN_PROGRAM: &str = "Unknown";

/// One eligibility value and the label it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityVariant {
    pub eligibility: String,
    pub label: String,
}

/// Program name and its short code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abbreviation {
    pub program: String,
    pub short: String,
}

/// Splits one (country, program) pair into variants by eligibility flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilitySplit {
    pub country: String,
    pub program: String,
    pub variants: Vec<EligibilityVariant>,
    /// Label for any other (or empty) eligibility
    pub fallback: String,
}

impl EligibilitySplit {
    fn matches(&self, country: &str, program: &str) -> bool {
        self.country == country && self.program == program
    }

    fn label_for(&self, eligibility: &str) -> &str {
        self.variants
            .iter()
            .find(|variant| variant.eligibility == eligibility)
            .map_or(self.fallback.as_str(), |variant| variant.label.as_str())
    }
}

/// Rule table applied to every record's program field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationRules {
    #[serde(default = "default_splits")]
    pub eligibility_splits: Vec<EligibilitySplit>,
    #[serde(default = "default_abbreviations")]
    pub abbreviations: Vec<Abbreviation>,
}

fn default_splits() -> Vec<EligibilitySplit> {
    vec![EligibilitySplit {
        country: "Portugal".to_string(),
        program: "Passive Income Visa".to_string(),
        variants: vec![
            EligibilityVariant::new("Eligible Cold", "D7 Cold"),
            EligibilityVariant::new("Eligible Hot", "D7 Hot"),
        ],
        fallback: "D7 (Unknown eligibility)".to_string(),
    }]
}

fn default_abbreviations() -> Vec<Abbreviation> {
    vec![
        Abbreviation::new("Citizenship by Descent", "CBD"),
        Abbreviation::new("Citizenship by Investment", "CBI"),
    ]
}

impl EligibilityVariant {
    pub fn new(eligibility: &str, label: &str) -> Self {
        Self {
            eligibility: eligibility.to_string(),
            label: label.to_string(),
        }
    }
}

impl Abbreviation {
    pub fn new(program: &str, short: &str) -> Self {
        Self {
            program: program.to_string(),
            short: short.to_string(),
        }
    }
}

impl Default for NormalizationRules {
    fn default() -> Self {
        Self {
            eligibility_splits: default_splits(),
            abbreviations: default_abbreviations(),
        }
    }
}

impl NormalizationRules {
    /// Rules that leave every label unchanged.
    pub fn passthrough() -> Self {
        Self {
            eligibility_splits: Vec::new(),
            abbreviations: Vec::new(),
        }
    }

    /// Normalized program label for one record.
    ///
    /// Matching is exact after trimming surrounding whitespace. An empty
    /// result becomes [`UNKNOWN_PROGRAM`].
    pub fn program_label(&self, country: &str, program: &str, eligibility: &str) -> String {
        let country = country.trim();
        let program = program.trim();
        let eligibility = eligibility.trim();

        let label = if let Some(split) = self
            .eligibility_splits
            .iter()
            .find(|split| split.matches(country, program))
        {
            split.label_for(eligibility)
        } else if let Some(abbreviation) = self
            .abbreviations
            .iter()
            .find(|abbreviation| abbreviation.program == program)
        {
            abbreviation.short.as_str()
        } else {
            program
        };

        if label.is_empty() {
            UNKNOWN_PROGRAM.to_string()
        } else {
            label.to_string()
        }
    }
}
