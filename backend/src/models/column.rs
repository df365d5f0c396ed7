//! Typed column keys.
//!
//! Wide records name their metric columns `"<Category>|<Subject> <Metric>"`
//! (`"Black|ELA Total Tested"`) or, for graduation data, `"<Category>|<Metric>"`
//! (`"Total|Cohort Count"`). Inside the pipeline these are [`ColumnKey`]
//! values; the pipe-delimited string only exists at the record boundary.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Subject
// =============================================================================

/// Tested subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    #[serde(rename = "ELA")]
    Ela,
    Math,
    #[serde(rename = "IREAD")]
    Iread,
    #[serde(rename = "EBRW")]
    Ebrw,
    Graduation,
}

impl Subject {
    pub const ALL: [Subject; 5] = [
        Subject::Ela,
        Subject::Math,
        Subject::Iread,
        Subject::Ebrw,
        Subject::Graduation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Ela => "ELA",
            Subject::Math => "Math",
            Subject::Iread => "IREAD",
            Subject::Ebrw => "EBRW",
            Subject::Graduation => "Graduation",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subject::ALL
            .into_iter()
            .find(|subject| subject.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown subject '{}'", s))
    }
}

// =============================================================================
// Metric
// =============================================================================

/// Metric vocabulary of the source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    TotalTested,
    TotalProficient,
    TestN,
    PassN,
    CohortCount,
    Graduates,
    AtBenchmark,
    BelowProficiency,
    ApproachingProficiency,
    AtProficiency,
    AboveProficiency,
    /// Precomputed rate columns read by the charts.
    ProficientPercent,
    BenchmarkPercent,
    GraduationRate,
}

impl Metric {
    pub const ALL: [Metric; 14] = [
        Metric::TotalTested,
        Metric::TotalProficient,
        Metric::TestN,
        Metric::PassN,
        Metric::CohortCount,
        Metric::Graduates,
        Metric::AtBenchmark,
        Metric::BelowProficiency,
        Metric::ApproachingProficiency,
        Metric::AtProficiency,
        Metric::AboveProficiency,
        Metric::ProficientPercent,
        Metric::BenchmarkPercent,
        Metric::GraduationRate,
    ];

    /// The four proficiency bands, lowest first.
    pub const BANDS: [Metric; 4] = [
        Metric::BelowProficiency,
        Metric::ApproachingProficiency,
        Metric::AtProficiency,
        Metric::AboveProficiency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::TotalTested => "Total Tested",
            Metric::TotalProficient => "Total Proficient",
            Metric::TestN => "Test N",
            Metric::PassN => "Pass N",
            Metric::CohortCount => "Cohort Count",
            Metric::Graduates => "Graduates",
            Metric::AtBenchmark => "At Benchmark",
            Metric::BelowProficiency => "Below Proficiency",
            Metric::ApproachingProficiency => "Approaching Proficiency",
            Metric::AtProficiency => "At Proficiency",
            Metric::AboveProficiency => "Above Proficiency",
            Metric::ProficientPercent => "Proficient %",
            Metric::BenchmarkPercent => "Benchmark %",
            Metric::GraduationRate => "Graduation Rate",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Metric::ALL.into_iter().find(|m| m.as_str() == label)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Column Key
// =============================================================================

static COLUMN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let metrics = Metric::ALL
        .iter()
        .map(|m| regex::escape(m.as_str()))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"^(?P<category>[^|]+)\|(?:(?P<subject>\S+) )?(?P<metric>{})$",
        metrics
    ))
    .expect("column pattern is a valid regex")
});

/// A metric column: `(category, subject, metric)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    pub category: String,
    pub subject: Option<Subject>,
    pub metric: Metric,
}

impl ColumnKey {
    pub fn new(category: impl Into<String>, subject: Option<Subject>, metric: Metric) -> Self {
        Self {
            category: category.into(),
            subject,
            metric,
        }
    }

    /// Parse a wide column name. Bare keys (`Year`, `School Name`) and
    /// unknown metrics return `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = COLUMN_PATTERN.captures(raw)?;
        let subject = match caps.name("subject") {
            Some(s) => Some(s.as_str().parse::<Subject>().ok()?),
            None => None,
        };
        let metric = Metric::from_label(&caps["metric"])?;
        Some(Self::new(&caps["category"], subject, metric))
    }

    /// Everything after the category: `"|ELA Total Tested"`.
    pub fn suffix(&self) -> String {
        column_suffix(self.subject, self.metric)
    }
}

/// Build the suffix shared by every column with this subject and metric.
pub fn column_suffix(subject: Option<Subject>, metric: Metric) -> String {
    match subject {
        Some(subject) => format!("|{} {}", subject, metric),
        None => format!("|{}", metric),
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.category, self.suffix())
    }
}

// =============================================================================
// Category Vocabularies
// =============================================================================

pub const GRADES: [&str; 6] = [
    "Grade 3", "Grade 4", "Grade 5", "Grade 6", "Grade 7", "Grade 8",
];

pub const TOTAL: &str = "Total";

pub const GRADUATION_TOTALS: [&str; 2] = ["Total", "Non Waiver"];

pub const ETHNICITY: [&str; 7] = [
    "American Indian",
    "Asian",
    "Black",
    "Hispanic",
    "Multiracial",
    "Native Hawaiian or Other Pacific Islander",
    "White",
];

pub const SUBGROUP: [&str; 6] = [
    "Special Education",
    "General Education",
    "Paid Meals",
    "Free or Reduced Price Meals",
    "English Learners",
    "Non English Learners",
];

/// Owned copy of a vocabulary, for APIs taking `&[String]`.
pub fn categories(vocabulary: &[&str]) -> Vec<String> {
    vocabulary.iter().map(|c| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subject_column() {
        let key = ColumnKey::parse("Black|ELA Total Tested").unwrap();
        assert_eq!(key.category, "Black");
        assert_eq!(key.subject, Some(Subject::Ela));
        assert_eq!(key.metric, Metric::TotalTested);
        assert_eq!(key.to_string(), "Black|ELA Total Tested");
    }

    #[test]
    fn test_parse_graduation_column() {
        let key = ColumnKey::parse("Non Waiver|Graduation Rate").unwrap();
        assert_eq!(key.category, "Non Waiver");
        assert_eq!(key.subject, None);
        assert_eq!(key.metric, Metric::GraduationRate);
    }

    #[test]
    fn test_parse_multiword_category_and_band() {
        let key =
            ColumnKey::parse("Free or Reduced Price Meals|Math Approaching Proficiency").unwrap();
        assert_eq!(key.category, "Free or Reduced Price Meals");
        assert_eq!(key.subject, Some(Subject::Math));
        assert_eq!(key.metric, Metric::ApproachingProficiency);
    }

    #[test]
    fn test_parse_rejects_bare_and_unknown() {
        assert!(ColumnKey::parse("Year").is_none());
        assert!(ColumnKey::parse("School Name").is_none());
        assert!(ColumnKey::parse("Black|Science Total Tested").is_none());
        assert!(ColumnKey::parse("Black|ELA Mean Score").is_none());
    }

    #[test]
    fn test_suffix() {
        assert_eq!(
            column_suffix(Some(Subject::Iread), Metric::ProficientPercent),
            "|IREAD Proficient %"
        );
        assert_eq!(column_suffix(None, Metric::CohortCount), "|Cohort Count");
    }

    #[test]
    fn test_subject_from_str() {
        assert_eq!("ela".parse::<Subject>(), Ok(Subject::Ela));
        assert_eq!("Graduation".parse::<Subject>(), Ok(Subject::Graduation));
        assert!("Science".parse::<Subject>().is_err());
    }
}
