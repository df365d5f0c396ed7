//! Suffix scheme resolution.
//!
//! Which columns a chart or table reads depends on the subject and on the
//! school type and tab the user is looking at. Both resolvers here are pure
//! functions of the selection; the result is passed explicitly to every
//! component that needs it.

use serde::Serialize;

use crate::error::{SelectionError, SelectionResult};
use crate::models::column::column_suffix;
use crate::models::{
    ColumnKey, HsTab, K8Tab, Metric, SchoolSubtype, SchoolType, SelectionContext, Subject,
    TypeTab,
};

/// Tested (denominator) and proficient (numerator) metrics for one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuffixScheme {
    /// `None` for graduation columns, which carry no subject.
    pub subject: Option<Subject>,
    pub tested: Metric,
    pub proficient: Metric,
}

impl SuffixScheme {
    pub fn tested_key(&self, category: &str) -> ColumnKey {
        ColumnKey::new(category, self.subject, self.tested)
    }

    pub fn proficient_key(&self, category: &str) -> ColumnKey {
        ColumnKey::new(category, self.subject, self.proficient)
    }
}

/// Precomputed rate column a chart plots (`"|ELA Proficient %"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateColumn {
    pub subject: Option<Subject>,
    pub metric: Metric,
}

impl RateColumn {
    pub fn suffix(&self) -> String {
        column_suffix(self.subject, self.metric)
    }
}

/// Resolve the tested/proficient pair for tables.
///
/// `type_tab` is required. An IREAD subject or tab selects the pass counts,
/// and a graduation subject or tab selects cohort counts.
pub fn resolve_scheme(subject: Subject, selection: &SelectionContext) -> SelectionResult<SuffixScheme> {
    let type_tab = selection
        .type_tab
        .ok_or(SelectionError::MissingDiscriminator("type_tab"))?;

    let (proficient, tested) = match type_tab {
        TypeTab::K8 => {
            if subject == Subject::Graduation || subject == Subject::Ebrw {
                return Err(unsupported(subject, "K8 tables"));
            }
            if selection.k8_tab == Some(K8Tab::Iread) || subject == Subject::Iread {
                (Metric::PassN, Metric::TestN)
            } else {
                (Metric::TotalProficient, Metric::TotalTested)
            }
        }
        TypeTab::Hs => {
            if subject == Subject::Ela || subject == Subject::Iread {
                return Err(unsupported(subject, "HS tables"));
            }
            if selection.hs_tab == Some(HsTab::Graduation) || subject == Subject::Graduation {
                (Metric::Graduates, Metric::CohortCount)
            } else {
                (Metric::AtBenchmark, Metric::TotalTested)
            }
        }
    };

    Ok(SuffixScheme {
        subject: subject_in_key(subject),
        tested,
        proficient,
    })
}

/// Resolve the rate column for charts from school type and subtype.
///
/// Elementary schools (K8, K12 with a K8/K12 subtype, or no type at all)
/// chart proficiency rates; high schools (HS, AHS, K12 with an HS subtype)
/// chart benchmark and graduation rates.
pub fn resolve_rate_column(subject: Subject, selection: &SelectionContext) -> SelectionResult<RateColumn> {
    let school_type = selection.school_type;
    let subtype = selection.school_subtype;

    let elementary = matches!(
        (school_type, subtype),
        (Some(SchoolType::K8), _)
            | (Some(SchoolType::K12), Some(SchoolSubtype::K8 | SchoolSubtype::K12))
            | (None, None)
    );
    let high_school = matches!(
        (school_type, subtype),
        (Some(SchoolType::HS | SchoolType::AHS), _) | (Some(SchoolType::K12), Some(SchoolSubtype::HS))
    );

    if elementary {
        return match subject {
            Subject::Ela | Subject::Math | Subject::Iread => Ok(RateColumn {
                subject: Some(subject),
                metric: Metric::ProficientPercent,
            }),
            _ => Err(unsupported(subject, "elementary schools")),
        };
    }

    if high_school {
        return match subject {
            Subject::Ebrw | Subject::Math => Ok(RateColumn {
                subject: Some(subject),
                metric: Metric::BenchmarkPercent,
            }),
            Subject::Graduation => Ok(RateColumn {
                subject: None,
                metric: Metric::GraduationRate,
            }),
            _ => Err(unsupported(subject, "high schools")),
        };
    }

    Err(SelectionError::UnsupportedSchoolType {
        school_type: school_type.map(|t| format!("{:?}", t)),
        school_subtype: subtype.map(|t| format!("{:?}", t)),
    })
}

fn subject_in_key(subject: Subject) -> Option<Subject> {
    match subject {
        Subject::Graduation => None,
        other => Some(other),
    }
}

fn unsupported(subject: Subject, context: &str) -> SelectionError {
    SelectionError::UnsupportedSubject {
        subject: subject.to_string(),
        context: context.to_string(),
    }
}
