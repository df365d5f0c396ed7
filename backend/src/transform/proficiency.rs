//! Proficiency ratio for one category of one record.

use serde::Serialize;

use crate::models::Record;

use super::scheme::SuffixScheme;

/// Result of dividing proficient by tested.
///
/// `Suppressed` and `NoneTested` are kept apart because they are reported
/// differently: the first means the source withheld the numbers, the second
/// means nobody sat the test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Proficiency {
    #[serde(rename_all = "camelCase")]
    Ratio { ratio: f64, sample_size: u64 },
    Suppressed,
    NoneTested,
}

impl Proficiency {
    pub fn ratio(&self) -> Option<f64> {
        match self {
            Proficiency::Ratio { ratio, .. } => Some(*ratio),
            _ => None,
        }
    }
}

/// Compute proficient / tested from two fields of `record`.
///
/// Counts are truncated toward zero before dividing. A suppressed value in
/// either field wins over every other outcome.
pub fn calculate(record: &Record, proficient_key: &str, tested_key: &str) -> Proficiency {
    let proficient = record.get(proficient_key);
    let tested = record.get(tested_key);

    if proficient.is_suppressed() || tested.is_suppressed() {
        return Proficiency::Suppressed;
    }

    let tested = match tested.as_count() {
        Some(n) if n > 0.0 => n,
        _ => return Proficiency::NoneTested,
    };

    match proficient.as_count() {
        Some(passed) => Proficiency::Ratio {
            ratio: passed / tested,
            sample_size: tested as u64,
        },
        // tested students but no usable numerator
        None => Proficiency::Suppressed,
    }
}

/// [`calculate`] for `category` under a resolved scheme.
pub fn calculate_category(record: &Record, category: &str, scheme: &SuffixScheme) -> Proficiency {
    calculate(
        record,
        &scheme.proficient_key(category).to_string(),
        &scheme.tested_key(category).to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;
    use proptest::prelude::*;

    fn record(proficient: Value, tested: Value) -> Record {
        Record::new().with("p", proficient).with("t", tested)
    }

    #[test]
    fn test_ratio() {
        let r = record(Value::Number(28.0), Value::Number(40.0));
        assert_eq!(
            calculate(&r, "p", "t"),
            Proficiency::Ratio {
                ratio: 0.7,
                sample_size: 40
            }
        );
    }

    #[test]
    fn test_counts_truncate() {
        let r = record(Value::Number(10.9), Value::Number(20.5));
        assert_eq!(calculate(&r, "p", "t").ratio(), Some(0.5));
    }

    #[test]
    fn test_suppressed_either_side() {
        assert_eq!(
            calculate(&record(Value::Suppressed, Value::Number(40.0)), "p", "t"),
            Proficiency::Suppressed
        );
        assert_eq!(
            calculate(&record(Value::Number(3.0), Value::Suppressed), "p", "t"),
            Proficiency::Suppressed
        );
        // suppression is checked before the zero test
        assert_eq!(
            calculate(&record(Value::Suppressed, Value::Number(0.0)), "p", "t"),
            Proficiency::Suppressed
        );
    }

    #[test]
    fn test_none_tested() {
        assert_eq!(
            calculate(&record(Value::Number(0.0), Value::Number(0.0)), "p", "t"),
            Proficiency::NoneTested
        );
        assert_eq!(
            calculate(&record(Value::Number(0.0), Value::Absent), "p", "t"),
            Proficiency::NoneTested
        );
        assert_eq!(
            calculate(&record(Value::Number(1.0), Value::Text("n/a".into())), "p", "t"),
            Proficiency::NoneTested
        );
    }

    #[test]
    fn test_missing_numerator_is_suppressed() {
        assert_eq!(
            calculate(&record(Value::Absent, Value::Number(12.0)), "p", "t"),
            Proficiency::Suppressed
        );
    }

    #[test]
    fn test_calculate_category_uses_scheme_keys() {
        use crate::models::{Metric, Subject};

        let scheme = SuffixScheme {
            subject: Some(Subject::Math),
            tested: Metric::TotalTested,
            proficient: Metric::TotalProficient,
        };
        let r = Record::new()
            .with("Asian|Math Total Tested", 20.0)
            .with("Asian|Math Total Proficient", 5.0);
        assert_eq!(calculate_category(&r, "Asian", &scheme).ratio(), Some(0.25));
    }

    proptest! {
        #[test]
        fn ratio_is_exact_division(passed in 0u32..10_000, tested in 1u32..10_000) {
            let r = record(Value::Number(passed as f64), Value::Number(tested as f64));
            prop_assert_eq!(
                calculate(&r, "p", "t"),
                Proficiency::Ratio {
                    ratio: passed as f64 / tested as f64,
                    sample_size: tested as u64,
                }
            );
        }

        #[test]
        fn non_positive_tested_is_none_tested(passed in 0u32..100, tested in -100i32..=0) {
            let r = record(Value::Number(passed as f64), Value::Number(tested as f64));
            prop_assert_eq!(calculate(&r, "p", "t"), Proficiency::NoneTested);
        }
    }
}
