//! Structural record filters.
//!
//! A filter maps field names to conditions. A condition is either a plain
//! value (equality) or a map of operators:
//!
//! ```yaml
//! where:
//!   status: active
//!   age: { $gte: 18, $lt: 65 }
//!   country: { $in: [NZ, AU] }
//! ```

use crate::values::{Record, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Comparison operators of a condition. All present operators must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Operators {
    #[serde(rename = "$eq", default, skip_serializing_if = "Option::is_none")]
    pub eq: Option<Value>,
    #[serde(rename = "$ne", default, skip_serializing_if = "Option::is_none")]
    pub ne: Option<Value>,
    #[serde(rename = "$gt", default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<Value>,
    #[serde(rename = "$gte", default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<Value>,
    #[serde(rename = "$lt", default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<Value>,
    #[serde(rename = "$lte", default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<Value>,
    #[serde(rename = "$in", default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Value>>,
    #[serde(rename = "$nin", default, skip_serializing_if = "Option::is_none")]
    pub none_of: Option<Vec<Value>>,
    #[serde(rename = "$exists", default, skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
}

impl Operators {
    fn matches(&self, actual: Option<&Value>) -> bool {
        if let Some(exists) = self.exists {
            if actual.is_some() != exists {
                return false;
            }
        }

        let value = actual.unwrap_or(&Value::Null);
        let ordering = |expected: &Value| value.compare(expected);

        if let Some(expected) = &self.eq {
            if !value.loosely_equals(expected) {
                return false;
            }
        }
        if let Some(expected) = &self.ne {
            if value.loosely_equals(expected) {
                return false;
            }
        }
        if let Some(expected) = &self.gt {
            if ordering(expected) != Some(Ordering::Greater) {
                return false;
            }
        }
        if let Some(expected) = &self.gte {
            if !matches!(ordering(expected), Some(Ordering::Greater | Ordering::Equal)) {
                return false;
            }
        }
        if let Some(expected) = &self.lt {
            if ordering(expected) != Some(Ordering::Less) {
                return false;
            }
        }
        if let Some(expected) = &self.lte {
            if !matches!(ordering(expected), Some(Ordering::Less | Ordering::Equal)) {
                return false;
            }
        }
        if let Some(candidates) = &self.one_of {
            if !candidates.iter().any(|c| value.loosely_equals(c)) {
                return false;
            }
        }
        if let Some(candidates) = &self.none_of {
            if candidates.iter().any(|c| value.loosely_equals(c)) {
                return false;
            }
        }
        true
    }
}

/// Condition on a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Operators(Operators),
    Equals(Value),
}

impl Condition {
    pub fn matches(&self, actual: Option<&Value>) -> bool {
        match self {
            Self::Operators(operators) => operators.matches(actual),
            Self::Equals(expected) => actual.unwrap_or(&Value::Null).loosely_equals(expected),
        }
    }
}

/// Conjunction of per-field conditions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordFilter(IndexMap<String, Condition>);

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition.
    pub fn equals(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), Condition::Equals(value.into()));
        self
    }

    /// Add an operator condition.
    pub fn with(mut self, field: impl Into<String>, operators: Operators) -> Self {
        self.0.insert(field.into(), Condition::Operators(operators));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `record` satisfies every condition. The empty filter matches
    /// everything.
    pub fn matches(&self, record: &Record) -> bool {
        self.0
            .iter()
            .all(|(field, condition)| condition.matches(record.get(field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(name: &str, age: i64) -> Record {
        Record::new().with("name", name).with("age", age)
    }

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(RecordFilter::new().matches(&person("a", 1)));
        assert!(RecordFilter::new().matches(&Record::new()));
    }

    #[test]
    fn test_equality() {
        let filter = RecordFilter::new().equals("name", "ada");
        assert!(filter.matches(&person("ada", 36)));
        assert!(!filter.matches(&person("bob", 36)));
    }

    #[test]
    fn test_range_operators() {
        let filter = RecordFilter::new().with(
            "age",
            Operators {
                gte: Some(Value::Int(18)),
                lt: Some(Value::Int(65)),
                ..Default::default()
            },
        );

        assert!(filter.matches(&person("a", 18)));
        assert!(filter.matches(&person("a", 64)));
        assert!(!filter.matches(&person("a", 65)));
        assert!(!filter.matches(&person("a", 17)));
        assert!(!filter.matches(&Record::new()));
    }

    #[test]
    fn test_parse_from_yaml() {
        let filter: RecordFilter = serde_yaml::from_str(
            r#"
name: { $in: [ada, grace] }
age: { $gt: 30 }
nickname: { $exists: false }
"#,
        )
        .unwrap();

        assert!(filter.matches(&person("grace", 40)));
        assert!(!filter.matches(&person("grace", 20)));
        assert!(!filter.matches(&person("linus", 40)));
        assert!(!filter.matches(&person("ada", 40).with("nickname", "countess")));
    }

    #[test]
    fn test_plain_value_is_equality() {
        let condition: Condition = serde_yaml::from_str("42").unwrap();
        assert_eq!(condition, Condition::Equals(Value::Int(42)));
        assert!(condition.matches(Some(&Value::Float(42.0))));
    }
}
