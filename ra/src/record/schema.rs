//! Field schema for the employee record
//!
//! Every attribute the prediction service expects is described once here:
//! its wire name, a display label, the form section it belongs to, its kind
//! and its default. Validation and parsing are driven generically off this
//! table rather than per field.

use std::fmt;

use super::RecordError;

/// Form section a field is displayed under, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldGroup {
    Demographics,
    Job,
    Compensation,
    Satisfaction,
    Tenure,
}

impl FieldGroup {
    /// Section heading
    pub fn title(&self) -> &'static str {
        match self {
            Self::Demographics => "Demographics",
            Self::Job => "Job Details",
            Self::Compensation => "Compensation",
            Self::Satisfaction => "Satisfaction Metrics (1-4)",
            Self::Tenure => "Tenure",
        }
    }
}

/// What values a field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain integer, no range check
    Integer,
    /// One of a fixed set of strings
    Choice(&'static [&'static str]),
    /// Free-form string
    Text,
}

impl FieldKind {
    /// Short human description, used in `ra record fields` and error text
    pub fn describe(&self) -> String {
        match self {
            Self::Integer => "integer".to_string(),
            Self::Choice(options) => format!("one of: {}", options.join(", ")),
            Self::Text => "text".to_string(),
        }
    }
}

/// A single value held by the record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Integer(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Default value as declared in the schema table
#[derive(Debug, Clone, Copy)]
pub enum DefaultValue {
    Integer(i64),
    Text(&'static str),
}

/// Description of one record attribute
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Wire name (PascalCase, as the service expects)
    pub name: &'static str,
    /// Display label
    pub label: &'static str,
    pub group: FieldGroup,
    pub kind: FieldKind,
    pub default: DefaultValue,
}

impl FieldSpec {
    /// The schema default as an owned value
    pub fn default_value(&self) -> FieldValue {
        match self.default {
            DefaultValue::Integer(n) => FieldValue::Integer(n),
            DefaultValue::Text(s) => FieldValue::Text(s.to_string()),
        }
    }

    /// Parse user input (CLI `--set`, TUI editor) into a value of this field's kind
    pub fn parse(&self, raw: &str) -> Result<FieldValue, RecordError> {
        let raw = raw.trim();
        let value = match self.kind {
            FieldKind::Integer => {
                let n = raw.parse::<i64>().map_err(|_| RecordError::InvalidInteger {
                    field: self.name.to_string(),
                    value: raw.to_string(),
                })?;
                FieldValue::Integer(n)
            }
            FieldKind::Choice(_) | FieldKind::Text => FieldValue::Text(raw.to_string()),
        };
        self.validate(&value)?;
        Ok(value)
    }

    /// Check a value against this field's kind
    pub fn validate(&self, value: &FieldValue) -> Result<(), RecordError> {
        match (self.kind, value) {
            (FieldKind::Integer, FieldValue::Integer(_)) => Ok(()),
            (FieldKind::Text, FieldValue::Text(_)) => Ok(()),
            (FieldKind::Choice(options), FieldValue::Text(s)) => {
                if options.contains(&s.as_str()) {
                    Ok(())
                } else {
                    Err(RecordError::NotInDomain {
                        field: self.name.to_string(),
                        value: s.clone(),
                        allowed: options.join(", "),
                    })
                }
            }
            (kind, _) => Err(RecordError::WrongType {
                field: self.name.to_string(),
                expected: kind.describe(),
            }),
        }
    }

    /// Convert a JSON value (from a record file) into a value of this field's kind
    ///
    /// Integer fields accept integral JSON numbers only; text and choice
    /// fields accept strings only.
    pub fn from_json(&self, json: &serde_json::Value) -> Result<FieldValue, RecordError> {
        let value = match (self.kind, json) {
            (FieldKind::Integer, serde_json::Value::Number(n)) => match n.as_i64() {
                Some(n) => FieldValue::Integer(n),
                None => {
                    return Err(RecordError::InvalidInteger {
                        field: self.name.to_string(),
                        value: n.to_string(),
                    });
                }
            },
            (FieldKind::Choice(_) | FieldKind::Text, serde_json::Value::String(s)) => FieldValue::Text(s.clone()),
            (kind, _) => {
                return Err(RecordError::WrongType {
                    field: self.name.to_string(),
                    expected: kind.describe(),
                });
            }
        };
        self.validate(&value)?;
        Ok(value)
    }

    /// Cycle a choice value forwards or backwards; other kinds are returned unchanged
    pub fn cycle(&self, current: &FieldValue, forward: bool) -> FieldValue {
        let FieldKind::Choice(options) = self.kind else {
            return current.clone();
        };
        let idx = current
            .as_text()
            .and_then(|s| options.iter().position(|o| *o == s))
            .unwrap_or(0);
        let next = if forward {
            (idx + 1) % options.len()
        } else if idx == 0 {
            options.len() - 1
        } else {
            idx - 1
        };
        FieldValue::Text(options[next].to_string())
    }
}

pub const GENDERS: &[&str] = &["Male", "Female"];
pub const MARITAL_STATUSES: &[&str] = &["Single", "Married", "Divorced"];
pub const EDUCATION_FIELDS: &[&str] = &["Life Sciences", "Medical", "Marketing", "Technical Degree", "Other"];
pub const DEPARTMENTS: &[&str] = &["Sales", "Research & Development", "Human Resources"];
pub const JOB_ROLES: &[&str] = &[
    "Sales Executive",
    "Research Scientist",
    "Laboratory Technician",
    "Manufacturing Director",
    "Healthcare Representative",
    "Manager",
    "Sales Representative",
    "Research Director",
    "Human Resources",
];
pub const YES_NO: &[&str] = &["Yes", "No"];

/// Number of attributes in a record
pub const FIELD_COUNT: usize = 30;

const fn int(name: &'static str, label: &'static str, group: FieldGroup, default: i64) -> FieldSpec {
    FieldSpec {
        name,
        label,
        group,
        kind: FieldKind::Integer,
        default: DefaultValue::Integer(default),
    }
}

const fn choice(
    name: &'static str,
    label: &'static str,
    group: FieldGroup,
    options: &'static [&'static str],
    default: &'static str,
) -> FieldSpec {
    FieldSpec {
        name,
        label,
        group,
        kind: FieldKind::Choice(options),
        default: DefaultValue::Text(default),
    }
}

use FieldGroup::{Compensation, Demographics, Job, Satisfaction, Tenure};

/// The full record schema, in wire order
pub static SCHEMA: [FieldSpec; FIELD_COUNT] = [
    int("Age", "Age", Demographics, 30),
    FieldSpec {
        name: "BusinessTravel",
        label: "Business Travel",
        group: Job,
        kind: FieldKind::Text,
        default: DefaultValue::Text("Travel_Rarely"),
    },
    int("DailyRate", "Daily Rate", Compensation, 800),
    choice("Department", "Department", Job, DEPARTMENTS, "Research & Development"),
    int("DistanceFromHome", "Distance From Home", Demographics, 5),
    int("Education", "Education", Demographics, 3),
    choice("EducationField", "Education Field", Demographics, EDUCATION_FIELDS, "Life Sciences"),
    int("EnvironmentSatisfaction", "Environment", Satisfaction, 3),
    choice("Gender", "Gender", Demographics, GENDERS, "Male"),
    int("HourlyRate", "Hourly Rate", Compensation, 60),
    int("JobInvolvement", "Job Involvement", Satisfaction, 3),
    int("JobLevel", "Job Level", Job, 2),
    choice("JobRole", "Job Role", Job, JOB_ROLES, "Laboratory Technician"),
    int("JobSatisfaction", "Job Satisfaction", Satisfaction, 3),
    choice("MaritalStatus", "Marital Status", Demographics, MARITAL_STATUSES, "Married"),
    int("MonthlyIncome", "Monthly Income ($)", Compensation, 5000),
    int("MonthlyRate", "Monthly Rate", Compensation, 15000),
    int("NumCompaniesWorked", "Companies Worked", Tenure, 2),
    choice("OverTime", "OverTime", Job, YES_NO, "No"),
    int("PercentSalaryHike", "Salary Hike (%)", Compensation, 15),
    int("PerformanceRating", "Performance Rating", Satisfaction, 3),
    int("RelationshipSatisfaction", "Relation. Satisf.", Satisfaction, 3),
    int("StockOptionLevel", "Stock Option Level", Compensation, 1),
    int("TotalWorkingYears", "Total Working Years", Tenure, 10),
    int("TrainingTimesLastYear", "Trainings Last Year", Tenure, 2),
    int("WorkLifeBalance", "Work Life Balance", Satisfaction, 3),
    int("YearsAtCompany", "Years At Company", Tenure, 5),
    int("YearsInCurrentRole", "Years In Role", Tenure, 2),
    int("YearsSinceLastPromotion", "Since Promotion", Tenure, 1),
    int("YearsWithCurrManager", "Years With Manager", Tenure, 3),
];

/// Look up a field by wire name
pub fn field(name: &str) -> Option<&'static FieldSpec> {
    SCHEMA.iter().find(|f| f.name == name)
}

/// Position of a field in the schema
pub fn index_of(name: &str) -> Option<usize> {
    SCHEMA.iter().position(|f| f.name == name)
}

/// Schema indices grouped by section, wire order within a section
pub fn display_order() -> Vec<usize> {
    let mut order: Vec<usize> = (0..FIELD_COUNT).collect();
    order.sort_by_key(|&i| SCHEMA[i].group);
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_order_groups_fields() {
        let order = display_order();
        assert_eq!(order.len(), FIELD_COUNT);
        assert_eq!(order[0], 0);
        assert!(order.windows(2).all(|w| SCHEMA[w[0]].group <= SCHEMA[w[1]].group));
    }

    #[test]
    fn test_schema_names_are_unique() {
        let mut names: Vec<&str> = SCHEMA.iter().map(|f| f.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FIELD_COUNT);
    }

    #[test]
    fn test_defaults_validate() {
        for spec in SCHEMA.iter() {
            assert!(spec.validate(&spec.default_value()).is_ok(), "{} default invalid", spec.name);
        }
    }

    #[test]
    fn test_parse_integer() {
        let age = field("Age").unwrap();
        assert_eq!(age.parse(" 42 ").unwrap(), FieldValue::Integer(42));
        assert!(matches!(age.parse("forty"), Err(RecordError::InvalidInteger { .. })));
        assert!(matches!(age.parse("41.5"), Err(RecordError::InvalidInteger { .. })));
    }

    #[test]
    fn test_parse_choice_rejects_unknown_option() {
        let gender = field("Gender").unwrap();
        assert_eq!(gender.parse("Female").unwrap(), FieldValue::Text("Female".to_string()));

        let err = gender.parse("female").unwrap_err();
        assert!(matches!(err, RecordError::NotInDomain { .. }));
        assert!(err.to_string().contains("Male, Female"));
    }

    #[test]
    fn test_business_travel_is_free_text() {
        let travel = field("BusinessTravel").unwrap();
        assert_eq!(
            travel.parse("Travel_Frequently").unwrap(),
            FieldValue::Text("Travel_Frequently".to_string())
        );
    }

    #[test]
    fn test_from_json_type_checks() {
        let age = field("Age").unwrap();
        assert_eq!(age.from_json(&serde_json::json!(35)).unwrap(), FieldValue::Integer(35));
        assert!(matches!(
            age.from_json(&serde_json::json!("35")),
            Err(RecordError::WrongType { .. })
        ));
        assert!(matches!(
            age.from_json(&serde_json::json!(35.5)),
            Err(RecordError::InvalidInteger { .. })
        ));

        let overtime = field("OverTime").unwrap();
        assert!(overtime.from_json(&serde_json::json!("Yes")).is_ok());
        assert!(overtime.from_json(&serde_json::json!(true)).is_err());
    }

    #[test]
    fn test_cycle_wraps_both_ways() {
        let overtime = field("OverTime").unwrap();
        let no = FieldValue::Text("No".to_string());
        assert_eq!(overtime.cycle(&no, true), FieldValue::Text("Yes".to_string()));

        let yes = FieldValue::Text("Yes".to_string());
        assert_eq!(overtime.cycle(&yes, false), FieldValue::Text("No".to_string()));

        let age = field("Age").unwrap();
        assert_eq!(age.cycle(&FieldValue::Integer(3), true), FieldValue::Integer(3));
    }
}
