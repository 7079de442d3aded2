//! Required-field enforcement.
//!
//! A pure check over the field records and a candidate value set, run before
//! the custom validate stage so that validators never re-implement
//! required-ness. A failure here short-circuits the pipeline.

use serde_json::{Map, Value};

use formwork_types::field::FieldRecord;
use formwork_types::validation::ValidationResult;

const REQUIRED_MESSAGE: &str = "Field is required";
const FORM_MESSAGE: &str = "Required fields are missing";

/// A value that does not satisfy a required field: null, empty string,
/// empty array, or boolean false.
pub fn is_missing_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Bool(b) => !b,
        _ => false,
    }
}

/// Check every required record against the candidate values.
///
/// Candidates are keyed by submission name (they come from the sanitize
/// stage); a record whose name is absent falls back to its own value.
/// Returns `None` when nothing is missing.
pub fn check_required<'a>(
    records: impl IntoIterator<Item = &'a FieldRecord>,
    candidate_values: &Map<String, Value>,
) -> Option<ValidationResult> {
    let mut result = ValidationResult::invalid(FORM_MESSAGE);
    let mut missing = false;

    for record in records {
        if !record.required {
            continue;
        }
        let value = candidate_values.get(&record.name).unwrap_or(&record.value);
        if is_missing_value(value) {
            missing = true;
            result = result
                .with_field_error(record.field_id.clone(), REQUIRED_MESSAGE)
                .with_detail(record.name.clone());
        }
    }

    missing.then_some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn required_record(field_id: &str, value: Value) -> FieldRecord {
        let mut record = FieldRecord::new(field_id);
        record.required = true;
        record.value = value;
        record
    }

    #[test]
    fn test_missing_value_classification() {
        assert!(is_missing_value(&Value::Null));
        assert!(is_missing_value(&json!("")));
        assert!(is_missing_value(&json!([])));
        assert!(is_missing_value(&json!(false)));

        assert!(!is_missing_value(&json!("x")));
        assert!(!is_missing_value(&json!(0)));
        assert!(!is_missing_value(&json!(["a"])));
        assert!(!is_missing_value(&json!(true)));
        assert!(!is_missing_value(&json!({})));
    }

    #[test]
    fn test_all_present_returns_none() {
        let records = vec![required_record("email", json!("a@b.com"))];
        let mut candidates = Map::new();
        candidates.insert("email".into(), json!("a@b.com"));
        assert!(check_required(&records, &candidates).is_none());
    }

    #[test]
    fn test_missing_field_reported() {
        let records = vec![
            required_record("email", json!("")),
            required_record("code", json!("123456")),
        ];
        let mut candidates = Map::new();
        candidates.insert("email".into(), json!(""));
        candidates.insert("code".into(), json!("123456"));

        let result = check_required(&records, &candidates).unwrap();
        assert!(!result.is_valid());
        assert!(result.field_messages.contains_key("email"));
        assert!(!result.field_messages.contains_key("code"));
        let messages = result.field_messages["email"].messages.as_ref().unwrap();
        assert_eq!(messages.get("error").unwrap()[0], REQUIRED_MESSAGE);

        let form = result.form_messages.as_ref().unwrap();
        assert_eq!(form.message.as_deref(), Some(FORM_MESSAGE));
        assert_eq!(form.details, vec!["email".to_string()]);
    }

    #[test]
    fn test_candidate_overrides_record_value() {
        // Sanitize may have emptied a value that looked present in the record.
        let records = vec![required_record("email", json!("  "))];
        let mut candidates = Map::new();
        candidates.insert("email".into(), json!(""));
        assert!(check_required(&records, &candidates).is_some());
    }

    #[test]
    fn test_falls_back_to_record_value() {
        let records = vec![required_record("email", json!("a@b.com"))];
        // Candidate map has no entry for the field at all.
        assert!(check_required(&records, &Map::new()).is_none());

        let records = vec![required_record("email", Value::Null)];
        assert!(check_required(&records, &Map::new()).is_some());
    }

    #[test]
    fn test_optional_fields_ignored() {
        let mut optional = FieldRecord::new("nickname");
        optional.value = Value::Null;
        assert!(check_required(&[optional], &Map::new()).is_none());
    }

    #[test]
    fn test_details_use_submission_name() {
        let mut record = required_record("f1", json!(""));
        record.name = "contact_email".into();
        let result = check_required(&[record], &Map::new()).unwrap();
        assert_eq!(
            result.form_messages.as_ref().unwrap().details,
            vec!["contact_email".to_string()]
        );
        // Field messages stay keyed by field id.
        assert!(result.field_messages.contains_key("f1"));
    }
}
