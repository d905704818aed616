//! Record model and the source-to-target projection.
//!
//! Records travel over the wire as flat string-keyed JSON objects ([`Record`]). The typed
//! structs here describe the subset of fields this service reads or writes:
//!
//! - [`SourceRecord`]: what is read from the source store
//! - [`TargetRecord`]: the allow-listed projection written to the target store
//! - [`NotificationUpdate`]: a partial record that sets exactly one alert trigger

use crate::consent::{ConsentBranch, ConsentState};
use crate::constants::{
    FIELD_CONSENT_CHOICE, FIELD_RECORD_ID, FORM_STATUS_COMPLETE, TRIGGER_ACTIVATE,
};
use consent_types::RecordId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A flat record as exchanged with a record store.
pub type Record = serde_json::Map<String, Value>;

/// Render a scalar JSON value as the text a record store would show for it.
///
/// `null` has no text form. Strings are returned verbatim; other scalars use their JSON spelling.
fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// The consent code carried in `record`, coerced to text. Absent or `null` becomes `""`.
pub fn consent_code(record: &Record) -> String {
    record
        .get(FIELD_CONSENT_CHOICE)
        .and_then(value_to_text)
        .unwrap_or_default()
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_text))
}

fn code_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_text(deserializer)?.unwrap_or_default())
}

/// The fields read from a source-store record.
///
/// Any other field present in the source record is ignored and never leaves this struct.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SourceRecord {
    #[serde(rename = "pt_email", default, deserialize_with = "optional_text")]
    pub patient_email: Option<String>,
    #[serde(rename = "pt_phone", default, deserialize_with = "optional_text")]
    pub patient_phone: Option<String>,
    #[serde(rename = "res_email", default, deserialize_with = "optional_text")]
    pub staff_email: Option<String>,
    #[serde(rename = "elig_date", default, deserialize_with = "optional_text")]
    pub eligibility_date: Option<String>,
    #[serde(rename = "interested_consent", default, deserialize_with = "code_text")]
    pub consent_choice: String,
}

impl SourceRecord {
    /// Decode a raw source record.
    ///
    /// Its own `record_id` field is ignored; the caller's identifier stays the join key.
    pub fn from_record(record: Record) -> serde_json::Result<Self> {
        serde_json::from_value(Value::Object(record))
    }

    pub fn consent_state(&self) -> ConsentState {
        ConsentState::from_code(&self.consent_choice)
    }
}

/// The minimal record written to the target store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub record_id: RecordId,
    #[serde(rename = "pt_email", default, deserialize_with = "optional_text")]
    pub patient_email: Option<String>,
    #[serde(rename = "pt_phone", default, deserialize_with = "optional_text")]
    pub patient_phone: Option<String>,
    #[serde(rename = "res_email", default, deserialize_with = "optional_text")]
    pub staff_email: Option<String>,
    #[serde(rename = "elig_date", default, deserialize_with = "optional_text")]
    pub eligibility_date: Option<String>,
    #[serde(rename = "interested_consent", default, deserialize_with = "code_text")]
    pub consent_choice: String,
    #[serde(rename = "trace_ai_eligibility_screening_draft_complete", default)]
    pub screening_form_status: String,
    #[serde(rename = "record_set_up_complete", default)]
    pub record_setup_status: String,
}

impl TargetRecord {
    /// Project a source record through the field allow-list.
    ///
    /// Allow-listed values are copied verbatim; both form status fields are marked complete.
    pub fn project(record_id: RecordId, source: &SourceRecord) -> Self {
        Self {
            record_id,
            patient_email: source.patient_email.clone(),
            patient_phone: source.patient_phone.clone(),
            staff_email: source.staff_email.clone(),
            eligibility_date: source.eligibility_date.clone(),
            consent_choice: source.consent_choice.clone(),
            screening_form_status: FORM_STATUS_COMPLETE.to_string(),
            record_setup_status: FORM_STATUS_COMPLETE.to_string(),
        }
    }

    pub fn consent_state(&self) -> ConsentState {
        ConsentState::from_code(&self.consent_choice)
    }

    pub fn to_record(&self) -> serde_json::Result<Record> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(serde::ser::Error::custom(
                "target record did not serialize to an object",
            )),
        }
    }
}

/// A partial target record that fires exactly one consent alert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationUpdate {
    record_id: RecordId,
    branch: ConsentBranch,
}

impl NotificationUpdate {
    pub fn new(record_id: RecordId, branch: ConsentBranch) -> Self {
        Self { record_id, branch }
    }

    pub fn record_id(&self) -> &RecordId {
        &self.record_id
    }

    pub fn branch(&self) -> ConsentBranch {
        self.branch
    }

    /// The wire form: the record id plus the branch's trigger field set to the activate marker.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert(
            FIELD_RECORD_ID.to_string(),
            Value::String(self.record_id.as_str().to_string()),
        );
        record.insert(
            self.branch.trigger_field().to_string(),
            Value::String(TRIGGER_ACTIVATE.to_string()),
        );
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{
        ALLOW_LISTED_FIELDS, FIELD_ELECTRONIC_CONSENT_TRIGGER, FIELD_IN_PERSON_CONSENT_TRIGGER,
        FIELD_RECORD_SETUP_STATUS, FIELD_SCREENING_FORM_STATUS,
    };
    use serde_json::json;
    use std::collections::BTreeSet;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn id(value: &str) -> RecordId {
        RecordId::parse(value).unwrap()
    }

    fn full_source() -> Record {
        record(json!({
            "record_id": "42",
            "pt_email": "participant@example.org",
            "pt_phone": "555-0100",
            "res_email": "staff@example.org",
            "elig_date": "2026-01-15",
            "interested_consent": "1",
            "dob": "1970-01-01",
            "mrn": "123456",
            "screening_notes": "private",
        }))
    }

    #[test]
    fn test_projection_copies_only_allow_listed_fields() {
        let source = SourceRecord::from_record(full_source()).unwrap();
        let target = TargetRecord::project(id("42"), &source).to_record().unwrap();

        let keys: BTreeSet<&str> = target.keys().map(String::as_str).collect();
        let mut expected: BTreeSet<&str> = ALLOW_LISTED_FIELDS.into_iter().collect();
        expected.insert(FIELD_RECORD_ID);
        expected.insert(FIELD_SCREENING_FORM_STATUS);
        expected.insert(FIELD_RECORD_SETUP_STATUS);
        assert_eq!(keys, expected);

        assert_eq!(target[FIELD_SCREENING_FORM_STATUS], json!("2"));
        assert_eq!(target[FIELD_RECORD_SETUP_STATUS], json!("2"));
        assert!(!target.contains_key("mrn"));
    }

    #[test]
    fn test_projection_round_trip_is_verbatim() {
        let source = SourceRecord::from_record(full_source()).unwrap();
        let written = TargetRecord::project(id("42"), &source).to_record().unwrap();

        let read_back: TargetRecord = serde_json::from_value(Value::Object(written)).unwrap();
        assert_eq!(read_back.record_id, id("42"));
        assert_eq!(read_back.patient_email.as_deref(), Some("participant@example.org"));
        assert_eq!(read_back.patient_phone.as_deref(), Some("555-0100"));
        assert_eq!(read_back.staff_email.as_deref(), Some("staff@example.org"));
        assert_eq!(read_back.eligibility_date.as_deref(), Some("2026-01-15"));
        assert_eq!(read_back.consent_choice, "1");
    }

    #[test]
    fn test_missing_consent_becomes_empty_string() {
        let source = SourceRecord::from_record(record(json!({ "record_id": "7" }))).unwrap();
        assert_eq!(source.consent_choice, "");
        assert_eq!(source.consent_state(), ConsentState::Unset);

        let target = TargetRecord::project(id("7"), &source).to_record().unwrap();
        assert_eq!(target[FIELD_CONSENT_CHOICE], json!(""));
        assert_eq!(target["pt_email"], Value::Null);
    }

    #[test]
    fn test_numeric_consent_is_coerced_to_text() {
        let source =
            SourceRecord::from_record(record(json!({ "interested_consent": 2, "pt_email": null })))
                .unwrap();
        assert_eq!(source.consent_choice, "2");
        assert_eq!(source.consent_state(), ConsentState::InPerson);
        assert_eq!(source.patient_email, None);
    }

    #[test]
    fn test_projection_keys_on_caller_id_not_echoed_id() {
        let source =
            SourceRecord::from_record(record(json!({ "record_id": "99", "pt_email": "a@b.org" })))
                .unwrap();
        let target = TargetRecord::project(id("42"), &source).to_record().unwrap();
        assert_eq!(target[FIELD_RECORD_ID], json!("42"));
    }

    #[test]
    fn test_consent_code_of_raw_record() {
        assert_eq!(consent_code(&record(json!({ "interested_consent": "1" }))), "1");
        assert_eq!(consent_code(&record(json!({ "interested_consent": null }))), "");
        assert_eq!(consent_code(&record(json!({}))), "");
    }

    #[test]
    fn test_notification_update_sets_exactly_one_trigger() {
        let electronic = NotificationUpdate::new(id("42"), ConsentBranch::Electronic).to_record();
        assert_eq!(electronic.len(), 2);
        assert_eq!(electronic[FIELD_ELECTRONIC_CONSENT_TRIGGER], json!("1"));
        assert!(!electronic.contains_key(FIELD_IN_PERSON_CONSENT_TRIGGER));

        let in_person = NotificationUpdate::new(id("42"), ConsentBranch::InPerson).to_record();
        assert_eq!(in_person.len(), 2);
        assert_eq!(in_person[FIELD_IN_PERSON_CONSENT_TRIGGER], json!("1"));
        assert!(!in_person.contains_key(FIELD_ELECTRONIC_CONSENT_TRIGGER));
        assert_eq!(in_person[FIELD_RECORD_ID], json!("42"));
    }
}
