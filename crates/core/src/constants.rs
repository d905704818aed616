//! Constants used throughout the consent-sync core crate.
//!
//! Wire-level field names and marker values for the record API live here so that the record
//! model, the store clients and the tests all agree on a single spelling.

/// Primary key field shared by both record stores.
pub const FIELD_RECORD_ID: &str = "record_id";

/// Participant email address.
pub const FIELD_PATIENT_EMAIL: &str = "pt_email";

/// Participant phone number.
pub const FIELD_PATIENT_PHONE: &str = "pt_phone";

/// Email address of the research staff member who screened the participant.
pub const FIELD_STAFF_EMAIL: &str = "res_email";

/// Date the participant was found eligible.
pub const FIELD_ELIGIBILITY_DATE: &str = "elig_date";

/// Consent preference code (`1` electronic, `2` in-person).
pub const FIELD_CONSENT_CHOICE: &str = "interested_consent";

/// Completion status of the screening form in the target store.
pub const FIELD_SCREENING_FORM_STATUS: &str = "trace_ai_eligibility_screening_draft_complete";

/// Completion status of the record set-up form in the target store.
pub const FIELD_RECORD_SETUP_STATUS: &str = "record_set_up_complete";

/// Trigger field that fires the electronic consent alert.
pub const FIELD_ELECTRONIC_CONSENT_TRIGGER: &str = "trigger_email";

/// Trigger field that fires the in-person consent alert.
pub const FIELD_IN_PERSON_CONSENT_TRIGGER: &str = "cons_in_person_email";

/// The only source fields allowed to cross into the target store, besides the record id.
pub const ALLOW_LISTED_FIELDS: [&str; 5] = [
    FIELD_PATIENT_EMAIL,
    FIELD_PATIENT_PHONE,
    FIELD_STAFF_EMAIL,
    FIELD_ELIGIBILITY_DATE,
    FIELD_CONSENT_CHOICE,
];

/// Form status value meaning "Complete".
pub const FORM_STATUS_COMPLETE: &str = "2";

/// Value written to a trigger field to fire its alert.
pub const TRIGGER_ACTIVATE: &str = "1";

/// Consent code for electronic consent.
pub const CONSENT_CODE_ELECTRONIC: &str = "1";

/// Consent code for in-person consent.
pub const CONSENT_CODE_IN_PERSON: &str = "2";

/// Default timeout applied to every record API call.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Timeout applied to the startup connectivity probe.
pub const CONNECTIVITY_CHECK_TIMEOUT_SECS: u64 = 10;
