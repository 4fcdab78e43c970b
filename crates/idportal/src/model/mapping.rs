//! Conversion of loosely shaped backend documents into [`Application`].
//!
//! Records written by different versions of the portal use different key
//! names for the same field. Every field has one ordered list of candidate
//! keys below and the first non-empty value wins.

use serde_json::{Map, Value};

use super::application::{
    file_url, Application, ApplicantType, ApplicationStatus, DocumentRef, FamilyMember,
};

/// A backend document as stored or exchanged.
pub type RawRecord = Map<String, Value>;

const ID_KEYS: &[&str] = &["id", "$id", "applicationId"];
const NAME_KEYS: &[&str] = &["employeeName", "empName", "name", "fullName"];
const EMPLOYEE_NO_KEYS: &[&str] = &["employeeNo", "empNo", "empId", "employeeId"];
const RUID_KEYS: &[&str] = &["ruidNo"];
const DOB_KEYS: &[&str] = &["dateOfBirth", "dob"];
const ADDRESS_KEYS: &[&str] = &[
    "residentialAddress",
    "residential_address",
    "ResidentialAddress",
    "RESIDENTIALADDRESS",
    "residential address",
    "address",
    "presentAddress",
    "permanentAddress",
];
const APPLICATION_DATE_KEYS: &[&str] =
    &["applicationDate", "submissionDate", "$createdAt", "createdAt"];
const UPDATED_AT_KEYS: &[&str] = &["updatedAt", "$updatedAt"];
const EMERGENCY_NAME_KEYS: &[&str] = &["emergencyContactName", "emergencyName"];
const EMERGENCY_NUMBER_KEYS: &[&str] = &["emergencyContactNumber", "emergencyPhone"];

/// Maps a raw record to the canonical application.
pub fn map_record(raw: &RawRecord) -> Application {
    let status = match first_text(raw, &["status"]) {
        Some(s) => ApplicationStatus::parse(&s).unwrap_or_else(|| {
            log::warn!("Unknown application status '{}', treating as pending", s);
            ApplicationStatus::Pending
        }),
        None => ApplicationStatus::Pending,
    };

    let applicant_type = first_text(raw, &["applicantType"])
        .and_then(|t| ApplicantType::parse(&t))
        .unwrap_or_default();

    Application {
        id: first_text(raw, ID_KEYS).unwrap_or_default(),
        applicant_type,
        employee_name: first_text(raw, NAME_KEYS).unwrap_or_default(),
        employee_no: first_text(raw, EMPLOYEE_NO_KEYS).unwrap_or_default(),
        ruid_no: first_text(raw, RUID_KEYS).unwrap_or_default(),
        date_of_birth: first_text(raw, DOB_KEYS).unwrap_or_default(),
        designation: text(raw, "designation"),
        department: text(raw, "department"),
        station: text(raw, "station"),
        bill_unit: text(raw, "billUnit"),
        residential_address: first_text(raw, ADDRESS_KEYS).unwrap_or_default(),
        rly_contact_number: text(raw, "rlyContactNumber"),
        mobile_number: text(raw, "mobileNumber"),
        reason_for_application: text(raw, "reasonForApplication"),
        emergency_contact_name: first_text(raw, EMERGENCY_NAME_KEYS).unwrap_or_default(),
        emergency_contact_number: first_text(raw, EMERGENCY_NUMBER_KEYS).unwrap_or_default(),
        family_members: family_members(raw),
        photo: document(raw, "photoUrl", "photoFileId"),
        signature: document(raw, "signatureUrl", "signatureFileId"),
        hindi_name: document(raw, "hindiNameUrl", "hindiNameFileId"),
        hindi_designation: document(raw, "hindiDesignationUrl", "hindiDesignationFileId"),
        qr: document(raw, "qrUrl", "qrFileId"),
        status,
        remark: first_text(raw, &["remark", "rejectionRemarks"]),
        application_date: first_text(raw, APPLICATION_DATE_KEYS),
        updated_at: first_text(raw, UPDATED_AT_KEYS),
    }
}

/// Maps every object in a JSON array, skipping non-objects.
pub fn map_records(values: &[Value]) -> Vec<Application> {
    values
        .iter()
        .filter_map(Value::as_object)
        .map(map_record)
        .collect()
}

fn text(raw: &RawRecord, key: &str) -> String {
    first_text(raw, &[key]).unwrap_or_default()
}

/// First non-blank scalar among `keys`, in order. Numbers are stringified so
/// numeric employee numbers survive.
fn first_text(raw: &RawRecord, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match raw.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn family_members(raw: &RawRecord) -> Vec<FamilyMember> {
    if let Some(Value::String(json)) = raw.get("familyMembersJson") {
        if !json.trim().is_empty() {
            match serde_json::from_str::<Vec<FamilyMember>>(json) {
                Ok(members) => return members,
                Err(e) => log::warn!("Ignoring malformed familyMembersJson: {}", e),
            }
        }
    }

    match raw.get("familyMembers") {
        Some(value @ Value::Array(_)) => serde_json::from_value(value.clone())
            .unwrap_or_else(|e| {
                log::warn!("Ignoring malformed familyMembers array: {}", e);
                Vec::new()
            }),
        _ => Vec::new(),
    }
}

fn document(raw: &RawRecord, url_key: &str, file_id_key: &str) -> DocumentRef {
    let file_id = first_text(raw, &[file_id_key]);
    let url = first_text(raw, &[url_key]).or_else(|| file_id.as_deref().map(file_url));
    DocumentRef { file_id, url }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_maps_current_shape() {
        let app = map_record(&raw(json!({
            "$id": "app-1",
            "applicantType": "gazetted",
            "employeeName": "Ravi Kumar Sahu",
            "ruidNo": "RUID123",
            "dateOfBirth": "1988-07-21",
            "designation": "Senior Clerk",
            "status": "Approved",
            "photoFileId": "photo-1",
            "familyMembersJson": "[{\"name\":\"Mina\",\"relationship\":\"Wife\",\"dob\":\"1990-01-01\",\"bloodGroup\":\"O+\"}]"
        })));

        assert_eq!(app.id, "app-1");
        assert_eq!(app.applicant_type, ApplicantType::Gazetted);
        assert_eq!(app.employee_name, "Ravi Kumar Sahu");
        assert_eq!(app.status, ApplicationStatus::Approved);
        assert_eq!(app.photo.url.as_deref(), Some("/api/file/photo-1"));
        assert_eq!(app.family_members.len(), 1);
        assert_eq!(app.family_members[0].relationship, "Wife");
    }

    #[test]
    fn test_precedence_of_legacy_keys() {
        let app = map_record(&raw(json!({
            "id": "new-id",
            "$id": "old-id",
            "empName": "Legacy Name",
            "name": "Other",
            "empNo": 40213,
            "dob": "1970-05-05T00:00:00.000Z",
            "emergencyPhone": "9876543210"
        })));

        assert_eq!(app.id, "new-id");
        assert_eq!(app.employee_name, "Legacy Name");
        assert_eq!(app.employee_no, "40213");
        assert_eq!(app.date_of_birth, "1970-05-05T00:00:00.000Z");
        assert_eq!(app.emergency_contact_number, "9876543210");
    }

    #[test]
    fn test_residential_address_precedence() {
        let app = map_record(&raw(json!({
            "address": "Generic",
            "residential_address": "Snake case",
            "permanentAddress": "Permanent"
        })));
        assert_eq!(app.residential_address, "Snake case");

        let app = map_record(&raw(json!({
            "residentialAddress": "  ",
            "presentAddress": "Present",
            "permanentAddress": "Permanent"
        })));
        assert_eq!(app.residential_address, "Present");
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let app = map_record(&RawRecord::new());
        assert_eq!(app.status, ApplicationStatus::Pending);
        assert_eq!(app.applicant_type, ApplicantType::NonGazetted);
        assert!(app.family_members.is_empty());
        assert!(!app.photo.is_present());
        assert_eq!(app.remark, None);
    }

    #[test]
    fn test_unknown_status_is_pending() {
        let app = map_record(&raw(json!({ "status": "on-hold" })));
        assert_eq!(app.status, ApplicationStatus::Pending);
    }

    #[test]
    fn test_explicit_url_wins_over_file_id() {
        let app = map_record(&raw(json!({
            "signatureUrl": "https://cdn.example/sig.png",
            "signatureFileId": "sig-1"
        })));
        assert_eq!(app.signature.url.as_deref(), Some("https://cdn.example/sig.png"));
        assert_eq!(app.signature.file_id.as_deref(), Some("sig-1"));
    }

    #[test]
    fn test_family_members_array_fallback() {
        let app = map_record(&raw(json!({
            "familyMembersJson": "not json",
            "familyMembers": [{"name": "Son", "relation": "Son"}]
        })));
        assert_eq!(app.family_members.len(), 1);
        assert_eq!(app.family_members[0].name, "Son");
    }

    #[test]
    fn test_map_records_skips_non_objects() {
        let apps = map_records(&[json!({"id": "a"}), json!(5), json!({"id": "b"})]);
        let ids: Vec<_> = apps.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
