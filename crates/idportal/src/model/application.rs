//! The canonical application record and its workflow vocabulary.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Applicant category. Decides which identifier and which documents are
/// mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicantType {
    Gazetted,
    #[default]
    NonGazetted,
}

impl ApplicantType {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicantType::Gazetted => "gazetted",
            ApplicantType::NonGazetted => "non-gazetted",
        }
    }

    /// Parses the stored name or the short URL form (`gaz` / `ng`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gazetted" | "gaz" => Some(ApplicantType::Gazetted),
            "non-gazetted" | "nongazetted" | "non_gazetted" | "ng" => {
                Some(ApplicantType::NonGazetted)
            }
            _ => None,
        }
    }

    /// Label used for the identifier row in summaries.
    pub fn identifier_label(self) -> &'static str {
        match self {
            ApplicantType::Gazetted => "RUID No",
            ApplicantType::NonGazetted => "Employee No",
        }
    }
}

impl fmt::Display for ApplicantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow status of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Capitalized form kept in stored records (`Pending`, `Approved`, ...).
    pub fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    /// Case-insensitive parse of a stored or requested status.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(ApplicationStatus::Pending),
            "approved" => Some(ApplicationStatus::Approved),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }

    /// Only pending applications may move, and only to a final state.
    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        matches!(
            (self, next),
            (ApplicationStatus::Pending, ApplicationStatus::Approved)
                | (ApplicationStatus::Pending, ApplicationStatus::Rejected)
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the family-details table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "relation")]
    pub relationship: String,
    #[serde(default, rename = "dob", alias = "dateOfBirth")]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub blood_group: String,
    #[serde(default)]
    pub identification_marks: String,
}

/// Actions an administrator can take on a listed application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdminAction {
    View,
    Approve,
    Reject,
    ViewRemark,
}

/// Reference to an uploaded document: the storage id and the URL it
/// resolves to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    pub file_id: Option<String>,
    pub url: Option<String>,
}

impl DocumentRef {
    pub fn from_file_id(file_id: impl Into<String>) -> Self {
        let file_id = file_id.into();
        Self {
            url: Some(file_url(&file_id)),
            file_id: Some(file_id),
        }
    }

    pub fn is_present(&self) -> bool {
        self.file_id.is_some() || self.url.is_some()
    }
}

/// URL under which a stored document is served.
pub fn file_url(file_id: &str) -> String {
    format!("/api/file/{}", file_id)
}

/// Canonical application record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub applicant_type: ApplicantType,
    pub employee_name: String,
    pub employee_no: String,
    pub ruid_no: String,
    pub date_of_birth: String,
    pub designation: String,
    pub department: String,
    pub station: String,
    pub bill_unit: String,
    pub residential_address: String,
    pub rly_contact_number: String,
    pub mobile_number: String,
    pub reason_for_application: String,
    pub emergency_contact_name: String,
    pub emergency_contact_number: String,
    pub family_members: Vec<FamilyMember>,
    pub photo: DocumentRef,
    pub signature: DocumentRef,
    pub hindi_name: DocumentRef,
    pub hindi_designation: DocumentRef,
    pub qr: DocumentRef,
    pub status: ApplicationStatus,
    pub remark: Option<String>,
    pub application_date: Option<String>,
    pub updated_at: Option<String>,
}

impl Application {
    /// Number printed in the P.F.No. row: RUID first, then employee number.
    pub fn identity_number(&self) -> Option<&str> {
        [self.ruid_no.as_str(), self.employee_no.as_str()]
            .into_iter()
            .map(str::trim)
            .find(|v| !v.is_empty())
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }

    /// Actions offered for this record. Approve/reject only exist while the
    /// application is pending.
    pub fn available_actions(&self) -> Vec<AdminAction> {
        let mut actions = vec![AdminAction::View];
        match self.status {
            ApplicationStatus::Pending => {
                actions.push(AdminAction::Approve);
                actions.push(AdminAction::Reject);
            }
            ApplicationStatus::Rejected
                if self.remark.as_deref().is_some_and(|r| !r.trim().is_empty()) =>
            {
                actions.push(AdminAction::ViewRemark);
            }
            _ => {}
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applicant_type_parse() {
        assert_eq!(ApplicantType::parse("gazetted"), Some(ApplicantType::Gazetted));
        assert_eq!(ApplicantType::parse("GAZ"), Some(ApplicantType::Gazetted));
        assert_eq!(
            ApplicantType::parse("non-gazetted"),
            Some(ApplicantType::NonGazetted)
        );
        assert_eq!(ApplicantType::parse("ng"), Some(ApplicantType::NonGazetted));
        assert_eq!(ApplicantType::parse("contractor"), None);
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(
            ApplicationStatus::parse("Pending"),
            Some(ApplicationStatus::Pending)
        );
        assert_eq!(
            ApplicationStatus::parse(" APPROVED "),
            Some(ApplicationStatus::Approved)
        );
        assert_eq!(ApplicationStatus::parse("archived"), None);
    }

    #[test]
    fn test_transitions_only_leave_pending() {
        use ApplicationStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Approved));
    }

    #[test]
    fn test_identity_number_prefers_ruid() {
        let mut app = Application {
            employee_no: "EMP-1".to_string(),
            ruid_no: "RUID-9".to_string(),
            ..Default::default()
        };
        assert_eq!(app.identity_number(), Some("RUID-9"));

        app.ruid_no = "  ".to_string();
        assert_eq!(app.identity_number(), Some("EMP-1"));

        app.employee_no.clear();
        assert_eq!(app.identity_number(), None);
    }

    #[test]
    fn test_actions_follow_status() {
        let mut app = Application::default();
        assert_eq!(
            app.available_actions(),
            vec![AdminAction::View, AdminAction::Approve, AdminAction::Reject]
        );

        app.status = ApplicationStatus::Approved;
        assert_eq!(app.available_actions(), vec![AdminAction::View]);

        app.status = ApplicationStatus::Rejected;
        assert_eq!(app.available_actions(), vec![AdminAction::View]);

        app.remark = Some("blurred photo".to_string());
        assert_eq!(
            app.available_actions(),
            vec![AdminAction::View, AdminAction::ViewRemark]
        );
    }

    #[test]
    fn test_family_member_accepts_relation_alias() {
        let member: FamilyMember = serde_json::from_str(
            r#"{"name":"Asha","relation":"Spouse","dob":"1992-04-01","bloodGroup":"B+"}"#,
        )
        .unwrap();
        assert_eq!(member.relationship, "Spouse");
        assert_eq!(member.date_of_birth.as_deref(), Some("1992-04-01"));
        assert_eq!(member.blood_group, "B+");
        assert!(member.identification_marks.is_empty());
    }

    #[test]
    fn test_document_ref_from_file_id() {
        let doc = DocumentRef::from_file_id("abc");
        assert_eq!(doc.url.as_deref(), Some("/api/file/abc"));
        assert!(doc.is_present());
        assert!(!DocumentRef::default().is_present());
    }
}
