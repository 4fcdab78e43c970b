//! Submission input: the applicant's form fields plus uploaded files.

use super::application::{ApplicantType, FamilyMember};

/// A file received with the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    /// Declared content type, if the client sent one.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.map(str::to_string),
            bytes,
        }
    }

    /// Declared content type, falling back to a guess from the file name.
    pub fn effective_content_type(&self) -> String {
        match self.content_type.as_deref() {
            Some(ct) if !ct.trim().is_empty() => ct.trim().to_ascii_lowercase(),
            _ => mime_guess::from_path(&self.filename)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Everything an applicant submits.
#[derive(Debug, Clone, Default)]
pub struct ApplicationForm {
    pub applicant_type: ApplicantType,
    pub employee_name: String,
    pub designation: String,
    pub employee_no: String,
    pub ruid_no: String,
    pub date_of_birth: String,
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
    pub photo: Option<Upload>,
    pub signature: Option<Upload>,
    pub hindi_name: Option<Upload>,
    pub hindi_designation: Option<Upload>,
}

impl ApplicationForm {
    /// Sets a scalar field by its form name. Returns `false` for unknown
    /// names.
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "employeeName" => &mut self.employee_name,
            "designation" => &mut self.designation,
            "employeeNo" => &mut self.employee_no,
            "ruidNo" => &mut self.ruid_no,
            "dateOfBirth" => &mut self.date_of_birth,
            "department" => &mut self.department,
            "station" => &mut self.station,
            "billUnit" => &mut self.bill_unit,
            "residentialAddress" => &mut self.residential_address,
            "rlyContactNumber" => &mut self.rly_contact_number,
            "mobileNumber" => &mut self.mobile_number,
            "reasonForApplication" => &mut self.reason_for_application,
            "emergencyContactName" => &mut self.emergency_contact_name,
            "emergencyContactNumber" => &mut self.emergency_contact_number,
            _ => return false,
        };
        *slot = value;
        true
    }
}
