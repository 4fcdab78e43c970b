//! Input checks run before anything touches storage or the database.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::config::UploadLimits;
use crate::model::{extract_date_part, ApplicantType, ApplicationForm, ApplicationStatus, Upload};

static RE_MOBILE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[6-9][0-9]{9}$").unwrap());

/// One failed check, keyed by the form field it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

/// Every issue found in one input, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub issues: Vec<FieldIssue>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.issues.push(FieldIssue {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.issues.iter().map(|i| i.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

fn require(errors: &mut ValidationErrors, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.push(field, message);
    }
}

fn check_upload(
    errors: &mut ValidationErrors,
    field: &str,
    upload: Option<&Upload>,
    required: bool,
    limits: &UploadLimits,
) {
    let upload = match upload {
        Some(u) if !u.is_empty() => u,
        _ => {
            if required {
                errors.push(field, "File is required.");
            }
            return;
        }
    };

    if upload.bytes.len() as u64 > limits.max_file_bytes {
        errors.push(
            field,
            format!("Max file size is {}.", human_size(limits.max_file_bytes)),
        );
    }

    let content_type = upload.effective_content_type();
    if !limits
        .accepted_types
        .iter()
        .any(|t| t.eq_ignore_ascii_case(&content_type))
    {
        errors.push(field, "Unsupported file type. Accepted: JPG, JPEG, PNG.");
    }
}

fn human_size(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{}KB", bytes.div_ceil(1024))
    }
}

/// Validates a submission. All issues are collected, not just the first.
pub fn validate_form(form: &ApplicationForm, limits: &UploadLimits) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    require(&mut errors, "employeeName", &form.employee_name, "Employee name is required");
    require(&mut errors, "designation", &form.designation, "Designation is required");

    if form.date_of_birth.trim().is_empty() || extract_date_part(&form.date_of_birth).is_none() {
        errors.push("dateOfBirth", "Date of Birth is required");
    }

    require(&mut errors, "department", &form.department, "Department is required");
    require(&mut errors, "station", &form.station, "Station is required");
    require(&mut errors, "billUnit", &form.bill_unit, "Bill unit is required");
    require(
        &mut errors,
        "residentialAddress",
        &form.residential_address,
        "Residential address is required",
    );

    if !RE_MOBILE.is_match(form.mobile_number.trim()) {
        errors.push("mobileNumber", "Valid 10-digit mobile number required");
    }

    require(
        &mut errors,
        "reasonForApplication",
        &form.reason_for_application,
        "Reason for application is required",
    );
    require(
        &mut errors,
        "emergencyContactName",
        &form.emergency_contact_name,
        "Emergency contact name is required",
    );
    if !RE_MOBILE.is_match(form.emergency_contact_number.trim()) {
        errors.push(
            "emergencyContactNumber",
            "Valid 10-digit emergency contact number required",
        );
    }

    let gazetted = form.applicant_type == ApplicantType::Gazetted;
    match form.applicant_type {
        ApplicantType::NonGazetted => require(
            &mut errors,
            "employeeNo",
            &form.employee_no,
            "Employee No is required for Non-Gazetted applicants.",
        ),
        ApplicantType::Gazetted => require(
            &mut errors,
            "ruidNo",
            &form.ruid_no,
            "RUID No is required for Gazetted applicants.",
        ),
    }

    check_upload(&mut errors, "uploadPhoto", form.photo.as_ref(), true, limits);
    check_upload(&mut errors, "uploadSignature", form.signature.as_ref(), true, limits);

    if gazetted && form.hindi_name.as_ref().is_none_or(Upload::is_empty) {
        errors.push(
            "uploadHindiName",
            "Upload Hindi Name is required for Gazetted applicants.",
        );
    } else {
        check_upload(&mut errors, "uploadHindiName", form.hindi_name.as_ref(), false, limits);
    }

    if gazetted && form.hindi_designation.as_ref().is_none_or(Upload::is_empty) {
        errors.push(
            "uploadHindiDesignation",
            "Upload Hindi Designation is required for Gazetted applicants.",
        );
    } else {
        check_upload(
            &mut errors,
            "uploadHindiDesignation",
            form.hindi_designation.as_ref(),
            false,
            limits,
        );
    }

    errors.into_result()
}

/// Checks a requested status change before any lookup. A rejection must
/// carry a remark with visible text.
pub fn validate_status_update(
    status: ApplicationStatus,
    remark: Option<&str>,
) -> Result<(), ValidationErrors> {
    if status == ApplicationStatus::Rejected && remark.is_none_or(|r| r.trim().is_empty()) {
        return Err(ValidationErrors::single(
            "remark",
            "Remark is required for rejection",
        ));
    }
    Ok(())
}
