//! Builders for submission forms and raw records.

#![allow(dead_code)]

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use serde_json::{Map, Value};

use idportal::{ApplicantType, ApplicationForm, FamilyMember, RawRecord, Upload};

/// A small solid-colour PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([30, 60, 90, 255]));
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .expect("Failed to encode PNG");
    buf.into_inner()
}

pub fn png_upload(name: &str) -> Upload {
    Upload::new(name, Some("image/png"), png_bytes(60, 75))
}

/// Builder for `ApplicationForm` starting from a valid non-gazetted form.
pub struct FormBuilder {
    form: ApplicationForm,
}

impl FormBuilder {
    pub fn new() -> Self {
        Self {
            form: ApplicationForm {
                applicant_type: ApplicantType::NonGazetted,
                employee_name: "Ravi Kumar Sahu".to_string(),
                designation: "Senior Clerk".to_string(),
                employee_no: "40213".to_string(),
                ruid_no: String::new(),
                date_of_birth: "1988-07-21".to_string(),
                department: "Commercial".to_string(),
                station: "Khurda Road".to_string(),
                bill_unit: "3101".to_string(),
                residential_address: "Qr. 12/B, Railway Colony, Khurda".to_string(),
                rly_contact_number: "22345".to_string(),
                mobile_number: "9876543210".to_string(),
                reason_for_application: "New".to_string(),
                emergency_contact_name: "Sita Sahu".to_string(),
                emergency_contact_number: "9123456780".to_string(),
                family_members: vec![],
                photo: Some(png_upload("photo.png")),
                signature: Some(png_upload("signature.png")),
                hindi_name: None,
                hindi_designation: None,
            },
        }
    }

    /// Gazetted applicant with a RUID and both Hindi uploads.
    pub fn gazetted() -> Self {
        Self::new()
            .applicant_type(ApplicantType::Gazetted)
            .employee_no("")
            .ruid_no("RUID7781")
            .hindi_uploads()
    }

    pub fn applicant_type(mut self, applicant_type: ApplicantType) -> Self {
        self.form.applicant_type = applicant_type;
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.form.employee_name = name.to_string();
        self
    }

    pub fn employee_no(mut self, value: &str) -> Self {
        self.form.employee_no = value.to_string();
        self
    }

    pub fn ruid_no(mut self, value: &str) -> Self {
        self.form.ruid_no = value.to_string();
        self
    }

    pub fn date_of_birth(mut self, value: &str) -> Self {
        self.form.date_of_birth = value.to_string();
        self
    }

    pub fn mobile(mut self, value: &str) -> Self {
        self.form.mobile_number = value.to_string();
        self
    }

    pub fn family_member(mut self, name: &str, relationship: &str, dob: &str) -> Self {
        self.form.family_members.push(FamilyMember {
            name: name.to_string(),
            relationship: relationship.to_string(),
            date_of_birth: Some(dob.to_string()),
            blood_group: "O+".to_string(),
            identification_marks: String::new(),
        });
        self
    }

    pub fn hindi_uploads(mut self) -> Self {
        self.form.hindi_name = Some(png_upload("hindi-name.png"));
        self.form.hindi_designation = Some(png_upload("hindi-designation.png"));
        self
    }

    pub fn without_hindi_uploads(mut self) -> Self {
        self.form.hindi_name = None;
        self.form.hindi_designation = None;
        self
    }

    pub fn photo(mut self, upload: Option<Upload>) -> Self {
        self.form.photo = upload;
        self
    }

    pub fn build(self) -> ApplicationForm {
        self.form
    }
}

/// Builder for raw backend records with arbitrary keys.
pub struct RecordBuilder {
    record: Map<String, Value>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self { record: Map::new() }
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.record.insert(key.to_string(), value.into());
        self
    }

    pub fn build(self) -> RawRecord {
        self.record
    }
}
