pub mod application;
pub mod dates;
pub mod form;
pub mod mapping;

pub use application::{
    file_url, AdminAction, Application, ApplicantType, ApplicationStatus, DocumentRef,
    FamilyMember,
};
pub use dates::{
    date_part_string, extract_date_part, format_display_date, format_optional_date, same_date,
    NOT_AVAILABLE,
};
pub use form::{ApplicationForm, Upload};
pub use mapping::{map_record, map_records, RawRecord};
