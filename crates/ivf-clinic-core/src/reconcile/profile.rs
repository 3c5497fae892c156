//! Normalized patient profile.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::PatientRecord;

/// Shown for any contact field the backend did not supply.
pub const PLACEHOLDER: &str = "N/A";

/// Shown when no name can be resolved.
pub const UNKNOWN_PATIENT: &str = "Unknown patient";

/// Which endpoint a profile was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileSource {
    /// Full detail endpoint
    Details,
    /// Fallback basic endpoint
    Basic,
}

/// One patient view, independent of the payload shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: String,
    pub display_name: String,
    pub username: Option<String>,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub medical_history: Option<String>,
    pub blood_type: Option<String>,
    pub source: ProfileSource,
}

/// First candidate that is present and not blank.
pub fn first_present<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|value| !value.trim().is_empty())
}

impl PatientProfile {
    /// Resolve every field by precedence: nested account field, then flat
    /// field, then placeholder.
    pub fn from_record(record: &PatientRecord, source: ProfileSource) -> Self {
        let account = record.account_info.as_ref();
        let nested_name = account.and_then(|a| a.full_name.as_deref());
        let nested_username = account.and_then(|a| a.username.as_deref());
        let nested_phone = account.and_then(|a| a.phone.as_deref());
        let nested_email = account.and_then(|a| a.email.as_deref());
        let nested_address = account.and_then(|a| a.address.as_deref());

        let display_name =
            first_present(&[nested_name, record.full_name.as_deref(), nested_username])
                .unwrap_or(UNKNOWN_PATIENT)
                .to_string();

        let resolve = |nested: Option<&str>, flat: &Option<String>| {
            first_present(&[nested, flat.as_deref()])
                .unwrap_or(PLACEHOLDER)
                .to_string()
        };

        Self {
            id: record.id.clone(),
            display_name,
            username: nested_username.map(str::to_string),
            phone: resolve(nested_phone, &record.phone),
            email: resolve(nested_email, &record.email),
            address: resolve(nested_address, &record.address),
            gender: record.gender.clone(),
            date_of_birth: record.date_of_birth.as_deref().and_then(parse_date),
            medical_history: record.medical_history.clone(),
            blood_type: record.blood_type.clone(),
            source,
        }
    }

    /// Age in whole years on `today`.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let dob = self.date_of_birth?;
        let mut years = today.year() - dob.year();
        if (today.month(), today.day()) < (dob.month(), dob.day()) {
            years -= 1;
        }
        u32::try_from(years).ok()
    }

    /// Whether this profile came from the restricted fallback endpoint.
    pub fn is_partial(&self) -> bool {
        self.source == ProfileSource::Basic
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountInfo;

    #[test]
    fn test_flat_name_without_account() {
        let mut record = PatientRecord::new("P1");
        record.full_name = Some("Jane Doe".into());

        let profile = PatientProfile::from_record(&record, ProfileSource::Details);
        assert_eq!(profile.display_name, "Jane Doe");
        assert_eq!(profile.phone, PLACEHOLDER);
    }

    #[test]
    fn test_nested_fields_win() {
        let mut record = PatientRecord::new("P1");
        record.full_name = Some("Flat Name".into());
        record.phone = Some("111".into());
        record.account_info = Some(AccountInfo {
            full_name: Some("Nested Name".into()),
            phone: Some("222".into()),
            ..Default::default()
        });

        let profile = PatientProfile::from_record(&record, ProfileSource::Details);
        assert_eq!(profile.display_name, "Nested Name");
        assert_eq!(profile.phone, "222");
        assert_eq!(profile.email, PLACEHOLDER);
    }

    #[test]
    fn test_blank_nested_falls_through() {
        let mut record = PatientRecord::new("P1");
        record.email = Some("flat@example.org".into());
        record.account_info = Some(AccountInfo {
            email: Some("  ".into()),
            username: Some("jdoe".into()),
            ..Default::default()
        });

        let profile = PatientProfile::from_record(&record, ProfileSource::Basic);
        assert_eq!(profile.email, "flat@example.org");
        assert_eq!(profile.display_name, "jdoe");
        assert!(profile.is_partial());
    }

    #[test]
    fn test_unknown_name() {
        let profile = PatientProfile::from_record(&PatientRecord::new("P1"), ProfileSource::Basic);
        assert_eq!(profile.display_name, UNKNOWN_PATIENT);
    }

    #[test]
    fn test_age_on() {
        let mut record = PatientRecord::new("P1");
        record.date_of_birth = Some("1990-06-15T00:00:00Z".into());
        let profile = PatientProfile::from_record(&record, ProfileSource::Details);

        let before_birthday = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let on_birthday = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(profile.age_on(before_birthday), Some(33));
        assert_eq!(profile.age_on(on_birthday), Some(34));
    }
}
