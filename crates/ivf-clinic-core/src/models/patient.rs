//! Patient models.

use serde::{Deserialize, Serialize};

/// A patient record as returned by either patient endpoint.
///
/// Older endpoints return contact details flat on the record, newer ones nest
/// them under `accountInfo`. Both are kept here; use
/// [`PatientProfile`](crate::reconcile::PatientProfile) for display.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    /// Backend patient ID
    #[serde(alias = "patientId")]
    pub id: String,
    /// Flat full name
    #[serde(default, alias = "name")]
    pub full_name: Option<String>,
    /// Flat phone number
    #[serde(default, alias = "phoneNumber")]
    pub phone: Option<String>,
    /// Flat email
    #[serde(default)]
    pub email: Option<String>,
    /// Flat address
    #[serde(default)]
    pub address: Option<String>,
    /// Gender as sent by the backend
    #[serde(default)]
    pub gender: Option<String>,
    /// Date of birth (ISO date string)
    #[serde(default, alias = "dob")]
    pub date_of_birth: Option<String>,
    /// Nested account details (newer endpoints)
    #[serde(default)]
    pub account_info: Option<AccountInfo>,
    /// Free-text medical history
    #[serde(default)]
    pub medical_history: Option<String>,
    /// Blood type
    #[serde(default)]
    pub blood_type: Option<String>,
}

/// Account sub-object nested on newer patient payloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default, alias = "phoneNumber")]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl PatientRecord {
    /// Create a minimal record with only an ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Check whether the payload carries the nested account shape.
    pub fn has_account_info(&self) -> bool {
        self.account_info.is_some()
    }
}
