//! Staff, user and relationship records.

use serde::{Deserialize, Serialize};

/// Doctor as embedded in appointments or returned by the doctor endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSummary {
    #[serde(alias = "doctorId")]
    pub id: String,
    #[serde(default, alias = "name", alias = "doctorName")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "phoneNumber")]
    pub phone: Option<String>,
}

impl DoctorSummary {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Role of a user account.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UserRole {
    Admin,
    Manager,
    Doctor,
    Receptionist,
    LabTechnician,
    Patient,
    #[default]
    #[serde(other)]
    Unknown,
}

/// A login account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(alias = "userId")]
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "phoneNumber")]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Link between two patients (e.g. partners sharing a treatment).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    #[serde(alias = "relationshipId")]
    pub id: String,
    pub patient_id: String,
    #[serde(alias = "partnerId")]
    pub related_patient_id: String,
    #[serde(default, alias = "type")]
    pub relationship_type: Option<String>,
}

impl Relationship {
    /// The patient on the other side of the link, relative to `patient_id`.
    pub fn counterpart(&self, patient_id: &str) -> Option<&str> {
        if self.patient_id == patient_id {
            Some(&self.related_patient_id)
        } else if self.related_patient_id == patient_id {
            Some(&self.patient_id)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doctor_name_aliases() {
        let doctor: DoctorSummary =
            serde_json::from_str(r#"{"doctorId":"D1","doctorName":"Dr. Tran"}"#).unwrap();
        assert_eq!(doctor.id, "D1");
        assert_eq!(doctor.full_name.as_deref(), Some("Dr. Tran"));
    }

    #[test]
    fn test_unknown_role() {
        let user: UserRecord = serde_json::from_str(r#"{"id":"U1","role":"Auditor"}"#).unwrap();
        assert_eq!(user.role, UserRole::Unknown);
    }

    #[test]
    fn test_relationship_counterpart() {
        let rel = Relationship {
            id: "R1".into(),
            patient_id: "P1".into(),
            related_patient_id: "P2".into(),
            relationship_type: Some("Spouse".into()),
        };
        assert_eq!(rel.counterpart("P1"), Some("P2"));
        assert_eq!(rel.counterpart("P2"), Some("P1"));
        assert_eq!(rel.counterpart("P3"), None);
    }
}
