//! Ordering and billing records: service requests, prescriptions, transactions.

use serde::{Deserialize, Serialize};

/// Service request status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ServiceRequestStatus {
    #[default]
    Pending,
    Approved,
    InProgress,
    Completed,
    Rejected,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// A request for a clinic service (consultation, IUI, IVF package, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    #[serde(alias = "serviceRequestId")]
    pub id: String,
    pub patient_id: String,
    #[serde(default)]
    pub appointment_id: Option<String>,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub status: ServiceRequestStatus,
    #[serde(default)]
    pub note: Option<String>,
}

/// Prescription status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PrescriptionStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// One medication line on a prescription.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionItem {
    #[serde(alias = "drugName")]
    pub medication_name: String,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// A prescription issued during an appointment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    #[serde(alias = "prescriptionId")]
    pub id: String,
    pub patient_id: String,
    #[serde(default)]
    pub appointment_id: Option<String>,
    #[serde(default)]
    pub doctor_id: Option<String>,
    #[serde(default, alias = "prescriptionItems")]
    pub items: Vec<PrescriptionItem>,
    #[serde(default)]
    pub status: PrescriptionStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Payment status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// A billing transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(alias = "transactionId")]
    pub id: String,
    pub patient_id: String,
    #[serde(default)]
    pub appointment_id: Option<String>,
    #[serde(default)]
    pub service_request_id: Option<String>,
    /// Amount in minor currency units
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub status: TransactionStatus,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Transaction {
    pub fn is_settled(&self) -> bool {
        matches!(self.status, TransactionStatus::Paid | TransactionStatus::Refunded)
    }
}

/// Sum of paid amounts, net of refunds.
pub fn net_paid(transactions: &[Transaction]) -> i64 {
    transactions
        .iter()
        .map(|t| match t.status {
            TransactionStatus::Paid => t.amount,
            TransactionStatus::Refunded => -t.amount,
            _ => 0,
        })
        .sum()
}
