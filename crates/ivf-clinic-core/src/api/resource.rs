//! Resource kinds and their REST paths.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResult};

use crate::models::{
    Appointment, DoctorSummary, LabSample, PatientRecord, Prescription, Relationship,
    ServiceRequest, TreatmentCycle, Transaction, UserRecord,
};

/// Bytes kept verbatim in a path segment: the RFC 3986 unreserved set.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a record id as exactly one path segment.
///
/// Blank ids and dot segments (`.`, `..`) are rejected; URL parsers collapse
/// them even when encoded.
pub fn encode_segment(id: &str) -> ApiResult<String> {
    if id.trim().is_empty() || id.chars().all(|c| c == '.') {
        return Err(ApiError::InvalidId(id.to_string()));
    }
    Ok(utf8_percent_encode(id, PATH_SEGMENT).to_string())
}

/// A group of backend endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Patient,
    Appointment,
    TreatmentCycle,
    Sample,
    Prescription,
    ServiceRequest,
    Transaction,
    Doctor,
    User,
    Relationship,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::Patient,
        ResourceKind::Appointment,
        ResourceKind::TreatmentCycle,
        ResourceKind::Sample,
        ResourceKind::Prescription,
        ResourceKind::ServiceRequest,
        ResourceKind::Transaction,
        ResourceKind::Doctor,
        ResourceKind::User,
        ResourceKind::Relationship,
    ];

    /// Path segment under the API base.
    pub fn segment(&self) -> &'static str {
        match self {
            ResourceKind::Patient => "patient",
            ResourceKind::Appointment => "appointment",
            ResourceKind::TreatmentCycle => "treatment-cycle",
            ResourceKind::Sample => "sample",
            ResourceKind::Prescription => "prescription",
            ResourceKind::ServiceRequest => "service-request",
            ResourceKind::Transaction => "transaction",
            ResourceKind::Doctor => "doctor",
            ResourceKind::User => "user",
            ResourceKind::Relationship => "relationship",
        }
    }

    /// `/segment`
    pub fn collection_path(&self) -> String {
        format!("/{}", self.segment())
    }

    /// `/segment/{id}` with `id` encoded as a single segment.
    pub fn item_path(&self, id: &str) -> ApiResult<String> {
        Ok(format!("/{}/{}", self.segment(), encode_segment(id)?))
    }

    /// Kinds whose cached views embed data of this kind.
    ///
    /// A mutation of `self` must invalidate every kind listed here as well
    /// as `self`. The cache follows these edges transitively.
    pub fn dependents(&self) -> &'static [ResourceKind] {
        use ResourceKind::*;
        match self {
            // appointment and cycle views show the patient's name
            Patient => &[Appointment, TreatmentCycle],
            Appointment => &[ServiceRequest],
            TreatmentCycle => &[Appointment],
            // cycle overviews list their samples
            Sample => &[TreatmentCycle],
            Prescription => &[Transaction],
            ServiceRequest => &[Transaction, Appointment],
            Transaction => &[],
            Doctor => &[Appointment],
            User => &[Patient, Doctor],
            Relationship => &[Patient],
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.segment())
    }
}

/// A record type served by a [`ResourceKind`]'s CRUD endpoints.
pub trait RemoteResource: DeserializeOwned + Serialize + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn id(&self) -> &str;
}

macro_rules! remote_resource {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl RemoteResource for $ty {
                const KIND: ResourceKind = ResourceKind::$kind;

                fn id(&self) -> &str {
                    &self.id
                }
            }
        )*
    };
}

remote_resource! {
    PatientRecord => Patient,
    Appointment => Appointment,
    TreatmentCycle => TreatmentCycle,
    LabSample => Sample,
    Prescription => Prescription,
    ServiceRequest => ServiceRequest,
    Transaction => Transaction,
    DoctorSummary => Doctor,
    UserRecord => User,
    Relationship => Relationship,
}
