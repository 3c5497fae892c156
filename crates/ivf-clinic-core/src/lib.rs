//! IVF Clinic Core Library
//!
//! Client layer for a fertility clinic administration backend: patients,
//! appointments, treatment cycles, lab samples, prescriptions and billing.
//!
//! # Architecture
//!
//! ```text
//!   Operator / UI
//!        │
//!        ▼
//!  ┌─────────────┐   cached reads    ┌─────────────┐
//!  │   Clinic    │──────────────────▶│ QueryCache  │
//!  │  (facade)   │◀──────────────────│ (kind,scope)│
//!  └─────┬───────┘   invalidate(kind)└─────────────┘
//!        │
//!        ├── Reconciler ── 403 → fallback endpoint, 404 → no data
//!        │        │
//!        │        └── workflow (step inference, sample eligibility)
//!        │
//!        ├── Action ── validate → execute → invalidate dependents
//!        │
//!        ▼
//!  ClinicClient<T: Transport> ──▶ HTTP backend (owns all state)
//! ```
//!
//! # Core Principle
//!
//! **The backend is authoritative.** Everything here is a cached, possibly
//! stale copy. Status-based gating only decides which actions are offered.
//!
//! # Modules
//!
//! - [`models`]: Wire record types (PatientRecord, Appointment, LabSample, etc.)
//! - [`api`]: Transport seam, error taxonomy and typed client
//! - [`reconcile`]: Multi-endpoint reads normalized into one view
//! - [`workflow`]: Treatment step inference and sample eligibility
//! - [`actions`]: Named mutations with batch fan-out
//! - [`cache`]: Typed query cache with dependency-based invalidation

pub mod actions;
pub mod api;
pub mod cache;
pub mod models;
pub mod reconcile;
pub mod workflow;

// Re-export commonly used types
pub use actions::{Action, ActionReport, BatchOutcome};
pub use api::{ApiError, ApiRequest, ApiResult, ClinicClient, Method, ResourceKind, Transport};
pub use cache::{CacheError, QueryCache, QueryKey};
pub use models::{
    Appointment, AppointmentStatus, LabSample, Page, PageQuery, PatientRecord, SampleStatus,
    SampleType, TreatmentCycle, TreatmentType,
};
pub use reconcile::{AppointmentView, CycleOverview, PatientProfile, Reconciler, ScreenSamples};
pub use workflow::{SampleScreen, StepSignal, WorkflowProgress, WorkflowStep};

use std::time::Duration;

use tracing::{error, info, warn};

use api::{RemoteResource, GENERIC_ERROR_MESSAGE};

// =========================================================================
// Error Type
// =========================================================================

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{failed} of {total} updates failed: {first_error}")]
    PartialBatch {
        failed: usize,
        total: usize,
        failed_ids: Vec<String>,
        first_error: ApiError,
    },

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

pub type ClinicResult<T> = Result<T, ClinicError>;

impl ClinicError {
    /// Text for an error notification.
    pub fn user_message(&self) -> String {
        match self {
            ClinicError::Validation(message) => message.clone(),
            ClinicError::Api(e) => e.user_message(),
            ClinicError::PartialBatch {
                failed,
                total,
                first_error,
                ..
            } => {
                if failed >= total {
                    first_error.user_message()
                } else {
                    format!(
                        "{} of {} updates failed: {}. Completed updates were kept.",
                        failed,
                        total,
                        first_error.user_message()
                    )
                }
            }
            ClinicError::Cache(_) => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// A batch where some items failed and at least one was committed.
    pub fn is_partial(&self) -> bool {
        matches!(self, ClinicError::PartialBatch { failed, total, .. } if failed < total)
    }
}

// =========================================================================
// Facade
// =========================================================================

/// Client, reconciler and cache behind one handle.
pub struct Clinic<T> {
    client: ClinicClient<T>,
    cache: QueryCache,
}

impl<T: Transport> Clinic<T> {
    pub fn new(transport: T, stale_after: Duration) -> Self {
        Self {
            client: ClinicClient::new(transport),
            cache: QueryCache::new(stale_after),
        }
    }

    pub fn client(&self) -> &ClinicClient<T> {
        &self.client
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    fn reconciler(&self) -> Reconciler<'_, T> {
        Reconciler::new(&self.client)
    }

    // =========================================================================
    // Cached Reads
    // =========================================================================

    /// One record by ID.
    pub async fn get<R: RemoteResource>(&self, id: &str) -> ClinicResult<R> {
        self.cache
            .get_or_fetch(QueryKey::item(R::KIND, id), move || async move {
                Ok(self.client.get::<R>(id).await?)
            })
            .await
    }

    /// One page of a resource list.
    pub async fn list<R: RemoteResource>(&self, query: &PageQuery) -> ClinicResult<Page<R>> {
        self.cache
            .get_or_fetch(QueryKey::list(R::KIND, query), move || async move {
                Ok(self.client.list::<R>(query).await?)
            })
            .await
    }

    pub async fn list_appointments(&self, query: &PageQuery) -> ClinicResult<Page<Appointment>> {
        self.list::<Appointment>(query).await
    }

    pub async fn patient_profile(&self, patient_id: &str) -> ClinicResult<Option<PatientProfile>> {
        let key = QueryKey::view(ResourceKind::Patient, "profile", patient_id);
        self.cache
            .get_or_fetch(key, move || async move {
                Ok(self.reconciler().patient_profile(patient_id).await?)
            })
            .await
    }

    pub async fn appointment_view(
        &self,
        appointment_id: &str,
    ) -> ClinicResult<Option<AppointmentView>> {
        let key = QueryKey::view(ResourceKind::Appointment, "view", appointment_id);
        self.cache
            .get_or_fetch(key, move || async move {
                Ok(self.reconciler().appointment_view(appointment_id).await?)
            })
            .await
    }

    pub async fn cycle_overview(&self, cycle_id: &str) -> ClinicResult<Option<CycleOverview>> {
        let key = QueryKey::view(ResourceKind::TreatmentCycle, "overview", cycle_id);
        self.cache
            .get_or_fetch(key, move || async move {
                Ok(self.reconciler().cycle_overview(cycle_id).await?)
            })
            .await
    }

    /// Samples for a lab screen. Keyed under the cycle so that both sample
    /// and cycle mutations drop it.
    pub async fn screen_samples(
        &self,
        cycle_id: &str,
        screen: SampleScreen,
    ) -> ClinicResult<Option<ScreenSamples>> {
        let name = format!("screen:{:?}", screen);
        let key = QueryKey::view(ResourceKind::TreatmentCycle, name, cycle_id);
        self.cache
            .get_or_fetch(key, move || async move {
                Ok(self.reconciler().screen_samples(cycle_id, screen).await?)
            })
            .await
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Validate, execute and invalidate.
    ///
    /// A partially failed batch still invalidates, since the items that
    /// succeeded were committed.
    pub async fn perform(&self, action: &Action) -> ClinicResult<ActionReport> {
        action.validate()?;

        let affected = action.affected_resources();
        match action.execute(&self.client).await {
            Ok(()) => {
                let invalidated = self.cache.invalidate(affected)?;
                let message = action.success_message();
                info!(action = action.name(), invalidated = ?invalidated, "{}", message);
                Ok(ActionReport {
                    action: action.name(),
                    affected: affected.to_vec(),
                    invalidated,
                    message,
                })
            }
            Err(e) if e.is_partial() => {
                if let Err(cache_error) = self.cache.invalidate(affected) {
                    error!(action = action.name(), error = %cache_error, "cache invalidation failed");
                }
                warn!(action = action.name(), error = %e, "action partially applied");
                Err(e)
            }
            Err(e) => {
                error!(action = action.name(), error = %e, "action failed");
                Err(e)
            }
        }
    }
}
