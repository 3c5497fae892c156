//! Multi-source record reconciliation.
//!
//! Reads the same logical entity from more than one endpoint, treats 403 as
//! "try the less privileged endpoint" and 404 as "no data", and normalizes
//! the result into one view type.

mod profile;
mod views;

pub use profile::*;
pub use views::*;

use std::future::Future;

use tracing::{debug, error, warn};

use crate::api::{ApiError, ApiResult, ClinicClient, Transport};

/// Fetch from `primary`, falling back to `fallback` once on 403.
///
/// 404 from either endpoint, or 403 from the fallback, is `Ok(None)`.
/// Every other error propagates unchanged. There are no retries.
pub async fn fetch_with_fallback<T, P, PF, F, FF>(
    label: &str,
    primary: P,
    fallback: F,
) -> ApiResult<Option<T>>
where
    P: FnOnce() -> PF,
    PF: Future<Output = ApiResult<T>>,
    F: FnOnce() -> FF,
    FF: Future<Output = ApiResult<T>>,
{
    match primary().await {
        Ok(value) => Ok(Some(value)),
        Err(ApiError::NotFound(_)) => {
            debug!(label, "primary endpoint returned 404");
            Ok(None)
        }
        Err(ApiError::Forbidden(_)) => {
            warn!(label, "primary endpoint forbidden, using fallback");
            match fallback().await {
                Ok(value) => Ok(Some(value)),
                Err(e) if e.is_absent() => {
                    debug!(label, error = %e, "fallback endpoint has no data");
                    Ok(None)
                }
                Err(e) => {
                    error!(label, error = %e, "fallback endpoint failed");
                    Err(e)
                }
            }
        }
        Err(e) => {
            error!(label, error = %e, "primary endpoint failed");
            Err(e)
        }
    }
}

/// Treat 403/404 as absent data on a single-source read.
pub fn absent_as_none<T>(result: ApiResult<T>) -> ApiResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_absent() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Builds normalized views over a [`ClinicClient`].
pub struct Reconciler<'a, T> {
    client: &'a ClinicClient<T>,
}

impl<'a, T: Transport> Reconciler<'a, T> {
    pub fn new(client: &'a ClinicClient<T>) -> Self {
        Self { client }
    }

    /// Patient profile from the detail endpoint, or the basic endpoint on 403.
    pub async fn patient_profile(&self, patient_id: &str) -> ApiResult<Option<PatientProfile>> {
        let record = fetch_with_fallback(
            "patient",
            move || async move {
                let record = self.client.get_patient_details(patient_id).await?;
                Ok::<_, ApiError>((record, ProfileSource::Details))
            },
            move || async move {
                let record = self.client.get_patient_by_id(patient_id).await?;
                Ok::<_, ApiError>((record, ProfileSource::Basic))
            },
        )
        .await?;

        Ok(record.map(|(r, source)| PatientProfile::from_record(&r, source)))
    }
}
