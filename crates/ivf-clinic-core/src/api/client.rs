//! Typed client over a [`Transport`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{ApiError, ApiRequest, ApiResult, Method, RemoteResource, ResourceKind, Transport};
use crate::models::{
    LabSample, Page, PageQuery, PatientRecord, SampleStatus, TreatmentCycle,
};

/// Page size used when a list is fetched "in full" (e.g. all samples of a cycle).
pub const FULL_LIST_PAGE_SIZE: u32 = 200;

/// Upper bound on pages followed by [`ClinicClient::list_all`].
pub const MAX_LIST_PAGES: u32 = 50;

/// Typed REST client for the clinic backend.
#[derive(Debug, Clone)]
pub struct ClinicClient<T> {
    transport: T,
}

impl<T: Transport> ClinicClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn call<R: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<R> {
        debug!(method = %request.method, path = %request.path, "api request");
        let value = self.transport.send(request).await?;
        Ok(serde_json::from_value(unwrap_data(value))?)
    }

    async fn call_unit(&self, request: ApiRequest) -> ApiResult<()> {
        debug!(method = %request.method, path = %request.path, "api request");
        self.transport.send(request).await?;
        Ok(())
    }

    // =========================================================================
    // Generic CRUD
    // =========================================================================

    /// `GET /{resource}?pageNumber=..&pageSize=..&filters..`
    pub async fn list<R: RemoteResource>(&self, query: &PageQuery) -> ApiResult<Page<R>> {
        let request = ApiRequest::get(R::KIND.collection_path()).with_query(query.to_pairs());
        debug!(path = %request.path, query = %query.cache_key(), "api list");
        let value = self.transport.send(request).await?;
        Ok(Page::from_value(value)?)
    }

    /// Every record matching `query`, following pages until the backend
    /// reports no more.
    ///
    /// A list still claiming more data after [`MAX_LIST_PAGES`] is an error
    /// rather than a silently shortened result.
    pub async fn list_all<R: RemoteResource>(&self, query: PageQuery) -> ApiResult<Vec<R>> {
        let mut query = query;
        let mut records = Vec::new();
        let mut fetched = 0;
        loop {
            let page = self.list::<R>(&query).await?;
            fetched += 1;
            let more = (page.has_next || query.page < page.total_pages) && !page.is_empty();
            records.extend(page.data);
            if !more {
                return Ok(records);
            }
            if fetched >= MAX_LIST_PAGES {
                return Err(ApiError::UnboundedList {
                    path: R::KIND.collection_path(),
                    pages: fetched,
                });
            }
            query.page += 1;
        }
    }

    /// `GET /{resource}/{id}`
    pub async fn get<R: RemoteResource>(&self, id: &str) -> ApiResult<R> {
        self.call(ApiRequest::get(R::KIND.item_path(id)?)).await
    }

    /// `POST /{resource}`
    pub async fn create<R, P>(&self, payload: &P) -> ApiResult<R>
    where
        R: RemoteResource,
        P: Serialize + Sync,
    {
        let body = serde_json::to_value(payload)?;
        self.call(ApiRequest::new(Method::Post, R::KIND.collection_path()).with_body(body))
            .await
    }

    /// `PUT /{resource}/{id}`
    pub async fn update<R, P>(&self, id: &str, patch: &P) -> ApiResult<R>
    where
        R: RemoteResource,
        P: Serialize + Sync,
    {
        let body = serde_json::to_value(patch)?;
        self.call(ApiRequest::new(Method::Put, R::KIND.item_path(id)?).with_body(body))
            .await
    }

    // =========================================================================
    // Patient
    // =========================================================================

    /// Full patient detail. Restricted roles get 403 here.
    pub async fn get_patient_details(&self, id: &str) -> ApiResult<PatientRecord> {
        let path = format!("{}/details", ResourceKind::Patient.item_path(id)?);
        self.call(ApiRequest::get(path)).await
    }

    /// Basic patient record, readable by every staff role.
    pub async fn get_patient_by_id(&self, id: &str) -> ApiResult<PatientRecord> {
        self.get::<PatientRecord>(id).await
    }

    // =========================================================================
    // Appointment transitions
    // =========================================================================

    pub async fn check_in(&self, appointment_id: &str) -> ApiResult<()> {
        self.appointment_transition(appointment_id, "check-in", None)
            .await
    }

    pub async fn check_out(&self, appointment_id: &str) -> ApiResult<()> {
        self.appointment_transition(appointment_id, "check-out", None)
            .await
    }

    pub async fn cancel_appointment(&self, appointment_id: &str, reason: &str) -> ApiResult<()> {
        self.appointment_transition(appointment_id, "cancel", Some(json!({ "reason": reason })))
            .await
    }

    pub async fn assign_doctor(&self, appointment_id: &str, doctor_id: &str) -> ApiResult<()> {
        self.appointment_transition(
            appointment_id,
            "doctor",
            Some(json!({ "doctorId": doctor_id })),
        )
        .await
    }

    async fn appointment_transition(
        &self,
        appointment_id: &str,
        transition: &str,
        body: Option<Value>,
    ) -> ApiResult<()> {
        let path = format!(
            "{}/{}",
            ResourceKind::Appointment.item_path(appointment_id)?,
            transition
        );
        let mut request = ApiRequest::new(Method::Put, path);
        request.body = body;
        self.call_unit(request).await
    }

    // =========================================================================
    // Samples
    // =========================================================================

    /// All samples linked to a cycle.
    pub async fn samples_for_cycle(&self, cycle_id: &str) -> ApiResult<Vec<LabSample>> {
        let query =
            PageQuery::new(1, FULL_LIST_PAGE_SIZE).filter("treatmentCycleId", cycle_id);
        self.list_all::<LabSample>(query).await
    }

    /// All samples of a patient, linked to a cycle or not.
    pub async fn samples_for_patient(&self, patient_id: &str) -> ApiResult<Vec<LabSample>> {
        let query = PageQuery::new(1, FULL_LIST_PAGE_SIZE).filter("patientId", patient_id);
        self.list_all::<LabSample>(query).await
    }

    pub async fn update_sample_status(
        &self,
        sample_id: &str,
        status: SampleStatus,
        note: Option<&str>,
    ) -> ApiResult<()> {
        let path = format!("{}/status", ResourceKind::Sample.item_path(sample_id)?);
        let body = json!({ "status": status, "note": note });
        self.call_unit(ApiRequest::new(Method::Put, path).with_body(body))
            .await
    }

    pub async fn update_fertilize_status(
        &self,
        sample_id: &str,
        can_fertilize: bool,
    ) -> ApiResult<()> {
        let path = format!("{}/fertilize-status", ResourceKind::Sample.item_path(sample_id)?);
        let body = json!({ "canFertilize": can_fertilize });
        self.call_unit(ApiRequest::new(Method::Put, path).with_body(body))
            .await
    }

    pub async fn update_frozen_status(&self, sample_id: &str, can_frozen: bool) -> ApiResult<()> {
        let path = format!("{}/frozen-status", ResourceKind::Sample.item_path(sample_id)?);
        let body = json!({ "canFrozen": can_frozen });
        self.call_unit(ApiRequest::new(Method::Put, path).with_body(body))
            .await
    }

    // =========================================================================
    // Treatment cycles
    // =========================================================================

    /// Cycles sharing a treatment plan.
    pub async fn cycles_for_treatment(&self, treatment_id: &str) -> ApiResult<Vec<TreatmentCycle>> {
        let query = PageQuery::new(1, FULL_LIST_PAGE_SIZE).filter("treatmentId", treatment_id);
        self.list_all::<TreatmentCycle>(query).await
    }

    /// `PUT /treatment-cycle/{id}` with a partial patch.
    pub async fn update_treatment_cycle(
        &self,
        cycle_id: &str,
        patch: &Value,
    ) -> ApiResult<TreatmentCycle> {
        self.update::<TreatmentCycle, _>(cycle_id, patch).await
    }

    /// Mark a workflow step of a cycle as completed.
    pub async fn complete_cycle_step(&self, cycle_id: &str, step_id: &str) -> ApiResult<()> {
        let path = format!("{}/steps", ResourceKind::TreatmentCycle.item_path(cycle_id)?);
        let body = json!({ "stepType": step_id, "status": "Completed" });
        self.call_unit(ApiRequest::new(Method::Put, path).with_body(body))
            .await
    }

    pub async fn complete_treatment_cycle(
        &self,
        cycle_id: &str,
        outcome: Option<&str>,
    ) -> ApiResult<()> {
        let path = format!("{}/complete", ResourceKind::TreatmentCycle.item_path(cycle_id)?);
        let body = json!({ "outcome": outcome });
        self.call_unit(ApiRequest::new(Method::Put, path).with_body(body))
            .await
    }
}

/// Some endpoints wrap a single record as `{ "data": { ... } }`.
fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if !map.contains_key("id") && map.len() <= 3 => {
            match map.remove("data") {
                Some(inner @ Value::Object(_)) => inner,
                Some(other) => {
                    map.insert("data".into(), other);
                    Value::Object(map)
                }
                None => Value::Object(map),
            }
        }
        other => other,
    }
}
