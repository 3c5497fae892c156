//! Concurrent fan-out over a selection of records.

use std::future::Future;

use futures::future::join_all;

use crate::api::{ApiError, ApiResult};
use crate::{ClinicError, ClinicResult};

/// Per-item results of a batch, in selection order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub results: Vec<(String, ApiResult<()>)>,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// True only when every item succeeded.
    pub fn succeeded(&self) -> bool {
        self.results.iter().all(|(_, r)| r.is_ok())
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_err()).count()
    }

    pub fn failed_ids(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|(_, r)| r.is_err())
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn succeeded_ids(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|(_, r)| r.is_ok())
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn first_error(&self) -> Option<&ApiError> {
        self.results.iter().find_map(|(_, r)| r.as_ref().err())
    }

    /// `Ok` when every item succeeded, otherwise an aggregate
    /// [`ClinicError::PartialBatch`].
    pub fn into_result(self) -> ClinicResult<()> {
        let Some(first_error) = self.first_error().cloned() else {
            return Ok(());
        };
        Err(ClinicError::PartialBatch {
            failed: self.failure_count(),
            total: self.total(),
            failed_ids: self.failed_ids(),
            first_error,
        })
    }
}

/// Run `op` for every id concurrently and wait for all of them.
///
/// Failures do not cancel the remaining items.
pub async fn run_batch<'a, F, Fut>(ids: &'a [String], op: F) -> BatchOutcome
where
    F: Fn(&'a str) -> Fut,
    Fut: Future<Output = ApiResult<()>>,
{
    let results = join_all(ids.iter().map(|id| op(id.as_str()))).await;
    BatchOutcome {
        results: ids.iter().cloned().zip(results).collect(),
    }
}
