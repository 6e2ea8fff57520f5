//! Typed wrapper around a grouped listing of runs.

use std::fmt::Write as _;

use chrono::NaiveDate;

use runtrack_types::GroupBy;

use crate::error::ApiError;
use crate::executor::ApiClient;
use crate::run::RunModel;
use crate::RUNS_ENDPOINT;

/// A grouped query over the runs collection.
#[derive(Debug, Clone)]
pub struct RunsModel {
    client: ApiClient,
    runs: Vec<RunModel>,
}

impl RunsModel {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            runs: Vec::new(),
        }
    }

    #[must_use]
    pub fn runs(&self) -> &[RunModel] {
        &self.runs
    }

    /// Fetch the runs matching a grouping and optional date range,
    /// replacing whatever the model held before.
    ///
    /// Rows arrive in the envelope `{"data": [...]}` and are materialized
    /// in server order, one [`RunModel`] per element. A response of any
    /// other shape is treated as no rows, not an error; executor failures
    /// propagate untouched.
    pub async fn get_runs(
        &mut self,
        group_by: GroupBy,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<(), ApiError> {
        self.runs.clear();

        let mut endpoint = format!("{RUNS_ENDPOINT}?group_by={group_by}");
        if let Some(start) = start_date {
            let _ = write!(endpoint, "&start_date={}", start.format("%Y-%m-%d"));
        }
        if let Some(end) = end_date {
            let _ = write!(endpoint, "&end_date={}", end.format("%Y-%m-%d"));
        }

        let payload = self.client.get(&endpoint).await?;

        let Some(rows) = payload.rows() else {
            tracing::debug!(status = %payload.status, "list response had no rows envelope");
            return Ok(());
        };

        for row in rows {
            self.runs.push(RunModel::hydrated(self.client.clone(), row));
        }

        Ok(())
    }
}
