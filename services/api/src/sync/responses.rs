use athena_db::audit::models::SyncJobStatusRecord;
use athena_db::sync::models::SyncJobRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct SyncJobResponse {
    pub data: SyncJobRecord,
}

#[derive(Debug, Serialize)]
pub struct SyncRunsResponse {
    pub data: Vec<SyncJobStatusRecord>,
    pub count: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct RunsQuery {
    pub limit: Option<usize>,
}
