use athena_config::get_var_or;

/// Where a sync job reads from and what it is called in the watermark store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncJobConfig {
    pub job_name: String,
    pub container: String,
}

impl SyncJobConfig {
    pub fn news_from_env() -> Self {
        Self {
            job_name: get_var_or("NEWS_SYNC_JOB", "NewsSyncJob"),
            container: get_var_or("NEWS_CONTAINER", "athena-news"),
        }
    }

    pub fn events_from_env() -> Self {
        Self {
            job_name: get_var_or("EVENTS_SYNC_JOB", "EventsSyncJob"),
            container: get_var_or("EVENTS_CONTAINER", "athena-events"),
        }
    }
}
