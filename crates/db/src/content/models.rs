use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::table::TableEntity;

/// A news article as published in the `athena-news` blob snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub news_id: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    pub url: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewsArticle {
    pub const PARTITION: &'static str = "News";
}

impl TableEntity for NewsArticle {
    const TABLE: &'static str = "news";

    fn partition_key(&self) -> String {
        Self::PARTITION.to_string()
    }

    fn row_key(&self) -> String {
        self.news_id.clone()
    }
}

/// A research event from the `athena-events` blob snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchEvent {
    pub event_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub registration_url: Option<String>,
}

impl ResearchEvent {
    pub const PARTITION: &'static str = "Event";
}

impl TableEntity for ResearchEvent {
    const TABLE: &'static str = "events";

    fn partition_key(&self) -> String {
        Self::PARTITION.to_string()
    }

    fn row_key(&self) -> String {
        self.event_id.clone()
    }
}

/// A research proposal submitted by a team member through the tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchProposal {
    pub id: Uuid,
    /// Human-facing identifier. Unique by convention only.
    pub proposal_number: String,
    pub team_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_by_object_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResearchProposal {
    pub const PARTITION: &'static str = "ResearchProposal";
}

impl TableEntity for ResearchProposal {
    const TABLE: &'static str = "research_proposals";

    fn partition_key(&self) -> String {
        Self::PARTITION.to_string()
    }

    fn row_key(&self) -> String {
        self.id.to_string()
    }
}
