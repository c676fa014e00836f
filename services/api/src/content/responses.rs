use athena_db::content::models::{NewsArticle, ResearchEvent};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct NewsListResponse {
    pub data: Vec<NewsArticle>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub data: NewsArticle,
}

#[derive(Debug, Serialize)]
pub struct EventListResponse {
    pub data: Vec<ResearchEvent>,
    pub count: usize,
}
