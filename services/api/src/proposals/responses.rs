use athena_db::content::models::ResearchProposal;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ProposalResponse {
    pub data: ResearchProposal,
}

#[derive(Debug, Serialize)]
pub struct ProposalListResponse {
    pub data: Vec<ResearchProposal>,
    pub count: usize,
}
