use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{identity::repo_types::UserSummary, reports::repo_types::Report};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    #[serde(default)]
    pub sender_id: Uuid,
    #[serde(default)]
    pub receiver_id: Uuid,
    #[serde(default)]
    pub issue: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReportRequest {
    pub content: Option<String>,
    pub answered: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReportMessageRequest {
    #[serde(default)]
    pub content: String,
}

/// Report row with both parties' profiles joined in. Either side may be gone;
/// the report still lists.
#[derive(Debug, Serialize)]
pub struct ReportWithParties {
    #[serde(flatten)]
    pub report: Report,
    pub sender: Option<UserSummary>,
    pub receiver: Option<UserSummary>,
}
