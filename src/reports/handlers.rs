use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::EngineError,
    identity::{
        extractors::{AdminUser, AuthUser},
        repo_types::{User, UserSummary},
    },
    reports::{
        dto::{
            CreateReportMessageRequest, CreateReportRequest, ReportWithParties,
            UpdateReportRequest,
        },
        repo_types::{Report, ReportMessage},
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports", get(list_reports).post(create_report))
        .route("/reports/:id", get(get_report).put(update_report))
        .route("/reports/:id/answer", patch(answer_report))
        .route(
            "/reports/:id/messages",
            get(list_report_messages).post(create_report_message),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_report(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<CreateReportRequest>,
) -> Result<Json<Report>, EngineError> {
    if payload.sender_id.is_nil() || payload.receiver_id.is_nil() {
        return Err(EngineError::Validation(
            "senderId and receiverId are required".into(),
        ));
    }
    let issue = payload.issue.trim();
    let content = payload.content.trim();
    if issue.is_empty() || content.is_empty() {
        return Err(EngineError::Validation(
            "issue and content must not be empty".into(),
        ));
    }

    let (sender_exists, receiver_exists) = tokio::try_join!(
        User::exists(&state.db, payload.sender_id),
        User::exists(&state.db, payload.receiver_id),
    )?;
    if !sender_exists || !receiver_exists {
        return Err(EngineError::NotFound("user not found".into()));
    }

    let report =
        Report::create(&state.db, payload.sender_id, payload.receiver_id, issue, content).await?;
    info!(report_id = %report.id, sender_id = %report.sender_id, "report filed");
    Ok(Json(report))
}

/// Reports where the caller is either party, with both profiles joined.
#[instrument(skip(state))]
pub async fn list_reports(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
) -> Result<Json<Vec<ReportWithParties>>, EngineError> {
    let reports = Report::list_touching(&state.db, user_id).await?;

    let mut ids: Vec<Uuid> = Vec::with_capacity(reports.len() * 2);
    for r in &reports {
        ids.push(r.sender_id);
        ids.push(r.receiver_id);
    }
    let profiles: HashMap<Uuid, UserSummary> = User::find_summaries(&state.db, &ids)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    let items = reports
        .into_iter()
        .map(|report| ReportWithParties {
            sender: profiles.get(&report.sender_id).cloned(),
            receiver: profiles.get(&report.receiver_id).cloned(),
            report,
        })
        .collect();
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn get_report(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Report>, EngineError> {
    let report = Report::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| EngineError::NotFound("report not found".into()))?;
    Ok(Json(report))
}

#[instrument(skip(state, payload))]
pub async fn update_report(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReportRequest>,
) -> Result<Json<Report>, EngineError> {
    let report = Report::update(
        &state.db,
        id,
        payload.content.as_deref(),
        payload.answered,
    )
    .await?
    .ok_or_else(|| EngineError::NotFound("report not found".into()))?;
    Ok(Json(report))
}

/// Moderator action; requires the ADMIN role.
#[instrument(skip(state))]
pub async fn answer_report(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Report>, EngineError> {
    let report = Report::mark_answered(&state.db, id)
        .await?
        .ok_or_else(|| EngineError::NotFound("report not found".into()))?;
    info!(report_id = %id, admin_id = %admin_id, "report answered");
    Ok(Json(report))
}

#[instrument(skip(state, payload))]
pub async fn create_report_message(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateReportMessageRequest>,
) -> Result<Json<ReportMessage>, EngineError> {
    let content = payload.content.trim();
    if content.is_empty() {
        return Err(EngineError::Validation("content must not be empty".into()));
    }
    if !Report::exists(&state.db, id).await? {
        return Err(EngineError::NotFound("report not found".into()));
    }

    let message = ReportMessage::insert(&state.db, id, user_id, content).await?;
    Ok(Json(message))
}

#[instrument(skip(state))]
pub async fn list_report_messages(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ReportMessage>>, EngineError> {
    if !Report::exists(&state.db, id).await? {
        return Err(EngineError::NotFound("report not found".into()));
    }
    let thread = ReportMessage::list_for(&state.db, id).await?;
    Ok(Json(thread))
}
