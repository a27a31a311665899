//! HTTP surface for the incident lifecycle engine. Handlers resolve the
//! caller, translate boundary input into domain types, and delegate; all
//! behavior lives in the service and below.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use super::error::IncidentError;
use super::types::{
    ActionKind, AddActionRequest, AssignInvestigatorRequest, AttachEvidenceRequest,
    CloseIncidentRequest,
    CreateIncidentRequest, Incident, IncidentFilter, IncidentListResponse, IncidentStats,
    IncidentStatus, IncidentSummary, IncidentType, InvestigationNotesRequest, ListIncidentsQuery,
    OverrideStatusRequest, ReclassifyRequest, ResolveIncidentRequest, RootCauseRequest, Severity,
    SignOffRequest, TimelineEvent, TransitionRequest, TrendAnalysis, TrendAnalysisQuery,
    UpdateActionStatusRequest, UpdateIncidentRequest,
};
use crate::directory::Principal;
use crate::export::{self, ExportFormat};
use crate::shared::state::AppState;

const USER_HEADER: &str = "x-user-id";

fn caller(state: &AppState, headers: &HeaderMap) -> Result<Principal, IncidentError> {
    let user_id = headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            IncidentError::Authorization(format!("missing {USER_HEADER} header"))
        })?;
    state
        .incidents
        .directory()
        .resolve(user_id)
        .ok_or_else(|| IncidentError::Authorization(format!("unknown user {user_id}")))
}

fn parse_set<T: FromStr<Err = String>>(raw: &str) -> Result<Vec<T>, IncidentError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().map_err(IncidentError::Validation))
        .collect()
}

/// Rejects anything outside the declared enums before it reaches the
/// domain layer.
fn build_filter(query: ListIncidentsQuery) -> Result<IncidentFilter, IncidentError> {
    let mut filter = IncidentFilter {
        assigned_to: query.assigned_to,
        reported_by: query.reported_by,
        incident_date_from: query.incident_date_from,
        incident_date_to: query.incident_date_to,
        location: query.location,
        ..Default::default()
    };
    if let Some(raw) = query.severity {
        filter.severities = parse_set::<Severity>(&raw)?;
    }
    if let Some(raw) = query.status {
        filter.statuses = parse_set::<IncidentStatus>(&raw)?;
    }
    if let Some(raw) = query.incident_type {
        filter.incident_type = Some(
            raw.parse::<IncidentType>()
                .map_err(IncidentError::Validation)?,
        );
    }
    Ok(filter)
}

pub async fn create_incident(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreateIncidentRequest>,
) -> Result<(StatusCode, Json<Incident>), IncidentError> {
    let actor = caller(&state, &headers)?;
    let incident = state.incidents.create_incident(&actor, request)?;
    Ok((StatusCode::CREATED, Json(incident)))
}

pub async fn list_incidents(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListIncidentsQuery>,
) -> Result<Json<IncidentListResponse>, IncidentError> {
    let actor = caller(&state, &headers)?;
    let filter = build_filter(query)?;
    let incidents = state.incidents.list_incidents(&actor, &filter)?;
    let summaries: Vec<IncidentSummary> =
        incidents.iter().map(IncidentSummary::from_incident).collect();
    Ok(Json(IncidentListResponse {
        count: summaries.len(),
        incidents: summaries,
    }))
}

pub async fn get_incident(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Incident>, IncidentError> {
    let actor = caller(&state, &headers)?;
    Ok(Json(state.incidents.get_incident(&actor, id)?))
}

pub async fn get_incident_by_number(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(incident_number): Path<String>,
) -> Result<Json<Incident>, IncidentError> {
    let actor = caller(&state, &headers)?;
    Ok(Json(state.incidents.get_by_number(&actor, &incident_number)?))
}

pub async fn get_timeline(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TimelineEvent>>, IncidentError> {
    let actor = caller(&state, &headers)?;
    Ok(Json(state.incidents.get_timeline(&actor, id)?))
}

pub async fn update_incident(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateIncidentRequest>,
) -> Result<Json<Incident>, IncidentError> {
    let actor = caller(&state, &headers)?;
    Ok(Json(state.incidents.update_incident(&actor, id, request)?))
}

pub async fn assign_investigator(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignInvestigatorRequest>,
) -> Result<Json<Incident>, IncidentError> {
    let actor = caller(&state, &headers)?;
    Ok(Json(state.incidents.assign_investigator(
        &actor,
        id,
        &request.investigator,
        request.expected_version,
    )?))
}

pub async fn start_investigation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Incident>, IncidentError> {
    let actor = caller(&state, &headers)?;
    Ok(Json(state.incidents.start_investigation(
        &actor,
        id,
        request.expected_version,
    )?))
}

pub async fn begin_corrective_action(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Incident>, IncidentError> {
    let actor = caller(&state, &headers)?;
    Ok(Json(state.incidents.begin_corrective_action(
        &actor,
        id,
        request.expected_version,
    )?))
}

pub async fn mark_resolved(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<ResolveIncidentRequest>,
) -> Result<Json<Incident>, IncidentError> {
    let actor = caller(&state, &headers)?;
    Ok(Json(state.incidents.mark_resolved(
        &actor,
        id,
        request.resolution_notes,
        request.expected_version,
    )?))
}

pub async fn close_incident(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<CloseIncidentRequest>,
) -> Result<Json<Incident>, IncidentError> {
    let actor = caller(&state, &headers)?;
    Ok(Json(state.incidents.close_incident(
        &actor,
        id,
        request.closure_notes,
        request.expected_version,
    )?))
}

pub async fn override_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<OverrideStatusRequest>,
) -> Result<Json<Incident>, IncidentError> {
    let actor = caller(&state, &headers)?;
    Ok(Json(state.incidents.override_status(
        &actor,
        id,
        request.status,
        request.justification,
        request.expected_version,
    )?))
}

pub async fn reclassify_incident(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<ReclassifyRequest>,
) -> Result<Json<Incident>, IncidentError> {
    let actor = caller(&state, &headers)?;
    Ok(Json(state.incidents.reclassify(&actor, id, request)?))
}

pub async fn toggle_checklist_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, item_id)): Path<(Uuid, u32)>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Incident>, IncidentError> {
    let actor = caller(&state, &headers)?;
    Ok(Json(state.incidents.toggle_checklist_item(
        &actor,
        id,
        item_id,
        request.expected_version,
    )?))
}

pub async fn set_root_cause(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<RootCauseRequest>,
) -> Result<Json<Incident>, IncidentError> {
    let actor = caller(&state, &headers)?;
    Ok(Json(state.incidents.set_root_cause(
        &actor,
        id,
        request.root_cause,
        request.expected_version,
    )?))
}

pub async fn update_investigation_notes(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<InvestigationNotesRequest>,
) -> Result<Json<Incident>, IncidentError> {
    let actor = caller(&state, &headers)?;
    Ok(Json(state.incidents.update_investigation_notes(
        &actor,
        id,
        request.notes,
        request.expected_version,
    )?))
}

pub async fn add_action(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<AddActionRequest>,
) -> Result<Json<Incident>, IncidentError> {
    let actor = caller(&state, &headers)?;
    Ok(Json(state.incidents.add_action(&actor, id, request)?))
}

pub async fn update_action_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, kind, action_id)): Path<(Uuid, String, Uuid)>,
    Json(request): Json<UpdateActionStatusRequest>,
) -> Result<Json<Incident>, IncidentError> {
    let actor = caller(&state, &headers)?;
    let kind = kind
        .parse::<ActionKind>()
        .map_err(IncidentError::Validation)?;
    Ok(Json(state.incidents.update_action_status(
        &actor, id, kind, action_id, request,
    )?))
}

pub async fn attach_evidence(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<AttachEvidenceRequest>,
) -> Result<Json<Incident>, IncidentError> {
    let actor = caller(&state, &headers)?;
    Ok(Json(state.incidents.attach_evidence(
        &actor,
        id,
        request.reference,
        request.expected_version,
    )?))
}

pub async fn sign_off_investigation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<SignOffRequest>,
) -> Result<Json<Incident>, IncidentError> {
    let actor = caller(&state, &headers)?;
    Ok(Json(state.incidents.sign_off_investigation(
        &actor,
        id,
        request.expected_version,
    )?))
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListIncidentsQuery>,
) -> Result<Json<IncidentStats>, IncidentError> {
    caller(&state, &headers)?;
    let filter = build_filter(query)?;
    Ok(Json(state.incidents.get_stats(&filter)?))
}

pub async fn get_requiring_follow_up(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<IncidentSummary>>, IncidentError> {
    caller(&state, &headers)?;
    Ok(Json(state.incidents.requiring_follow_up()?))
}

pub async fn get_trends(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<TrendAnalysisQuery>,
) -> Result<Json<TrendAnalysis>, IncidentError> {
    caller(&state, &headers)?;
    Ok(Json(state.incidents.trend_analysis(&query)?))
}

pub async fn get_high_severity_open(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<IncidentSummary>>, IncidentError> {
    caller(&state, &headers)?;
    Ok(Json(state.incidents.high_severity_open()?))
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

pub async fn export_incidents(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ExportQuery>,
) -> Result<Response, IncidentError> {
    let actor = caller(&state, &headers)?;
    if !actor.is_admin() {
        return Err(IncidentError::Authorization(
            "exports are restricted to administrators".to_string(),
        ));
    }
    let format = match query.format.as_deref() {
        None => ExportFormat::Csv,
        Some(raw) => ExportFormat::from_str(raw)
            .ok_or_else(|| IncidentError::Validation(format!("unknown export format: {raw}")))?,
    };
    let incidents = state
        .incidents
        .list_incidents(&actor, &IncidentFilter::default())?;
    let body = export::export_incidents(&incidents, format)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, format.content_type())],
        body,
    )
        .into_response())
}
