//! Incident reporting and investigation lifecycle: the five-state
//! workflow, the gated investigation sub-workflow, assignment, the audit
//! timeline, and reporting aggregates.

pub mod assignment;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod investigation;
pub mod repository;
pub mod service;
pub mod stats;
pub mod store;
pub mod timeline;
pub mod types;
pub mod workflow;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::shared::state::AppState;

pub fn configure_incidents_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/incidents",
            get(handlers::list_incidents).post(handlers::create_incident),
        )
        .route("/api/incidents/stats", get(handlers::get_stats))
        .route(
            "/api/incidents/follow-up",
            get(handlers::get_requiring_follow_up),
        )
        .route("/api/incidents/trends", get(handlers::get_trends))
        .route(
            "/api/incidents/high-severity",
            get(handlers::get_high_severity_open),
        )
        .route("/api/incidents/export", get(handlers::export_incidents))
        .route(
            "/api/incidents/number/{incident_number}",
            get(handlers::get_incident_by_number),
        )
        .route(
            "/api/incidents/{id}",
            get(handlers::get_incident).put(handlers::update_incident),
        )
        .route("/api/incidents/{id}/timeline", get(handlers::get_timeline))
        .route("/api/incidents/{id}/assign", put(handlers::assign_investigator))
        .route(
            "/api/incidents/{id}/investigation/start",
            put(handlers::start_investigation),
        )
        .route(
            "/api/incidents/{id}/corrective-action",
            put(handlers::begin_corrective_action),
        )
        .route("/api/incidents/{id}/resolve", put(handlers::mark_resolved))
        .route("/api/incidents/{id}/close", put(handlers::close_incident))
        .route(
            "/api/incidents/{id}/status/override",
            put(handlers::override_status),
        )
        .route(
            "/api/incidents/{id}/reclassify",
            put(handlers::reclassify_incident),
        )
        .route(
            "/api/incidents/{id}/investigation/checklist/{item_id}",
            put(handlers::toggle_checklist_item),
        )
        .route(
            "/api/incidents/{id}/investigation/root-cause",
            put(handlers::set_root_cause),
        )
        .route(
            "/api/incidents/{id}/investigation/notes",
            put(handlers::update_investigation_notes),
        )
        .route(
            "/api/incidents/{id}/investigation/actions",
            post(handlers::add_action),
        )
        .route(
            "/api/incidents/{id}/investigation/actions/{kind}/{action_id}",
            put(handlers::update_action_status),
        )
        .route(
            "/api/incidents/{id}/investigation/evidence",
            post(handlers::attach_evidence),
        )
        .route(
            "/api/incidents/{id}/investigation/sign-off",
            put(handlers::sign_off_investigation),
        )
}
