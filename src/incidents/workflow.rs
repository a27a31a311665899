//! The incident status state machine. Legal transitions are exactly the
//! consecutive forward edges of the five-state chain; anything else fails
//! with a transition error naming the attempted operation and the current
//! state. Administrative corrections bypass the chain only through
//! [`override_status`], which is separately audited.

use chrono::{DateTime, Utc};

use super::error::IncidentError;
use super::timeline::{self, AuditEntry};
use super::types::{Incident, IncidentStatus, IncidentType, Investigation, Severity};
use crate::directory::Principal;

/// Verifies the incident sits in the required source state for an operation.
fn require_status(
    incident: &Incident,
    required: IncidentStatus,
    attempted: &str,
) -> Result<(), IncidentError> {
    if incident.status == required {
        Ok(())
    } else {
        Err(IncidentError::InvalidTransition {
            attempted: attempted.to_string(),
            current: incident.status,
        })
    }
}

/// Closed incidents are logically immutable aside from reads.
pub fn require_open(incident: &Incident, attempted: &str) -> Result<(), IncidentError> {
    if incident.status.is_closed() {
        Err(IncidentError::InvalidTransition {
            attempted: attempted.to_string(),
            current: incident.status,
        })
    } else {
        Ok(())
    }
}

pub fn start_investigation(
    incident: &mut Incident,
    actor: &Principal,
    now: DateTime<Utc>,
) -> Result<AuditEntry, IncidentError> {
    require_status(incident, IncidentStatus::Reported, "start investigation")?;
    if incident.investigation.is_none() {
        incident.investigation = Some(Investigation::new(
            incident.id,
            incident.assigned_to.clone(),
            now,
        ));
    }
    incident.status = IncidentStatus::UnderInvestigation;
    Ok(AuditEntry::new(
        timeline::INVESTIGATION_STARTED,
        &actor.user_id,
    ))
}

pub fn begin_corrective_action(
    incident: &mut Incident,
    actor: &Principal,
) -> Result<AuditEntry, IncidentError> {
    require_status(
        incident,
        IncidentStatus::UnderInvestigation,
        "begin corrective action",
    )?;
    let root_cause_set = incident
        .investigation
        .as_ref()
        .and_then(|inv| inv.root_cause.as_deref())
        .is_some_and(|cause| !cause.trim().is_empty());
    if !root_cause_set {
        return Err(IncidentError::GateNotMet(
            "corrective action requires an identified root cause".to_string(),
        ));
    }
    incident.status = IncidentStatus::CorrectiveAction;
    Ok(AuditEntry::new(
        timeline::CORRECTIVE_ACTION_STARTED,
        &actor.user_id,
    ))
}

pub fn mark_resolved(
    incident: &mut Incident,
    resolution_notes: Option<&str>,
    actor: &Principal,
) -> Result<AuditEntry, IncidentError> {
    require_status(incident, IncidentStatus::CorrectiveAction, "mark resolved")?;
    incident.status = IncidentStatus::Resolved;
    let entry = AuditEntry::new(timeline::INCIDENT_RESOLVED, &actor.user_id);
    match resolution_notes.map(str::trim).filter(|notes| !notes.is_empty()) {
        Some(notes) => Ok(entry.with_notes(notes)),
        None => Ok(entry),
    }
}

pub fn close_incident(
    incident: &mut Incident,
    closure_notes: &str,
    actor: &Principal,
    now: DateTime<Utc>,
) -> Result<AuditEntry, IncidentError> {
    require_status(incident, IncidentStatus::Resolved, "close incident")?;
    if closure_notes.trim().is_empty() {
        return Err(IncidentError::Validation(
            "closure notes are required to close an incident".to_string(),
        ));
    }
    incident.status = IncidentStatus::Closed;
    incident.closure_notes = Some(closure_notes.trim().to_string());
    incident.closed_at = Some(now);
    Ok(AuditEntry::new(timeline::INCIDENT_CLOSED, &actor.user_id).with_notes(closure_notes.trim()))
}

/// Administrative status correction. Deliberately not part of the
/// transition table: admin-only, requires a justification, and leaves its
/// own audit label so corrections are distinguishable from workflow
/// progress. The regular chain stays strict.
pub fn override_status(
    incident: &mut Incident,
    status: IncidentStatus,
    justification: &str,
    actor: &Principal,
    now: DateTime<Utc>,
) -> Result<AuditEntry, IncidentError> {
    if !actor.is_admin() {
        return Err(IncidentError::Authorization(
            "status override is restricted to administrators".to_string(),
        ));
    }
    if justification.trim().is_empty() {
        return Err(IncidentError::Validation(
            "status override requires a justification".to_string(),
        ));
    }
    if incident.status == status {
        return Err(IncidentError::Validation(format!(
            "incident is already {status}"
        )));
    }
    let previous = incident.status;
    incident.status = status;
    match status {
        IncidentStatus::Closed => incident.closed_at = Some(now),
        // Reopening clears closure bookkeeping.
        _ => {
            incident.closed_at = None;
            incident.closure_notes = None;
        }
    }
    Ok(
        AuditEntry::new(timeline::STATUS_OVERRIDDEN, &actor.user_id).with_notes(format!(
            "{previous} -> {status}: {}",
            justification.trim()
        )),
    )
}

/// Privileged correction of type/severity. The generic update path never
/// touches these fields; this is the single audited way to change them.
pub fn reclassify(
    incident: &mut Incident,
    incident_type: Option<IncidentType>,
    severity: Option<Severity>,
    justification: &str,
    actor: &Principal,
) -> Result<AuditEntry, IncidentError> {
    if !actor.is_admin() {
        return Err(IncidentError::Authorization(
            "reclassification is restricted to administrators".to_string(),
        ));
    }
    require_open(incident, "reclassify incident")?;
    if justification.trim().is_empty() {
        return Err(IncidentError::Validation(
            "reclassification requires a justification".to_string(),
        ));
    }
    if incident_type.is_none() && severity.is_none() {
        return Err(IncidentError::Validation(
            "reclassification must change type or severity".to_string(),
        ));
    }
    let mut changes = Vec::new();
    if let Some(new_type) = incident_type {
        if new_type != incident.incident_type {
            changes.push(format!("type {} -> {new_type}", incident.incident_type));
            incident.incident_type = new_type;
        }
    }
    if let Some(new_severity) = severity {
        if new_severity != incident.severity {
            changes.push(format!("severity {} -> {new_severity}", incident.severity));
            incident.severity = new_severity;
        }
    }
    if changes.is_empty() {
        return Err(IncidentError::Validation(
            "reclassification matches the current classification".to_string(),
        ));
    }
    Ok(
        AuditEntry::new(timeline::INCIDENT_RECLASSIFIED, &actor.user_id).with_notes(format!(
            "{}: {}",
            changes.join(", "),
            justification.trim()
        )),
    )
}
