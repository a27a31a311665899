//! Investigator assignment. Assignment is independent of status
//! progression: an investigator can be attached or swapped at any point
//! while the incident is open, and a reassignment carries its own audit
//! label so handovers are visible in the trail.

use chrono::{DateTime, Utc};

use super::error::IncidentError;
use super::timeline::{self, AuditEntry};
use super::types::{Incident, Investigation};
use super::workflow::require_open;
use crate::directory::Principal;

pub fn assign_investigator(
    incident: &mut Incident,
    investigator: &str,
    actor: &Principal,
    now: DateTime<Utc>,
) -> Result<AuditEntry, IncidentError> {
    require_open(incident, "assign investigator")?;
    let investigator = investigator.trim();
    if investigator.is_empty() {
        return Err(IncidentError::Validation(
            "investigator id must not be empty".to_string(),
        ));
    }
    let previous = incident.assigned_to.replace(investigator.to_string());
    match incident.investigation.as_mut() {
        Some(investigation) => investigation.investigator = Some(investigator.to_string()),
        None => {
            incident.investigation = Some(Investigation::new(
                incident.id,
                Some(investigator.to_string()),
                now,
            ));
        }
    }
    let entry = match previous.as_deref() {
        Some(prior) if prior != investigator => {
            AuditEntry::new(timeline::INVESTIGATOR_REASSIGNED, &actor.user_id)
                .with_notes(format!("{prior} -> {investigator}"))
        }
        _ => AuditEntry::new(timeline::INVESTIGATOR_ASSIGNED, &actor.user_id)
            .with_notes(investigator),
    };
    Ok(entry)
}
