//! Audit timeline recording and reads. One event is appended per mutating
//! operation, inside the same atomic unit as the mutation itself (see the
//! repository's write path). Reads prepend a synthetic "Incident Reported"
//! entry derived from the report fields so that fact is never persisted
//! twice.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::types::{Incident, TimelineEvent};

pub const INCIDENT_REPORTED: &str = "Incident Reported";
pub const INCIDENT_UPDATED: &str = "Incident Updated";
pub const INCIDENT_RECLASSIFIED: &str = "Incident Reclassified";
pub const INVESTIGATOR_ASSIGNED: &str = "Investigator Assigned";
pub const INVESTIGATOR_REASSIGNED: &str = "Investigator Reassigned";
pub const INVESTIGATION_STARTED: &str = "Investigation Started";
pub const CORRECTIVE_ACTION_STARTED: &str = "Corrective Action Started";
pub const INCIDENT_RESOLVED: &str = "Incident Resolved";
pub const INCIDENT_CLOSED: &str = "Incident Closed";
pub const STATUS_OVERRIDDEN: &str = "Status Overridden";
pub const CHECKLIST_ITEM_TOGGLED: &str = "Checklist Item Toggled";
pub const ROOT_CAUSE_IDENTIFIED: &str = "Root Cause Identified";
pub const INVESTIGATION_NOTES_UPDATED: &str = "Investigation Notes Updated";
pub const ACTION_ADDED: &str = "Action Added";
pub const EVIDENCE_ATTACHED: &str = "Evidence Attached";
pub const ACTION_STATUS_UPDATED: &str = "Action Status Updated";
pub const INVESTIGATION_SIGNED_OFF: &str = "Investigation Signed Off";

/// What a successful mutation wants written to the audit trail.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub action: String,
    pub performed_by: String,
    pub notes: Option<String>,
}

impl AuditEntry {
    pub fn new(action: &str, performed_by: &str) -> Self {
        Self {
            action: action.to_string(),
            performed_by: performed_by.to_string(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Appends one event to the incident's owned timeline. Only the repository
/// write path calls this, so the append shares the mutation's atomic unit.
pub fn record(incident: &mut Incident, entry: AuditEntry, at: DateTime<Utc>) {
    let sequence = incident.timeline.len() as u64 + 1;
    incident.timeline.push(TimelineEvent {
        id: Uuid::new_v4(),
        action: entry.action,
        performed_by: entry.performed_by,
        performed_at: at,
        notes: entry.notes,
        sequence,
    });
}

/// Full audit trail for an incident snapshot: the synthetic "Incident
/// Reported" head, then stored events ordered by time with insertion
/// sequence breaking ties. Restartable; call again for a fresh pass.
pub fn read_timeline(incident: &Incident) -> impl Iterator<Item = TimelineEvent> {
    let reported = TimelineEvent {
        // Deterministic id so repeated reads return identical snapshots.
        id: Uuid::new_v5(&incident.id, INCIDENT_REPORTED.as_bytes()),
        action: INCIDENT_REPORTED.to_string(),
        performed_by: incident.reported_by.clone(),
        performed_at: incident.reported_at,
        notes: None,
        sequence: 0,
    };
    let mut events = incident.timeline.clone();
    events.sort_by(|a, b| {
        a.performed_at
            .cmp(&b.performed_at)
            .then(a.sequence.cmp(&b.sequence))
    });
    std::iter::once(reported).chain(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incidents::types::{IncidentStatus, IncidentType, Severity};
    use chrono::Duration;

    fn fresh_incident() -> Incident {
        let now = Utc::now();
        Incident {
            id: Uuid::new_v4(),
            incident_number: "INC-20260101-0001".to_string(),
            incident_type: IncidentType::Safety,
            severity: Severity::Low,
            status: IncidentStatus::Reported,
            title: "t".to_string(),
            description: "d".to_string(),
            location: None,
            incident_date: now,
            reported_by: "u1".to_string(),
            reported_at: now,
            assigned_to: None,
            people_involved: Vec::new(),
            photos: Vec::new(),
            immediate_actions: None,
            follow_up_date: None,
            closure_notes: None,
            closed_at: None,
            investigation: None,
            timeline: Vec::new(),
            version: 1,
            updated_at: now,
        }
    }

    #[test]
    fn synthetic_reported_entry_leads_and_is_stable() {
        let incident = fresh_incident();
        let first_pass: Vec<_> = read_timeline(&incident).collect();
        let second_pass: Vec<_> = read_timeline(&incident).collect();
        assert_eq!(first_pass.len(), 1);
        assert_eq!(first_pass[0].action, INCIDENT_REPORTED);
        assert_eq!(first_pass[0].performed_by, "u1");
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn events_ordered_by_time_then_sequence() {
        let mut incident = fresh_incident();
        let base = incident.reported_at;
        record(
            &mut incident,
            AuditEntry::new(INVESTIGATOR_ASSIGNED, "admin"),
            base + Duration::seconds(10),
        );
        // Same instant as the next event; sequence must break the tie.
        record(
            &mut incident,
            AuditEntry::new(INVESTIGATION_STARTED, "admin"),
            base + Duration::seconds(20),
        );
        record(
            &mut incident,
            AuditEntry::new(ROOT_CAUSE_IDENTIFIED, "inv1"),
            base + Duration::seconds(20),
        );

        let actions: Vec<_> = read_timeline(&incident).map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![
                INCIDENT_REPORTED,
                INVESTIGATOR_ASSIGNED,
                INVESTIGATION_STARTED,
                ROOT_CAUSE_IDENTIFIED,
            ]
        );
    }

    #[test]
    fn timeline_length_is_mutations_plus_one() {
        let mut incident = fresh_incident();
        let base = incident.reported_at;
        for i in 0..5 {
            record(
                &mut incident,
                AuditEntry::new(INCIDENT_UPDATED, "admin"),
                base + Duration::seconds(i),
            );
        }
        assert_eq!(read_timeline(&incident).count(), 6);
    }
}
