//! The gated sub-workflow inside a single incident: initial-assessment
//! checklist, root cause, corrective/preventive actions, sign-off. Every
//! operation here mutates the incident's owned investigation and returns
//! the audit entry for the repository to append atomically.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::IncidentError;
use super::gate::Gate;
use super::timeline::{self, AuditEntry};
use super::types::{Action, ActionKind, ActionStatus, Incident, Investigation};
use super::workflow::require_open;
use crate::directory::Principal;

pub const INITIAL_ASSESSMENT_GATE: &str = "initial assessment checklist";

fn investigation_mut<'a>(
    incident: &'a mut Incident,
    attempted: &str,
) -> Result<&'a mut Investigation, IncidentError> {
    require_open(incident, attempted)?;
    incident.investigation.as_mut().ok_or_else(|| {
        IncidentError::Validation(format!(
            "incident {} has no investigation yet",
            incident.incident_number
        ))
    })
}

/// Flips one checklist item. Never advances incident status; the gate is
/// re-evaluated when progression is actually attempted.
pub fn toggle_checklist_item(
    incident: &mut Incident,
    item_id: u32,
    actor: &Principal,
) -> Result<AuditEntry, IncidentError> {
    let investigation = investigation_mut(incident, "toggle checklist item")?;
    let item = investigation
        .checklist
        .iter_mut()
        .find(|item| item.id == item_id)
        .ok_or_else(|| IncidentError::NotFound(format!("checklist item {item_id} not found")))?;
    item.completed = !item.completed;
    let note = format!(
        "{} marked {}",
        item.text,
        if item.completed { "complete" } else { "incomplete" }
    );
    Ok(AuditEntry::new(timeline::CHECKLIST_ITEM_TOGGLED, &actor.user_id).with_notes(note))
}

/// Root cause can only be recorded once the initial-assessment gate holds.
pub fn set_root_cause(
    incident: &mut Incident,
    root_cause: &str,
    gate_ratio: f64,
    actor: &Principal,
) -> Result<AuditEntry, IncidentError> {
    if root_cause.trim().is_empty() {
        return Err(IncidentError::Validation(
            "root cause must not be empty".to_string(),
        ));
    }
    let investigation = investigation_mut(incident, "set root cause")?;
    Gate::new(INITIAL_ASSESSMENT_GATE, gate_ratio)
        .evaluate(&investigation.checklist)
        .require()?;
    investigation.root_cause = Some(root_cause.trim().to_string());
    Ok(AuditEntry::new(timeline::ROOT_CAUSE_IDENTIFIED, &actor.user_id)
        .with_notes(root_cause.trim()))
}

pub fn update_notes(
    incident: &mut Incident,
    notes: &str,
    actor: &Principal,
) -> Result<AuditEntry, IncidentError> {
    if notes.trim().is_empty() {
        return Err(IncidentError::Validation(
            "investigation notes must not be empty".to_string(),
        ));
    }
    let investigation = investigation_mut(incident, "update investigation notes")?;
    investigation.notes = Some(notes.trim().to_string());
    Ok(AuditEntry::new(
        timeline::INVESTIGATION_NOTES_UPDATED,
        &actor.user_id,
    ))
}

pub struct NewAction {
    pub description: String,
    pub responsible: String,
    pub due_date: DateTime<Utc>,
}

/// Adds a corrective or preventive action. Allowed any time after the root
/// cause is set, including after sign-off for record-keeping.
pub fn add_action(
    incident: &mut Incident,
    kind: ActionKind,
    action: NewAction,
    actor: &Principal,
) -> Result<AuditEntry, IncidentError> {
    if action.description.trim().is_empty() {
        return Err(IncidentError::Validation(
            "action description must not be empty".to_string(),
        ));
    }
    if action.responsible.trim().is_empty() {
        return Err(IncidentError::Validation(
            "action responsible party must not be empty".to_string(),
        ));
    }
    if action.due_date < incident.incident_date {
        return Err(IncidentError::Validation(
            "action due date must not precede the incident date".to_string(),
        ));
    }
    let investigation = investigation_mut(incident, "add action")?;
    if investigation.root_cause.is_none() {
        return Err(IncidentError::GateNotMet(
            "actions require an identified root cause".to_string(),
        ));
    }
    let description = action.description.trim().to_string();
    investigation.actions_mut(kind).push(Action {
        id: Uuid::new_v4(),
        description: description.clone(),
        responsible: action.responsible.trim().to_string(),
        due_date: action.due_date,
        status: ActionStatus::Pending,
        completed_date: None,
    });
    Ok(AuditEntry::new(timeline::ACTION_ADDED, &actor.user_id)
        .with_notes(format!("{kind}: {description}")))
}

/// Records a reference to externally stored evidence. Upload happens
/// elsewhere; only completed references are attached here.
pub fn attach_evidence(
    incident: &mut Incident,
    reference: &str,
    actor: &Principal,
) -> Result<AuditEntry, IncidentError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(IncidentError::Validation(
            "evidence reference must not be empty".to_string(),
        ));
    }
    let investigation = investigation_mut(incident, "attach evidence")?;
    investigation.evidence.push(reference.to_string());
    Ok(AuditEntry::new(timeline::EVIDENCE_ATTACHED, &actor.user_id).with_notes(reference))
}

pub fn update_action_status(
    incident: &mut Incident,
    kind: ActionKind,
    action_id: Uuid,
    status: ActionStatus,
    completed_date: Option<DateTime<Utc>>,
    actor: &Principal,
) -> Result<AuditEntry, IncidentError> {
    let investigation = investigation_mut(incident, "update action status")?;
    let action = investigation
        .actions_mut(kind)
        .iter_mut()
        .find(|action| action.id == action_id)
        .ok_or_else(|| IncidentError::NotFound(format!("{kind} action {action_id} not found")))?;
    action.status = status;
    if status == ActionStatus::Completed {
        action.completed_date = completed_date.or_else(|| Some(Utc::now()));
    } else if let Some(date) = completed_date {
        action.completed_date = Some(date);
    }
    Ok(
        AuditEntry::new(timeline::ACTION_STATUS_UPDATED, &actor.user_id)
            .with_notes(format!("{kind} action now {status}")),
    )
}

/// Marks the investigation complete. Does not touch incident status; the
/// same record may still be amended before resolution is declared through
/// the workflow engine.
pub fn sign_off(
    incident: &mut Incident,
    actor: &Principal,
    now: DateTime<Utc>,
) -> Result<AuditEntry, IncidentError> {
    let investigation = investigation_mut(incident, "sign off investigation")?;
    let root_cause_set = investigation
        .root_cause
        .as_deref()
        .is_some_and(|cause| !cause.trim().is_empty());
    if !root_cause_set {
        return Err(IncidentError::GateNotMet(
            "sign-off requires an identified root cause".to_string(),
        ));
    }
    investigation.signed_off = true;
    investigation.signed_off_by = Some(actor.user_id.clone());
    investigation.signed_off_at = Some(now);
    investigation.completed_at = Some(now);
    Ok(AuditEntry::new(
        timeline::INVESTIGATION_SIGNED_OFF,
        &actor.user_id,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{Principal, Role};
    use crate::incidents::types::{IncidentStatus, IncidentType, Severity};
    use chrono::Duration;

    fn investigator() -> Principal {
        Principal::new("inv1", "Investigator One", [Role::Investigator])
    }

    fn incident_under_investigation() -> Incident {
        let now = Utc::now();
        let id = Uuid::new_v4();
        Incident {
            id,
            incident_number: "INC-20260101-0001".to_string(),
            incident_type: IncidentType::Safety,
            severity: Severity::High,
            status: IncidentStatus::UnderInvestigation,
            title: "Spill in Hallway".to_string(),
            description: "Water spill near entrance".to_string(),
            location: Some("2F".to_string()),
            incident_date: now - Duration::days(1),
            reported_by: "u1".to_string(),
            reported_at: now - Duration::days(1),
            assigned_to: Some("inv1".to_string()),
            people_involved: Vec::new(),
            photos: Vec::new(),
            immediate_actions: None,
            follow_up_date: None,
            closure_notes: None,
            closed_at: None,
            investigation: Some(Investigation::new(id, Some("inv1".to_string()), now)),
            timeline: Vec::new(),
            version: 1,
            updated_at: now,
        }
    }

    fn complete_items(incident: &mut Incident, count: usize) {
        let checklist = &mut incident.investigation.as_mut().unwrap().checklist;
        for item in checklist.iter_mut().take(count) {
            item.completed = true;
        }
    }

    #[test]
    fn root_cause_blocked_until_checklist_gate_met() {
        let mut incident = incident_under_investigation();
        complete_items(&mut incident, 4);

        // 4/6 is 66.6%, short of the 70% gate.
        let err = set_root_cause(&mut incident, "Wet floor sign missing", 0.7, &investigator())
            .unwrap_err();
        assert!(matches!(err, IncidentError::GateNotMet(_)));
        assert!(incident.investigation.as_ref().unwrap().root_cause.is_none());

        complete_items(&mut incident, 5);
        set_root_cause(&mut incident, "Wet floor sign missing", 0.7, &investigator()).unwrap();
        assert_eq!(
            incident.investigation.as_ref().unwrap().root_cause.as_deref(),
            Some("Wet floor sign missing")
        );
    }

    #[test]
    fn toggle_flips_and_never_advances_status() {
        let mut incident = incident_under_investigation();
        toggle_checklist_item(&mut incident, 0, &investigator()).unwrap();
        assert!(incident.investigation.as_ref().unwrap().checklist[0].completed);
        assert_eq!(incident.status, IncidentStatus::UnderInvestigation);

        toggle_checklist_item(&mut incident, 0, &investigator()).unwrap();
        assert!(!incident.investigation.as_ref().unwrap().checklist[0].completed);

        let err = toggle_checklist_item(&mut incident, 99, &investigator()).unwrap_err();
        assert!(matches!(err, IncidentError::NotFound(_)));
    }

    #[test]
    fn actions_validate_fields_and_due_date() {
        let mut incident = incident_under_investigation();
        complete_items(&mut incident, 6);
        set_root_cause(&mut incident, "cause", 0.7, &investigator()).unwrap();

        let too_early = incident.incident_date - Duration::days(1);
        let err = add_action(
            &mut incident,
            ActionKind::Corrective,
            NewAction {
                description: "Replace sign".to_string(),
                responsible: "facilities".to_string(),
                due_date: too_early,
            },
            &investigator(),
        )
        .unwrap_err();
        assert!(matches!(err, IncidentError::Validation(_)));

        let err = add_action(
            &mut incident,
            ActionKind::Preventive,
            NewAction {
                description: "  ".to_string(),
                responsible: "facilities".to_string(),
                due_date: Utc::now(),
            },
            &investigator(),
        )
        .unwrap_err();
        assert!(matches!(err, IncidentError::Validation(_)));

        add_action(
            &mut incident,
            ActionKind::Corrective,
            NewAction {
                description: "Replace sign".to_string(),
                responsible: "facilities".to_string(),
                due_date: Utc::now() + Duration::days(7),
            },
            &investigator(),
        )
        .unwrap();
        let investigation = incident.investigation.as_ref().unwrap();
        assert_eq!(investigation.corrective_actions.len(), 1);
        assert_eq!(
            investigation.corrective_actions[0].status,
            ActionStatus::Pending
        );
    }

    #[test]
    fn actions_require_root_cause_first() {
        let mut incident = incident_under_investigation();
        let err = add_action(
            &mut incident,
            ActionKind::Corrective,
            NewAction {
                description: "Replace sign".to_string(),
                responsible: "facilities".to_string(),
                due_date: Utc::now(),
            },
            &investigator(),
        )
        .unwrap_err();
        assert!(matches!(err, IncidentError::GateNotMet(_)));
    }

    #[test]
    fn completing_an_action_stamps_completion_date() {
        let mut incident = incident_under_investigation();
        complete_items(&mut incident, 6);
        set_root_cause(&mut incident, "cause", 0.7, &investigator()).unwrap();
        add_action(
            &mut incident,
            ActionKind::Corrective,
            NewAction {
                description: "Replace sign".to_string(),
                responsible: "facilities".to_string(),
                due_date: Utc::now() + Duration::days(7),
            },
            &investigator(),
        )
        .unwrap();
        let action_id = incident.investigation.as_ref().unwrap().corrective_actions[0].id;

        update_action_status(
            &mut incident,
            ActionKind::Corrective,
            action_id,
            ActionStatus::Completed,
            None,
            &investigator(),
        )
        .unwrap();
        let action = &incident.investigation.as_ref().unwrap().corrective_actions[0];
        assert_eq!(action.status, ActionStatus::Completed);
        assert!(action.completed_date.is_some());
    }

    #[test]
    fn sign_off_requires_root_cause_and_keeps_status() {
        let mut incident = incident_under_investigation();
        let err = sign_off(&mut incident, &investigator(), Utc::now()).unwrap_err();
        assert!(matches!(err, IncidentError::GateNotMet(_)));

        complete_items(&mut incident, 6);
        set_root_cause(&mut incident, "cause", 0.7, &investigator()).unwrap();
        sign_off(&mut incident, &investigator(), Utc::now()).unwrap();

        let investigation = incident.investigation.as_ref().unwrap();
        assert!(investigation.signed_off);
        assert_eq!(investigation.signed_off_by.as_deref(), Some("inv1"));
        assert!(investigation.completed_at.is_some());
        assert_eq!(incident.status, IncidentStatus::UnderInvestigation);

        // Record-keeping continues after sign-off.
        add_action(
            &mut incident,
            ActionKind::Preventive,
            NewAction {
                description: "Quarterly floor audit".to_string(),
                responsible: "facilities".to_string(),
                due_date: Utc::now() + Duration::days(30),
            },
            &investigator(),
        )
        .unwrap();
    }

    #[test]
    fn evidence_references_accumulate_in_order() {
        let mut incident = incident_under_investigation();
        attach_evidence(&mut incident, "photo-001", &investigator()).unwrap();
        attach_evidence(&mut incident, "witness-statement-01", &investigator()).unwrap();
        assert_eq!(
            incident.investigation.as_ref().unwrap().evidence,
            vec!["photo-001", "witness-statement-01"]
        );

        let err = attach_evidence(&mut incident, "  ", &investigator()).unwrap_err();
        assert!(matches!(err, IncidentError::Validation(_)));
    }

    #[test]
    fn closed_incident_rejects_investigation_edits() {
        let mut incident = incident_under_investigation();
        incident.status = IncidentStatus::Closed;
        let err = toggle_checklist_item(&mut incident, 0, &investigator()).unwrap_err();
        assert!(matches!(err, IncidentError::InvalidTransition { .. }));
    }
}
