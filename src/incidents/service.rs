//! Application service tying the lifecycle engine together: identity
//! resolution, authorization, record numbering, and the repository's
//! atomic write path. Handlers stay thin; everything observable happens
//! here or below.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use super::assignment;
use super::error::IncidentError;
use super::investigation::{self, NewAction};
use super::repository::IncidentRepository;
use super::stats;
use super::store::IncidentStore;
use super::timeline::{self, AuditEntry};
use super::types::{
    ActionKind, AddActionRequest, CreateIncidentRequest, Incident, IncidentFilter, IncidentStats,
    IncidentStatus, IncidentSummary, ReclassifyRequest, TimelineEvent, TrendAnalysis,
    TrendAnalysisQuery, UpdateActionStatusRequest, UpdateIncidentRequest,
};
use super::workflow;
use crate::config::IncidentConfig;
use crate::directory::{Directory, Principal};

pub struct IncidentService {
    repository: IncidentRepository,
    directory: Arc<dyn Directory>,
    config: IncidentConfig,
    incident_counter: AtomicU64,
}

impl IncidentService {
    pub fn new(
        store: Box<dyn IncidentStore>,
        directory: Arc<dyn Directory>,
        config: IncidentConfig,
    ) -> Self {
        Self {
            repository: IncidentRepository::new(store),
            directory,
            config,
            incident_counter: AtomicU64::new(1),
        }
    }

    pub fn directory(&self) -> &Arc<dyn Directory> {
        &self.directory
    }

    fn generate_incident_number(&self) -> String {
        let num = self.incident_counter.fetch_add(1, Ordering::SeqCst);
        format!("INC-{}-{:04}", Utc::now().format("%Y%m%d"), num)
    }

    /// Reporters see their own incidents, investigators what they are
    /// assigned, admins everything.
    fn can_view(actor: &Principal, incident: &Incident) -> bool {
        actor.is_admin()
            || incident.reported_by == actor.user_id
            || incident.assigned_to.as_deref() == Some(actor.user_id.as_str())
    }

    fn require_view(actor: &Principal, incident: &Incident) -> Result<(), IncidentError> {
        if Self::can_view(actor, incident) {
            Ok(())
        } else {
            // Reported as missing rather than forbidden so listings and
            // direct fetches agree on what exists for this caller.
            Err(IncidentError::NotFound(format!(
                "incident {} not found",
                incident.id
            )))
        }
    }

    /// Workflow and investigation mutations are for admins and the
    /// assigned investigator.
    fn require_manage(actor: &Principal, incident: &Incident) -> Result<(), IncidentError> {
        if actor.is_admin() || incident.assigned_to.as_deref() == Some(actor.user_id.as_str()) {
            Ok(())
        } else {
            Err(IncidentError::Authorization(format!(
                "{} may not manage incident {}",
                actor.user_id, incident.incident_number
            )))
        }
    }

    pub fn create_incident(
        &self,
        actor: &Principal,
        request: CreateIncidentRequest,
    ) -> Result<Incident, IncidentError> {
        if request.title.trim().is_empty() {
            return Err(IncidentError::Validation(
                "title must not be empty".to_string(),
            ));
        }
        if request.description.trim().is_empty() {
            return Err(IncidentError::Validation(
                "description must not be empty".to_string(),
            ));
        }
        let now = Utc::now();
        let incident_date = request.incident_date.unwrap_or(now);
        if incident_date > now {
            return Err(IncidentError::Validation(
                "incident date must not be in the future".to_string(),
            ));
        }

        let incident = Incident {
            id: Uuid::new_v4(),
            incident_number: self.generate_incident_number(),
            incident_type: request.incident_type,
            severity: request.severity,
            status: IncidentStatus::Reported,
            title: request.title.trim().to_string(),
            description: request.description.trim().to_string(),
            location: request.location,
            incident_date,
            reported_by: actor.user_id.clone(),
            reported_at: now,
            assigned_to: None,
            people_involved: request.people_involved.unwrap_or_default(),
            photos: request.photos.unwrap_or_default(),
            immediate_actions: request.immediate_actions,
            follow_up_date: request.follow_up_date,
            closure_notes: None,
            closed_at: None,
            investigation: None,
            timeline: Vec::new(),
            version: 1,
            updated_at: now,
        };
        self.repository.create(incident.clone())?;
        log::info!(
            "Created incident {}: {} (severity: {})",
            incident.incident_number,
            incident.title,
            incident.severity
        );
        if incident.severity.is_urgent() {
            log::warn!(
                "High-severity incident reported: {} ({})",
                incident.incident_number,
                incident.severity
            );
        }
        Ok(incident)
    }

    pub fn get_incident(&self, actor: &Principal, id: Uuid) -> Result<Incident, IncidentError> {
        let incident = self.repository.get(id)?;
        Self::require_view(actor, &incident)?;
        Ok(incident)
    }

    pub fn get_by_number(
        &self,
        actor: &Principal,
        incident_number: &str,
    ) -> Result<Incident, IncidentError> {
        let incident = self.repository.get_by_number(incident_number)?;
        Self::require_view(actor, &incident)?;
        Ok(incident)
    }

    pub fn list_incidents(
        &self,
        actor: &Principal,
        filter: &IncidentFilter,
    ) -> Result<Vec<Incident>, IncidentError> {
        let incidents = self.repository.list(filter)?;
        Ok(incidents
            .into_iter()
            .filter(|incident| Self::can_view(actor, incident))
            .collect())
    }

    pub fn get_timeline(
        &self,
        actor: &Principal,
        id: Uuid,
    ) -> Result<Vec<TimelineEvent>, IncidentError> {
        let incident = self.get_incident(actor, id)?;
        Ok(timeline::read_timeline(&incident).collect())
    }

    /// Generic field update. Classification and status never change here;
    /// those go through their own audited operations.
    pub fn update_incident(
        &self,
        actor: &Principal,
        id: Uuid,
        request: UpdateIncidentRequest,
    ) -> Result<Incident, IncidentError> {
        let current = self.repository.get(id)?;
        Self::require_view(actor, &current)?;
        Self::require_manage(actor, &current)?;
        let actor_id = actor.user_id.clone();
        self.repository
            .apply_mutation(id, request.expected_version, move |incident| {
                workflow::require_open(incident, "update incident")?;
                let mut changed = Vec::new();
                if let Some(title) = request.title {
                    if title.trim().is_empty() {
                        return Err(IncidentError::Validation(
                            "title must not be empty".to_string(),
                        ));
                    }
                    incident.title = title.trim().to_string();
                    changed.push("title");
                }
                if let Some(description) = request.description {
                    if description.trim().is_empty() {
                        return Err(IncidentError::Validation(
                            "description must not be empty".to_string(),
                        ));
                    }
                    incident.description = description.trim().to_string();
                    changed.push("description");
                }
                if let Some(location) = request.location {
                    incident.location = location;
                    changed.push("location");
                }
                if let Some(incident_date) = request.incident_date {
                    if incident_date > Utc::now() {
                        return Err(IncidentError::Validation(
                            "incident date must not be in the future".to_string(),
                        ));
                    }
                    incident.incident_date = incident_date;
                    changed.push("incident_date");
                }
                if let Some(people) = request.people_involved {
                    incident.people_involved = people;
                    changed.push("people_involved");
                }
                if let Some(photos) = request.photos {
                    incident.photos = photos;
                    changed.push("photos");
                }
                if let Some(immediate_actions) = request.immediate_actions {
                    incident.immediate_actions = immediate_actions;
                    changed.push("immediate_actions");
                }
                if let Some(follow_up_date) = request.follow_up_date {
                    incident.follow_up_date = follow_up_date;
                    changed.push("follow_up_date");
                }
                if changed.is_empty() {
                    return Err(IncidentError::Validation(
                        "update contains no changes".to_string(),
                    ));
                }
                Ok(AuditEntry::new(timeline::INCIDENT_UPDATED, &actor_id)
                    .with_notes(changed.join(", ")))
            })
    }

    pub fn assign_investigator(
        &self,
        actor: &Principal,
        id: Uuid,
        investigator: &str,
        expected_version: Option<u64>,
    ) -> Result<Incident, IncidentError> {
        if !actor.is_admin() {
            return Err(IncidentError::Authorization(
                "only administrators assign investigators".to_string(),
            ));
        }
        let investigator = investigator.trim().to_string();
        if !self.directory.investigator_exists(&investigator) {
            return Err(IncidentError::Validation(format!(
                "{investigator} is not a known investigator"
            )));
        }
        let actor = actor.clone();
        let assigned = self
            .repository
            .apply_mutation(id, expected_version, move |incident| {
                assignment::assign_investigator(incident, &investigator, &actor, Utc::now())
            })?;
        log::info!(
            "Incident {} assigned to {}",
            assigned.incident_number,
            assigned.assigned_to.as_deref().unwrap_or("-")
        );
        Ok(assigned)
    }

    fn transition(
        &self,
        actor: &Principal,
        id: Uuid,
        expected_version: Option<u64>,
        apply: impl FnOnce(&mut Incident, &Principal) -> Result<AuditEntry, IncidentError>,
    ) -> Result<Incident, IncidentError> {
        let current = self.repository.get(id)?;
        Self::require_manage(actor, &current)?;
        let actor = actor.clone();
        let updated = self
            .repository
            .apply_mutation(id, expected_version, move |incident| {
                apply(incident, &actor)
            })?;
        log::info!(
            "Incident {} is now {}",
            updated.incident_number,
            updated.status
        );
        Ok(updated)
    }

    pub fn start_investigation(
        &self,
        actor: &Principal,
        id: Uuid,
        expected_version: Option<u64>,
    ) -> Result<Incident, IncidentError> {
        self.transition(actor, id, expected_version, |incident, actor| {
            workflow::start_investigation(incident, actor, Utc::now())
        })
    }

    pub fn begin_corrective_action(
        &self,
        actor: &Principal,
        id: Uuid,
        expected_version: Option<u64>,
    ) -> Result<Incident, IncidentError> {
        self.transition(actor, id, expected_version, |incident, actor| {
            workflow::begin_corrective_action(incident, actor)
        })
    }

    pub fn mark_resolved(
        &self,
        actor: &Principal,
        id: Uuid,
        resolution_notes: Option<String>,
        expected_version: Option<u64>,
    ) -> Result<Incident, IncidentError> {
        self.transition(actor, id, expected_version, move |incident, actor| {
            workflow::mark_resolved(incident, resolution_notes.as_deref(), actor)
        })
    }

    pub fn close_incident(
        &self,
        actor: &Principal,
        id: Uuid,
        closure_notes: String,
        expected_version: Option<u64>,
    ) -> Result<Incident, IncidentError> {
        self.transition(actor, id, expected_version, move |incident, actor| {
            workflow::close_incident(incident, &closure_notes, actor, Utc::now())
        })
    }

    pub fn override_status(
        &self,
        actor: &Principal,
        id: Uuid,
        status: IncidentStatus,
        justification: String,
        expected_version: Option<u64>,
    ) -> Result<Incident, IncidentError> {
        let actor_owned = actor.clone();
        let updated = self
            .repository
            .apply_mutation(id, expected_version, move |incident| {
                workflow::override_status(
                    incident,
                    status,
                    &justification,
                    &actor_owned,
                    Utc::now(),
                )
            })?;
        log::warn!(
            "Status of incident {} overridden to {} by {}",
            updated.incident_number,
            updated.status,
            actor.user_id
        );
        Ok(updated)
    }

    pub fn reclassify(
        &self,
        actor: &Principal,
        id: Uuid,
        request: ReclassifyRequest,
    ) -> Result<Incident, IncidentError> {
        let actor = actor.clone();
        self.repository
            .apply_mutation(id, request.expected_version, move |incident| {
                workflow::reclassify(
                    incident,
                    request.incident_type,
                    request.severity,
                    &request.justification,
                    &actor,
                )
            })
    }

    fn investigation_mutation(
        &self,
        actor: &Principal,
        id: Uuid,
        expected_version: Option<u64>,
        apply: impl FnOnce(&mut Incident, &Principal) -> Result<AuditEntry, IncidentError>,
    ) -> Result<Incident, IncidentError> {
        let current = self.repository.get(id)?;
        Self::require_manage(actor, &current)?;
        let actor = actor.clone();
        self.repository
            .apply_mutation(id, expected_version, move |incident| {
                apply(incident, &actor)
            })
    }

    pub fn toggle_checklist_item(
        &self,
        actor: &Principal,
        id: Uuid,
        item_id: u32,
        expected_version: Option<u64>,
    ) -> Result<Incident, IncidentError> {
        self.investigation_mutation(actor, id, expected_version, |incident, actor| {
            investigation::toggle_checklist_item(incident, item_id, actor)
        })
    }

    pub fn set_root_cause(
        &self,
        actor: &Principal,
        id: Uuid,
        root_cause: String,
        expected_version: Option<u64>,
    ) -> Result<Incident, IncidentError> {
        let gate_ratio = self.config.checklist_gate_ratio;
        self.investigation_mutation(actor, id, expected_version, move |incident, actor| {
            investigation::set_root_cause(incident, &root_cause, gate_ratio, actor)
        })
    }

    pub fn update_investigation_notes(
        &self,
        actor: &Principal,
        id: Uuid,
        notes: String,
        expected_version: Option<u64>,
    ) -> Result<Incident, IncidentError> {
        self.investigation_mutation(actor, id, expected_version, move |incident, actor| {
            investigation::update_notes(incident, &notes, actor)
        })
    }

    pub fn add_action(
        &self,
        actor: &Principal,
        id: Uuid,
        request: AddActionRequest,
    ) -> Result<Incident, IncidentError> {
        self.investigation_mutation(
            actor,
            id,
            request.expected_version,
            move |incident, actor| {
                investigation::add_action(
                    incident,
                    request.kind,
                    NewAction {
                        description: request.description,
                        responsible: request.responsible,
                        due_date: request.due_date,
                    },
                    actor,
                )
            },
        )
    }

    pub fn update_action_status(
        &self,
        actor: &Principal,
        id: Uuid,
        kind: ActionKind,
        action_id: Uuid,
        request: UpdateActionStatusRequest,
    ) -> Result<Incident, IncidentError> {
        self.investigation_mutation(
            actor,
            id,
            request.expected_version,
            move |incident, actor| {
                investigation::update_action_status(
                    incident,
                    kind,
                    action_id,
                    request.status,
                    request.completed_date,
                    actor,
                )
            },
        )
    }

    pub fn attach_evidence(
        &self,
        actor: &Principal,
        id: Uuid,
        reference: String,
        expected_version: Option<u64>,
    ) -> Result<Incident, IncidentError> {
        self.investigation_mutation(actor, id, expected_version, move |incident, actor| {
            investigation::attach_evidence(incident, &reference, actor)
        })
    }

    pub fn sign_off_investigation(
        &self,
        actor: &Principal,
        id: Uuid,
        expected_version: Option<u64>,
    ) -> Result<Incident, IncidentError> {
        let updated =
            self.investigation_mutation(actor, id, expected_version, |incident, actor| {
                investigation::sign_off(incident, actor, Utc::now())
            })?;
        log::info!(
            "Investigation for incident {} signed off",
            updated.incident_number
        );
        Ok(updated)
    }

    pub fn get_stats(&self, filter: &IncidentFilter) -> Result<IncidentStats, IncidentError> {
        let incidents = self.repository.list(filter)?;
        Ok(stats::compute_stats(
            &incidents,
            self.config.investigation_sla_days,
            Utc::now(),
        ))
    }

    pub fn requiring_follow_up(&self) -> Result<Vec<IncidentSummary>, IncidentError> {
        let incidents = self.repository.list(&IncidentFilter::default())?;
        Ok(stats::requiring_follow_up(
            &incidents,
            self.config.follow_up_window_days,
            Utc::now(),
        ))
    }

    pub fn trend_analysis(
        &self,
        query: &TrendAnalysisQuery,
    ) -> Result<TrendAnalysis, IncidentError> {
        if query.end_date < query.start_date {
            return Err(IncidentError::Validation(
                "end date precedes start date".to_string(),
            ));
        }
        let incidents = self.repository.list(&IncidentFilter::default())?;
        Ok(stats::trend_analysis(&incidents, query))
    }

    pub fn high_severity_open(&self) -> Result<Vec<IncidentSummary>, IncidentError> {
        let incidents = self.repository.list(&IncidentFilter::default())?;
        Ok(stats::high_severity_open(&incidents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{DirectoryUser, Role, StaticDirectory};
    use crate::incidents::store::MemoryStore;
    use crate::incidents::types::{IncidentType, Severity};

    fn service() -> IncidentService {
        let directory = StaticDirectory::from_users(&[
            DirectoryUser {
                user_id: "admin1".to_string(),
                name: "Admin One".to_string(),
                roles: vec![Role::Admin],
            },
            DirectoryUser {
                user_id: "inv1".to_string(),
                name: "Investigator One".to_string(),
                roles: vec![Role::Investigator],
            },
            DirectoryUser {
                user_id: "u1".to_string(),
                name: "Staff One".to_string(),
                roles: vec![Role::Staff],
            },
        ]);
        IncidentService::new(
            Box::new(MemoryStore::new()),
            Arc::new(directory),
            IncidentConfig::default(),
        )
    }

    fn principal(service: &IncidentService, user_id: &str) -> Principal {
        service.directory().resolve(user_id).unwrap()
    }

    fn create_request() -> CreateIncidentRequest {
        CreateIncidentRequest {
            incident_type: IncidentType::Safety,
            severity: Severity::High,
            title: "Spill in Hallway".to_string(),
            description: "Water spill near entrance".to_string(),
            location: Some("2F".to_string()),
            incident_date: None,
            people_involved: None,
            photos: None,
            immediate_actions: None,
            follow_up_date: None,
        }
    }

    #[test]
    fn incident_numbers_are_dated_and_sequential() {
        let service = service();
        let reporter = principal(&service, "u1");
        let first = service.create_incident(&reporter, create_request()).unwrap();
        let second = service.create_incident(&reporter, create_request()).unwrap();
        let prefix = format!("INC-{}-", Utc::now().format("%Y%m%d"));
        assert!(first.incident_number.starts_with(&prefix));
        assert!(first.incident_number.ends_with("0001"));
        assert!(second.incident_number.ends_with("0002"));
        assert_eq!(first.version, 1);
        assert_eq!(first.status, IncidentStatus::Reported);
    }

    #[test]
    fn reporters_only_see_their_own_incidents() {
        let service = service();
        let reporter = principal(&service, "u1");
        let admin = principal(&service, "admin1");
        let investigator = principal(&service, "inv1");
        let incident = service.create_incident(&reporter, create_request()).unwrap();

        assert!(service.get_incident(&reporter, incident.id).is_ok());
        assert!(service.get_incident(&admin, incident.id).is_ok());
        // Unassigned investigator sees nothing, and gets the same error a
        // truly missing record would produce.
        let err = service.get_incident(&investigator, incident.id).unwrap_err();
        assert!(matches!(err, IncidentError::NotFound(_)));

        service
            .assign_investigator(&admin, incident.id, "inv1", None)
            .unwrap();
        assert!(service.get_incident(&investigator, incident.id).is_ok());
    }

    #[test]
    fn assignment_requires_admin_and_known_investigator() {
        let service = service();
        let reporter = principal(&service, "u1");
        let admin = principal(&service, "admin1");
        let incident = service.create_incident(&reporter, create_request()).unwrap();

        let err = service
            .assign_investigator(&reporter, incident.id, "inv1", None)
            .unwrap_err();
        assert!(matches!(err, IncidentError::Authorization(_)));

        let err = service
            .assign_investigator(&admin, incident.id, "ghost", None)
            .unwrap_err();
        assert!(matches!(err, IncidentError::Validation(_)));

        let assigned = service
            .assign_investigator(&admin, incident.id, "inv1", None)
            .unwrap();
        assert_eq!(assigned.assigned_to.as_deref(), Some("inv1"));
        assert_eq!(assigned.version, 2);
    }

    #[test]
    fn stale_expected_version_is_rejected_once() {
        let service = service();
        let reporter = principal(&service, "u1");
        let admin = principal(&service, "admin1");
        let incident = service.create_incident(&reporter, create_request()).unwrap();

        service
            .assign_investigator(&admin, incident.id, "inv1", Some(1))
            .unwrap();
        let err = service
            .assign_investigator(&admin, incident.id, "inv1", Some(1))
            .unwrap_err();
        assert!(matches!(err, IncidentError::Conflict { .. }));
    }

    #[test]
    fn update_rejects_empty_change_set_and_tracks_changed_fields() {
        let service = service();
        let reporter = principal(&service, "u1");
        let admin = principal(&service, "admin1");
        let incident = service.create_incident(&reporter, create_request()).unwrap();

        let err = service
            .update_incident(&admin, incident.id, UpdateIncidentRequest::default())
            .unwrap_err();
        assert!(matches!(err, IncidentError::Validation(_)));

        let updated = service
            .update_incident(
                &admin,
                incident.id,
                UpdateIncidentRequest {
                    location: Some(Some("3F".to_string())),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.location.as_deref(), Some("3F"));
        assert_eq!(updated.timeline.last().unwrap().notes.as_deref(), Some("location"));
    }

    #[test]
    fn reporters_cannot_update_their_own_incidents() {
        let service = service();
        let reporter = principal(&service, "u1");
        let incident = service.create_incident(&reporter, create_request()).unwrap();

        let err = service
            .update_incident(
                &reporter,
                incident.id,
                UpdateIncidentRequest {
                    title: Some("Revised title".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, IncidentError::Authorization(_)));
        let unchanged = service.get_incident(&reporter, incident.id).unwrap();
        assert_eq!(unchanged.title, "Spill in Hallway");
        assert_eq!(unchanged.version, 1);
    }

    #[test]
    fn explicit_null_clears_nullable_fields() {
        let service = service();
        let reporter = principal(&service, "u1");
        let admin = principal(&service, "admin1");
        let incident = service.create_incident(&reporter, create_request()).unwrap();
        assert_eq!(incident.location.as_deref(), Some("2F"));

        let request: UpdateIncidentRequest =
            serde_json::from_value(serde_json::json!({ "location": null })).unwrap();
        assert_eq!(request.location, Some(None));
        let updated = service.update_incident(&admin, incident.id, request).unwrap();
        assert!(updated.location.is_none());

        // Omitted fields stay untouched.
        let request: UpdateIncidentRequest =
            serde_json::from_value(serde_json::json!({ "title": "Spill near entrance" })).unwrap();
        assert_eq!(request.location, None);
        let updated = service.update_incident(&admin, incident.id, request).unwrap();
        assert!(updated.location.is_none());
        assert_eq!(updated.title, "Spill near entrance");
    }

    #[test]
    fn stats_respect_the_caller_filter() {
        let service = service();
        let reporter = principal(&service, "u1");
        service.create_incident(&reporter, create_request()).unwrap();
        service
            .create_incident(
                &reporter,
                CreateIncidentRequest {
                    severity: Severity::Low,
                    ..create_request()
                },
            )
            .unwrap();

        let all = service.get_stats(&IncidentFilter::default()).unwrap();
        assert_eq!(all.total, 2);

        let high_only = service
            .get_stats(&IncidentFilter {
                severities: vec![Severity::High],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(high_only.total, 1);
        assert_eq!(high_only.by_severity["high"], 1);
        assert_eq!(high_only.by_severity["low"], 0);
    }

    #[test]
    fn follow_up_date_flows_from_update_to_the_due_list() {
        let service = service();
        let reporter = principal(&service, "u1");
        let admin = principal(&service, "admin1");
        let incident = service.create_incident(&reporter, create_request()).unwrap();
        assert!(service.requiring_follow_up().unwrap().is_empty());

        service
            .update_incident(
                &admin,
                incident.id,
                UpdateIncidentRequest {
                    follow_up_date: Some(Some(Utc::now() + chrono::Duration::days(3))),
                    ..Default::default()
                },
            )
            .unwrap();
        let due = service.requiring_follow_up().unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, incident.id);
    }

    #[test]
    fn timeline_grows_one_entry_per_mutation() {
        let service = service();
        let reporter = principal(&service, "u1");
        let admin = principal(&service, "admin1");
        let incident = service.create_incident(&reporter, create_request()).unwrap();

        let events = service.get_timeline(&reporter, incident.id).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, timeline::INCIDENT_REPORTED);

        service
            .assign_investigator(&admin, incident.id, "inv1", None)
            .unwrap();
        service
            .start_investigation(&admin, incident.id, None)
            .unwrap();
        let events = service.get_timeline(&reporter, incident.id).unwrap();
        let actions: Vec<_> = events.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(
            actions,
            vec![
                timeline::INCIDENT_REPORTED,
                timeline::INVESTIGATOR_ASSIGNED,
                timeline::INVESTIGATION_STARTED,
            ]
        );
    }
}
