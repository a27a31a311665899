use chrono::Utc;
use log::warn;
use std::sync::Mutex;
use uuid::Uuid;

use super::error::IncidentError;
use super::store::{IncidentStore, StoreError};
use super::timeline::{self, AuditEntry};
use super::types::{Incident, IncidentFilter};

/// Durable access to incident records. All writes funnel through
/// [`IncidentRepository::apply_mutation`] so the validate → mutate → append
/// timeline sequence is always one atomic unit, guarded by the mutation
/// lock and the record's optimistic version token.
pub struct IncidentRepository {
    store: Box<dyn IncidentStore>,
    // Per-engine critical section for the read-modify-write cycle. Reads
    // take snapshots and never block on it.
    mutation_lock: Mutex<()>,
}

impl IncidentRepository {
    pub fn new(store: Box<dyn IncidentStore>) -> Self {
        Self {
            store,
            mutation_lock: Mutex::new(()),
        }
    }

    /// Runs a store operation, transparently retrying once on a transient
    /// failure. A second failure surfaces as `Unavailable`, kept distinct
    /// from every domain error.
    fn with_retry<T>(
        &self,
        op: impl Fn(&dyn IncidentStore) -> Result<T, StoreError>,
    ) -> Result<T, IncidentError> {
        match op(self.store.as_ref()) {
            Ok(value) => Ok(value),
            Err(first) => {
                warn!("Transient store failure, retrying once: {first}");
                op(self.store.as_ref()).map_err(|second| {
                    IncidentError::Unavailable(format!("persistence failed after retry: {second}"))
                })
            }
        }
    }

    pub fn create(&self, incident: Incident) -> Result<Uuid, IncidentError> {
        let _guard = self
            .mutation_lock
            .lock()
            .map_err(|_| IncidentError::Internal("mutation lock poisoned".to_string()))?;
        if self.with_retry(|store| store.load(&incident.id))?.is_some() {
            return Err(IncidentError::Validation(format!(
                "incident {} already exists",
                incident.id
            )));
        }
        let id = incident.id;
        self.with_retry(|store| store.save(&incident))?;
        Ok(id)
    }

    pub fn get(&self, id: Uuid) -> Result<Incident, IncidentError> {
        self.with_retry(|store| store.load(&id))?
            .ok_or_else(|| IncidentError::NotFound(format!("incident {id} not found")))
    }

    pub fn get_by_number(&self, incident_number: &str) -> Result<Incident, IncidentError> {
        self.with_retry(|store| store.load_by_number(incident_number))?
            .ok_or_else(|| {
                IncidentError::NotFound(format!("incident {incident_number} not found"))
            })
    }

    /// Filtered snapshot, stable-sorted by incident date descending.
    pub fn list(&self, filter: &IncidentFilter) -> Result<Vec<Incident>, IncidentError> {
        let mut incidents: Vec<Incident> = self
            .with_retry(|store| store.load_all())?
            .into_iter()
            .filter(|incident| filter.matches(incident))
            .collect();
        incidents.sort_by(|a, b| b.incident_date.cmp(&a.incident_date));
        Ok(incidents)
    }

    /// The sole write path. Checks the expected version (when supplied),
    /// applies the mutation, appends the audit event the mutation returns,
    /// and bumps the version, all under the mutation lock. A stale expected
    /// version fails with `Conflict` and nothing is written.
    pub fn apply_mutation(
        &self,
        id: Uuid,
        expected_version: Option<u64>,
        mutation: impl FnOnce(&mut Incident) -> Result<AuditEntry, IncidentError>,
    ) -> Result<Incident, IncidentError> {
        let _guard = self
            .mutation_lock
            .lock()
            .map_err(|_| IncidentError::Internal("mutation lock poisoned".to_string()))?;

        let mut incident = self
            .with_retry(|store| store.load(&id))?
            .ok_or_else(|| IncidentError::NotFound(format!("incident {id} not found")))?;

        if let Some(expected) = expected_version {
            if incident.version != expected {
                return Err(IncidentError::Conflict {
                    expected,
                    actual: incident.version,
                });
            }
        }

        let entry = mutation(&mut incident)?;
        let now = Utc::now();
        timeline::record(&mut incident, entry, now);
        incident.version += 1;
        incident.updated_at = now;

        self.with_retry(|store| store.save(&incident))?;
        Ok(incident)
    }
}
