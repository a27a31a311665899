use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::types::Incident;

/// A transient persistence failure. The repository retries these once; a
/// second failure surfaces to callers as `IncidentError::Unavailable`.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Storage seam for incident records. Persistence technology is deliberately
/// unspecified; the in-memory implementation below backs the server and the
/// tests, and a durable backend only has to honor whole-record semantics.
pub trait IncidentStore: Send + Sync {
    fn load(&self, id: &Uuid) -> Result<Option<Incident>, StoreError>;
    fn load_by_number(&self, incident_number: &str) -> Result<Option<Incident>, StoreError>;
    fn load_all(&self) -> Result<Vec<Incident>, StoreError>;
    fn save(&self, incident: &Incident) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Uuid, Incident>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IncidentStore for MemoryStore {
    fn load(&self, id: &Uuid) -> Result<Option<Incident>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError("store lock poisoned".to_string()))?;
        Ok(records.get(id).cloned())
    }

    fn load_by_number(&self, incident_number: &str) -> Result<Option<Incident>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError("store lock poisoned".to_string()))?;
        Ok(records
            .values()
            .find(|incident| incident.incident_number == incident_number)
            .cloned())
    }

    fn load_all(&self) -> Result<Vec<Incident>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError("store lock poisoned".to_string()))?;
        Ok(records.values().cloned().collect())
    }

    fn save(&self, incident: &Incident) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError("store lock poisoned".to_string()))?;
        records.insert(incident.id, incident.clone());
        Ok(())
    }
}
