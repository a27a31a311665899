//! Report exports for offline review. Incidents flatten to one row per
//! record; the owned investigation and timeline stay in the JSON export
//! only.

use crate::incidents::error::IncidentError;
use crate::incidents::types::Incident;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
        }
    }
}

pub fn export_incidents(
    incidents: &[Incident],
    format: ExportFormat,
) -> Result<Vec<u8>, IncidentError> {
    match format {
        ExportFormat::Json => serde_json::to_vec_pretty(incidents)
            .map_err(|e| IncidentError::Internal(format!("JSON export failed: {e}"))),
        ExportFormat::Csv => export_csv(incidents),
    }
}

fn export_csv(incidents: &[Incident]) -> Result<Vec<u8>, IncidentError> {
    let mut writer = csv::Writer::from_writer(vec![]);
    let io_err = |e: csv::Error| IncidentError::Internal(format!("CSV export failed: {e}"));

    writer
        .write_record([
            "Number",
            "Title",
            "Type",
            "Severity",
            "Status",
            "Location",
            "Incident Date",
            "Reported By",
            "Assigned To",
            "Closed At",
        ])
        .map_err(io_err)?;

    for incident in incidents {
        writer
            .write_record([
                incident.incident_number.clone(),
                incident.title.clone(),
                incident.incident_type.to_string(),
                incident.severity.to_string(),
                incident.status.to_string(),
                incident.location.clone().unwrap_or_default(),
                incident.incident_date.to_rfc3339(),
                incident.reported_by.clone(),
                incident.assigned_to.clone().unwrap_or_default(),
                incident
                    .closed_at
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_default(),
            ])
            .map_err(io_err)?;
    }

    writer
        .into_inner()
        .map_err(|e| IncidentError::Internal(format!("CSV export failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incidents::types::{IncidentStatus, IncidentType, Severity};
    use chrono::Utc;
    use uuid::Uuid;

    fn incident() -> Incident {
        let now = Utc::now();
        Incident {
            id: Uuid::new_v4(),
            incident_number: "INC-20260101-0001".to_string(),
            incident_type: IncidentType::Safety,
            severity: Severity::High,
            status: IncidentStatus::Reported,
            title: "Spill in Hallway".to_string(),
            description: "Water spill near entrance".to_string(),
            location: Some("2F".to_string()),
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
    fn csv_has_header_and_one_row_per_incident() {
        let bytes = export_incidents(&[incident(), incident()], ExportFormat::Csv).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Number,Title"));
        assert!(lines[1].contains("INC-20260101-0001"));
        assert!(lines[1].contains("safety"));
    }

    #[test]
    fn json_round_trips_full_records() {
        let bytes = export_incidents(&[incident()], ExportFormat::Json).unwrap();
        let parsed: Vec<Incident> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].incident_number, "INC-20260101-0001");
    }

    #[test]
    fn unknown_format_is_rejected_at_parse() {
        assert_eq!(ExportFormat::from_str("CSV"), Some(ExportFormat::Csv));
        assert!(ExportFormat::from_str("xlsx").is_none());
    }
}
