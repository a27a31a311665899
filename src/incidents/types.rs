use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::gate::Completable;

/// Distinguishes an absent field from an explicit `null` in partial
/// updates: missing stays `None`, `null` becomes `Some(None)` (clear).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IncidentType {
    Safety,
    Clinical,
    Security,
    Equipment,
    Emergency,
    Other,
}

impl IncidentType {
    pub const ALL: [IncidentType; 6] = [
        Self::Safety,
        Self::Clinical,
        Self::Security,
        Self::Equipment,
        Self::Emergency,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safety => "safety",
            Self::Clinical => "clinical",
            Self::Security => "security",
            Self::Equipment => "equipment",
            Self::Emergency => "emergency",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for IncidentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for IncidentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "safety" => Ok(Self::Safety),
            "clinical" => Ok(Self::Clinical),
            "security" => Ok(Self::Security),
            "equipment" => Ok(Self::Equipment),
            "emergency" => Ok(Self::Emergency),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown incident type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn is_urgent(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("Unknown severity: {s}")),
        }
    }
}

/// Incident lifecycle status. Transitions are only legal along the
/// consecutive forward edges returned by [`IncidentStatus::next_status`];
/// free-form assignment goes through the separately audited status override.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Reported,
    UnderInvestigation,
    CorrectiveAction,
    Resolved,
    Closed,
}

impl IncidentStatus {
    pub const ALL: [IncidentStatus; 5] = [
        Self::Reported,
        Self::UnderInvestigation,
        Self::CorrectiveAction,
        Self::Resolved,
        Self::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reported => "reported",
            Self::UnderInvestigation => "under_investigation",
            Self::CorrectiveAction => "corrective_action",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    pub fn next_status(&self) -> Option<Self> {
        match self {
            Self::Reported => Some(Self::UnderInvestigation),
            Self::UnderInvestigation => Some(Self::CorrectiveAction),
            Self::CorrectiveAction => Some(Self::Resolved),
            Self::Resolved => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl std::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for IncidentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reported" => Ok(Self::Reported),
            "under_investigation" => Ok(Self::UnderInvestigation),
            "corrective_action" => Ok(Self::CorrectiveAction),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            _ => Err(format!("Unknown status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Corrective,
    Preventive,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Corrective => "corrective",
            Self::Preventive => "preventive",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "corrective" => Ok(Self::Corrective),
            "preventive" => Ok(Self::Preventive),
            _ => Err(format!("Unknown action kind: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    InProgress,
    Completed,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ActionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Unknown action status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonInvolved {
    pub person_ref: String,
    pub name: String,
    pub role: String,
}

/// A corrective or preventive remediation step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Action {
    pub id: Uuid,
    pub description: String,
    pub responsible: String,
    pub due_date: DateTime<Utc>,
    pub status: ActionStatus,
    pub completed_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecklistItem {
    pub id: u32,
    pub text: String,
    pub completed: bool,
}

impl Completable for ChecklistItem {
    fn is_complete(&self) -> bool {
        self.completed
    }
}

/// One immutable audit record of a state-affecting operation. `sequence`
/// breaks ordering ties between events recorded at the same instant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineEvent {
    pub id: Uuid,
    pub action: String,
    pub performed_by: String,
    pub performed_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub sequence: u64,
}

/// The owned sub-record capturing root-cause analysis and remediation for
/// one incident. Created on first assignment or on an explicit
/// start-investigation call, whichever comes first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Investigation {
    pub id: Uuid,
    pub incident_id: Uuid,
    pub investigator: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub checklist: Vec<ChecklistItem>,
    pub root_cause: Option<String>,
    pub corrective_actions: Vec<Action>,
    pub preventive_actions: Vec<Action>,
    pub evidence: Vec<String>,
    pub signed_off: bool,
    pub signed_off_by: Option<String>,
    pub signed_off_at: Option<DateTime<Utc>>,
}

/// Initial assessment checklist established at investigation start, taken
/// from the standard investigation procedure.
pub const DEFAULT_CHECKLIST: [&str; 6] = [
    "Interview witnesses",
    "Review documentation",
    "Inspect physical evidence",
    "Analyze contributing factors",
    "Identify root cause",
    "Document findings",
];

impl Investigation {
    pub fn new(incident_id: Uuid, investigator: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            incident_id,
            investigator,
            started_at: now,
            completed_at: None,
            notes: None,
            checklist: DEFAULT_CHECKLIST
                .iter()
                .enumerate()
                .map(|(idx, text)| ChecklistItem {
                    id: idx as u32,
                    text: (*text).to_string(),
                    completed: false,
                })
                .collect(),
            root_cause: None,
            corrective_actions: Vec::new(),
            preventive_actions: Vec::new(),
            evidence: Vec::new(),
            signed_off: false,
            signed_off_by: None,
            signed_off_at: None,
        }
    }

    pub fn actions(&self, kind: ActionKind) -> &[Action] {
        match kind {
            ActionKind::Corrective => &self.corrective_actions,
            ActionKind::Preventive => &self.preventive_actions,
        }
    }

    pub fn actions_mut(&mut self, kind: ActionKind) -> &mut Vec<Action> {
        match kind {
            ActionKind::Corrective => &mut self.corrective_actions,
            ActionKind::Preventive => &mut self.preventive_actions,
        }
    }
}

/// A reported event tracked through the fixed resolution workflow.
/// `version` is the optimistic-concurrency token checked and incremented on
/// every successful mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Incident {
    pub id: Uuid,
    pub incident_number: String,
    pub incident_type: IncidentType,
    pub severity: Severity,
    pub status: IncidentStatus,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub incident_date: DateTime<Utc>,
    pub reported_by: String,
    pub reported_at: DateTime<Utc>,
    pub assigned_to: Option<String>,
    pub people_involved: Vec<PersonInvolved>,
    pub photos: Vec<String>,
    pub immediate_actions: Option<String>,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub closure_notes: Option<String>,
    pub closed_at: Option<DateTime<Utc>>,
    pub investigation: Option<Investigation>,
    pub timeline: Vec<TimelineEvent>,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentFilter {
    pub severities: Vec<Severity>,
    pub statuses: Vec<IncidentStatus>,
    pub incident_type: Option<IncidentType>,
    pub assigned_to: Option<String>,
    pub reported_by: Option<String>,
    pub incident_date_from: Option<DateTime<Utc>>,
    pub incident_date_to: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

impl IncidentFilter {
    pub fn matches(&self, incident: &Incident) -> bool {
        if !self.severities.is_empty() && !self.severities.contains(&incident.severity) {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&incident.status) {
            return false;
        }
        if let Some(incident_type) = self.incident_type {
            if incident.incident_type != incident_type {
                return false;
            }
        }
        if let Some(ref assigned_to) = self.assigned_to {
            if incident.assigned_to.as_deref() != Some(assigned_to.as_str()) {
                return false;
            }
        }
        if let Some(ref reported_by) = self.reported_by {
            if &incident.reported_by != reported_by {
                return false;
            }
        }
        if let Some(from) = self.incident_date_from {
            if incident.incident_date < from {
                return false;
            }
        }
        if let Some(to) = self.incident_date_to {
            if incident.incident_date > to {
                return false;
            }
        }
        if let Some(ref location) = self.location {
            let needle = location.to_lowercase();
            match &incident.location {
                Some(haystack) if haystack.to_lowercase().contains(&needle) => {}
                _ => return false,
            }
        }
        true
    }
}

// === REQUEST / RESPONSE SHAPES ===

#[derive(Debug, Deserialize)]
pub struct CreateIncidentRequest {
    pub incident_type: IncidentType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub incident_date: Option<DateTime<Utc>>,
    pub people_involved: Option<Vec<PersonInvolved>>,
    pub photos: Option<Vec<String>>,
    pub immediate_actions: Option<String>,
    pub follow_up_date: Option<DateTime<Utc>>,
}

/// Partial update. The nullable fields use the double-`Option` encoding:
/// omit to keep, send `null` to clear, send a value to set.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateIncidentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    pub incident_date: Option<DateTime<Utc>>,
    pub people_involved: Option<Vec<PersonInvolved>>,
    pub photos: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub immediate_actions: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub follow_up_date: Option<Option<DateTime<Utc>>>,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct AssignInvestigatorRequest {
    pub investigator: String,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransitionRequest {
    pub expected_version: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResolveIncidentRequest {
    pub resolution_notes: Option<String>,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CloseIncidentRequest {
    pub closure_notes: String,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct OverrideStatusRequest {
    pub status: IncidentStatus,
    pub justification: String,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ReclassifyRequest {
    pub incident_type: Option<IncidentType>,
    pub severity: Option<Severity>,
    pub justification: String,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RootCauseRequest {
    pub root_cause: String,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct InvestigationNotesRequest {
    pub notes: String,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct AddActionRequest {
    pub kind: ActionKind,
    pub description: String,
    pub responsible: String,
    pub due_date: DateTime<Utc>,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateActionStatusRequest {
    pub status: ActionStatus,
    pub completed_date: Option<DateTime<Utc>>,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignOffRequest {
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct AttachEvidenceRequest {
    pub reference: String,
    pub expected_version: Option<u64>,
}

/// Raw query parameters for the list endpoint. `severity` and `status`
/// accept comma-separated sets; anything outside the declared enums is
/// rejected at the boundary.
#[derive(Debug, Default, Deserialize)]
pub struct ListIncidentsQuery {
    pub severity: Option<String>,
    pub status: Option<String>,
    pub incident_type: Option<String>,
    pub assigned_to: Option<String>,
    pub reported_by: Option<String>,
    pub incident_date_from: Option<DateTime<Utc>>,
    pub incident_date_to: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IncidentListResponse {
    pub count: usize,
    pub incidents: Vec<IncidentSummary>,
}

#[derive(Debug, Serialize)]
pub struct IncidentSummary {
    pub id: Uuid,
    pub incident_number: String,
    pub title: String,
    pub incident_type: IncidentType,
    pub severity: Severity,
    pub status: IncidentStatus,
    pub assigned_to: Option<String>,
    pub reported_by: String,
    pub incident_date: DateTime<Utc>,
}

impl IncidentSummary {
    pub fn from_incident(incident: &Incident) -> Self {
        Self {
            id: incident.id,
            incident_number: incident.incident_number.clone(),
            title: incident.title.clone(),
            incident_type: incident.incident_type,
            severity: incident.severity,
            status: incident.status,
            assigned_to: incident.assigned_to.clone(),
            reported_by: incident.reported_by.clone(),
            incident_date: incident.incident_date,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct IncidentStats {
    pub total: u64,
    pub by_severity: HashMap<String, u64>,
    pub by_status: HashMap<String, u64>,
    pub by_type: HashMap<String, u64>,
    pub open_incidents: u64,
    /// Mean of `closed_at - reported_at` in days over closed incidents,
    /// rounded to one decimal. Reported as `0.0` when nothing has closed.
    pub average_resolution_time: f64,
    pub overdue_investigations: u64,
}

#[derive(Debug, Deserialize)]
pub struct TrendAnalysisQuery {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub incident_type: Option<String>,
    pub severity: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrendSummary {
    pub total_incidents: u64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub average_resolution_days: f64,
}

#[derive(Debug, Serialize)]
pub struct TrendAnalysis {
    pub summary: TrendSummary,
    pub by_type: HashMap<String, u64>,
    pub by_severity: HashMap<String, u64>,
    pub by_month: HashMap<String, u64>,
    pub by_location: HashMap<String, u64>,
    pub status_breakdown: HashMap<String, u64>,
    pub recent_incidents: Vec<IncidentSummary>,
}
