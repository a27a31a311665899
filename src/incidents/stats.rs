//! Read-only aggregation over incident snapshots: the dashboard stats
//! block, trend analysis over a date window, and the high-severity open
//! watchlist.

use chrono::{DateTime, Datelike, Utc};
use std::collections::HashMap;

use super::types::{
    Incident, IncidentStats, IncidentStatus, IncidentSummary, IncidentType, Severity,
    TrendAnalysis, TrendAnalysisQuery, TrendSummary,
};

const RECENT_LIMIT: usize = 10;

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn resolution_days(incident: &Incident) -> Option<f64> {
    let closed_at = incident.closed_at?;
    let elapsed = closed_at.signed_duration_since(incident.reported_at);
    Some(elapsed.num_seconds() as f64 / 86_400.0)
}

fn average_resolution_days<'a>(incidents: impl Iterator<Item = &'a Incident>) -> f64 {
    let durations: Vec<f64> = incidents.filter_map(resolution_days).collect();
    if durations.is_empty() {
        return 0.0;
    }
    round_one_decimal(durations.iter().sum::<f64>() / durations.len() as f64)
}

/// Dashboard counters over the full incident set. Every enum bucket is
/// present even when zero so consumers never branch on missing keys.
pub fn compute_stats(incidents: &[Incident], sla_days: i64, now: DateTime<Utc>) -> IncidentStats {
    let mut by_severity: HashMap<String, u64> = Severity::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    let mut by_status: HashMap<String, u64> = IncidentStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    let mut by_type: HashMap<String, u64> = IncidentType::ALL
        .iter()
        .map(|t| (t.as_str().to_string(), 0))
        .collect();

    let mut open_incidents = 0;
    let mut overdue_investigations = 0;
    for incident in incidents {
        *by_severity
            .entry(incident.severity.as_str().to_string())
            .or_default() += 1;
        *by_status
            .entry(incident.status.as_str().to_string())
            .or_default() += 1;
        *by_type
            .entry(incident.incident_type.as_str().to_string())
            .or_default() += 1;
        if !incident.status.is_closed() {
            open_incidents += 1;
        }
        if incident.status == IncidentStatus::UnderInvestigation
            && now.signed_duration_since(incident.reported_at).num_days() > sla_days
        {
            overdue_investigations += 1;
        }
    }

    IncidentStats {
        total: incidents.len() as u64,
        by_severity,
        by_status,
        by_type,
        open_incidents,
        average_resolution_time: average_resolution_days(incidents.iter()),
        overdue_investigations,
    }
}

fn trend_matches(incident: &Incident, query: &TrendAnalysisQuery) -> bool {
    if incident.incident_date < query.start_date || incident.incident_date > query.end_date {
        return false;
    }
    if let Some(ref incident_type) = query.incident_type {
        if incident.incident_type.as_str() != incident_type.to_lowercase() {
            return false;
        }
    }
    if let Some(ref severity) = query.severity {
        if incident.severity.as_str() != severity.to_lowercase() {
            return false;
        }
    }
    if let Some(ref location) = query.location {
        let needle = location.to_lowercase();
        match &incident.location {
            Some(haystack) if haystack.to_lowercase().contains(&needle) => {}
            _ => return false,
        }
    }
    true
}

/// Breakdown of incidents in a date window by type, severity, calendar
/// month, location and status, plus the most recent entries.
pub fn trend_analysis(incidents: &[Incident], query: &TrendAnalysisQuery) -> TrendAnalysis {
    let mut matched: Vec<&Incident> = incidents
        .iter()
        .filter(|incident| trend_matches(incident, query))
        .collect();
    matched.sort_by(|a, b| b.incident_date.cmp(&a.incident_date));

    let mut by_type: HashMap<String, u64> = HashMap::new();
    let mut by_severity: HashMap<String, u64> = HashMap::new();
    let mut by_month: HashMap<String, u64> = HashMap::new();
    let mut by_location: HashMap<String, u64> = HashMap::new();
    let mut status_breakdown: HashMap<String, u64> = HashMap::new();
    for incident in &matched {
        *by_type
            .entry(incident.incident_type.as_str().to_string())
            .or_default() += 1;
        *by_severity
            .entry(incident.severity.as_str().to_string())
            .or_default() += 1;
        let month = format!(
            "{:04}-{:02}",
            incident.incident_date.year(),
            incident.incident_date.month()
        );
        *by_month.entry(month).or_default() += 1;
        let location = incident
            .location
            .clone()
            .unwrap_or_else(|| "unspecified".to_string());
        *by_location.entry(location).or_default() += 1;
        *status_breakdown
            .entry(incident.status.as_str().to_string())
            .or_default() += 1;
    }

    TrendAnalysis {
        summary: TrendSummary {
            total_incidents: matched.len() as u64,
            start_date: query.start_date,
            end_date: query.end_date,
            average_resolution_days: average_resolution_days(matched.iter().copied()),
        },
        by_type,
        by_severity,
        by_month,
        by_location,
        status_breakdown,
        recent_incidents: matched
            .iter()
            .take(RECENT_LIMIT)
            .map(|incident| IncidentSummary::from_incident(incident))
            .collect(),
    }
}

/// Open incidents whose follow-up date is already due or falls within the
/// configured window, soonest first. Closed incidents and incidents with a
/// signed-off investigation drop out.
pub fn requiring_follow_up(
    incidents: &[Incident],
    window_days: i64,
    now: DateTime<Utc>,
) -> Vec<IncidentSummary> {
    let horizon = now + chrono::Duration::days(window_days);
    let mut due: Vec<&Incident> = incidents
        .iter()
        .filter(|incident| {
            if incident.status.is_closed() {
                return false;
            }
            if incident
                .investigation
                .as_ref()
                .is_some_and(|inv| inv.signed_off)
            {
                return false;
            }
            incident
                .follow_up_date
                .is_some_and(|follow_up| follow_up <= horizon)
        })
        .collect();
    due.sort_by_key(|incident| incident.follow_up_date);
    due.into_iter().map(IncidentSummary::from_incident).collect()
}

/// Open high/critical incidents, most severe first, newest first within a
/// severity.
pub fn high_severity_open(incidents: &[Incident]) -> Vec<IncidentSummary> {
    let mut urgent: Vec<&Incident> = incidents
        .iter()
        .filter(|incident| incident.severity.is_urgent() && !incident.status.is_closed())
        .collect();
    urgent.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then(b.incident_date.cmp(&a.incident_date))
    });
    urgent
        .into_iter()
        .map(IncidentSummary::from_incident)
        .collect()
}
