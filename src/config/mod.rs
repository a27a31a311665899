use dotenvy::dotenv;
use std::env;

use crate::directory::{DirectoryUser, Role};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub incidents: IncidentConfig,
    pub directory_users: Vec<DirectoryUser>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct IncidentConfig {
    /// Fraction of the initial-assessment checklist that must be complete
    /// before root-cause analysis can be recorded.
    pub checklist_gate_ratio: f64,
    /// Days an incident may sit under investigation before it counts as
    /// overdue in the stats.
    pub investigation_sla_days: i64,
    /// How far ahead the follow-up list looks when collecting incidents
    /// whose follow-up date is coming due.
    pub follow_up_window_days: i64,
}

impl Default for IncidentConfig {
    fn default() -> Self {
        Self {
            checklist_gate_ratio: 0.70,
            investigation_sla_days: 30,
            follow_up_window_days: 7,
        }
    }
}

fn get_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        dotenv().ok();

        let defaults = IncidentConfig::default();
        Ok(Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: get_parsed("SERVER_PORT", 8080),
            },
            incidents: IncidentConfig {
                checklist_gate_ratio: get_parsed(
                    "INCIDENT_CHECKLIST_GATE_RATIO",
                    defaults.checklist_gate_ratio,
                ),
                investigation_sla_days: get_parsed(
                    "INCIDENT_INVESTIGATION_SLA_DAYS",
                    defaults.investigation_sla_days,
                ),
                follow_up_window_days: get_parsed(
                    "INCIDENT_FOLLOW_UP_WINDOW_DAYS",
                    defaults.follow_up_window_days,
                ),
            },
            directory_users: Self::load_directory_users()?,
        })
    }

    /// `DIRECTORY_USERS` holds a JSON array of users with roles. The
    /// fallback set keeps a fresh checkout usable without any setup.
    fn load_directory_users() -> anyhow::Result<Vec<DirectoryUser>> {
        match env::var("DIRECTORY_USERS") {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(_) => Ok(vec![
                DirectoryUser {
                    user_id: "admin".to_string(),
                    name: "Administrator".to_string(),
                    roles: vec![Role::Admin],
                },
                DirectoryUser {
                    user_id: "investigator".to_string(),
                    name: "Duty Investigator".to_string(),
                    roles: vec![Role::Investigator],
                },
                DirectoryUser {
                    user_id: "staff".to_string(),
                    name: "Staff Member".to_string(),
                    roles: vec![Role::Staff],
                },
            ]),
        }
    }
}
