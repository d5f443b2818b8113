use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

pub const CARRIERS: [&str; 14] = [
    "Aflac",
    "Aetna",
    "American Amicable",
    "Americo",
    "Baltimore Life",
    "Corebridge AIG",
    "Ethos",
    "Foresters",
    "Gerber",
    "Mutual of Omaha",
    "National Life Group",
    "Royal Neighbors",
    "SBLI",
    "Transamerica",
];

pub fn canonical_carrier(input: &str) -> Option<&'static str> {
    let trimmed = input.trim();
    CARRIERS
        .iter()
        .find(|carrier| carrier.eq_ignore_ascii_case(trimmed))
        .copied()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Agent,
    Manager,
    SuperAdmin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Agent => "agent",
            Role::Manager => "manager",
            Role::SuperAdmin => "super_admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "agent" => Ok(Role::Agent),
            "manager" => Ok(Role::Manager),
            "super_admin" | "super-admin" | "superadmin" => Ok(Role::SuperAdmin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApplicationStatus {
    Pending,
    Issued,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Issued => "Issued",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "issued" => Ok(ApplicationStatus::Issued),
            other => Err(format!("unknown application status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub manager_id: Option<Uuid>,
    pub agency_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityLog {
    pub agent_id: Uuid,
    pub log_date: NaiveDate,
    pub dials: i32,
    pub pickups: i32,
    pub quotes: i32,
    pub applications: i32,
    pub talk_time_minutes: i32,
    pub total_premium: Decimal,
}

impl ActivityLog {
    pub fn blank(agent_id: Uuid, log_date: NaiveDate) -> Self {
        Self {
            agent_id,
            log_date,
            dials: 0,
            pickups: 0,
            quotes: 0,
            applications: 0,
            talk_time_minutes: 0,
            total_premium: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Application {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub app_date: NaiveDate,
    pub client_name: Option<String>,
    pub carrier: Option<String>,
    pub annualized_premium: Decimal,
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignupCode {
    pub code: String,
    pub manager_id: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateTotals {
    pub dials: i64,
    pub pickups: i64,
    pub quotes: i64,
    pub applications: i64,
    pub total_premium: Decimal,
    pub pickup_rate: f64,
    pub quote_rate: f64,
    pub close_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carrier_lookup_is_case_insensitive() {
        assert_eq!(canonical_carrier("mutual of omaha"), Some("Mutual of Omaha"));
        assert_eq!(canonical_carrier("  SBLI  "), Some("SBLI"));
        assert_eq!(canonical_carrier("corebridge aig"), Some("Corebridge AIG"));
    }

    #[test]
    fn unknown_carrier_is_rejected() {
        assert_eq!(canonical_carrier("Acme Life"), None);
        assert_eq!(canonical_carrier(""), None);
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("pending".parse(), Ok(ApplicationStatus::Pending));
        assert_eq!("Issued".parse(), Ok(ApplicationStatus::Issued));
        assert!("closed".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn role_round_trips_through_strings() {
        for role in [Role::Agent, Role::Manager, Role::SuperAdmin] {
            assert_eq!(role.as_str().parse(), Ok(role));
        }
        assert!("owner".parse::<Role>().is_err());
    }
}
