use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ApplicationStatus, Role};

mod activity;
mod codes;
mod profiles;
mod sales;

pub use activity::{
    fetch_last_activity_map, fetch_logs_between, fetch_team_logs, import_activity_csv,
    upsert_activity,
};
pub use codes::{ensure_signup_code, resolve_code, signup_url};
pub use profiles::{
    create_agent, create_manager, expect_role, fetch_agents_of_manager, fetch_profile_by_email,
    fetch_profile_by_id, fetch_profiles_by_role, link_agent, unlink_agent, update_profile,
};
pub use sales::{delete_sale, edit_sale, fetch_applications, record_sale};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("write conflict on {entity} ({key}), retry the operation")]
    WriteConflict { entity: &'static str, key: String },
    #[error("no profile found for {0}")]
    ProfileNotFound(String),
    #[error("{email} has role {found}, expected {expected}")]
    WrongRole {
        email: String,
        expected: Role,
        found: Role,
    },
    #[error("no application found with id {0}")]
    ApplicationNotFound(Uuid),
    #[error("signup code {0} is not active")]
    InvalidSignupCode(String),
    #[error("unknown carrier: {0}")]
    UnknownCarrier(String),
    #[error("annualized premium must be positive, got {0}")]
    InvalidPremium(Decimal),
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

pub(crate) fn map_conflict(err: sqlx::Error, entity: &'static str, key: &str) -> anyhow::Error {
    if is_unique_violation(&err) {
        anyhow::Error::new(StoreError::WriteConflict {
            entity,
            key: key.to_string(),
        })
    } else {
        anyhow::Error::new(err)
    }
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let dana = Uuid::parse_str("4f9c2a17-85d3-4e2b-9c41-7d2a90b63e55")?;
    let marcus = Uuid::parse_str("1a7e3f52-c9b4-4d18-8e72-5b90c1f4d203")?;
    let priya = Uuid::parse_str("83d5b6c0-1f27-4a99-b0e4-96c3a8d17f42")?;
    let jordan = Uuid::parse_str("c2e84b9a-7d06-4f53-a1d8-30b5e7c92f16")?;
    let tessa = Uuid::parse_str("5d91c7e3-b2a8-4c64-8f05-d47a16e9b328")?;
    let avery = Uuid::parse_str("e6a05d28-94cf-4b71-9a3c-1e82f7d05c64")?;

    let profiles = vec![
        (
            dana,
            "dana.whitfield@harborlight.com",
            "Dana Whitfield",
            "manager",
            None,
            Some("Harborlight Financial Group"),
        ),
        (
            marcus,
            "marcus.chen@harborlight.com",
            "Marcus Chen",
            "agent",
            Some(dana),
            None,
        ),
        (
            priya,
            "priya.raman@harborlight.com",
            "Priya Raman",
            "agent",
            Some(dana),
            None,
        ),
        (
            jordan,
            "jordan.ellis@harborlight.com",
            "Jordan Ellis",
            "agent",
            Some(dana),
            None,
        ),
        (
            tessa,
            "tessa.nguyen@fairwindlife.com",
            "Tessa Nguyen",
            "agent",
            None,
            None,
        ),
        (
            avery,
            "avery.sorensen@agencytracker.com",
            "Avery Sorensen",
            "super_admin",
            None,
            None,
        ),
    ];

    for (id, email, full_name, role, manager_id, agency_name) in profiles {
        sqlx::query(
            r#"
            INSERT INTO agency_tracker.profiles (id, email, full_name, role, manager_id, agency_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                role = EXCLUDED.role,
                manager_id = EXCLUDED.manager_id,
                agency_name = EXCLUDED.agency_name
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(full_name)
        .bind(role)
        .bind(manager_id)
        .bind(agency_name)
        .execute(pool)
        .await?;
    }

    let logs = vec![
        ("marcus.chen@harborlight.com", (2026, 1, 28), 55, 18, 5, 80),
        ("marcus.chen@harborlight.com", (2026, 1, 29), 47, 15, 4, 70),
        ("marcus.chen@harborlight.com", (2026, 2, 2), 62, 21, 6, 95),
        ("marcus.chen@harborlight.com", (2026, 2, 3), 58, 19, 5, 90),
        ("marcus.chen@harborlight.com", (2026, 2, 9), 64, 23, 7, 105),
        ("priya.raman@harborlight.com", (2026, 2, 1), 38, 12, 3, 55),
        ("tessa.nguyen@fairwindlife.com", (2026, 2, 9), 71, 26, 8, 120),
    ];

    for (email, (year, month, day), dials, pickups, quotes, talk_time) in logs {
        let agent_id: Uuid = sqlx::query("SELECT id FROM agency_tracker.profiles WHERE email = $1")
            .bind(email)
            .fetch_one(pool)
            .await?
            .get("id");

        let log_date = NaiveDate::from_ymd_opt(year, month, day).context("invalid date")?;
        activity::upsert_activity(pool, agent_id, log_date, dials, pickups, quotes, talk_time)
            .await?;
    }

    let sales = vec![
        (
            "9f3b1c58-2d7e-4a06-b4c9-e815f0d7a263",
            "marcus.chen@harborlight.com",
            (2026, 2, 3),
            "R. Alvarez",
            "Americo",
            "1800.00",
            ApplicationStatus::Pending,
        ),
        (
            "2c8a7e94-f1b5-4d30-8a67-c59d3e21b784",
            "marcus.chen@harborlight.com",
            (2026, 2, 9),
            "L. Okafor",
            "Mutual of Omaha",
            "2450.00",
            ApplicationStatus::Issued,
        ),
        (
            "6e4d90a2-3c81-4f57-9b20-a7f6c8e45d19",
            "tessa.nguyen@fairwindlife.com",
            (2026, 2, 9),
            "D. Kim",
            "Transamerica",
            "1275.50",
            ApplicationStatus::Pending,
        ),
    ];

    for (app_id, email, (year, month, day), client, carrier, premium, status) in sales {
        let agent_id: Uuid = sqlx::query("SELECT id FROM agency_tracker.profiles WHERE email = $1")
            .bind(email)
            .fetch_one(pool)
            .await?
            .get("id");

        let app_date = NaiveDate::from_ymd_opt(year, month, day).context("invalid date")?;
        sales::insert_sale_if_absent(
            pool,
            Uuid::parse_str(app_id)?,
            agent_id,
            app_date,
            client,
            carrier,
            premium.parse::<Decimal>()?,
            status,
        )
        .await?;
    }

    sqlx::query(
        "INSERT INTO agency_tracker.manager_signup_codes (code, manager_id) \
         SELECT 'HARBOR26', id FROM agency_tracker.profiles WHERE email = $1 \
         ON CONFLICT (code) DO NOTHING",
    )
    .bind("dana.whitfield@harborlight.com")
    .execute(pool)
    .await?;

    Ok(())
}
