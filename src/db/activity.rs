use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::db::profiles;
use crate::models::{ActivityLog, Role};
use crate::rollup::DateWindow;

fn log_from_row(row: &PgRow) -> ActivityLog {
    ActivityLog {
        agent_id: row.get("agent_id"),
        log_date: row.get("log_date"),
        dials: row.get("dials"),
        pickups: row.get("pickups"),
        quotes: row.get("quotes"),
        applications: row.get("applications"),
        talk_time_minutes: row.get("talk_time_minutes"),
        total_premium: row.get("total_premium"),
    }
}

// Concurrent first writes for the same day race on the unique key; the
// loser's insert lands as an update, so the last submission wins either way.
pub async fn upsert_activity(
    pool: &PgPool,
    agent_id: Uuid,
    log_date: NaiveDate,
    dials: i32,
    pickups: i32,
    quotes: i32,
    talk_time_minutes: i32,
) -> anyhow::Result<ActivityLog> {
    let row = sqlx::query(
        r#"
        INSERT INTO agency_tracker.activity_logs
        (id, agent_id, log_date, dials, pickups, quotes, talk_time_minutes)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (agent_id, log_date) DO UPDATE
        SET dials = EXCLUDED.dials,
            pickups = EXCLUDED.pickups,
            quotes = EXCLUDED.quotes,
            talk_time_minutes = EXCLUDED.talk_time_minutes,
            updated_at = now()
        RETURNING agent_id, log_date, dials, pickups, quotes, applications,
                  talk_time_minutes, total_premium
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(agent_id)
    .bind(log_date)
    .bind(dials)
    .bind(pickups)
    .bind(quotes)
    .bind(talk_time_minutes)
    .fetch_one(pool)
    .await?;

    Ok(log_from_row(&row))
}

// Runs inside the record-sale transaction so the application row and the
// day's counters move together.
pub(crate) async fn apply_sale_to_day(
    conn: &mut PgConnection,
    agent_id: Uuid,
    app_date: NaiveDate,
    premium: Decimal,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO agency_tracker.activity_logs AS al
        (id, agent_id, log_date, applications, total_premium)
        VALUES ($1, $2, $3, 1, $4)
        ON CONFLICT (agent_id, log_date) DO UPDATE
        SET applications = al.applications + 1,
            total_premium = al.total_premium + EXCLUDED.total_premium,
            updated_at = now()
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(agent_id)
    .bind(app_date)
    .bind(premium)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn fetch_logs_between(
    pool: &PgPool,
    agent_id: Uuid,
    window: &DateWindow,
) -> anyhow::Result<Vec<ActivityLog>> {
    let rows = sqlx::query(
        "SELECT agent_id, log_date, dials, pickups, quotes, applications, \
         talk_time_minutes, total_premium \
         FROM agency_tracker.activity_logs \
         WHERE agent_id = $1 AND log_date BETWEEN $2 AND $3 \
         ORDER BY log_date",
    )
    .bind(agent_id)
    .bind(window.start)
    .bind(window.end)
    .fetch_all(pool)
    .await?;

    let mut logs = Vec::new();
    for row in rows {
        logs.push(log_from_row(&row));
    }
    Ok(logs)
}

pub async fn fetch_team_logs(
    pool: &PgPool,
    agent_ids: &[Uuid],
    window: &DateWindow,
) -> anyhow::Result<Vec<ActivityLog>> {
    if agent_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query(
        "SELECT agent_id, log_date, dials, pickups, quotes, applications, \
         talk_time_minutes, total_premium \
         FROM agency_tracker.activity_logs \
         WHERE agent_id = ANY($1) AND log_date BETWEEN $2 AND $3 \
         ORDER BY log_date",
    )
    .bind(agent_ids)
    .bind(window.start)
    .bind(window.end)
    .fetch_all(pool)
    .await?;

    tracing::debug!(
        agents = agent_ids.len(),
        rows = rows.len(),
        "fetched team activity"
    );

    let mut logs = Vec::new();
    for row in rows {
        logs.push(log_from_row(&row));
    }
    Ok(logs)
}

pub async fn fetch_last_activity_map(
    pool: &PgPool,
    agent_ids: &[Uuid],
) -> anyhow::Result<HashMap<Uuid, NaiveDate>> {
    if agent_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query(
        "SELECT agent_id, MAX(log_date) AS last_logged \
         FROM agency_tracker.activity_logs \
         WHERE agent_id = ANY($1) \
         GROUP BY agent_id",
    )
    .bind(agent_ids)
    .fetch_all(pool)
    .await?;

    let mut last_logged: HashMap<Uuid, NaiveDate> = HashMap::new();
    for row in rows {
        last_logged.insert(row.get("agent_id"), row.get("last_logged"));
    }
    Ok(last_logged)
}

pub async fn import_activity_csv(pool: &PgPool, csv_path: &Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        agent_email: String,
        log_date: NaiveDate,
        #[serde(default)]
        dials: i32,
        #[serde(default)]
        pickups: i32,
        #[serde(default)]
        quotes: i32,
        #[serde(default)]
        talk_time_minutes: i32,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut imported = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let profile = profiles::fetch_profile_by_email(pool, &row.agent_email).await?;
        profiles::expect_role(&profile, Role::Agent)?;

        upsert_activity(
            pool,
            profile.id,
            row.log_date,
            row.dials,
            row.pickups,
            row.quotes,
            row.talk_time_minutes,
        )
        .await?;
        imported += 1;
    }

    tracing::info!(rows = imported, "imported activity logs");
    Ok(imported)
}
