use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::db::{activity, map_conflict, StoreError};
use crate::models::{canonical_carrier, Application, ApplicationStatus};

fn app_from_row(row: &PgRow) -> anyhow::Result<Application> {
    let status_raw: String = row.get("status");
    let status = status_raw
        .parse::<ApplicationStatus>()
        .map_err(anyhow::Error::msg)?;

    Ok(Application {
        id: row.get("id"),
        agent_id: row.get("agent_id"),
        app_date: row.get("app_date"),
        client_name: row.get("client_name"),
        carrier: row.get("carrier"),
        annualized_premium: row.get("annualized_premium"),
        status,
    })
}

fn validated_carrier(carrier: Option<&str>) -> Result<Option<&'static str>, StoreError> {
    match carrier {
        Some(raw) => canonical_carrier(raw)
            .map(Some)
            .ok_or_else(|| StoreError::UnknownCarrier(raw.to_string())),
        None => Ok(None),
    }
}

pub async fn record_sale(
    pool: &PgPool,
    agent_id: Uuid,
    app_date: NaiveDate,
    client_name: Option<&str>,
    carrier: &str,
    annualized_premium: Decimal,
    status: ApplicationStatus,
) -> anyhow::Result<Uuid> {
    let carrier = canonical_carrier(carrier)
        .ok_or_else(|| StoreError::UnknownCarrier(carrier.to_string()))?;
    if annualized_premium <= Decimal::ZERO {
        return Err(StoreError::InvalidPremium(annualized_premium).into());
    }

    let id = Uuid::new_v4();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO agency_tracker.applications
        (id, agent_id, app_date, client_name, carrier, annualized_premium, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(id)
    .bind(agent_id)
    .bind(app_date)
    .bind(client_name)
    .bind(carrier)
    .bind(annualized_premium)
    .bind(status.as_str())
    .execute(&mut *tx)
    .await
    .map_err(|err| map_conflict(err, "application", &id.to_string()))?;

    activity::apply_sale_to_day(&mut tx, agent_id, app_date, annualized_premium).await?;

    tx.commit().await?;
    tracing::info!(%agent_id, %app_date, premium = %annualized_premium, "recorded sale");
    Ok(id)
}

// Seed helper. The day's counters only move when the application row is new,
// so reseeding cannot double-count.
pub(crate) async fn insert_sale_if_absent(
    pool: &PgPool,
    id: Uuid,
    agent_id: Uuid,
    app_date: NaiveDate,
    client_name: &str,
    carrier: &str,
    annualized_premium: Decimal,
    status: ApplicationStatus,
) -> anyhow::Result<bool> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO agency_tracker.applications
        (id, agent_id, app_date, client_name, carrier, annualized_premium, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(agent_id)
    .bind(app_date)
    .bind(client_name)
    .bind(carrier)
    .bind(annualized_premium)
    .bind(status.as_str())
    .execute(&mut *tx)
    .await?;

    let inserted = result.rows_affected() > 0;
    if inserted {
        activity::apply_sale_to_day(&mut tx, agent_id, app_date, annualized_premium).await?;
    }

    tx.commit().await?;
    Ok(inserted)
}

// Edits adjust the application record only. The day's rolled-up counters keep
// the values captured when the sale was recorded.
pub async fn edit_sale(
    pool: &PgPool,
    id: Uuid,
    app_date: Option<NaiveDate>,
    client_name: Option<&str>,
    carrier: Option<&str>,
    annualized_premium: Option<Decimal>,
    status: Option<ApplicationStatus>,
) -> anyhow::Result<Application> {
    let carrier = validated_carrier(carrier)?;
    if let Some(premium) = annualized_premium {
        if premium <= Decimal::ZERO {
            return Err(StoreError::InvalidPremium(premium).into());
        }
    }

    let row = sqlx::query(
        r#"
        UPDATE agency_tracker.applications
        SET app_date = COALESCE($2, app_date),
            client_name = COALESCE($3, client_name),
            carrier = COALESCE($4, carrier),
            annualized_premium = COALESCE($5, annualized_premium),
            status = COALESCE($6, status)
        WHERE id = $1
        RETURNING id, agent_id, app_date, client_name, carrier, annualized_premium, status
        "#,
    )
    .bind(id)
    .bind(app_date)
    .bind(client_name)
    .bind(carrier)
    .bind(annualized_premium)
    .bind(status.map(|value| value.as_str()))
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::ApplicationNotFound(id))?;

    app_from_row(&row)
}

pub async fn delete_sale(pool: &PgPool, id: Uuid) -> anyhow::Result<()> {
    let result = sqlx::query("DELETE FROM agency_tracker.applications WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::ApplicationNotFound(id).into());
    }
    Ok(())
}

pub async fn fetch_applications(
    pool: &PgPool,
    agent_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<Application>> {
    let rows = sqlx::query(
        "SELECT id, agent_id, app_date, client_name, carrier, annualized_premium, status \
         FROM agency_tracker.applications \
         WHERE agent_id = $1 \
         ORDER BY app_date DESC, created_at DESC \
         LIMIT $2",
    )
    .bind(agent_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut apps = Vec::new();
    for row in rows {
        apps.push(app_from_row(&row)?);
    }
    Ok(apps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carrier_validation_normalizes_known_names() {
        assert_eq!(validated_carrier(Some("americo")).unwrap(), Some("Americo"));
        assert_eq!(validated_carrier(None).unwrap(), None);
    }

    #[test]
    fn carrier_validation_rejects_unknown_names() {
        let err = validated_carrier(Some("Acme Life")).unwrap_err();
        assert_eq!(err.to_string(), "unknown carrier: Acme Life");
    }
}
