use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::db::{map_conflict, StoreError};
use crate::models::{Profile, Role};

fn profile_from_row(row: &PgRow) -> anyhow::Result<Profile> {
    let role_raw: String = row.get("role");
    let role = role_raw.parse::<Role>().map_err(anyhow::Error::msg)?;

    Ok(Profile {
        id: row.get("id"),
        email: row.get("email"),
        full_name: row.get("full_name"),
        role,
        manager_id: row.get("manager_id"),
        agency_name: row.get("agency_name"),
    })
}

pub async fn fetch_profile_by_email(pool: &PgPool, email: &str) -> anyhow::Result<Profile> {
    let row = sqlx::query(
        "SELECT id, email, full_name, role, manager_id, agency_name \
         FROM agency_tracker.profiles WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StoreError::ProfileNotFound(email.to_string()))?;

    profile_from_row(&row)
}

pub async fn fetch_profile_by_id(pool: &PgPool, id: Uuid) -> anyhow::Result<Profile> {
    let row = sqlx::query(
        "SELECT id, email, full_name, role, manager_id, agency_name \
         FROM agency_tracker.profiles WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StoreError::ProfileNotFound(id.to_string()))?;

    profile_from_row(&row)
}

pub fn expect_role(profile: &Profile, expected: Role) -> Result<(), StoreError> {
    if profile.role == expected {
        Ok(())
    } else {
        Err(StoreError::WrongRole {
            email: profile.email.clone(),
            expected,
            found: profile.role,
        })
    }
}

pub async fn create_manager(
    pool: &PgPool,
    email: &str,
    full_name: &str,
    agency_name: Option<&str>,
) -> anyhow::Result<Profile> {
    let row = sqlx::query(
        r#"
        INSERT INTO agency_tracker.profiles (id, email, full_name, role, agency_name)
        VALUES ($1, $2, $3, 'manager', $4)
        RETURNING id, email, full_name, role, manager_id, agency_name
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(full_name)
    .bind(agency_name)
    .fetch_one(pool)
    .await
    .map_err(|err| map_conflict(err, "profile", email))?;

    profile_from_row(&row)
}

pub async fn create_agent(
    pool: &PgPool,
    email: &str,
    full_name: &str,
    manager_id: Option<Uuid>,
    signup_code: Option<&str>,
) -> anyhow::Result<Profile> {
    let row = sqlx::query(
        r#"
        INSERT INTO agency_tracker.profiles (id, email, full_name, role, manager_id, signup_code)
        VALUES ($1, $2, $3, 'agent', $4, $5)
        RETURNING id, email, full_name, role, manager_id, agency_name
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(full_name)
    .bind(manager_id)
    .bind(signup_code)
    .fetch_one(pool)
    .await
    .map_err(|err| map_conflict(err, "profile", email))?;

    profile_from_row(&row)
}

pub async fn update_profile(
    pool: &PgPool,
    email: &str,
    full_name: Option<&str>,
    agency_name: Option<&str>,
) -> anyhow::Result<Profile> {
    let row = sqlx::query(
        r#"
        UPDATE agency_tracker.profiles
        SET full_name = COALESCE($2, full_name),
            agency_name = COALESCE($3, agency_name)
        WHERE email = $1
        RETURNING id, email, full_name, role, manager_id, agency_name
        "#,
    )
    .bind(email)
    .bind(full_name)
    .bind(agency_name)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StoreError::ProfileNotFound(email.to_string()))?;

    profile_from_row(&row)
}

// The profile keeps the last code it joined through.
pub async fn link_agent(
    pool: &PgPool,
    agent_id: Uuid,
    manager_id: Uuid,
    signup_code: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE agency_tracker.profiles SET manager_id = $2, signup_code = $3 WHERE id = $1",
    )
    .bind(agent_id)
    .bind(manager_id)
    .bind(signup_code)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn unlink_agent(pool: &PgPool, agent_id: Uuid) -> anyhow::Result<()> {
    sqlx::query("UPDATE agency_tracker.profiles SET manager_id = NULL WHERE id = $1")
        .bind(agent_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn fetch_agents_of_manager(
    pool: &PgPool,
    manager_id: Uuid,
) -> anyhow::Result<Vec<Profile>> {
    let rows = sqlx::query(
        "SELECT id, email, full_name, role, manager_id, agency_name \
         FROM agency_tracker.profiles \
         WHERE manager_id = $1 \
         ORDER BY full_name",
    )
    .bind(manager_id)
    .fetch_all(pool)
    .await?;

    let mut agents = Vec::new();
    for row in rows {
        agents.push(profile_from_row(&row)?);
    }
    Ok(agents)
}

pub async fn fetch_profiles_by_role(pool: &PgPool, role: Role) -> anyhow::Result<Vec<Profile>> {
    let rows = sqlx::query(
        "SELECT id, email, full_name, role, manager_id, agency_name \
         FROM agency_tracker.profiles \
         WHERE role = $1 \
         ORDER BY full_name",
    )
    .bind(role.as_str())
    .fetch_all(pool)
    .await?;

    let mut profiles = Vec::new();
    for row in rows {
        profiles.push(profile_from_row(&row)?);
    }
    Ok(profiles)
}
