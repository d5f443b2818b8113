use rand::Rng;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::db::{is_unique_violation, StoreError};
use crate::models::SignupCode;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LEN: usize = 8;

pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

pub fn signup_url(base_url: &str, code: &str) -> String {
    format!("{}/signup?code={}", base_url.trim_end_matches('/'), code)
}

async fn active_code_for_manager(
    pool: &PgPool,
    manager_id: Uuid,
) -> anyhow::Result<Option<SignupCode>> {
    let row = sqlx::query(
        "SELECT code, manager_id \
         FROM agency_tracker.manager_signup_codes \
         WHERE manager_id = $1 AND is_active \
         ORDER BY created_at \
         LIMIT 1",
    )
    .bind(manager_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| SignupCode {
        code: row.get("code"),
        manager_id: row.get("manager_id"),
    }))
}

pub async fn ensure_signup_code(pool: &PgPool, manager_id: Uuid) -> anyhow::Result<SignupCode> {
    if let Some(existing) = active_code_for_manager(pool, manager_id).await? {
        return Ok(existing);
    }

    // Codes are short enough that a fresh draw can land on a taken one.
    for _ in 0..3 {
        let code = generate_code();
        let result = sqlx::query(
            "INSERT INTO agency_tracker.manager_signup_codes (code, manager_id) VALUES ($1, $2)",
        )
        .bind(&code)
        .bind(manager_id)
        .execute(pool)
        .await;

        match result {
            Ok(_) => return Ok(SignupCode { code, manager_id }),
            Err(err) if is_unique_violation(&err) => continue,
            Err(err) => return Err(err.into()),
        }
    }

    Err(StoreError::WriteConflict {
        entity: "signup code",
        key: manager_id.to_string(),
    }
    .into())
}

pub async fn resolve_code(pool: &PgPool, code: &str) -> anyhow::Result<SignupCode> {
    let normalized = code.trim().to_ascii_uppercase();

    let row = sqlx::query(
        "SELECT code, manager_id \
         FROM agency_tracker.manager_signup_codes \
         WHERE code = $1 AND is_active",
    )
    .bind(&normalized)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::InvalidSignupCode(normalized))?;

    Ok(SignupCode {
        code: row.get("code"),
        manager_id: row.get("manager_id"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_eight_uppercase_alphanumerics() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 8);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn signup_url_joins_base_and_code() {
        assert_eq!(
            signup_url("https://tracker.example.com", "HARBOR26"),
            "https://tracker.example.com/signup?code=HARBOR26"
        );
        assert_eq!(
            signup_url("https://tracker.example.com/", "HARBOR26"),
            "https://tracker.example.com/signup?code=HARBOR26"
        );
    }
}
