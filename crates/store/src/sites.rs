//! Site registry operations.

use chrono::Utc;
use serde::Serialize;
use sqlx::FromRow;
use tracing::info;

use tracking_core::{
    generate_site_id, is_valid_site_id, normalize_domain, limits::MAX_SITE_NAME_LEN, DbErrorCode,
    Error, Result, Site, ValidationErrorCode,
};

use crate::client::{db_err, Store};

/// Attempts before giving up on a unique public id. The id space is
/// 36^12, so a second collision in a row means something is wrong.
const SITE_ID_ATTEMPTS: usize = 5;

#[derive(Debug, FromRow)]
struct SiteRow {
    id: i64,
    owner_id: String,
    name: String,
    domain: String,
    public_id: String,
    created_at: i64,
    is_active: bool,
}

impl From<SiteRow> for Site {
    fn from(row: SiteRow) -> Self {
        Site {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            domain: row.domain,
            public_id: row.public_id,
            created_at: row.created_at,
            is_active: row.is_active,
        }
    }
}

const SITE_COLUMNS: &str = "id, owner_id, name, domain, public_id, created_at, is_active";

/// Register a new site for a user. The domain is normalized before
/// storage; the public id is generated here and never changes.
pub async fn create_site(store: &Store, owner_id: &str, name: &str, raw_domain: &str) -> Result<Site> {
    let name = name.trim();
    if name.is_empty() || name.len() > MAX_SITE_NAME_LEN {
        return Err(Error::validation(
            ValidationErrorCode::MissingFields,
            "Invalid site name",
        ));
    }

    let domain = normalize_domain(raw_domain)?;
    let created_at = Utc::now().timestamp_millis();

    for _ in 0..SITE_ID_ATTEMPTS {
        let public_id = generate_site_id(store.site_ids());

        let result = sqlx::query(
            "INSERT INTO sites (owner_id, name, domain, public_id, created_at, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, 1)",
        )
        .bind(owner_id)
        .bind(name)
        .bind(&domain)
        .bind(&public_id)
        .bind(created_at)
        .execute(store.pool())
        .await;

        match result {
            Ok(done) => {
                info!(site_id = %public_id, domain = %domain, "Registered site");
                return Ok(Site {
                    id: done.last_insert_rowid(),
                    owner_id: owner_id.to_string(),
                    name: name.to_string(),
                    domain,
                    public_id,
                    created_at,
                    is_active: true,
                });
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => continue,
            Err(e) => return Err(db_err(e)),
        }
    }

    Err(Error::database(
        DbErrorCode::StoreFailed,
        "could not allocate a unique site id",
    ))
}

/// Fetch a site by its public identifier, any status.
pub async fn get_site(store: &Store, public_id: &str) -> Result<Option<Site>> {
    let row: Option<SiteRow> = sqlx::query_as(&format!(
        "SELECT {SITE_COLUMNS} FROM sites WHERE public_id = ?1"
    ))
    .bind(public_id)
    .fetch_optional(store.pool())
    .await
    .map_err(db_err)?;

    Ok(row.map(Site::from))
}

/// Fetch a site by its public identifier, active sites only. This is
/// the capability check every tracking mutation runs first.
pub async fn find_active(store: &Store, public_id: &str) -> Result<Option<Site>> {
    let row: Option<SiteRow> = sqlx::query_as(&format!(
        "SELECT {SITE_COLUMNS} FROM sites WHERE public_id = ?1 AND is_active = 1"
    ))
    .bind(public_id)
    .fetch_optional(store.pool())
    .await
    .map_err(db_err)?;

    Ok(row.map(Site::from))
}

/// All sites owned by a user, newest first.
pub async fn list_sites(store: &Store, owner_id: &str) -> Result<Vec<Site>> {
    let rows: Vec<SiteRow> = sqlx::query_as(&format!(
        "SELECT {SITE_COLUMNS} FROM sites WHERE owner_id = ?1 ORDER BY created_at DESC"
    ))
    .bind(owner_id)
    .fetch_all(store.pool())
    .await
    .map_err(db_err)?;

    Ok(rows.into_iter().map(Site::from).collect())
}

/// A site owned by a user, or None (missing and not-owned are
/// indistinguishable to the caller).
pub async fn get_owned_site(store: &Store, owner_id: &str, public_id: &str) -> Result<Option<Site>> {
    let row: Option<SiteRow> = sqlx::query_as(&format!(
        "SELECT {SITE_COLUMNS} FROM sites WHERE public_id = ?1 AND owner_id = ?2"
    ))
    .bind(public_id)
    .bind(owner_id)
    .fetch_optional(store.pool())
    .await
    .map_err(db_err)?;

    Ok(row.map(Site::from))
}

/// Flip the active flag. Deactivation pauses tracking without touching
/// any recorded data. Returns false when the caller owns no such site.
pub async fn set_site_active(
    store: &Store,
    owner_id: &str,
    public_id: &str,
    active: bool,
) -> Result<bool> {
    let affected = sqlx::query(
        "UPDATE sites SET is_active = ?3 WHERE public_id = ?1 AND owner_id = ?2",
    )
    .bind(public_id)
    .bind(owner_id)
    .bind(active)
    .execute(store.pool())
    .await
    .map_err(db_err)?
    .rows_affected();

    Ok(affected > 0)
}

/// Delete a site outright, cascading to every dependent tracking record.
/// Returns false when the caller owns no such site.
pub async fn delete_site(store: &Store, owner_id: &str, public_id: &str) -> Result<bool> {
    let mut tx = store.pool().begin().await.map_err(db_err)?;

    let owned: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM sites WHERE public_id = ?1 AND owner_id = ?2")
            .bind(public_id)
            .bind(owner_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;

    if owned.is_none() {
        return Ok(false);
    }

    for table in ["sessions", "pageviews", "performance_samples", "events"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE site_id = ?1"))
            .bind(public_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
    }

    sqlx::query("DELETE FROM sites WHERE public_id = ?1")
        .bind(public_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

    tx.commit().await.map_err(db_err)?;

    info!(site_id = %public_id, "Deleted site and all tracking data");
    Ok(true)
}

/// Response shape for the public site-validation collaborator endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl SiteValidation {
    fn invalid() -> Self {
        Self {
            valid: false,
            domain: None,
            is_active: None,
        }
    }
}

/// Resolve a public site identifier for dashboard use.
pub async fn validate_site_id(store: &Store, public_id: &str) -> Result<SiteValidation> {
    if !is_valid_site_id(public_id) {
        return Ok(SiteValidation::invalid());
    }

    Ok(match get_site(store, public_id).await? {
        Some(site) => SiteValidation {
            valid: true,
            domain: Some(site.domain),
            is_active: Some(site.is_active),
        },
        None => SiteValidation::invalid(),
    })
}
