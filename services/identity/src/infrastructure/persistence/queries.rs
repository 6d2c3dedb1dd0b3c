//! SQL 查询
//!
//! 以 `&mut PgConnection` 为参数，连接池与事务 Repository 共用同一套查询。

use chrono::{DateTime, Utc};
use shelf_adapter_postgres::map_db_error;
use shelf_common::{AuditInfo, UserId};
use shelf_errors::{AppError, AppResult};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::domain::{ActivationCode, ActivationCodeId, Identity, Role};

#[derive(Debug, sqlx::FromRow)]
struct IdentityRow {
    id: Uuid,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    enabled: bool,
    locked: bool,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    updated_at: DateTime<Utc>,
    updated_by: Option<Uuid>,
}

impl IdentityRow {
    fn into_identity(self, roles: Vec<String>) -> Identity {
        Identity {
            id: UserId::from_uuid(self.id),
            email: self.email,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            enabled: self.enabled,
            locked: self.locked,
            roles,
            audit_info: AuditInfo {
                created_at: self.created_at,
                created_by: self.created_by.map(UserId::from_uuid),
                updated_at: self.updated_at,
                updated_by: self.updated_by.map(UserId::from_uuid),
            },
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ActivationCodeRow {
    id: Uuid,
    code: String,
    identity_id: Uuid,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    validated_at: Option<DateTime<Utc>>,
}

impl From<ActivationCodeRow> for ActivationCode {
    fn from(row: ActivationCodeRow) -> Self {
        Self {
            id: ActivationCodeId(row.id),
            code: row.code,
            identity_id: UserId::from_uuid(row.identity_id),
            created_at: row.created_at,
            expires_at: row.expires_at,
            validated_at: row.validated_at,
        }
    }
}

const IDENTITY_COLUMNS: &str = "id, email, password_hash, first_name, last_name, enabled, locked, \
                                created_at, created_by, updated_at, updated_by";

const ACTIVATION_CODE_COLUMNS: &str =
    "id, code, identity_id, created_at, expires_at, validated_at";

// =============================================================================
// identities
// =============================================================================

async fn load_roles(conn: &mut PgConnection, identity_id: Uuid) -> AppResult<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT r.name
        FROM identity_roles ir
        JOIN roles r ON r.id = ir.role_id
        WHERE ir.identity_id = $1
        ORDER BY ir.position
        "#,
    )
    .bind(identity_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to load roles: {}", e)))
}

async fn hydrate(conn: &mut PgConnection, row: Option<IdentityRow>) -> AppResult<Option<Identity>> {
    match row {
        Some(row) => {
            let roles = load_roles(conn, row.id).await?;
            Ok(Some(row.into_identity(roles)))
        }
        None => Ok(None),
    }
}

pub(crate) async fn find_identity_by_id(
    conn: &mut PgConnection,
    id: &UserId,
) -> AppResult<Option<Identity>> {
    let row = sqlx::query_as::<_, IdentityRow>(&format!(
        "SELECT {} FROM identities WHERE id = $1",
        IDENTITY_COLUMNS
    ))
    .bind(id.0)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to find identity: {}", e)))?;

    hydrate(conn, row).await
}

pub(crate) async fn find_identity_by_email(
    conn: &mut PgConnection,
    email: &str,
) -> AppResult<Option<Identity>> {
    let row = sqlx::query_as::<_, IdentityRow>(&format!(
        "SELECT {} FROM identities WHERE email = $1",
        IDENTITY_COLUMNS
    ))
    .bind(email)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to find identity: {}", e)))?;

    hydrate(conn, row).await
}

pub(crate) async fn exists_identity_by_email(
    conn: &mut PgConnection,
    email: &str,
) -> AppResult<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM identities WHERE email = $1)")
        .bind(email)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to check identity: {}", e)))
}

pub(crate) async fn insert_identity(conn: &mut PgConnection, identity: &Identity) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO identities (id, email, password_hash, first_name, last_name, enabled, locked,
                                created_at, created_by, updated_at, updated_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(identity.id.0)
    .bind(&identity.email)
    .bind(&identity.password_hash)
    .bind(&identity.first_name)
    .bind(&identity.last_name)
    .bind(identity.enabled)
    .bind(identity.locked)
    .bind(identity.audit_info.created_at)
    .bind(identity.audit_info.created_by.as_ref().map(|id| id.0))
    .bind(identity.audit_info.updated_at)
    .bind(identity.audit_info.updated_by.as_ref().map(|id| id.0))
    .execute(&mut *conn)
    .await
    .map_err(map_db_error)?;

    replace_roles(conn, identity).await
}

pub(crate) async fn update_identity(conn: &mut PgConnection, identity: &Identity) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE identities
        SET first_name = $2, last_name = $3, password_hash = $4, enabled = $5, locked = $6,
            updated_at = $7, updated_by = $8
        WHERE id = $1
        "#,
    )
    .bind(identity.id.0)
    .bind(&identity.first_name)
    .bind(&identity.last_name)
    .bind(&identity.password_hash)
    .bind(identity.enabled)
    .bind(identity.locked)
    .bind(identity.audit_info.updated_at)
    .bind(identity.audit_info.updated_by.as_ref().map(|id| id.0))
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to update identity: {}", e)))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("Identity {} not found", identity.id)));
    }

    replace_roles(conn, identity).await
}

async fn replace_roles(conn: &mut PgConnection, identity: &Identity) -> AppResult<()> {
    sqlx::query("DELETE FROM identity_roles WHERE identity_id = $1")
        .bind(identity.id.0)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to clear roles: {}", e)))?;

    for (position, role) in identity.roles.iter().enumerate() {
        let result = sqlx::query(
            r#"
            INSERT INTO identity_roles (identity_id, role_id, position)
            SELECT $1, id, $3 FROM roles WHERE name = $2
            "#,
        )
        .bind(identity.id.0)
        .bind(role)
        .bind(position as i32)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to assign role: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Role {} not found", role)));
        }
    }

    Ok(())
}

// =============================================================================
// roles
// =============================================================================

pub(crate) async fn find_role_by_name(conn: &mut PgConnection, name: &str) -> AppResult<Option<Role>> {
    let row = sqlx::query_as::<_, RoleRow>("SELECT id, name FROM roles WHERE name = $1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to find role: {}", e)))?;

    Ok(row.map(|r| Role { id: r.id, name: r.name }))
}

// =============================================================================
// activation_codes
// =============================================================================

pub(crate) async fn insert_activation_code(
    conn: &mut PgConnection,
    code: &ActivationCode,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO activation_codes (id, code, identity_id, created_at, expires_at, validated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(code.id.0)
    .bind(&code.code)
    .bind(code.identity_id.0)
    .bind(code.created_at)
    .bind(code.expires_at)
    .bind(code.validated_at)
    .execute(&mut *conn)
    .await
    .map_err(map_db_error)?;

    Ok(())
}

pub(crate) async fn mark_activation_code_validated(
    conn: &mut PgConnection,
    code: &ActivationCode,
) -> AppResult<()> {
    let validated_at = code
        .validated_at
        .ok_or_else(|| AppError::internal("Activation code has no validation timestamp"))?;

    let result = sqlx::query(
        "UPDATE activation_codes SET validated_at = $2 WHERE id = $1 AND validated_at IS NULL",
    )
    .bind(code.id.0)
    .bind(validated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to update activation code: {}", e)))?;

    if result.rows_affected() == 0 {
        return Err(AppError::conflict("Activation code already validated"));
    }
    Ok(())
}

pub(crate) async fn find_activation_code_for_update(
    conn: &mut PgConnection,
    code: &str,
) -> AppResult<Option<ActivationCode>> {
    let row = sqlx::query_as::<_, ActivationCodeRow>(&format!(
        "SELECT {} FROM activation_codes WHERE code = $1 FOR UPDATE",
        ACTIVATION_CODE_COLUMNS
    ))
    .bind(code)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to find activation code: {}", e)))?;

    Ok(row.map(ActivationCode::from))
}

pub(crate) async fn exists_activation_code(conn: &mut PgConnection, code: &str) -> AppResult<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM activation_codes WHERE code = $1)")
        .bind(code)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to check activation code: {}", e)))
}
