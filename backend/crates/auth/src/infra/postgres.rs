//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{PrincipalId, SessionId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{auth_session::AuthSession, principal::Principal};
use crate::domain::repository::{PrincipalRepository, SessionRepository};
use crate::domain::value_object::{
    email::Email, guard::Guard, name::Name, remember_token::RememberToken,
    user_password::UserPassword,
};
use crate::error::{AuthError, AuthResult};

/// `(guard, email)` collisions surface as the same field error the
/// duplicate pre-check raises
fn map_unique_violation(err: sqlx::Error) -> AuthError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AuthError::field("email", "validation.unique")
        }
        _ => AuthError::Database(err),
    }
}

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Clean up expired sessions
    pub async fn cleanup_expired(&self) -> AuthResult<u64> {
        self.cleanup_expired_sessions(Utc::now().timestamp_millis())
            .await
    }
}

// ============================================================================
// Principal Repository Implementation
// ============================================================================

impl PrincipalRepository for PgAuthRepository {
    async fn insert_principal(&self, principal: &Principal) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO principals (
                id,
                guard,
                name,
                email,
                email_verified_at,
                password,
                remember_token,
                locale,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(principal.id.as_uuid())
        .bind(principal.guard.as_str())
        .bind(principal.name.as_str())
        .bind(principal.email.as_ref().map(Email::as_str))
        .bind(principal.email_verified_at)
        .bind(principal.password.as_ref().map(UserPassword::as_phc_string))
        .bind(principal.remember_token.as_ref().map(RememberToken::as_str))
        .bind(principal.locale.as_deref())
        .bind(principal.created_at)
        .bind(principal.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(())
    }

    async fn find_principal(&self, guard: &Guard, id: PrincipalId) -> AuthResult<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT
                id,
                guard,
                name,
                email,
                email_verified_at,
                password,
                remember_token,
                locale,
                created_at,
                updated_at
            FROM principals
            WHERE id = $1 AND guard = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(guard.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(PrincipalRow::into_principal).transpose()
    }

    async fn find_principal_by_email(
        &self,
        guard: &Guard,
        email: &Email,
    ) -> AuthResult<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT
                id,
                guard,
                name,
                email,
                email_verified_at,
                password,
                remember_token,
                locale,
                created_at,
                updated_at
            FROM principals
            WHERE guard = $1 AND email = $2
            "#,
        )
        .bind(guard.as_str())
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(PrincipalRow::into_principal).transpose()
    }

    async fn update_principal(&self, principal: &Principal) -> AuthResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE principals SET
                name = $3,
                email = $4,
                email_verified_at = $5,
                password = $6,
                remember_token = $7,
                locale = $8,
                updated_at = $9
            WHERE id = $1 AND guard = $2
            "#,
        )
        .bind(principal.id.as_uuid())
        .bind(principal.guard.as_str())
        .bind(principal.name.as_str())
        .bind(principal.email.as_ref().map(Email::as_str))
        .bind(principal.email_verified_at)
        .bind(principal.password.as_ref().map(UserPassword::as_phc_string))
        .bind(principal.remember_token.as_ref().map(RememberToken::as_str))
        .bind(principal.locale.as_deref())
        .bind(principal.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?
        .rows_affected();

        if updated == 0 {
            return Err(AuthError::Internal(format!(
                "principal {} does not exist",
                principal.id
            )));
        }
        Ok(())
    }

    async fn delete_principal(&self, guard: &Guard, id: PrincipalId) -> AuthResult<bool> {
        let deleted = sqlx::query("DELETE FROM principals WHERE id = $1 AND guard = $2")
            .bind(id.as_uuid())
            .bind(guard.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for PgAuthRepository {
    async fn insert_session(&self, session: &AuthSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (
                session_id,
                principal_id,
                guard,
                expires_at_ms,
                remember,
                client_ip,
                user_agent,
                created_at,
                last_activity_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(session.session_id.as_uuid())
        .bind(session.principal_id.as_uuid())
        .bind(session.guard.as_str())
        .bind(session.expires_at_ms)
        .bind(session.remember)
        .bind(session.client_ip.as_deref())
        .bind(session.user_agent.as_deref())
        .bind(session.created_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_session(&self, session_id: SessionId) -> AuthResult<Option<AuthSession>> {
        let row = sqlx::query_as::<_, AuthSessionRow>(
            r#"
            SELECT
                session_id,
                principal_id,
                guard,
                expires_at_ms,
                remember,
                client_ip,
                user_agent,
                created_at,
                last_activity_at
            FROM auth_sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AuthSessionRow::into_session))
    }

    async fn sessions_of(&self, principal_id: PrincipalId) -> AuthResult<Vec<AuthSession>> {
        let rows = sqlx::query_as::<_, AuthSessionRow>(
            r#"
            SELECT
                session_id,
                principal_id,
                guard,
                expires_at_ms,
                remember,
                client_ip,
                user_agent,
                created_at,
                last_activity_at
            FROM auth_sessions
            WHERE principal_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(principal_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AuthSessionRow::into_session).collect())
    }

    async fn delete_session(&self, session_id: SessionId) -> AuthResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE session_id = $1")
            .bind(session_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_sessions_of(
        &self,
        principal_id: PrincipalId,
        except: Option<SessionId>,
    ) -> AuthResult<u64> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM auth_sessions
            WHERE principal_id = $1
              AND ($2::uuid IS NULL OR session_id <> $2)
            "#,
        )
        .bind(principal_id.as_uuid())
        .bind(except.map(SessionId::into_uuid))
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(deleted)
    }

    async fn cleanup_expired_sessions(&self, now_ms: i64) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE expires_at_ms < $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired auth sessions");

        Ok(deleted)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct PrincipalRow {
    id: Uuid,
    guard: String,
    name: String,
    email: Option<String>,
    email_verified_at: Option<DateTime<Utc>>,
    password: Option<String>,
    remember_token: Option<String>,
    locale: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PrincipalRow {
    fn into_principal(self) -> AuthResult<Principal> {
        Ok(Principal {
            id: PrincipalId::from_uuid(self.id),
            guard: Guard::new(self.guard),
            name: Name::from_db(self.name),
            email: self.email.map(Email::from_db),
            email_verified_at: self.email_verified_at,
            password: self.password.map(UserPassword::from_phc_string).transpose()?,
            remember_token: self.remember_token.map(RememberToken::from_db),
            locale: self.locale,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AuthSessionRow {
    session_id: Uuid,
    principal_id: Uuid,
    guard: String,
    expires_at_ms: i64,
    remember: bool,
    client_ip: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl AuthSessionRow {
    fn into_session(self) -> AuthSession {
        AuthSession {
            session_id: SessionId::from_uuid(self.session_id),
            principal_id: PrincipalId::from_uuid(self.principal_id),
            guard: Guard::new(self.guard),
            expires_at_ms: self.expires_at_ms,
            remember: self.remember,
            client_ip: self.client_ip,
            user_agent: self.user_agent,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
        }
    }
}
