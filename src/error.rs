use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::TokenError;

/// Everything a request handler can fail with. Domain failures map to 400
/// with the message intact; anything internal maps to 500 with a generic body
/// so no detail leaks to the caller.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    /// Covers both unknown email and wrong password. The two are deliberately
    /// indistinguishable to the caller to prevent user enumeration.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("password hashing failed")]
    PasswordHash(#[from] argon2::password_hash::Error),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(msg) | AppError::Conflict(msg) => {
                (StatusCode::BAD_REQUEST, msg)
            }
            AppError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                "Invalid email or password".to_string(),
            ),
            AppError::Sqlx(e) => {
                // A duplicate signup that raced past the existence checks
                // surfaces here as a unique index violation. Report it as the
                // same conflict the checks would have produced, not as a 500.
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_unique_violation() {
                        let message = if db_err.message().contains("username") {
                            "Username already exists"
                        } else {
                            "Email already exists"
                        };
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(json!({ "message": message })),
                        )
                            .into_response();
                    }
                }
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::PasswordHash(e) => {
                tracing::error!("Password hashing error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Token(e) => {
                tracing::error!("Token error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        crate::db::init_schema(&pool).await.expect("schema");
        pool
    }

    async fn insert_user(
        pool: &SqlitePool,
        email: &str,
        username: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO users (first_name, last_name, username, email, password_hash) \
             VALUES ('Ann', 'Example', ?, ?, 'phc-hash')",
        )
        .bind(username)
        .bind(email)
        .execute(pool)
        .await
        .map(|_| ())
    }

    async fn response_parts(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    // Two concurrent signups with the same email can both pass the existence
    // check; the second insert then dies on the unique index. That error must
    // come back as the conflict message, not as a 500.
    #[tokio::test]
    async fn unique_email_violation_surfaces_as_conflict() {
        let pool = test_pool().await;
        insert_user(&pool, "ann@x.com", None).await.unwrap();

        let err = insert_user(&pool, "ann@x.com", None).await.unwrap_err();
        let (status, body) = response_parts(AppError::from(err)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email already exists");
    }

    #[tokio::test]
    async fn unique_username_violation_surfaces_as_conflict() {
        let pool = test_pool().await;
        insert_user(&pool, "ann@x.com", Some("ann_notes")).await.unwrap();

        let err = insert_user(&pool, "bea@x.com", Some("ann_notes"))
            .await
            .unwrap_err();
        let (status, body) = response_parts(AppError::from(err)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Username already exists");
    }

    #[tokio::test]
    async fn other_database_errors_stay_internal() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        let (status, body) = response_parts(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }
}
