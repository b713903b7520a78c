use axum::{extract::State, http::header, http::StatusCode, response::IntoResponse, Json};

use crate::{
    auth,
    config::TOKEN_TTL_SECS,
    error::AppError,
    models::user::{AuthResponse, MessageResponse, SigninRequest, SignupRequest, User},
    AppState,
};

/// Lowercase and trim an email so lookups and the unique index agree on case.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.first_name.trim().is_empty()
        || payload.last_name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(AppError::Validation(
            "firstName, lastName, email and password are required".to_string(),
        ));
    }

    state
        .config
        .password_policy
        .check(&payload.password)
        .map_err(AppError::Validation)?;

    let email = normalize_email(&payload.email);
    let username = payload
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string);

    // Existence checks are sequential and reported separately so the caller
    // learns which field collided.
    let email_taken = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    if email_taken.is_some() {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    if let Some(ref username) = username {
        let username_taken =
            sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&state.db)
                .await?;
        if username_taken.is_some() {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }
    }

    let password_hash = auth::hash_password(&payload.password)?;

    // A concurrent signup can still beat us to the insert; the unique index
    // rejects it and AppError maps the violation back to a conflict.
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (first_name, last_name, username, email, password_hash) \
         VALUES (?, ?, ?, ?, ?) \
         RETURNING id, first_name, last_name, username, email, password_hash, created_at",
    )
    .bind(payload.first_name.trim())
    .bind(payload.last_name.trim())
    .bind(&username)
    .bind(&email)
    .bind(&password_hash)
    .fetch_one(&state.db)
    .await?;

    let token = auth::issue_token(user.id, &state.config.jwt_secret, TOKEN_TTL_SECS)?;
    let cookie = auth::session_cookie(&token, state.config.production);

    tracing::info!(user_id = user.id, "user created");

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            message: "User created".to_string(),
            user: user.into(),
        }),
    ))
}

pub async fn signin(
    State(state): State<AppState>,
    Json(payload): Json<SigninRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&payload.email);

    // Unknown email and wrong password take the same exit path.
    let user = sqlx::query_as::<_, User>(
        "SELECT id, first_name, last_name, username, email, password_hash, created_at \
         FROM users WHERE email = ?",
    )
    .bind(&email)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::InvalidCredentials)?;

    if !auth::verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let token = auth::issue_token(user.id, &state.config.jwt_secret, TOKEN_TTL_SECS)?;
    let cookie = auth::session_cookie(&token, state.config.production);

    tracing::debug!(user_id = user.id, "user signed in");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            message: "Login successful".to_string(),
            user: user.into(),
        }),
    ))
}

/// Stateless signout: the only effect is a clearing Set-Cookie. Tokens
/// already issued stay valid until they expire.
pub async fn signout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = auth::clear_session_cookie(state.config.production);
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}
