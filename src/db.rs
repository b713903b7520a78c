use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Open the connection pool against the configured SQLite database.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

/// Create the users table and its unique indexes if they do not exist.
///
/// The unique indexes on email and username are the only safeguard against
/// two concurrent signups racing past the existence checks; the second insert
/// fails with a uniqueness violation which the error mapping reports as a
/// conflict.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            username TEXT,
            email TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users (email)")
        .execute(pool)
        .await?;

    // Partial index: username is optional, only non-null values must be unique.
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username ON users (username) \
         WHERE username IS NOT NULL",
    )
    .execute(pool)
    .await?;

    Ok(())
}
