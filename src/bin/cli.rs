//! Command-line client for the notes auth backend.
//!
//! Collects credentials, mirrors the server's validation rules so obvious
//! mistakes fail before a request is made, and persists the session token
//! returned in the `token` cookie.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::header::SET_COOKIE;
use reqwest::Client;
use serde_json::{json, Value};

use notes_auth::config::{PasswordPolicy, TOKEN_COOKIE};

#[derive(Parser)]
#[command(name = "notes-auth-cli", version, about = "Notes auth client")]
struct Cli {
    /// Server URL
    #[arg(long, env = "NOTES_AUTH_URL", default_value = "http://localhost:5000")]
    server: String,

    /// Where the session token is persisted
    #[arg(long, default_value = ".notes-auth-token")]
    token_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in
    Signup {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: String,
    },
    /// Sign in with an existing account
    Signin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out and forget the stored token
    Signout,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Signup {
            first_name,
            last_name,
            email,
            username,
            password,
        } => {
            cmd_signup(
                &client,
                &cli.server,
                &cli.token_file,
                &first_name,
                &last_name,
                &email,
                username.as_deref(),
                &password,
            )
            .await?;
        }
        Commands::Signin { email, password } => {
            cmd_signin(&client, &cli.server, &cli.token_file, &email, &password).await?;
        }
        Commands::Signout => {
            cmd_signout(&client, &cli.server, &cli.token_file).await?;
        }
    }

    Ok(())
}

/// Permissive shape check, mirroring the server: something before the `@`,
/// and a domain with a dot. Real validation stays server-side.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

/// Pull the session token out of a `Set-Cookie` header value.
fn parse_token_cookie(value: &str) -> Option<&str> {
    let pair = value.split(';').next()?;
    let (name, token) = pair.split_once('=')?;
    if name.trim() == TOKEN_COOKIE && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

fn extract_token(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| parse_token_cookie(v).map(str::to_string))
}

/// Fail the command with the server's message, verbatim.
fn fail_with_server_message(body: &Value) -> anyhow::Error {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Something went wrong");
    anyhow::anyhow!("{}", message)
}

#[allow(clippy::too_many_arguments)]
async fn cmd_signup(
    client: &Client,
    server: &str,
    token_file: &PathBuf,
    first_name: &str,
    last_name: &str,
    email: &str,
    username: Option<&str>,
    password: &str,
) -> Result<()> {
    if first_name.trim().is_empty() || last_name.trim().is_empty() {
        bail!("Please enter your name");
    }
    if !is_valid_email(email) {
        bail!("Please enter a valid email address");
    }
    let unmet = PasswordPolicy::default().failures(password);
    if !unmet.is_empty() {
        bail!("Password does not meet the requirements: {}", unmet.join(", "));
    }

    let mut body = json!({
        "firstName": first_name,
        "lastName": last_name,
        "email": email,
        "password": password,
    });
    if let Some(username) = username {
        body["username"] = json!(username);
    }

    let resp = client
        .post(format!("{}/api/auth/signup", server))
        .json(&body)
        .send()
        .await
        .context("Failed to connect to server")?;

    let status = resp.status();
    let token = extract_token(&resp);
    let body: Value = resp.json().await.context("Failed to parse response")?;

    if !status.is_success() {
        return Err(fail_with_server_message(&body));
    }

    let token = token.context("Server did not return a session token")?;
    std::fs::write(token_file, &token)
        .with_context(|| format!("Failed to write token to {}", token_file.display()))?;

    println!("Account created successfully");
    if let Some(user_email) = body.pointer("/user/email").and_then(Value::as_str) {
        println!("Signed in as {}", user_email);
    }
    Ok(())
}

async fn cmd_signin(
    client: &Client,
    server: &str,
    token_file: &PathBuf,
    email: &str,
    password: &str,
) -> Result<()> {
    if !is_valid_email(email) {
        bail!("Please enter a valid email address");
    }
    if password.is_empty() {
        bail!("Please enter your password");
    }

    let resp = client
        .post(format!("{}/api/auth/signin", server))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .context("Failed to connect to server")?;

    let status = resp.status();
    let token = extract_token(&resp);
    let body: Value = resp.json().await.context("Failed to parse response")?;

    if !status.is_success() {
        return Err(fail_with_server_message(&body));
    }

    let token = token.context("Server did not return a session token")?;
    std::fs::write(token_file, &token)
        .with_context(|| format!("Failed to write token to {}", token_file.display()))?;

    println!("Logged in successfully");
    Ok(())
}

async fn cmd_signout(client: &Client, server: &str, token_file: &PathBuf) -> Result<()> {
    let resp = client
        .post(format!("{}/api/auth/signout", server))
        .send()
        .await
        .context("Failed to connect to server")?;

    let status = resp.status();
    let body: Value = resp.json().await.context("Failed to parse response")?;
    if !status.is_success() {
        return Err(fail_with_server_message(&body));
    }

    if token_file.exists() {
        std::fs::remove_file(token_file)
            .with_context(|| format!("Failed to remove {}", token_file.display()))?;
    }

    println!("Logged out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("ann@x.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("ann"));
        assert!(!is_valid_email("ann@"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("ann@nodot"));
        assert!(!is_valid_email("ann @x.com"));
    }

    #[test]
    fn test_parse_token_cookie() {
        assert_eq!(
            parse_token_cookie("token=abc.def.ghi; HttpOnly; SameSite=Strict"),
            Some("abc.def.ghi")
        );
        assert_eq!(parse_token_cookie("token=; Max-Age=0"), None);
        assert_eq!(parse_token_cookie("other=abc"), None);
    }
}
