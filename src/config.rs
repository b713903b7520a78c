use anyhow::{bail, Context, Result};

/// Token and cookie lifetime. Cookie `Max-Age` and JWT `exp` both derive from
/// this single constant so the two can never drift apart.
pub const TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Name of the session cookie handed to the client.
pub const TOKEN_COOKIE: &str = "token";

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}

/// Runtime configuration, read once at startup and passed into the router
/// state. Nothing below reads the process environment after this point.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    /// Controls the `Secure` attribute on the session cookie.
    pub production: bool,
    pub cors_origins: Vec<String>,
    pub password_policy: PasswordPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(v) => v.parse::<u16>().context("PORT is not a valid port number")?,
            Err(_) => 5000,
        };

        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        let production = matches!(
            std::env::var("APP_ENV").as_deref(),
            Ok("production") | Ok("prod")
        );

        let cors_origins = match std::env::var("CORS_ORIGINS") {
            Ok(v) => v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => default_cors_origins(),
        };

        Ok(Self {
            port,
            database_url,
            jwt_secret,
            production,
            cors_origins,
            password_policy: PasswordPolicy::default(),
        })
    }
}

/// Password acceptance rules, carried as data so the policy lives in exactly
/// one place instead of per call site.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    /// Require upper, lower, digit and symbol classes in addition to length.
    pub require_character_classes: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_character_classes: true,
        }
    }
}

impl PasswordPolicy {
    /// Returns the first unmet rule as a human-readable message, or `Ok(())`
    /// when the password is acceptable.
    pub fn check(&self, password: &str) -> Result<(), String> {
        if password.chars().count() < self.min_length {
            return Err(format!(
                "Password must be at least {} characters",
                self.min_length
            ));
        }
        if self.require_character_classes {
            if !password.chars().any(|c| c.is_ascii_uppercase()) {
                return Err("Password must contain an uppercase letter".to_string());
            }
            if !password.chars().any(|c| c.is_ascii_lowercase()) {
                return Err("Password must contain a lowercase letter".to_string());
            }
            if !password.chars().any(|c| c.is_ascii_digit()) {
                return Err("Password must contain a number".to_string());
            }
            if !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
                return Err("Password must contain a special symbol".to_string());
            }
        }
        Ok(())
    }

    /// Every unmet rule, for clients that render a checklist.
    pub fn failures(&self, password: &str) -> Vec<String> {
        let mut out = Vec::new();
        if password.chars().count() < self.min_length {
            out.push(format!("at least {} characters", self.min_length));
        }
        if self.require_character_classes {
            if !password.chars().any(|c| c.is_ascii_uppercase()) {
                out.push("one uppercase letter".to_string());
            }
            if !password.chars().any(|c| c.is_ascii_lowercase()) {
                out.push("one lowercase letter".to_string());
            }
            if !password.chars().any(|c| c.is_ascii_digit()) {
                out.push("one number".to_string());
            }
            if !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
                out.push("one special symbol".to_string());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seven_chars_rejected() {
        let policy = PasswordPolicy::default();
        assert!(policy.check("Abcde1!").is_err());
    }

    #[test]
    fn test_eight_chars_all_classes_accepted() {
        let policy = PasswordPolicy::default();
        assert!(policy.check("Abcdef1!").is_ok());
    }

    #[test]
    fn test_missing_classes_rejected() {
        let policy = PasswordPolicy::default();
        assert!(policy.check("abcdef1!").is_err()); // no uppercase
        assert!(policy.check("ABCDEF1!").is_err()); // no lowercase
        assert!(policy.check("Abcdefg!").is_err()); // no digit
        assert!(policy.check("Abcdefg1").is_err()); // no symbol
    }

    #[test]
    fn test_length_only_policy() {
        let policy = PasswordPolicy {
            min_length: 8,
            require_character_classes: false,
        };
        assert!(policy.check("abcdefgh").is_ok());
        assert!(policy.check("abcdefg").is_err());
    }

    #[test]
    fn test_failures_lists_every_unmet_rule() {
        let policy = PasswordPolicy::default();
        let failures = policy.failures("abc");
        assert_eq!(failures.len(), 4); // length, upper, digit, symbol
        assert!(policy.failures("Abcdef1!").is_empty());
    }
}
