use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub token_secret: String,
    pub mail: Option<MailConfig>,
}

/// SMTP settings for order receipts. Absent when the environment does not
/// carry a complete host/user/pass triple; the mailer is then a no-op.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_addr: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let token_secret = env::var("TOKEN_SECRET").unwrap_or_else(|_| "dev-secret".to_string());
        Ok(Self {
            port,
            database_url,
            host,
            token_secret,
            mail: MailConfig::from_env(),
        })
    }
}

impl MailConfig {
    fn from_env() -> Option<Self> {
        let host = env::var("SMTP_HOST").ok()?;
        let username = env::var("SMTP_USER").ok()?;
        let password = env::var("SMTP_PASS").ok()?;
        let port = env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(587);
        let from_addr = env::var("SMTP_FROM").unwrap_or_else(|_| username.clone());
        Some(Self {
            host,
            port,
            username,
            password,
            from_addr,
        })
    }
}
