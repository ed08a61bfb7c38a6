/*
 * Responsibility
 * - Load settings from the environment (signing secret, token lifetimes, throttle policy, public routes)
 * - Validate them up front so a misconfigured process refuses to start
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Default issuer / audience. Tokens from another system name are rejected.
pub const DEFAULT_ISSUER: &str = "token-gate";
pub const DEFAULT_AUDIENCE: &str = "token-gate-api";

const MIN_SECRET_LEN: usize = 32;

const DEFAULT_PUBLIC_URLS: &[&str] = &[
    "/health",
    "/api/v1/health",
    "/api/v1/user/login",
    "/api/v1/user/token/refresh",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,
    pub request_timeout: Duration,

    pub issuer: String,
    pub audience: String,
    // HS512 shared secret; never printed.
    pub jwt_secret: String,
    pub access_token_ttl_seconds: u64,
    pub refresh_token_ttl_seconds: u64,

    pub login_max_attempts: u32,
    pub login_attempt_window_seconds: u64,
    pub login_attempt_capacity: usize,

    pub public_urls: Vec<String>,

    // `name:password:ROLE` triples for the in-memory credential store.
    pub seed_users: Vec<SeedUser>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_seconds", &self.refresh_token_ttl_seconds)
            .field("login_max_attempts", &self.login_max_attempts)
            .field("public_urls", &self.public_urls)
            .field("seed_users", &self.seed_users.len())
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
    pub role: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = split_list(&std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default());

        let request_timeout = Duration::from_secs(env_or("REQUEST_TIMEOUT_SECONDS", 30));

        let issuer = std::env::var("AUTH_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string());
        let audience =
            std::env::var("AUTH_AUDIENCE").unwrap_or_else(|_| DEFAULT_AUDIENCE.to_string());

        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let access_token_ttl_seconds = env_or("ACCESS_TOKEN_TTL_SECONDS", 600); // 10 min
        let refresh_token_ttl_seconds = env_or("REFRESH_TOKEN_TTL_SECONDS", 1_296_000); // 15 days
        if access_token_ttl_seconds == 0 || refresh_token_ttl_seconds == 0 {
            return Err(ConfigError::Invalid("TOKEN_TTL_SECONDS"));
        }

        let login_max_attempts = env_or("LOGIN_MAX_ATTEMPTS", 5);
        let login_attempt_window_seconds = env_or("LOGIN_ATTEMPT_WINDOW_SECONDS", 900);
        let login_attempt_capacity = env_or("LOGIN_ATTEMPT_CAPACITY", 100);
        if login_max_attempts == 0 {
            return Err(ConfigError::Invalid("LOGIN_MAX_ATTEMPTS"));
        }
        if login_attempt_capacity == 0 {
            return Err(ConfigError::Invalid("LOGIN_ATTEMPT_CAPACITY"));
        }

        let public_urls = match std::env::var("PUBLIC_URLS") {
            Ok(raw) => split_list(&raw),
            Err(_) => DEFAULT_PUBLIC_URLS.iter().map(|s| s.to_string()).collect(),
        };

        let seed_users = parse_seed_users(&std::env::var("SEED_USERS").unwrap_or_default())?;

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            request_timeout,
            issuer,
            audience,
            jwt_secret,
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
            login_max_attempts,
            login_attempt_window_seconds,
            login_attempt_capacity,
            public_urls,
            seed_users,
        })
    }

    /// Settings for tests and local tooling; everything at its default.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            app_env: AppEnv::Development,
            cors_allowed_origins: Vec::new(),
            request_timeout: Duration::from_secs(30),
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            jwt_secret: jwt_secret.into(),
            access_token_ttl_seconds: 600,
            refresh_token_ttl_seconds: 1_296_000,
            login_max_attempts: 5,
            login_attempt_window_seconds: 900,
            login_attempt_capacity: 100,
            public_urls: DEFAULT_PUBLIC_URLS.iter().map(|s| s.to_string()).collect(),
            seed_users: Vec::new(),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_seed_users(raw: &str) -> Result<Vec<SeedUser>, ConfigError> {
    split_list(raw)
        .into_iter()
        .map(|entry| {
            let mut parts = entry.splitn(3, ':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(username), Some(password), Some(role))
                    if !username.is_empty() && !password.is_empty() =>
                {
                    Ok(SeedUser {
                        username: username.to_string(),
                        password: password.to_string(),
                        role: role.to_string(),
                    })
                }
                _ => Err(ConfigError::Invalid("SEED_USERS")),
            }
        })
        .collect()
}
