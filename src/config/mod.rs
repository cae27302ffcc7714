use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub uri: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enforce_auth: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_BACKEND") {
            self.database.backend = parse_backend(&v).unwrap_or(self.database.backend);
        }
        if let Ok(v) = env::var("DATABASE_NAME") {
            self.database.name = v;
        }
        self.database.uri = resolve_mongo_uri(
            env::var("MONGODB_URI").ok(),
            env::var("DB_USER").ok(),
            env::var("DB_PASS").ok(),
            env::var("MONGODB_HOST").ok(),
        )
        .unwrap_or(self.database.uri);

        // Security overrides
        if let Ok(v) = env::var("ACCESS_TOKEN_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENFORCE_AUTH") {
            self.security.enforce_auth = v.parse().unwrap_or(self.security.enforce_auth);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = parse_origins(&v);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                backend: DatabaseBackend::Mongo,
                uri: "mongodb://localhost:27017".to_string(),
                name: "Acoustica".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enforce_auth: true,
                cors_origins: Vec::new(),
            },
        }
    }

    pub fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config
    }

    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config
    }

    /// Bind address as `host:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_backend(value: &str) -> Option<DatabaseBackend> {
    match value.trim().to_ascii_lowercase().as_str() {
        "mongo" | "mongodb" => Some(DatabaseBackend::Mongo),
        "memory" | "mem" => Some(DatabaseBackend::Memory),
        _ => None,
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Pick the connection string: an explicit URI wins, otherwise an Atlas SRV URI
/// is assembled from credentials and cluster host when all three are present.
fn resolve_mongo_uri(
    uri: Option<String>,
    user: Option<String>,
    pass: Option<String>,
    host: Option<String>,
) -> Option<String> {
    if let Some(uri) = uri.filter(|u| !u.is_empty()) {
        return Some(uri);
    }

    let (user, pass, host) = (user?, pass?, host?);
    let mut srv = match url::Url::parse(&format!("mongodb+srv://{}/?retryWrites=true&w=majority", host)) {
        Ok(srv) => srv,
        Err(e) => {
            tracing::warn!("Ignoring invalid MONGODB_HOST {:?}: {}", host, e);
            return None;
        }
    };
    // Userinfo setters percent-encode, so reserved characters and spaces survive
    srv.set_username(&user).ok()?;
    srv.set_password(Some(&pass)).ok()?;

    Some(srv.into())
}
