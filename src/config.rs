use std::env;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    pub store_backend: StoreBackend,
    pub database_url: Option<String>,

    pub jwt_secret: String,

    pub sentiment_api_url: String,
    pub sentiment_timeout_secs: u64,
    pub analyze_max_per_minute: u32,

    // Profile documents may land shortly after sign-up
    pub session_ready_attempts: u32,
    pub session_ready_delay_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".into())
            .to_lowercase()
            .as_str()
        {
            "memory" => StoreBackend::Memory,
            _ => StoreBackend::Postgres,
        };

        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            panic!("DATABASE_URL must be set when STORE_BACKEND=postgres");
        }

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            // In dev, also allow LAN access (e.g. testing from another device)
            cors_extra_origins: env::var("CORS_EXTRA_ORIGINS")
                .map(|v| parse_origin_list(&v))
                .unwrap_or_default(),

            store_backend,
            database_url,

            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),

            sentiment_api_url: env::var("SENTIMENT_API_URL")
                .unwrap_or_else(|_| "http://localhost:5000/analyze".into()),
            sentiment_timeout_secs: env::var("SENTIMENT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .unwrap_or(30),
            analyze_max_per_minute: env::var("ANALYZE_MAX_PER_MINUTE")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),

            session_ready_attempts: env::var("SESSION_READY_ATTEMPTS")
                .unwrap_or_else(|_| "3".into())
                .parse()
                .unwrap_or(3),
            session_ready_delay_ms: env::var("SESSION_READY_DELAY_MS")
                .unwrap_or_else(|_| "500".into())
                .parse()
                .unwrap_or(500),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:3000".into(),
            cors_extra_origins: Vec::new(),
            store_backend: StoreBackend::Memory,
            database_url: None,
            jwt_secret: "test-secret".into(),
            sentiment_api_url: "http://localhost:0/analyze".into(),
            sentiment_timeout_secs: 1,
            analyze_max_per_minute: 3,
            session_ready_attempts: 2,
            session_ready_delay_ms: 0,
        }
    }
}
