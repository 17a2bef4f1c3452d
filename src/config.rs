// config.rs
use tracing_subscriber::filter::LevelFilter;

pub const DEFAULT_HUNTER_API_URL: &str = "https://api.hunter.io/v2/email-verifier";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    /// Access token lifetime, in minutes.
    pub jwt_maxage: i64,
    /// Refresh token lifetime, in minutes.
    pub jwt_refresh_maxage: i64,
    pub hunter_api_url: String,
    pub hunter_api_key: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        let redis_url = std::env::var("REDIS_URL").ok().filter(|v| !v.is_empty());
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let hunter_api_key = std::env::var("HUNTER_API_KEY").expect("HUNTER_API_KEY must be set");

        let jwt_maxage = std::env::var("JWT_MAXAGE")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(60);
        let jwt_refresh_maxage = std::env::var("JWT_REFRESH_MAXAGE")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(60 * 24);

        let hunter_api_url = std::env::var("HUNTER_API_URL")
            .unwrap_or_else(|_| DEFAULT_HUNTER_API_URL.to_string());

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8000);

        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173,http://localhost:8000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let log_level = std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|v| v.parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::DEBUG);

        Config {
            database_url,
            redis_url,
            jwt_secret,
            jwt_maxage,
            jwt_refresh_maxage,
            hunter_api_url,
            hunter_api_key,
            port,
            cors_origins,
            log_level,
        }
    }
}
