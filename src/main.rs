mod config;
mod db;
mod dtos;
mod error;
mod extractor;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use axum::http::{header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE}, HeaderValue, Method};
use config::Config;
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::db::{
    cache::{MemoryReferralCodeCache, RedisReferralCodeCache, ReferralCodeCache},
    db::DBClient,
    memory::MemoryDb,
    referraldb::ReferralCodeExt,
    userdb::UserExt,
};
use crate::service::{
    account::AccountService,
    email_verifier::{EmailVerifier, HunterEmailVerifier},
    referral::ReferralService,
};

#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    pub account_service: Arc<AccountService>,
    pub referral_service: Arc<ReferralService>,
}

impl AppState {
    pub fn new(
        config: Config,
        users: Arc<dyn UserExt>,
        referral_codes: Arc<dyn ReferralCodeExt>,
        cache: Arc<dyn ReferralCodeCache>,
        verifier: Arc<dyn EmailVerifier>,
    ) -> Self {
        let referral_service = Arc::new(ReferralService::new(referral_codes, cache));
        let account_service = Arc::new(AccountService::new(
            users,
            verifier,
            referral_service.clone(),
        ));

        Self {
            env: config,
            account_service,
            referral_service,
        }
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let config = Config::init();

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    let (users, referral_codes): (Arc<dyn UserExt>, Arc<dyn ReferralCodeExt>) =
        match config.database_url {
            Some(ref database_url) => {
                let pool = match PgPoolOptions::new()
                    .max_connections(10)
                    .connect(database_url)
                    .await
                {
                    Ok(pool) => {
                        println!("✅ Connection to the database is successful!");
                        pool
                    }
                    Err(err) => {
                        println!("🔥 Failed to connect to the database: {:?}", err);
                        std::process::exit(1);
                    }
                };

                let db_client = Arc::new(DBClient::new(pool));
                if let Err(err) = db_client.run_migrations().await {
                    println!("🔥 Failed to run database migrations: {:?}", err);
                    std::process::exit(1);
                }

                (db_client.clone(), db_client)
            }
            None => {
                println!("ℹ️  DATABASE_URL not set - using the in-memory store");
                let memory_db = Arc::new(MemoryDb::new());
                (memory_db.clone(), memory_db)
            }
        };

    let cache: Arc<dyn ReferralCodeCache> = match config.redis_url {
        Some(ref redis_url) => match RedisReferralCodeCache::connect(redis_url).await {
            Ok(cache) => Arc::new(cache),
            Err(e) => {
                println!("⚠️  Redis initialization error: {} - using the in-process cache", e);
                Arc::new(MemoryReferralCodeCache::new())
            }
        },
        None => {
            println!("ℹ️  REDIS_URL not set - using the in-process cache");
            Arc::new(MemoryReferralCodeCache::new())
        }
    };

    let verifier = Arc::new(HunterEmailVerifier::new(
        config.hunter_api_url.clone(),
        config.hunter_api_key.clone(),
    ));

    let allowed_origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE]);

    let app_state = Arc::new(AppState::new(
        config.clone(),
        users,
        referral_codes,
        cache,
        verifier,
    ));

    let app = create_router(app_state.clone()).layer(cors);

    println!("🚀 Server is running on http://localhost:{}", config.port);
    println!(
        "📊 Cache backend: {}",
        app_state.referral_service.cache_backend()
    );

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", &config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            println!("🔥 Failed to bind port {}: {:?}", config.port, err);
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", err);
    }
}
