use serde::Deserialize;

const DEV_SESSION_SECRET: &str = "CHANGE_ME_DEV_SESSION_SECRET";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub session_secret: String,
    /// `file://<dir>`, `s3://bucket?region=..&endpoint=..` or `memory://`.
    /// Set via UPLOAD_STORE_URL. Default: file://./uploads.
    pub upload_store_url: String,
    /// Per-file upload limit in bytes. Default: 5 MB.
    pub max_upload_bytes: usize,
    /// Browser origin allowed by CORS.
    pub cors_origin: String,
}

impl Config {
    /// Defaults suitable for tests and `serve --in-memory`.
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            database_url: String::new(),
            session_secret: "test-session-secret".into(),
            upload_store_url: "memory://".into(),
            max_upload_bytes: 5 * 1024 * 1024,
            cors_origin: "http://localhost:5173".into(),
        }
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let session_secret =
        std::env::var("SESSION_SECRET").unwrap_or_else(|_| DEV_SESSION_SECRET.into());

    if session_secret == DEV_SESSION_SECRET {
        let env_mode = std::env::var("APP_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "SESSION_SECRET is still the insecure placeholder. \
                 Set a long random secret before running in production."
            );
        }
        eprintln!("⚠️  SESSION_SECRET is not set, using insecure placeholder. Set a random secret for production.");
    }

    Ok(Config {
        port: std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .unwrap_or(5000),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/startupmatch".into()),
        session_secret,
        upload_store_url: std::env::var("UPLOAD_STORE_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "file://./uploads".into()),
        max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5 * 1024 * 1024),
        cors_origin: std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:5173".into()),
    })
}
