// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Static bearer token protecting the admin routes.
    pub admin_token: String,
    /// Directory holding uploaded element images; orphan cleanup scans it.
    pub upload_dir: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:survey.db".to_string());

        let admin_token = env::var("ADMIN_TOKEN").expect("ADMIN_TOKEN must be set");

        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            admin_token,
            upload_dir,
            rust_log,
        }
    }
}
