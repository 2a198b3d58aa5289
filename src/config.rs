use std::env;

/// Process configuration, read once at start-up and carried in `AppState`.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    /// Base URL of the hosted crop-disease model (a Gradio space)
    pub disease_model_url: String,
    pub disease_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .expect("JWT_EXPIRATION_HOURS must be a number"),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            disease_model_url: env::var("DISEASE_MODEL_URL")
                .unwrap_or_else(|_| "https://biswa000-rice.hf.space".to_string()),
            disease_timeout_secs: env::var("DISEASE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .expect("DISEASE_TIMEOUT_SECS must be a number"),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| (10 * 1024 * 1024).to_string())
                .parse()
                .expect("MAX_UPLOAD_BYTES must be a number"),
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
