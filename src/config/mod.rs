use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub host: String,
    pub port: u16,
    pub session_secret: String,
    pub csrf_secret: String,
    pub frontend_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, env::VarError> {
        let session_secret = env::var("SESSION_SECRET")?;
        Ok(Self {
            mongodb_uri: env::var("MONGODB_URI")?,
            mongodb_db: env::var("MONGODB_DB").unwrap_or_else(|_| "callmap".to_string()),
            host: env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("BACKEND_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            // CSRF tokens get their own secret so rotating one does not
            // invalidate the other; defaults to the session secret.
            csrf_secret: env::var("CSRF_SECRET").unwrap_or_else(|_| session_secret.clone()),
            session_secret,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
        })
    }
}
