use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub bind_host: String,
    pub bind_port: u16,
    /// Slot granularity used when partitioning availability windows.
    pub slot_granularity_minutes: i64,
    /// Fixed appointment length; every booking occupies exactly this span.
    pub session_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            jwt_secret: env::var("CLINIC_JWT_SECRET").unwrap_or_else(|_| {
                warn!("CLINIC_JWT_SECRET not set, using empty value");
                String::new()
            }),
            bind_host: env::var("CLINIC_BIND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            bind_port: env::var("CLINIC_BIND_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            slot_granularity_minutes: env::var("CLINIC_SLOT_GRANULARITY_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&minutes| minutes >= 1)
                .unwrap_or_else(|| {
                    if env::var("CLINIC_SLOT_GRANULARITY_MINUTES").is_ok() {
                        warn!("CLINIC_SLOT_GRANULARITY_MINUTES must be a positive number of minutes, using 30");
                    }
                    30
                }),
            session_minutes: 60,
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty()
    }
}
