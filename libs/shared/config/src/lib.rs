use std::env;
use tracing::warn;

pub const DEFAULT_SLOT_MINUTES: i32 = 30;
pub const DEFAULT_MAX_SUGGESTED_SLOTS: usize = 5;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_host: String,
    pub bind_port: u16,
    pub slot_minutes: i32,
    pub max_suggested_slots: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            bind_host: env::var("SCHEDULER_BIND_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            bind_port: env::var("SCHEDULER_BIND_PORT")
                .ok()
                .and_then(|raw| match raw.parse() {
                    Ok(port) => Some(port),
                    Err(_) => {
                        warn!("SCHEDULER_BIND_PORT is not a valid port, using default");
                        None
                    }
                })
                .unwrap_or(3000),
            slot_minutes: env::var("SCHEDULER_SLOT_MINUTES")
                .ok()
                .and_then(|raw| match raw.parse() {
                    Ok(minutes) => Some(minutes),
                    Err(_) => {
                        warn!("SCHEDULER_SLOT_MINUTES is not a valid integer, using default");
                        None
                    }
                })
                .unwrap_or(DEFAULT_SLOT_MINUTES),
            max_suggested_slots: env::var("SCHEDULER_MAX_SUGGESTED_SLOTS")
                .ok()
                .and_then(|raw| match raw.parse() {
                    Ok(count) => Some(count),
                    Err(_) => {
                        warn!("SCHEDULER_MAX_SUGGESTED_SLOTS is not a valid integer, using default");
                        None
                    }
                })
                .unwrap_or(DEFAULT_MAX_SUGGESTED_SLOTS),
        };

        if !config.is_valid() {
            warn!(
                slot_minutes = config.slot_minutes,
                "Invalid scheduler configuration - falling back to defaults"
            );
            return Self::default();
        }

        config
    }

    pub fn is_valid(&self) -> bool {
        self.slot_minutes > 0 && self.slot_minutes <= 24 * 60
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            bind_port: 3000,
            slot_minutes: DEFAULT_SLOT_MINUTES,
            max_suggested_slots: DEFAULT_MAX_SUGGESTED_SLOTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.is_valid());
        assert_eq!(config.slot_minutes, 30);
        assert_eq!(config.max_suggested_slots, 5);
    }

    #[test]
    fn rejects_non_positive_slot_duration() {
        let config = AppConfig {
            slot_minutes: 0,
            ..AppConfig::default()
        };
        assert!(!config.is_valid());
    }
}
