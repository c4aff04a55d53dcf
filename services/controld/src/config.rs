use std::env;
use std::time::Duration;

use sadrn_control_plane::SchedulerConfig;

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub cache_ttl: Duration,
    pub scheduler: SchedulerConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = SchedulerConfig::default();
        Config {
            port: env_or("PORT", 8080),
            cache_ttl: Duration::from_secs(env_or("CACHE_TTL_SECS", 5)),
            scheduler: SchedulerConfig {
                topology_refresh: duration_or("TOPOLOGY_REFRESH_SECS", defaults.topology_refresh),
                battery_drain: duration_or("BATTERY_DRAIN_SECS", defaults.battery_drain),
                traffic: duration_or("TRAFFIC_INTERVAL_SECS", defaults.traffic),
            },
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

fn duration_or(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}
