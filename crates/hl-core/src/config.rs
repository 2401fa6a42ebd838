use chrono::Duration;

/// Tunable operational parameters. Every value has a default and an
/// environment override, read once at startup.
#[derive(Debug, Clone)]
pub struct HelplineConfig {
    /// Coins credited to an assistant per completed dialog.
    pub coin_award: i64,
    /// A conversation older than this with no resolution is swept.
    pub idle_timeout_secs: i64,
    /// A pending offer unanswered for this long counts as ignored.
    pub offer_timeout_secs: i64,
    /// Trailing window over which rejection/ignore penalties count.
    pub penalty_window_secs: i64,
    /// Lifetime of transient per-actor compose state.
    pub session_ttl_secs: i64,
    /// Interval between sweeper passes in the long-running binary.
    pub sweep_interval_secs: u64,
}

impl Default for HelplineConfig {
    fn default() -> Self {
        Self {
            coin_award: 1,
            idle_timeout_secs: 60 * 60,
            offer_timeout_secs: 10 * 60,
            penalty_window_secs: 24 * 60 * 60,
            session_ttl_secs: 15 * 60,
            sweep_interval_secs: 5 * 60,
        }
    }
}

impl HelplineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            coin_award: env_parse("HELPLINE_COIN_AWARD", defaults.coin_award),
            idle_timeout_secs: env_parse("HELPLINE_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs),
            offer_timeout_secs: env_parse(
                "HELPLINE_OFFER_TIMEOUT_SECS",
                defaults.offer_timeout_secs,
            ),
            penalty_window_secs: env_parse(
                "HELPLINE_PENALTY_WINDOW_SECS",
                defaults.penalty_window_secs,
            ),
            session_ttl_secs: env_parse("HELPLINE_SESSION_TTL_SECS", defaults.session_ttl_secs),
            sweep_interval_secs: env_parse(
                "HELPLINE_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval_secs,
            ),
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::seconds(self.idle_timeout_secs)
    }

    pub fn offer_timeout(&self) -> Duration {
        Duration::seconds(self.offer_timeout_secs)
    }

    pub fn penalty_window(&self) -> Duration {
        Duration::seconds(self.penalty_window_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_secs)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = HelplineConfig::default();
        assert_eq!(config.coin_award, 1);
        assert_eq!(config.idle_timeout_secs, 3600);
        assert_eq!(config.penalty_window_secs, 86400);
    }
}
