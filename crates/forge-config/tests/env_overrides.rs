use figment::Jail;
use forge_config::{ConfigError, ForgeConfig};

#[test]
fn env_fills_every_section() {
    Jail::expect_with(|jail| {
        jail.set_env("PROXYFORGE_DATABASE__PATH", ":memory:");
        jail.set_env("PROXYFORGE_DATABASE__RUN_MIGRATIONS", "false");
        jail.set_env("PROXYFORGE_LOOKUP__BATCH_SIZE", "25");
        jail.set_env("PROXYFORGE_CACHE__DEFAULT_TTL_SECS", "120");
        jail.set_env("PROXYFORGE_HISTORY__DEFAULT_LIMIT", "5");

        let config = ForgeConfig::load().expect("config loads");
        assert!(config.database.is_in_memory());
        assert!(!config.database.run_migrations);
        assert_eq!(config.lookup.batch_size, 25);
        assert_eq!(config.cache.default_ttl_secs, 120);
        assert_eq!(config.history.default_limit, 5);
        Ok(())
    });
}

/// Typo'd keys are silently ignored by figment; the default stays.
#[test]
fn typo_env_var_silently_ignored() {
    Jail::expect_with(|jail| {
        jail.set_env("PROXYFORGE_DATABASE__PAHT", "typo.db");

        let config = ForgeConfig::load().expect("config loads");
        assert_eq!(config.database.path, ".proxyforge/proxyforge.db");
        Ok(())
    });
}

#[test]
fn env_zero_retries_is_invalid() {
    Jail::expect_with(|jail| {
        jail.set_env("PROXYFORGE_DATABASE__CONFLICT_RETRIES", "0");

        let err = ForgeConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        Ok(())
    });
}

#[test]
fn unparsable_env_value_is_figment_error() {
    Jail::expect_with(|jail| {
        jail.set_env("PROXYFORGE_LOOKUP__BATCH_SIZE", "lots");

        let err = ForgeConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)));
        Ok(())
    });
}
