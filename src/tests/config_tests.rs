#[cfg(test)]
mod tests {
    use std::env;
    use std::io::Write;

    use jsonwebtoken::Algorithm;
    use tempfile::NamedTempFile;

    use crate::config::{self, AppConfig, MAX_ACCESS_TOKEN_MINUTES};

    fn write_temp_config(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.url, "sqlite://data/historian.db");
        assert_eq!(config.auth.algorithm, "HS256");
        assert_eq!(config.auth.access_token_expire_minutes, 60);
        assert!(!config.api.enforce_meta_types);
        assert!(config.security.is_none());
        assert!(config::validate(&config).is_ok());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = write_temp_config(
            r#"
[server]
port = 9100

[api]
enforce_meta_types = true

[security]
enable_hsts = true
"#,
        );
        let config = config::load_with(file.path().to_str()).unwrap();
        assert_eq!(config.server.port, 9100);
        // Untouched keys keep their defaults
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.api.enforce_meta_types);
        assert_eq!(config.security.unwrap().enable_hsts, Some(true));
    }

    #[test]
    fn test_invalid_file_value_is_rejected() {
        let file = write_temp_config("[server]\nport = 0\n");
        let err = config::load_with(file.path().to_str()).unwrap_err();
        assert!(err.to_string().contains("invalid server.port"));
    }

    #[test]
    fn test_env_has_highest_precedence() {
        let file = write_temp_config("[api]\nmax_body_bytes = 4096\n");
        env::set_var("HISTORIAN__API__MAX_BODY_BYTES", "2048");
        let result = config::load_with(file.path().to_str());
        env::remove_var("HISTORIAN__API__MAX_BODY_BYTES");
        assert_eq!(result.unwrap().api.max_body_bytes, 2048);
    }

    #[test]
    fn test_validation_rules() {
        let mut config = AppConfig::default();
        config.auth.secret_key = String::new();
        assert!(config::validate(&config).is_err());

        let mut config = AppConfig::default();
        config.auth.algorithm = "RS256".to_string();
        assert!(config::validate(&config).is_err());

        let mut config = AppConfig::default();
        config.auth.access_token_expire_minutes = 0;
        assert!(config::validate(&config).is_err());

        let mut config = AppConfig::default();
        config.database.max_connections = 0;
        assert!(config::validate(&config).is_err());

        let mut config = AppConfig::default();
        config.api.max_body_bytes = 0;
        assert!(config::validate(&config).is_err());
    }

    #[test]
    fn test_jwt_algorithm() {
        let mut config = AppConfig::default();
        assert_eq!(config.auth.jwt_algorithm().unwrap(), Algorithm::HS256);
        config.auth.algorithm = "HS512".to_string();
        assert_eq!(config.auth.jwt_algorithm().unwrap(), Algorithm::HS512);
        config.auth.algorithm = "none".to_string();
        assert!(config.auth.jwt_algorithm().is_err());
    }

    #[test]
    fn test_ensure_sqlite_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("historian.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        config::ensure_sqlite_parent_dir(&url).unwrap();
        assert!(dir.path().join("nested").is_dir());

        // Non-file URLs are left alone
        config::ensure_sqlite_parent_dir("sqlite::memory:").unwrap();
    }

    #[test]
    fn test_token_lifetime_is_bounded() {
        let mut config = AppConfig::default();
        config.auth.access_token_expire_minutes = MAX_ACCESS_TOKEN_MINUTES;
        assert!(config::validate(&config).is_ok());

        for minutes in [MAX_ACCESS_TOKEN_MINUTES + 1, i64::MAX, 0, -5] {
            config.auth.access_token_expire_minutes = minutes;
            assert!(config::validate(&config).is_err(), "accepted {} minutes", minutes);
        }
    }
}
