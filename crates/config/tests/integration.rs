//! Integration tests for config

#[cfg(test)]
mod tests {
    use modelsync_config::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_VARS: [&str; 5] = [
        "MODELSYNC_TIMEOUT",
        "MODELSYNC_CONNECT_TIMEOUT",
        "MODELSYNC_CHUNK_TIMEOUT",
        "MODELSYNC_MODELS_DIR",
        "MODELSYNC_REQUIRED_FILES",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[network]
timeout = 120
connect_timeout = 5
user_agent = "ocr-service/1.0"

[store]
models_dir = "/srv/models"

[validation]
required_files = ["inference.pdiparams", "inference.pdmodel"]
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.network.timeout, 120);
        assert_eq!(config.network.connect_timeout, 5);
        assert_eq!(config.network.chunk_timeout, 60);
        assert_eq!(config.network.user_agent.as_deref(), Some("ocr-service/1.0"));
        assert_eq!(config.models_dir(), PathBuf::from("/srv/models"));
        assert_eq!(
            config.validation.required_files,
            vec!["inference.pdiparams", "inference.pdmodel"]
        );
    }

    #[tokio::test]
    async fn test_empty_file_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.network.timeout, 120);
        assert_eq!(config.validation.required_files, vec![DEFAULT_REQUIRED_FILE]);
    }

    #[tokio::test]
    async fn test_invalid_toml_is_parse_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[network\ntimeout = ").unwrap();
        let err = Config::load_from_file(temp_file.path()).await.unwrap_err();
        assert!(matches!(
            err,
            modelsync_errors::Error::Config(modelsync_errors::ConfigError::ParseError { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let err = Config::load_from_file(std::path::Path::new("/nonexistent/modelsync.toml"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            modelsync_errors::Error::Config(modelsync_errors::ConfigError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_zero_timeout_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[network]\ntimeout = 0").unwrap();
        assert!(Config::load_from_file(temp_file.path()).await.is_err());
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("MODELSYNC_TIMEOUT", "42");
        std::env::set_var("MODELSYNC_MODELS_DIR", "/tmp/models");
        std::env::set_var("MODELSYNC_REQUIRED_FILES", "a.bin, b.bin ,");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.network.timeout, 42);
        assert_eq!(config.models_dir(), PathBuf::from("/tmp/models"));
        assert_eq!(config.validation.required_files, vec!["a.bin", "b.bin"]);

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("MODELSYNC_CONNECT_TIMEOUT", "soon");

        let mut config = Config::default();
        assert!(config.merge_env().is_err());

        clear_env();
    }
}
