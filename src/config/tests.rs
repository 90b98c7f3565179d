use super::*;
use std::fs;
use tempfile::TempDir;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn config_file_persistence() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");

        let original_config = Config {
            ollama: OllamaConfig {
                protocol: "https".to_string(),
                host: "test-host".to_string(),
                port: 8080,
                model: "test-model".to_string(),
                ..OllamaConfig::default()
            },
            remote_index: RemoteIndexConfig {
                enabled: false,
                api_token: Some("secret".to_string()),
                ..RemoteIndexConfig::default()
            },
            base_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };

        original_config.save().expect("config should save successfully");

        let loaded_config = Config::load(temp_dir.path()).expect("config should load successfully");

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");

        let config = Config::load(temp_dir.path()).expect("should load defaults");

        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.ollama, OllamaConfig::default());
        assert_eq!(config.base_dir, temp_dir.path());
        assert!(!config.config_file_path().exists());
    }

    #[test]
    fn save_creates_config_directory() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        let config_dir = temp_dir.path().join("nested").join("pdf-rag");

        assert!(!config_dir.exists());

        let config = Config {
            base_dir: config_dir.clone(),
            ..Config::default()
        };
        config.save().expect("should save config");

        assert!(config_dir.is_dir());
        assert!(config_dir.join("config.toml").exists());
    }

    #[test]
    fn invalid_toml_handling() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        let invalid_toml = r#"
            [ollama
            host = "localhost"
            port = "invalid_port"
        "#;
        fs::write(temp_dir.path().join("config.toml"), invalid_toml)
            .expect("should write config file");

        assert!(Config::load(temp_dir.path()).is_err());
    }

    #[test]
    fn partial_config_with_defaults() {
        let partial_toml = r#"
            [ollama]
            host = "custom-host"

            [remote_index]
            enabled = false
        "#;

        let config: Config = toml::from_str(partial_toml).expect("should parse partial toml");
        assert_eq!(config.ollama.host, "custom-host");
        assert_eq!(config.ollama.port, 11434);
        assert!(!config.remote_index.enabled);
        assert_eq!(config.remote_index.index_name, "pdf_rag_index");
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn invalid_values_rejected_on_load() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        let bad_toml = r#"
            [remote_index]
            precision = "int4"
        "#;
        fs::write(temp_dir.path().join("config.toml"), bad_toml)
            .expect("should write config file");

        assert!(Config::load(temp_dir.path()).is_err());
    }

    #[test]
    fn local_store_path_resolution() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        let mut config = Config {
            base_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };

        assert_eq!(
            config.local_store_path(),
            temp_dir.path().join("local_vec_store.json")
        );

        let absolute = temp_dir.path().join("elsewhere").join("store.json");
        config.storage.local_store_file = absolute.clone();
        assert_eq!(config.local_store_path(), absolute);
    }
}
