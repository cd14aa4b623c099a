use parvu::config::{AppConfig, ConfigManager};
use std::fs;
use tempfile::TempDir;

// Helper to create a temporary config directory for testing
fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());
    (temp_dir, config_manager)
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.version, "0.3");

    // Check query defaults
    assert_eq!(config.query.virtual_table_name, "data");
    assert_eq!(config.query.page_size, 100);
    assert_eq!(config.query.max_rows, 10_000);
    assert_eq!(config.query.default_query, "SELECT * FROM $(table)");
    assert_eq!(config.query.history_limit, 1000);
    assert!(config.query.enable_history);

    // Check file loading defaults
    assert!(config.file_loading.delimiter.is_none());
    assert!(config.file_loading.has_header.is_none());
    assert!(config.file_loading.compression.is_none());

    // Check recents defaults
    assert!(config.recents.enabled);
    assert_eq!(config.recents.limit, 20);
}

#[test]
fn test_default_config_validates() {
    AppConfig::default().validate().expect("default config must be valid");
}

#[test]
fn test_generate_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let template = config_manager.generate_default_config();

    // Check that template contains expected sections
    assert!(template.contains("[query]"));
    assert!(template.contains("[file_loading]"));
    assert!(template.contains("[recents]"));

    // Check that it contains version
    assert!(template.contains("version = \"0.3\""));
}

#[test]
fn test_write_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let config_path = config_manager
        .write_default_config(false)
        .expect("Failed to write config");

    assert!(config_path.exists());

    let content = fs::read_to_string(&config_path).expect("Failed to read config");
    assert!(content.contains("[query]"));
    assert!(content.contains("version = \"0.3\""));
}

#[test]
fn test_write_default_config_refuses_overwrite() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    config_manager.write_default_config(false).unwrap();
    assert!(config_manager.write_default_config(false).is_err());
    // --force overwrites
    assert!(config_manager.write_default_config(true).is_ok());
}

#[test]
fn test_template_parses_to_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let template = config_manager.generate_default_config();
    let parsed: AppConfig = toml::from_str(&template).expect("template must parse");

    // Everything in the template is commented out, so it must equal defaults
    let default = AppConfig::default();
    assert_eq!(parsed.query.virtual_table_name, default.query.virtual_table_name);
    assert_eq!(parsed.query.page_size, default.query.page_size);
    assert_eq!(parsed.query.max_rows, default.query.max_rows);
    assert_eq!(parsed.recents.limit, default.recents.limit);
}

#[test]
fn test_merge_user_values_take_precedence() {
    let mut config = AppConfig::default();
    let user: AppConfig = toml::from_str(
        r#"
        [query]
        virtual_table_name = "trades"
        page_size = 50

        [file_loading]
        delimiter = 59

        [recents]
        limit = 5
        "#,
    )
    .unwrap();

    config.merge(user);

    assert_eq!(config.query.virtual_table_name, "trades");
    assert_eq!(config.query.page_size, 50);
    // untouched fields keep defaults
    assert_eq!(config.query.max_rows, 10_000);
    assert_eq!(config.file_loading.delimiter, Some(59));
    assert_eq!(config.recents.limit, 5);
    assert!(config.recents.enabled);
}

#[test]
fn test_validate_rejects_zero_page_size() {
    let mut config = AppConfig::default();
    config.query.page_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_zero_max_rows() {
    let mut config = AppConfig::default();
    config.query.max_rows = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_bad_table_name() {
    let mut config = AppConfig::default();
    for bad in ["", "1data", "my table", "da-ta", "data;drop"] {
        config.query.virtual_table_name = bad.to_string();
        assert!(config.validate().is_err(), "{:?} should be rejected", bad);
    }

    config.query.virtual_table_name = "my_table2".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_rejects_unknown_compression() {
    let mut config = AppConfig::default();
    config.file_loading.compression = Some("rar".to_string());
    assert!(config.validate().is_err());

    config.file_loading.compression = Some("zstd".to_string());
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_rejects_wrong_version() {
    let mut config = AppConfig::default();
    config.version = "0.1".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_render_vars() {
    let config = AppConfig::default();
    assert_eq!(
        config.render_vars("SELECT * FROM $(table) LIMIT $(limit)"),
        "SELECT * FROM data LIMIT 10000"
    );
    // no placeholders: unchanged
    assert_eq!(config.render_vars("SELECT 1"), "SELECT 1");
}
