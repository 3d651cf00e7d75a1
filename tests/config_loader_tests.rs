use backoffice::config::{ConfigError, ConfigLoader};
use std::{
    env, fs,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

const VARS: &[&str] = &[
    "BACKOFFICE_PROFILE",
    "BACKOFFICE_API_BIND_ADDR",
    "BACKOFFICE_LOG_LEVEL",
    "BACKOFFICE_JWT_SECRET",
    "BACKOFFICE_DB_MAX_CONNECTIONS",
    "BACKOFFICE_PASSWORD_HASH_COST",
    "BACKOFFICE_CORS_ALLOWED_ORIGINS",
];

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    for var in VARS {
        unsafe {
            env::remove_var(var);
        }
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    fs::write(dir.path().join(name), contents).unwrap();
}

#[test]
fn loads_defaults_when_no_env_present() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let cfg = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:8080");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.jwt_ttl_seconds, 86_400);
    assert_eq!(cfg.verification_code_ttl_hours, 24);
    assert!(cfg.jwt_secret.is_none());
    cfg.bind_addr().expect("default bind addr parses");
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "BACKOFFICE_API_BIND_ADDR=127.0.0.1:3000\n");
    write_env_file(
        &temp_dir,
        ".env.local",
        "BACKOFFICE_PROFILE=test\nBACKOFFICE_API_BIND_ADDR=127.0.0.1:4000\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test",
        "BACKOFFICE_API_BIND_ADDR=192.168.0.10:5000\nBACKOFFICE_LOG_LEVEL=debug\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test.local",
        "BACKOFFICE_API_BIND_ADDR=10.0.0.5:6000\n",
    );

    let cfg = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .expect("config loads");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.api_bind_addr, "10.0.0.5:6000");
    assert_eq!(cfg.log_level, "debug");
}

#[test]
fn process_env_overrides_files() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "BACKOFFICE_API_BIND_ADDR=127.0.0.1:3000\n");
    unsafe {
        env::set_var("BACKOFFICE_API_BIND_ADDR", "127.0.0.1:9000");
        env::set_var(
            "BACKOFFICE_CORS_ALLOWED_ORIGINS",
            "https://admin.example.com, https://ops.example.com",
        );
    }

    let cfg = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .expect("config loads");
    clear_env();

    assert_eq!(cfg.api_bind_addr, "127.0.0.1:9000");
    assert_eq!(
        cfg.cors_allowed_origins,
        vec!["https://admin.example.com", "https://ops.example.com"]
    );
}

#[test]
fn malformed_numbers_are_reported() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "BACKOFFICE_DB_MAX_CONNECTIONS=many\n");

    let result = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf()).load();
    assert!(matches!(
        result,
        Err(ConfigError::InvalidValue {
            key: "DB_MAX_CONNECTIONS",
            ..
        })
    ));
}

#[test]
fn production_requires_a_strong_secret() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "BACKOFFICE_PROFILE=prod\nBACKOFFICE_JWT_SECRET=short\n",
    );
    let loader = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf());

    let cfg = loader.load().expect("config loads");
    assert!(matches!(
        cfg.validate(),
        Err(ConfigError::WeakJwtSecret { length: 5 })
    ));

    write_env_file(
        &temp_dir,
        ".env",
        "BACKOFFICE_PROFILE=prod\nBACKOFFICE_JWT_SECRET=0123456789abcdef0123456789abcdef\n",
    );
    loader
        .load()
        .expect("config loads")
        .validate()
        .expect("strong secret validates");
}

#[test]
fn missing_secret_fails_validation() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let cfg = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .expect("config loads");
    assert!(matches!(cfg.validate(), Err(ConfigError::MissingJwtSecret)));
}
