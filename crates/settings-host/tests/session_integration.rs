//! Integration tests for the settings host.
//!
//! These tests exercise the full path from a TOML host configuration through
//! the session use case to settings files on disk and the association
//! registrars, using temporary directories instead of the user's real folders.

use std::path::PathBuf;
use std::sync::Arc;

use settings_core::{SettingsError, SettingsStore};
use settings_host::application::session::{SessionError, SettingsSession};
use settings_host::infrastructure::association::mock::InMemoryRegistrar;
use settings_host::infrastructure::storage::config::{load_config_from, save_config_to, HostConfig};
use uuid::Uuid;

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("settings_host_it_{}", Uuid::new_v4()))
}

/// Writes a host configuration whose named saves land in `dir/docs`.
fn write_config(dir: &std::path::Path) -> PathBuf {
    let path = dir.join("host.toml");
    let toml_str = format!(
        r#"
[host]
association = "test"
log_level = "debug"
documents_dir = {docs:?}

[defaults]
a = "A"
ab = "A"
abc = 1
abcd = 2
"#,
        docs = dir.join("docs").to_string_lossy()
    );
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(&path, toml_str).unwrap();
    path
}

#[test]
fn test_config_to_saved_file_to_second_session() {
    // Arrange
    let dir = scratch_dir();
    let config = load_config_from(&write_config(&dir)).expect("config");
    let registrar = Arc::new(InMemoryRegistrar::new());

    // Act: first session changes a value and saves under a name
    let mut first = SettingsSession::from_config(&config, registrar.clone()).unwrap();
    first.set_from_text("ab", Some("B")).unwrap();
    let written = first.save(Some("profile")).unwrap();

    // Act: second session opens the file as the OS would hand it over
    let mut second = SettingsSession::from_config(&config, registrar).unwrap();
    second.open(&written).unwrap();

    // Assert
    assert_eq!(written, dir.join("docs").join("profile.test"));
    assert_eq!(second.store().get::<String>("a").unwrap(), "A");
    assert_eq!(second.store().get::<String>("ab").unwrap(), "B");
    assert_eq!(second.store().get::<i64>("abc").unwrap(), 1);
    assert_eq!(second.store().current_file(), Some(written.as_path()));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_file_written_by_another_schema_adds_file_only_keys() {
    // Arrange: a file with an extra key, written directly through the core API
    let dir = scratch_dir();
    let config = load_config_from(&write_config(&dir)).unwrap();
    let mut writer = SettingsStore::new(
        vec![("window_title", settings_core::SettingValue::from("Main"))],
        "test",
    )
    .unwrap();
    let path = writer.save_to(dir.join("foreign.test")).unwrap();

    // Act
    let mut session =
        SettingsSession::from_config(&config, Arc::new(InMemoryRegistrar::new())).unwrap();
    session.open(&path).unwrap();
    let lines = session.show();

    // Assert
    let extra = lines.iter().find(|l| l.key == "window_title").unwrap();
    assert!(!extra.has_default);
    assert_eq!(extra.value, "Main");
    assert_eq!(lines.len(), 5);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_set_and_resave_current_file() {
    let dir = scratch_dir();
    let config = load_config_from(&write_config(&dir)).unwrap();
    let mut session =
        SettingsSession::from_config(&config, Arc::new(InMemoryRegistrar::new())).unwrap();
    let path = session.save_to(&dir.join("current.test")).unwrap();

    session.set_from_text("abcd", Some("40")).unwrap();
    let resaved = session.save(None).unwrap();

    let mut check =
        SettingsSession::from_config(&config, Arc::new(InMemoryRegistrar::new())).unwrap();
    check.open(&resaved).unwrap();
    assert_eq!(resaved, path);
    assert_eq!(check.store().get::<i64>("abcd").unwrap(), 40);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_reset_then_save_without_target_fails() {
    let dir = scratch_dir();
    let config = load_config_from(&write_config(&dir)).unwrap();
    let mut session =
        SettingsSession::from_config(&config, Arc::new(InMemoryRegistrar::new())).unwrap();
    session.save(Some("profile")).unwrap();

    session.reset();

    assert!(matches!(
        session.save(None),
        Err(SessionError::Settings(SettingsError::NoTargetSpecified))
    ));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_config_round_trip_keeps_schema() {
    let dir = scratch_dir();
    let original = load_config_from(&write_config(&dir)).unwrap();
    let copy_path = dir.join("copy").join("host.toml");

    save_config_to(&copy_path, &original).unwrap();
    let copy: HostConfig = load_config_from(&copy_path).unwrap();

    assert_eq!(copy, original);
    assert_eq!(copy.schema().unwrap().len(), 4);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_association_cycle_with_in_memory_registrar() {
    let dir = scratch_dir();
    let config = load_config_from(&write_config(&dir)).unwrap();
    let registrar = Arc::new(InMemoryRegistrar::new());
    let session = SettingsSession::from_config(&config, registrar.clone()).unwrap();

    if session.association_status().registered {
        session.deregister().unwrap();
    }
    assert!(!session.association_status().registered);

    session.register().unwrap();
    assert!(session.association_status().registered);
    assert_eq!(
        registrar.registrations.lock().unwrap().get("test"),
        std::env::current_exe().ok().as_ref()
    );

    session.deregister().unwrap();
    assert!(!session.association_status().registered);

    std::fs::remove_dir_all(&dir).ok();
}

#[cfg(target_os = "linux")]
#[test]
fn test_association_cycle_with_xdg_registrar() {
    use settings_host::infrastructure::association::linux::XdgAssociationRegistrar;

    // Arrange
    let dir = scratch_dir();
    let config = load_config_from(&write_config(&dir)).unwrap();
    let registrar = Arc::new(XdgAssociationRegistrar::with_roots(
        dir.join("xdg-data"),
        dir.join("xdg-config"),
    ));
    let session = SettingsSession::from_config(&config, registrar).unwrap();

    // Act / Assert
    assert!(!session.association_status().registered);
    session.register().unwrap();
    assert!(session.association_status().registered);
    let mimeapps = std::fs::read_to_string(dir.join("xdg-config").join("mimeapps.list")).unwrap();
    assert!(mimeapps.contains("application/x-test=settings-host-test.desktop"));
    session.deregister().unwrap();
    assert!(!session.association_status().registered);

    std::fs::remove_dir_all(&dir).ok();
}
