use letterpage_printing::{MediaProfile, PagePrototype};
use letterpage_settings::{Settings, SettingsError, SettingsStore};
use std::fs;
use tempfile::tempdir;

#[test]
fn load_missing_file_returns_defaults() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("letterpage.json");

    let store = SettingsStore::load(&path).expect("load defaults");
    let settings = store.settings();
    assert_eq!(settings.screen, PagePrototype::a4_screen());
    assert_eq!(settings.print.prototype, PagePrototype::a4_print());
    assert_eq!(settings.print.zoom_percent, 125);
    assert_eq!(settings.header_template, "&l&s&r&o");
    assert_eq!(settings.login.sdk_version, "v8.0");
    assert!(!path.exists(), "loading defaults must not create the file");
}

#[test]
fn save_and_reload_roundtrip() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("nested").join("letterpage.json");

    let mut store = SettingsStore::new(path.clone(), Settings::default());
    store
        .update(|settings| {
            settings.store_name = "Corner Shop".to_string();
            settings.print.zoom_percent = 150;
            settings.login.app_id = "1234".to_string();
        })
        .expect("save");

    let reloaded = SettingsStore::load(&path).expect("reload");
    assert_eq!(reloaded.settings().store_name, "Corner Shop");
    assert_eq!(reloaded.settings().print.zoom_percent, 150);
    assert!(reloaded.settings().login.is_enabled());
    assert!(!path.with_extension("tmp").exists());
}

#[test]
fn overwrite_sanitizes_values() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("letterpage.json");

    let mut store = SettingsStore::load(&path).expect("default");
    let mut settings = store.settings().clone();
    settings.print.zoom_percent = 0;
    settings.screen.footer_height_mm = -4.0;
    settings.store_name = "  Corner Shop ".to_string();

    store.overwrite(settings).expect("overwrite");

    let current = store.settings();
    assert_eq!(current.print.zoom_percent, 125);
    assert_eq!(current.screen, PagePrototype::a4_screen());
    assert_eq!(current.store_name, "Corner Shop");
}

#[test]
fn partial_file_fills_in_defaults() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("letterpage.json");
    fs::write(
        &path,
        r#"{
            "version": 0,
            "print": { "zoom_percent": 110 },
            "store_name": "Corner Shop"
        }"#,
    )
    .expect("write partial settings");

    let store = SettingsStore::load(&path).expect("load partial file");
    let settings = store.settings();
    assert_eq!(settings.version, 1);
    assert_eq!(settings.print.prototype, PagePrototype::a4_print());
    assert_eq!(settings.print.zoom_percent, 110);
    assert_eq!(settings.prototype_for(MediaProfile::Screen), PagePrototype::a4_screen());
    assert_eq!(settings.login.exchange_endpoint, "/customer/login/facebook/");
}

#[test]
fn import_keeps_backup_of_previous_file() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("letterpage.json");
    let export_path = temp.path().join("exported.json");

    let mut store = SettingsStore::new(path.clone(), Settings::default());
    store.save().expect("initial save");

    let mut other = SettingsStore::new(temp.path().join("other.json"), Settings::default());
    other.settings_mut().store_name = "Imported Shop".to_string();
    other.export_to(&export_path).expect("export");

    store.import_from(&export_path).expect("import");
    assert_eq!(store.settings().store_name, "Imported Shop");

    let backup = fs::read_to_string(path.with_extension("bak")).expect("backup");
    assert!(!backup.contains("Imported Shop"));
    let reloaded = SettingsStore::load(&path).expect("reload");
    assert_eq!(reloaded.settings().store_name, "Imported Shop");
}

#[test]
fn malformed_file_reports_path() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("letterpage.json");
    fs::write(&path, "{ not json").expect("write");

    let err = SettingsStore::load(&path).unwrap_err();
    assert!(matches!(err, SettingsError::Parse { .. }));
    assert!(err.to_string().contains("letterpage.json"));
}
