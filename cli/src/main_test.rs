use super::*;
use privacy_prefs::CategorySetting;

fn settings() -> Settings {
    Settings {
        save_as_cookie: Some(false),
        categories: Some(vec![
            CategorySetting { name: "functional".into(), checked: true },
            CategorySetting { name: "analytical".into(), checked: false },
        ]),
        ..Settings::default()
    }
}

#[test]
fn parse_toggle_accepts_boolean_spellings() {
    assert_eq!(parse_toggle("functional=true").expect("toggle"), ("functional", true));
    assert_eq!(parse_toggle("functional=OFF").expect("toggle"), ("functional", false));
    assert_eq!(parse_toggle(" targeting = yes ").expect("toggle"), ("targeting", true));
    assert_eq!(parse_toggle("analytical=0").expect("toggle"), ("analytical", false));
}

#[test]
fn parse_toggle_rejects_malformed_input() {
    for raw in ["functional", "=true", "functional=maybe", "functional="] {
        let err = parse_toggle(raw).expect_err("should fail");
        assert!(matches!(err, CliError::InvalidToggle(ref got) if got == raw));
    }
}

#[test]
fn build_options_creates_one_control_per_category() {
    let options = build_options(settings(), None, None);

    let form = options.form.as_ref().expect("form bound");
    assert_eq!(form.checked("functional"), Some(true));
    assert_eq!(form.checked("analytical"), Some(false));
    assert_eq!(options.save_as_cookie, Some(false));
}

#[test]
fn build_options_applies_cli_overrides() {
    let options = build_options(settings(), Some(Backend::Cookie), Some("consent".into()));

    assert_eq!(options.save_as_cookie, Some(true));
    assert_eq!(options.storage_key.as_deref(), Some("consent"));
}

#[test]
fn build_options_without_categories_binds_empty_form() {
    let options = build_options(Settings::default(), None, None);

    let form = options.form.as_ref().expect("form bound");
    assert_eq!(form.names().count(), 0);
    assert!(options.categories.as_ref().is_some_and(Vec::is_empty));
}

#[test]
fn state_file_round_trips_through_manager() {
    let cookies = Rc::new(RefCell::new(MemoryCookieJar::new()));
    let local = Rc::new(RefCell::new(MemoryStorage::new()));
    let options = build_options(settings(), None, None);

    let mut manager =
        PreferenceManager::new(options, Backends::new(Rc::clone(&cookies), Rc::clone(&local))).expect("manager");
    assert!(manager.form_mut().set_checked("analytical", true));
    manager.update_preferences(None).expect("update");
    drop(manager);

    let raw = serde_json::to_string(&StateFile { cookies: cookies.borrow().clone(), local: local.borrow().clone() })
        .expect("serialize");
    let restored: StateFile = serde_json::from_str(&raw).expect("deserialize");

    assert_eq!(
        restored.local.get("privacy-preferences"),
        Some(r#"[{"name":"functional","checked":true},{"name":"analytical","checked":true}]"#)
    );
}

#[test]
fn missing_state_file_loads_empty_state() {
    let state = load_state(Path::new("definitely/not/here/prefs-state.json")).expect("load");
    assert!(state.local.is_empty());
}
