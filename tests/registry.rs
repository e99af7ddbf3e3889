mod common;

use common::{names, setup_engine};
use std::fs;
use z2f_keeper_lib::models::error::SError;
use z2f_keeper_lib::models::mod_dto::ModStatus;
use z2f_keeper_lib::models::report::ToggleOutcome;

#[test]
fn reconcile_picks_up_both_directories() {
    let env = setup_engine();
    env.add_mod("lions.z2f", true);
    env.add_mod("tigers.z2f", false);
    fs::write(env.active().join("packed.pac.z2f"), b"packed").unwrap();
    fs::write(env.active().join("notes.txt"), b"notes").unwrap();

    let report = env.engine.reconcile().unwrap();
    assert_eq!(names(&report.added), vec!["lions.z2f", "tigers.z2f"]);
    assert_eq!(env.stored_enabled("lions.z2f"), Some(true));
    assert_eq!(env.stored_enabled("tigers.z2f"), Some(false));
    assert_eq!(env.stored_enabled("packed.pac.z2f"), None);
}

#[test]
fn reconcile_is_idempotent() {
    let env = setup_engine();
    env.add_mod("a.z2f", true);
    env.add_mod("b.z2f", false);

    env.engine.reconcile().unwrap();
    let first = env.engine.registry.store.list_mods().unwrap();

    let second_report = env.engine.reconcile().unwrap();
    let second = env.engine.registry.store.list_mods().unwrap();

    assert!(second_report.is_unchanged());
    assert_eq!(first, second);
}

#[test]
fn filesystem_wins_over_stored_state() {
    let env = setup_engine();
    let path = env.add_mod("a.z2f", true);
    env.add_mod("gone.z2f", false);
    env.engine.reconcile().unwrap();

    // Moved and deleted behind the registry's back.
    fs::rename(&path, env.disabled().join("a.z2f")).unwrap();
    fs::remove_file(env.disabled().join("gone.z2f")).unwrap();

    let report = env.engine.reconcile().unwrap();
    assert_eq!(names(&report.updated), vec!["a.z2f"]);
    assert_eq!(names(&report.removed), vec!["gone.z2f"]);
    assert_eq!(env.stored_enabled("a.z2f"), Some(false));
    assert_eq!(env.stored_enabled("gone.z2f"), None);
}

#[test]
fn missing_directory_is_skipped() {
    let env = setup_engine();
    env.add_mod("a.z2f", true);
    fs::remove_dir_all(env.disabled()).unwrap();

    let report = env.engine.reconcile().unwrap();
    assert_eq!(names(&report.added), vec!["a.z2f"]);
    assert!(!report.warnings.is_empty());
}

#[test]
fn duplicate_content_is_grouped() {
    let env = setup_engine();
    let original = env.add_mod("a.z2f", true);
    fs::copy(&original, env.disabled().join("copy_of_a.z2f")).unwrap();
    env.add_mod("unique.z2f", true);

    let report = env.engine.reconcile().unwrap();
    assert_eq!(report.duplicates.len(), 1);
    assert_eq!(names(&report.duplicates[0].mods), vec!["a.z2f", "copy_of_a.z2f"]);
    assert!(report
        .duplicates
        .iter()
        .all(|g| !g.mods.contains(&"unique.z2f".to_string())));

    // The file index was written and a second pass agrees.
    assert!(env.engine.registry.data.file_index.exists());
    assert_eq!(env.engine.reconcile().unwrap().duplicates, report.duplicates);
}

#[test]
fn enable_then_disable_restores_state() {
    let mut env = setup_engine();
    env.add_mod("a.z2f", false);
    env.engine.reconcile().unwrap();
    let before = env.engine.registry.store.list_mods().unwrap();

    env.engine.enable("a.z2f").unwrap();
    assert!(env.is_enabled_on_disk("a.z2f"));
    assert_eq!(env.stored_enabled("a.z2f"), Some(true));

    env.engine
        .disable("a.z2f", &z2f_keeper_lib::core::prompt::AlwaysDecline)
        .unwrap();
    assert!(env.is_disabled_on_disk("a.z2f"));
    assert_eq!(env.engine.registry.store.list_mods().unwrap(), before);
}

#[test]
fn toggle_when_already_in_place_only_writes_flag() {
    let env = setup_engine();
    env.add_mod("a.z2f", true);

    let outcome = env.engine.registry.set_location("a.z2f", true).unwrap();
    assert_eq!(outcome, ToggleOutcome::AlreadySatisfied);
    assert_eq!(env.stored_enabled("a.z2f"), Some(true));
    assert!(env.is_enabled_on_disk("a.z2f"));
}

#[test]
fn toggle_of_missing_file_changes_nothing() {
    let env = setup_engine();
    env.add_mod("a.z2f", false);
    env.engine.reconcile().unwrap();
    fs::remove_file(env.disabled().join("a.z2f")).unwrap();

    let err = env.engine.registry.set_location("a.z2f", true).unwrap_err();
    assert_eq!(err, SError::NotFound("a.z2f".into()));
    assert_eq!(env.stored_enabled("a.z2f"), Some(false));
}

#[test]
fn list_mods_reports_disk_status() {
    let env = setup_engine();
    env.add_mod("on.z2f", true);
    env.add_mod("off.z2f", false);
    env.engine.reconcile().unwrap();
    env.engine.registry.store.set_enabled("ghost.z2f", true).unwrap();

    let views = env.engine.registry.list_mods().unwrap();
    let status = |n: &str| views.iter().find(|v| v.record.name == n).unwrap().status;
    assert_eq!(status("on.z2f"), ModStatus::Enabled);
    assert_eq!(status("off.z2f"), ModStatus::Disabled);
    assert_eq!(status("ghost.z2f"), ModStatus::Missing);
    assert!(views.iter().find(|v| v.record.name == "on.z2f").unwrap().size.is_some());
}

#[test]
fn category_tags_and_details() {
    let env = setup_engine();
    env.add_mod_with("a.z2f", true, &[("ReadMe.txt", "Adds lions."), ("x.xml", "<a/>")]);
    env.engine.reconcile().unwrap();

    env.engine.registry.set_category("a.z2f", "Animals").unwrap();
    env.engine
        .registry
        .set_tags("a.z2f", ["savanna", " big cats ", "", "savanna"])
        .unwrap();
    assert_eq!(
        env.engine.registry.set_category("nope.z2f", "x"),
        Err(SError::NotFound("nope.z2f".into()))
    );

    let record = env.engine.registry.store.get_mod("a.z2f").unwrap().unwrap();
    assert_eq!(record.category, "Animals");
    assert_eq!(
        record.tags.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["big cats", "savanna"]
    );

    let details = env.engine.registry.mod_details("a.z2f").unwrap();
    assert_eq!(details.readme.as_deref(), Some("Adds lions."));
    assert!(details.bundles.is_empty());
}

#[test]
fn load_order_lists_every_mod() {
    let env = setup_engine();
    env.add_mod("a.z2f", true);
    env.add_mod("b.z2f", false);
    env.engine.reconcile().unwrap();

    let path = env.engine.registry.export_load_order().unwrap();
    let text = fs::read_to_string(path).unwrap();
    assert_eq!(text, "a.z2f: Enabled\nb.z2f: Disabled\n");
}
