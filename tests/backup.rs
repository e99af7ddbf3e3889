mod common;

use common::setup_engine;
use z2f_keeper_lib::core::archive::ArchiveInspector;
use z2f_keeper_lib::core::backup;

#[test]
fn backup_then_restore() {
    let env = setup_engine();
    env.add_mod("on.z2f", true);
    env.add_mod("off.z2f", false);
    env.engine.reconcile().unwrap();

    let backup_dir = env.root.join("backups");
    let zip = backup::backup_mods(&env.engine.registry, &backup_dir).unwrap();
    let file_name = zip.file_name().unwrap();
    assert!(file_name.starts_with("ZT2_ModBackup_") && file_name.ends_with(".zip"));

    let mut names: Vec<String> = ArchiveInspector::open(&zip)
        .unwrap()
        .entries()
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["Disabled/off.z2f", "Enabled/on.z2f"]);

    std::fs::remove_file(env.active().join("on.z2f")).unwrap();
    std::fs::remove_file(env.disabled().join("off.z2f")).unwrap();
    env.engine.reconcile().unwrap();
    assert_eq!(env.stored_enabled("on.z2f"), None);

    let report = backup::restore_mods(&env.engine.registry, &zip).unwrap();
    assert_eq!(report.added.len(), 2);
    assert!(env.is_enabled_on_disk("on.z2f"));
    assert!(env.is_disabled_on_disk("off.z2f"));
    assert_eq!(env.stored_enabled("off.z2f"), Some(false));
}

#[test]
fn restore_rejects_non_archives() {
    let env = setup_engine();
    let bogus = env.root.join("bogus.zip");
    std::fs::write(&bogus, b"nope").unwrap();

    assert!(backup::restore_mods(&env.engine.registry, &bogus).is_err());
}

#[test]
fn restore_keeps_a_single_copy_per_mod() {
    let mut env = setup_engine();
    env.add_mod("a.z2f", false);
    env.engine.reconcile().unwrap();

    let zip = backup::backup_mods(&env.engine.registry, &env.root.join("backups")).unwrap();
    env.engine.enable("a.z2f").unwrap();
    assert!(env.is_enabled_on_disk("a.z2f"));

    let report = backup::restore_mods(&env.engine.registry, &zip).unwrap();
    assert!(report.warnings.is_empty());
    assert!(env.is_disabled_on_disk("a.z2f"));
    assert_eq!(env.stored_enabled("a.z2f"), Some(false));
}
