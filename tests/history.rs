mod common;

use common::setup_engine;
use z2f_keeper_lib::core::prompt::{AlwaysDecline, AutoConfirm};
use z2f_keeper_lib::models::error::SError;
use z2f_keeper_lib::models::history::ActionHistoryEntry;

#[test]
fn history_is_bounded_and_eviction_purges_trash() {
    let mut env = setup_engine();
    env.add_mod("doomed.z2f", true);
    env.add_mod("toggled.z2f", false);
    env.engine.reconcile().unwrap();

    env.engine.uninstall("doomed.z2f").unwrap();
    let trash_path = env.engine.history.peek().unwrap().trash_path().unwrap().clone();
    assert!(trash_path.exists());

    for i in 0..50 {
        if i % 2 == 0 {
            env.engine.enable("toggled.z2f").unwrap();
        } else {
            env.engine.disable("toggled.z2f", &AlwaysDecline).unwrap();
        }
    }

    assert_eq!(env.engine.history.len(), 50);
    assert!(!trash_path.exists());
    assert!(env
        .engine
        .history
        .iter()
        .all(|e| !matches!(e, ActionHistoryEntry::Uninstall { .. })));
}

#[test]
fn undo_of_uninstall_restores_to_original_directory() {
    let mut env = setup_engine();
    env.add_mod("on.z2f", true);
    env.add_mod("off.z2f", false);
    env.engine.reconcile().unwrap();

    env.engine.uninstall("on.z2f").unwrap();
    env.engine.uninstall("off.z2f").unwrap();
    assert_eq!(env.stored_enabled("on.z2f"), None);
    assert_eq!(env.trash_files(), vec!["off.z2f", "on.z2f"]);

    env.engine.undo().unwrap();
    assert!(env.is_disabled_on_disk("off.z2f"));
    assert_eq!(env.stored_enabled("off.z2f"), Some(false));

    env.engine.undo().unwrap();
    assert!(env.is_enabled_on_disk("on.z2f"));
    assert_eq!(env.stored_enabled("on.z2f"), Some(true));
    assert!(env.trash_files().is_empty());
}

#[test]
fn undo_fails_atomically_when_trash_copy_is_gone() {
    let mut env = setup_engine();
    env.add_mod("a.z2f", true);
    env.engine.reconcile().unwrap();
    env.engine.uninstall("a.z2f").unwrap();

    let entry = env.engine.history.peek().unwrap().clone();
    std::fs::remove_file(entry.trash_path().unwrap()).unwrap();

    let err = env.engine.undo().unwrap_err();
    assert!(matches!(err, SError::RestoreTargetMissing(_)));
    assert_eq!(env.engine.history.len(), 1);
    assert_eq!(env.engine.history.peek(), Some(&entry));
}

#[test]
fn undo_inverts_toggles() {
    let mut env = setup_engine();
    env.add_mod("a.z2f", false);
    env.add_mod("b.z2f", false);
    env.engine.reconcile().unwrap();
    env.engine
        .registry
        .set_dependencies("a.z2f", &["b.z2f".into()])
        .unwrap();

    env.engine.enable("b.z2f").unwrap();
    env.engine.enable("a.z2f").unwrap();
    env.engine.disable("b.z2f", &AutoConfirm).unwrap();
    assert!(env.is_disabled_on_disk("a.z2f"));

    // Undoing the disable re-enables b only.
    env.engine.undo().unwrap();
    assert!(env.is_enabled_on_disk("b.z2f"));
    assert!(env.is_disabled_on_disk("a.z2f"));

    // Undoing enable(a) needs no confirmation.
    env.engine.enable("a.z2f").unwrap();
    env.engine.undo().unwrap();
    assert!(env.is_disabled_on_disk("a.z2f"));
}

#[test]
fn undo_of_install_moves_archives_to_trash() {
    let mut env = setup_engine();
    let source = env.root.join("downloads").join("new.z2f");
    common::write_archive(&source, &[("x.xml", "<Animal/>")]);

    let report = env
        .engine
        .install(&[format!("{{{source}}}")], &AlwaysDecline)
        .unwrap();
    assert_eq!(report.installed, vec!["new.z2f"]);
    assert!(env.is_enabled_on_disk("new.z2f"));
    assert_eq!(env.stored_enabled("new.z2f"), Some(true));

    env.engine.undo().unwrap();
    assert!(!env.active().join("new.z2f").exists());
    assert_eq!(env.stored_enabled("new.z2f"), None);
    assert_eq!(env.trash_files(), vec!["new.z2f"]);
    assert!(env.engine.history.is_empty());
}

#[test]
fn install_skips_and_reports() {
    let mut env = setup_engine();
    env.add_mod("existing.z2f", true);
    env.engine.reconcile().unwrap();

    let downloads = env.root.join("downloads");
    common::write_archive(&downloads.join("existing.z2f"), &[("a.txt", "newer")]);
    std::fs::write(downloads.join("notes.txt"), b"x").unwrap();

    let inputs = vec![
        downloads.join("existing.z2f").to_string(),
        downloads.join("notes.txt").to_string(),
        downloads.join("absent.z2f").to_string(),
    ];
    let report = env.engine.install(&inputs, &AlwaysDecline).unwrap();
    assert!(report.installed.is_empty());
    assert_eq!(report.skipped, vec!["existing.z2f", "notes.txt"]);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.summary(), "Skipped: 2, Errors: 1");
    assert!(env.engine.history.is_empty());
}

#[test]
fn nothing_to_undo() {
    let mut env = setup_engine();
    assert_eq!(env.engine.undo().unwrap_err(), SError::NothingToUndo);
}

#[test]
fn commit_history_empties_trash() {
    let mut env = setup_engine();
    env.add_mod("a.z2f", true);
    env.engine.reconcile().unwrap();
    env.engine.uninstall("a.z2f").unwrap();
    assert_eq!(env.trash_files().len(), 1);

    env.engine.commit_history().unwrap();
    assert!(env.engine.history.is_empty());
    assert!(env.trash_files().is_empty());
}

#[test]
fn uninstall_of_unknown_mod_is_not_found() {
    let mut env = setup_engine();
    assert_eq!(
        env.engine.uninstall("nope.z2f").unwrap_err(),
        SError::NotFound("nope.z2f".into())
    );
    assert!(env.engine.history.is_empty());
}

#[test]
fn install_from_the_active_directory_leaves_the_archive_intact() {
    let mut env = setup_engine();
    let path = env.add_mod("a.z2f", true);
    env.engine.reconcile().unwrap();
    let before = std::fs::read(&path).unwrap();

    let report = env.engine.install(&[path.to_string()], &AutoConfirm).unwrap();
    assert!(report.installed.is_empty());
    assert_eq!(report.errors.len(), 1);
    assert_eq!(std::fs::read(&path).unwrap(), before);
    assert!(env.engine.history.is_empty());
}

#[test]
fn install_over_a_disabled_copy_keeps_one_file() {
    let mut env = setup_engine();
    env.add_mod("a.z2f", false);
    env.engine.reconcile().unwrap();

    let source = env.root.join("downloads").join("a.z2f");
    common::write_archive(&source, &[("x.xml", "<Fence/>")]);

    let report = env.engine.install(&[source.to_string()], &AutoConfirm).unwrap();
    assert_eq!(report.installed, vec!["a.z2f"]);
    assert!(report.errors.is_empty());
    assert!(env.is_enabled_on_disk("a.z2f"));
    assert_eq!(env.stored_enabled("a.z2f"), Some(true));
    assert_eq!(env.engine.history.len(), 1);
}

#[test]
fn failed_install_undo_puts_moved_archives_back() {
    let mut env = setup_engine();
    let downloads = env.root.join("downloads");
    // Long enough that a timestamped trash name no longer fits the file system.
    let long_name = format!("{}.z2f", "l".repeat(247));
    common::write_archive(&downloads.join("a.z2f"), &[("a.txt", "a")]);
    common::write_archive(&downloads.join(&long_name), &[("l.txt", "l")]);

    let inputs = vec![
        downloads.join("a.z2f").to_string(),
        downloads.join(&long_name).to_string(),
    ];
    let report = env.engine.install(&inputs, &AlwaysDecline).unwrap();
    assert_eq!(report.installed.len(), 2);

    std::fs::create_dir_all(env.trash()).unwrap();
    std::fs::write(env.trash().join(&long_name), b"older").unwrap();

    assert!(env.engine.undo().is_err());
    assert!(env.is_enabled_on_disk("a.z2f"));
    assert!(env.is_enabled_on_disk(&long_name));
    assert_eq!(env.stored_enabled("a.z2f"), Some(true));
    assert_eq!(env.trash_files(), vec![long_name.clone()]);
    assert!(matches!(
        env.engine.history.peek(),
        Some(ActionHistoryEntry::Install { mod_names }) if mod_names.len() == 2
    ));
}
