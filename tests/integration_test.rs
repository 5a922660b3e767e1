use predicates::prelude::*;
use std::fs;


use test_utils::{child_names, TestEnv};

#[test]
fn test_import_strips_wrapper_folders() {
    let env = TestEnv::new();
    let archive = env.create_zip(
        "downloads/Forest.zip",
        &["Forest/Forest/Materials/M_Bark.uasset", "Forest/Forest/Materials/M_Leaf.uasset"],
    );
    let destination = env.mkdir("assets");

    env.cmd()
        .arg("import")
        .arg(&archive)
        .arg("--to")
        .arg(&destination)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported to"));

    let imported = destination.join("Forest");
    assert_eq!(child_names(&imported), vec!["Materials".to_string()]);
    assert!(imported.join("Materials/M_Bark.uasset").is_file());
}

#[test]
fn test_import_twice_disambiguates() {
    let env = TestEnv::new();
    let archive = env.create_zip("Rocks.zip", &["Meshes/SM_Rock.uasset"]);
    let destination = env.mkdir("assets");

    for _ in 0..2 {
        env.cmd()
            .arg("import")
            .arg(&archive)
            .arg("--to")
            .arg(&destination)
            .assert()
            .success();
    }

    assert_eq!(
        child_names(&destination),
        vec!["Rocks".to_string(), "Rocks_1".to_string()]
    );
    assert!(destination.join("Rocks_1/Meshes/SM_Rock.uasset").is_file());
}

#[test]
fn test_import_into_project_content() {
    let env = TestEnv::new();
    env.create_project("Shooter", "5.3");
    let archive = env.create_zip("Props.zip", &["Props/Meshes/SM_Crate.uasset"]);

    env.cmd()
        .arg("import")
        .arg(&archive)
        .arg("--project")
        .arg(env.root.join("Shooter"))
        .assert()
        .success();

    assert!(env
        .root
        .join("Shooter/Content/Props/Meshes/SM_Crate.uasset")
        .is_file());
}

#[test]
fn test_import_unsupported_format_fails() {
    let env = TestEnv::new();
    let archive = env.root.join("Pack.rar");
    fs::write(&archive, b"not really").unwrap();

    env.cmd()
        .arg("import")
        .arg(&archive)
        .arg("--to")
        .arg(env.mkdir("assets"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("Unsupported archive format"))
        .stderr(predicate::str::contains("import(s) failed"));
}

#[test]
fn test_import_requires_destination() {
    let env = TestEnv::new();
    let archive = env.create_zip("A.zip", &["a.txt"]);

    env.cmd().arg("import").arg(&archive).assert().failure();
}

#[test]
fn test_find_archives() {
    let env = TestEnv::new();
    env.create_zip("downloads/One.zip", &["a.txt"]);
    env.create_zip("downloads/nested/Two.ZIP", &["b.txt"]);
    fs::write(env.root.join("downloads/notes.txt"), "").unwrap();

    env.cmd()
        .arg("find-archives")
        .arg(env.root.join("downloads"))
        .assert()
        .success()
        .stdout(predicate::str::contains("One.zip"))
        .stdout(predicate::str::contains("Two.ZIP"))
        .stdout(predicate::str::contains("notes.txt").not())
        .stdout(predicate::str::contains("Found 2 archives"));
}

#[test]
fn test_library_add_and_list() {
    let env = TestEnv::new();
    let asset = env.mkdir("assets/Forest");

    env.cmd()
        .args(["library", "add-category", "Environments"])
        .assert()
        .success();

    env.cmd()
        .args(["library", "add", "Forest Pack"])
        .arg(&asset)
        .args(["--category", "Environments", "--readme"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added Forest Pack to Environments"));

    assert!(asset.join("README.md").is_file());

    env.cmd()
        .args(["library", "list", "--search", "FOREST"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[0] Forest Pack (Environments)"));

    env.cmd()
        .args(["library", "list", "--category", "Default"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No assets found"));

    let saved = fs::read_to_string(env.config_dir.join("ue_assets.json")).unwrap();
    assert!(saved.contains("\"version\": \"1.0.0\""));
}

#[test]
fn test_library_add_unknown_category_fails() {
    let env = TestEnv::new();
    let asset = env.mkdir("assets/Crate");

    env.cmd()
        .args(["library", "add", "Crate"])
        .arg(&asset)
        .args(["--category", "Missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown category 'Missing'"));
}

#[test]
fn test_library_remove_category_in_use() {
    let env = TestEnv::new();
    let asset = env.mkdir("assets/Crate");

    env.cmd().args(["library", "add-category", "Props"]).assert().success();
    env.cmd()
        .args(["library", "add", "Crate"])
        .arg(&asset)
        .args(["--category", "Props"])
        .assert()
        .success();

    env.cmd()
        .args(["library", "remove-category", "Props"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("still holds 1 asset"));

    env.cmd()
        .args(["library", "remove-category", "Default"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be removed"));

    env.cmd().args(["library", "remove", "0"]).assert().success();
    env.cmd()
        .args(["library", "remove-category", "Props"])
        .assert()
        .success();

    env.cmd()
        .args(["library", "categories"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Props").not());
}

#[test]
fn test_library_scan_linked_path() {
    let env = TestEnv::new();
    let shelf = env.mkdir("shelf");
    env.mkdir("shelf/Tracked");
    env.mkdir("shelf/Untracked");

    env.cmd()
        .args(["library", "add-path", "Default"])
        .arg(&shelf)
        .assert()
        .success();
    env.cmd()
        .args(["library", "add", "Tracked"])
        .arg(shelf.join("Tracked"))
        .assert()
        .success();

    env.cmd()
        .args(["library", "scan", "Default"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Untracked"))
        .stdout(predicate::str::contains("  Tracked").not());
}

#[test]
fn test_library_path_conflict() {
    let env = TestEnv::new();
    let shelf = env.mkdir("shelf");

    env.cmd().args(["library", "add-category", "Props"]).assert().success();
    env.cmd()
        .args(["library", "add-path", "Default"])
        .arg(&shelf)
        .assert()
        .success();

    env.cmd()
        .args(["library", "add-path", "Props"])
        .arg(&shelf)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already linked to another category"));
}

#[test]
fn test_project_info() {
    let env = TestEnv::new();
    env.create_project("Racer", "5.4");

    env.cmd()
        .args(["project", "info"])
        .arg(env.root.join("Racer"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Racer"))
        .stdout(predicate::str::contains("Engine:      5.4"))
        .stdout(predicate::str::contains("Modules:     1"));
}

#[test]
fn test_project_info_without_uproject() {
    let env = TestEnv::new();
    let empty = env.mkdir("NotAProject");

    env.cmd()
        .args(["project", "info"])
        .arg(&empty)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No .uproject file found"));
}

#[test]
fn test_project_remember_and_recent() {
    let env = TestEnv::new();
    env.cmd()
        .args(["project", "recent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No recent projects"));

    let uproject = env.create_project("Platformer", "5.3");
    env.cmd()
        .args(["project", "remember"])
        .arg(&uproject)
        .assert()
        .success()
        .stdout(predicate::str::contains("Remembered Platformer"));

    env.cmd()
        .args(["project", "recent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Platformer"));
}

#[test]
fn test_config_path_uses_override() {
    let env = TestEnv::new();

    env.cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(env.config_dir.to_string_lossy().to_string()));
}

#[test]
fn test_config_show() {
    let env = TestEnv::new();

    env.cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ue_assets.json"))
        .stdout(predicate::str::contains("Library Settings"));

    assert!(env.config_dir.join("ue_assets.json").is_file());
}

#[test]
fn test_completions() {
    let env = TestEnv::new();

    env.cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unrealmgr"));
}
