//! Integration tests for Steam library and game resolution
//!
//! These tests verify:
//! - Library discovery from a libraryfolders.vdf fixture
//! - End-to-end appid resolution across multiple library roots
//! - Compatdata and wine desktop resolution
//! - The documented appid 440 / TeamFortress2 scenario

use camino::Utf8PathBuf;
use protontrace::services::{GameLocator, LibraryError, LibraryLocator};
use std::fs;
use tempfile::TempDir;

/// Build a realistic two-library Steam tree:
/// - `root/main` holds the vdf, the appmanifest, and compatdata for 440
/// - `root/extra` holds the actual game files
fn fake_steam_tree() -> (TempDir, Utf8PathBuf, Utf8PathBuf, Utf8PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();

    let main_lib = root.join("main");
    let extra_lib = root.join("extra");
    fs::create_dir_all(main_lib.join("steamapps")).unwrap();
    fs::create_dir_all(extra_lib.join("steamapps/common/TeamFortress2")).unwrap();
    fs::create_dir_all(
        main_lib.join("steamapps/compatdata/440/pfx/drive_c/users/steamuser/Desktop"),
    )
    .unwrap();

    fs::write(
        main_lib.join("steamapps/appmanifest_440.acf"),
        concat!(
            "\"AppState\"\n{\n",
            "\t\"appid\"\t\t\"440\"\n",
            "\t\"name\"\t\t\"Team Fortress 2\"\n",
            "\t\"installdir\"\t\t\"TeamFortress2\"\n",
            "}\n"
        ),
    )
    .unwrap();

    let vdf = root.join("libraryfolders.vdf");
    fs::write(
        &vdf,
        format!(
            concat!(
                "\"libraryfolders\"\n{{\n",
                "\t\"0\"\n\t{{\n\t\t\"path\"\t\t\"{}\"\n\t}}\n",
                "\t\"1\"\n\t{{\n\t\t\"path\"\t\t\"{}\"\n\t}}\n",
                "\t\"2\"\n\t{{\n\t\t\"path\"\t\t\"{}\"\n\t}}\n",
                "}}\n"
            ),
            main_lib,
            extra_lib,
            root.join("gone")
        ),
    )
    .unwrap();

    (temp, vdf, main_lib, extra_lib)
}

#[test]
fn test_discover_filters_missing_roots() {
    let (_temp, vdf, main_lib, extra_lib) = fake_steam_tree();

    let libraries = LibraryLocator::new(&vdf).discover().unwrap();
    assert_eq!(libraries, vec![main_lib, extra_lib]);
}

#[test]
fn test_team_fortress_scenario_end_to_end() {
    let (_temp, vdf, _main_lib, extra_lib) = fake_steam_tree();

    let libraries = LibraryLocator::new(&vdf).discover().unwrap();
    let games = GameLocator::new(libraries);

    // Manifest lives in the first library, files in the second.
    let game_dir = games.resolve_game_dir("440").unwrap();
    assert_eq!(game_dir, extra_lib.join("steamapps/common/TeamFortress2"));
}

#[test]
fn test_repeated_resolution_is_stable() {
    let (_temp, vdf, _main_lib, _extra_lib) = fake_steam_tree();

    let libraries = LibraryLocator::new(&vdf).discover().unwrap();
    let games = GameLocator::new(libraries);

    let first = games.resolve_game_dir("440").unwrap();
    for _ in 0..3 {
        assert_eq!(games.resolve_game_dir("440").unwrap(), first);
    }
}

#[test]
fn test_desktop_resolution_end_to_end() {
    let (_temp, vdf, main_lib, _extra_lib) = fake_steam_tree();

    let libraries = LibraryLocator::new(&vdf).discover().unwrap();
    let games = GameLocator::new(libraries);

    let desktop = games.resolve_wine_desktop_dir("440").unwrap();
    assert_eq!(
        desktop,
        main_lib.join("steamapps/compatdata/440/pfx/drive_c/users/steamuser/Desktop")
    );
}

#[test]
fn test_empty_vdf_yields_no_libraries() {
    let temp = TempDir::new().unwrap();
    let vdf = Utf8PathBuf::try_from(temp.path().join("libraryfolders.vdf")).unwrap();
    fs::write(&vdf, "\"libraryfolders\"\n{\n}\n").unwrap();

    let err = LibraryLocator::new(&vdf).discover().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LibraryError>(),
        Some(LibraryError::NoLibrariesFound(_))
    ));
}
