use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

use sage_core::im::{SageBuffer, SageImage};

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sage_cli_{}_{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_image(dir: &Path) -> PathBuf {
    let path = dir.join("image.png");
    SageImage::U8(SageBuffer::filled(32, 24, 3, 120u8))
        .save(&path)
        .unwrap();
    path
}

fn write_annotations(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("annotations.json");
    std::fs::write(&path, contents).unwrap();
    path
}

fn sage(cache: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sage").unwrap();
    cmd.env("SAGE_CACHE", cache);
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = scratch("help");

    sage(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("automatic"))
        .stdout(predicate::str::contains("prompt"))
        .stdout(predicate::str::contains("download"))
        .stdout(predicate::str::contains("list"));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_list_checkpoints() {
    let dir = scratch("list");

    sage(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("sam_vit_b_01ec64.safetensors"))
        .stdout(predicate::str::contains("vit_h"));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_download_unknown_model() {
    let dir = scratch("download_unknown");

    sage(&dir)
        .args(["download", "--model", "vit_xl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("vit_b, vit_l, vit_h"));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_download_unhosted_model() {
    let dir = scratch("download_unhosted");

    sage(&dir)
        .args(["download", "--model", "vit_h"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No hosted download"));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_prompt_missing_image() {
    let dir = scratch("prompt_missing");
    let annotations = write_annotations(&dir, r#"{"points": [[1, 1, 2, 5, 5, 3]]}"#);

    sage(&dir)
        .arg("prompt")
        .arg("-i")
        .arg(dir.join("missing.png"))
        .arg("-a")
        .arg(&annotations)
        .arg("-o")
        .arg(dir.join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("[sage::prompt] ERROR"))
        .stderr(predicate::str::contains("NoFileError"));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_prompt_malformed_annotation() {
    let dir = scratch("prompt_malformed");
    let image = write_image(&dir);
    let annotations = write_annotations(&dir, r#"{"points": [[1, 1, 2, 5, 5]]}"#);

    sage(&dir)
        .arg("prompt")
        .arg("-i")
        .arg(&image)
        .arg("-a")
        .arg(&annotations)
        .arg("-o")
        .arg(dir.join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidAnnotation"));

    assert!(!dir.join("out").exists());

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_prompt_without_boxes() {
    let dir = scratch("prompt_no_boxes");
    let image = write_image(&dir);
    let annotations = write_annotations(
        &dir,
        r#"{"points": [[4, 4, 1, 0, 0, 4], [1, 1, 1, 0, 0, 3]]}"#,
    );

    sage(&dir)
        .arg("prompt")
        .arg("-i")
        .arg(&image)
        .arg("-a")
        .arg(&annotations)
        .arg("-o")
        .arg(dir.join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("EmptySelection"));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_prompt_invalid_device() {
    let dir = scratch("prompt_device");
    let image = write_image(&dir);
    let annotations = write_annotations(&dir, r#"[[1, 1, 2, 5, 5, 3]]"#);

    sage(&dir)
        .arg("prompt")
        .arg("-i")
        .arg(&image)
        .arg("-a")
        .arg(&annotations)
        .arg("-o")
        .arg(dir.join("out"))
        .args(["--device", "tpu"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid device"));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_automatic_invalid_config() {
    let dir = scratch("automatic_config");
    let image = write_image(&dir);

    sage(&dir)
        .arg("automatic")
        .arg("-i")
        .arg(&image)
        .arg("-o")
        .arg(dir.join("overlay.png"))
        .args(["--points-per-side", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("points_per_side"));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_automatic_missing_output_directory() {
    let dir = scratch("automatic_output");
    let image = write_image(&dir);

    sage(&dir)
        .arg("automatic")
        .arg("-i")
        .arg(&image)
        .arg("-o")
        .arg(dir.join("missing").join("overlay.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("DirError"));

    std::fs::remove_dir_all(dir).unwrap();
}
