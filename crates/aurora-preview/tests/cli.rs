use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn preview(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_aurora-preview"))
        .args(args)
        .env("AURORA_CONFIG_DIR", config_dir)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to spawn aurora-preview")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "aurora-preview failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn export_writes_png_of_requested_size() {
    let root = TempDir::new().unwrap();
    let out = root.path().join("frames").join("still.png");
    let out_arg = out.to_string_lossy().into_owned();

    let output = preview(
        root.path(),
        &[
            "--primary",
            "1,0,0",
            "export",
            "--out",
            &out_arg,
            "--size",
            "64x36",
            "--time",
            "2.5",
        ],
    );
    stdout(&output);

    let image = image::open(&out).expect("decode exported png");
    assert_eq!((image.width(), image.height()), (64, 36));
}

#[test]
fn fallback_css_reflects_palette_overrides() {
    let root = TempDir::new().unwrap();
    let output = preview(
        root.path(),
        &["--primary", "1,0,0", "--base", "0,0,0", "fallback-css"],
    );
    let css = stdout(&output);
    let css = css.trim();

    assert_eq!(css.matches("radial-gradient(").count(), 2);
    assert!(css.contains("rgba(255, 0, 0,"), "{css}");
    assert!(css.ends_with("rgb(0, 0, 0)"), "{css}");
}

#[test]
fn sections_lists_bundled_table_as_json() {
    let root = TempDir::new().unwrap();
    let output = preview(root.path(), &["sections"]);
    let listing: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let names: Vec<&str> = listing
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["hero", "about", "projects", "skills", "contact"]);
}

#[test]
fn sections_file_in_config_dir_replaces_bundled_table() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("sections.toml"),
        "version = 1\n\n[defaults]\nspeed = 1.25\n\n[[sections]]\nname = \"intro\"\n",
    )
    .unwrap();

    let output = preview(root.path(), &["sections"]);
    let listing: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(listing[0]["name"], "intro");
    assert_eq!(listing[0]["speed"], 1.25);
    assert_eq!(listing.as_array().unwrap().len(), 1);
}

#[test]
fn invalid_config_fails_with_message() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("broken.toml");
    fs::write(&path, "version = 7\n[[sections]]\nname = \"a\"\n").unwrap();
    let path_arg = path.to_string_lossy().into_owned();

    let output = preview(root.path(), &["--config", &path_arg, "sections"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("version"), "{stderr}");
}

#[test]
fn unknown_section_is_rejected() {
    let root = TempDir::new().unwrap();
    let output = preview(root.path(), &["--section", "footer", "fallback-css"]);
    assert!(!output.status.success());
}
