use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::{json, Value};
use tempfile::tempdir;

fn fontlib(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fontlib"))
        .arg("--root")
        .arg(root)
        .args(args)
        .env_remove("FONTLIB_BASE_URL")
        .output()
        .expect("run fontlib")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn seed_library(root: &Path) {
    let library = json!({
        "next_id": 2,
        "fonts": [
            {
                "id": 1,
                "name": "Inter",
                "slug": "inter",
                "fontDisplay": "swap",
                "fallback": "sans-serif",
                "cssVariable": "--fontlib--inter",
                "variants": [{
                    "fontFamily": "Inter",
                    "fontStyle": "normal",
                    "fontWeight": "400",
                    "src": "/fonts/inter/Inter-Regular.woff2",
                    "name": "Regular 400"
                }]
            },
            {
                "id": 2,
                "name": "Lora",
                "slug": "lora",
                "status": "draft",
                "cssVariable": "--fontlib--lora",
                "variants": []
            }
        ]
    });
    fs::write(root.join("library.json"), library.to_string()).expect("seed library");
}

#[test]
fn list_json_returns_all_fonts() {
    let tmp = tempdir().expect("tempdir");
    seed_library(tmp.path());

    let output = fontlib(tmp.path(), &["list", "--json"]);
    assert_success(&output);

    let parsed: Value = serde_json::from_slice(&output.stdout).expect("json output");
    let fonts = parsed.as_array().expect("array");
    assert_eq!(fonts.len(), 2);
    assert_eq!(fonts[1]["status"], "draft");
}

#[test]
fn list_plain_output_is_ansi_free_when_piped() {
    let tmp = tempdir().expect("tempdir");
    seed_library(tmp.path());

    let output = fontlib(tmp.path(), &["list"]);
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 2);
    assert!(!stdout.contains("\u{1b}["));
}

#[test]
fn build_css_skips_draft_fonts() {
    let tmp = tempdir().expect("tempdir");
    seed_library(tmp.path());

    let output = fontlib(tmp.path(), &["build-css"]);
    assert_success(&output);

    let css = fs::read_to_string(tmp.path().join("fonts/fonts.css")).expect("css written");
    assert!(css.starts_with(":root {\n--fontlib--inter: \"Inter\", sans-serif;\n}\n"));
    assert!(css.contains("src: url('/fonts/inter/Inter-Regular.woff2') format('woff2');"));
    assert!(!css.contains("Lora"));

    let output = fontlib(tmp.path(), &["css-url"]);
    assert_success(&output);
    let url = String::from_utf8_lossy(&output.stdout);
    assert!(url.starts_with("/fonts/fonts.css?ver="), "url: {url}");
}

#[test]
fn settings_set_then_get() {
    let tmp = tempdir().expect("tempdir");

    let output = fontlib(
        tmp.path(),
        &["settings", "set", "google_gdpr=1", "preferred_subset=latin-ext"],
    );
    assert_success(&output);

    let output = fontlib(tmp.path(), &["settings", "get"]);
    assert_success(&output);
    let settings: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(settings["google_gdpr"], true);
    assert_eq!(settings["preferred_subset"], json!(["latin-ext"]));
}

#[test]
fn upload_local_file_and_delete() {
    let tmp = tempdir().expect("tempdir");
    let font_file = tmp.path().join("Mono-Bold.woff2");
    fs::write(&font_file, b"wOF2 mono").expect("font file");
    let root = tmp.path().join("lib");

    let output = fontlib(
        &root,
        &["upload", "-n", "Mono", "-w", "700", font_file.to_str().expect("utf8 path")],
    );
    assert_success(&output);
    let result: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(result["ID"], 1);
    assert_eq!(result["variants"][0]["name"], "Bold 700");
    assert!(root.join("fonts/mono/Mono-Bold.woff2").is_file());

    let output = fontlib(&root, &["delete", "1"]);
    assert_success(&output);
    assert!(!root.join("fonts/mono").exists());
    assert!(!root.join("fonts/fonts.css").exists());
}

#[test]
fn missing_font_exits_with_error() {
    let tmp = tempdir().expect("tempdir");
    let output = fontlib(tmp.path(), &["delete", "42"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: "), "stderr: {stderr}");
}
