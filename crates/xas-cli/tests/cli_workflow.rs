use ndarray::{Array3, Axis};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;
use xas_core::io::{RawSpectrum, SpectrumFileWriter, SsrlCodec};
use xas_core::spectrum::{ScanMetadata, XasParts};
use xas_core::Xas;

const CARBON_K: f64 = 284.2;

fn xastools(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_xastools"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("xastools should launch")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

/// One MONO / I0 / IF / REF scan whose REF peak is displaced by `shift`.
fn write_scan(dir: &Path, scan: i64, shift: f64) -> PathBuf {
    let points = 201;
    let mut data = Array3::zeros((points, 4, 1));
    for point in 0..points {
        let energy = 279.0 + 0.05 * point as f64;
        let reference = (-(energy - CARBON_K - shift).powi(2) / 0.245).exp();
        data[[point, 0, 0]] = energy;
        data[[point, 1, 0]] = 2.0e4;
        data[[point, 2, 0]] = 100.0 + 40.0 * (energy / 3.0).sin() + 0.5 * point as f64;
        data[[point, 3, 0]] = 0.1 + reference;
    }
    let xas = Xas::new(XasParts {
        channels: vec!["MONO".into(), "I0".into(), "IF".into(), "REF".into()],
        scans: vec![scan],
        data,
        metadata: ScanMetadata {
            sample: Some("graphite".into()),
            loadid: Some("B3".into()),
            ..ScanMetadata::default()
        },
        ..XasParts::default()
    })
    .expect("scan should build");

    let path = dir.join(format!("graphite_{scan}.dat"));
    let raw = RawSpectrum::new(xas.data().index_axis(Axis(2), 0).to_owned(), xas.header())
        .expect("raw spectrum");
    SsrlCodec::default()
        .write_path(&raw, &path)
        .expect("scan should be written");
    path
}

fn staged_scans() -> (TempDir, PathBuf, PathBuf) {
    let temp = TempDir::new().expect("tempdir should be created");
    let raw_dir = temp.path().join("raw");
    let first = write_scan(&raw_dir, 1, 0.5);
    let second = write_scan(&raw_dir, 2, -0.3);
    (temp, first, second)
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

#[test]
fn info_summarizes_combined_scans() {
    let (_temp, first, second) = staged_scans();
    let output = xastools(&["info", arg(&first), arg(&second)]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let summary = stdout_json(&output);
    assert_eq!(summary["scans"], serde_json::json!([1, 2]));
    assert_eq!(summary["points"], 201);
    assert_eq!(summary["sample"], "graphite");
    assert_eq!(summary["channels"][0]["name"], "MONO");
    assert_eq!(summary["channels"][0]["role"], "motor");
}

#[test]
fn calibrate_reports_offsets_and_writes_corrected_export() {
    let (temp, first, second) = staged_scans();
    let out_dir = temp.path().join("processed");
    let output = xastools(&[
        "calibrate",
        arg(&first),
        arg(&second),
        "--edge",
        "C",
        "--output-dir",
        arg(&out_dir),
        "--format",
        "ssrl",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report = stdout_json(&output);
    assert_eq!(report["channel"], "REF");
    let offsets: Vec<f64> = report["offsets"]
        .as_array()
        .expect("offsets array")
        .iter()
        .map(|value| value.as_f64().expect("numeric offset"))
        .collect();
    assert!((offsets[0] + 0.5).abs() < 0.06, "offsets {offsets:?}");
    assert!((offsets[1] - 0.3).abs() < 0.06, "offsets {offsets:?}");

    let exported = PathBuf::from(report["exported"].as_str().expect("exported path"));
    assert_eq!(exported, out_dir.join("graphite_[1, 2].dat"));
    let text = fs::read_to_string(&exported).expect("export should be readable");
    assert_eq!(text.lines().nth(12), Some("Mono corrected"));
}

#[test]
fn export_expands_directories_and_honors_exclusions() {
    let (temp, first, _second) = staged_scans();
    let raw_dir = first.parent().expect("raw dir").to_path_buf();
    fs::write(raw_dir.join("notes.txt"), "not a scan").expect("notes should be written");
    let out_dir = temp.path().join("out");

    let output = xastools(&[
        "export",
        arg(&raw_dir),
        "--output-dir",
        arg(&out_dir),
        "--norm",
        "I0",
        "--exclude",
        "2",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let printed = String::from_utf8(output.stdout).expect("stdout should be UTF-8");
    let path = PathBuf::from(printed.trim());
    assert_eq!(path, out_dir.join("graphite_1.yaml"));
    assert!(path.is_file());
}

#[test]
fn normalize_prints_scaled_columns() {
    let (_temp, first, second) = staged_scans();
    let output = xastools(&[
        "normalize",
        arg(&first),
        arg(&second),
        "--cols",
        "IF",
        "--method",
        "pp",
        "--divisor",
        "I0",
        "--mean",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let table = String::from_utf8(output.stdout).expect("stdout should be UTF-8");
    let mut lines = table.lines();
    assert_eq!(lines.next(), Some("# MONO IF"));
    let values: Vec<f64> = lines
        .map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            assert_eq!(fields.len(), 2);
            fields[1].parse().expect("numeric value")
        })
        .collect();
    assert_eq!(values.len(), 201);
    assert!(values.iter().all(|value| (-1.0e-12..=1.0 + 1.0e-12).contains(value)));
    assert!(values.iter().any(|value| *value == 0.0));
    assert!(values.iter().any(|value| *value == 1.0));
}

#[test]
fn failures_exit_with_category_codes() {
    let (temp, first, _second) = staged_scans();
    let csv = temp.path().join("scan.csv");
    fs::write(&csv, "1 2 3").expect("csv should be written");

    let output = xastools(&["info", arg(&csv)]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: [INPUT.FILE_EXTENSION]"), "stderr: {stderr}");
    assert!(stderr.contains("FATAL EXIT CODE: 2"));

    let output = xastools(&["calibrate", arg(&first)]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("INPUT.CLI_USAGE"));

    let output = xastools(&["calibrate", arg(&first), "--edge", "Xx"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("LOOKUP.EDGE"));

    let output = xastools(&["info", arg(&temp.path().join("missing.dat"))]);
    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn config_profile_supplies_defaults() {
    let (temp, first, _second) = staged_scans();
    let profile = temp.path().join("profile.json");
    fs::write(
        &profile,
        r#"{"calibration": {"edge": "284.2"}, "export": {"format": "athena"}}"#,
    )
    .expect("profile should be written");
    let out_dir = temp.path().join("athena");

    let output = xastools(&[
        "--config",
        arg(&profile),
        "calibrate",
        arg(&first),
        "--output-dir",
        arg(&out_dir),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let report = stdout_json(&output);
    assert_eq!(report["edge"], 284.2);
    let exported = report["exported"].as_str().expect("exported path");
    assert!(exported.ends_with("graphite_1.dat"));
}
