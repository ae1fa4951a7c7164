use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

fn haloprof() -> Command {
    Command::new(env!("CARGO_BIN_EXE_haloprof"))
}

#[test]
fn profile_command_writes_a_decreasing_pressure_artifact() {
    let temp = TempDir::new().expect("tempdir should be created");
    let artifact_path = temp.path().join("artifacts/profile.json");

    let output = haloprof()
        .args([
            "profile",
            "--mass",
            "1e14",
            "--redshift",
            "0",
            "--output",
            artifact_path.to_str().expect("utf-8 path"),
        ])
        .output()
        .expect("haloprof should run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let artifact: Value = serde_json::from_str(
        &std::fs::read_to_string(&artifact_path).expect("artifact should exist"),
    )
    .expect("artifact should be valid JSON");

    assert_eq!(artifact["mass_msun_h"].as_f64(), Some(1.0e14));
    assert!(artifact["virial_radius_mpc_h"].as_f64().expect("rvir") > 0.0);

    let fractions = artifact["profile"]["r_fractions"]
        .as_array()
        .expect("radius fractions");
    assert_eq!(fractions.len(), 200);

    let pressures: Vec<f64> = artifact["profile"]["electron_pressure"]
        .as_array()
        .expect("pressure array")
        .iter()
        .map(|value| value.as_f64().expect("numeric pressure"))
        .collect();
    assert!(pressures.iter().all(|pe| *pe > 0.0));
    assert!(pressures.windows(2).all(|pair| pair[1] < pair[0]));
    assert!(pressures[0] >= 10.0 * pressures[pressures.len() - 1]);
}

#[test]
fn profile_command_accepts_parameter_overrides() {
    let output = haloprof()
        .args([
            "profile",
            "--mass",
            "5e14",
            "--set",
            "gamma=1.30",
            "--set",
            "log10_M0=14",
        ])
        .output()
        .expect("haloprof should run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Rvir"));
}

#[test]
fn unknown_parameter_override_fails_with_diagnostic() {
    let output = haloprof()
        .args(["profile", "--mass", "1e14", "--set", "sigma8=0.8"])
        .output()
        .expect("haloprof should run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("sigma8"));
}

#[test]
fn describe_command_prints_the_model_summary() {
    let output = haloprof()
        .arg("describe")
        .output()
        .expect("haloprof should run");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Cosmology"));
    assert!(stdout.contains("default HMCode"));
    assert!(stdout.contains("mu_e"));
}

#[test]
fn validate_interp_command_passes_at_default_tolerance() {
    let temp = TempDir::new().expect("tempdir should be created");
    let config_path = temp.path().join("config.json");
    std::fs::write(
        &config_path,
        r#"{ "use_interp": true, "zs": [0.0], "mmin": 1e13, "mmax": 1e15 }"#,
    )
    .expect("config should be written");

    let output = haloprof()
        .args([
            "validate-interp",
            "--config",
            config_path.to_str().expect("utf-8 path"),
            "--samples",
            "50",
        ])
        .output()
        .expect("haloprof should run");
    assert!(
        output.status.success(),
        "stdout: {} stderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Interpolation accuracy within"));
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let output = haloprof().output().expect("haloprof should run");
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(2));
}
