use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::error::Error;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn reports_missing_argument_and_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let script = dir.path().join("math.gml");
    fs::write(&script, "function add(a, b) { return a + b; }\nadd(1);\n")?;

    let mut cmd = Command::cargo_bin("gmlint")?;
    cmd.args(["check", script.to_str().unwrap()]);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("Missing required argument `b` for function `add`."))
        .stdout(predicate::str::contains("[MISSING_REQUIRED_ARGUMENT]"));
    Ok(())
}

#[test]
fn clean_project_succeeds() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let scripts = dir.path().join("scripts").join("greet");
    fs::create_dir_all(&scripts)?;
    fs::write(
        scripts.join("greet.gml"),
        "function greet(name) {\n    return \"hi \" + name;\n}\n\nvar message = greet(\"you\");\n",
    )?;

    let mut cmd = Command::cargo_bin("gmlint")?;
    cmd.args(["check", dir.path().to_str().unwrap()]);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("1 files checked"))
        .stderr(predicate::str::contains("0 errors"));
    Ok(())
}

#[test]
fn json_output_lists_files() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let script = dir.path().join("broken.gml");
    fs::write(&script, "var x = ;\n")?;

    let mut cmd = Command::cargo_bin("gmlint")?;
    cmd.args(["check", "--json", script.to_str().unwrap()]);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("\"path\": \"broken/broken.gml\""))
        .stdout(predicate::str::contains("\"collection\": \"SYNTAX_ERROR\""));
    Ok(())
}

#[test]
fn symbols_lists_script_functions() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let script = dir.path().join("math.gml");
    fs::write(&script, "function add(a, b) { return a + b; }\n#macro LIMIT 10\n")?;

    let mut cmd = Command::cargo_bin("gmlint")?;
    cmd.args(["symbols", script.to_str().unwrap()]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("add: function add(a: Unknown, b: Unknown): Real"))
        .stdout(predicate::str::contains("LIMIT: Real"));
    Ok(())
}

#[test]
fn tokens_prints_every_token() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let script = dir.path().join("t.gml");
    fs::write(&script, "x = 1;")?;

    let mut cmd = Command::cargo_bin("gmlint")?;
    cmd.args(["tokens", script.to_str().unwrap()]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"x\""))
        .stdout(predicate::str::contains("\"1\""));
    Ok(())
}

#[test]
fn bad_config_is_reported() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("gml.toml"), "include = 3\n")?;
    fs::write(dir.path().join("a.gml"), "var a = 1;\n")?;

    let mut cmd = Command::cargo_bin("gmlint")?;
    cmd.args(["check", dir.path().to_str().unwrap()]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid analysis config"));
    Ok(())
}
