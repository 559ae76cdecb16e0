use assert_cmd::Command;
use serde_json::Value;

fn comic_back_init() -> Command {
    let mut cmd = Command::cargo_bin("comic-back-init").unwrap();
    cmd.env_remove("COMIC_ENV")
        .env_remove("RUST_LOG")
        .env_remove("MONGO_URL")
        .env("COMIC_CONFIG_DIR", env!("CARGO_MANIFEST_DIR"));
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn plan_lists_the_four_operations() {
    let plan = stdout_json(comic_back_init().arg("plan"));
    let ops: Vec<&str> = plan
        .as_array()
        .unwrap()
        .iter()
        .map(|step| step["op"].as_str().unwrap())
        .collect();
    assert_eq!(
        ops,
        vec!["selectDatabase", "createUser", "createUser", "createCollection"]
    );
}

#[test]
fn plan_never_prints_passwords() {
    let output = comic_back_init().arg("plan").assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    assert!(!stdout.contains("mongopwd"));
}

#[test]
fn dry_run_applies_every_step() {
    let result = stdout_json(comic_back_init().args(["run", "--dry-run"]));

    assert_eq!(result["report"]["database"], "comic-back");
    assert_eq!(result["report"]["completed"].as_array().unwrap().len(), 4);

    let journal = result["journal"].as_array().unwrap();
    assert_eq!(journal.len(), 4);
    assert!(journal.iter().all(|entry| entry["accepted"] == true));
    assert_eq!(journal[3]["call"], "create_collection");
    assert_eq!(journal[3]["name"], "comics");
}

#[test]
fn unknown_environment_fails() {
    comic_back_init()
        .env("COMIC_ENV", "qa")
        .arg("plan")
        .assert()
        .failure();
}
