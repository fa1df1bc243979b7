use serde_json::Value;
use std::io::Write as _;
use std::process::{Command, Output, Stdio};
use tfc_test_support::{list_document, single_document, workspace, write_json};

fn run(config_home: &std::path::Path, args: &[&str], stdin: Option<&[u8]>) -> Output {
    run_with_env(config_home, args, stdin, &[])
}

fn run_with_env(
    config_home: &std::path::Path,
    args: &[&str],
    stdin: Option<&[u8]>,
    env: &[(&str, &str)],
) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tfc-filter"));
    cmd.args(args)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("TFC_DISABLE_RESPONSE_FILTERING")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, _) in std::env::vars() {
        if key.starts_with("TFC_FILTER_") {
            cmd.env_remove(key);
        }
    }
    cmd.envs(env.iter().copied());
    let mut child = cmd.spawn().expect("spawn tfc-filter");
    if let Some(bytes) = stdin {
        child
            .stdin
            .take()
            .expect("stdin")
            .write_all(bytes)
            .expect("write stdin");
    } else {
        drop(child.stdin.take());
    }
    child.wait_with_output().expect("wait")
}

fn stdout_json(out: &Output) -> Value {
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("stdout is json")
}

#[test]
fn filters_a_list_from_a_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_json(dir.path(), "ws.json", &list_document(vec![workspace("ws-aaa")]))
        .expect("fixture");
    let out = run(
        dir.path(),
        &[
            "--path",
            "/organizations/acme/workspaces",
            "--input",
            input.to_str().expect("utf8 path"),
        ],
        None,
    );
    let doc = stdout_json(&out);
    let attrs = &doc["data"][0]["attributes"];
    assert!(attrs.get("apply-duration-average").is_none());
    assert!(attrs.get("created-at").is_some());
}

#[test]
fn reads_stdin_and_honours_raw() {
    let dir = tempfile::tempdir().expect("tempdir");
    let raw = single_document(workspace("ws-aaa"));
    let bytes = serde_json::to_vec(&raw).expect("serialize");

    let out = run(dir.path(), &["--path", "/workspaces/ws-aaa", "--raw"], Some(&bytes));
    assert_eq!(stdout_json(&out), raw);

    let out = run(dir.path(), &["--path", "/workspaces/ws-aaa"], Some(&bytes));
    assert_ne!(stdout_json(&out), raw);
}

#[test]
fn manage_method_passes_through() {
    let dir = tempfile::tempdir().expect("tempdir");
    let raw = single_document(workspace("ws-aaa"));
    let bytes = serde_json::to_vec(&raw).expect("serialize");
    let out = run(
        dir.path(),
        &["--path", "/workspaces/ws-aaa", "--method", "PATCH"],
        Some(&bytes),
    );
    assert_eq!(stdout_json(&out), raw);
}

#[test]
fn default_overrides_file_is_picked_up() {
    let dir = tempfile::tempdir().expect("tempdir");
    let conf = dir.path().join("tfc-filter");
    std::fs::create_dir_all(&conf).expect("mkdir");
    std::fs::write(
        conf.join("overrides.yaml"),
        "resources:\n  workspace:\n    listRemove: [terraform-version]\n",
    )
    .expect("write overrides");

    let bytes = serde_json::to_vec(&list_document(vec![workspace("ws-aaa")])).expect("serialize");
    let out = run(
        dir.path(),
        &["--path", "/organizations/acme/workspaces"],
        Some(&bytes),
    );
    let doc = stdout_json(&out);
    assert!(doc["data"][0]["attributes"].get("terraform-version").is_none());
}

#[test]
fn audit_field_override_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let overrides = dir.path().join("bad.yaml");
    std::fs::write(
        &overrides,
        "resources:\n  run:\n    alwaysRemove: [created-at]\n",
    )
    .expect("write overrides");

    let out = run(
        dir.path(),
        &[
            "--path",
            "/runs/run-1",
            "--overrides",
            overrides.to_str().expect("utf8 path"),
        ],
        Some(b"{\"data\":null}"),
    );
    assert!(!out.status.success());
}

#[test]
fn show_config_lists_every_resource_type() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = run(dir.path(), &["--show-config"], None);
    let rules = stdout_json(&out);
    let workspace = &rules["workspace"];
    assert!(
        workspace["alwaysRemove"]
            .as_array()
            .expect("alwaysRemove")
            .iter()
            .any(|f| f == "apply-duration-average")
    );
    assert!(rules.get("run").is_some());
    assert!(rules.get("generic").is_some());
}

#[test]
fn invalid_json_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = run(dir.path(), &["--path", "/workspaces"], Some(b"not json"));
    assert!(!out.status.success());
}

#[test]
fn environment_switch_disables_filtering() {
    let dir = tempfile::tempdir().expect("tempdir");
    let raw = list_document(vec![workspace("ws-aaa")]);
    let bytes = serde_json::to_vec(&raw).expect("serialize");
    let path = ["--path", "/organizations/acme/workspaces"];

    for value in ["1", "true", "ON"] {
        let out = run_with_env(
            dir.path(),
            &path,
            Some(&bytes),
            &[("TFC_DISABLE_RESPONSE_FILTERING", value)],
        );
        assert_eq!(stdout_json(&out), raw, "{value}");
    }

    let out = run_with_env(
        dir.path(),
        &path,
        Some(&bytes),
        &[("TFC_DISABLE_RESPONSE_FILTERING", "0")],
    );
    assert_ne!(stdout_json(&out), raw);
}
