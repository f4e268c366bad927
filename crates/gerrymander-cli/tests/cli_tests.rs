//! CLI behaviour against a scripted server.
#![cfg(unix)]

use assert_cmd::cargo::cargo_bin_cmd;
use gerrymander_testing::{TestWorld, fixtures};
use predicates::prelude::*;
use serde_json::json;

fn two_changes(world: &TestWorld) {
    two_changes_at(world, 1);
}

/// Prepare the `call`-th remote invocation to answer with two changes.
fn two_changes_at(world: &TestWorld, call: usize) {
    world.remote().respond_json(
        call,
        [
            fixtures::change(1001, "openstack/nova", "Fix resize"),
            fixtures::change(1002, "openstack/nova", "Add quota check"),
            fixtures::stats(2, false),
        ],
    );
}

#[test]
fn test_changes_plain_table() {
    let world = TestWorld::new();
    two_changes(&world);

    let mut cmd = cargo_bin_cmd!("gerrymander");
    world
        .configure_command(&mut cmd)
        .args(["changes", "--project", "openstack/nova", "--status", "open"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Change"))
        .stdout(predicate::str::contains("1001"))
        .stdout(predicate::str::contains("Add quota check"))
        .stdout(predicate::str::contains("V+1,R-1"))
        .stdout(predicate::str::contains("2 changes"));

    let calls = world.remote().calls();
    assert_eq!(calls.len(), 2, "{calls:?}");
    assert!(calls[0].contains(
        "gerrit query --format=JSON --current-patch-set --all-approvals limit:500 AND ( project:openstack/nova ) AND ( status:open )"
    ));
    assert!(calls[1].contains("resume_sortkey:"));
}

#[test]
fn test_changes_json_respects_limit() {
    let world = TestWorld::new();
    two_changes(&world);

    let result = world
        .run(&["changes", "--format", "json", "--limit", "1"])
        .unwrap();

    assert!(result.success(), "{}", result.stderr());
    let lines = result.json_lines().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["number"], 1001);
    assert_eq!(lines[0]["project"], "openstack/nova");
    assert!(world.remote().calls()[0].contains("limit:1"));
}

#[test]
fn test_changes_csv() {
    let world = TestWorld::new();
    two_changes(&world);

    let result = world.run(&["changes", "--format", "csv"]).unwrap();

    assert!(result.success(), "{}", result.stderr());
    let lines: Vec<&str> = result.stdout().lines().collect();
    assert_eq!(lines[0], "Change,Project,Branch,Owner,Status,Approvals,Subject,Url");
    assert_eq!(
        lines[1],
        "1001,openstack/nova,master,alice,NEW,\"V+1,R-1\",Fix resize,https://review.example.org/1001"
    );
    assert_eq!(lines.len(), 3);
}

#[test]
fn test_second_run_is_served_from_cache() {
    let world = TestWorld::new();
    two_changes(&world);

    let first = world.run(&["changes", "--format", "json"]).unwrap();
    assert!(first.success(), "{}", first.stderr());
    let calls_after_first = world.remote().call_count();

    let second = world.run(&["changes", "--format", "json"]).unwrap();
    assert!(second.success(), "{}", second.stderr());

    assert_eq!(first.stdout(), second.stdout());
    assert_eq!(world.remote().call_count(), calls_after_first);
    assert_eq!(world.cache_entries("short").len(), calls_after_first);
    assert!(world.cache_entries("long").is_empty());
}

#[test]
fn test_refresh_and_no_cache_reach_the_server() {
    let world = TestWorld::new();
    // each run is a full page followed by an empty one
    for call in [1, 3, 5] {
        two_changes_at(&world, call);
    }

    let first = world.run(&["changes", "--format", "json"]).unwrap();
    assert!(first.success(), "{}", first.stderr());
    assert_eq!(world.remote().call_count(), 2);

    let refreshed = world.run(&["changes", "--format", "json", "--refresh"]).unwrap();
    assert_eq!(world.remote().call_count(), 4);
    assert_eq!(refreshed.stdout(), first.stdout());

    let direct = world.run(&["changes", "--format", "json", "--no-cache"]).unwrap();
    assert_eq!(world.remote().call_count(), 6);
    assert_eq!(direct.stdout(), first.stdout());
}

#[test]
fn test_long_cache_uses_its_own_directory() {
    let world = TestWorld::new();
    two_changes(&world);

    let result = world.run(&["changes", "--long-cache"]).unwrap();
    assert!(result.success(), "{}", result.stderr());
    assert!(!world.cache_entries("long").is_empty());
    assert!(world.cache_entries("short").is_empty());
}

#[test]
fn test_file_filter() {
    let world = TestWorld::new();
    two_changes(&world);

    let mut cmd = cargo_bin_cmd!("gerrymander");
    world
        .configure_command(&mut cmd)
        .args(["changes", "--file", "^doc/"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("0 changes"));

    let calls = world.remote().calls();
    assert!(calls[0].contains("--files"), "{calls:?}");

    let mut cmd = cargo_bin_cmd!("gerrymander");
    world
        .configure_command(&mut cmd)
        .args(["changes", "--file", "^openstack/nova/"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2 changes"));
}

#[test]
fn test_failed_command_reports_stderr_and_exits_nonzero() {
    let world = TestWorld::new();
    world.remote().fail(1, "permission denied (publickey)", 2);

    let mut cmd = cargo_bin_cmd!("gerrymander");
    world.configure_command(&mut cmd).arg("changes");
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error:"))
        .stderr(predicate::str::contains("permission denied (publickey)"))
        .stderr(predicate::str::contains("gerrit query"));

    assert!(world.cache_entries("short").is_empty());
}

#[test]
fn test_server_error_record() {
    let world = TestWorld::new();
    world.remote().respond_json(1, [fixtures::error("boom")]);

    let mut cmd = cargo_bin_cmd!("gerrymander");
    world.configure_command(&mut cmd).arg("changes");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("boom"));
}

#[test]
fn test_malformed_output_line_is_skipped() {
    let world = TestWorld::new();
    let good = fixtures::change(7, "nova", "Seven").to_string();
    world
        .remote()
        .respond(1, &format!("{good}\nssh: warning, not json\n"));

    let result = world.run(&["changes", "--format", "json", "--no-cache"]).unwrap();
    assert!(result.success(), "{}", result.stderr());
    assert_eq!(result.json_lines().unwrap().len(), 1);
    assert!(result.stderr().contains("skipping undecodable output line"));
}

#[test]
fn test_raw_prints_compact_json() {
    let world = TestWorld::new();
    world
        .remote()
        .respond_json(1, [json!({"name": "nova"}), json!({"name": "glance"})]);

    let mut cmd = cargo_bin_cmd!("gerrymander");
    world
        .configure_command(&mut cmd)
        .args(["raw", "--no-cache", "ls-projects", "--format", "JSON"]);
    cmd.assert()
        .success()
        .stdout("{\"name\":\"nova\"}\n{\"name\":\"glance\"}\n");

    assert!(world.remote().calls()[0].ends_with("gerrit ls-projects --format JSON"));
    assert!(world.cache_entries("short").is_empty());
}

#[test]
fn test_watch_filters_by_project() {
    let world = TestWorld::new();
    world.remote().respond_json(
        1,
        [
            json!({
                "type": "comment-added",
                "change": {"project": "nova", "number": "12", "subject": "Fix resize"},
                "author": {"username": "bob"},
                "approvals": [{"type": "Code-Review", "value": "2"}]
            }),
            json!({
                "type": "patchset-created",
                "change": {"project": "glance", "number": "13", "subject": "Other"},
                "uploader": {"username": "carol"}
            }),
            json!({"type": "some-future-event"}),
        ],
    );

    let mut cmd = cargo_bin_cmd!("gerrymander");
    world
        .configure_command(&mut cmd)
        .args(["watch", "--project", "nova"]);
    cmd.assert()
        .success()
        .stdout("nova 12 comment added by bob: Fix resize [R+2]\n");

    assert!(world.remote().calls()[0].ends_with("gerrit stream-events"));
}

#[test]
fn test_username_from_config() {
    let world = TestWorld::new();
    world.write_config("username = 'alice'");
    two_changes(&world);

    let result = world.run(&["changes", "--no-cache"]).unwrap();
    assert!(result.success(), "{}", result.stderr());
    assert!(world.remote().calls()[0].contains("-p 29418 alice@review.example.org gerrit query"));
}

fn with_groups(world: &TestWorld) {
    world.append_config(
        r#"
[organization]
groups = ["compute", "image"]

[groups.compute]
projects = ["openstack/nova", "openstack/python-novaclient"]

[groups.image]
projects = ["openstack/glance"]
"#,
    );
}

#[test]
fn test_changes_for_project_group() {
    let world = TestWorld::new();
    with_groups(&world);
    two_changes(&world);

    let result = world.run(&["changes", "--group", "compute", "--no-cache"]).unwrap();
    assert!(result.success(), "{}", result.stderr());

    let calls = world.remote().calls();
    assert!(
        calls[0].contains("( project:openstack/nova OR project:openstack/python-novaclient )"),
        "{calls:?}"
    );
}

#[test]
fn test_changes_for_all_groups() {
    let world = TestWorld::new();
    with_groups(&world);
    two_changes(&world);

    let result = world.run(&["changes", "--all-groups", "--no-cache"]).unwrap();
    assert!(result.success(), "{}", result.stderr());
    assert!(world.remote().calls()[0].contains(
        "( project:openstack/nova OR project:openstack/python-novaclient OR project:openstack/glance )"
    ));
}

#[test]
fn test_unknown_group_is_an_error() {
    let world = TestWorld::new();
    with_groups(&world);

    let result = world.run(&["changes", "-g", "storage"]).unwrap();
    assert!(!result.success());
    assert!(result.stderr().contains("Unknown project group 'storage'"), "{}", result.stderr());
    assert_eq!(world.remote().call_count(), 0);
}

#[test]
fn test_project_and_group_are_exclusive() {
    let world = TestWorld::new();
    with_groups(&world);

    for args in [
        &["changes", "--project", "openstack/nova", "--group", "compute"][..],
        &["changes", "--group", "compute", "--all-groups"],
        &["watch", "-p", "openstack/nova", "--all-groups"],
    ] {
        let result = world.run(args).unwrap();
        assert!(!result.success(), "{args:?}");
        assert!(result.stderr().contains("cannot be used with"), "{}", result.stderr());
    }
    assert_eq!(world.remote().call_count(), 0);
}

#[test]
fn test_watch_filters_by_group() {
    let world = TestWorld::new();
    with_groups(&world);
    world.remote().respond_json(
        1,
        [
            json!({
                "type": "patchset-created",
                "change": {"project": "openstack/glance", "number": "21", "subject": "Image fix"},
                "uploader": {"username": "carol"}
            }),
            json!({
                "type": "patchset-created",
                "change": {"project": "openstack/swift", "number": "22", "subject": "Other"},
                "uploader": {"username": "dave"}
            }),
        ],
    );

    let mut cmd = cargo_bin_cmd!("gerrymander");
    world
        .configure_command(&mut cmd)
        .args(["watch", "--group", "image"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("openstack/glance 21"))
        .stdout(predicate::str::contains("swift").not());
}

#[test]
fn test_changes_help_lists_cache_flags() {
    let mut cmd = cargo_bin_cmd!("gerrymander");
    cmd.args(["changes", "--help"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--no-cache"))
        .stdout(predicate::str::contains("--refresh"))
        .stdout(predicate::str::contains("--long-cache"));
}

#[test]
fn test_refresh_conflicts_with_no_cache() {
    let world = TestWorld::new();
    let result = world.run(&["changes", "--refresh", "--no-cache"]).unwrap();
    assert!(!result.success());
    assert!(result.stderr().contains("cannot be used with"));
    assert_eq!(world.remote().call_count(), 0);
}
