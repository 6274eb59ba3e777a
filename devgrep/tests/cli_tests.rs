mod common;

use common::{TestInventory, assert_contains, assert_not_contains, init_test_logging};
use std::process::Command;

#[test]
fn test_help_includes_description() {
    init_test_logging();
    crate::test_log!("TEST START: test_help_includes_description");

    let output = Command::new(env!("CARGO_BIN_EXE_devgrep"))
        .arg("--help")
        .output()
        .expect("Failed to run devgrep --help");

    assert!(output.status.success(), "devgrep --help failed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "network devices");
    assert_contains(&stdout, "--use-cache");
    crate::test_log!("TEST PASS: test_help_includes_description");
}

#[test]
fn test_version() {
    init_test_logging();

    let output = Command::new(env!("CARGO_BIN_EXE_devgrep"))
        .arg("--version")
        .output()
        .expect("Failed to run devgrep --version");

    assert!(output.status.success());
    assert_contains(&String::from_utf8_lossy(&output.stdout), env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_list_devices() {
    init_test_logging();
    crate::test_log!("TEST START: test_list_devices");
    let fixture = TestInventory::new();

    let output = fixture
        .command()
        .arg("--list-devices")
        .output()
        .expect("Failed to run devgrep --list-devices");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for pattern in ["Devices", "Groups", "pynet_rtr1", "all", "cisco"] {
        assert_contains(&stdout, pattern);
    }
    crate::test_log!("TEST PASS: test_list_devices");
}

#[test]
fn test_missing_args() {
    init_test_logging();
    let fixture = TestInventory::new();

    let cases: [&[&str]; 2] = [&[], &["interface"]];
    for args in cases {
        let output = fixture.command().args(args).output().expect("Failed to run devgrep");

        assert_eq!(output.status.code(), Some(1));
        assert!(output.stdout.is_empty(), "stdout should be empty");
        assert_contains(
            &String::from_utf8_lossy(&output.stderr),
            "error: Grep pattern or devices not specified.",
        );
    }
}

#[test]
fn test_use_cache_with_missing_files_fails_closed() {
    init_test_logging();
    crate::test_log!("TEST START: test_use_cache_with_missing_files_fails_closed");
    let fixture = TestInventory::new();
    fixture.write_cache("pynet_rtr1", "interface FastEthernet0\n");

    let output = fixture
        .command()
        .args(["interface", "cisco", "--use-cache"])
        .output()
        .expect("Failed to run devgrep");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty(), "no partial output on cache miss");
    assert_contains(
        &String::from_utf8_lossy(&output.stderr),
        "Some cache files are missing: unable to use --use-cache option.",
    );
}

#[test]
fn test_use_cache_group_prefixes_lines_with_cache_path() {
    init_test_logging();
    crate::test_log!("TEST START: test_use_cache_group_prefixes_lines_with_cache_path");
    let fixture = TestInventory::new();
    let rtr1 = fixture.write_cache("pynet_rtr1", "hostname pynet-rtr1\ninterface FastEthernet0\n");
    let rtr2 = fixture.write_cache("pynet_rtr2", "hostname pynet-rtr2\ninterface FastEthernet4\n");

    let output = fixture
        .command()
        .args(["INTERFACE", "cisco", "--use-cache"])
        .output()
        .expect("Failed to run devgrep");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout,
        format!(
            "{}:interface FastEthernet0\n{}:interface FastEthernet4\n",
            rtr1.display(),
            rtr2.display()
        )
    );
    assert_not_contains(&stdout, "Failed devices:");
}

#[test]
fn test_use_cache_single_device_has_no_prefix() {
    init_test_logging();
    let fixture = TestInventory::new();
    fixture.write_cache(
        "juniper_srx",
        "set system host-name srx1\nset interfaces ge-0/0/0 unit 0\n",
    );

    let output = fixture
        .command()
        .args(["host-name", "juniper_srx", "--use-cache"])
        .output()
        .expect("Failed to run devgrep");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "set system host-name srx1\n");
}

#[test]
fn test_unknown_devices_reported_as_failed() {
    init_test_logging();
    crate::test_log!("TEST START: test_unknown_devices_reported_as_failed");
    let fixture = TestInventory::new();

    let output = fixture
        .command()
        .args(["interface", "bad_device", "another_bad_device"])
        .output()
        .expect("Failed to run devgrep");

    assert_eq!(output.status.code(), Some(3));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "\nFailed devices:\nanother_bad_device\nbad_device\n"
    );
    assert!(!fixture.cache_dir.join("bad_device.txt").exists());
}

#[test]
fn test_hide_failed_suppresses_section_but_not_exit_status() {
    init_test_logging();
    let fixture = TestInventory::new();

    let output = fixture
        .command()
        .args(["interface", "bad_device", "--hide-failed"])
        .output()
        .expect("Failed to run devgrep");

    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_display_runtime_goes_to_stderr() {
    init_test_logging();
    let fixture = TestInventory::new();
    fixture.write_cache("pynet_rtr1", "interface FastEthernet0\n");

    let output = fixture
        .command()
        .args(["interface", "pynet_rtr1", "--use-cache", "--display-runtime"])
        .output()
        .expect("Failed to run devgrep");

    assert!(output.status.success());
    assert_contains(&String::from_utf8_lossy(&output.stderr), "Total time: ");
    assert_not_contains(&String::from_utf8_lossy(&output.stdout), "Total time");
}

#[test]
fn test_invalid_env_config_is_fatal() {
    init_test_logging();
    let fixture = TestInventory::new();

    let output = fixture
        .command()
        .env("DEVGREP_CONCURRENCY", "0")
        .args(["interface", "cisco"])
        .output()
        .expect("Failed to run devgrep");

    assert_eq!(output.status.code(), Some(1));
    assert_contains(&String::from_utf8_lossy(&output.stderr), "DEVGREP_CONCURRENCY");
}

#[test]
fn test_missing_inventory_is_fatal() {
    init_test_logging();
    let fixture = TestInventory::new();

    let output = fixture
        .command()
        .env("DEVGREP_INVENTORY", fixture.dir.path().join("nope.toml"))
        .arg("--list-devices")
        .output()
        .expect("Failed to run devgrep");

    assert_eq!(output.status.code(), Some(1));
    assert_contains(&String::from_utf8_lossy(&output.stderr), "failed to load inventory");
}
