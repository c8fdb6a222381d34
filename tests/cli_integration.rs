//! Integration tests for the ubistage binary.
//!
//! Each test runs the CLI against a throwaway home, tool config and
//! package cache so that the user's environment never leaks in.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

/// A workspace, a package cache and a tool config pointing at it.
struct Env {
    root: TempDir,
}

impl Env {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        root.child("work").create_dir_all().unwrap();
        root.child("home").create_dir_all().unwrap();

        let env = Self { root };
        env.package("ubitrack/1.3.0/ubitrack/stable", &["bin/utcore.dll", "lib/libutcore.so"]);
        env.package(
            "ubitrack_component_vision_aruco/1.3.0/ubitrack/stable",
            &["share/Ubitrack/utql/aruco.xml"],
        );
        env.package("ubitrack_tools_trackman/1.0/ubitrack/stable", &["bin/trackman.dll"]);
        env.package("ubitrack_vision/1.3.0/ubitrack/stable", &["lib/libutvision.a"]);
        env.config("true");
        env
    }

    fn package(&self, dir: &str, files: &[&str]) {
        let pkg = self.root.child("cache").child(dir);
        pkg.create_dir_all().unwrap();
        for file in files {
            let child = pkg.child(file);
            std::fs::create_dir_all(child.path().parent().unwrap()).unwrap();
            child.write_str(file).unwrap();
        }
    }

    fn config(&self, cmake: &str) {
        let cache = self.root.child("cache");
        self.root
            .child("config.toml")
            .write_str(&format!(
                "cache_dir = {:?}\ncmake = {:?}\n",
                cache.path().display().to_string(),
                cmake
            ))
            .unwrap();
    }

    fn work(&self) -> assert_fs::fixture::ChildPath {
        self.root.child("work")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("ubistage").unwrap();
        cmd.current_dir(self.work().path())
            .env("HOME", self.root.child("home").path())
            .env("XDG_CONFIG_HOME", self.root.child("home").path())
            .env("UBISTAGE_CONFIG", self.root.child("config.toml").path())
            .env_remove("UBISTAGE_RECIPE")
            .env_remove("RUST_LOG");
        cmd
    }
}

#[test]
fn help_lists_commands() {
    Env::new()
        .cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("stage"))
        .stdout(predicate::str::contains("install"));
}

#[test]
fn recipe_defaults_to_builtin() {
    Env::new()
        .cmd()
        .arg("recipe")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("sinkgroup_test 0.1 (built-in)"))
        .stdout(predicate::str::contains("ubitrack:with_default_camera=true"));
}

#[test]
fn recipe_json_is_machine_readable() {
    let output = Env::new()
        .cmd()
        .args(["recipe", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["name"], "sinkgroup_test");
    assert_eq!(value["rules"].as_array().unwrap().len(), 8);
}

#[test]
fn plan_json_does_not_touch_staging_root() {
    let env = Env::new();

    let output = env
        .cmd()
        .args(["plan", "--json", "--dest", "out"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["dependencies"].as_array().unwrap().len(), 4);
    env.work().child("out").assert(predicate::path::missing());
}

#[test]
fn stage_copies_into_working_directory() {
    let env = Env::new();

    env.cmd()
        .arg("stage")
        .assert()
        .success()
        .stdout(predicate::str::contains("Staged 5 file(s)"));

    env.work().child("bin/utcore.dll").assert(predicate::path::is_file());
    env.work().child("bin/trackman.dll").assert(predicate::path::is_file());
    env.work().child("lib/libutcore.so").assert(predicate::path::is_file());
    env.work().child("lib/libutvision.a").assert(predicate::path::is_file());
    env.work()
        .child("share/Ubitrack/utql/aruco.xml")
        .assert(predicate::path::is_file());
    env.work()
        .child("stagebuildinfo.cmake")
        .assert(predicate::str::contains("STAGE_UBITRACK_VISION_ROOT"));
}

#[test]
fn stage_without_cache_fails() {
    let env = Env::new();

    env.cmd()
        .args(["stage", "--cache", "empty-cache"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"))
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn unknown_override_target_is_reported() {
    let env = Env::new();
    env.work()
        .child("ubistage.toml")
        .write_str(
            r#"
name = "broken"
version = "0.1"
requires = ["ubitrack/1.3.0@ubitrack/stable"]

[options.opencv]
with_cuda = true
"#,
        )
        .unwrap();

    env.cmd()
        .arg("install")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown dependency 'opencv'"));

    env.work().child("bin").assert(predicate::path::missing());
}

#[cfg(unix)]
#[test]
fn install_runs_build_steps() {
    let env = Env::new();

    env.cmd()
        .arg("install")
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed sinkgroup_test"));
}

#[cfg(unix)]
#[test]
fn failing_configure_stops_install() {
    let env = Env::new();
    env.config("false");

    env.cmd()
        .arg("install")
        .assert()
        .failure()
        .stderr(predicate::str::contains("configure step failed"));

    // Staging happened before the build
    env.work().child("bin/utcore.dll").assert(predicate::path::is_file());
}

#[test]
fn skip_build_never_spawns_cmake() {
    let env = Env::new();
    env.config("ubistage-no-such-cmake");

    env.cmd()
        .args(["install", "--skip-build", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn completion_mentions_binary() {
    Env::new()
        .cmd()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ubistage"));
}
