//! Property-based tests for core domain types and copy rules.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::fs;

use proptest::prelude::*;
use tempfile::TempDir;

use ubistage::core::options::{OptionModel, OptionOverride};
use ubistage::core::rules::{default_rules, CopyRule};
use ubistage::core::types::{PackageName, PackageRef};
use ubistage::engine::{stage_artifacts, PackageInstall};

/// Strategy for one reference component.
fn component() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_][a-zA-Z0-9_.+-]{0,15}"
}

/// Strategy for a relative file path under a subtree.
fn relative_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9_]{1,8}", 1..4).prop_flat_map(|dirs| {
        prop_oneof![
            Just("dll"),
            Just("so"),
            Just("so.1"),
            Just("dylib"),
            Just("a"),
            Just("txt"),
            Just("h"),
        ]
        .prop_map(move |ext| format!("{}.{}", dirs.join("/"), ext))
    })
}

proptest! {
    #[test]
    fn package_ref_display_parses_back(
        name in component(),
        version in component(),
        user in component(),
        channel in component(),
    ) {
        let text = format!("{name}/{version}@{user}/{channel}");
        let reference: PackageRef = text.parse().unwrap();
        prop_assert_eq!(reference.to_string(), text);
    }

    #[test]
    fn references_without_channel_are_rejected(name in component(), version in component()) {
        let text = format!("{name}/{version}");
        prop_assert!(text.parse::<PackageRef>().is_err());
    }

    #[test]
    fn star_matches_across_directories(path in relative_path()) {
        let rule = CopyRule::new("lib", "*.*", "lib").unwrap();
        prop_assert!(rule.matches(&path));
    }

    #[test]
    fn dll_rule_matches_only_dll(path in relative_path()) {
        let rule = CopyRule::new("bin", "*.dll", "bin").unwrap();
        prop_assert_eq!(rule.matches(&path), path.ends_with(".dll"));
    }

    #[test]
    fn out_of_scope_overrides_leave_model_untouched(option in "[a-z_]{1,12}") {
        let ubitrack = PackageName::new("ubitrack").unwrap();
        let mut model = OptionModel::new([ubitrack.clone()]);
        let before = model.clone();

        let result = model.apply_configuration_overrides(&[
            OptionOverride::new(ubitrack, option.clone(), true),
            OptionOverride::new(PackageName::new("opencv").unwrap(), option, true),
        ]);

        prop_assert!(result.is_err());
        prop_assert_eq!(model, before);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn staging_is_idempotent(files in prop::collection::btree_set(relative_path(), 0..8)) {
        let pkg = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        for (i, rel) in files.iter().enumerate() {
            for subtree in ["bin", "lib"] {
                let path = pkg.path().join(subtree).join(rel);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(&path, format!("{subtree}:{i}")).unwrap();
            }
        }
        let install = PackageInstall::new(
            "ubitrack/1.3.0@ubitrack/stable".parse().unwrap(),
            pkg.path(),
        );

        let first = stage_artifacts(&[install.clone()], &default_rules().unwrap(), dest.path()).unwrap();
        let second = stage_artifacts(&[install], &default_rules().unwrap(), dest.path()).unwrap();
        prop_assert_eq!(first, second);

        // Every staged dll comes from lib, the later rule
        for rel in files.iter().filter(|r| r.ends_with(".dll")) {
            let staged = fs::read_to_string(dest.path().join("bin").join(rel)).unwrap();
            prop_assert!(staged.starts_with("lib:"));
        }
    }
}
