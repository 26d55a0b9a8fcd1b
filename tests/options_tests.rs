//! Option registry contract tests: set/reset/check semantics shared by
//! every module.

use red_team_shell::options::{parse_set_args, ModuleOptions, SetOutcome};
use red_team_shell::Error;

fn set_one(options: &mut ModuleOptions, key: &str, value: &str) {
    let outcome = options.set(&[(key.to_string(), Some(value.to_string()))]);
    assert_eq!(outcome, SetOutcome::Updated);
}

#[test]
fn reset_clears_every_option_and_required_checks_fail_again() {
    let mut options = ModuleOptions::new()
        .declare("id", true, "The unique ID for the user")
        .declare("note", false, "Free-form note");

    set_one(&mut options, "id", "00u123");
    set_one(&mut options, "note", "scratch");
    assert!(options.check().is_ok());

    options.reset();

    assert_eq!(options.get("id"), None);
    assert_eq!(options.get("note"), None);
    assert!(options.check().is_err());
}

#[test]
fn all_null_updates_are_a_no_op_that_requests_usage() {
    let mut options = ModuleOptions::new()
        .declare("id", true, "The unique ID for the user")
        .declare("email", false, "Primary email address");
    set_one(&mut options, "id", "00u123");

    let before = options.clone();
    let outcome = options.set(&[("id".to_string(), None), ("email".to_string(), None)]);

    assert_eq!(outcome, SetOutcome::ShowUsage);
    assert_eq!(options, before);
}

#[test]
fn list_options_split_comma_input_into_ordered_values() {
    let mut options = ModuleOptions::new().declare_list("group_ids", false, "Group IDs");

    set_one(&mut options, "group_ids", "a,b,c");

    assert_eq!(
        options.get_list("group_ids"),
        Some(&["a".to_string(), "b".to_string(), "c".to_string()][..])
    );
}

#[test]
fn set_trims_surrounding_whitespace() {
    let mut options = ModuleOptions::new().declare("id", true, "The unique ID for the user");

    set_one(&mut options, "id", "  00u123  ");

    assert_eq!(options.get("id"), Some("00u123"));
}

#[test]
fn blank_input_does_not_clobber_a_previously_set_value() {
    let mut options = ModuleOptions::new().declare("id", true, "The unique ID for the user");
    set_one(&mut options, "id", "00u123");

    options.set(&[("id".to_string(), Some("   ".to_string()))]);

    assert_eq!(options.get("id"), Some("00u123"));
    assert!(options.check().is_ok());
}

#[test]
fn unknown_option_names_are_skipped_without_mutating_known_ones() {
    let mut options = ModuleOptions::new().declare("id", true, "The unique ID for the user");
    set_one(&mut options, "id", "00u123");

    let outcome = options.set(&[("bogus".to_string(), Some("value".to_string()))]);

    assert_eq!(outcome, SetOutcome::Updated);
    assert_eq!(options.get("id"), Some("00u123"));
    assert_eq!(options.get("bogus"), None);
}

#[test]
fn check_scans_past_satisfied_and_optional_options() {
    // An optional unset option first, a required unset option second: the
    // scan must not stop at the first entry.
    let options = ModuleOptions::new()
        .declare("note", false, "Free-form note")
        .declare("id", true, "The unique ID for the user");

    match options.check() {
        Err(Error::Validation(name)) => assert_eq!(name, "id"),
        other => panic!("expected validation failure for id, got {other:?}"),
    }
}

#[test]
fn check_reports_the_first_required_option_that_is_unset() {
    let mut options = ModuleOptions::new()
        .declare("first_name", true, "Given name of the user")
        .declare("last_name", true, "Family name of the user");
    set_one(&mut options, "first_name", "Ada");

    match options.check() {
        Err(Error::Validation(name)) => assert_eq!(name, "last-name"),
        other => panic!("expected validation failure for last-name, got {other:?}"),
    }
}

#[test]
fn lifecycle_scenario_check_set_check_reset_check() {
    let mut options = ModuleOptions::new().declare("id", true, "The unique ID for the user");

    assert!(options.check().is_err());

    set_one(&mut options, "id", "123");
    assert!(options.check().is_ok());

    options.reset();
    assert!(options.check().is_err());
}

#[test]
fn set_args_parse_flags_and_map_dashes_to_underscores() {
    let args: Vec<String> =
        ["--first-name", "Ada", "--group-ids", "a,b"].iter().map(|s| s.to_string()).collect();

    let updates = parse_set_args(&args);

    assert_eq!(
        updates,
        vec![
            ("first_name".to_string(), Some("Ada".to_string())),
            ("group_ids".to_string(), Some("a,b".to_string())),
        ]
    );
}
