use std::collections::{BTreeSet, HashSet};

use fieldwise::{assert_that, AssertionError, DifferenceKind};
use serial_test::serial;
use test_case::test_case;

use crate::model::*;

fn paths(actual: &Person, expected: &PersonDto) -> eyre::Result<Vec<String>> {
    Ok(assert_that(actual)
        .using_recursive_comparison()
        .differences(expected)?
        .iter()
        .map(|difference| difference.location().path_for_report())
        .collect())
}

#[test]
#[serial(defaults)]
fn person_equals_its_dto() -> eyre::Result<()> {
    assert_that(&sheldon())
        .using_recursive_comparison()
        .is_equal_to(&sheldon_dto())?;
    assert_that(&sheldon())
        .using_recursive_comparison()
        .is_equal_to(&sheldon())?;
    Ok(())
}

#[test]
#[serial(defaults)]
fn differences_are_sorted_by_path() -> eyre::Result<()> {
    let mut dto = sheldon_dto();
    dto.nicknames = vec!["Shelly", "Cooper"];
    dto.home.address.street = "Baker Street";
    dto.age = 31;

    pretty_assertions::assert_eq!(
        paths(&sheldon(), &dto)?,
        vec!["age", "home.address.street", "nicknames.[1]"]
    );
    Ok(())
}

#[test]
#[serial(defaults)]
fn none_against_some() -> eyre::Result<()> {
    let mut dto = sheldon_dto();
    dto.partner = Some("Amy");

    let differences = assert_that(&sheldon())
        .using_recursive_comparison()
        .differences(&dto)?;
    pretty_assertions::assert_eq!(differences.len(), 1);
    pretty_assertions::assert_eq!(differences[0].kind(), DifferenceKind::NullMismatch);
    pretty_assertions::assert_eq!(differences[0].actual(), "None");

    assert_that(&sheldon())
        .using_recursive_comparison()
        .ignoring_all_actual_none_fields()
        .is_equal_to(&dto)?;
    check_fails(
        assert_that(&sheldon())
            .using_recursive_comparison()
            .ignoring_all_expected_none_fields()
            .is_equal_to(&dto),
    );
    Ok(())
}

fn check_fails(result: Result<(), AssertionError>) {
    assert!(matches!(result, Err(AssertionError::RecursivelyEq(_))));
}

#[test_case(&["home"] => vec!["nicknames"]; "whole subtree")]
#[test_case(&["home.address.street", "nicknames"] => Vec::<String>::new(); "several fields")]
#[serial(defaults)]
fn ignoring_fields(ignored: &[&str]) -> Vec<String> {
    let mut dto = sheldon_dto();
    dto.home.address.street = "Baker Street";
    dto.nicknames = vec![];

    assert_that(&sheldon())
        .using_recursive_comparison()
        .ignoring_fields(ignored.iter().copied())
        .differences(&dto)
        .unwrap()
        .iter()
        .map(|difference| difference.location().path_for_report())
        .collect()
}

#[test]
#[serial(defaults)]
fn ignoring_by_regex_and_type() -> eyre::Result<()> {
    let actual = sheldon();
    let mut expected = sheldon();
    expected.home.address = Address {
        number: 221,
        street: "Baker Street".to_string(),
    };

    assert_that(&actual)
        .using_recursive_comparison()
        .ignoring_fields_matching_regexes(["home\\.address\\..*"])
        .is_equal_to(&expected)?;
    assert_that(&actual)
        .using_recursive_comparison()
        .ignoring_fields_of_type::<Address>()
        .is_equal_to(&expected)?;
    assert_that(&actual)
        .using_recursive_comparison()
        .ignoring_fields_of_types_matching_regexes([".*::Address"])
        .is_equal_to(&expected)?;
    Ok(())
}

#[test]
#[serial(defaults)]
fn comparing_only_some_fields() -> eyre::Result<()> {
    let mut dto = sheldon_dto();
    dto.age = 99;
    dto.home.address.street = "Baker Street";

    assert_that(&sheldon())
        .using_recursive_comparison()
        .comparing_only_fields(["name", "home.address.number"])
        .is_equal_to(&dto)?;

    let err = assert_that(&sheldon())
        .using_recursive_comparison()
        .comparing_only_fields(["surname"])
        .is_equal_to(&dto)
        .unwrap_err();
    assert!(matches!(err, AssertionError::Comparison(_)));
    Ok(())
}

#[test]
#[serial(defaults)]
fn custom_comparators() -> eyre::Result<()> {
    let actual = sheldon();
    let mut expected = sheldon();
    expected.age = 34;
    expected.name = "SHELDON".to_string();

    assert_that(&actual)
        .using_recursive_comparison()
        .with_comparator_for_fields(|a: &u32, b: &u32| (a / 10).cmp(&(b / 10)), ["age"])
        .with_equals_for_type(|a: &String, b: &String| a.eq_ignore_ascii_case(b))
        .is_equal_to(&expected)?;

    assert_that(&actual)
        .using_recursive_comparison()
        .with_equals_for_fields_matching_regexes(|_: &u32, _: &u32| true, ["a.e"])
        .with_equals_for_fields(|a: &String, b: &String| a.eq_ignore_ascii_case(b), ["name"])
        .is_equal_to(&expected)?;
    Ok(())
}

#[test]
#[serial(defaults)]
fn custom_error_messages() {
    let actual = sheldon();
    let mut expected = sheldon();
    expected.age = 31;
    expected.home.owned = true;

    let err = assert_that(&actual)
        .using_recursive_comparison()
        .with_error_message_for_fields("age is off", ["age"])
        .with_error_message_for_type::<bool>("ownership differs")
        .is_equal_to(&expected)
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("\nage is off\n"));
    assert!(message.contains("\nownership differs"));
    assert!(!message.contains("field/property 'age' differ"));
}

/// A list of people against a set holding the same people.
#[test]
#[serial(defaults)]
fn list_against_set() -> eyre::Result<()> {
    let actual = vec![person("Sheldon", 30), person("Leonard", 31)];
    let expected: BTreeSet<Person> = [person("Leonard", 31), person("Sheldon", 30)]
        .into_iter()
        .collect();

    check_fails(
        assert_that(&actual)
            .using_recursive_comparison()
            .is_equal_to(&expected),
    );
    assert_that(&actual)
        .using_recursive_comparison()
        .ignoring_collection_order()
        .is_equal_to(&expected)?;
    check_fails(
        assert_that(&actual)
            .using_recursive_comparison()
            .ignoring_collection_order()
            .with_strict_type_checking()
            .is_equal_to(&expected),
    );

    let unordered: HashSet<Person> = expected.into_iter().collect();
    assert_that(&actual)
        .using_recursive_comparison()
        .is_equal_to(&unordered)?;
    Ok(())
}

#[test]
#[serial(defaults)]
fn strict_type_checking() -> eyre::Result<()> {
    assert_that(&sheldon())
        .using_recursive_comparison()
        .with_strict_type_checking()
        .is_equal_to(&sheldon())?;

    let differences = assert_that(&sheldon())
        .using_recursive_comparison()
        .with_strict_type_checking()
        .differences(&sheldon_dto())?;
    pretty_assertions::assert_eq!(differences.len(), 1);
    pretty_assertions::assert_eq!(differences[0].kind(), DifferenceKind::StrictTypeMismatch);
    assert!(differences[0].location().is_root());
    Ok(())
}

#[test]
#[serial(defaults)]
fn reports_are_deterministic() {
    let mut expected = sheldon_dto();
    expected.age = 31;
    expected.nicknames = vec!["Moon Pie", "Shelly"];

    let report = || {
        assert_that(&sheldon())
            .using_recursive_comparison()
            .described_as("sheldon")
            .is_equal_to(&expected)
            .unwrap_err()
            .to_string()
    };
    let first = report();
    pretty_assertions::assert_eq!(first, report());
    assert!(first.starts_with("[sheldon] Expecting actual:"));
    assert!(first.contains("found the following 3 differences:"));
}
