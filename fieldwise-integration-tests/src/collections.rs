use std::collections::{BTreeMap, HashMap, VecDeque};

use fieldwise::{assert_that, DifferenceKind, Introspect};
use indexmap::{IndexMap, IndexSet};
use serial_test::serial;
use test_case::test_case;

use crate::model::*;

fn library(shelves: &[(&str, Vec<Book>)]) -> Library {
    Library {
        owner: "Raj".to_string(),
        shelves: shelves
            .iter()
            .map(|(label, books)| (label.to_string(), books.clone()))
            .collect(),
    }
}

#[test]
#[serial(defaults)]
fn order_sensitivity() -> eyre::Result<()> {
    let actual = vec!["A", "B", "C"];
    let expected = vec!["C", "B", "A"];

    let paths: Vec<_> = assert_that(&actual)
        .using_recursive_comparison()
        .differences(&expected)?
        .iter()
        .map(|difference| difference.location().path_for_report())
        .collect();
    pretty_assertions::assert_eq!(paths, vec!["[0]", "[2]"]);

    assert_that(&actual)
        .using_recursive_comparison()
        .ignoring_collection_order()
        .is_equal_to(&expected)?;
    Ok(())
}

#[test]
#[serial(defaults)]
fn ordered_collections_of_different_types() -> eyre::Result<()> {
    let actual = vec![1, 2, 3];
    let expected: VecDeque<u8> = [1, 2, 3].into_iter().collect();
    assert_that(&actual)
        .using_recursive_comparison()
        .is_equal_to(&expected)?;

    let expected: IndexSet<i64> = [1, 2, 3].into_iter().collect();
    assert_that(&actual)
        .using_recursive_comparison()
        .is_equal_to(&expected)?;
    Ok(())
}

#[test]
#[serial(defaults)]
fn arrays() -> eyre::Result<()> {
    let actual = vec![1, 2];
    let expected = [1, 2];

    let differences = assert_that(&actual)
        .using_recursive_comparison()
        .differences(&expected)?;
    pretty_assertions::assert_eq!(differences.len(), 1);
    pretty_assertions::assert_eq!(differences[0].kind(), DifferenceKind::TypeMismatch);

    assert_that(&actual)
        .using_recursive_comparison()
        .allowing_array_type_for_expected()
        .is_equal_to(&expected)?;
    assert_that(&[2, 1])
        .using_recursive_comparison()
        .ignoring_array_order()
        .is_equal_to(&expected)?;
    Ok(())
}

#[test]
#[serial(defaults)]
fn collection_order_in_some_fields() -> eyre::Result<()> {
    let actual = library(&[(
        "physics",
        vec![book("Brief History", Genre::Physics), book("Feynman", Genre::Physics)],
    )]);
    let expected = library(&[(
        "physics",
        vec![book("Feynman", Genre::Physics), book("Brief History", Genre::Physics)],
    )]);

    assert!(assert_that(&actual)
        .using_recursive_comparison()
        .is_equal_to(&expected)
        .is_err());
    assert_that(&actual)
        .using_recursive_comparison()
        .ignoring_collection_order_in_fields(["shelves.physics"])
        .is_equal_to(&expected)?;
    assert_that(&actual)
        .using_recursive_comparison()
        .ignoring_collection_order_in_fields_matching_regexes(["shelves\\..*"])
        .is_equal_to(&expected)?;
    Ok(())
}

#[test]
#[serial(defaults)]
fn unmatched_elements_are_listed() -> eyre::Result<()> {
    let actual = vec!["Penny", "Amy"];
    let expected = vec!["Bernadette", "Penny"];

    let differences = assert_that(&actual)
        .using_recursive_comparison()
        .ignoring_collection_order()
        .differences(&expected)?;
    pretty_assertions::assert_eq!(differences.len(), 1);
    pretty_assertions::assert_eq!(differences[0].kind(), DifferenceKind::UnmatchedElements);
    pretty_assertions::assert_eq!(
        differences[0].description(),
        Some("The following expected elements were not matched in the actual Vec:\n  [\"Bernadette\"]")
    );
    Ok(())
}

#[test]
#[serial(defaults)]
fn skipped_fields_are_not_compared() -> eyre::Result<()> {
    let mut borrowed = book("Watchmen", Genre::Comics);
    borrowed.checked_out = 3;
    assert_that(&borrowed)
        .using_recursive_comparison()
        .is_equal_to(&book("Watchmen", Genre::Comics))?;
    Ok(())
}

#[test]
#[serial(defaults)]
fn map_values_are_compared_by_key() -> eyre::Result<()> {
    let actual = library(&[
        ("fiction", vec![book("Dune", Genre::Fiction)]),
        ("comics", vec![book("Watchmen", Genre::Comics)]),
    ]);
    let expected = library(&[
        ("comics", vec![book("Watchmen", Genre::Comics)]),
        ("fiction", vec![book("Dune", Genre::Physics)]),
    ]);

    let differences = assert_that(&actual)
        .using_recursive_comparison()
        .differences(&expected)?;
    pretty_assertions::assert_eq!(differences.len(), 1);
    pretty_assertions::assert_eq!(
        differences[0].location().path_for_report(),
        "shelves.fiction.[0].genre"
    );
    pretty_assertions::assert_eq!(differences[0].actual(), "Fiction");
    pretty_assertions::assert_eq!(differences[0].expected(), "Physics");

    assert_that(&actual)
        .using_recursive_comparison()
        .ignoring_fields(["shelves.fiction"])
        .is_equal_to(&expected)?;
    Ok(())
}

#[test_case(
    &[("apples", 3), ("pears", 1)]
    => "The following keys were not found in the actual map value:\n  [\"pears\"]\n\
        The following keys were present in the actual map value, but not in the expected map value:\n  [\"plums\"]";
    "different keys")]
#[test_case(
    &[("apples", 3)]
    => "actual and expected values are maps of different size, actual size=2 when expected size=1\n\
        The following keys were present in the actual map value, but not in the expected map value:\n  [\"plums\"]";
    "fewer keys")]
#[serial(defaults)]
fn map_keys(expected: &[(&'static str, u32)]) -> String {
    let actual: HashMap<&str, u32> = [("apples", 3), ("plums", 1)].into_iter().collect();
    let expected: IndexMap<&str, u32> = expected.iter().copied().collect();
    let differences = assert_that(&actual)
        .using_recursive_comparison()
        .differences(&expected)
        .unwrap();
    pretty_assertions::assert_eq!(differences.len(), 1);
    pretty_assertions::assert_eq!(differences[0].kind(), DifferenceKind::MissingKeys);
    differences[0].description().unwrap_or_default().to_string()
}

#[test]
#[serial(defaults)]
fn sorted_maps() -> eyre::Result<()> {
    let actual: BTreeMap<u32, &str> = [(1, "one"), (2, "two")].into_iter().collect();
    let expected: BTreeMap<u64, String> = [(1, "one".to_string()), (3, "two".to_string())]
        .into_iter()
        .collect();

    let differences = assert_that(&actual)
        .using_recursive_comparison()
        .differences(&expected)?;
    pretty_assertions::assert_eq!(differences.len(), 1);
    pretty_assertions::assert_eq!(differences[0].kind(), DifferenceKind::KeyMismatch);
    pretty_assertions::assert_eq!(differences[0].keys(), Some(("2", "3")));

    let unsorted: HashMap<u32, &str> = actual.clone().into_iter().collect();
    let differences = assert_that(&unsorted)
        .using_recursive_comparison()
        .differences(&actual)?;
    pretty_assertions::assert_eq!(differences[0].kind(), DifferenceKind::TypeMismatch);

    assert_that(&actual)
        .using_recursive_comparison()
        .is_equal_to(&unsorted)?;
    Ok(())
}

#[test]
#[serial(defaults)]
fn strict_type_checking_on_actual_iterable() -> eyre::Result<()> {
    let actual = vec![person("Sheldon", 30)];
    let expected = VecDeque::from([person("Sheldon", 30)]);

    assert!(assert_that(&actual)
        .using_recursive_comparison()
        .with_strict_type_checking_on_actual_iterable()
        .is_equal_to(&expected)
        .is_err());

    let actual: Vec<Box<dyn Introspect>> = vec![Box::new(sheldon())];
    let expected: Vec<Box<dyn Introspect>> = vec![Box::new(sheldon_dto())];
    assert_that(&actual)
        .using_recursive_comparison()
        .with_strict_type_checking_on_actual_iterable()
        .is_equal_to(&expected)?;
    assert!(assert_that(&actual)
        .using_recursive_comparison()
        .with_strict_type_checking()
        .is_equal_to(&expected)
        .is_err());
    Ok(())
}

#[test]
#[serial(defaults)]
fn enum_compared_to_string() -> eyre::Result<()> {
    assert!(assert_that(&Genre::Comics)
        .using_recursive_comparison()
        .is_equal_to(&"comics")
        .is_err());
    assert_that(&Genre::Comics)
        .using_recursive_comparison()
        .allowing_enum_compared_to_string()
        .is_equal_to(&"comics")?;
    Ok(())
}
