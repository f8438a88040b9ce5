use std::rc::Rc;

use fieldwise::{assert_that, check_recursively_eq, check_recursively_ne};
use pretty_assertions::assert_eq;
use serial_test::serial;

use crate::model::*;

#[test]
#[serial(defaults)]
fn same_instance() -> eyre::Result<()> {
    let apartment = apartment("Sheldon", "Leonard");
    assert_that(&apartment)
        .using_recursive_comparison()
        .is_equal_to(&Rc::clone(&apartment))?;
    assert_that(&apartment)
        .using_recursive_comparison()
        .with_strict_type_checking()
        .is_equal_to(&apartment)?;
    Ok(())
}

#[test]
#[serial(defaults)]
fn equally_shaped_cycles() -> eyre::Result<()> {
    let actual = apartment("Sheldon", "Leonard");
    let expected = apartment("Sheldon", "Leonard");
    assert_that(&actual)
        .using_recursive_comparison()
        .is_equal_to(&expected)?;
    check_recursively_eq!(actual, expected);
    Ok(())
}

#[test]
#[serial(defaults)]
fn differences_inside_cycles() -> eyre::Result<()> {
    let actual = apartment("Sheldon", "Leonard");
    let expected = apartment("Sheldon", "Penny");

    let differences = assert_that(&actual)
        .using_recursive_comparison()
        .differences(&expected)?;
    let paths: Vec<_> = differences
        .iter()
        .map(|difference| difference.location().path_for_report())
        .collect();
    assert_eq!(paths, vec!["roommate.name"]);
    assert_eq!(differences[0].actual(), "\"Leonard\"");
    assert_eq!(differences[0].expected(), "\"Penny\"");

    check_recursively_ne!(actual, expected);
    Ok(())
}

#[test]
#[serial(defaults)]
fn cycles_inside_collections() -> eyre::Result<()> {
    let actual = vec![apartment("Howard", "Bernadette"), apartment("Sheldon", "Leonard")];
    let expected = vec![apartment("Sheldon", "Leonard"), apartment("Howard", "Bernadette")];

    assert_that(&actual)
        .using_recursive_comparison()
        .ignoring_collection_order()
        .is_equal_to(&expected)?;
    Ok(())
}
