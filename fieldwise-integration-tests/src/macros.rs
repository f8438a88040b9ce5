use fieldwise::{
    assert_that, check_recursively_eq, check_recursively_ne, AssertionError,
    RecursiveComparisonConfiguration,
};
use pretty_assertions::assert_eq;
use serial_test::serial;

use crate::model::*;

#[test]
fn plain_assertions() -> eyre::Result<()> {
    let sheldon = sheldon();
    assert_that(&sheldon.name).is_equal_to("Sheldon")?;
    assert_that(&sheldon.nicknames.len())
        .described_as(format!("nicknames of {}", sheldon.name))
        .is_equal_to(&2)?;
    assert_that(&sheldon).is_not_equal_to(&leonard())?;
    Ok(())
}

#[test]
#[serial(defaults)]
fn recursive_checks() -> eyre::Result<()> {
    let sheldon = sheldon();
    let dto = sheldon_dto();
    check_recursively_eq!(sheldon, dto);
    check_recursively_eq!(sheldon, dto, "dto of {}", sheldon.name);
    check_recursively_ne!(sheldon, leonard());

    let mut moved = sheldon_dto();
    moved.home.address.number = 2312;
    let configuration = RecursiveComparisonConfiguration::builder()
        .ignoring_fields(["home.address"])
        .build()?;
    check_recursively_eq!(sheldon, moved, using = configuration);
    check_recursively_ne!(sheldon, moved, using = RecursiveComparisonConfiguration::default());
    Ok(())
}

fn sheldon_moved_out() -> Result<(), AssertionError> {
    let mut moved = sheldon_dto();
    moved.home.owned = true;
    check_recursively_eq!(sheldon(), moved, "after the move");
    Ok(())
}

#[test]
#[serial(defaults)]
fn failures_propagate() {
    let err = sheldon_moved_out().unwrap_err();
    assert!(matches!(err, AssertionError::RecursivelyEq(_)));

    let message = err.to_string();
    assert!(message.starts_with("[after the move] Expecting actual:"));
    assert_eq!(
        message.lines().filter(|line| line.starts_with("field/property")).collect::<Vec<_>>(),
        vec!["field/property 'home.owned' differ:"]
    );
}

fn plain_failure() -> eyre::Result<()> {
    assert_that(&sheldon().name).is_equal_to(&leonard().name)?;
    Ok(())
}

#[test]
fn plain_failures_propagate() {
    let err = plain_failure().unwrap_err();
    assert!(err.to_string().starts_with("check failed: `(actual == expected)`"));
    assert!(matches!(
        err.downcast_ref::<AssertionError>(),
        Some(AssertionError::Eq(_))
    ));
}
