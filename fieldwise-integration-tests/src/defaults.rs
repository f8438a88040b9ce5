use std::path::Path;

use fieldwise::{
    assert_that,
    config::{RecursiveComparisonDefaults, RepresentationDefaults},
    reset_defaults, set_defaults, Defaults,
};
use pretty_assertions::assert_eq;
use serial_test::serial;

use crate::model::*;

#[test]
fn sample_file() -> eyre::Result<()> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../fieldwise-sample.toml");
    let defaults = Defaults::load_from(&path)?;
    assert_eq!(
        defaults,
        Defaults {
            recursive_comparison: RecursiveComparisonDefaults {
                ignore_collection_order: true,
                ..Default::default()
            },
            representation: RepresentationDefaults { max_length: 200 },
        }
    );
    Ok(())
}

#[test]
#[serial(defaults)]
fn defaults_shape_reports() {
    let mut expected = sheldon_dto();
    expected.age = 31;
    let failure = || {
        assert_that(&sheldon())
            .using_recursive_comparison()
            .is_equal_to(&expected)
            .unwrap_err()
            .to_string()
    };

    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    set_defaults(Defaults {
        recursive_comparison: RecursiveComparisonDefaults {
            report_configuration: false,
            ..Default::default()
        },
        representation: RepresentationDefaults { max_length: 20 },
    });
    let short = failure();
    reset_defaults();
    let full = failure();

    assert!(short.contains("Expecting actual:\n  Person { name: \"Shel...\n"));
    assert!(!short.contains("The recursive comparison was performed with this configuration:"));
    assert!(full.contains("The recursive comparison was performed with this configuration:"));
}
