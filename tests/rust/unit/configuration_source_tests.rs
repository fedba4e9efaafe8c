//! Precedence and parsing of configuration sources

use relmodel::metadata::ConfigurationSource;
use test_case::test_case;

#[test]
fn test_precedence_order() {
    assert!(ConfigurationSource::Convention < ConfigurationSource::DataAnnotation);
    assert!(ConfigurationSource::DataAnnotation < ConfigurationSource::Explicit);
    assert_eq!(
        ConfigurationSource::Convention.max(ConfigurationSource::Explicit),
        ConfigurationSource::Explicit
    );
}

#[test_case(ConfigurationSource::Explicit, None, true ; "anything overrides nothing")]
#[test_case(ConfigurationSource::Convention, Some(ConfigurationSource::Convention), true ; "same source")]
#[test_case(ConfigurationSource::Convention, Some(ConfigurationSource::Explicit), false ; "weaker source")]
#[test_case(ConfigurationSource::Explicit, Some(ConfigurationSource::DataAnnotation), true ; "stronger source")]
fn test_overrides(source: ConfigurationSource, other: Option<ConfigurationSource>, expected: bool) {
    assert_eq!(source.overrides(other), expected);
}

#[test_case("explicit", ConfigurationSource::Explicit ; "explicit")]
#[test_case(" Convention ", ConfigurationSource::Convention ; "trimmed and case insensitive")]
#[test_case("data_annotation", ConfigurationSource::DataAnnotation ; "data annotation")]
fn test_parse(input: &str, expected: ConfigurationSource) {
    assert_eq!(input.parse::<ConfigurationSource>().unwrap(), expected);
    assert_eq!(expected.to_string().parse::<ConfigurationSource>().unwrap(), expected);
}

#[test]
fn test_parse_unknown() {
    let error = "fluent".parse::<ConfigurationSource>().unwrap_err();
    assert!(error.to_string().contains("'fluent'"));
}
