//! Ordering and error handling of member translator chains

use mockall::mock;
use mockall::predicate::always;
use relmodel::query::spatial_types::POLYGON;
use relmodel::query::{
    ColumnExpression, Literal, MemberExpression, MemberTranslator, MemberTranslatorChain,
    QueryTranslationError, SqlExpression, ToSql,
};

mock! {
    pub Translator {}

    impl MemberTranslator for Translator {
        fn translate(&self, member_expression: &MemberExpression) -> Option<SqlExpression>;
    }
}

fn exterior_ring() -> MemberExpression {
    let column = ColumnExpression::new("p", "Boundary", &POLYGON, None);
    MemberExpression::access(SqlExpression::Column(column), "ExteriorRing").unwrap()
}

#[test]
fn test_first_match_wins() {
    let mut declining = MockTranslator::new();
    declining.expect_translate().with(always()).times(1).returning(|_| None);

    let mut matching = MockTranslator::new();
    matching
        .expect_translate()
        .withf(|member| member.member().name() == "ExteriorRing")
        .times(1)
        .returning(|_| Some(SqlExpression::constant(Literal::Int32(1))));

    let mut unreachable = MockTranslator::new();
    unreachable.expect_translate().never();

    let chain = MemberTranslatorChain::new()
        .with(declining)
        .with(matching)
        .with(unreachable);
    assert_eq!(chain.len(), 3);

    let translated = chain.translate(&exterior_ring()).unwrap();
    assert_eq!(translated.to_sql().unwrap(), "1");
}

#[test]
fn test_no_match_is_an_error_when_required() {
    let mut declining = MockTranslator::new();
    declining.expect_translate().times(2).returning(|_| None);
    let chain = MemberTranslatorChain::new().with(declining);

    assert!(chain.translate(&exterior_ring()).is_none());
    assert_eq!(
        chain.translate_required(&exterior_ring()),
        Err(QueryTranslationError::UntranslatableMember {
            member: "ExteriorRing".to_string(),
            declaring_type: "Polygon".to_string(),
        })
    );
}

#[test]
fn test_empty_chain() {
    let chain = MemberTranslatorChain::new();
    assert!(chain.is_empty());
    assert!(chain.translate(&exterior_ring()).is_none());
}

#[test]
fn test_untranslated_member_cannot_be_rendered() {
    let untranslated = SqlExpression::Member(exterior_ring());
    assert!(matches!(
        untranslated.to_sql(),
        Err(QueryTranslationError::UntranslatedMemberAccess { .. })
    ));
}
