//! Member translators
//!
//! A [`MemberTranslator`] rewrites a member access over a domain type into a
//! backend expression, or declines. Translators are tried in registration
//! order by a [`MemberTranslatorChain`] and the first match wins.

mod point;
mod polygon;

use std::sync::Arc;

use log::debug;

use super::errors::QueryTranslationError;
use super::expression::{MemberExpression, SqlExpression};
use super::type_mapping::TypeMappingSource;

pub use point::PointMemberTranslator;
pub use polygon::PolygonMemberTranslator;

pub trait MemberTranslator: Send + Sync {
    /// Translated expression, or `None` to let the next translator try
    fn translate(&self, member_expression: &MemberExpression) -> Option<SqlExpression>;
}

/// Ordered list of translators
#[derive(Clone, Default)]
pub struct MemberTranslatorChain {
    translators: Vec<Arc<dyn MemberTranslator>>,
}

impl MemberTranslatorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translators for SQL Server spatial columns
    pub fn sql_server_spatial(type_mapping_source: Arc<dyn TypeMappingSource>) -> Self {
        MemberTranslatorChain::new()
            .with(PolygonMemberTranslator::new(type_mapping_source))
            .with(PointMemberTranslator)
    }

    pub fn with(mut self, translator: impl MemberTranslator + 'static) -> Self {
        self.translators.push(Arc::new(translator));
        self
    }

    pub fn add(&mut self, translator: Arc<dyn MemberTranslator>) {
        self.translators.push(translator);
    }

    pub fn len(&self) -> usize {
        self.translators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }

    /// Like [`MemberTranslator::translate`], but no match is an error
    pub fn translate_required(
        &self,
        member_expression: &MemberExpression,
    ) -> Result<SqlExpression, QueryTranslationError> {
        self.translate(member_expression).ok_or_else(|| {
            let member = member_expression.member();
            QueryTranslationError::UntranslatableMember {
                member: member.name().to_string(),
                declaring_type: member.declaring_type().short_display_name(),
            }
        })
    }
}

impl MemberTranslator for MemberTranslatorChain {
    fn translate(&self, member_expression: &MemberExpression) -> Option<SqlExpression> {
        let translated = self
            .translators
            .iter()
            .find_map(|translator| translator.translate(member_expression));
        if translated.is_none() {
            debug!("No translator matched member '{}'", member_expression.member());
        }
        translated
    }
}
