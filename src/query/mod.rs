pub mod errors;
pub mod expression;
pub mod function_registry;
pub mod member_path;
pub mod member_translators;
pub mod spatial_types;
pub mod to_sql;
pub mod type_mapping;

// Re-export commonly used types
pub use errors::QueryTranslationError;
pub use expression::{ColumnExpression, Literal, MemberExpression, SqlExpression};
pub use member_path::translate_member_path;
pub use member_translators::{MemberTranslator, MemberTranslatorChain};
pub use to_sql::ToSql;
pub use type_mapping::{RelationalTypeMapping, SqlServerTypeMappingSource, TypeMappingSource};
