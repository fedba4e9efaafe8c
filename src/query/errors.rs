use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryTranslationError {
    #[error("The member '{member}' on '{declaring_type}' could not be translated to SQL.")]
    UntranslatableMember {
        member: String,
        declaring_type: String,
    },
    #[error("Member access '{member}' must be translated before it can be rendered as SQL.")]
    UntranslatedMemberAccess { member: String },
    #[error("Member '{member}' was not found on '{clr_type}'.")]
    MemberNotFound { member: String, clr_type: String },
    #[error("The entity type '{entity_type}' is not part of the model.")]
    EntityTypeNotFound { entity_type: String },
    #[error("'{segment}' is neither a property nor a navigation of '{entity_type}'.")]
    UnknownPathSegment {
        segment: String,
        entity_type: String,
    },
    #[error("The value '{value}' has no T-SQL literal form.")]
    UnrepresentableLiteral { value: String },
    #[error("Invalid member path '{path}': {reason}")]
    InvalidMemberPath { path: String, reason: String },
}
