use super::errors::QueryTranslationError;
use super::expression::{
    ColumnExpression, Literal, SqlBinaryExpression, SqlExpression, SqlFunctionExpression,
};

/// Render a translated expression as T-SQL
pub trait ToSql {
    fn to_sql(&self) -> Result<String, QueryTranslationError>;
}

/// Delimit an identifier, doubling any closing bracket
fn quote_identifier(identifier: &str) -> String {
    format!("[{}]", identifier.replace(']', "]]"))
}

impl ToSql for SqlExpression {
    fn to_sql(&self) -> Result<String, QueryTranslationError> {
        match self {
            SqlExpression::Column(column) => column.to_sql(),
            SqlExpression::Constant(literal) => literal.to_sql(),
            SqlExpression::Function(function) => function.to_sql(),
            SqlExpression::Binary(binary) => binary.to_sql(),
            SqlExpression::Member(member) => Err(QueryTranslationError::UntranslatedMemberAccess {
                member: member.member().to_string(),
            }),
        }
    }
}

impl ToSql for ColumnExpression {
    fn to_sql(&self) -> Result<String, QueryTranslationError> {
        Ok(format!(
            "{}.{}",
            quote_identifier(&self.table_alias),
            quote_identifier(&self.name)
        ))
    }
}

impl ToSql for Literal {
    fn to_sql(&self) -> Result<String, QueryTranslationError> {
        Ok(match self {
            Literal::Int32(value) => value.to_string(),
            Literal::Int64(value) => value.to_string(),
            Literal::Double(value) => {
                if !value.is_finite() {
                    return Err(QueryTranslationError::UnrepresentableLiteral {
                        value: value.to_string(),
                    });
                }
                if value.fract() == 0.0 {
                    format!("{:.1}E0", value)
                } else {
                    format!("{}E0", value)
                }
            }
            Literal::Boolean(true) => "CAST(1 AS bit)".to_string(),
            Literal::Boolean(false) => "CAST(0 AS bit)".to_string(),
            Literal::String(value) => format!("N'{}'", value.replace('\'', "''")),
            Literal::Null => "NULL".to_string(),
        })
    }
}

impl ToSql for SqlFunctionExpression {
    fn to_sql(&self) -> Result<String, QueryTranslationError> {
        let mut sql = match &self.instance {
            Some(instance) => format!("{}.{}", instance.to_sql()?, self.function_name),
            None => self.function_name.clone(),
        };
        if !self.niladic {
            let arguments = self
                .arguments
                .iter()
                .map(ToSql::to_sql)
                .collect::<Result<Vec<_>, _>>()?;
            sql.push('(');
            sql.push_str(&arguments.join(", "));
            sql.push(')');
        }
        Ok(sql)
    }
}

impl ToSql for SqlBinaryExpression {
    fn to_sql(&self) -> Result<String, QueryTranslationError> {
        Ok(format!(
            "({} {} {})",
            self.left.to_sql()?,
            self.operator.as_sql(),
            self.right.to_sql()?
        ))
    }
}
