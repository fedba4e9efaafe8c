//! SQL expression tree
//!
//! The subset of the query pipeline's expression nodes that member
//! translation reads and produces: columns, constants, member accesses,
//! function calls and binary arithmetic.

use crate::metadata::clr_type::primitives::{BOOLEAN, DOUBLE, INT32, INT64, OBJECT, STRING};
use crate::metadata::{ClrType, MemberInfo, Property};

use super::errors::QueryTranslationError;
use super::type_mapping::{self, RelationalTypeMapping, TypeMappingSource};

#[derive(Debug, Clone, PartialEq)]
pub enum SqlExpression {
    Column(ColumnExpression),
    Constant(Literal),
    Member(MemberExpression),
    Function(SqlFunctionExpression),
    Binary(SqlBinaryExpression),
}

impl SqlExpression {
    /// Static CLR type of the expression's value
    pub fn clr_type(&self) -> ClrType {
        match self {
            SqlExpression::Column(column) => column.clr_type.clone(),
            SqlExpression::Constant(literal) => literal.clr_type(),
            SqlExpression::Member(member) => member.clr_type().clone(),
            SqlExpression::Function(function) => function.clr_type.clone(),
            SqlExpression::Binary(binary) => binary.clr_type.clone(),
        }
    }

    /// Backend store type of the spatial value this expression produces.
    ///
    /// Columns report their mapping, member accesses defer to their receiver
    /// and function calls report their result mapping.
    pub fn find_spatial_store_type(&self) -> Option<&str> {
        match self {
            SqlExpression::Column(column) => column.type_mapping.as_ref().map(|m| m.store_type()),
            SqlExpression::Member(member) => member.find_spatial_store_type(),
            SqlExpression::Function(function) => function
                .result_type_mapping
                .as_ref()
                .map(|m| m.store_type()),
            SqlExpression::Constant(_) | SqlExpression::Binary(_) => None,
        }
    }

    pub fn constant(literal: Literal) -> Self {
        SqlExpression::Constant(literal)
    }

    /// `left - right`, typed as `left`
    pub fn subtract(left: SqlExpression, right: SqlExpression) -> Self {
        let clr_type = left.clr_type();
        SqlExpression::Binary(SqlBinaryExpression {
            operator: BinaryOperator::Subtract,
            left: Box::new(left),
            right: Box::new(right),
            clr_type,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int32(i32),
    Int64(i64),
    Double(f64),
    Boolean(bool),
    String(String),
    Null,
}

impl Literal {
    pub fn clr_type(&self) -> ClrType {
        match self {
            Literal::Int32(_) => INT32.clone(),
            Literal::Int64(_) => INT64.clone(),
            Literal::Double(_) => DOUBLE.clone(),
            Literal::Boolean(_) => BOOLEAN.clone(),
            Literal::String(_) => STRING.clone(),
            Literal::Null => OBJECT.clone(),
        }
    }
}

/// A column of a table source, e.g. `[t].[Boundary]`
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnExpression {
    pub table_alias: String,
    pub name: String,
    pub clr_type: ClrType,
    pub type_mapping: Option<RelationalTypeMapping>,
}

impl ColumnExpression {
    pub fn new(
        table_alias: impl Into<String>,
        name: impl Into<String>,
        clr_type: &ClrType,
        type_mapping: Option<RelationalTypeMapping>,
    ) -> Self {
        ColumnExpression {
            table_alias: table_alias.into(),
            name: name.into(),
            clr_type: clr_type.clone(),
            type_mapping,
        }
    }

    /// Column for a mapped property, with the mapping resolved for the
    /// property's store type
    pub fn for_property(
        table_alias: impl Into<String>,
        property: &Property,
        type_mapping_source: &dyn TypeMappingSource,
    ) -> Self {
        let clr_type = property.clr_type().unwrap_or(&*OBJECT).clone();
        let type_mapping =
            type_mapping::find_mapping(type_mapping_source, &clr_type, property.store_type());
        ColumnExpression {
            table_alias: table_alias.into(),
            name: property.name().to_string(),
            clr_type,
            type_mapping,
        }
    }
}

/// Access to a member of a receiver expression, e.g. `p.Boundary.ExteriorRing`
#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpression {
    expression: Box<SqlExpression>,
    member: MemberInfo,
}

impl MemberExpression {
    pub fn new(expression: SqlExpression, member: MemberInfo) -> Self {
        MemberExpression {
            expression: Box::new(expression),
            member,
        }
    }

    /// Access `name` on `expression`, resolving the member on its static type
    pub fn access(expression: SqlExpression, name: &str) -> Result<Self, QueryTranslationError> {
        let clr_type = expression.clr_type();
        let member = clr_type
            .member(name)
            .ok_or_else(|| QueryTranslationError::MemberNotFound {
                member: name.to_string(),
                clr_type: clr_type.short_display_name(),
            })?;
        Ok(MemberExpression::new(expression, member))
    }

    /// The receiver
    pub fn expression(&self) -> &SqlExpression {
        &self.expression
    }

    pub fn member(&self) -> &MemberInfo {
        &self.member
    }

    pub fn clr_type(&self) -> &ClrType {
        self.member.member_type()
    }

    pub fn find_spatial_store_type(&self) -> Option<&str> {
        self.expression.find_spatial_store_type()
    }
}

/// Call of a backend function, optionally as a method on an instance
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFunctionExpression {
    pub instance: Option<Box<SqlExpression>>,
    pub function_name: String,
    pub clr_type: ClrType,
    pub arguments: Vec<SqlExpression>,
    pub result_type_mapping: Option<RelationalTypeMapping>,
    /// Rendered without parentheses, like a property (`.STX`)
    pub niladic: bool,
}

impl SqlFunctionExpression {
    /// Method call on `instance`: `instance.Name(args)`
    pub fn instance_call(
        instance: SqlExpression,
        function_name: impl Into<String>,
        clr_type: &ClrType,
        arguments: Vec<SqlExpression>,
        result_type_mapping: Option<RelationalTypeMapping>,
    ) -> Self {
        SqlFunctionExpression {
            instance: Some(Box::new(instance)),
            function_name: function_name.into(),
            clr_type: clr_type.clone(),
            arguments,
            result_type_mapping,
            niladic: false,
        }
    }

    /// Property-style accessor on `instance`: `instance.Name`
    pub fn instance_property(
        instance: SqlExpression,
        function_name: impl Into<String>,
        clr_type: &ClrType,
    ) -> Self {
        SqlFunctionExpression {
            instance: Some(Box::new(instance)),
            function_name: function_name.into(),
            clr_type: clr_type.clone(),
            arguments: Vec::new(),
            result_type_mapping: None,
            niladic: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlBinaryExpression {
    pub operator: BinaryOperator,
    pub left: Box<SqlExpression>,
    pub right: Box<SqlExpression>,
    pub clr_type: ClrType,
}
