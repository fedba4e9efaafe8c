//! Runtime type descriptors
//!
//! `ClrType` stands in for a runtime class handle. It carries enough shape
//! (namespace, nesting, generic arguments, base type, interfaces and declared
//! properties) for the registry to derive canonical display names and for the
//! query translators to check assignability and map members onto interfaces.
//!
//! Equality and hashing are by identity: two descriptors built separately are
//! different types even when their names match, exactly like two classes
//! loaded from different assemblies.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

lazy_static! {
    /// Matches the generic arity suffix of a type name (e.g. `Dictionary`2`)
    static ref GENERIC_ARITY_SUFFIX: Regex =
        Regex::new(r"`\d+$").expect("generic arity pattern is valid");
}

/// Well-known `System` types used by the metadata and query layers
pub mod primitives {
    use super::ClrType;
    use lazy_static::lazy_static;

    lazy_static! {
        pub static ref BOOLEAN: ClrType = ClrType::new("System", "Boolean");
        pub static ref INT32: ClrType = ClrType::new("System", "Int32");
        pub static ref INT64: ClrType = ClrType::new("System", "Int64");
        pub static ref DOUBLE: ClrType = ClrType::new("System", "Double");
        pub static ref DECIMAL: ClrType = ClrType::new("System", "Decimal");
        pub static ref STRING: ClrType = ClrType::new("System", "String");
        pub static ref OBJECT: ClrType = ClrType::new("System", "Object");
    }
}

struct ClrTypeInfo {
    id: u64,
    namespace: Option<String>,
    name: String,
    declaring_type: Option<ClrType>,
    generic_arguments: Vec<ClrType>,
    base_type: Option<ClrType>,
    interfaces: Vec<ClrType>,
    properties: Vec<(String, ClrType)>,
    is_interface: bool,
}

/// Handle to a runtime type descriptor. Cheap to clone.
#[derive(Clone)]
pub struct ClrType(Arc<ClrTypeInfo>);

impl ClrType {
    /// Create a plain class with no members, base type or interfaces
    pub fn new(namespace: &str, name: &str) -> Self {
        Self::builder(namespace, name).build()
    }

    pub fn builder(namespace: &str, name: &str) -> ClrTypeBuilder {
        ClrTypeBuilder {
            namespace: (!namespace.is_empty()).then(|| namespace.to_string()),
            name: name.to_string(),
            declaring_type: None,
            generic_arguments: Vec::new(),
            base_type: None,
            interfaces: Vec::new(),
            properties: Vec::new(),
            is_interface: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Raw type name, including any generic arity suffix
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.0.namespace.as_deref()
    }

    pub fn declaring_type(&self) -> Option<&ClrType> {
        self.0.declaring_type.as_ref()
    }

    pub fn generic_arguments(&self) -> &[ClrType] {
        &self.0.generic_arguments
    }

    pub fn base_type(&self) -> Option<&ClrType> {
        self.0.base_type.as_ref()
    }

    pub fn interfaces(&self) -> &[ClrType] {
        &self.0.interfaces
    }

    pub fn is_interface(&self) -> bool {
        self.0.is_interface
    }

    /// Check whether a value of type `other` can be assigned to `self`.
    ///
    /// True when the types are identical, or when `self` appears in the base
    /// chain of `other` or among the interfaces it implements (transitively).
    pub fn is_assignable_from(&self, other: &ClrType) -> bool {
        if self == other {
            return true;
        }
        if other.interfaces().iter().any(|i| self.is_assignable_from(i)) {
            return true;
        }
        other
            .base_type()
            .is_some_and(|base| self.is_assignable_from(base))
    }

    /// Property declared directly on this type
    pub fn declared_member(&self, name: &str) -> Option<MemberInfo> {
        self.0
            .properties
            .iter()
            .find(|(property_name, _)| property_name == name)
            .map(|(property_name, property_type)| MemberInfo {
                declaring_type: self.clone(),
                name: property_name.clone(),
                member_type: property_type.clone(),
            })
    }

    /// Property lookup: declared members first, then the base chain, then interfaces
    pub fn member(&self, name: &str) -> Option<MemberInfo> {
        if let Some(member) = self.declared_member(name) {
            return Some(member);
        }
        if let Some(member) = self.base_type().and_then(|base| base.member(name)) {
            return Some(member);
        }
        self.interfaces().iter().find_map(|i| i.member(name))
    }

    /// Canonical display name, namespace-qualified (e.g. `Shop.Order<int>`)
    pub fn display_name(&self) -> String {
        let mut out = String::new();
        self.write_display_name(&mut out, true);
        out
    }

    /// Display name without namespace or outer types (e.g. `Order<int>`)
    pub fn short_display_name(&self) -> String {
        let mut out = String::new();
        self.write_display_name(&mut out, false);
        out
    }

    fn write_display_name(&self, out: &mut String, full_name: bool) {
        if let Some(alias) = self.builtin_alias() {
            out.push_str(alias);
            return;
        }

        if full_name {
            out.push_str(&self.qualified_name());
        } else {
            out.push_str(self.bare_name());
        }

        if !self.0.generic_arguments.is_empty() {
            out.push('<');
            for (i, argument) in self.0.generic_arguments.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                argument.write_display_name(out, full_name);
            }
            out.push('>');
        }
    }

    /// Nested types are joined with `.` rather than the runtime `+`
    fn qualified_name(&self) -> String {
        match (&self.0.declaring_type, &self.0.namespace) {
            (Some(outer), _) => format!("{}.{}", outer.qualified_name(), self.bare_name()),
            (None, Some(namespace)) => format!("{}.{}", namespace, self.bare_name()),
            (None, None) => self.bare_name().to_string(),
        }
    }

    fn bare_name(&self) -> &str {
        match GENERIC_ARITY_SUFFIX.find(&self.0.name) {
            Some(suffix) => &self.0.name[..suffix.start()],
            None => &self.0.name,
        }
    }

    fn builtin_alias(&self) -> Option<&'static str> {
        if self.0.declaring_type.is_some() || self.namespace() != Some("System") {
            return None;
        }
        let alias = match self.0.name.as_str() {
            "Boolean" => "bool",
            "Byte" => "byte",
            "SByte" => "sbyte",
            "Char" => "char",
            "Decimal" => "decimal",
            "Double" => "double",
            "Single" => "float",
            "Int16" => "short",
            "Int32" => "int",
            "Int64" => "long",
            "UInt16" => "ushort",
            "UInt32" => "uint",
            "UInt64" => "ulong",
            "Object" => "object",
            "String" => "string",
            "Void" => "void",
            _ => return None,
        };
        Some(alias)
    }
}

impl PartialEq for ClrType {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for ClrType {}

impl Hash for ClrType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for ClrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClrType({})", self.display_name())
    }
}

impl fmt::Display for ClrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Builder for [`ClrType`] descriptors
pub struct ClrTypeBuilder {
    namespace: Option<String>,
    name: String,
    declaring_type: Option<ClrType>,
    generic_arguments: Vec<ClrType>,
    base_type: Option<ClrType>,
    interfaces: Vec<ClrType>,
    properties: Vec<(String, ClrType)>,
    is_interface: bool,
}

impl ClrTypeBuilder {
    pub fn interface(mut self) -> Self {
        self.is_interface = true;
        self
    }

    /// Nest this type inside `outer`; the namespace is then taken from the outer type
    pub fn nested_in(mut self, outer: &ClrType) -> Self {
        self.declaring_type = Some(outer.clone());
        self
    }

    pub fn generic_argument(mut self, argument: &ClrType) -> Self {
        self.generic_arguments.push(argument.clone());
        self
    }

    pub fn base_type(mut self, base: &ClrType) -> Self {
        self.base_type = Some(base.clone());
        self
    }

    pub fn implements(mut self, interface: &ClrType) -> Self {
        self.interfaces.push(interface.clone());
        self
    }

    pub fn property(mut self, name: &str, property_type: &ClrType) -> Self {
        self.properties.push((name.to_string(), property_type.clone()));
        self
    }

    pub fn build(self) -> ClrType {
        ClrType(Arc::new(ClrTypeInfo {
            id: NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed),
            namespace: self.namespace,
            name: self.name,
            declaring_type: self.declaring_type,
            generic_arguments: self.generic_arguments,
            base_type: self.base_type,
            interfaces: self.interfaces,
            properties: self.properties,
            is_interface: self.is_interface,
        }))
    }
}

/// A property on a [`ClrType`], identified by declaring type, name and type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberInfo {
    declaring_type: ClrType,
    name: String,
    member_type: ClrType,
}

impl MemberInfo {
    pub fn new(declaring_type: &ClrType, name: &str, member_type: &ClrType) -> Self {
        MemberInfo {
            declaring_type: declaring_type.clone(),
            name: name.to_string(),
            member_type: member_type.clone(),
        }
    }

    pub fn declaring_type(&self) -> &ClrType {
        &self.declaring_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn member_type(&self) -> &ClrType {
        &self.member_type
    }

    /// Map a member declared on an implementing type onto the matching
    /// member of `interface`.
    ///
    /// Returns the member unchanged when it is already declared on the
    /// interface, when the declaring type does not implement it, or when the
    /// interface has no member of that name.
    pub fn on_interface(&self, interface: &ClrType) -> MemberInfo {
        if &self.declaring_type == interface || !interface.is_assignable_from(&self.declaring_type)
        {
            return self.clone();
        }
        interface
            .declared_member(&self.name)
            .unwrap_or_else(|| self.clone())
    }
}

impl fmt::Display for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type.short_display_name(), self.name)
    }
}
