//! Runtime type identifiers and type objects.

use strum::{EnumCount, FromRepr, IntoStaticStr, VariantArray};

use crate::intern::StringId;

/// Runtime type identifier stored in every object header.
///
/// Builtin kinds occupy the fixed ids of [`BuiltinType`]; user classes and registered
/// host classes receive fresh ids from the heap's type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Type(u16);

/// The builtin types, in type-id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr, IntoStaticStr, EnumCount, VariantArray)]
#[repr(u16)]
#[strum(serialize_all = "snake_case")]
pub enum BuiltinType {
    Object,
    Type,
    Int,
    Float,
    Bool,
    Str,
    List,
    Tuple,
    Slice,
    Range,
    Module,
    Function,
    #[strum(serialize = "native_function")]
    NativeFunc,
    #[strum(serialize = "method")]
    BoundMethod,
    Super,
    Bytes,
    #[strum(serialize = "mappingproxy")]
    MappingProxy,
    Dict,
    Property,
    #[strum(serialize = "star_wrapper")]
    StarWrapper,
    #[strum(serialize = "NoneType")]
    NoneType,
    #[strum(serialize = "void_p")]
    Pointer,
    #[strum(serialize = "struct")]
    Struct,
}

impl Type {
    pub const OBJECT: Self = Self::builtin(BuiltinType::Object);
    pub const TYPE: Self = Self::builtin(BuiltinType::Type);
    /// Reserved id tested without touching the heap by [`Heap::is_type`](crate::Heap::is_type).
    pub const INT: Self = Self::builtin(BuiltinType::Int);
    /// Reserved id tested without touching the heap by [`Heap::is_type`](crate::Heap::is_type).
    pub const FLOAT: Self = Self::builtin(BuiltinType::Float);
    pub const BOOL: Self = Self::builtin(BuiltinType::Bool);
    pub const STR: Self = Self::builtin(BuiltinType::Str);
    pub const LIST: Self = Self::builtin(BuiltinType::List);
    pub const TUPLE: Self = Self::builtin(BuiltinType::Tuple);
    pub const SLICE: Self = Self::builtin(BuiltinType::Slice);
    pub const RANGE: Self = Self::builtin(BuiltinType::Range);
    pub const MODULE: Self = Self::builtin(BuiltinType::Module);
    pub const FUNCTION: Self = Self::builtin(BuiltinType::Function);
    pub const NATIVE_FUNC: Self = Self::builtin(BuiltinType::NativeFunc);
    pub const BOUND_METHOD: Self = Self::builtin(BuiltinType::BoundMethod);
    pub const SUPER: Self = Self::builtin(BuiltinType::Super);
    pub const BYTES: Self = Self::builtin(BuiltinType::Bytes);
    pub const MAPPING_PROXY: Self = Self::builtin(BuiltinType::MappingProxy);
    pub const DICT: Self = Self::builtin(BuiltinType::Dict);
    pub const PROPERTY: Self = Self::builtin(BuiltinType::Property);
    pub const STAR_WRAPPER: Self = Self::builtin(BuiltinType::StarWrapper);
    pub const NONE_TYPE: Self = Self::builtin(BuiltinType::NoneType);
    pub const POINTER: Self = Self::builtin(BuiltinType::Pointer);
    pub const STRUCT: Self = Self::builtin(BuiltinType::Struct);

    const fn builtin(b: BuiltinType) -> Self {
        Self(b as u16)
    }

    /// Number of ids reserved for builtins; the first user type gets this id.
    pub const FIRST_USER: u16 = BuiltinType::COUNT as u16;

    pub(crate) fn from_index(index: u16) -> Self {
        Self(index)
    }

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// Returns the builtin this id names, or `None` for user and host classes.
    #[must_use]
    pub fn as_builtin(self) -> Option<BuiltinType> {
        BuiltinType::from_repr(self.0)
    }
}

impl From<BuiltinType> for Type {
    fn from(b: BuiltinType) -> Self {
        Self::builtin(b)
    }
}

/// Payload of a type object.
///
/// The namespace lives in the object header's attribute dict, so the payload only
/// records identity: the name, the id it defines, and its base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeObject {
    name: StringId,
    defines: Type,
    base: Option<Type>,
}

impl TypeObject {
    #[must_use]
    pub fn new(name: StringId, defines: Type, base: Option<Type>) -> Self {
        Self { name, defines, base }
    }

    #[must_use]
    pub fn name(&self) -> StringId {
        self.name
    }

    /// The runtime type id instances of this type carry.
    #[must_use]
    pub fn defines(&self) -> Type {
        self.defines
    }

    #[must_use]
    pub fn base(&self) -> Option<Type> {
        self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_are_reserved() {
        assert_eq!(Type::INT.index(), 2);
        assert_eq!(Type::FLOAT.index(), 3);
    }

    #[test]
    fn builtin_names() {
        let name: &'static str = BuiltinType::MappingProxy.into();
        assert_eq!(name, "mappingproxy");
        let name: &'static str = BuiltinType::List.into();
        assert_eq!(name, "list");
        assert_eq!(Type::from_index(Type::FIRST_USER).as_builtin(), None);
    }
}
