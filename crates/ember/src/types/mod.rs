//! Payload types stored in heap objects.
//!
//! Each payload knows its own child-reference shape through a `collect_refs` method;
//! [`HeapData`](crate::heap::HeapData) dispatches to them with an exhaustive match.
pub mod bytes;
pub mod class;
pub mod dict;
pub mod list;
pub mod mapping_proxy;
pub mod module;
pub mod packed;
pub mod property;
pub mod range;
pub mod slice;
pub mod star;
pub mod str;
pub mod tuple;
pub mod r#type;

pub use bytes::Bytes;
pub use class::{BoundMethod, Super};
pub use dict::Dict;
pub use list::List;
pub use mapping_proxy::MappingProxy;
pub use module::Module;
pub use packed::{OpaquePtr, Packed};
pub use property::Property;
pub use range::Range;
pub use slice::Slice;
pub use star::StarWrapper;
pub use str::Str;
pub use tuple::Tuple;
pub use r#type::{BuiltinType, Type, TypeObject};
