//! Java type model shared by the parser and resolver.
//!
//! Classes live in a [`TypeStore`] arena addressed by [`TypeId`]. Generic
//! specializations (`List<String>`) are separate, memoized entries that point
//! back at their declaration, so member lookups can substitute type arguments
//! on the fly.

mod jdk;
mod store;
mod ty;

pub use store::{class_signature, TypeStore};
pub use ty::{
    ClassDef, ClassKind, FieldDef, GenericInstance, MethodDef, ParamDef, PrimitiveType, Type,
    TypeId, TypeOrigin, TypeParamDef, WildcardBound,
};
