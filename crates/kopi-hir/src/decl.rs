use kopi_core::{TextRange, TokenSpan};
use kopi_types::{ClassKind, TypeId};
use serde::Serialize;

use crate::{Block, Local, ResolvedIdent, TypeRef};

/// Tokens captured during declaration parsing, parsed in the second pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deferred<T> {
    pub tokens: TokenSpan,
    pub parsed: Option<T>,
}

impl<T> Deferred<T> {
    pub fn new(tokens: TokenSpan) -> Self {
        Self {
            tokens,
            parsed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilationUnit {
    pub uri: String,
    pub package: Option<PackageDecl>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TypeDecl>,
}

impl CompilationUnit {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            package: None,
            imports: Vec::new(),
            types: Vec::new(),
        }
    }

    /// Depth-first iteration over every declared type, nested ones included.
    pub fn all_types(&self) -> Vec<&TypeDecl> {
        fn walk<'a>(ty: &'a TypeDecl, out: &mut Vec<&'a TypeDecl>) {
            out.push(ty);
            for member in &ty.members {
                if let Member::Type(nested) = member {
                    walk(nested, out);
                }
            }
        }
        let mut out = Vec::new();
        for ty in &self.types {
            walk(ty, &mut out);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDecl {
    pub name: String,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportDecl {
    pub is_static: bool,
    /// Dotted name without the trailing `.*`.
    pub name: String,
    pub wildcard: bool,
    pub range: TextRange,
    /// Types the import made visible (the named type, or a package's types).
    pub resolved: Vec<TypeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub ty: TypeRef,
    pub args: Vec<ResolvedIdent>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeParamDecl {
    pub name: String,
    pub name_range: TextRange,
    pub bounds: Vec<TypeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDecl {
    pub id: TypeId,
    pub kind: ClassKind,
    /// Empty for anonymous classes.
    pub name: String,
    pub name_range: TextRange,
    pub modifiers: Vec<String>,
    pub annotations: Vec<Annotation>,
    pub docs: Option<String>,
    pub type_params: Vec<TypeParamDecl>,
    pub extends: Vec<TypeRef>,
    pub implements: Vec<TypeRef>,
    pub enum_constants: Vec<EnumConstantDecl>,
    pub members: Vec<Member>,
    pub range: TextRange,
}

impl TypeDecl {
    pub fn new(id: TypeId, kind: ClassKind, name: impl Into<String>, name_range: TextRange) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            name_range,
            modifiers: Vec::new(),
            annotations: Vec::new(),
            docs: None,
            type_params: Vec::new(),
            extends: Vec::new(),
            implements: Vec::new(),
            enum_constants: Vec::new(),
            members: Vec::new(),
            range: name_range,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Field(f) => Some(f),
            _ => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Method(m) => Some(m),
            _ => None,
        })
    }

    pub fn constructors(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Constructor(c) => Some(c),
            _ => None,
        })
    }

    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods().find(|m| m.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Member {
    Field(FieldDecl),
    Method(MethodDecl),
    Constructor(MethodDecl),
    Initializer(InitializerDecl),
    Type(TypeDecl),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDecl {
    pub modifiers: Vec<String>,
    pub annotations: Vec<Annotation>,
    pub docs: Option<String>,
    pub ty: TypeRef,
    pub name: String,
    pub name_range: TextRange,
    pub extra_dims: u32,
    pub init: Option<Deferred<ResolvedIdent>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDecl {
    pub modifiers: Vec<String>,
    pub annotations: Vec<Annotation>,
    pub docs: Option<String>,
    pub type_params: Vec<TypeParamDecl>,
    /// `None` for constructors.
    pub return_type: Option<TypeRef>,
    pub name: String,
    pub name_range: TextRange,
    pub params: Vec<Local>,
    pub is_varargs: bool,
    pub throws: Vec<TypeRef>,
    /// `None` for abstract and native methods.
    pub body: Option<Deferred<Block>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitializerDecl {
    pub is_static: bool,
    pub body: Deferred<Block>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumConstantDecl {
    pub docs: Option<String>,
    pub annotations: Vec<Annotation>,
    pub name: String,
    pub name_range: TextRange,
    pub args: Option<Deferred<Vec<ResolvedIdent>>>,
    /// Class body, declared as an anonymous subclass of the enum.
    pub body: Option<Deferred<TypeDecl>>,
}
