use serde::Serialize;

/// Index of a class entry inside a [`crate::TypeStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "boolean" => PrimitiveType::Boolean,
            "byte" => PrimitiveType::Byte,
            "char" => PrimitiveType::Char,
            "short" => PrimitiveType::Short,
            "int" => PrimitiveType::Int,
            "long" => PrimitiveType::Long,
            "float" => PrimitiveType::Float,
            "double" => PrimitiveType::Double,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    pub fn descriptor(self) -> char {
        match self {
            PrimitiveType::Boolean => 'Z',
            PrimitiveType::Byte => 'B',
            PrimitiveType::Char => 'C',
            PrimitiveType::Short => 'S',
            PrimitiveType::Int => 'I',
            PrimitiveType::Long => 'J',
            PrimitiveType::Float => 'F',
            PrimitiveType::Double => 'D',
        }
    }

    /// Signature of the wrapper class used for `.class` literals and boxing.
    pub fn boxed_signature(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "java/lang/Boolean",
            PrimitiveType::Byte => "java/lang/Byte",
            PrimitiveType::Char => "java/lang/Character",
            PrimitiveType::Short => "java/lang/Short",
            PrimitiveType::Int => "java/lang/Integer",
            PrimitiveType::Long => "java/lang/Long",
            PrimitiveType::Float => "java/lang/Float",
            PrimitiveType::Double => "java/lang/Double",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<Type>),
    Super(Box<Type>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Type {
    Void,
    Primitive(PrimitiveType),
    /// A class, interface, enum or annotation; specializations have their own id.
    Class(TypeId),
    Array(Box<Type>),
    TypeVar(String),
    Wildcard(WildcardBound),
    Null,
    /// Stand-in for a type that could not be resolved. Carries the source label.
    Unknown(String),
}

impl Type {
    pub fn unknown(label: impl Into<String>) -> Self {
        Type::Unknown(label.into())
    }

    /// Wraps `self` in `dims` array levels.
    pub fn array_of(self, dims: u32) -> Type {
        let mut ty = self;
        for _ in 0..dims {
            ty = Type::Array(Box::new(ty));
        }
        ty
    }

    #[inline]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown(_))
    }

    #[inline]
    pub fn class_id(&self) -> Option<TypeId> {
        match self {
            Type::Class(id) => Some(*id),
            _ => None,
        }
    }

    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn array_dims(&self) -> u32 {
        let mut dims = 0;
        let mut ty = self;
        while let Type::Array(elem) = ty {
            dims += 1;
            ty = elem;
        }
        dims
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

impl ClassKind {
    /// Maps a declaration keyword (`class`, `interface`, `enum`, `@interface`).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "class" => ClassKind::Class,
            "interface" => ClassKind::Interface,
            "enum" => ClassKind::Enum,
            "@interface" => ClassKind::Annotation,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
            ClassKind::Enum => "enum",
            ClassKind::Annotation => "@interface",
        }
    }

    #[inline]
    pub fn is_interface_like(self) -> bool {
        matches!(self, ClassKind::Interface | ClassKind::Annotation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeParamDef {
    pub name: String,
    pub bounds: Vec<Type>,
}

impl TypeParamDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: Type,
    pub is_static: bool,
    pub modifiers: Vec<String>,
    pub docs: Option<String>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            is_static: false,
            modifiers: Vec::new(),
            docs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamDef {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDef {
    pub name: String,
    pub type_params: Vec<TypeParamDef>,
    pub params: Vec<ParamDef>,
    pub return_type: Type,
    pub is_static: bool,
    pub is_varargs: bool,
    pub is_abstract: bool,
    pub modifiers: Vec<String>,
    pub docs: Option<String>,
}

impl MethodDef {
    pub fn new(name: impl Into<String>, params: Vec<ParamDef>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            type_params: Vec::new(),
            params,
            return_type,
            is_static: false,
            is_varargs: false,
            is_abstract: false,
            modifiers: Vec::new(),
            docs: None,
        }
    }
}

/// A specialization's link back to its generic declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenericInstance {
    pub base: TypeId,
    pub args: Vec<Type>,
    /// Created from a diamond (`<>`); `args` is empty.
    pub inferred: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypeOrigin {
    Builtin,
    Source { uri: String },
    /// Specializations created on demand.
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDef {
    /// Structural key: `java/util/Map$Entry`, `java/util/List<Ljava/lang/String;>`.
    pub signature: String,
    /// Dotted package name, empty for the default package.
    pub package: String,
    /// Simple name; empty for anonymous classes.
    pub name: String,
    pub outer: Option<TypeId>,
    pub kind: ClassKind,
    pub modifiers: Vec<String>,
    pub docs: Option<String>,
    pub type_params: Vec<TypeParamDef>,
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<MethodDef>,
    pub constructors: Vec<MethodDef>,
    pub enum_constants: Vec<String>,
    pub generic: Option<GenericInstance>,
    pub origin: TypeOrigin,
    /// Set while the owning document is being re-parsed; stale entries are
    /// invisible to lookups until re-declared.
    pub stale: bool,
}

impl ClassDef {
    pub fn new(signature: impl Into<String>, package: &str, name: &str, kind: ClassKind) -> Self {
        Self {
            signature: signature.into(),
            package: package.to_string(),
            name: name.to_string(),
            outer: None,
            kind,
            modifiers: Vec::new(),
            docs: None,
            type_params: Vec::new(),
            super_class: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            enum_constants: Vec::new(),
            generic: None,
            origin: TypeOrigin::Builtin,
            stale: false,
        }
    }

    #[inline]
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }

    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    /// Clears everything a source declaration contributes, keeping identity.
    pub(crate) fn reset_members(&mut self) {
        self.modifiers.clear();
        self.docs = None;
        self.type_params.clear();
        self.super_class = None;
        self.interfaces.clear();
        self.fields.clear();
        self.methods.clear();
        self.constructors.clear();
        self.enum_constants.clear();
    }
}
