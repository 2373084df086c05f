//! Model descriptors: the ordered field list the walker traverses.
//!
//! Rust models implement [`Describe`]; nested model types are referenced
//! lazily (`TypeRef::Lazy`) so a self-referential model describes itself in
//! finite space. Descriptor tables loaded at runtime use `TypeRef::Named` and
//! are looked up through [`Resolve`].
use std::fmt;

use crate::error::{Error, Result};
use crate::synth::coerce::Primitive;

// ------------------------------- Types ------------------------------------ //

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// Empty for anonymous types; the caller's fallback name is used then.
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub rename: Option<String>,
    pub kind: Kind,
    /// Raw annotation string, see `synth::annotation`.
    pub meta: String,
    pub skip: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Primitive(Primitive),
    Object(TypeRef),
    Array(Box<Kind>),
    /// Transparent indirection (`Option`, `Box`, references...).
    Pointer(Box<Kind>),
}

#[derive(Clone)]
pub enum TypeRef {
    Lazy(fn() -> TypeDescriptor),
    Named(String),
}

pub trait Describe {
    fn describe() -> TypeDescriptor;
}

/// Looks up descriptors for `TypeRef::Named`.
pub trait Resolve: Send + Sync {
    fn resolve(&self, name: &str) -> Option<TypeDescriptor>;
}

/// Resolver for models that only use `TypeRef::Lazy`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTable;

impl Resolve for NoTable {
    fn resolve(&self, _name: &str) -> Option<TypeDescriptor> { None }
}

// --------------------------- Implementation ------------------------------- //

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new() }
    }

    pub fn anonymous() -> Self { Self::new("") }

    /// Append a field; declaration order is position in `fields`.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn is_anonymous(&self) -> bool { self.name.is_empty() }
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            rename: None,
            kind,
            meta: String::new(),
            skip: false,
        }
    }

    pub fn rename(mut self, key: impl Into<String>) -> Self {
        self.rename = Some(key.into());
        self
    }

    pub fn meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = meta.into();
        self
    }

    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Serialized key.
    pub fn key(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }
}

impl Kind {
    pub fn primitive(p: Primitive) -> Self { Self::Primitive(p) }

    pub fn object<T: Describe>() -> Self { Self::Object(TypeRef::Lazy(T::describe)) }

    pub fn named(name: impl Into<String>) -> Self { Self::Object(TypeRef::Named(name.into())) }

    pub fn array(of: Kind) -> Self { Self::Array(Box::new(of)) }

    pub fn pointer(to: Kind) -> Self { Self::Pointer(Box::new(to)) }

    /// Strip every pointer layer.
    pub fn deref(&self) -> &Kind {
        let mut k = self;
        while let Kind::Pointer(inner) = k {
            k = inner;
        }
        k
    }

    /// Parse a Rust-style type expression such as `Vec<Option<Node>>`.
    pub fn parse(expr: &str) -> Result<Self> {
        let src = expr.trim();
        if src.is_empty() {
            return Err(Error::type_expr(expr, "empty"));
        }
        if let Some(rest) = src.strip_prefix('&') {
            let rest = rest.trim_start();
            // `&'a T`, `&'static mut T`
            let rest = match rest.strip_prefix('\'') {
                Some(lifetime) => lifetime.split_once(char::is_whitespace)
                    .map(|(_, ty)| ty.trim_start())
                    .ok_or_else(|| Error::type_expr(expr, "expected a type after the lifetime"))?,
                None => rest,
            };
            let rest = rest.strip_prefix("mut ").unwrap_or(rest);
            return Ok(Kind::pointer(Kind::parse(rest)?));
        }
        if let Some(inner) = src.strip_prefix('[') {
            let inner = inner.strip_suffix(']')
                .ok_or_else(|| Error::type_expr(expr, "unclosed `[`"))?;
            // `[T; N]` is still a list of T
            let elem = split_top_level(inner, ';').into_iter().next().unwrap_or(inner);
            return Ok(Kind::array(Kind::parse(elem)?));
        }
        let (head, args) = match src.find('<') {
            None => (src, None),
            Some(open) => {
                let args = src[open + 1..].strip_suffix('>')
                    .ok_or_else(|| Error::type_expr(expr, "unclosed `<`"))?;
                (src[..open].trim(), Some(args))
            }
        };
        if head.is_empty() || !head.chars().all(|c| c.is_alphanumeric() || c == '_' || c == ':') {
            return Err(Error::type_expr(expr, "expected a type name"));
        }
        let short = head.rsplit("::").next().unwrap_or(head);
        match (short, args) {
            ("Vec" | "VecDeque" | "LinkedList" | "HashSet" | "BTreeSet", Some(a)) => {
                Ok(Kind::array(Kind::parse(single_arg(expr, a)?)?))
            }
            ("Option" | "Box" | "Rc" | "Arc" | "Cow", Some(a)) => {
                Ok(Kind::pointer(Kind::parse(single_arg(expr, a)?)?))
            }
            _ => match Primitive::from_name(short) {
                Some(p) => Ok(Kind::Primitive(p)),
                None => Ok(Kind::named(src)),
            },
        }
    }
}

/// The one type argument of a generic; lifetimes (`Cow<'a, str>`) don't count.
fn single_arg<'a>(expr: &str, args: &'a str) -> Result<&'a str> {
    let parts = split_top_level(args, ',')
        .into_iter()
        .filter(|p| !p.trim_start().starts_with('\''))
        .collect::<Vec<_>>();
    match parts.as_slice() {
        [one] if !one.trim().is_empty() => Ok(one.trim()),
        _ => Err(Error::type_expr(expr, "expected exactly one type argument")),
    }
}

/// Split on `sep` outside of `<>`/`[]` nesting.
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '<' | '[' => depth += 1,
            '>' | ']' => depth -= 1,
            c if c == sep && depth == 0 => {
                out.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    out.push(&s[start..]);
    out
}

impl TypeRef {
    pub fn resolve(&self, table: &dyn Resolve) -> Option<TypeDescriptor> {
        match self {
            TypeRef::Lazy(describe) => Some(describe()),
            TypeRef::Named(name) => table.resolve(name),
        }
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // calling the thunk here could recurse forever on cyclic models
            TypeRef::Lazy(_) => f.write_str("Lazy(..)"),
            TypeRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeRef::Lazy(a), TypeRef::Lazy(b)) => std::ptr::fn_addr_eq(*a, *b),
            (TypeRef::Named(a), TypeRef::Named(b)) => a == b,
            _ => false,
        }
    }
}
