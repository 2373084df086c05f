//! Descriptor tables: model descriptions loaded from JSON instead of derived
//! from Rust types.
//!
//! ```json
//! {"types": [
//!   {"name": "User", "fields": [
//!     {"name": "ID", "rename": "id", "type": "i64", "meta": "required:true"},
//!     {"name": "friends", "type": "Vec<User>"}
//!   ]}
//! ]}
//! ```
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::descriptor::{FieldDescriptor, Kind, Resolve, TypeDescriptor, TypeRef};
use crate::error::{Error, Result};
use crate::path_de;

// ------------------------------ File format ------------------------------- //

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableFile {
    types: Vec<TypeEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeEntry {
    name: String,
    #[serde(default)]
    fields: Vec<FieldEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldEntry {
    name: String,
    #[serde(default)]
    rename: Option<String>,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    meta: String,
    #[serde(default)]
    skip: bool,
}

// -------------------------------- Table ----------------------------------- //

/// Named descriptors in load order.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    types: IndexMap<String, TypeDescriptor>,
}

impl TypeTable {
    pub fn new() -> Self { Self::default() }

    pub fn from_json_str(src: &str) -> Result<Self> {
        let file: TableFile = path_de::from_str_with_path(src)?;
        let mut table = Self::new();
        for (ti, entry) in file.types.into_iter().enumerate() {
            let mut ty = TypeDescriptor::new(entry.name);
            for (fi, field) in entry.fields.into_iter().enumerate() {
                // type expressions are decoded after serde, so re-attach the path
                let kind = Kind::parse(&field.ty).map_err(|e| Error::Decode {
                    path: format!("types[{ti}].fields[{fi}].type"),
                    message: e.to_string(),
                })?;
                let mut fd = FieldDescriptor::new(field.name, kind).meta(field.meta);
                if let Some(rename) = field.rename {
                    fd = fd.rename(rename);
                }
                if field.skip {
                    fd = fd.skip();
                }
                ty = ty.field(fd);
            }
            table.insert(ty)?;
        }
        Ok(table)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path)
            .map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
        Self::from_json_str(&src)
    }

    pub fn from_descriptors(types: impl IntoIterator<Item = TypeDescriptor>) -> Result<Self> {
        let mut table = Self::new();
        for ty in types {
            table.insert(ty)?;
        }
        Ok(table)
    }

    /// Anonymous descriptors cannot be looked up, so they are rejected too.
    pub fn insert(&mut self, ty: TypeDescriptor) -> Result<()> {
        if ty.is_anonymous() {
            return Err(Error::Decode {
                path: format!("types[{}].name", self.types.len()),
                message: "type name must not be empty".into(),
            });
        }
        if self.types.contains_key(&ty.name) {
            return Err(Error::DuplicateType(ty.name));
        }
        self.types.insert(ty.name.clone(), ty);
        Ok(())
    }

    /// Fold another table in; a name present in both is an error.
    pub fn merge(&mut self, other: TypeTable) -> Result<()> {
        for (_, ty) in other.types {
            self.insert(ty)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> { self.types.get(name) }

    pub fn require(&self, name: &str) -> Result<&TypeDescriptor> {
        self.types.get(name).ok_or_else(|| Error::UnknownModel(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> { self.types.keys().map(String::as_str) }

    pub fn descriptors(&self) -> impl Iterator<Item = &TypeDescriptor> { self.types.values() }

    pub fn len(&self) -> usize { self.types.len() }

    pub fn is_empty(&self) -> bool { self.types.is_empty() }

    /// Named references with no entry, first-seen order, no duplicates.
    pub fn unresolved(&self) -> Vec<String> {
        let mut out = Vec::new();
        for ty in self.types.values() {
            for field in &ty.fields {
                self.collect_missing(&field.kind, &mut out);
            }
        }
        out
    }

    fn collect_missing(&self, kind: &Kind, out: &mut Vec<String>) {
        match kind {
            Kind::Primitive(_) => {}
            Kind::Array(inner) | Kind::Pointer(inner) => self.collect_missing(inner, out),
            Kind::Object(TypeRef::Named(name)) => {
                if !self.types.contains_key(name) && !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Kind::Object(TypeRef::Lazy(_)) => {}
        }
    }
}

impl Resolve for TypeTable {
    fn resolve(&self, name: &str) -> Option<TypeDescriptor> {
        self.types.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::Primitive;

    const USERS: &str = r#"{
        "types": [
            {"name": "User", "fields": [
                {"name": "ID", "rename": "id", "type": "i64", "meta": "required:true;example:7"},
                {"name": "password", "type": "String", "skip": true},
                {"name": "friends", "type": "Vec<User>"},
                {"name": "address", "type": "Option<Address>"}
            ]},
            {"name": "Address", "fields": [
                {"name": "city", "type": "String"},
                {"name": "geo", "type": "Geo"}
            ]}
        ]
    }"#;

    #[test]
    fn loads_fields_in_order() {
        let t = TypeTable::from_json_str(USERS).unwrap();
        assert_eq!(t.names().collect::<Vec<_>>(), vec!["User", "Address"]);
        let user = t.get("User").unwrap();
        assert_eq!(user.fields[0].key(), "id");
        assert_eq!(user.fields[0].kind, Kind::primitive(Primitive::I64));
        assert!(user.fields[1].skip);
        assert_eq!(user.fields[2].kind, Kind::array(Kind::named("User")));
        assert_eq!(user.fields[3].key(), "address");
    }

    #[test]
    fn reports_unresolved_references() {
        let t = TypeTable::from_json_str(USERS).unwrap();
        assert_eq!(t.unresolved(), vec!["Geo".to_string()]);
        assert!(t.resolve("Geo").is_none());
        assert!(matches!(t.require("Geo"), Err(Error::UnknownModel(n)) if n == "Geo"));
        assert_eq!(t.resolve("Address").unwrap().fields.len(), 2);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let src = r#"{"types": [{"name": "A"}, {"name": "A"}]}"#;
        assert!(matches!(TypeTable::from_json_str(src), Err(Error::DuplicateType(n)) if n == "A"));

        let mut t = TypeTable::from_json_str(r#"{"types": [{"name": "A"}]}"#).unwrap();
        let other = TypeTable::from_json_str(r#"{"types": [{"name": "A"}]}"#).unwrap();
        assert!(t.merge(other).is_err());
    }

    #[test]
    fn bad_type_expression_points_at_the_field() {
        let src = r#"{"types": [{"name": "A", "fields": [
            {"name": "ok", "type": "i32"},
            {"name": "bad", "type": "Vec<i32"}
        ]}]}"#;
        match TypeTable::from_json_str(src) {
            Err(Error::Decode { path, .. }) => assert_eq!(path, "types[0].fields[1].type"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unknown_keys_are_decode_errors_with_a_path() {
        let src = r#"{"types": [{"name": "A", "fields": [{"name": "x", "type": "i32", "tag": 1}]}]}"#;
        match TypeTable::from_json_str(src) {
            Err(Error::Decode { path, .. }) => assert!(path.starts_with("types[0].fields[0]")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn anonymous_descriptors_are_rejected() {
        assert!(TypeTable::from_descriptors([TypeDescriptor::anonymous()]).is_err());
    }
}
