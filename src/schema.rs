//! schema context
//!
//! indexes a parsed schema so the compiler and emitters can look up type
//! definitions, composite fields, and root operation types by name.

use crate::document::OperationKind;
use crate::error::{Error, Result};
use graphql_parser::schema::{
    parse_schema, Definition, Document, Field, TypeDefinition, TypeExtension,
};
use std::collections::BTreeMap;

/// graphql built-in scalar names
pub const BUILTIN_SCALARS: [&str; 5] = ["ID", "String", "Int", "Float", "Boolean"];

/// parse schema definition language text
pub fn parse(source: &str) -> Result<Document<'_, String>> {
    parse_schema::<String>(source).map_err(|err| Error::SchemaParse(err.to_string()))
}

/// lookup tables over a parsed schema document
pub struct SchemaContext<'a> {
    document: &'a Document<'a, String>,
    types: BTreeMap<&'a str, &'a TypeDefinition<'a, String>>,
    extension_fields: BTreeMap<&'a str, Vec<&'a Field<'a, String>>>,
    query_type: String,
    mutation_type: String,
    subscription_type: String,
}

/// kind of a composite (selectable) type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeKind {
    Object,
    Interface,
    Union,
}

/// a type a selection set can be compiled against
#[derive(Debug, Clone)]
pub struct Composite<'a> {
    name: &'a str,
    kind: CompositeKind,
    fields: Vec<&'a Field<'a, String>>,
}

impl<'a> Composite<'a> {
    /// schema type name
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// object, interface, or union
    pub fn kind(&self) -> CompositeKind {
        self.kind
    }

    /// field definition by name; unions have none
    pub fn field(&self, name: &str) -> Option<&'a Field<'a, String>> {
        self.fields.iter().copied().find(|field| field.name == name)
    }

    /// declared fields followed by extension fields
    pub fn fields(&self) -> &[&'a Field<'a, String>] {
        &self.fields
    }
}

impl<'a> SchemaContext<'a> {
    pub fn new(document: &'a Document<'a, String>) -> Self {
        let mut types = BTreeMap::new();
        let mut extension_fields: BTreeMap<&'a str, Vec<&'a Field<'a, String>>> = BTreeMap::new();
        let mut query_type = "Query".to_string();
        let mut mutation_type = "Mutation".to_string();
        let mut subscription_type = "Subscription".to_string();

        for def in &document.definitions {
            match def {
                Definition::TypeDefinition(ty) => {
                    types.insert(type_definition_name(ty), ty);
                }
                Definition::TypeExtension(TypeExtension::Object(ext)) => {
                    extension_fields
                        .entry(ext.name.as_str())
                        .or_default()
                        .extend(ext.fields.iter());
                }
                Definition::TypeExtension(TypeExtension::Interface(ext)) => {
                    extension_fields
                        .entry(ext.name.as_str())
                        .or_default()
                        .extend(ext.fields.iter());
                }
                Definition::SchemaDefinition(schema) => {
                    if let Some(query) = &schema.query {
                        query_type = query.clone();
                    }
                    if let Some(mutation) = &schema.mutation {
                        mutation_type = mutation.clone();
                    }
                    if let Some(subscription) = &schema.subscription {
                        subscription_type = subscription.clone();
                    }
                }
                _ => {}
            }
        }

        Self {
            document,
            types,
            extension_fields,
            query_type,
            mutation_type,
            subscription_type,
        }
    }

    /// type definitions in document order
    pub fn type_definitions(&self) -> impl Iterator<Item = &'a TypeDefinition<'a, String>> {
        self.document.definitions.iter().filter_map(|def| match def {
            Definition::TypeDefinition(ty) => Some(ty),
            _ => None,
        })
    }

    /// type definition by name
    pub fn type_definition(&self, name: &str) -> Option<&'a TypeDefinition<'a, String>> {
        self.types.get(name).copied()
    }

    /// true for built-in and declared scalars
    pub fn is_scalar(&self, name: &str) -> bool {
        BUILTIN_SCALARS.contains(&name)
            || matches!(self.type_definition(name), Some(TypeDefinition::Scalar(_)))
    }

    /// object, interface, or union type by name
    pub fn composite(&self, name: &str) -> Option<Composite<'a>> {
        let extensions = self.extension_fields.get(name);
        let with_extensions = |fields: &'a [Field<'a, String>]| {
            fields
                .iter()
                .chain(extensions.into_iter().flatten().copied())
                .collect::<Vec<_>>()
        };

        match self.type_definition(name)? {
            TypeDefinition::Object(obj) => Some(Composite {
                name: obj.name.as_str(),
                kind: CompositeKind::Object,
                fields: with_extensions(obj.fields.as_slice()),
            }),
            TypeDefinition::Interface(iface) => Some(Composite {
                name: iface.name.as_str(),
                kind: CompositeKind::Interface,
                fields: with_extensions(iface.fields.as_slice()),
            }),
            TypeDefinition::Union(union_ty) => Some(Composite {
                name: union_ty.name.as_str(),
                kind: CompositeKind::Union,
                fields: Vec::new(),
            }),
            _ => None,
        }
    }

    /// root type name for an operation kind
    pub fn root_type_name(&self, kind: OperationKind) -> &str {
        match kind {
            OperationKind::Query => &self.query_type,
            OperationKind::Mutation => &self.mutation_type,
            OperationKind::Subscription => &self.subscription_type,
        }
    }

    /// root composite for an operation kind
    pub fn root_type(&self, kind: OperationKind) -> Result<Composite<'a>> {
        let name = self.root_type_name(kind);
        self.composite(name)
            .ok_or_else(|| Error::TypeNotFound(name.to_string()))
    }
}

/// name of any type definition
pub fn type_definition_name<'a>(ty: &'a TypeDefinition<'_, String>) -> &'a str {
    match ty {
        TypeDefinition::Scalar(t) => t.name.as_str(),
        TypeDefinition::Object(t) => t.name.as_str(),
        TypeDefinition::Interface(t) => t.name.as_str(),
        TypeDefinition::Union(t) => t.name.as_str(),
        TypeDefinition::Enum(t) => t.name.as_str(),
        TypeDefinition::InputObject(t) => t.name.as_str(),
    }
}
