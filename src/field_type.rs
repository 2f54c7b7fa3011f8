//! field types
//!
//! [`TypeResolver`] turns a schema type reference into a [`FieldType`];
//! [`FieldType::format`] renders it as a python annotation.

use crate::error::{Error, Result};
use crate::naming::{ConvertOptions, NameConverter};
use crate::scalars::is_value_type;
use crate::schema::SchemaContext;
use graphql_parser::schema::{Type, TypeDefinition};
use std::collections::BTreeMap;

/// innermost named type of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseType {
    /// rendered python name
    pub name: String,
    /// non-null at the innermost level
    pub is_required: bool,
    /// needs an explicit `Optional[...]` when nullable
    pub is_value_type: bool,
}

/// one list wrapping level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListLayer {
    pub required: bool,
}

/// resolved shape of a field, argument, or variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    pub base: BaseType,
    /// outer to inner; empty when the field is not a list
    pub list_layers: Vec<ListLayer>,
}

impl FieldType {
    /// scalar-like field with no list wrapping
    pub fn named(name: impl Into<String>, is_required: bool, is_value_type: bool) -> Self {
        Self {
            base: BaseType {
                name: name.into(),
                is_required,
                is_value_type,
            },
            list_layers: Vec::new(),
        }
    }

    /// same list shape and nullability with a different, reference-typed base
    pub fn with_base_name(&self, name: impl Into<String>) -> Self {
        Self {
            base: BaseType {
                name: name.into(),
                is_required: self.base.is_required,
                is_value_type: false,
            },
            list_layers: self.list_layers.clone(),
        }
    }

    /// nullability of the outermost wrapper
    pub fn is_outer_required(&self) -> bool {
        match self.list_layers.first() {
            Some(layer) => layer.required,
            None => self.base.is_required,
        }
    }

    /// render with `wrapper[...]` around each list layer
    pub fn format(&self, list_wrapper: &str) -> String {
        self.format_layers(&self.list_layers, list_wrapper)
    }

    fn format_layers(&self, layers: &[ListLayer], list_wrapper: &str) -> String {
        match layers.split_first() {
            Some((_, inner)) => format!(
                "{}[{}]",
                list_wrapper,
                self.format_layers(inner, list_wrapper)
            ),
            None => self.format_base(),
        }
    }

    /// reference types stay bare when nullable, value types gain `Optional`
    fn format_base(&self) -> String {
        if self.base.is_value_type && !self.base.is_required {
            format!("Optional[{}]", self.base.name)
        } else {
            self.base.name.clone()
        }
    }
}

/// list layers of a type reference, outer to inner
pub fn list_layers(ty: &Type<'_, String>) -> Vec<ListLayer> {
    let mut layers = Vec::new();
    let mut current = ty;
    loop {
        match current {
            Type::NamedType(_) => return layers,
            Type::ListType(inner) => {
                layers.push(ListLayer { required: false });
                current = inner.as_ref();
            }
            Type::NonNullType(inner) => {
                if let Type::ListType(list_inner) = inner.as_ref() {
                    layers.push(ListLayer { required: true });
                    current = list_inner.as_ref();
                } else {
                    current = inner.as_ref();
                }
            }
        }
    }
}

/// innermost named type of a type reference
pub fn base_type_name<'t>(ty: &'t Type<'_, String>) -> &'t str {
    match ty {
        Type::NamedType(name) => name,
        Type::ListType(inner) | Type::NonNullType(inner) => base_type_name(inner),
    }
}

/// true if null is disallowed directly on the innermost named type
fn is_base_required(ty: &Type<'_, String>) -> bool {
    match ty {
        Type::NamedType(_) => false,
        Type::ListType(inner) => is_base_required(inner),
        Type::NonNullType(inner) => match inner.as_ref() {
            Type::NamedType(_) => true,
            other => is_base_required(other),
        },
    }
}

/// schema type reference → [`FieldType`]
pub struct TypeResolver<'s, 'a> {
    schema: &'s SchemaContext<'a>,
    scalars: BTreeMap<String, String>,
    names: &'s dyn NameConverter,
    namespace: String,
}

impl<'s, 'a> TypeResolver<'s, 'a> {
    pub fn new(
        schema: &'s SchemaContext<'a>,
        scalars: BTreeMap<String, String>,
        names: &'s dyn NameConverter,
    ) -> Self {
        Self {
            schema,
            scalars,
            names,
            namespace: String::new(),
        }
    }

    /// prefix input and enum names, e.g. `Types.`
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn schema(&self) -> &'s SchemaContext<'a> {
        self.schema
    }

    /// the `__typename` meta field
    pub fn typename(&self) -> FieldType {
        let name = self
            .scalars
            .get("String")
            .cloned()
            .unwrap_or_else(|| "str".to_string());
        let value_type = is_value_type(&name);
        FieldType::named(name, true, value_type)
    }

    /// resolve a type reference; a default value makes the outermost level optional
    pub fn resolve(&self, ty: &Type<'_, String>, has_default: bool) -> Result<FieldType> {
        let name = base_type_name(ty);
        let is_required = is_base_required(ty);

        let (rendered, value_type) = if self.schema.is_scalar(name) {
            match self.scalars.get(name) {
                Some(mapped) => (mapped.clone(), is_value_type(mapped)),
                None => ("object".to_string(), false),
            }
        } else {
            match self.schema.type_definition(name) {
                Some(TypeDefinition::Enum(_)) => (self.namespaced(name), true),
                Some(TypeDefinition::InputObject(_)) => (self.namespaced(name), false),
                Some(_) => (name.to_string(), false),
                None => return Err(Error::TypeNotFound(name.to_string())),
            }
        };

        let mut field_type = FieldType {
            base: BaseType {
                name: rendered,
                is_required,
                is_value_type: value_type,
            },
            list_layers: list_layers(ty),
        };

        if has_default {
            match field_type.list_layers.first_mut() {
                Some(layer) => layer.required = false,
                None => field_type.base.is_required = false,
            }
        }

        Ok(field_type)
    }

    fn namespaced(&self, name: &str) -> String {
        let options = ConvertOptions {
            prefix: self.namespace.clone(),
            ..ConvertOptions::default()
        };
        self.names.convert(name, &options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::PascalCase;
    use crate::scalars::build_scalars;
    use crate::schema;
    use graphql_parser::query::{parse_query, Definition, OperationDefinition};

    const SDL: &str = r#"
        scalar DateTime
        scalar Upload
        enum Role { ADMIN USER }
        input UserFilter { name: String }
        type User { id: ID! name: String }
        type Query {
            user(id: ID!): User
            tags: [String]
            matrix: [[Int!]]!
            role: Role
            createdAt: DateTime
            upload: Upload
        }
    "#;

    fn resolve_variable(resolver: &TypeResolver<'_, '_>, source: &str) -> Result<FieldType> {
        let doc = parse_query::<String>(source).unwrap();
        let var = doc
            .definitions
            .iter()
            .find_map(|def| match def {
                Definition::Operation(OperationDefinition::Query(query)) => {
                    query.variable_definitions.first()
                }
                _ => None,
            })
            .unwrap();
        resolver.resolve(&var.var_type, var.default_value.is_some())
    }

    fn field_type<'a>(doc: &'a graphql_parser::schema::Document<'a, String>, name: &str) -> FieldType {
        let ctx = SchemaContext::new(doc);
        let mut scalars = BTreeMap::new();
        scalars.insert("DateTime".to_string(), "datetime".to_string());
        let resolver = TypeResolver::new(&ctx, build_scalars(&scalars), &PascalCase);
        let query = ctx.composite("Query").unwrap();
        resolver.resolve(&query.field(name).unwrap().field_type, false).unwrap()
    }

    #[test]
    fn test_nullability_asymmetry() {
        let doc = schema::parse(SDL).unwrap();
        let user = field_type(&doc, "user");
        assert_eq!(user.format("List"), "User");
        assert!(!user.is_outer_required());

        let role = field_type(&doc, "role");
        assert_eq!(role.format("List"), "Optional[Role]");
    }

    #[test]
    fn test_list_depth() {
        let doc = schema::parse(SDL).unwrap();
        let matrix = field_type(&doc, "matrix");
        assert_eq!(
            matrix.list_layers,
            vec![ListLayer { required: true }, ListLayer { required: false }]
        );
        assert!(matrix.base.is_required);
        assert_eq!(matrix.format("List"), "List[List[int]]");

        let tags = field_type(&doc, "tags");
        assert_eq!(tags.list_layers.len(), 1);
        assert_eq!(tags.format("List"), "List[Optional[str]]");
    }

    #[test]
    fn test_scalar_mapping() {
        let doc = schema::parse(SDL).unwrap();
        let created = field_type(&doc, "createdAt");
        assert_eq!(created.base.name, "datetime");
        assert!(!created.base.is_value_type);
        assert_eq!(created.format("List"), "datetime");

        let upload = field_type(&doc, "upload");
        assert_eq!(upload.format("List"), "object");
    }

    #[test]
    fn test_namespace_prefix() {
        let doc = schema::parse(SDL).unwrap();
        let ctx = SchemaContext::new(&doc);
        let resolver = TypeResolver::new(&ctx, build_scalars(&BTreeMap::new()), &PascalCase)
            .with_namespace("Types.");

        let resolved =
            resolve_variable(&resolver, "query Q($f: UserFilter!) { user(id: 1) { id } }").unwrap();
        assert_eq!(resolved.format("List"), "Types.UserFilter");
        assert!(resolved.is_outer_required());

        let resolved =
            resolve_variable(&resolver, "query Q($r: [Role!]) { user(id: 1) { id } }").unwrap();
        assert_eq!(resolved.format("List"), "List[Types.Role]");
    }

    #[test]
    fn test_default_value_makes_outer_optional() {
        let doc = schema::parse(SDL).unwrap();
        let ctx = SchemaContext::new(&doc);
        let resolver = TypeResolver::new(&ctx, build_scalars(&BTreeMap::new()), &PascalCase);

        let resolved =
            resolve_variable(&resolver, "query Q($n: Int! = 10) { user(id: 1) { id } }").unwrap();
        assert!(!resolved.is_outer_required());
        assert_eq!(resolved.format("List"), "Optional[int]");

        let resolved = resolve_variable(
            &resolver,
            "query Q($ids: [ID!]! = [\"1\"]) { user(id: 1) { id } }",
        )
        .unwrap();
        assert!(!resolved.is_outer_required());
        assert!(resolved.base.is_required);
        assert_eq!(resolved.format("List"), "List[str]");
    }

    #[test]
    fn test_unknown_type() {
        let doc = schema::parse(SDL).unwrap();
        let ctx = SchemaContext::new(&doc);
        let resolver = TypeResolver::new(&ctx, build_scalars(&BTreeMap::new()), &PascalCase);
        assert!(matches!(
            resolve_variable(&resolver, "query Q($x: Missing) { user(id: 1) { id } }"),
            Err(Error::TypeNotFound(name)) if name == "Missing"
        ));
    }

    #[test]
    fn test_typename() {
        let doc = schema::parse(SDL).unwrap();
        let ctx = SchemaContext::new(&doc);
        let resolver = TypeResolver::new(&ctx, build_scalars(&BTreeMap::new()), &PascalCase);
        assert_eq!(resolver.typename().format("List"), "str");
    }
}
