//! schema types module emitter
//!
//! renders the `python` output: scalar aliases, enums, object and interface
//! classes with an `Args` class per field that takes arguments, input
//! dataclasses, and unions. names are registered before any
//! body is rendered, so every quoted reference points at a declaration in
//! the same module.

use crate::config::TypesConfig;
use crate::declaration::{alias_marker, transform_comment, DeclarationBlock, DeclarationKind};
use crate::error::{Error, Result};
use crate::naming::{ConvertOptions, Keywords, NameConverter, PascalCase};
use crate::schema::{type_definition_name, SchemaContext, BUILTIN_SCALARS};
use graphql_parser::schema::{
    Directive, EnumType, InputObjectType, Type, TypeDefinition, UnionType, Value,
};
use std::collections::{BTreeMap, BTreeSet};

const PRELUDE: &str = "from dataclasses import dataclass
from enum import Enum
from typing import Any, List, Literal, Optional, Union
";

const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

/// a member line of a class body
struct Member<'m, 'a> {
    name: &'m str,
    description: Option<&'m str>,
    directives: &'m [Directive<'a, String>],
    ty: &'m Type<'a, String>,
}

/// the `python` plugin
pub struct TypesPlugin<'c> {
    config: &'c TypesConfig,
    names: &'c dyn NameConverter,
    keywords: Keywords,
}

impl<'c> TypesPlugin<'c> {
    pub fn new(config: &'c TypesConfig) -> Self {
        Self {
            config,
            names: &PascalCase,
            keywords: Keywords::python(),
        }
    }

    /// replace the name converter
    pub fn with_names(mut self, names: &'c dyn NameConverter) -> Self {
        self.names = names;
        self
    }

    /// replace the reserved word set
    pub fn with_keywords(mut self, keywords: Keywords) -> Self {
        self.keywords = keywords;
        self
    }

    /// render every type in `schema`, in schema order
    pub fn generate(&self, schema: &SchemaContext<'_>) -> Result<String> {
        let registry = Registry {
            schema,
            declared: self.declared_names(schema),
        };

        let mut chunks = vec![
            PRELUDE.to_string(),
            self.render_scalars(schema, &self.config.scalars()),
        ];

        for ty in schema.type_definitions() {
            let blocks = match ty {
                TypeDefinition::Scalar(_) => continue,
                TypeDefinition::Enum(enum_ty) => vec![self.render_enum(enum_ty)],
                TypeDefinition::Object(_) | TypeDefinition::Interface(_) => {
                    self.render_composite(ty, &registry)?
                }
                TypeDefinition::InputObject(input) => vec![self.render_input(input, &registry)?],
                TypeDefinition::Union(union_ty) => vec![self.render_union(union_ty, &registry)?],
            };
            tracing::debug!(name = type_definition_name(ty), blocks = blocks.len(), "rendered type");
            chunks.extend(blocks.iter().map(DeclarationBlock::render));
        }

        let chunks: Vec<&str> = chunks.iter().map(|chunk| chunk.trim_end()).collect();
        Ok(format!("{}\n", chunks.join("\n\n\n")))
    }

    fn declared_names(&self, schema: &SchemaContext<'_>) -> BTreeSet<String> {
        schema
            .type_definitions()
            .filter(|ty| !matches!(ty, TypeDefinition::Scalar(_)))
            .map(|ty| self.names.convert_name(type_definition_name(ty)))
            .collect()
    }

    fn render_scalars(&self, schema: &SchemaContext<'_>, scalars: &BTreeMap<String, String>) -> String {
        let declared = schema.type_definitions().filter_map(|ty| match ty {
            TypeDefinition::Scalar(scalar) => {
                Some((scalar.name.as_str(), scalar.description.as_deref()))
            }
            _ => None,
        });

        let mut entries: Vec<(&str, Option<&str>)> =
            BUILTIN_SCALARS.iter().map(|name| (*name, None)).collect();
        entries.extend(declared);

        let mut seen = BTreeSet::new();
        let mut out = String::new();
        for (name, description) in entries {
            if !seen.insert(name) {
                continue;
            }
            let python_type = scalars.get(name).map(String::as_str).unwrap_or("Any");
            let block = DeclarationBlock::new()
                .as_kind(DeclarationKind::Scalar)
                .with_name(format!("Scalar{}", name))
                .with_comment(description.unwrap_or_default())
                .with_content(python_type);
            out.push_str(&block.render());
        }
        out
    }

    fn render_enum(&self, enum_ty: &EnumType<'_, String>) -> DeclarationBlock {
        let options = ConvertOptions {
            transform_underscore: true,
            ..ConvertOptions::default()
        };

        let mut block = String::new();
        for value in &enum_ty.values {
            block.push_str(&transform_comment(
                &describe(value.description.as_deref(), &value.directives),
                0,
            ));
            let name = self.keywords.escape(&self.names.convert(&value.name, &options));
            block.push_str(&format!("{} = '{}'\n", name, value.name));
        }

        DeclarationBlock::new()
            .as_kind(DeclarationKind::Enum)
            .with_name(self.names.convert_name(&enum_ty.name))
            .with_comment(enum_ty.description.clone().unwrap_or_default())
            .with_block(block)
    }

    /// the class, followed by one `<Type><Field>Args` class per field with
    /// arguments; object classes lead with a `__typename` literal
    fn render_composite(
        &self,
        ty: &TypeDefinition<'_, String>,
        registry: &Registry<'_, '_>,
    ) -> Result<Vec<DeclarationBlock>> {
        let (name, description, is_object) = match ty {
            TypeDefinition::Object(obj) => (obj.name.as_str(), obj.description.as_deref(), true),
            TypeDefinition::Interface(iface) => {
                (iface.name.as_str(), iface.description.as_deref(), false)
            }
            _ => return Err(Error::TypeNotFound(type_definition_name(ty).to_string())),
        };
        let composite = registry
            .schema
            .composite(name)
            .ok_or_else(|| Error::TypeNotFound(name.to_string()))?;

        let members: Vec<Member<'_, '_>> = composite
            .fields()
            .iter()
            .map(|field| Member {
                name: &field.name,
                description: field.description.as_deref(),
                directives: &field.directives,
                ty: &field.field_type,
            })
            .collect();

        let mut body = String::new();
        if is_object {
            body.push_str(&format!("__typename: Optional[Literal[\"{}\"]]\n", name));
        }
        body.push_str(&self.render_members(&members, registry)?);

        let mut blocks = vec![DeclarationBlock::new()
            .with_name(self.names.convert_name(name))
            .with_comment(description.unwrap_or_default())
            .with_block(body)];

        for field in composite.fields().iter().filter(|field| !field.arguments.is_empty()) {
            let arguments: Vec<Member<'_, '_>> = field
                .arguments
                .iter()
                .map(|argument| Member {
                    name: &argument.name,
                    description: argument.description.as_deref(),
                    directives: &argument.directives,
                    ty: &argument.value_type,
                })
                .collect();
            let args_name = format!("{}{}Args", name, self.names.convert_name(&field.name));
            blocks.push(
                DeclarationBlock::new()
                    .with_name(self.names.convert_name(&args_name))
                    .with_comment(field.description.clone().unwrap_or_default())
                    .with_block(self.render_members(&arguments, registry)?),
            );
        }
        Ok(blocks)
    }

    fn render_input(
        &self,
        input: &InputObjectType<'_, String>,
        registry: &Registry<'_, '_>,
    ) -> Result<DeclarationBlock> {
        let members: Vec<Member<'_, '_>> = input
            .fields
            .iter()
            .map(|field| Member {
                name: &field.name,
                description: field.description.as_deref(),
                directives: &field.directives,
                ty: &field.value_type,
            })
            .collect();

        Ok(DeclarationBlock::new()
            .with_name(self.names.convert_name(&input.name))
            .with_decorator("@dataclass")
            .with_comment(input.description.clone().unwrap_or_default())
            .with_block(self.render_members(&members, registry)?))
    }

    fn render_union(
        &self,
        union_ty: &UnionType<'_, String>,
        registry: &Registry<'_, '_>,
    ) -> Result<DeclarationBlock> {
        let variants = union_ty
            .types
            .iter()
            .map(|name| registry.reference(self.names, name))
            .collect::<Result<Vec<_>>>()?;

        Ok(DeclarationBlock::new()
            .as_kind(DeclarationKind::Union)
            .with_name(self.names.convert_name(&union_ty.name))
            .with_comment(union_ty.description.clone().unwrap_or_default())
            .with_content(variants.join(", ")))
    }

    fn render_members(&self, members: &[Member<'_, '_>], registry: &Registry<'_, '_>) -> Result<String> {
        let mut block = String::new();
        for member in members {
            block.push_str(&transform_comment(
                &describe(member.description, member.directives),
                0,
            ));
            block.push_str(&format!(
                "{}: {}\n",
                self.keywords.escape(member.name),
                registry.annotation(self.names, member.ty, false)?
            ));
        }
        Ok(block)
    }
}

/// declared names of one schema, collected before rendering
struct Registry<'s, 'a> {
    schema: &'s SchemaContext<'a>,
    declared: BTreeSet<String>,
}

impl Registry<'_, '_> {
    /// `Optional[...]` unless non-null, `List[...]` per list level
    fn annotation(
        &self,
        names: &dyn NameConverter,
        ty: &Type<'_, String>,
        required: bool,
    ) -> Result<String> {
        let rendered = match ty {
            Type::NonNullType(inner) => return self.annotation(names, inner, true),
            Type::ListType(inner) => format!("List[{}]", self.annotation(names, inner, false)?),
            Type::NamedType(name) => self.reference(names, name)?,
        };
        if required {
            Ok(rendered)
        } else {
            Ok(format!("Optional[{}]", rendered))
        }
    }

    /// scalar alias, or the quoted marker of a declared type
    fn reference(&self, names: &dyn NameConverter, name: &str) -> Result<String> {
        if self.schema.is_scalar(name) {
            return Ok(format!("Scalar{}", name));
        }
        let converted = names.convert_name(name);
        if !self.declared.contains(&converted) {
            return Err(Error::TypeNotFound(name.to_string()));
        }
        Ok(format!("\"{}\"", alias_marker(&converted)))
    }
}

/// description plus an `@deprecated <reason>` line when deprecated
fn describe(description: Option<&str>, directives: &[Directive<'_, String>]) -> String {
    let mut text = description.unwrap_or_default().trim().to_string();
    if let Some(deprecated) = directives.iter().find(|d| d.name == "deprecated") {
        let reason = deprecated
            .arguments
            .iter()
            .find_map(|(name, value)| match value {
                Value::String(reason) if name == "reason" => Some(reason.as_str()),
                _ => None,
            })
            .unwrap_or(DEFAULT_DEPRECATION_REASON);
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str("@deprecated ");
        text.push_str(reason);
    }
    text
}
