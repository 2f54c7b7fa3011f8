//! selection set compiler
//!
//! walks an operation's selection set against the schema and builds the
//! tree of response declarations that mirrors the requested shape. nested
//! selections become nested `...Selection` classes; selections with
//! fragments become a `Union[...]` of one class per fragment.

use crate::declaration::{DeclarationBlock, DeclarationKind};
use crate::document::{
    operation_name, operation_selection_set, type_condition, FragmentRegistry, OperationKind,
};
use crate::error::{Error, Result};
use crate::field_type::{base_type_name, TypeResolver};
use crate::naming::{Keywords, NameConverter};
use crate::schema::Composite;
use graphql_parser::query::{
    Field, FragmentSpread, InlineFragment, OperationDefinition, Selection, SelectionSet,
    TypeCondition,
};
use std::collections::BTreeSet;

/// a node the compiler can visit
#[derive(Debug, Clone, Copy)]
pub enum SelectionNode<'d> {
    Operation(&'d OperationDefinition<'d, String>),
    Field(&'d Field<'d, String>),
    FragmentSpread(&'d FragmentSpread<'d, String>),
    InlineFragment(&'d InlineFragment<'d, String>),
}

impl<'d> SelectionNode<'d> {
    /// human-readable kind, used in errors
    pub fn kind_name(&self) -> &'static str {
        match self {
            SelectionNode::Operation(_) => "operation",
            SelectionNode::Field(_) => "field",
            SelectionNode::FragmentSpread(_) => "fragment spread",
            SelectionNode::InlineFragment(_) => "inline fragment",
        }
    }
}

impl<'d> From<&'d Selection<'d, String>> for SelectionNode<'d> {
    fn from(selection: &'d Selection<'d, String>) -> Self {
        match selection {
            Selection::Field(field) => SelectionNode::Field(field),
            Selection::FragmentSpread(spread) => SelectionNode::FragmentSpread(spread),
            Selection::InlineFragment(inline) => SelectionNode::InlineFragment(inline),
        }
    }
}

/// a generated response class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDeclaration {
    pub name: String,
    pub members: Vec<ResponseMember>,
}

/// one member of a response class
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseMember {
    /// scalar or enum leaf
    Field { name: String, ty: String },
    /// nested selection with its own class
    Selection {
        name: String,
        ty: String,
        declaration: ResponseDeclaration,
    },
    /// selection made of fragments, one class per variant
    Union {
        name: String,
        ty: String,
        variants: Vec<ResponseDeclaration>,
    },
}

impl ResponseMember {
    pub fn name(&self) -> &str {
        match self {
            ResponseMember::Field { name, .. }
            | ResponseMember::Selection { name, .. }
            | ResponseMember::Union { name, .. } => name,
        }
    }

    pub fn ty(&self) -> &str {
        match self {
            ResponseMember::Field { ty, .. }
            | ResponseMember::Selection { ty, .. }
            | ResponseMember::Union { ty, .. } => ty,
        }
    }

    fn render(&self) -> String {
        let line = format!("{}: {}", self.name(), self.ty());
        match self {
            ResponseMember::Field { .. } => line,
            ResponseMember::Selection { declaration, .. } => {
                format!("{}{}", declaration.render(), line)
            }
            ResponseMember::Union { variants, .. } => {
                let mut out = String::new();
                for variant in variants {
                    out.push_str(&variant.render());
                }
                out.push_str(&line);
                out
            }
        }
    }
}

impl ResponseDeclaration {
    /// member by response key
    pub fn member(&self, name: &str) -> Option<&ResponseMember> {
        self.members.iter().find(|member| member.name() == name)
    }

    /// `@dataclass` class text with nested declarations inline
    pub fn render(&self) -> String {
        let body = self
            .members
            .iter()
            .map(ResponseMember::render)
            .collect::<Vec<_>>()
            .join("\n");

        DeclarationBlock::new()
            .as_kind(DeclarationKind::Class)
            .with_decorator("@dataclass")
            .with_name(self.name.as_str())
            .with_block(body)
            .render()
    }
}

/// result of visiting one node
#[derive(Debug)]
pub enum Compiled {
    Member(ResponseMember),
    Declaration(ResponseDeclaration),
    /// a field folded into its sibling fragment variants
    Skipped,
}

/// compiles selection sets into [`ResponseDeclaration`] trees
pub struct SelectionCompiler<'c, 'a, 'd> {
    resolver: &'c TypeResolver<'c, 'a>,
    fragments: &'c FragmentRegistry<'d>,
    names: &'c dyn NameConverter,
    keywords: &'c Keywords,
}

impl<'c, 'a, 'd> SelectionCompiler<'c, 'a, 'd> {
    pub fn new(
        resolver: &'c TypeResolver<'c, 'a>,
        fragments: &'c FragmentRegistry<'d>,
        names: &'c dyn NameConverter,
        keywords: &'c Keywords,
    ) -> Self {
        Self {
            resolver,
            fragments,
            names,
            keywords,
        }
    }

    /// `<OperationName>Response` for an operation
    pub fn response_name(&self, op: &OperationDefinition<'_, String>) -> String {
        let name = operation_name(op).unwrap_or_default();
        format!("{}Response", self.names.convert_name(name).replace('_', ""))
    }

    /// compile an operation into its top-level response declaration
    pub fn compile_operation(
        &self,
        op: &'d OperationDefinition<'d, String>,
    ) -> Result<ResponseDeclaration> {
        let root = self.resolver.schema().root_type(OperationKind::of(op))?;
        let mut path = Vec::new();
        match self.compile_node(SelectionNode::Operation(op), &root, false, &[], &mut path)? {
            Compiled::Declaration(declaration) => Ok(declaration),
            Compiled::Member(_) | Compiled::Skipped => Err(Error::UnexpectedSelection {
                kind: "field",
                context: self.response_name(op),
            }),
        }
    }

    /// visit one node against its parent type
    pub fn compile_node(
        &self,
        node: SelectionNode<'d>,
        parent: &Composite<'a>,
        as_fragment_member: bool,
        extras: &[&'d Field<'d, String>],
        path: &mut Vec<String>,
    ) -> Result<Compiled> {
        match node {
            SelectionNode::Operation(op) => {
                let name = self.response_name(op);
                let mut members = Vec::new();
                for item in &operation_selection_set(op).items {
                    let SelectionNode::Field(field) = SelectionNode::from(item) else {
                        return Err(Error::UnexpectedSelection {
                            kind: SelectionNode::from(item).kind_name(),
                            context: format!("operation {}", name),
                        });
                    };
                    if let Some(member) = self.compile_field(field, parent, false, path)? {
                        members.push(member);
                    }
                }
                Ok(Compiled::Declaration(ResponseDeclaration { name, members }))
            }
            SelectionNode::Field(field) => {
                Ok(match self.compile_field(field, parent, as_fragment_member, path)? {
                    Some(member) => Compiled::Member(member),
                    None => Compiled::Skipped,
                })
            }
            SelectionNode::FragmentSpread(spread) => {
                let declaration = self.compile_spread(spread, extras, path)?;
                Ok(Compiled::Declaration(declaration))
            }
            SelectionNode::InlineFragment(inline) => {
                let declaration = self.compile_inline(inline, parent, extras, path)?;
                Ok(Compiled::Declaration(declaration))
            }
        }
    }

    fn compile_field(
        &self,
        field: &'d Field<'d, String>,
        parent: &Composite<'a>,
        as_fragment_member: bool,
        path: &mut Vec<String>,
    ) -> Result<Option<ResponseMember>> {
        let key = self.keywords.escape(response_key(field));

        if field.name == "__typename" {
            if as_fragment_member {
                return Ok(None);
            }
            let ty = self.resolver.typename().format("List");
            return Ok(Some(ResponseMember::Field { name: key, ty }));
        }

        let schema_field = parent.field(&field.name).ok_or_else(|| Error::FieldNotFound {
            type_name: parent.name().to_string(),
            field: field.name.clone(),
        })?;
        let field_type = self.resolver.resolve(&schema_field.field_type, false)?;

        if field.selection_set.items.is_empty() {
            if as_fragment_member {
                return Ok(None);
            }
            let ty = field_type.format("List");
            return Ok(Some(ResponseMember::Field { name: key, ty }));
        }

        let base = base_type_name(&schema_field.field_type);
        let inner = self
            .resolver
            .schema()
            .composite(base)
            .ok_or_else(|| Error::TypeNotFound(base.to_string()))?;

        if as_fragment_member {
            return Ok(None);
        }

        let has_fragments = field
            .selection_set
            .items
            .iter()
            .any(|item| !matches!(item, Selection::Field(_)));

        if has_fragments {
            let extras: Vec<&'d Field<'d, String>> = field
                .selection_set
                .items
                .iter()
                .filter_map(|item| match item {
                    Selection::Field(sibling) => Some(sibling),
                    _ => None,
                })
                .collect();

            let mut variants = Vec::new();
            for item in &field.selection_set.items {
                match self.compile_node(SelectionNode::from(item), &inner, true, &extras, path)? {
                    Compiled::Declaration(variant) => variants.push(variant),
                    Compiled::Member(_) | Compiled::Skipped => {}
                }
            }

            let names = variants
                .iter()
                .map(|variant| variant.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let ty = field_type
                .with_base_name(format!("Union[{}]", names))
                .format("List");
            return Ok(Some(ResponseMember::Union {
                name: key,
                ty,
                variants,
            }));
        }

        let selection_name = format!("{}Selection", base);
        let mut members = Vec::new();
        for item in &field.selection_set.items {
            if let Selection::Field(child) = item {
                if let Some(member) = self.compile_field(child, &inner, false, path)? {
                    members.push(member);
                }
            }
        }

        let ty = field_type
            .with_base_name(format!("\"{}\"", selection_name))
            .format("List");
        Ok(Some(ResponseMember::Selection {
            name: key,
            ty,
            declaration: ResponseDeclaration {
                name: selection_name,
                members,
            },
        }))
    }

    fn compile_spread(
        &self,
        spread: &'d FragmentSpread<'d, String>,
        extras: &[&'d Field<'d, String>],
        path: &mut Vec<String>,
    ) -> Result<ResponseDeclaration> {
        let name = spread.fragment_name.as_str();
        if path.iter().any(|entered| entered == name) {
            return Err(Error::FragmentCycle(name.to_string()));
        }

        let fragment = self.fragments.require(name)?;
        let condition = type_condition(fragment);
        let composite = self.composite(condition)?;
        tracing::debug!(fragment = name, on = condition, "compiling fragment");

        path.push(name.to_string());
        let members = self.compile_body(&fragment.selection_set, &composite, extras, path);
        path.pop();

        Ok(ResponseDeclaration {
            name: name.to_string(),
            members: members?,
        })
    }

    fn compile_inline(
        &self,
        inline: &'d InlineFragment<'d, String>,
        parent: &Composite<'a>,
        extras: &[&'d Field<'d, String>],
        path: &mut Vec<String>,
    ) -> Result<ResponseDeclaration> {
        let composite = match &inline.type_condition {
            Some(TypeCondition::On(condition)) => self.composite(condition)?,
            None => parent.clone(),
        };
        let members = self.compile_body(&inline.selection_set, &composite, extras, path)?;

        Ok(ResponseDeclaration {
            name: composite.name().to_string(),
            members,
        })
    }

    /// fields of a fragment body, nested fragments flattened in, then any
    /// sibling field whose field name the body does not already select
    fn compile_body(
        &self,
        set: &'d SelectionSet<'d, String>,
        composite: &Composite<'a>,
        extras: &[&'d Field<'d, String>],
        path: &mut Vec<String>,
    ) -> Result<Vec<ResponseMember>> {
        let mut fields = Vec::new();
        let mut seen = BTreeSet::new();
        self.flatten(set, composite, &mut fields, &mut seen, path)?;

        let own: BTreeSet<&str> = fields.iter().map(|(field, _)| field.name.as_str()).collect();
        for &extra in extras {
            if !own.contains(extra.name.as_str()) {
                fields.push((extra, composite.clone()));
            }
        }

        let mut members = Vec::new();
        for (field, parent) in fields {
            if let Some(member) = self.compile_field(field, &parent, false, path)? {
                members.push(member);
            }
        }
        Ok(members)
    }

    fn flatten(
        &self,
        set: &'d SelectionSet<'d, String>,
        composite: &Composite<'a>,
        fields: &mut Vec<(&'d Field<'d, String>, Composite<'a>)>,
        seen: &mut BTreeSet<&'d str>,
        path: &mut Vec<String>,
    ) -> Result<()> {
        for item in &set.items {
            match item {
                Selection::Field(field) => {
                    if seen.insert(response_key(field)) {
                        fields.push((field, composite.clone()));
                    }
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.fragment_name.as_str();
                    if path.iter().any(|entered| entered == name) {
                        return Err(Error::FragmentCycle(name.to_string()));
                    }
                    let fragment = self.fragments.require(name)?;
                    let inner = self.composite(type_condition(fragment))?;

                    path.push(name.to_string());
                    let result = self.flatten(&fragment.selection_set, &inner, fields, seen, path);
                    path.pop();
                    result?;
                }
                Selection::InlineFragment(inline) => {
                    let inner = match &inline.type_condition {
                        Some(TypeCondition::On(condition)) => self.composite(condition)?,
                        None => composite.clone(),
                    };
                    self.flatten(&inline.selection_set, &inner, fields, seen, path)?;
                }
            }
        }
        Ok(())
    }

    fn composite(&self, name: &str) -> Result<Composite<'a>> {
        self.resolver
            .schema()
            .composite(name)
            .ok_or_else(|| Error::TypeNotFound(name.to_string()))
    }
}

/// alias when present, else the field name
fn response_key<'f>(field: &'f Field<'_, String>) -> &'f str {
    field.alias.as_deref().unwrap_or(&field.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{operations, parse_documents, DocumentSource};
    use crate::naming::PascalCase;
    use crate::scalars::build_scalars;
    use crate::schema::{self, SchemaContext};
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    const SDL: &str = r#"
        interface Node { id: ID! }
        type User implements Node { id: ID! name: String friends: [User!]! from: String }
        type Post implements Node { id: ID! title: String! author: User }
        union SearchResult = User | Post
        type Query {
            user(id: ID!): User
            node(id: ID!): Node
            search(text: String!): [SearchResult!]!
        }
    "#;

    fn compile(source: &str) -> Result<Vec<ResponseDeclaration>> {
        let schema_doc = schema::parse(SDL).unwrap();
        let ctx = SchemaContext::new(&schema_doc);
        let resolver = TypeResolver::new(&ctx, build_scalars(&BTreeMap::new()), &PascalCase);
        let sources = vec![DocumentSource::new("test.graphql", source)];
        let docs = parse_documents(&sources).unwrap();
        let fragments = FragmentRegistry::from_documents(&docs);
        let keywords = Keywords::python();
        let compiler = SelectionCompiler::new(&resolver, &fragments, &PascalCase, &keywords);

        operations(&docs)
            .map(|op| compiler.compile_operation(op))
            .collect()
    }

    fn compile_one(source: &str) -> ResponseDeclaration {
        compile(source).unwrap().remove(0)
    }

    #[test]
    fn test_get_user_scenario() {
        let response =
            compile_one("query GetUser($id: ID!) { user(id: $id) { id name } }");

        assert_eq!(
            response.render(),
            indoc! {r#"
                @dataclass
                class GetUserResponse:
                    @dataclass
                    class UserSelection:
                        id: str
                        name: Optional[str]

                    __GQL_CODEGEN_UserSelection__ = UserSelection
                    user: "UserSelection"

                __GQL_CODEGEN_GetUserResponse__ = GetUserResponse
            "#}
        );
    }

    #[test]
    fn test_single_inline_fragment_is_single_variant_union() {
        let response =
            compile_one("query GetUserName($id: ID!) { user(id: $id) { ... on User { name } } }");

        let Some(ResponseMember::Union { ty, variants, .. }) = response.member("user") else {
            panic!("expected union member");
        };
        assert_eq!(ty, "Union[User]");
        assert_eq!(
            variants,
            &vec![ResponseDeclaration {
                name: "User".to_string(),
                members: vec![ResponseMember::Field {
                    name: "name".to_string(),
                    ty: "Optional[str]".to_string(),
                }],
            }]
        );
    }

    #[test]
    fn test_selection_order_preserved() {
        let response = compile_one("query Q { user(id: 1) { name from id } }");
        let Some(ResponseMember::Selection { declaration, .. }) = response.member("user") else {
            panic!("expected selection member");
        };
        let names: Vec<_> = declaration.members.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["name", "_from", "id"]);
    }

    #[test]
    fn test_aliases_and_lists() {
        let response =
            compile_one("query Q { me: user(id: 1) { pals: friends { id } } }");
        let Some(ResponseMember::Selection { ty, declaration, .. }) = response.member("me") else {
            panic!("expected selection member");
        };
        assert_eq!(ty, "\"UserSelection\"");
        let pals = declaration.member("pals").unwrap();
        assert_eq!(pals.ty(), "List[\"UserSelection\"]");
    }

    #[test]
    fn test_union_with_siblings_and_spreads() {
        let response = compile_one(indoc! {"
            query Search {
                search(text: \"x\") {
                    __typename
                    ... on Post { title }
                    ...UserBits
                }
            }
            fragment UserBits on User { id name }
        "});

        let Some(ResponseMember::Union { ty, variants, .. }) = response.member("search") else {
            panic!("expected union member");
        };
        assert_eq!(ty, "List[Union[Post, UserBits]]");

        let post: Vec<_> = variants[0].members.iter().map(|m| m.name()).collect();
        assert_eq!(post, vec!["title", "__typename"]);
        let user: Vec<_> = variants[1].members.iter().map(|m| m.name()).collect();
        assert_eq!(user, vec!["id", "name", "__typename"]);
    }

    #[test]
    fn test_sibling_already_selected_is_not_duplicated() {
        let response = compile_one("query Q { node(id: 1) { id ... on User { id name } } }");
        let Some(ResponseMember::Union { variants, .. }) = response.member("node") else {
            panic!("expected union member");
        };
        let names: Vec<_> = variants[0].members.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn test_aliased_sibling_matched_by_field_name() {
        let response = compile_one("query Q { node(id: 1) { nodeId: id ... on User { id name } } }");
        let Some(ResponseMember::Union { variants, .. }) = response.member("node") else {
            panic!("expected union member");
        };
        let names: Vec<_> = variants[0].members.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn test_sub_selection_on_scalar() {
        let err = compile("query Q { user(id: 1) { name { x } } }").unwrap_err();
        assert!(matches!(err, Error::TypeNotFound(name) if name == "String"));
    }

    #[test]
    fn test_inline_fragment_without_condition_uses_parent() {
        let response = compile_one("query Q { user(id: 1) { ... { id } } }");
        let Some(ResponseMember::Union { ty, .. }) = response.member("user") else {
            panic!("expected union member");
        };
        assert_eq!(ty, "Union[User]");
    }

    #[test]
    fn test_nested_fragments_flatten() {
        let response = compile_one(indoc! {"
            query Q { node(id: 1) { ...NodeBits } }
            fragment NodeBits on Node { id ...UserBits }
            fragment UserBits on User { id name }
        "});
        let Some(ResponseMember::Union { variants, .. }) = response.member("node") else {
            panic!("expected union member");
        };
        let names: Vec<_> = variants[0].members.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn test_missing_field_is_desync() {
        let err = compile("query Q { user(id: 1) { email } }").unwrap_err();
        assert!(err.is_desync());
        assert_eq!(err.to_string(), "field schema not found: User.email");
    }

    #[test]
    fn test_missing_fragment() {
        let err = compile("query Q { user(id: 1) { ...Nope } }").unwrap_err();
        assert!(matches!(err, Error::FragmentNotFound(name) if name == "Nope"));
    }

    #[test]
    fn test_fragment_cycle() {
        let err = compile(indoc! {"
            query Q { user(id: 1) { ...A } }
            fragment A on User { id ...B }
            fragment B on User { name ...A }
        "})
        .unwrap_err();
        assert!(matches!(err, Error::FragmentCycle(_)));
    }

    #[test]
    fn test_fragment_at_operation_root_rejected() {
        let err = compile("query Q { ... on Query { user(id: 1) { id } } }").unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedSelection { kind: "inline fragment", .. }
        ));
    }

    #[test]
    fn test_deterministic() {
        let source = indoc! {"
            query Search { search(text: \"x\") { ... on Post { title author { name } } ... on User { id } } }
        "};
        let first: Vec<_> = compile(source).unwrap().iter().map(|d| d.render()).collect();
        let second: Vec<_> = compile(source).unwrap().iter().map(|d| d.render()).collect();
        assert_eq!(first, second);
    }
}
