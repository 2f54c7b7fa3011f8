//! operation documents
//!
//! parsing of operation sources, the fragment registry, and the printed
//! query text embedded in generated code.

use crate::error::{Error, Result};
use graphql_parser::query::{
    parse_query, Definition, Document, FragmentDefinition, OperationDefinition, Selection,
    SelectionSet, TypeCondition, VariableDefinition,
};
use std::collections::{BTreeMap, BTreeSet};

/// a named operation document source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSource {
    /// file name or label, used in parse errors
    pub name: String,
    /// graphql text
    pub text: String,
}

impl DocumentSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// parse every source, failing on the first invalid one
pub fn parse_documents(sources: &[DocumentSource]) -> Result<Vec<Document<'_, String>>> {
    sources
        .iter()
        .map(|source| {
            parse_query::<String>(&source.text).map_err(|err| Error::DocumentParse {
                source_name: source.name.clone(),
                message: err.to_string(),
            })
        })
        .collect()
}

/// graphql operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    /// lower-case keyword
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }

    /// kind of an operation definition; the `{ ... }` shorthand is a query
    pub fn of(op: &OperationDefinition<'_, String>) -> Self {
        match op {
            OperationDefinition::SelectionSet(_) | OperationDefinition::Query(_) => {
                OperationKind::Query
            }
            OperationDefinition::Mutation(_) => OperationKind::Mutation,
            OperationDefinition::Subscription(_) => OperationKind::Subscription,
        }
    }
}

/// operation name, if it has one
pub fn operation_name<'o>(op: &'o OperationDefinition<'_, String>) -> Option<&'o str> {
    match op {
        OperationDefinition::SelectionSet(_) => None,
        OperationDefinition::Query(q) => q.name.as_deref(),
        OperationDefinition::Mutation(m) => m.name.as_deref(),
        OperationDefinition::Subscription(s) => s.name.as_deref(),
    }
}

/// top-level selection set of an operation
pub fn operation_selection_set<'o, 'a>(
    op: &'o OperationDefinition<'a, String>,
) -> &'o SelectionSet<'a, String> {
    match op {
        OperationDefinition::SelectionSet(set) => set,
        OperationDefinition::Query(q) => &q.selection_set,
        OperationDefinition::Mutation(m) => &m.selection_set,
        OperationDefinition::Subscription(s) => &s.selection_set,
    }
}

/// declared variables of an operation
pub fn variable_definitions<'o, 'a>(
    op: &'o OperationDefinition<'a, String>,
) -> &'o [VariableDefinition<'a, String>] {
    match op {
        OperationDefinition::SelectionSet(_) => &[],
        OperationDefinition::Query(q) => &q.variable_definitions,
        OperationDefinition::Mutation(m) => &m.variable_definitions,
        OperationDefinition::Subscription(s) => &s.variable_definitions,
    }
}

/// every operation across the documents, in document order
pub fn operations<'a>(
    documents: &'a [Document<'a, String>],
) -> impl Iterator<Item = &'a OperationDefinition<'a, String>> {
    documents
        .iter()
        .flat_map(|doc| doc.definitions.iter())
        .filter_map(|def| match def {
            Definition::Operation(op) => Some(op),
            Definition::Fragment(_) => None,
        })
}

/// fragment name → definition
#[derive(Debug, Default)]
pub struct FragmentRegistry<'a> {
    fragments: BTreeMap<&'a str, &'a FragmentDefinition<'a, String>>,
}

impl<'a> FragmentRegistry<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// registry over every fragment defined in the documents
    pub fn from_documents(documents: &'a [Document<'a, String>]) -> Self {
        let mut registry = Self::new();
        for doc in documents {
            registry.add_document(doc);
        }
        registry
    }

    /// register the fragments of a document; earlier definitions win
    pub fn add_document(&mut self, document: &'a Document<'a, String>) {
        for def in &document.definitions {
            if let Definition::Fragment(fragment) = def {
                self.fragments
                    .entry(fragment.name.as_str())
                    .or_insert(fragment);
            }
        }
    }

    /// fragment by name
    pub fn get(&self, name: &str) -> Option<&'a FragmentDefinition<'a, String>> {
        self.fragments.get(name).copied()
    }

    /// fragment by name, or a lookup error
    pub fn require(&self, name: &str) -> Result<&'a FragmentDefinition<'a, String>> {
        self.get(name)
            .ok_or_else(|| Error::FragmentNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// name of the type a fragment is conditioned on
pub fn type_condition<'f>(fragment: &'f FragmentDefinition<'_, String>) -> &'f str {
    let TypeCondition::On(name) = &fragment.type_condition;
    name
}

/// operation text plus every fragment it uses, escaped for a python
/// triple-quoted string
pub fn print_operation(
    op: &OperationDefinition<'_, String>,
    fragments: &FragmentRegistry<'_>,
) -> Result<String> {
    let mut used = Vec::new();
    let mut seen = BTreeSet::new();
    collect_spreads(operation_selection_set(op), fragments, &mut used, &mut seen)?;

    let mut parts = vec![op.to_string().trim_end().to_string()];
    for fragment in used {
        parts.push(fragment.to_string().trim_end().to_string());
    }

    Ok(escape_triple_quoted(&parts.join("\n\n")))
}

fn collect_spreads<'a>(
    set: &SelectionSet<'_, String>,
    fragments: &FragmentRegistry<'a>,
    used: &mut Vec<&'a FragmentDefinition<'a, String>>,
    seen: &mut BTreeSet<String>,
) -> Result<()> {
    for item in &set.items {
        match item {
            Selection::Field(field) => {
                collect_spreads(&field.selection_set, fragments, used, seen)?;
            }
            Selection::InlineFragment(inline) => {
                collect_spreads(&inline.selection_set, fragments, used, seen)?;
            }
            Selection::FragmentSpread(spread) => {
                if !seen.insert(spread.fragment_name.clone()) {
                    continue;
                }
                let fragment = fragments.require(&spread.fragment_name)?;
                used.push(fragment);
                collect_spreads(&fragment.selection_set, fragments, used, seen)?;
            }
        }
    }
    Ok(())
}

fn escape_triple_quoted(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
