//! scalar mappings
//!
//! built-in graphql scalar → python type table and the value-type allow-list.

use std::collections::BTreeMap;

/// built-in scalar mappings, applied before any configured overrides
pub const DEFAULT_SCALARS: [(&str, &str); 5] = [
    ("ID", "str"),
    ("String", "str"),
    ("Boolean", "bool"),
    ("Int", "int"),
    ("Float", "float"),
];

/// python types that need an explicit `Optional[...]` when nullable
const VALUE_TYPES: [&str; 13] = [
    "bool", "int", "float", "str", "bytes", "complex", "decimal", "Decimal", "double", "long",
    "short", "byte", "char",
];

/// merge configured scalar mappings over the built-in defaults
pub fn build_scalars(overrides: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut scalars: BTreeMap<String, String> = DEFAULT_SCALARS
        .iter()
        .map(|(name, ty)| (name.to_string(), ty.to_string()))
        .collect();
    for (name, ty) in overrides {
        scalars.insert(name.clone(), ty.clone());
    }
    scalars
}

/// true if the python type is in the value-type allow-list
pub fn is_value_type(python_type: &str) -> bool {
    VALUE_TYPES.contains(&python_type)
}
