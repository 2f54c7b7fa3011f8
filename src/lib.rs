//! python graphql client generator
//!
//! this crate turns a graphql schema and a set of operation documents into
//! python modules: a types module mirroring the schema (the `python`
//! plugin) and an operations module with typed response dataclasses and
//! call wrappers over `gql` transports (the `python-operations` plugin).
//! start with [`ProjectConfig`] and [`generate`], or drive the plugins
//! directly with [`TypesPlugin`] and [`OperationsPlugin`].
//!
//! ## quick start
//!
//! ```no_run
//! use pygql_codegen::{generate, write, ProjectConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let project = ProjectConfig::load("codegen.yml").await?;
//! let files = generate(&project).await?;
//! write(&files).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## plugins without a project
//!
//! ```
//! use pygql_codegen::{parse_documents, schema, DocumentSource, FragmentRegistry};
//! use pygql_codegen::{OperationsConfig, OperationsPlugin, SchemaContext};
//!
//! let sdl = "type Query { user(id: ID!): User } type User { id: ID! name: String }";
//! let schema_doc = schema::parse(sdl).unwrap();
//! let context = SchemaContext::new(&schema_doc);
//!
//! let sources = vec![DocumentSource::new(
//!     "ops.graphql",
//!     "query GetUser($id: ID!) { user(id: $id) { id name } }",
//! )];
//! let documents = parse_documents(&sources).unwrap();
//! let fragments = FragmentRegistry::from_documents(&documents);
//!
//! let config = OperationsConfig::new("http://localhost:8000/graphql");
//! let module = OperationsPlugin::new(&config)
//!     .generate(&context, &documents, &fragments)
//!     .unwrap();
//! assert!(module.contains("def execute_getuser_gql(*, id: str) -> GetUserResponse:"));
//! ```

mod compiler;
mod config;
mod declaration;
mod document;
mod error;
mod field_type;
mod loader;
mod naming;
mod operations;
mod project;
mod response;
mod scalars;
pub mod schema;
mod types;

pub use compiler::{Compiled, ResponseDeclaration, ResponseMember, SelectionCompiler, SelectionNode};
pub use config::{OperationsConfig, OutputConfig, Plugin, ProjectConfig, TypesConfig};
pub use declaration::{DeclarationBlock, DeclarationKind};
pub use document::{parse_documents, print_operation, DocumentSource, FragmentRegistry, OperationKind};
pub use error::{Error, Result};
pub use field_type::{BaseType, FieldType, ListLayer, TypeResolver};
pub use loader::{load_documents, SchemaLoader, SchemaSource};
pub use naming::{ConvertOptions, Keywords, NameConverter, PascalCase};
pub use operations::OperationsPlugin;
pub use project::{generate, generate_from_sources, validate_output, write, GeneratedFile};
pub use response::prune_empty;
pub use schema::SchemaContext;
pub use types::TypesPlugin;
