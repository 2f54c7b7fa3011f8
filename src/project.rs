//! generation runs
//!
//! a run validates every output first, loads the schema and documents once,
//! then renders each output's plugins in configuration order. nothing is
//! written unless every output rendered.

use crate::config::{Plugin, ProjectConfig};
use crate::document::{parse_documents, DocumentSource, FragmentRegistry};
use crate::error::{Error, Result};
use crate::loader::{load_documents, SchemaLoader, SchemaSource};
use crate::operations::OperationsPlugin;
use crate::schema::{self, SchemaContext};
use crate::types::TypesPlugin;
use std::path::{Path, PathBuf};

/// rendered output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

/// both plugins emit python modules
pub fn validate_output(path: &Path, plugin: Plugin) -> Result<()> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("py") => Ok(()),
        _ => Err(Error::OutputExtension {
            path: path.to_path_buf(),
            plugin: plugin.name().to_string(),
        }),
    }
}

fn validate_outputs(project: &ProjectConfig) -> Result<()> {
    for (path, output) in &project.generates {
        for plugin in &output.plugins {
            validate_output(path, *plugin)?;
        }
    }
    Ok(())
}

/// load the project's sources and render every output
pub async fn generate(project: &ProjectConfig) -> Result<Vec<GeneratedFile>> {
    validate_outputs(project)?;

    let source = SchemaSource::parse(&project.schema, project.base_dir())?;
    let loader = SchemaLoader::new(&project.schema_headers)?;
    let schema = loader.load(&source).await?;

    let resolve = |paths: &[PathBuf]| -> Vec<PathBuf> {
        paths.iter().map(|path| project.resolve(path)).collect()
    };
    let documents = load_documents(&resolve(&project.documents)).await?;
    let external_fragments = load_documents(&resolve(&project.external_fragments)).await?;
    tracing::info!(
        documents = documents.len(),
        external_fragments = external_fragments.len(),
        "loaded sources"
    );

    generate_from_sources(project, &schema, &documents, &external_fragments)
}

/// render every output from already loaded sources
///
/// operations are taken from `documents` only; `external_fragments`
/// contribute fragments.
pub fn generate_from_sources(
    project: &ProjectConfig,
    schema: &str,
    documents: &[DocumentSource],
    external_fragments: &[DocumentSource],
) -> Result<Vec<GeneratedFile>> {
    validate_outputs(project)?;

    let schema_doc = schema::parse(schema)?;
    let context = SchemaContext::new(&schema_doc);

    let sources: Vec<DocumentSource> = documents
        .iter()
        .chain(external_fragments)
        .cloned()
        .collect();
    let parsed = parse_documents(&sources)?;
    let fragments = FragmentRegistry::from_documents(&parsed);
    let operation_documents = &parsed[..documents.len()];
    tracing::debug!(fragments = fragments.len(), "registered fragments");

    let remote_schema = match SchemaSource::parse(&project.schema, project.base_dir())? {
        SchemaSource::Remote(url) => Some(url),
        SchemaSource::File(_) => None,
    };

    let mut files = Vec::new();
    for (path, output) in &project.generates {
        let mut parts = Vec::new();
        for plugin in &output.plugins {
            let span = tracing::debug_span!("plugin", plugin = plugin.name(), output = %path.display());
            let _enter = span.enter();

            let rendered = match plugin {
                Plugin::Python => TypesPlugin::new(&output.types_config()?).generate(&context)?,
                Plugin::PythonOperations => {
                    let mut config = output.operations_config()?;
                    if let Some(url) = remote_schema.as_ref().filter(|_| !config.has_schema()) {
                        config = config.with_schema(url.as_str());
                    }
                    OperationsPlugin::new(&config).generate(
                        &context,
                        operation_documents,
                        &fragments,
                    )?
                }
            };
            parts.push(rendered);
        }

        let parts: Vec<&str> = parts.iter().map(|part| part.trim_end()).collect();
        files.push(GeneratedFile {
            path: project.resolve(path),
            content: format!("{}\n", parts.join("\n\n")),
        });
    }
    Ok(files)
}

/// write each file, creating parent directories
pub async fn write(files: &[GeneratedFile]) -> Result<()> {
    for file in files {
        if let Some(parent) = file.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&file.path, &file.content).await?;
        tracing::info!(path = %file.path.display(), bytes = file.content.len(), "wrote output");
    }
    Ok(())
}
