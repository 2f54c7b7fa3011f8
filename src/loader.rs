//! schema and document loading
//!
//! local files are read with tokio; remote schemas are fetched with reqwest.
//! the `_with` variants take the transport as a closure so tests never touch
//! the network.

use crate::document::DocumentSource;
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use url::Url;

const DOCUMENT_EXTENSIONS: [&str; 2] = ["graphql", "gql"];

/// where the schema comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    File(PathBuf),
    Remote(Url),
}

impl SchemaSource {
    /// `http(s)` urls are remote; anything else is a path under `base_dir`
    pub fn parse(value: &str, base_dir: &Path) -> Result<Self> {
        if value.starts_with("http://") || value.starts_with("https://") {
            return Ok(SchemaSource::Remote(Url::parse(value)?));
        }
        let path = Path::new(value);
        if path.is_absolute() {
            Ok(SchemaSource::File(path.to_path_buf()))
        } else {
            Ok(SchemaSource::File(base_dir.join(path)))
        }
    }
}

/// loads schema text from a file or an http endpoint
#[derive(Clone)]
pub struct SchemaLoader {
    http: reqwest::Client,
}

impl SchemaLoader {
    /// create a loader that sends `headers` with every schema request
    pub fn new(headers: &BTreeMap<String, String>) -> Result<Self> {
        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| Error::Config(format!("invalid schema header name {name}: {err}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|err| Error::Config(format!("invalid schema header value: {err}")))?;
            header_map.insert(name, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(header_map)
            .user_agent(format!("pygql-codegen/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http })
    }

    /// load schema text
    pub async fn load(&self, source: &SchemaSource) -> Result<String> {
        self.load_with(source, |url| async move {
            let response = self.http.get(url).send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok((status, text))
        })
        .await
    }

    pub(crate) async fn load_with<F, Fut>(&self, source: &SchemaSource, send: F) -> Result<String>
    where
        F: FnOnce(Url) -> Fut,
        Fut: Future<Output = Result<(StatusCode, String)>>,
    {
        match source {
            SchemaSource::File(path) => {
                tracing::debug!(path = %path.display(), "reading schema");
                Ok(tokio::fs::read_to_string(path).await?)
            }
            SchemaSource::Remote(url) => {
                tracing::debug!(url = %url, "fetching schema");
                let (status, text) = send(url.clone()).await?;
                parse_schema_response(status, text)
            }
        }
    }
}

impl std::fmt::Debug for SchemaLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaLoader").finish_non_exhaustive()
    }
}

fn parse_schema_response(status: StatusCode, text: String) -> Result<String> {
    if !status.is_success() {
        return Err(Error::SchemaHttp {
            status: status.as_u16(),
            body: text,
        });
    }

    Ok(text)
}

/// files named directly plus `.graphql`/`.gql` files found under directories
pub async fn collect_document_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if tokio::fs::metadata(path).await?.is_dir() {
            walk_dir(path, &mut files).await?;
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

async fn walk_dir(root: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut pending = vec![root.to_path_buf()];
    let mut found = Vec::new();
    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else if is_document(&path) {
                found.push(path);
            }
        }
    }
    found.sort();
    files.extend(found);
    Ok(())
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext))
}

/// read every document, labelled by its path
pub async fn load_documents(paths: &[PathBuf]) -> Result<Vec<DocumentSource>> {
    let mut sources = Vec::new();
    for path in collect_document_paths(paths).await? {
        let text = tokio::fs::read_to_string(&path).await?;
        tracing::debug!(path = %path.display(), "loaded document");
        sources.push(DocumentSource::new(path.display().to_string(), text));
    }
    Ok(sources)
}
