//! generator configuration
//!
//! [`OperationsConfig`] and [`TypesConfig`] configure the two plugins;
//! [`ProjectConfig`] is the `codegen.yml` file that binds schema, documents,
//! and plugins to output files.

use crate::document::OperationKind;
use crate::error::{Error, Result};
use crate::scalars::build_scalars;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

const DEFAULT_SUFFIX: &str = "GQL";

fn default_suffix() -> String {
    DEFAULT_SUFFIX.to_string()
}

/// configuration for the `python-operations` plugin
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperationsConfig {
    /// suffix of query identifiers
    pub(crate) query_suffix: String,

    /// suffix of mutation identifiers
    pub(crate) mutation_suffix: String,

    /// suffix of subscription identifiers
    pub(crate) subscription_suffix: String,

    /// http endpoint used by the generated clients
    pub(crate) schema: Option<String>,

    /// websocket endpoint; derived from `schema` when unset
    pub(crate) schema_subscriptions: Option<String>,

    /// header sent by every generated transport
    pub(crate) header_name: Option<String>,

    pub(crate) header_value: Option<String>,

    /// emit async call variants and transports
    pub(crate) generate_async: bool,

    /// scalar name → python type, merged over the defaults
    pub(crate) scalars: BTreeMap<String, String>,

    /// drop the suffix when the operation name already ends with its kind
    pub(crate) dedupe_operation_suffix: bool,

    /// python module of a separately generated types file
    pub(crate) types_module: Option<String>,
}

impl Default for OperationsConfig {
    fn default() -> Self {
        Self {
            query_suffix: default_suffix(),
            mutation_suffix: default_suffix(),
            subscription_suffix: default_suffix(),
            schema: None,
            schema_subscriptions: None,
            header_name: None,
            header_value: None,
            generate_async: true,
            scalars: BTreeMap::new(),
            dedupe_operation_suffix: false,
            types_module: None,
        }
    }
}

impl OperationsConfig {
    /// create a configuration for an http endpoint
    ///
    /// # example
    ///
    /// ```
    /// use pygql_codegen::OperationsConfig;
    ///
    /// let config = OperationsConfig::new("https://api.example.com/graphql")
    ///     .with_header("Authorization", "Bearer token")
    ///     .with_generate_async(false);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            ..Self::default()
        }
    }

    /// set the http endpoint
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// set the websocket endpoint
    pub fn with_schema_subscriptions(mut self, schema: impl Into<String>) -> Self {
        self.schema_subscriptions = Some(schema.into());
        self
    }

    /// send a header from every generated transport
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header_name = Some(name.into());
        self.header_value = Some(value.into());
        self
    }

    /// default: `GQL`
    pub fn with_query_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.query_suffix = suffix.into();
        self
    }

    /// default: `GQL`
    pub fn with_mutation_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.mutation_suffix = suffix.into();
        self
    }

    /// default: `GQL`
    pub fn with_subscription_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.subscription_suffix = suffix.into();
        self
    }

    /// default: enabled
    pub fn with_generate_async(mut self, generate_async: bool) -> Self {
        self.generate_async = generate_async;
        self
    }

    /// map a schema scalar to a python type
    pub fn with_scalar(mut self, name: impl Into<String>, python_type: impl Into<String>) -> Self {
        self.scalars.insert(name.into(), python_type.into());
        self
    }

    /// default: disabled
    pub fn with_dedupe_operation_suffix(mut self, dedupe: bool) -> Self {
        self.dedupe_operation_suffix = dedupe;
        self
    }

    /// import input and enum types from a separate module
    pub fn with_types_module(mut self, module: impl Into<String>) -> Self {
        self.types_module = Some(module.into());
        self
    }

    /// validate the configuration
    pub fn validate(&self) -> Result<()> {
        let schema = self
            .schema
            .as_deref()
            .ok_or_else(|| Error::Config("python-operations requires a schema endpoint".to_string()))?;
        validate_endpoint(schema, &["http", "https"])?;

        if let Some(subscriptions) = &self.schema_subscriptions {
            validate_endpoint(subscriptions, &["ws", "wss", "http", "https"])?;
        }

        match (&self.header_name, &self.header_value) {
            (Some(name), _) if name.trim().is_empty() => {
                return Err(Error::Config("header name cannot be empty".to_string()));
            }
            (Some(name), None) => {
                return Err(Error::Config(format!("header {} has no value", name)));
            }
            (None, Some(_)) => {
                return Err(Error::Config("header value without a header name".to_string()));
            }
            _ => {}
        }
        if let Some(name) = self.header_name.as_deref() {
            let value = self.header_value.as_deref().unwrap_or_default();
            if name.chars().chain(value.chars()).any(char::is_control) {
                return Err(Error::Config(format!(
                    "header {} contains control characters",
                    name.escape_debug()
                )));
            }
        }

        for kind in [
            OperationKind::Query,
            OperationKind::Mutation,
            OperationKind::Subscription,
        ] {
            if self.suffix_for(kind).is_empty() {
                return Err(Error::Config(format!(
                    "{} suffix cannot be empty",
                    kind.as_str()
                )));
            }
        }

        Ok(())
    }

    /// identifier suffix for an operation kind
    pub fn suffix_for(&self, kind: OperationKind) -> &str {
        match kind {
            OperationKind::Query => &self.query_suffix,
            OperationKind::Mutation => &self.mutation_suffix,
            OperationKind::Subscription => &self.subscription_suffix,
        }
    }

    /// http endpoint
    pub(crate) fn endpoint(&self) -> Result<&str> {
        self.schema
            .as_deref()
            .ok_or_else(|| Error::Config("python-operations requires a schema endpoint".to_string()))
    }

    /// websocket endpoint, or the http endpoint with a ws scheme
    pub(crate) fn subscriptions_endpoint(&self) -> Result<String> {
        if let Some(subscriptions) = &self.schema_subscriptions {
            return Ok(subscriptions.clone());
        }

        let mut url = Url::parse(self.endpoint()?)?;
        let scheme = match url.scheme() {
            "https" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|_| Error::Config(format!("cannot derive websocket endpoint from {}", url)))?;
        Ok(url.to_string())
    }

    /// configured header pair
    pub(crate) fn header(&self) -> Option<(&str, &str)> {
        match (&self.header_name, &self.header_value) {
            (Some(name), Some(value)) => Some((name.as_str(), value.as_str())),
            _ => None,
        }
    }

    /// scalar table with configured overrides applied
    pub(crate) fn scalars(&self) -> BTreeMap<String, String> {
        build_scalars(&self.scalars)
    }

    pub(crate) fn has_schema(&self) -> bool {
        self.schema.is_some()
    }
}

fn validate_endpoint(value: &str, schemes: &[&str]) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|err| Error::Config(format!("invalid endpoint {}: {}", value, err)))?;
    if !schemes.contains(&url.scheme()) {
        return Err(Error::Config(format!(
            "invalid endpoint scheme: {}. must be one of {}",
            url.scheme(),
            schemes.join(", ")
        )));
    }
    Ok(())
}

impl fmt::Debug for OperationsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationsConfig")
            .field("query_suffix", &self.query_suffix)
            .field("mutation_suffix", &self.mutation_suffix)
            .field("subscription_suffix", &self.subscription_suffix)
            .field("schema", &self.schema)
            .field("schema_subscriptions", &self.schema_subscriptions)
            .field("header_name", &self.header_name)
            .field(
                "header_value",
                &self.header_value.as_ref().map(|_| "<redacted>"),
            )
            .field("generate_async", &self.generate_async)
            .field("scalars", &self.scalars.len())
            .field("dedupe_operation_suffix", &self.dedupe_operation_suffix)
            .field("types_module", &self.types_module)
            .finish()
    }
}

/// configuration for the `python` types plugin
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypesConfig {
    /// scalar name → python type, merged over the defaults
    pub(crate) scalars: BTreeMap<String, String>,
}

impl TypesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// map a schema scalar to a python type
    pub fn with_scalar(mut self, name: impl Into<String>, python_type: impl Into<String>) -> Self {
        self.scalars.insert(name.into(), python_type.into());
        self
    }

    pub(crate) fn scalars(&self) -> BTreeMap<String, String> {
        build_scalars(&self.scalars)
    }
}

/// plugin bound to an output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Plugin {
    #[serde(rename = "python")]
    Python,
    #[serde(rename = "python-operations")]
    PythonOperations,
}

impl Plugin {
    pub fn name(&self) -> &'static str {
        match self {
            Plugin::Python => "python",
            Plugin::PythonOperations => "python-operations",
        }
    }
}

impl fmt::Display for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// one entry of `generates`
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub plugins: Vec<Plugin>,

    /// plugin options; shared by every plugin of the output
    #[serde(default)]
    pub config: serde_yaml::Value,
}

impl OutputConfig {
    pub fn operations_config(&self) -> Result<OperationsConfig> {
        plugin_config(&self.config)
    }

    pub fn types_config(&self) -> Result<TypesConfig> {
        plugin_config(&self.config)
    }
}

fn plugin_config<T: serde::de::DeserializeOwned + Default>(value: &serde_yaml::Value) -> Result<T> {
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_yaml::from_value(value.clone())?)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<PathBuf>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(path) => vec![path],
        OneOrMany::Many(paths) => paths,
    })
}

/// `codegen.yml`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// schema file path or http(s) url
    pub schema: String,

    /// headers sent when fetching a remote schema
    #[serde(default)]
    pub schema_headers: BTreeMap<String, String>,

    /// operation document files or directories
    #[serde(default, deserialize_with = "one_or_many")]
    pub documents: Vec<PathBuf>,

    /// fragment documents available to every operation
    #[serde(default, deserialize_with = "one_or_many")]
    pub external_fragments: Vec<PathBuf>,

    /// output path → plugins, in file order
    pub generates: IndexMap<PathBuf, OutputConfig>,

    /// directory relative paths are resolved against
    #[serde(skip)]
    base_dir: PathBuf,
}

impl ProjectConfig {
    /// parse yaml text; relative paths resolve against `base_dir`
    pub fn from_yaml(text: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut config: ProjectConfig = serde_yaml::from_str(text)?;
        config.base_dir = base_dir.into();
        config.validate()?;
        Ok(config)
    }

    /// read and parse a config file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        tracing::debug!(path = %path.display(), "loaded project config");
        Self::from_yaml(&text, base_dir)
    }

    /// validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.schema.trim().is_empty() {
            return Err(Error::Config("schema cannot be empty".to_string()));
        }
        if self.generates.is_empty() {
            return Err(Error::Config("generates has no outputs".to_string()));
        }
        for (path, output) in &self.generates {
            if output.plugins.is_empty() {
                return Err(Error::Config(format!(
                    "output {} has no plugins",
                    path.display()
                )));
            }
        }
        Ok(())
    }

    /// path relative to the config file
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_defaults() {
        let config = OperationsConfig::default();
        assert_eq!(config.suffix_for(OperationKind::Query), "GQL");
        assert_eq!(config.suffix_for(OperationKind::Mutation), "GQL");
        assert_eq!(config.suffix_for(OperationKind::Subscription), "GQL");
        assert!(config.generate_async);
        assert!(!config.dedupe_operation_suffix);
        assert_eq!(config.scalars()["ID"], "str");
    }

    #[test]
    fn test_validation() {
        let config = OperationsConfig::new("https://api.example.com/graphql");
        assert!(config.validate().is_ok());

        let missing = OperationsConfig::default();
        assert!(matches!(missing.validate(), Err(Error::Config(_))));

        let bad_scheme = OperationsConfig::new("ftp://api.example.com");
        assert!(matches!(bad_scheme.validate(), Err(Error::Config(_))));

        let relative = OperationsConfig::new("/graphql");
        assert!(matches!(relative.validate(), Err(Error::Config(_))));

        let mut no_value = OperationsConfig::new("https://api.example.com/graphql");
        no_value.header_name = Some("Authorization".to_string());
        assert!(matches!(no_value.validate(), Err(Error::Config(_))));

        let multiline = OperationsConfig::new("https://api.example.com/graphql")
            .with_header("Authorization", "line1\nline2");
        assert!(matches!(multiline.validate(), Err(Error::Config(_))));

        let bad_name = OperationsConfig::new("https://api.example.com/graphql")
            .with_header("X-Key\r", "value");
        assert!(matches!(bad_name.validate(), Err(Error::Config(_))));

        let empty_suffix =
            OperationsConfig::new("https://api.example.com/graphql").with_query_suffix("");
        assert!(matches!(empty_suffix.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_subscriptions_endpoint() {
        let config = OperationsConfig::new("https://api.example.com/graphql");
        assert_eq!(
            config.subscriptions_endpoint().unwrap(),
            "wss://api.example.com/graphql"
        );

        let config = OperationsConfig::new("http://localhost:8000/graphql");
        assert_eq!(
            config.subscriptions_endpoint().unwrap(),
            "ws://localhost:8000/graphql"
        );

        let config = config.with_schema_subscriptions("ws://localhost:9000/subscriptions");
        assert_eq!(
            config.subscriptions_endpoint().unwrap(),
            "ws://localhost:9000/subscriptions"
        );
    }

    #[test]
    fn test_deserialize_camel_case() {
        let config: OperationsConfig = serde_yaml::from_str(indoc! {"
            schema: http://localhost:8000/graphql
            querySuffix: Query
            generateAsync: false
            headerName: Authorization
            headerValue: Bearer secret
            scalars:
              DateTime: datetime
        "})
        .unwrap();

        assert_eq!(config.suffix_for(OperationKind::Query), "Query");
        assert_eq!(config.suffix_for(OperationKind::Mutation), "GQL");
        assert!(!config.generate_async);
        assert_eq!(config.header(), Some(("Authorization", "Bearer secret")));
        assert_eq!(config.scalars()["DateTime"], "datetime");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_header_value() {
        let config =
            OperationsConfig::new("https://api.example.com").with_header("X-Key", "secret-value");
        let debug = format!("{config:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-value"));
    }

    #[test]
    fn test_project_config() {
        let config = ProjectConfig::from_yaml(
            indoc! {"
                schema: schema.graphql
                documents: queries
                generates:
                  out/types.py:
                    plugins: [python]
                  out/client.py:
                    plugins:
                      - python-operations
                    config:
                      schema: http://localhost:8000/graphql
                      typesModule: out.types
            "},
            "/project",
        )
        .unwrap();

        assert_eq!(config.documents, vec![PathBuf::from("queries")]);
        let outputs: Vec<_> = config.generates.keys().cloned().collect();
        assert_eq!(
            outputs,
            vec![PathBuf::from("out/types.py"), PathBuf::from("out/client.py")]
        );

        let (_, types) = config.generates.get_index(0).unwrap();
        assert_eq!(types.plugins, vec![Plugin::Python]);
        assert!(types.types_config().unwrap().scalars.is_empty());

        let (_, client) = config.generates.get_index(1).unwrap();
        let ops = client.operations_config().unwrap();
        assert_eq!(ops.types_module.as_deref(), Some("out.types"));
        assert_eq!(
            config.resolve(Path::new("schema.graphql")),
            PathBuf::from("/project/schema.graphql")
        );
    }

    #[test]
    fn test_project_config_rejects_empty_plugins() {
        let err = ProjectConfig::from_yaml(
            indoc! {"
                schema: schema.graphql
                generates:
                  out.py:
                    plugins: []
            "},
            ".",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_plugin() {
        let err = ProjectConfig::from_yaml(
            indoc! {"
                schema: schema.graphql
                generates:
                  out.py:
                    plugins: [typescript]
            "},
            ".",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }
}
