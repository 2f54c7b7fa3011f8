//! operations module emitter
//!
//! renders the `python-operations` output: imports, helpers, client
//! factories, then per operation a query constant, the response
//! declaration, and the call wrappers.

use crate::compiler::SelectionCompiler;
use crate::config::OperationsConfig;
use crate::document::{
    operation_name, operations, print_operation, variable_definitions, FragmentRegistry,
    OperationKind,
};
use crate::error::Result;
use crate::field_type::{base_type_name, TypeResolver};
use crate::naming::{Keywords, NameConverter, PascalCase};
use crate::schema::SchemaContext;
use graphql_parser::query::{Document, OperationDefinition};

const REMOVE_EMPTY: &str = r#"def remove_empty(value: Any) -> Any:
    if isinstance(value, dict):
        pruned = {k: remove_empty(v) for k, v in value.items()}
        return {k: v for k, v in pruned.items() if v != {} and v != []}
    if isinstance(value, list):
        pruned = [remove_empty(v) for v in value]
        return [v for v in pruned if v != {} and v != []]
    return value
"#;

const SERIALIZE: &str = r#"def _serialize(value: Any) -> Any:
    if isinstance(value, Enum):
        return value.value
    if is_dataclass(value):
        return {k: _serialize(v) for k, v in asdict(value).items() if v is not None}
    if isinstance(value, dict):
        return {k: _serialize(v) for k, v in value.items()}
    if isinstance(value, list):
        return [_serialize(v) for v in value]
    return value
"#;

const SUBSCRIPTION_CLIENT: &str = r#"class _SubscriptionClient:
    def __init__(self, url: str, headers: Dict[str, str]) -> None:
        self.url = url
        self.headers = headers

    def call(
        self, query: str, variables: Dict[str, Any], operation_name: str
    ) -> Generator[Dict[str, Any], None, None]:
        ws = websocket.create_connection(
            self.url,
            subprotocols=["graphql-ws"],
            header=[f"{k}: {v}" for k, v in self.headers.items()],
        )
        try:
            ws.send(json.dumps({"type": "connection_init", "payload": {}}))
            while True:
                message = json.loads(ws.recv())
                if message["type"] == "connection_ack":
                    break
                if message["type"] == "connection_error":
                    raise Exception(message.get("payload"))
            ws.send(
                json.dumps(
                    {
                        "id": "1",
                        "type": "start",
                        "payload": {
                            "query": query,
                            "variables": variables,
                            "operationName": operation_name,
                        },
                    }
                )
            )
            while True:
                message = json.loads(ws.recv())
                if message["type"] == "data":
                    yield message["payload"]["data"]
                elif message["type"] == "error":
                    raise Exception(message.get("payload"))
                elif message["type"] == "complete":
                    break
        finally:
            ws.close()
"#;

const DECODE_CONFIG: &str = "Config(cast=[Enum], check_types=False)";

/// one rendered operation variable
#[derive(Debug, Clone, PartialEq, Eq)]
struct Argument {
    /// graphql variable name
    key: String,
    /// `name: Type` or `name: Optional[Type] = None`
    signature: String,
    /// python expression sent as the variable value
    value: String,
}

/// the `python-operations` plugin
pub struct OperationsPlugin<'c> {
    config: &'c OperationsConfig,
    names: &'c dyn NameConverter,
    keywords: Keywords,
}

impl<'c> OperationsPlugin<'c> {
    pub fn new(config: &'c OperationsConfig) -> Self {
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

    /// render the module for every named operation in `documents`
    pub fn generate<'d>(
        &self,
        schema: &SchemaContext<'_>,
        documents: &'d [Document<'d, String>],
        fragments: &FragmentRegistry<'d>,
    ) -> Result<String> {
        self.config.validate()?;

        let mut resolver = TypeResolver::new(schema, self.config.scalars(), self.names);
        if self.config.types_module.is_some() {
            resolver = resolver.with_namespace("Types.");
        }
        let compiler = SelectionCompiler::new(&resolver, fragments, self.names, &self.keywords);

        let mut chunks = vec![
            self.render_imports(),
            REMOVE_EMPTY.to_string(),
            SERIALIZE.to_string(),
        ];
        chunks.extend(self.render_clients()?);

        for op in operations(documents) {
            let Some(name) = operation_name(op) else {
                tracing::debug!("skipping anonymous operation");
                continue;
            };
            tracing::debug!(operation = name, kind = OperationKind::of(op).as_str(), "compiling operation");
            chunks.extend(self.render_operation(op, name, &resolver, &compiler, fragments)?);
        }

        let chunks: Vec<&str> = chunks.iter().map(|chunk| chunk.trim_end()).collect();
        Ok(format!("{}\n", chunks.join("\n\n\n")))
    }

    /// `<converted name>_<suffix>`, lower-cased
    pub fn identifier(&self, name: &str, kind: OperationKind) -> String {
        let base = self.names.convert_name(name);
        let suffix = self.config.suffix_for(kind);
        let dedupe = self.config.dedupe_operation_suffix
            && name.to_lowercase().ends_with(kind.as_str());

        if dedupe || suffix.is_empty() {
            base.to_lowercase()
        } else {
            format!("{}_{}", base, suffix).to_lowercase()
        }
    }

    fn render_imports(&self) -> String {
        let generate_async = self.config.generate_async;
        let mut out = String::new();
        if !generate_async {
            out.push_str("import json\n");
        }
        out.push_str("from dataclasses import asdict, dataclass, is_dataclass\n");
        out.push_str("from enum import Enum\n");
        out.push_str(
            "from typing import Any, AsyncGenerator, Dict, Generator, List, Optional, Union\n",
        );
        out.push('\n');
        out.push_str("from dacite import Config, from_dict\n");
        out.push_str("from gql import Client, gql\n");
        if generate_async {
            out.push_str("from gql.transport.aiohttp import AIOHTTPTransport\n");
        }
        out.push_str("from gql.transport.requests import RequestsHTTPTransport\n");
        if generate_async {
            out.push_str("from gql.transport.websockets import WebsocketsTransport\n");
        } else {
            out.push_str("import websocket\n");
        }
        if let Some(module) = &self.config.types_module {
            out.push('\n');
            out.push_str(&format!("import {} as Types\n", module));
        }
        out
    }

    fn render_clients(&self) -> Result<Vec<String>> {
        let url = python_string(self.config.endpoint()?);
        let ws_url = python_string(&self.config.subscriptions_endpoint()?);
        let headers = self.headers_literal();

        let client = |name: &str, transport: &str, url: &str| {
            format!(
                "def {name}() -> Client:\n    \
                 transport = {transport}(url={url}, headers={headers})\n    \
                 return Client(transport=transport, fetch_schema_from_transport=False)\n"
            )
        };

        let mut chunks = vec![client("_get_client_sync", "RequestsHTTPTransport", &url)];
        if self.config.generate_async {
            chunks.push(client("_get_client_async", "AIOHTTPTransport", &url));
            chunks.push(client(
                "_get_client_subscriptions",
                "WebsocketsTransport",
                &ws_url,
            ));
        } else {
            chunks.push(SUBSCRIPTION_CLIENT.to_string());
            chunks.push(format!(
                "def _get_client_subscriptions() -> _SubscriptionClient:\n    \
                 return _SubscriptionClient(url={ws_url}, headers={headers})\n"
            ));
        }
        Ok(chunks)
    }

    fn headers_literal(&self) -> String {
        match self.config.header() {
            Some((name, value)) => format!("{{{}: {}}}", python_string(name), python_string(value)),
            None => "{}".to_string(),
        }
    }

    fn render_operation<'d>(
        &self,
        op: &'d OperationDefinition<'d, String>,
        name: &str,
        resolver: &TypeResolver<'_, '_>,
        compiler: &SelectionCompiler<'_, '_, 'd>,
        fragments: &FragmentRegistry<'d>,
    ) -> Result<Vec<String>> {
        let kind = OperationKind::of(op);
        let id = self.identifier(name, kind);
        let query = print_operation(op, fragments)?;
        let response = compiler.compile_operation(op)?;
        let arguments = self.render_arguments(op, resolver)?;

        let sync_subscription = kind == OperationKind::Subscription && !self.config.generate_async;
        let constant = if sync_subscription {
            format!("_gql_{id} = \"\"\"\n{query}\n\"\"\"\n")
        } else {
            format!("_gql_{id} = gql(\"\"\"\n{query}\n\"\"\")\n")
        };

        let mut chunks = vec![constant, response.render()];
        let call = CallWrapper {
            id: &id,
            operation: name,
            response: &response.name,
            arguments: &arguments,
        };
        match kind {
            OperationKind::Query | OperationKind::Mutation => {
                chunks.push(call.execute_sync());
                if self.config.generate_async {
                    chunks.push(call.execute_async());
                }
            }
            OperationKind::Subscription => {
                if self.config.generate_async {
                    chunks.push(call.subscribe_async());
                } else {
                    chunks.push(call.subscribe_sync());
                }
            }
        }
        Ok(chunks)
    }

    fn render_arguments(
        &self,
        op: &OperationDefinition<'_, String>,
        resolver: &TypeResolver<'_, '_>,
    ) -> Result<Vec<Argument>> {
        let mut arguments = Vec::new();
        for var in variable_definitions(op) {
            let field_type = resolver.resolve(&var.var_type, var.default_value.is_some())?;
            let name = self.keywords.escape(&var.name);
            let ty = field_type.format("List");

            let signature = if field_type.is_outer_required() {
                format!("{}: {}", name, ty)
            } else if field_type.list_layers.is_empty() && field_type.base.is_value_type {
                format!("{}: {} = None", name, ty)
            } else {
                format!("{}: Optional[{}] = None", name, ty)
            };

            let value = if resolver.schema().is_scalar(base_type_name(&var.var_type)) {
                name.clone()
            } else {
                format!("_serialize({})", name)
            };

            arguments.push(Argument {
                key: var.name.clone(),
                signature,
                value,
            });
        }
        Ok(arguments)
    }
}

/// call wrapper text for one operation
struct CallWrapper<'w> {
    id: &'w str,
    operation: &'w str,
    response: &'w str,
    arguments: &'w [Argument],
}

impl CallWrapper<'_> {
    fn parameters(&self) -> String {
        if self.arguments.is_empty() {
            return String::new();
        }
        let signatures: Vec<&str> = self
            .arguments
            .iter()
            .map(|arg| arg.signature.as_str())
            .collect();
        format!("*, {}", signatures.join(", "))
    }

    fn variables(&self) -> String {
        let mut out = String::new();
        if self.arguments.is_empty() {
            out.push_str("    variables: Dict[str, Any] = {}\n");
        } else {
            out.push_str("    variables: Dict[str, Any] = {\n");
            for arg in self.arguments {
                out.push_str(&format!("        {}: {},\n", python_string(&arg.key), arg.value));
            }
            out.push_str("    }\n");
        }
        out.push_str("    variables_no_none = {k: v for k, v in variables.items() if v is not None}\n");
        out
    }

    fn decode(&self) -> String {
        format!(
            "from_dict(data_class={}, data=response_dict, config={})",
            self.response, DECODE_CONFIG
        )
    }

    fn execute_sync(&self) -> String {
        let mut out = format!(
            "def execute_{}({}) -> {}:\n",
            self.id,
            self.parameters(),
            self.response
        );
        out.push_str(&self.variables());
        out.push_str("    client = _get_client_sync()\n");
        out.push_str(&format!(
            "    response_dict = client.execute(_gql_{}, variable_values=variables_no_none)\n",
            self.id
        ));
        out.push_str("    response_dict = remove_empty(response_dict)\n");
        out.push_str(&format!("    return {}\n", self.decode()));
        out
    }

    fn execute_async(&self) -> String {
        let mut out = format!(
            "async def execute_async_{}({}) -> {}:\n",
            self.id,
            self.parameters(),
            self.response
        );
        out.push_str(&self.variables());
        out.push_str("    client = _get_client_async()\n");
        out.push_str(&format!(
            "    response_dict = await client.execute_async(_gql_{}, variable_values=variables_no_none)\n",
            self.id
        ));
        out.push_str("    response_dict = remove_empty(response_dict)\n");
        out.push_str(&format!("    return {}\n", self.decode()));
        out
    }

    fn subscribe_async(&self) -> String {
        let mut out = format!(
            "async def subscribe_{}({}) -> AsyncGenerator[{}, None]:\n",
            self.id,
            self.parameters(),
            self.response
        );
        out.push_str(&self.variables());
        out.push_str("    client = _get_client_subscriptions()\n");
        out.push_str("    async with client as session:\n");
        out.push_str(&format!(
            "        async for response_dict in session.subscribe(_gql_{}, variable_values=variables_no_none):\n",
            self.id
        ));
        out.push_str("            response_dict = remove_empty(response_dict)\n");
        out.push_str(&format!("            yield {}\n", self.decode()));
        out
    }

    fn subscribe_sync(&self) -> String {
        let mut out = format!(
            "def subscribe_{}({}) -> Generator[{}, None, None]:\n",
            self.id,
            self.parameters(),
            self.response
        );
        out.push_str(&self.variables());
        out.push_str("    client = _get_client_subscriptions()\n");
        out.push_str(&format!(
            "    for response_dict in client.call(_gql_{}, variables=variables_no_none, operation_name={}):\n",
            self.id,
            python_string(self.operation)
        ));
        out.push_str("        response_dict = remove_empty(response_dict)\n");
        out.push_str(&format!("        yield {}\n", self.decode()));
        out
    }
}

/// double-quoted python string literal
fn python_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}
