//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{ConfigurationDescriptor, HostConfig};
use crate::dispatch::{Dispatcher, ProtocolRequest, SearchRequest};
use crate::error::{Error, Result, ResultExt};
use crate::filter::Filter;
use crate::inject::Deployment;
use crate::ldap::{Dn, Entry};
use crate::properties::names::CUSTOM_DATASOURCE_PROPERTIES;
use crate::properties::{DatasourcePropertySource, PropertySource};
use crate::sample;
use crate::schema::{build_schema, load_entities_from_file};
use crate::types::SearchScope;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tracing::debug;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::ValidateConfig => self.validate_config(),
            Commands::Schema {
                entities,
                property_sets,
            } => self.schema(entities, *property_sets),
            Commands::Filter {
                filter,
                entry_json,
                dn,
            } => self.filter(filter, entry_json.as_deref(), dn),
            Commands::Search {
                base,
                scope,
                filter,
                attributes,
                size_limit,
            } => {
                self.search(base, *scope, filter, attributes, *size_limit)
                    .await
            }
            Commands::Dispatch { request_json } => self.dispatch(request_json).await,
        }
    }

    // ========================================================================
    // Inputs
    // ========================================================================

    /// Load the configuration descriptor
    fn load_descriptor(&self) -> Result<ConfigurationDescriptor> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Configuration descriptor not specified (use -C flag)"))?;
        ConfigurationDescriptor::from_file(path)
    }

    /// Load datasource property values, `None` if none were given
    fn load_properties(&self) -> Result<Option<Value>> {
        // Inline values take precedence
        if let Some(json_str) = &self.cli.properties_json {
            return serde_json::from_str(json_str)
                .map(Some)
                .map_err(|e| Error::config(format!("Invalid properties JSON: {e}")));
        }

        if let Some(path) = &self.cli.properties {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read properties file '{}'", path.display()))?;
            return serde_json::from_str(&content)
                .map(Some)
                .map_err(|e| Error::config(format!("Invalid properties JSON: {e}")));
        }

        Ok(None)
    }

    fn load_host_config(&self) -> Result<HostConfig> {
        match &self.cli.host_config {
            Some(path) => HostConfig::from_file(path),
            None => Ok(HostConfig::default()),
        }
    }

    /// Deploy the sample connector with the given or default datasource values
    fn deploy_sample(&self) -> Result<Deployment> {
        let values = self
            .load_properties()?
            .unwrap_or_else(sample::default_datasource);
        sample::deploy(values)
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Validate a configuration descriptor
    fn validate_config(&self) -> Result<()> {
        let descriptor = self.load_descriptor()?;
        descriptor.validate()?;

        let mut result = json!({
            "type": "CONFIG",
            "config": {
                "name": descriptor.name,
                "properties": descriptor.meta.len(),
                "required": descriptor.required_properties(),
            }
        });

        if let Some(values) = self.load_properties()? {
            let source = DatasourcePropertySource::from_json(descriptor, values)?;
            let set = source
                .property_set(CUSTOM_DATASOURCE_PROPERTIES)?
                .ok_or_else(|| Error::config("Datasource produced no custom properties"))?;
            let resolved: serde_json::Map<String, Value> = set
                .iter()
                .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
                .collect();
            result["config"]["resolved"] = Value::Object(resolved);
        }

        self.output_message(&result);
        Ok(())
    }

    /// Build and print a schema
    fn schema(&self, entities: &Path, property_sets: bool) -> Result<()> {
        let declarations = load_entities_from_file(entities)?;
        let schema = build_schema(&declarations)?;

        let mut result = json!({
            "type": "SCHEMA",
            "schema": schema.to_json()?,
        });
        if property_sets {
            let sets: serde_json::Map<String, Value> = schema
                .to_property_sets()
                .iter()
                .map(|set| {
                    let values: serde_json::Map<String, Value> = set
                        .iter()
                        .map(|(key, value)| {
                            let value = value
                                .as_list()
                                .map_or_else(|| json!(value.to_string()), |list| json!(list));
                            (key.to_string(), value)
                        })
                        .collect();
                    (set.name().to_string(), Value::Object(values))
                })
                .collect();
            result["propertySets"] = Value::Object(sets);
        }

        self.output_message(&result);
        Ok(())
    }

    /// Parse a filter, optionally evaluating it against an entry
    fn filter(&self, text: &str, entry_json: Option<&str>, dn: &str) -> Result<()> {
        let filter = Filter::parse(text)?;
        let mut result = json!({
            "type": "FILTER",
            "filter": {
                "original": filter.to_string(),
                "canonical": filter.to_canonical_string(),
            }
        });

        if let Some(entry_json) = entry_json {
            let attributes: Value = serde_json::from_str(entry_json)
                .map_err(|e| Error::config(format!("Invalid entry JSON: {e}")))?;
            let entry = Entry::from_json(Dn::parse(dn)?, &attributes)?;
            result["filter"]["matches"] = json!(filter.matches(&entry));
        }

        self.output_message(&result);
        Ok(())
    }

    /// Search the sample directory through the dispatcher
    async fn search(
        &self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[String],
        size_limit: Option<usize>,
    ) -> Result<()> {
        let mut request = SearchRequest::new(base, filter)
            .with_scope(scope)
            .with_attributes(attributes);
        if let Some(limit) = size_limit {
            request = request.with_size_limit(limit);
        }
        self.send(ProtocolRequest::Search(request)).await
    }

    /// Send a raw protocol request to the sample connector
    async fn dispatch(&self, request_json: &str) -> Result<()> {
        let request: ProtocolRequest = serde_json::from_str(request_json)
            .map_err(|e| Error::config(format!("Invalid request JSON: {e}")))?;
        self.send(request).await
    }

    async fn send(&self, request: ProtocolRequest) -> Result<()> {
        let host_config = self.load_host_config()?;
        let deployment = self.deploy_sample()?;
        let dispatcher = Dispatcher::new(host_config.dispatch);

        debug!(operation = %request.kind(), target = %request.target(), "Sending request");
        let response = dispatcher.dispatch(&deployment, request).await;
        self.output_message(&json!({
            "type": "RESPONSE",
            "resultCode": response.result_code().code(),
            "response": response,
        }));
        Ok(())
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Output a JSON message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}
