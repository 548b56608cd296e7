//! Compose file parser and normalizer
//!
//! Loads one compose document and flattens the equivalent YAML shapes
//! (short/long ports and volumes, list/map environment) into a single
//! canonical form for API consumers.

use super::config::{
    CommandSpec, ComposeDoc, EnvironmentSpec, PortSpec, ServiceSpec, VolumeSpec,
};
use crate::error::{DeckError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One normalized service extracted from a compose document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub name: String,
    pub image: Option<String>,
    /// Build context, passed through as written
    pub build: Option<serde_yaml::Value>,
    /// Always "host:container"-shaped strings
    pub ports: Vec<String>,
    /// Always "source:target"-shaped strings
    pub volumes: Vec<String>,
    /// Always "KEY=VALUE" strings
    pub environment: Vec<String>,
    pub depends_on: Option<serde_yaml::Value>,
    pub networks: Option<serde_yaml::Value>,
    pub command: Option<serde_yaml::Value>,
    pub restart: Option<String>,
}

/// Parse result for one compose file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeFileDetails {
    pub version: Option<String>,
    /// Services in declaration order
    pub services: Vec<ServiceDefinition>,
    /// Top-level network names
    pub networks: Vec<String>,
    /// Top-level volume names
    pub volumes: Vec<String>,
    /// Raw source text, for display
    pub raw: String,
}

/// Compose file parser
pub struct ComposeParser;

impl ComposeParser {
    /// Parse a compose file from disk
    pub fn parse_file(path: &Path) -> Result<ComposeFileDetails> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DeckError::ComposeParse(format!("Failed to read file: {}", e)))?;

        Self::parse_str(&content)
    }

    /// Parse a compose document from its source text
    pub fn parse_str(content: &str) -> Result<ComposeFileDetails> {
        let doc: ComposeDoc = serde_yaml::from_str(content)
            .map_err(|e| DeckError::ComposeParse(format!("Failed to parse YAML: {}", e)))?;

        let services = doc
            .services
            .iter()
            .map(|(name, spec)| normalize_service(name, spec))
            .collect();

        Ok(ComposeFileDetails {
            version: doc.version,
            services,
            networks: doc.networks.keys().cloned().collect(),
            volumes: doc.volumes.keys().cloned().collect(),
            raw: content.to_string(),
        })
    }
}

/// Flatten one service entry into its canonical form
fn normalize_service(name: &str, spec: &ServiceSpec) -> ServiceDefinition {
    let ports = spec
        .ports
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(normalize_port)
        .collect();

    let volumes = spec
        .volumes
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(normalize_volume)
        .collect();

    let environment = match &spec.environment {
        Some(EnvironmentSpec::List(entries)) => entries.clone(),
        Some(EnvironmentSpec::Map(map)) => map
            .iter()
            .map(|(key, value)| match value {
                Some(v) => format!("{}={}", key, scalar_to_string(v)),
                None => format!("{}=", key),
            })
            .collect(),
        None => Vec::new(),
    };

    let command = spec.command.as_ref().map(|c| match c {
        CommandSpec::Shell(s) => serde_yaml::Value::String(s.clone()),
        CommandSpec::Exec(parts) => serde_yaml::Value::Sequence(
            parts
                .iter()
                .map(|p| serde_yaml::Value::String(p.clone()))
                .collect(),
        ),
    });

    ServiceDefinition {
        name: name.to_string(),
        image: spec.image.clone(),
        build: spec.build.clone(),
        ports,
        volumes,
        environment,
        depends_on: spec.depends_on.clone(),
        networks: spec.networks.clone(),
        command,
        restart: spec.restart.clone(),
    }
}

fn normalize_port(port: &PortSpec) -> String {
    match port {
        PortSpec::Short(s) => s.clone(),
        PortSpec::Number(n) => n.to_string(),
        PortSpec::Long(long) => {
            let published = long
                .published_side()
                .map(scalar_to_string)
                .unwrap_or_default();
            let target = long.target_side().map(scalar_to_string).unwrap_or_default();
            format!("{}:{}", published, target)
        }
        PortSpec::Other(value) => scalar_to_string(value),
    }
}

fn normalize_volume(volume: &VolumeSpec) -> String {
    match volume {
        VolumeSpec::Short(s) => s.clone(),
        VolumeSpec::Long(long) => format!(
            "{}:{}",
            long.source.as_deref().unwrap_or_default(),
            long.target.as_deref().unwrap_or_default()
        ),
        VolumeSpec::Other(value) => scalar_to_string(value),
    }
}

/// Render a YAML value as a plain string, without quoting scalars
fn scalar_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
