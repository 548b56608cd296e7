//! Raw docker-compose document types
//!
//! Serde model for the YAML shapes the compose format allows. Fields that
//! the format lets authors write in two equivalent forms (ports, volumes,
//! environment, command) are decoded into untagged variants so the parser
//! can normalize them without guessing at runtime types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A compose document as written on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposeDoc {
    /// Compose file version (optional since the v2 spec)
    #[serde(default)]
    pub version: Option<String>,
    /// Services, in declaration order
    #[serde(default)]
    pub services: IndexMap<String, ServiceSpec>,
    /// Top-level network declarations
    #[serde(default)]
    pub networks: IndexMap<String, serde_yaml::Value>,
    /// Top-level volume declarations
    #[serde(default)]
    pub volumes: IndexMap<String, serde_yaml::Value>,
}

/// One service entry in a compose document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(default)]
    pub image: Option<String>,
    /// Build context, either a path string or a full mapping
    #[serde(default)]
    pub build: Option<serde_yaml::Value>,
    #[serde(default)]
    pub ports: Option<Vec<PortSpec>>,
    #[serde(default)]
    pub volumes: Option<Vec<VolumeSpec>>,
    #[serde(default)]
    pub environment: Option<EnvironmentSpec>,
    /// Dependency list or map, kept as written
    #[serde(default)]
    pub depends_on: Option<serde_yaml::Value>,
    /// Network list or map, kept as written
    #[serde(default)]
    pub networks: Option<serde_yaml::Value>,
    #[serde(default)]
    pub command: Option<CommandSpec>,
    #[serde(default)]
    pub restart: Option<String>,
}

/// Port mapping, short or long syntax
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortSpec {
    /// Short syntax: "8080:80"
    Short(String),
    /// Bare port numbers are valid YAML here too
    Number(i64),
    /// Long syntax
    Long(PortSpecLong),
    /// Anything else the format may grow
    Other(serde_yaml::Value),
}

/// Long port mapping
///
/// Unknown keys are rejected so unrelated mappings fall through to
/// `PortSpec::Other` and get stringified instead of silently matching.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortSpecLong {
    /// Published port on the host ("published" in the spec, "host" in the wild)
    #[serde(default)]
    pub published: Option<serde_yaml::Value>,
    #[serde(default)]
    pub host: Option<serde_yaml::Value>,
    /// Target port in the container ("target", or "container" in the wild)
    #[serde(default)]
    pub target: Option<serde_yaml::Value>,
    #[serde(default)]
    pub container: Option<serde_yaml::Value>,
    #[serde(default)]
    pub host_ip: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl PortSpecLong {
    /// Host-side value, whichever key the author used
    pub fn published_side(&self) -> Option<&serde_yaml::Value> {
        self.published.as_ref().or(self.host.as_ref())
    }

    /// Container-side value, whichever key the author used
    pub fn target_side(&self) -> Option<&serde_yaml::Value> {
        self.target.as_ref().or(self.container.as_ref())
    }
}

/// Volume mount, short or long syntax
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VolumeSpec {
    /// Short syntax: "host:container:mode"
    Short(String),
    /// Long syntax
    Long(VolumeSpecLong),
    /// Anything else
    Other(serde_yaml::Value),
}

/// Long volume mount
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VolumeSpecLong {
    /// Mount type (volume, bind, tmpfs)
    #[serde(rename = "type", default)]
    pub mount_type: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub read_only: Option<bool>,
    #[serde(default)]
    pub bind: Option<serde_yaml::Value>,
    #[serde(default)]
    pub volume: Option<serde_yaml::Value>,
    #[serde(default)]
    pub tmpfs: Option<serde_yaml::Value>,
    #[serde(default)]
    pub consistency: Option<String>,
}

/// Environment, list or map syntax
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvironmentSpec {
    /// Array of KEY=value strings
    List(Vec<String>),
    /// Map of key to value, in declaration order
    Map(IndexMap<String, Option<serde_yaml::Value>>),
}

/// Command, shell string or exec array
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandSpec {
    /// Shell form
    Shell(String),
    /// Exec form
    Exec(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_long_field_aliases() {
        let yaml = r#"
published: 8080
target: 80
"#;
        let port: PortSpecLong = serde_yaml::from_str(yaml).unwrap();
        assert!(port.published_side().is_some());
        assert!(port.target_side().is_some());

        let yaml = r#"
host: 8080
container: 80
"#;
        let port: PortSpecLong = serde_yaml::from_str(yaml).unwrap();
        assert!(port.published_side().is_some());
        assert!(port.target_side().is_some());
    }

    #[test]
    fn test_environment_both_shapes() {
        let list: EnvironmentSpec = serde_yaml::from_str("- FOO=bar").unwrap();
        assert!(matches!(list, EnvironmentSpec::List(_)));

        let map: EnvironmentSpec = serde_yaml::from_str("FOO: bar").unwrap();
        assert!(matches!(map, EnvironmentSpec::Map(_)));
    }

    #[test]
    fn test_doc_without_services() {
        let doc: ComposeDoc = serde_yaml::from_str("version: \"3.8\"").unwrap();
        assert!(doc.services.is_empty());
    }
}
