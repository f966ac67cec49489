use crate::canonical::Canonical;
use crate::manifest::nullable;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Execution, networking, and volume parameters for a container.
///
/// `ports`, `volumes`, and `environment` have set semantics: their order never
/// affects the canonical form. `entrypoint` and `command` are argument vectors
/// and keep their order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeParams {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub cpu_shares: u64,
    #[serde(default)]
    pub memory: u64,
    #[serde(default)]
    pub memory_swap: u64,
    #[serde(default)]
    pub working_directory: String,
    #[serde(default, deserialize_with = "nullable")]
    pub ports: Vec<PortSpec>,
    #[serde(default, deserialize_with = "nullable")]
    pub volumes: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub entrypoint: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub command: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub environment: BTreeMap<String, String>,
}

/// A port a container runtime should expose to the container's network.
///
/// Compared byte-for-byte; no normalization of protocol names or port syntax.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PortSpec {
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub port: String,
}

impl PortSpec {
    pub fn new(protocol: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            port: port.into(),
        }
    }

    /// Canonical port ordering: port ascending, then protocol.
    ///
    /// Ports made only of ASCII digits compare by numeric value and sort before
    /// any other port string; everything else compares byte-wise.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        port_rank(&self.port)
            .cmp(&port_rank(&other.port))
            .then_with(|| self.port.cmp(&other.port))
            .then_with(|| self.protocol.cmp(&other.protocol))
    }
}

fn port_rank(port: &str) -> (u8, u64) {
    let numeric = !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit());
    match port.parse::<u64>() {
        Ok(n) if numeric => (0, n),
        _ => (1, 0),
    }
}

impl RuntimeParams {
    /// Ports with duplicates removed, in canonical order.
    pub fn normalized_ports(&self) -> Vec<PortSpec> {
        let mut ports = self.ports.clone();
        ports.sort_by(PortSpec::canonical_cmp);
        ports.dedup();
        ports
    }

    /// Volumes in byte-wise order. Duplicates are kept.
    pub fn normalized_volumes(&self) -> Vec<String> {
        let mut volumes = self.volumes.clone();
        volumes.sort();
        volumes
    }
}

impl Canonical for RuntimeParams {
    fn canonical_values(&self) -> Vec<String> {
        let ports = self.normalized_ports();
        let volumes = self.normalized_volumes();

        let mut values = Vec::with_capacity(
            6 + 2 * ports.len()
                + volumes.len()
                + self.entrypoint.len()
                + self.command.len()
                + 2 * self.environment.len(),
        );

        values.extend([
            self.user.clone(),
            self.group.clone(),
            self.cpu_shares.to_string(),
            self.memory.to_string(),
            self.memory_swap.to_string(),
            self.working_directory.clone(),
        ]);

        for port in ports {
            values.push(port.port);
            values.push(port.protocol);
        }

        values.extend(volumes);
        values.extend(self.entrypoint.iter().cloned());
        values.extend(self.command.iter().cloned());

        // BTreeMap iterates keys in byte-wise order.
        for (name, value) in &self.environment {
            values.push(name.clone());
            values.push(value.clone());
        }

        values
    }
}
