//! Serde schema for PDU descriptions.
//!
//! ```toml
//! [pdus.rack-a]
//! driver = "dummy"
//! reserved_port_ids = [0, "uplink"]
//!
//! [pdus.rack-a.config]
//! min_off_time = 10.0
//! ports = ["switch", "dut-1", { id = "7", label = "dut-7", min_off_time = 3.0 }]
//! ```

use pdu_core::{PduError, PduResult, PortId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// One PDU as written in an inventory file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PduConfig {
    /// Driver name resolved against the registry
    pub driver: String,

    /// Driver-specific settings; the PDU layer itself reads `ports` and
    /// `min_off_time` from here
    #[serde(default = "empty_table")]
    pub config: toml::Value,

    /// Ports that must never be switched by automation
    #[serde(default)]
    pub reserved_port_ids: Vec<PortId>,
}

/// Every PDU known to an executor, keyed by PDU name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    /// PDU descriptions by name
    #[serde(default)]
    pub pdus: BTreeMap<String, PduConfig>,
}

/// One entry of a driver config's `ports` list.
///
/// A bare string is a label; its id is the entry's position in the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortSpec {
    /// Label only; id is the list index
    Label(String),
    /// Explicit id with optional label and debounce override
    Detailed {
        /// Outlet id
        id: PortId,
        /// Human-readable label, defaults to the id
        #[serde(default)]
        label: Option<String>,
        /// Per-port minimum off time in seconds
        #[serde(default)]
        min_off_time: Option<f64>,
    },
}

/// Port entry after index assignment and validation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedPort {
    pub id: PortId,
    pub label: String,
    pub min_off_time: Option<Duration>,
}

pub(crate) fn empty_table() -> toml::Value {
    toml::Value::Table(toml::map::Map::new())
}

/// Interpret a TOML number (integer or float) as a non-negative duration in seconds.
pub(crate) fn seconds_value(value: &toml::Value, field: &str) -> PduResult<Duration> {
    let secs = match value {
        toml::Value::Integer(n) => *n as f64,
        toml::Value::Float(f) => *f,
        other => {
            return Err(PduError::Configuration(format!(
                "'{}' must be a number of seconds, got {}",
                field,
                other.type_str()
            )))
        }
    };
    seconds(secs, field)
}

pub(crate) fn seconds(secs: f64, field: &str) -> PduResult<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|_| {
        PduError::Configuration(format!(
            "'{}' must be a finite, non-negative number of seconds, got {}",
            field, secs
        ))
    })
}

/// Read `config.ports` into resolved port entries.
pub(crate) fn resolve_ports(config: &toml::Value) -> PduResult<Vec<ResolvedPort>> {
    let Some(raw) = config.get("ports") else {
        return Ok(Vec::new());
    };

    let specs: Vec<PortSpec> = raw
        .clone()
        .try_into()
        .map_err(|e| PduError::Configuration(format!("Invalid 'ports' list: {}", e)))?;

    let mut resolved: Vec<ResolvedPort> = Vec::with_capacity(specs.len());
    for (index, spec) in specs.into_iter().enumerate() {
        let port = match spec {
            PortSpec::Label(label) => ResolvedPort {
                id: PortId::from(index),
                label,
                min_off_time: None,
            },
            PortSpec::Detailed {
                id,
                label,
                min_off_time,
            } => ResolvedPort {
                label: label.unwrap_or_else(|| id.to_string()),
                min_off_time: min_off_time
                    .map(|secs| seconds(secs, "min_off_time"))
                    .transpose()?,
                id,
            },
        };
        if resolved.iter().any(|p| p.id == port.id) {
            return Err(PduError::Configuration(format!(
                "Duplicate port id '{}' in 'ports' list",
                port.id
            )));
        }
        resolved.push(port);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> toml::Value {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn test_labels_get_index_ids() {
        let ports = resolve_ports(&parse(r#"ports = ["switch", "dut-1"]"#)).unwrap();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].id, PortId::from(0u8));
        assert_eq!(ports[0].label, "switch");
        assert_eq!(ports[1].id, PortId::from("1"));
        assert_eq!(ports[1].min_off_time, None);
    }

    #[test]
    fn test_detailed_entries() {
        let ports = resolve_ports(&parse(
            r#"ports = [{ id = 7, label = "dut-7", min_off_time = 3 }, { id = "aux" }]"#,
        ))
        .unwrap();
        assert_eq!(ports[0].id, PortId::from("7"));
        assert_eq!(ports[0].min_off_time, Some(Duration::from_secs(3)));
        assert_eq!(ports[1].label, "aux");
    }

    #[test]
    fn test_missing_ports_is_empty() {
        assert!(resolve_ports(&empty_table()).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = resolve_ports(&parse(r#"ports = ["a", { id = 0, label = "b" }]"#)).unwrap_err();
        assert!(err.to_string().contains("Duplicate port id '0'"));
    }

    #[test]
    fn test_negative_seconds_rejected() {
        let err = seconds_value(&toml::Value::Float(-1.0), "min_off_time").unwrap_err();
        assert!(matches!(err, PduError::Configuration(_)));
        assert!(seconds_value(&toml::Value::String("5".into()), "min_off_time").is_err());
    }

    #[test]
    fn test_pdu_config_defaults() {
        let cfg: PduConfig = toml::from_str(r#"driver = "dummy""#).unwrap();
        assert_eq!(cfg.config, empty_table());
        assert!(cfg.reserved_port_ids.is_empty());
    }
}
