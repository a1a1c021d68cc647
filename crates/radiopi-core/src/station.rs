//! Station catalog.
//!
//! The catalog is the DAB scan document written by `radio_cli`: a list of
//! ensembles, each carrying services, each carrying components.  Every
//! (ensemble, service, component) triple becomes one tunable [`Station`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{RadioError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Station {
    pub frequency_index: u32,
    pub service_id: u32,
    pub component_id: u32,
    /// Display label.  Several components of one service share it.
    pub label: String,
}

// ── scan document schema ──────────────────────────────────────────────────────

/// Intermediate structs that match the scan JSON.  Nested lists are optional so
/// that a missing or `null` list reads as empty rather than failing the load.
#[derive(Debug, Deserialize)]
struct ScanDocument {
    #[serde(rename = "ensembleList", default)]
    ensembles: Option<Vec<ScanEnsemble>>,
}

#[derive(Debug, Deserialize)]
struct ScanEnsemble {
    #[serde(rename = "EnsembleNo")]
    index: u32,
    #[serde(rename = "DigitalServiceList", default)]
    services: Option<ScanServiceList>,
}

#[derive(Debug, Deserialize)]
struct ScanServiceList {
    #[serde(rename = "ServiceList", default)]
    services: Option<Vec<ScanService>>,
}

#[derive(Debug, Deserialize)]
struct ScanService {
    #[serde(rename = "ServId")]
    id: u32,
    #[serde(rename = "Label", default)]
    label: String,
    #[serde(rename = "ComponentList", default)]
    components: Option<Vec<ScanComponent>>,
}

#[derive(Debug, Deserialize)]
struct ScanComponent {
    #[serde(rename = "comp_ID")]
    id: u32,
}

pub fn parse_stations_from_str(content: &str) -> Result<Vec<Station>> {
    let doc: ScanDocument = serde_json::from_str(content)?;

    let mut stations = Vec::new();
    for ensemble in doc.ensembles.unwrap_or_default() {
        let services = ensemble
            .services
            .and_then(|list| list.services)
            .unwrap_or_default();
        for service in services {
            let label = service.label.trim().to_string();
            for component in service.components.unwrap_or_default() {
                stations.push(Station {
                    frequency_index: ensemble.index,
                    service_id: service.id,
                    component_id: component.id,
                    label: label.clone(),
                });
            }
        }
    }

    if stations.is_empty() {
        return Err(RadioError::EmptyCatalog);
    }
    Ok(stations)
}

pub fn load_stations(path: &Path) -> Result<Vec<Station>> {
    let content = std::fs::read_to_string(path).map_err(|source| RadioError::CatalogRead {
        path: path.to_path_buf(),
        source,
    })?;
    let stations = parse_stations_from_str(&content)?;
    info!("Loaded {} stations from {:?}", stations.len(), path);
    Ok(stations)
}
