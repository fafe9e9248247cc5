//! System description loader for whole-system yield analysis.
//!
//! YAML mapping: die id → die count, interface count, surface resources and
//! the bump-map / IRL files describing that die's interface.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use cira_core::{CiraError, CiraResult};
use serde::Deserialize;
use serde_yaml::Mapping;

#[derive(Debug, Clone, Deserialize)]
pub struct DieResources {
    /// Die surface in mm²
    #[serde(rename = "Surface")]
    pub surface: f64,
}

/// One die entry of the system description.
#[derive(Debug, Clone, Deserialize)]
pub struct DieDescriptor {
    #[serde(rename = "Die_Number")]
    pub die_number: u32,
    #[serde(rename = "Interface_Number")]
    pub interface_number: u32,
    #[serde(rename = "Ressources")]
    pub resources: DieResources,
    #[serde(rename = "BumpMap_file_name")]
    pub bump_map_file: PathBuf,
    #[serde(rename = "IRL_file_name")]
    pub irl_file: PathBuf,
}

/// The full system: dies in document order.
#[derive(Debug, Clone, Default)]
pub struct SystemDescription {
    pub dies: Vec<(String, DieDescriptor)>,
}

/// Load a system description file.
pub fn load_system_description(path: &Path) -> CiraResult<SystemDescription> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading system description '{}'", path.display()))
        .map_err(CiraError::from)?;

    let doc: Mapping = serde_yaml::from_str(&content)
        .map_err(|e| CiraError::Parse(format!("malformed system description: {e}")))?;

    let mut dies = Vec::new();
    for (key, value) in doc {
        let die_id = key
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CiraError::Parse("die ids must be strings".into()))?;
        let descriptor: DieDescriptor = serde_yaml::from_value(value).map_err(|e| {
            CiraError::Parse(format!("malformed entry for die '{die_id}': {e}"))
        })?;
        dies.push((die_id, descriptor));
    }

    Ok(SystemDescription { dies })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_system_description() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(
            file,
            "Die_A:\n\
             \x20 Die_Number: 2\n\
             \x20 Interface_Number: 4\n\
             \x20 Ressources:\n\
             \x20   Surface: 100.0\n\
             \x20 BumpMap_file_name: die_a_map.yaml\n\
             \x20 IRL_file_name: die_a_irl.yaml\n\
             Die_B:\n\
             \x20 Die_Number: 1\n\
             \x20 Interface_Number: 1\n\
             \x20 Ressources:\n\
             \x20   Surface: 50.0\n\
             \x20 BumpMap_file_name: die_b_map.csv\n\
             \x20 IRL_file_name: die_b_irl.yaml\n"
        )
        .unwrap();

        let system = load_system_description(file.path()).unwrap();
        assert_eq!(system.dies.len(), 2);
        assert_eq!(system.dies[0].0, "Die_A");
        assert_eq!(system.dies[0].1.die_number, 2);
        assert_eq!(system.dies[0].1.resources.surface, 100.0);
        assert_eq!(system.dies[1].1.bump_map_file, PathBuf::from("die_b_map.csv"));
    }

    #[test]
    fn test_malformed_entry_rejected() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(file, "Die_A:\n  Interface_Number: 4\n").unwrap();
        let err = load_system_description(file.path()).unwrap_err();
        assert!(matches!(err, CiraError::Parse(_)));
        assert!(err.to_string().contains("Die_A"));
    }
}
