use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::error::ConfigError;

const DEFAULT_EMAIL_CSS: &str = r#"
<style>
p {
  margin: 1px;
}
p .more_space {
  margin-bottom: 10px;
}
h2 {
  padding-left: 10px;
  padding-bottom: 4px;
  background-color: #52489C;
  color: white;
}
table, th, td {
  border: 1px solid black;
  border-collapse: collapse;
}
th, td {
  padding-left: 15px;
  padding-right: 15px;
  text-align: left;
}
th {
  background-color: #EBEBEB;
}
</style>
"#;

/// Structure representing the fault checker configuration. Contains the servers to talk to,
/// the mail settings, and the zone layout used when requesting report images.
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub data_server: String,
    pub report_server: String,
    pub smtp_server: String,
    pub from_address: String,
    pub email_css: String,
    pub linac_zones: BTreeMap<String, Vec<String>>,
    pub summary_zones: Vec<String>,
}

impl Default for Config {
    /// Generate the configuration of the production deployment
    fn default() -> Self {
        let linac_zones = BTreeMap::from([
            (String::from("0L"), zones(&["0L04"])),
            (
                String::from("1L"),
                zones(&["1L07", "1L22", "1L23", "1L24", "1L25", "1L26"]),
            ),
            (
                String::from("2L"),
                zones(&["2L22", "2L23", "2L24", "2L25", "2L26"]),
            ),
        ]);
        let summary_zones = linac_zones.values().flatten().cloned().collect();
        Self {
            data_server: String::from("accweb.acc.jlab.org"),
            report_server: String::from("accweb.acc.jlab.org"),
            smtp_server: String::from("localhost"),
            from_address: String::from("wfbrowser@jlab.org"),
            email_css: String::from(DEFAULT_EMAIL_CSS),
            linac_zones,
            summary_zones,
        }
    }
}

fn zones(names: &[&str]) -> Vec<String> {
    names.iter().map(|z| z.to_string()).collect()
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Write this configuration as YAML. Used to make template files.
    pub fn write_config_file(&self, config_path: &Path) -> Result<(), ConfigError> {
        let yaml_str = serde_yaml::to_string(self)?;
        std::fs::write(config_path, yaml_str)?;
        Ok(())
    }

    /// The zones making up a linac, if the linac is known
    pub fn get_linac_zones(&self, linac: &str) -> Option<&[String]> {
        self.linac_zones.get(linac).map(|z| z.as_slice())
    }
}
