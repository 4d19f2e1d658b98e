//! Package manifest: channels and the descriptor each one currently points at.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageManifest {
    pub package_name: String,
    pub channels: Vec<PackageChannel>,
    pub default_channel: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageChannel {
    pub name: String,
    #[serde(rename = "currentCSV")]
    pub current_csv_name: String,
}

impl PackageChannel {
    pub fn new(name: impl Into<String>, current_csv_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            current_csv_name: current_csv_name.into(),
        }
    }
}

impl PackageManifest {
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|c| c.name.as_str())
    }
}
