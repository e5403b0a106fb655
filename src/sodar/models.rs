/*!
 * Wire models for the SODAR sample sheet API
 *
 * Keyed collections keep the order the server sent them in, so "first
 * study" and "first assay" mean the first one in the response.
 */

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

fn ordered<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let map = Map::<String, Value>::deserialize(deserializer)?;
    map.into_iter()
        .map(|(key, value)| {
            serde_json::from_value(value)
                .map(|item| (key, item))
                .map_err(D::Error::custom)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Assay {
    #[serde(default)]
    pub sodar_uuid: String,
    #[serde(default)]
    pub file_name: String,
    /// Collection holding the assay's raw data
    #[serde(default)]
    pub irods_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Study {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "ordered")]
    pub assays: Vec<(String, Assay)>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Investigation {
    #[serde(default)]
    pub sodar_uuid: String,
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub irods_status: bool,
    #[serde(default, deserialize_with = "ordered")]
    pub studies: Vec<(String, Study)>,
}

impl Investigation {
    /// First assay of the first study that has any
    pub fn first_assay(&self) -> Option<(&str, &Assay)> {
        self.studies
            .iter()
            .flat_map(|(_, study)| study.assays.iter())
            .map(|(uuid, assay)| (uuid.as_str(), assay))
            .next()
    }
}

/// One ISA-tab file as exported by the server
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IsaFile {
    #[serde(default)]
    pub path: Option<String>,
    pub tsv: String,
}

/// Full ISA-tab export of a project
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SampleSheet {
    pub investigation: IsaFile,
    #[serde(default, deserialize_with = "ordered")]
    pub studies: Vec<(String, IsaFile)>,
    #[serde(default, deserialize_with = "ordered")]
    pub assays: Vec<(String, IsaFile)>,
}
