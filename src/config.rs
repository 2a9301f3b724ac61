use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::LoadError;
use crate::loader::DEFAULT_CONCURRENCY;
use crate::model::{DecimalFormat, RawResource};
use crate::parser::ColumnNames;

/// Environment variable overriding [`SourceConfig::base`].
pub const BASE_ENV: &str = "TRAIN_DELAYS_BASE";

/// Where the delay exports live and how each one is written.
///
/// Stored as JSON on disk:
/// ```json
/// {
///   "base": "data/base_de_donnees_version_csv",
///   "concurrency": 4,
///   "resources": [
///     { "id": "albi_retard_arrivee_intercites.csv", "decimal": "comma" },
///     { "id": "occitanie_retard_arrivee.csv", "decimal": "point", "delimiter": ";" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Directory or `http(s)://` prefix the resource ids are resolved against.
    pub base: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub columns: ColumnNames,
    pub resources: Vec<ResourceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceEntry {
    pub id: String,
    /// Required: there is no safe default between the two conventions.
    pub decimal: DecimalFormat,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Overrides the locality derived from `id`.
    #[serde(default)]
    pub locality: Option<String>,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_delimiter() -> char {
    ','
}

/// Delay exports published alongside the site.
const BUILTIN_RESOURCES: &[&str] = &[
    "albi_retard_arrivee_intercites.csv",
    "bayonne_retard_arrivee_intercites.csv",
    "beziers_retard_arrivee_intercites.csv",
    "cerbere_retard_arrivee_intercites.csv",
    "latour_de_carol_retard_arrivee_intercites.csv",
    "montpellier_retard_arrivee+depart_tgv.csv",
    "nimes_retard_arrivee+depart_tgv.csv",
    "nimes_retard_arrivee_intercites.csv",
    "occitanie_retard_arrivee.csv",
    "perpignan_retard_arrivee+depart_tgv.csv",
    "retard_france_intercites.csv",
    "tarbes_retard_arrivee_intercites.csv",
    "toulouse_matabiau_retard_arrivee+depart_tgv.csv",
    "toulouse_matabiau_retard_arrivee_intercites.csv",
];

impl SourceConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
        Self::from_json(&content).with_context(|| format!("parsing config {path}"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// The fourteen delay exports under `data/base_de_donnees_version_csv`,
    /// all written with comma decimals.
    pub fn builtin() -> Self {
        Self {
            base: "data/base_de_donnees_version_csv".to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            columns: ColumnNames::default(),
            resources: BUILTIN_RESOURCES
                .iter()
                .map(|id| ResourceEntry {
                    id: id.to_string(),
                    decimal: DecimalFormat::Comma,
                    delimiter: default_delimiter(),
                    locality: None,
                })
                .collect(),
        }
    }

    /// Replaces the base with `TRAIN_DELAYS_BASE` when it is set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base) = std::env::var(BASE_ENV) {
            if !base.is_empty() {
                self.base = base;
            }
        }
        self
    }

    /// Resolves the entries into loader resources, in declaration order.
    pub fn raw_resources(&self) -> Result<Vec<RawResource>, LoadError> {
        self.resources.iter().map(ResourceEntry::to_raw).collect()
    }
}

impl ResourceEntry {
    fn to_raw(&self) -> Result<RawResource, LoadError> {
        if !self.delimiter.is_ascii() {
            return Err(LoadError::Config(format!(
                "resource `{}`: delimiter {:?} is not a single ASCII character",
                self.id, self.delimiter
            )));
        }

        let mut resource =
            RawResource::new(&self.id, self.decimal).with_delimiter(self.delimiter as u8);
        let locality = self.locality.as_deref().map(str::trim).filter(|l| !l.is_empty());
        if let Some(locality) = locality {
            resource = resource.with_fallback_locality(Some(locality.to_string()));
        }
        Ok(resource)
    }
}
