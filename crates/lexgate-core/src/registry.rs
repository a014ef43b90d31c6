//! Static jurisdiction registry.
//!
//! Maps jurisdiction codes to human-readable names, official sources, place
//! names, and index handles. Loaded once at startup from a JSON document and
//! validated as a whole; a malformed entry fails the load with
//! [`ConfigError`]. After loading the registry is read-only and shared behind
//! an `Arc`. Reloading means building a new `Registry` and swapping the `Arc`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::jurisdiction::{JurisdictionCode, JurisdictionKind, looks_like_code};

/// Registry shipped with the crate: Spain, its autonomous communities, and Portugal.
const BUILTIN_REGISTRY: &str = include_str!("../registry/es.json");

// ── Configuration document ──

/// Raw registry document as written in JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    pub default_national: String,
    pub cross_border: IndexSpec,
    pub global: IndexSpec,
    pub nationals: Vec<NationalEntry>,
    #[serde(default)]
    pub subnationals: Vec<SubNationalEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexSpec {
    pub id: String,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSpec {
    pub name: String,
    #[serde(default)]
    pub abbreviation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NationalEntry {
    pub code: String,
    pub name: String,
    pub index: String,
    #[serde(default)]
    pub source: Option<SourceSpec>,
    #[serde(default)]
    pub places: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubNationalEntry {
    pub code: String,
    pub name: String,
    /// Sub-national index; absent means the router skips this level.
    #[serde(default)]
    pub index: Option<String>,
    #[serde(default)]
    pub source: Option<SourceSpec>,
    #[serde(default)]
    pub places: Vec<String>,
}

// ── Loaded registry ──

/// What an index handle is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexScope {
    Jurisdiction(JurisdictionCode),
    CrossBorder,
    Global,
}

/// Reference to one searchable document collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexHandle {
    pub id: String,
    pub scope: IndexScope,
    pub label: String,
}

/// Position of an index in the retrieval fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainLevel {
    SubNational,
    National,
    CrossBorder,
    Global,
}

impl ChainLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubNational => "sub_national",
            Self::National => "national",
            Self::CrossBorder => "cross_border",
            Self::Global => "global",
        }
    }
}

/// Official publication that authoritative text is cited from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficialSource {
    pub name: String,
    pub abbreviation: Option<String>,
}

impl OfficialSource {
    /// Abbreviation when present, otherwise the full name.
    pub fn short_label(&self) -> &str {
        self.abbreviation.as_deref().unwrap_or(&self.name)
    }
}

/// A registered jurisdiction.
#[derive(Debug, Clone)]
pub struct Jurisdiction {
    pub code: JurisdictionCode,
    pub name: String,
    pub index: Option<IndexHandle>,
    pub source: Option<OfficialSource>,
    pub places: Vec<String>,
}

impl Jurisdiction {
    pub fn kind(&self) -> JurisdictionKind {
        self.code.kind()
    }
}

/// Validated, immutable jurisdiction → index table.
#[derive(Debug, Clone)]
pub struct Registry {
    jurisdictions: BTreeMap<JurisdictionCode, Jurisdiction>,
    default_national: JurisdictionCode,
    cross_border: IndexHandle,
    global: IndexHandle,
}

impl Registry {
    /// The built-in Spanish registry.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN_REGISTRY)
    }

    /// Load and validate a registry file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_json(&raw)?;
        info!(path = %path.display(), jurisdictions = registry.len(), "registry loaded");
        Ok(registry)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: RegistryConfig = serde_json::from_str(raw)?;
        Self::from_config(config)
    }

    /// Validate a configuration document and build the registry.
    pub fn from_config(config: RegistryConfig) -> Result<Self, ConfigError> {
        let mut index_ids: BTreeSet<String> = BTreeSet::new();
        let mut claim_index = |id: &str, entry: &str| -> Result<(), ConfigError> {
            let id = id.trim();
            if id.is_empty() {
                return Err(ConfigError::EmptyField {
                    entry: entry.to_string(),
                    field: "index",
                });
            }
            if !index_ids.insert(id.to_string()) {
                return Err(ConfigError::DuplicateIndex(id.to_string()));
            }
            Ok(())
        };

        claim_index(&config.cross_border.id, "cross_border")?;
        claim_index(&config.global.id, "global")?;
        let cross_border = IndexHandle {
            id: config.cross_border.id.trim().to_string(),
            scope: IndexScope::CrossBorder,
            label: config.cross_border.label,
        };
        let global = IndexHandle {
            id: config.global.id.trim().to_string(),
            scope: IndexScope::Global,
            label: config.global.label,
        };

        let mut jurisdictions = BTreeMap::new();

        for entry in config.nationals {
            let code = parse_code(&entry.code, JurisdictionKind::National)?;
            require_non_empty(&entry.name, code.as_str(), "name")?;
            claim_index(&entry.index, code.as_str())?;
            let jurisdiction = Jurisdiction {
                index: Some(IndexHandle {
                    id: entry.index.trim().to_string(),
                    scope: IndexScope::Jurisdiction(code.clone()),
                    label: entry.name.clone(),
                }),
                source: build_source(entry.source, code.as_str())?,
                places: entry.places,
                name: entry.name,
                code: code.clone(),
            };
            if jurisdictions.insert(code.clone(), jurisdiction).is_some() {
                return Err(ConfigError::DuplicateCode(code.to_string()));
            }
        }

        for entry in config.subnationals {
            let code = parse_code(&entry.code, JurisdictionKind::SubNational)?;
            require_non_empty(&entry.name, code.as_str(), "name")?;
            let country = code.country().unwrap_or_default().to_string();
            let country_code = JurisdictionCode::new(&country);
            if !jurisdictions.contains_key(&country_code) {
                return Err(ConfigError::UnknownCountry {
                    code: code.to_string(),
                    country,
                });
            }
            let index = match entry.index {
                Some(id) => {
                    claim_index(&id, code.as_str())?;
                    Some(IndexHandle {
                        id: id.trim().to_string(),
                        scope: IndexScope::Jurisdiction(code.clone()),
                        label: entry.name.clone(),
                    })
                }
                None => None,
            };
            let jurisdiction = Jurisdiction {
                index,
                source: build_source(entry.source, code.as_str())?,
                places: entry.places,
                name: entry.name,
                code: code.clone(),
            };
            if jurisdictions.insert(code.clone(), jurisdiction).is_some() {
                return Err(ConfigError::DuplicateCode(code.to_string()));
            }
        }

        let default_national = JurisdictionCode::new(&config.default_national);
        match jurisdictions.get(&default_national) {
            Some(j) if j.kind() == JurisdictionKind::National => {}
            _ => return Err(ConfigError::UnknownDefault(config.default_national)),
        }

        Ok(Self {
            jurisdictions,
            default_national,
            cross_border,
            global,
        })
    }

    pub fn len(&self) -> usize {
        self.jurisdictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jurisdictions.is_empty()
    }

    /// Registered jurisdictions in code order.
    pub fn jurisdictions(&self) -> impl Iterator<Item = &Jurisdiction> {
        self.jurisdictions.values()
    }

    pub fn get(&self, code: &JurisdictionCode) -> Option<&Jurisdiction> {
        self.jurisdictions.get(code)
    }

    /// Look up a registered code from a raw string (`"es-an"` → `ES-AN`).
    ///
    /// `GLOBAL` always resolves.
    pub fn resolve(&self, raw: &str) -> Option<JurisdictionCode> {
        let code = JurisdictionCode::new(raw);
        if code.kind() == JurisdictionKind::Global {
            return Some(code);
        }
        self.jurisdictions.contains_key(&code).then_some(code)
    }

    pub fn default_national(&self) -> &JurisdictionCode {
        &self.default_national
    }

    /// The national jurisdiction owning `code` (itself, for a national code).
    pub fn national_of(&self, code: &JurisdictionCode) -> Option<&Jurisdiction> {
        let country = JurisdictionCode::new(code.country()?);
        self.jurisdictions.get(&country)
    }

    pub fn cross_border(&self) -> &IndexHandle {
        &self.cross_border
    }

    pub fn global(&self) -> &IndexHandle {
        &self.global
    }

    /// Official source to cite for `code`: its own, else its country's.
    pub fn source_for(&self, code: &JurisdictionCode) -> Option<&OfficialSource> {
        self.get(code)
            .and_then(|j| j.source.as_ref())
            .or_else(|| self.national_of(code).and_then(|j| j.source.as_ref()))
    }

    /// Retrieval fallback chain for `code`, most specific first.
    ///
    /// Sub-national level only when that jurisdiction has an index; national
    /// level only when the owning country is registered; cross-border and
    /// global always.
    pub fn chain(&self, code: &JurisdictionCode) -> Vec<(ChainLevel, IndexHandle)> {
        let mut chain = Vec::with_capacity(4);
        if code.kind() == JurisdictionKind::SubNational
            && let Some(index) = self.get(code).and_then(|j| j.index.clone())
        {
            chain.push((ChainLevel::SubNational, index));
        }
        if let Some(index) = self.national_of(code).and_then(|j| j.index.clone()) {
            chain.push((ChainLevel::National, index));
        }
        chain.push((ChainLevel::CrossBorder, self.cross_border.clone()));
        chain.push((ChainLevel::Global, self.global.clone()));
        chain
    }
}

fn parse_code(raw: &str, expected: JurisdictionKind) -> Result<JurisdictionCode, ConfigError> {
    if !looks_like_code(raw) {
        return Err(ConfigError::MalformedCode(raw.to_string()));
    }
    let code = JurisdictionCode::new(raw);
    if code.kind() != expected {
        return Err(ConfigError::MalformedCode(raw.to_string()));
    }
    Ok(code)
}

fn require_non_empty(value: &str, entry: &str, field: &'static str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyField {
            entry: entry.to_string(),
            field,
        });
    }
    Ok(())
}

fn build_source(
    spec: Option<SourceSpec>,
    entry: &str,
) -> Result<Option<OfficialSource>, ConfigError> {
    let Some(spec) = spec else {
        return Ok(None);
    };
    require_non_empty(&spec.name, entry, "source.name")?;
    let abbreviation = spec
        .abbreviation
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());
    Ok(Some(OfficialSource {
        name: spec.name.trim().to_string(),
        abbreviation,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(subnationals: &str) -> String {
        format!(
            r#"{{
                "default_national": "ES",
                "cross_border": {{ "id": "eu-eurlex" }},
                "global": {{ "id": "global" }},
                "nationals": [{{ "code": "ES", "name": "España", "index": "es-boe" }}],
                "subnationals": [{subnationals}]
            }}"#
        )
    }

    #[test]
    fn builtin_registry_loads() {
        let registry = Registry::builtin().unwrap();
        assert_eq!(registry.default_national().as_str(), "ES");
        assert!(registry.resolve("ES-AN").is_some());
        assert!(registry.resolve("es-ct").is_some());
        assert_eq!(registry.cross_border().id, "eu-eurlex");
    }

    #[test]
    fn resolve_rejects_unregistered() {
        let registry = Registry::builtin().unwrap();
        assert!(registry.resolve("ES-ZZ").is_none());
        assert!(registry.resolve("FR").is_none());
        assert_eq!(registry.resolve("global").unwrap().as_str(), "GLOBAL");
    }

    #[test]
    fn chain_for_subnational_with_index() {
        let registry = Registry::builtin().unwrap();
        let code = registry.resolve("ES-AN").unwrap();
        let chain: Vec<(ChainLevel, String)> = registry
            .chain(&code)
            .into_iter()
            .map(|(level, h)| (level, h.id))
            .collect();
        assert_eq!(
            chain,
            vec![
                (ChainLevel::SubNational, "es-an-boja".to_string()),
                (ChainLevel::National, "es-boe".to_string()),
                (ChainLevel::CrossBorder, "eu-eurlex".to_string()),
                (ChainLevel::Global, "global-reference".to_string()),
            ]
        );
    }

    #[test]
    fn chain_skips_missing_subnational_index() {
        let registry = Registry::builtin().unwrap();
        let code = registry.resolve("ES-AR").unwrap();
        let levels: Vec<ChainLevel> = registry.chain(&code).into_iter().map(|(l, _)| l).collect();
        assert_eq!(
            levels,
            vec![ChainLevel::National, ChainLevel::CrossBorder, ChainLevel::Global]
        );
    }

    #[test]
    fn chain_for_global() {
        let registry = Registry::builtin().unwrap();
        let chain = registry.chain(&JurisdictionCode::global());
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].0, ChainLevel::CrossBorder);
    }

    #[test]
    fn source_falls_back_to_national() {
        let registry = Registry::builtin().unwrap();
        let rioja = registry.resolve("ES-RI").unwrap();
        assert_eq!(registry.source_for(&rioja).unwrap().short_label(), "BOE");
        let andalucia = registry.resolve("ES-AN").unwrap();
        assert_eq!(registry.source_for(&andalucia).unwrap().short_label(), "BOJA");
    }

    #[test]
    fn missing_required_field_fails() {
        let raw = r#"{ "default_national": "ES", "global": { "id": "g" }, "nationals": [] }"#;
        assert!(matches!(Registry::from_json(raw), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn unknown_country_fails() {
        let raw = minimal(r#"{ "code": "FR-IDF", "name": "Île-de-France" }"#);
        assert!(matches!(
            Registry::from_json(&raw),
            Err(ConfigError::UnknownCountry { .. })
        ));
    }

    #[test]
    fn duplicate_code_fails() {
        let raw = minimal(
            r#"{ "code": "ES-AN", "name": "Andalucía" }, { "code": "es-an", "name": "Andalucía" }"#,
        );
        assert!(matches!(
            Registry::from_json(&raw),
            Err(ConfigError::DuplicateCode(c)) if c == "ES-AN"
        ));
    }

    #[test]
    fn duplicate_index_fails() {
        let raw = minimal(r#"{ "code": "ES-AN", "name": "Andalucía", "index": "es-boe" }"#);
        assert!(matches!(
            Registry::from_json(&raw),
            Err(ConfigError::DuplicateIndex(id)) if id == "es-boe"
        ));
    }

    #[test]
    fn empty_source_name_fails() {
        let raw = minimal(r#"{ "code": "ES-AN", "name": "Andalucía", "source": { "name": " " } }"#);
        assert!(matches!(
            Registry::from_json(&raw),
            Err(ConfigError::EmptyField { field: "source.name", .. })
        ));
    }

    #[test]
    fn malformed_code_fails() {
        let raw = minimal(r#"{ "code": "Andalucia", "name": "Andalucía" }"#);
        assert!(matches!(
            Registry::from_json(&raw),
            Err(ConfigError::MalformedCode(_))
        ));
    }

    #[test]
    fn default_must_be_registered_national() {
        let raw = r#"{
            "default_national": "PT",
            "cross_border": { "id": "eu" },
            "global": { "id": "global" },
            "nationals": [{ "code": "ES", "name": "España", "index": "es-boe" }]
        }"#;
        assert!(matches!(
            Registry::from_json(raw),
            Err(ConfigError::UnknownDefault(_))
        ));
    }
}
