//! TOML-backed metric catalog.
//!
//! ```toml
//! [[metrics]]
//! code = "DTN"
//! data_type = "numeric"
//! synonyms = ["Door-to-Needle Time", "DNT"]
//! [metrics.numeric]
//! unit = "min"
//! range_min = 0
//! range_max = 120
//! default_buckets = 24
//!
//! [[metrics]]
//! code = "REGION"
//! data_type = "enum"
//! synonyms = ["Region"]
//! options = [{ key = "NORTH", synonyms = ["North"] }]
//!
//! [[sex_types]]
//! code = "MALE"
//! synonyms = ["Male"]
//! ```
//!
//! All lookups are case-insensitive on codes and option keys.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{MetadataProvider, NumericProfile};
use crate::error::{EngineError, EngineResult};
use crate::models::{SexType, StrokeType};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericBlock {
    pub unit: Option<String>,
    pub range_min: Option<i64>,
    pub range_max: Option<i64>,
    pub default_buckets: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumOption {
    pub key: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

impl EnumOption {
    /// First synonym, or a title-cased rendering of the key.
    pub fn label(&self) -> String {
        self.synonyms
            .iter()
            .find(|s| !s.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| humanize_key(&self.key))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub code: String,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub numeric: Option<NumericBlock>,
    #[serde(default)]
    pub options: Vec<EnumOption>,
}

impl CatalogEntry {
    pub fn display_name(&self) -> Option<&str> {
        self.synonyms
            .first()
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    fn data_type(&self) -> String {
        self.data_type
            .as_deref()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    metrics: Vec<CatalogEntry>,
    #[serde(default)]
    group_fields: Vec<CatalogEntry>,
    #[serde(default)]
    sex_types: Vec<CatalogEntry>,
    #[serde(default)]
    stroke_types: Vec<CatalogEntry>,
}

/// Immutable, indexed metadata catalog.
#[derive(Debug, Clone, Default)]
pub struct MetricCatalog {
    metrics: HashMap<String, CatalogEntry>,
    group_fields: HashMap<String, CatalogEntry>,
    sex_labels: HashMap<String, String>,
    stroke_labels: HashMap<String, String>,
    /// Declaration order, for stable completeness reports.
    metric_order: Vec<String>,
}

fn index(entries: Vec<CatalogEntry>) -> HashMap<String, CatalogEntry> {
    entries
        .into_iter()
        .map(|e| (e.code.trim().to_ascii_uppercase(), e))
        .collect()
}

fn label_index(entries: Vec<CatalogEntry>) -> HashMap<String, String> {
    entries
        .into_iter()
        .map(|e| {
            let label = e.display_name().unwrap_or(e.code.as_str()).to_string();
            (e.code.trim().to_ascii_uppercase(), label)
        })
        .collect()
}

/// `"ISCHEMIC_STROKE"` -> `"Ischemic Stroke"`.
pub fn humanize_key(key: &str) -> String {
    key.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl FromStr for MetricCatalog {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let file: CatalogFile = toml::from_str(s).map_err(|e| {
            EngineError::metadata(format!("Failed to parse metric catalog: {}", e))
        })?;
        let metric_order = file
            .metrics
            .iter()
            .map(|e| e.code.trim().to_ascii_uppercase())
            .collect();
        Ok(Self {
            metrics: index(file.metrics),
            group_fields: index(file.group_fields),
            sex_labels: label_index(file.sex_types),
            stroke_labels: label_index(file.stroke_types),
            metric_order,
        })
    }
}

impl MetricCatalog {
    pub fn from_file<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            EngineError::metadata(format!(
                "Failed to read metric catalog {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let catalog: MetricCatalog = content.parse()?;
        log::info!(
            "Loaded metric catalog with {} metrics and {} group fields",
            catalog.metrics.len(),
            catalog.group_fields.len()
        );
        Ok(catalog)
    }

    pub fn metric(&self, code: &str) -> Option<&CatalogEntry> {
        self.metrics.get(&code.trim().to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Report metrics whose metadata is incomplete or inconsistent.
    ///
    /// Each warning is also logged.
    pub fn completeness_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for code in &self.metric_order {
            let Some(entry) = self.metrics.get(code) else {
                continue;
            };
            match entry.data_type().as_str() {
                "numeric" => {
                    let Some(ref numeric) = entry.numeric else {
                        warnings.push(format!("Catalog incomplete [NUMERIC]: {} missing numeric block", code));
                        continue;
                    };
                    let mut missing = Vec::new();
                    if numeric.unit.as_deref().map_or(true, |u| u.trim().is_empty()) {
                        missing.push("unit");
                    }
                    if numeric.range_min.is_none() {
                        missing.push("range_min");
                    }
                    if numeric.range_max.is_none() {
                        missing.push("range_max");
                    }
                    if numeric.default_buckets.is_none() {
                        missing.push("default_buckets");
                    }
                    if !missing.is_empty() {
                        warnings.push(format!(
                            "Catalog incomplete [NUMERIC]: {} missing {}",
                            code,
                            missing.join(", ")
                        ));
                    }
                    if let (Some(min), Some(max)) = (numeric.range_min, numeric.range_max) {
                        if min >= max {
                            warnings.push(format!(
                                "Catalog invalid [NUMERIC]: {} range_min ({}) >= range_max ({})",
                                code, min, max
                            ));
                        }
                    }
                    if numeric.default_buckets == Some(0) {
                        warnings.push(format!(
                            "Catalog invalid [NUMERIC]: {} default_buckets must be > 0",
                            code
                        ));
                    }
                }
                "enum" => {
                    if entry.options.is_empty() {
                        warnings.push(format!("Catalog incomplete [ENUM]: {} has no options", code));
                        continue;
                    }
                    let mut seen = HashSet::new();
                    for option in &entry.options {
                        let key = option.key.trim();
                        if key.is_empty() {
                            warnings.push(format!("Catalog incomplete [ENUM]: {} option missing key", code));
                            continue;
                        }
                        if !seen.insert(key.to_ascii_uppercase()) {
                            warnings.push(format!(
                                "Catalog invalid [ENUM]: {} duplicate option key '{}'",
                                code, key
                            ));
                        }
                        if option.synonyms.iter().all(|s| s.trim().is_empty()) {
                            warnings.push(format!(
                                "Catalog incomplete [ENUM]: {} option '{}' missing synonyms",
                                code, key
                            ));
                        }
                    }
                }
                _ => warnings.push(format!(
                    "Catalog incomplete: {} has unknown or missing data_type",
                    code
                )),
            }
        }

        for warning in &warnings {
            log::warn!("{}", warning);
        }
        warnings
    }
}

impl MetadataProvider for MetricCatalog {
    fn metric_display_name(&self, metric_code: &str) -> String {
        self.metric(metric_code)
            .and_then(|e| e.display_name())
            .map(str::to_string)
            .unwrap_or_else(|| metric_code.trim().to_ascii_uppercase())
    }

    fn numeric_profile(&self, metric_code: &str) -> Option<NumericProfile> {
        let numeric = self.metric(metric_code)?.numeric.as_ref()?;
        Some(NumericProfile {
            unit: numeric.unit.clone().filter(|u| !u.trim().is_empty()),
            range_min: numeric.range_min,
            range_max: numeric.range_max,
            default_buckets: numeric.default_buckets,
        })
    }

    fn field_display_name(&self, field: &str) -> String {
        let code = field.trim().to_ascii_uppercase();
        self.metrics
            .get(&code)
            .and_then(|e| e.display_name())
            .or_else(|| self.group_fields.get(&code).and_then(|e| e.display_name()))
            .map(str::to_string)
            .unwrap_or(code)
    }

    fn category_label(&self, field: &str, raw_value: &str) -> Option<String> {
        let key = raw_value.trim();
        if key.is_empty() {
            return None;
        }
        let code = field.trim().to_ascii_uppercase();
        let entry = self.metrics.get(&code).or_else(|| self.group_fields.get(&code))?;
        entry
            .options
            .iter()
            .find(|o| o.key.trim().eq_ignore_ascii_case(key))
            .map(EnumOption::label)
    }

    fn sex_label(&self, sex: SexType) -> String {
        self.sex_labels
            .get(sex.as_str())
            .cloned()
            .unwrap_or_else(|| sex.as_str().to_string())
    }

    fn stroke_label(&self, stroke: StrokeType) -> String {
        self.stroke_labels
            .get(stroke.as_str())
            .cloned()
            .unwrap_or_else(|| stroke.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
[[metrics]]
code = "DTN"
data_type = "numeric"
synonyms = ["Door-to-Needle Time", "DNT"]
[metrics.numeric]
unit = "min"
range_min = 0
range_max = 120
default_buckets = 24

[[metrics]]
code = "age"
data_type = "numeric"
synonyms = ["Age"]
[metrics.numeric]
range_min = 18

[[metrics]]
code = "REGION"
data_type = "enum"
synonyms = ["Region"]
options = [
    { key = "NORTH", synonyms = ["North"] },
    { key = "SOUTH_WEST" },
    { key = "north", synonyms = ["Duplicate"] },
]

[[group_fields]]
code = "HOSPITAL"
synonyms = ["Hospital"]

[[sex_types]]
code = "FEMALE"
synonyms = ["Female"]
"#;

    fn catalog() -> MetricCatalog {
        CATALOG.parse().unwrap()
    }

    #[test]
    fn test_display_names() {
        let c = catalog();
        assert_eq!(c.metric_display_name("dtn"), "Door-to-Needle Time");
        assert_eq!(c.metric_display_name("UNKNOWN"), "UNKNOWN");
        assert_eq!(c.field_display_name("hospital"), "Hospital");
        assert_eq!(c.field_display_name("region"), "Region");
        assert_eq!(c.field_display_name("ward"), "WARD");
    }

    #[test]
    fn test_numeric_profile() {
        let c = catalog();
        let profile = c.numeric_profile("DTN").unwrap();
        assert_eq!(profile.unit.as_deref(), Some("min"));
        assert_eq!(profile.default_buckets, Some(24));
        assert!(c.numeric_profile("REGION").is_none());
        assert_eq!(c.numeric_profile("AGE").unwrap().range_max, None);
    }

    #[test]
    fn test_category_labels() {
        let c = catalog();
        assert_eq!(c.category_label("REGION", "north").as_deref(), Some("North"));
        assert_eq!(c.category_label("REGION", "SOUTH_WEST").as_deref(), Some("South West"));
        assert_eq!(c.category_label("REGION", "EAST"), None);
        assert_eq!(c.category_label("HOSPITAL", "H1"), None);
    }

    #[test]
    fn test_sex_and_stroke_labels() {
        let c = catalog();
        assert_eq!(c.sex_label(SexType::Female), "Female");
        assert_eq!(c.sex_label(SexType::Male), "MALE");
        assert_eq!(c.stroke_label(StrokeType::Ischemic), "ISCHEMIC");
    }

    #[test]
    fn test_completeness_warnings() {
        let warnings = catalog().completeness_warnings();
        assert!(warnings
            .iter()
            .any(|w| w.contains("AGE missing unit, range_max, default_buckets")));
        assert!(warnings
            .iter()
            .any(|w| w.contains("duplicate option key 'north'")));
        assert!(warnings
            .iter()
            .any(|w| w.contains("option 'SOUTH_WEST' missing synonyms")));
        assert!(!warnings.iter().any(|w| w.contains("DTN")));
    }

    #[test]
    fn test_humanize_key() {
        assert_eq!(humanize_key("ISCHEMIC_STROKE"), "Ischemic Stroke");
        assert_eq!(humanize_key("a"), "A");
    }

    #[test]
    fn test_rejects_malformed_catalog() {
        assert!("[[metrics]]\nsynonyms = [\"x\"]\n".parse::<MetricCatalog>().is_err());
    }
}
