use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod matcher;

pub use matcher::match_models;

/// Number of records returned by [`Catalog::trending`].
pub const TRENDING_COUNT: usize = 3;

/// One AI model entry in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    pub id: String,
    pub name: String,
    pub category: String,
    pub provider: String,
    pub use_cases: Vec<String>,
    pub link: String,
    /// Free-text label such as "Free Tier", "Paid" or "Enterprise".
    pub pricing: String,
    /// Free-text label such as "General" or "Specific".
    pub specificity: String,
    pub api_docs: String,
    pub rating: f64,
}

/// A single problem found while validating a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIssue {
    pub id: String,
    pub field: &'static str,
    pub reason: String,
}

impl std::fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "record '{}' field '{}': {}", self.id, self.field, self.reason)
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog has {} invalid field(s): {}", .0.len(), join_issues(.0))]
    Invalid(Vec<RecordIssue>),
}

fn join_issues(issues: &[RecordIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Per-category view used by the categories page.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary<'a> {
    pub category: &'a str,
    pub count: usize,
    pub top_provider: &'a str,
    pub models: Vec<&'a ModelRecord>,
}

/// Read-only, validated list of model records. Built once at startup.
#[derive(Debug, Clone)]
pub struct Catalog {
    records: Vec<ModelRecord>,
}

impl Catalog {
    /// Validates `records` and builds a catalog, reporting every offending
    /// record rather than stopping at the first.
    pub fn new(records: Vec<ModelRecord>) -> Result<Self, CatalogError> {
        let issues = validate(&records);
        if !issues.is_empty() {
            return Err(CatalogError::Invalid(issues));
        }
        Ok(Self { records })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let records: Vec<ModelRecord> = serde_json::from_str(json)?;
        Self::new(records)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        info!("Loading model catalog from {}", path.display());
        let raw = fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&raw)?;
        if catalog.is_empty() {
            warn!("Catalog at {} has no records", path.display());
        }
        info!("Loaded {} catalog records", catalog.len());
        Ok(catalog)
    }

    pub fn records(&self) -> &[ModelRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ModelRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Groups records by category, keeping catalog order inside each group.
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&ModelRecord>> {
        let mut groups: BTreeMap<&str, Vec<&ModelRecord>> = BTreeMap::new();
        for record in &self.records {
            groups.entry(record.category.as_str()).or_default().push(record);
        }
        groups
    }

    pub fn category_summaries(&self) -> Vec<CategorySummary<'_>> {
        self.by_category()
            .into_iter()
            .map(|(category, models)| CategorySummary {
                category,
                count: models.len(),
                top_provider: top_provider(&models).unwrap_or_default(),
                models,
            })
            .collect()
    }

    /// Highest rated records, descending. Equal ratings keep catalog order.
    pub fn trending(&self) -> Vec<&ModelRecord> {
        let mut sorted: Vec<&ModelRecord> = self.records.iter().collect();
        // sort_by is stable, so ties stay in insertion order
        sorted.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        sorted.truncate(TRENDING_COUNT);
        sorted
    }
}

/// Most frequent provider in `models`. Ties go to the lexicographically
/// smallest provider name.
pub fn top_provider<'a>(models: &[&'a ModelRecord]) -> Option<&'a str> {
    let mut tally: HashMap<&str, usize> = HashMap::new();
    for model in models {
        *tally.entry(model.provider.as_str()).or_insert(0) += 1;
    }
    tally
        .into_iter()
        .max_by(|(a_name, a_count), (b_name, b_count)| {
            a_count.cmp(b_count).then_with(|| b_name.cmp(a_name))
        })
        .map(|(name, _)| name)
}

fn validate(records: &[ModelRecord]) -> Vec<RecordIssue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for record in records {
        let mut issue = |field: &'static str, reason: String| {
            issues.push(RecordIssue {
                id: record.id.clone(),
                field,
                reason,
            })
        };

        if record.id.trim().is_empty() {
            issue("id", "must not be empty".to_string());
        } else if !seen.insert(record.id.as_str()) {
            issue("id", "duplicate id".to_string());
        }
        if let Err(e) = Url::parse(&record.link) {
            issue("link", format!("invalid URL '{}': {}", record.link, e));
        }
        if let Err(e) = Url::parse(&record.api_docs) {
            issue("apiDocs", format!("invalid URL '{}': {}", record.api_docs, e));
        }
        if !record.rating.is_finite() {
            issue("rating", "must be a finite number".to_string());
        }
    }

    debug!("Catalog validation found {} issue(s)", issues.len());
    issues
}
