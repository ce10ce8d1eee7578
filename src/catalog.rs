use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sentinel value used by the library filter buttons; selecting it clears
/// every specific selection in that dimension.
pub const ALL_FILTER: &str = "All";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaseDefinition {
    pub id: String,
    pub title: String,
    pub problem: String,
    #[serde(rename = "type")]
    pub case_type: String,
    pub company: String,
    pub difficulty: String,
    /// Reference to the casebook document rendered during a session. Cases
    /// without their own document fall back to the shared default casebook.
    #[serde(default)]
    pub casebook: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read case catalog: {0}")]
    Read(std::io::Error),
    #[error("failed to parse case catalog JSON: {0}")]
    Parse(serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDimension {
    Type,
    Difficulty,
    Company,
}

/// Pure toggle-set transition: clicking `All` clears the set (empty set means
/// "All" is active), clicking a specific value toggles its membership.
pub fn toggle_selection(current: &[String], clicked: &str) -> Vec<String> {
    if clicked == ALL_FILTER {
        return Vec::new();
    }
    let mut next = current.to_vec();
    if let Some(index) = next.iter().position(|value| value == clicked) {
        next.remove(index);
    } else {
        next.push(clicked.to_string());
    }
    next
}

/// Library search selections. Within a dimension the selected values are OR'd;
/// across dimensions the matches are AND'd. An empty set matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryFilters {
    pub types: Vec<String>,
    pub difficulties: Vec<String>,
    pub companies: Vec<String>,
}

impl LibraryFilters {
    pub fn toggle(&mut self, dimension: FilterDimension, value: &str) {
        let slot = match dimension {
            FilterDimension::Type => &mut self.types,
            FilterDimension::Difficulty => &mut self.difficulties,
            FilterDimension::Company => &mut self.companies,
        };
        *slot = toggle_selection(slot, value);
    }

    pub fn matches(&self, case: &CaseDefinition) -> bool {
        let type_match = self.types.is_empty() || self.types.contains(&case.case_type);
        let difficulty_match =
            self.difficulties.is_empty() || self.difficulties.contains(&case.difficulty);
        let company_match = self.companies.is_empty() || self.companies.contains(&case.company);
        type_match && difficulty_match && company_match
    }
}

/// Immutable case reference data, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct CaseCatalog {
    cases: Vec<CaseDefinition>,
}

impl CaseCatalog {
    pub fn new(cases: Vec<CaseDefinition>) -> Self {
        Self { cases }
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let cases = serde_json::from_str(raw).map_err(CatalogError::Parse)?;
        Ok(Self { cases })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(CatalogError::Read)?;
        Self::from_json(&raw)
    }

    pub fn cases(&self) -> &[CaseDefinition] {
        &self.cases
    }

    pub fn get(&self, case_id: &str) -> Option<&CaseDefinition> {
        self.cases.iter().find(|case| case.id == case_id)
    }

    pub fn filter(&self, filters: &LibraryFilters) -> Vec<&CaseDefinition> {
        self.cases.iter().filter(|case| filters.matches(case)).collect()
    }

    pub fn distinct_types(&self) -> Vec<String> {
        distinct(self.cases.iter().map(|case| case.case_type.clone()))
    }

    pub fn distinct_difficulties(&self) -> Vec<String> {
        distinct(self.cases.iter().map(|case| case.difficulty.clone()))
    }

    pub fn distinct_companies(&self) -> Vec<String> {
        distinct(self.cases.iter().map(|case| case.company.clone()))
    }
}

fn distinct(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = values.collect();
    out.sort();
    out.dedup();
    out
}
