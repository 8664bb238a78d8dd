/// Tool catalog loaded once at startup
///
/// The catalog is a JSON array of tool definitions generated from the
/// backend's OpenAPI document, each optionally bound to the REST route that
/// implements it. Once loaded it is shared read-only.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tools::ToolDefinition;

/// Errors that can occur while loading a tool catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read tool catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid tool catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tool #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("Tool '{name}' has an empty description")]
    EmptyDescription { name: String },

    #[error("Tool '{name}' inputSchema must be a JSON object")]
    SchemaNotObject { name: String },

    #[error("Duplicate tool name '{name}'")]
    DuplicateName { name: String },
}

/// HTTP methods a tool route may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Whether arguments travel in a JSON body rather than the query string
    pub fn has_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Backend REST route that implements a tool, e.g. `GET /missions/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRoute {
    pub method: HttpMethod,
    pub path: String,
}

impl ApiRoute {
    /// Names of the `{param}` placeholders in the path, in order
    pub fn path_params(&self) -> Vec<&str> {
        self.path
            .split('/')
            .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
            .collect()
    }
}

/// One catalog entry: the advertised definition plus its optional route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub definition: ToolDefinition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<ApiRoute>,
}

/// Ordered, immutable collection of tools
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    entries: Arc<[CatalogEntry]>,
    definitions: Arc<[ToolDefinition]>,
}

impl ToolCatalog {
    /// Build a catalog from entries, validating every definition
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        validate(&entries)?;

        let definitions = entries.iter().map(|e| e.definition.clone()).collect();
        Ok(Self {
            entries: entries.into(),
            definitions,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    /// Load a catalog file from disk
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        tracing::info!("Loaded {} tools from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.definition.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate(entries: &[CatalogEntry]) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for (index, entry) in entries.iter().enumerate() {
        let definition = &entry.definition;
        if definition.name.trim().is_empty() {
            return Err(CatalogError::EmptyName { index });
        }
        if definition.description.trim().is_empty() {
            return Err(CatalogError::EmptyDescription {
                name: definition.name.clone(),
            });
        }
        if !definition.input_schema.is_object() {
            return Err(CatalogError::SchemaNotObject {
                name: definition.name.clone(),
            });
        }
        if !seen.insert(definition.name.as_str()) {
            return Err(CatalogError::DuplicateName {
                name: definition.name.clone(),
            });
        }
    }
    Ok(())
}
