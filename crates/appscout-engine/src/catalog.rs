//! Page objects as data.
//!
//! A catalog maps page names to named [`ElementDescriptor`]s:
//!
//! ```yaml
//! pages:
//!   search:
//!     search_container:
//!       strategy: accessibility_id
//!       selector: Search Wikipedia
//!       description: Search Wikipedia container
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::descriptor::ElementDescriptor;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Unknown page: {0}")]
    UnknownPage(String),
    #[error("Unknown descriptor '{name}' on page '{page}'")]
    UnknownDescriptor { page: String, name: String },
}

pub type Page = BTreeMap<String, ElementDescriptor>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescriptorCatalog {
    #[serde(default)]
    pub pages: BTreeMap<String, Page>,
}

impl DescriptorCatalog {
    pub async fn load_from(path: &Path) -> Result<Self, CatalogError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, CatalogError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn page(&self, page: &str) -> Result<&Page, CatalogError> {
        self.pages
            .get(page)
            .ok_or_else(|| CatalogError::UnknownPage(page.to_string()))
    }

    pub fn descriptor(&self, page: &str, name: &str) -> Result<&ElementDescriptor, CatalogError> {
        self.page(page)?
            .get(name)
            .ok_or_else(|| CatalogError::UnknownDescriptor {
                page: page.to_string(),
                name: name.to_string(),
            })
    }

    /// All descriptors on `page`, ordered by name.
    pub fn descriptors(&self, page: &str) -> Result<Vec<(&str, &ElementDescriptor)>, CatalogError> {
        Ok(self
            .page(page)?
            .iter()
            .map(|(name, d)| (name.as_str(), d))
            .collect())
    }
}
