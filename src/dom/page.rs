use std::path::Path;

use crate::dom::dom_model::Document;
use crate::dom::snapshot::{PageSnapshot, SnapshotNode};
use crate::error::{DomError, JobFillError};

/// A document together with the location it was loaded from.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub title: String,
    pub document: Document,
}

impl Page {
    pub fn new(url: &str, document: Document) -> Self {
        Self {
            url: url.to_string(),
            title: String::new(),
            document,
        }
    }

    pub fn from_snapshot(snapshot: &PageSnapshot) -> Result<Self, DomError> {
        Ok(Self {
            url: snapshot.url.clone(),
            title: snapshot.title.clone(),
            document: Document::from_snapshot(&snapshot.root)?,
        })
    }

    /// Load a page snapshot JSON file written by the DOM extractor.
    pub fn load(path: &Path) -> Result<Self, JobFillError> {
        let content = std::fs::read_to_string(path).map_err(|e| JobFillError::Io {
            context: format!("reading snapshot {}", path.display()),
            source: e,
        })?;
        let snapshot: PageSnapshot =
            serde_json::from_str(&content).map_err(|e| JobFillError::JsonParse {
                context: format!("snapshot {}", path.display()),
                source: e,
            })?;
        Ok(Self::from_snapshot(&snapshot)?)
    }

    pub fn to_snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            url: self.url.clone(),
            title: self.title.clone(),
            root: self
                .document
                .to_snapshot()
                .unwrap_or(SnapshotNode::Text { text: String::new() }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), JobFillError> {
        let json = serde_json::to_string_pretty(&self.to_snapshot()).map_err(|e| {
            JobFillError::JsonSerialize {
                context: "PageSnapshot".into(),
                source: e,
            }
        })?;
        std::fs::write(path, json).map_err(|e| JobFillError::Io {
            context: format!("writing snapshot {}", path.display()),
            source: e,
        })
    }

    /// Hostname of the page URL, or an empty string when it has none.
    pub fn domain(&self) -> String {
        page_domain(&self.url)
    }
}

pub fn page_domain(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}
