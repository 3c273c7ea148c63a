//! On-disk catalog of density exemplars.
//!
//! Layout: `<root>/density/<low|medium|high>/1.<ext>`, one canonical image per
//! density level. A missing exemplar is a normal outcome, the simulation just
//! runs without a reference.

use crate::imaging::DataUri;
use crate::server::metrics;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Extensions tried, in order, for the canonical `1.<ext>` exemplar.
pub const REFERENCE_EXTENSIONS: [&str; 4] = [".jpg", ".JPG", ".jpeg", ".png"];

/// Simulated follicle density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Density {
    Low,
    #[default]
    Medium,
    High,
}

impl Density {
    /// Upper-case label, as used in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Density::Low => "LOW",
            Density::Medium => "MEDIUM",
            Density::High => "HIGH",
        }
    }

    /// Lower-case key, as used in the catalog layout.
    pub fn key(&self) -> &'static str {
        match self {
            Density::Low => "low",
            Density::Medium => "medium",
            Density::High => "high",
        }
    }
}

impl fmt::Display for Density {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Density {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Density::Low),
            "medium" => Ok(Density::Medium),
            "high" => Ok(Density::High),
            other => Err(format!("Unknown density level: {}", other)),
        }
    }
}

/// A catalog image supplied to the model as a density anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceExemplar {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ReferenceExemplar {
    pub fn to_data_uri(&self) -> DataUri {
        DataUri::from_bytes(self.mime_type.clone(), &self.bytes)
    }
}

fn mime_for(bytes: &[u8], extension: &str) -> String {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }
    if extension.to_ascii_lowercase().ends_with("png") {
        "image/png".to_string()
    } else {
        "image/jpeg".to_string()
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    root: PathBuf,
}

impl ReferenceCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn density_dir(&self, density: Density) -> PathBuf {
        self.root.join("density").join(density.key())
    }

    /// Returns the canonical exemplar for `density`, or `None` when no file
    /// exists at any of the [`REFERENCE_EXTENSIONS`].
    pub async fn select(&self, density: Density) -> Option<ReferenceExemplar> {
        let dir = self.density_dir(density);

        for extension in REFERENCE_EXTENSIONS {
            let path = dir.join(format!("1{}", extension));
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    let mime_type = mime_for(&bytes, extension);
                    debug!(
                        "Selected {} reference {:?} ({}, {} bytes)",
                        density,
                        path,
                        mime_type,
                        bytes.len()
                    );
                    metrics::record_reference_lookup(density.key(), "found");
                    return Some(ReferenceExemplar { mime_type, bytes });
                }
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!("Failed to read reference {:?}: {}", path, e);
                    continue;
                }
            }
        }

        if tokio::fs::metadata(&dir).await.is_ok() {
            warn!(
                "Reference directory {:?} exists but has no 1.<ext> exemplar for {}",
                dir, density
            );
        } else {
            debug!("No reference catalog for density {}", density);
        }
        metrics::record_reference_lookup(density.key(), "missing");
        None
    }
}
