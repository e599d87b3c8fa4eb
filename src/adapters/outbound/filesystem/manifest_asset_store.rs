use crate::ports::outbound::{AssetStore, ResolvedAsset};
use crate::reference_index::domain::{AssetId, BuildStatus};
use crate::shared::error::IndexError;
use crate::shared::security::read_regular_file;
use crate::shared::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(default, rename = "asset")]
    assets: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    id: String,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    build: BuildStatus,
    #[serde(default)]
    kind: Option<String>,
}

#[derive(Debug, Clone)]
struct ManifestAsset {
    dependencies: Vec<AssetId>,
    build: BuildStatus,
    kind: Option<String>,
}

/// ManifestAssetStore adapter reading the asset universe from a TOML file
///
/// ```toml
/// [[asset]]
/// id = "Assets/Prefabs/Door.prefab"
/// dependencies = ["Assets/Materials/Wood.mat"]
/// build = "included"
/// kind = "Prefab"
/// ```
///
/// Dependencies may name ids that have no `[[asset]]` entry; those are
/// reported as unresolvable, like a broken reference in a real project.
#[derive(Debug)]
pub struct ManifestAssetStore {
    source: PathBuf,
    assets: BTreeMap<AssetId, ManifestAsset>,
}

impl ManifestAssetStore {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = read_regular_file(path, "asset manifest").map_err(|e| {
            IndexError::ManifestParseError {
                path: path.to_path_buf(),
                details: e.to_string(),
            }
        })?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source: &Path) -> Result<Self> {
        let parse_error = |details: String| IndexError::ManifestParseError {
            path: source.to_path_buf(),
            details,
        };

        let manifest: ManifestFile =
            toml::from_str(content).map_err(|e| parse_error(e.to_string()))?;

        let mut assets = BTreeMap::new();
        for entry in manifest.assets {
            let id = AssetId::new(entry.id).map_err(|e| parse_error(e.to_string()))?;
            let dependencies = entry
                .dependencies
                .into_iter()
                .map(AssetId::new)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| parse_error(format!("asset {}: {}", id, e)))?;

            let asset = ManifestAsset {
                dependencies,
                build: entry.build,
                kind: entry.kind,
            };
            if assets.insert(id.clone(), asset).is_some() {
                return Err(parse_error(format!("duplicate asset id: {}", id)).into());
            }
        }

        Ok(Self {
            source: source.to_path_buf(),
            assets,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    fn asset(&self, id: &AssetId) -> Result<&ManifestAsset> {
        self.assets.get(id).ok_or_else(|| {
            IndexError::UnknownAsset {
                id: id.to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl AssetStore for ManifestAssetStore {
    async fn list_all_asset_ids(&self) -> Result<Vec<AssetId>> {
        Ok(self.assets.keys().cloned().collect())
    }

    async fn forward_dependencies_of(&self, id: &AssetId) -> Result<Vec<AssetId>> {
        Ok(self.asset(id)?.dependencies.clone())
    }

    async fn resolve(&self, id: &AssetId) -> Result<Option<ResolvedAsset>> {
        Ok(self.assets.get(id).map(|asset| ResolvedAsset {
            id: id.clone(),
            kind: asset.kind.clone(),
        }))
    }

    async fn build_status_of(&self, id: &AssetId) -> Result<BuildStatus> {
        Ok(self.asset(id)?.build)
    }
}
