// deployer/src/artifact.rs
// Resolves compiled contract blueprints from a Hardhat artifacts directory.

use crate::error::{DeployError, Result};
use ethers::{abi::Abi, types::Bytes};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

const BUILD_INFO_DIR: &str = "build-info";

/// A compiled contract ready to be instantiated on-chain.
#[derive(Debug, Clone)]
pub struct Blueprint {
    pub contract_name: String,
    pub source_name: String,
    pub abi: Abi,
    pub bytecode: Bytes,
}

impl Blueprint {
    /// `sourceName:contractName`, the form used to disambiguate artifacts.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// Number of arguments the constructor declares, zero if there is none.
    pub fn constructor_inputs(&self) -> usize {
        self.abi.constructor().map_or(0, |c| c.inputs.len())
    }
}

// Subset of the `hh-sol-artifact-1` format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatArtifact {
    contract_name: String,
    source_name: String,
    abi: Abi,
    bytecode: String,
    #[serde(default)]
    link_references: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Looks up a blueprint either by bare contract name or by fully
    /// qualified name (`contracts/Foo.sol:Foo`).
    #[instrument(skip(self), fields(root = %self.root.display()), level = "debug")]
    pub fn resolve(&self, name: &str) -> Result<Blueprint> {
        let path = self.artifact_path(name)?;
        debug!(path = %path.display(), "Artifact located");
        load_blueprint(&path)
    }

    fn artifact_path(&self, name: &str) -> Result<PathBuf> {
        if let Some((source, contract)) = name.rsplit_once(':') {
            let path = self.root.join(source).join(format!("{contract}.json"));
            return if path.is_file() {
                Ok(path)
            } else {
                Err(DeployError::BlueprintNotFound(name.to_string()))
            };
        }

        if !self.root.is_dir() {
            debug!("Artifacts directory does not exist");
            return Err(DeployError::BlueprintNotFound(name.to_string()));
        }

        let file_name = format!("{name}.json");
        let mut matches = Vec::new();
        collect_matches(&self.root, &file_name, &mut matches)?;

        match matches.len() {
            0 => Err(DeployError::BlueprintNotFound(name.to_string())),
            1 => Ok(matches.remove(0)),
            _ => {
                let mut candidates: Vec<String> = matches
                    .iter()
                    .map(|path| self.fully_qualified_name_of(path, name))
                    .collect();
                candidates.sort();
                Err(DeployError::AmbiguousBlueprint {
                    name: name.to_string(),
                    candidates,
                })
            }
        }
    }

    fn fully_qualified_name_of(&self, path: &Path, name: &str) -> String {
        let source = path
            .parent()
            .and_then(|dir| dir.strip_prefix(&self.root).ok())
            .map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_default();
        format!("{source}:{name}")
    }
}

fn collect_matches(dir: &Path, file_name: &str, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| DeployError::artifact(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| DeployError::artifact(dir, e))?;
        let path = entry.path();
        // Not followed through symlinks, so linked directories are never walked.
        let file_type = entry.file_type().map_err(|e| DeployError::artifact(&path, e))?;
        if file_type.is_dir() {
            if entry.file_name() == BUILD_INFO_DIR {
                continue;
            }
            collect_matches(&path, file_name, out)?;
        } else if entry.file_name() == file_name && path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn load_blueprint(path: &Path) -> Result<Blueprint> {
    let raw = fs::read_to_string(path).map_err(|e| DeployError::artifact(path, e))?;
    let artifact: HardhatArtifact =
        serde_json::from_str(&raw).map_err(|e| DeployError::artifact(path, e))?;

    let code = artifact.bytecode.trim().trim_start_matches("0x");
    if code.is_empty() {
        return Err(DeployError::AbstractContract(artifact.contract_name));
    }

    let mut libraries: Vec<String> = artifact
        .link_references
        .iter()
        .flat_map(|(source, libs)| libs.keys().map(move |lib| format!("{source}:{lib}")))
        .collect();
    if libraries.is_empty() && code.contains("__$") {
        libraries.push("unresolved library placeholder".to_string());
    }
    if !libraries.is_empty() {
        return Err(DeployError::UnlinkedLibraries {
            name: artifact.contract_name,
            libraries,
        });
    }

    let bytecode = hex::decode(code).map_err(|e| DeployError::artifact(path, e))?;

    Ok(Blueprint {
        contract_name: artifact.contract_name,
        source_name: artifact.source_name,
        abi: artifact.abi,
        bytecode: Bytes::from(bytecode),
    })
}
