//! Artifact registry backed by compiler build output on disk
//!
//! Reads both Hardhat artifacts (`artifacts/contracts/X.sol/X.json`, with a
//! top-level `bytecode` string and `linkReferences`) and Foundry artifacts
//! (`out/X.sol/X.json`, with `bytecode.object` and
//! `bytecode.linkReferences`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use linkdeploy_core::{
    bytecode::PLACEHOLDER_LEN, Abi, Artifact, ArtifactRegistry, BytecodeTemplate, Error,
    LibraryReference, Result,
};
use serde::Deserialize;

// =============================================================================
// Build Output Types
// =============================================================================

/// `linkReferences`: source file -> library name -> placeholder positions
type LinkReferences = BTreeMap<String, BTreeMap<String, Vec<LinkOffset>>>;

#[derive(Debug, Deserialize)]
struct LinkOffset {
    start: usize,
    length: usize,
}

/// A contract artifact as written by Hardhat or Foundry
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    abi: serde_json::Value,
    bytecode: RawBytecode,
    /// Hardhat keeps link references next to the bytecode string
    #[serde(default)]
    link_references: LinkReferences,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    Object {
        object: String,
        #[serde(default, rename = "linkReferences")]
        link_references: LinkReferences,
    },
}

impl RawArtifact {
    fn into_artifact(self, name: &str) -> Result<Artifact> {
        let (object, nested) = match self.bytecode {
            RawBytecode::Hex(object) => (object, LinkReferences::new()),
            RawBytecode::Object {
                object,
                link_references,
            } => (object, link_references),
        };

        let mut libraries = Vec::new();
        for (source, libs) in self.link_references.iter().chain(nested.iter()) {
            for (library, offsets) in libs {
                for offset in offsets {
                    if offset.length != PLACEHOLDER_LEN / 2 {
                        return Err(Error::invalid_artifact(
                            name,
                            format!(
                                "link reference for '{}' has length {}, expected 20",
                                library, offset.length
                            ),
                        ));
                    }
                    libraries.push(
                        LibraryReference::new(offset.start, library.as_str()).with_source(source),
                    );
                }
            }
        }

        let bytecode = BytecodeTemplate::parse(&object)
            .map_err(|e| Error::invalid_artifact(name, e.to_string()))?;
        let abi = Abi::from_value(&self.abi)?;

        Artifact::new(name, abi, bytecode, libraries)
    }
}

// =============================================================================
// Filesystem Implementation
// =============================================================================

/// Artifact registry that reads from the build output directory
#[derive(Debug, Clone)]
pub struct FileSystemRegistry {
    /// Directory containing compiled artifacts (`artifacts` or `out`)
    root: PathBuf,
}

impl FileSystemRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Every `<Name>.json` artifact file under the root, skipping debug,
    /// metadata and build-info files.
    fn artifact_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        if self.root.is_dir() {
            collect_artifact_files(&self.root, &mut files)?;
        }
        files.sort();
        Ok(files)
    }
}

fn collect_artifact_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if path.is_dir() {
            if file_name.starts_with('.') || file_name == "build-info" {
                continue;
            }
            collect_artifact_files(&path, files)?;
            continue;
        }

        let is_artifact = file_name.ends_with(".json")
            && !file_name.ends_with(".dbg.json")
            && !file_name.ends_with(".metadata.json");
        if is_artifact {
            files.push(path);
        }
    }
    Ok(())
}

fn contract_name(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|n| n.to_str())
}

impl ArtifactRegistry for FileSystemRegistry {
    fn load(&self, name: &str) -> Result<Artifact> {
        let matches: Vec<PathBuf> = self
            .artifact_files()?
            .into_iter()
            .filter(|path| contract_name(path) == Some(name))
            .collect();

        let path = match matches.as_slice() {
            [] => return Err(Error::ArtifactNotFound(name.to_string())),
            [path] => path,
            _ => {
                return Err(Error::invalid_artifact(
                    name,
                    format!("{} artifacts share this name", matches.len()),
                ))
            }
        };

        let content = std::fs::read_to_string(path)?;
        let raw: RawArtifact = serde_json::from_str(&content)?;
        raw.into_artifact(name)
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .artifact_files()?
            .iter()
            .filter_map(|path| contract_name(path).map(str::to_string))
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}
