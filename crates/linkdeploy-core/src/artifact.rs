//! Compiled artifacts and where to find them
//!
//! An [`Artifact`] is immutable once built: construction checks that its
//! declared library references and the placeholder markers in its bytecode
//! template line up one to one.

use std::collections::{BTreeMap, HashSet};

use crate::abi::Abi;
use crate::bytecode::{marker_matches, BytecodeTemplate};
use crate::error::{Error, Result};

// =============================================================================
// Library References
// =============================================================================

/// One placeholder slot in a bytecode template and the library that fills it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryReference {
    /// Byte offset of the 20-byte placeholder within the template
    pub offset: usize,
    /// Logical name of the library artifact
    pub library: String,
    /// Source file declaring the library, when the build output records it
    pub source: Option<String>,
}

impl LibraryReference {
    pub fn new(offset: usize, library: impl Into<String>) -> Self {
        Self {
            offset,
            library: library.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// `path/to/File.sol:Library`, if the source is known
    pub fn fully_qualified_name(&self) -> Option<String> {
        self.source
            .as_ref()
            .map(|source| format!("{}:{}", source, self.library))
    }
}

// =============================================================================
// Artifact
// =============================================================================

/// A compiled contract ready to be linked and deployed
#[derive(Debug, Clone)]
pub struct Artifact {
    name: String,
    abi: Abi,
    bytecode: BytecodeTemplate,
    libraries: Vec<LibraryReference>,
}

impl Artifact {
    /// Build an artifact, rejecting any mismatch between placeholder markers
    /// and library references.
    pub fn new(
        name: impl Into<String>,
        abi: Abi,
        bytecode: BytecodeTemplate,
        mut libraries: Vec<LibraryReference>,
    ) -> Result<Self> {
        let name = name.into();

        if bytecode.is_empty() {
            return Err(Error::invalid_artifact(
                &name,
                "no bytecode (may be an interface or abstract contract)",
            ));
        }

        let placeholders: HashSet<usize> = bytecode.placeholder_offsets().into_iter().collect();
        let mut seen = HashSet::new();
        for reference in &libraries {
            if !seen.insert(reference.offset) {
                return Err(Error::invalid_artifact(
                    &name,
                    format!("placeholder at byte {} is linked twice", reference.offset),
                ));
            }

            // Only marker starts count; an offset inside a marker would
            // overwrite code when linked.
            let marker = placeholders
                .get(&reference.offset)
                .and_then(|&offset| bytecode.marker_at(offset))
                .ok_or_else(|| {
                    Error::invalid_artifact(
                        &name,
                        format!(
                            "library '{}' has no placeholder at byte {}",
                            reference.library, reference.offset
                        ),
                    )
                })?;

            if let Some(fqn) = reference.fully_qualified_name() {
                if !marker_matches(marker, &fqn) {
                    return Err(Error::invalid_artifact(
                        &name,
                        format!(
                            "placeholder at byte {} does not belong to '{}'",
                            reference.offset, fqn
                        ),
                    ));
                }
            }
        }

        if let Some(offset) = bytecode
            .placeholder_offsets()
            .into_iter()
            .find(|offset| !seen.contains(offset))
        {
            return Err(Error::invalid_artifact(
                &name,
                format!("placeholder at byte {} has no library reference", offset),
            ));
        }

        libraries.sort_by_key(|reference| reference.offset);

        Ok(Self {
            name,
            abi,
            bytecode,
            libraries,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn abi(&self) -> &Abi {
        &self.abi
    }

    pub fn bytecode(&self) -> &BytecodeTemplate {
        &self.bytecode
    }

    /// Library references ordered by offset
    pub fn libraries(&self) -> &[LibraryReference] {
        &self.libraries
    }

    /// Distinct library names this artifact links against, in first-use order
    pub fn dependencies(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.libraries
            .iter()
            .map(|reference| reference.library.as_str())
            .filter(|library| seen.insert(*library))
            .collect()
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Source of compiled artifacts
pub trait ArtifactRegistry: Send + Sync {
    /// Load the artifact for a logical contract name
    fn load(&self, name: &str) -> Result<Artifact>;

    /// Names of all artifacts the registry can load
    fn list(&self) -> Result<Vec<String>>;
}

/// Registry backed by artifacts held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    artifacts: BTreeMap<String, Artifact>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, artifact: Artifact) {
        self.artifacts.insert(artifact.name().to_string(), artifact);
    }

    pub fn with(mut self, artifact: Artifact) -> Self {
        self.insert(artifact);
        self
    }
}

impl ArtifactRegistry for InMemoryRegistry {
    fn load(&self, name: &str) -> Result<Artifact> {
        self.artifacts
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ArtifactNotFound(name.to_string()))
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.artifacts.keys().cloned().collect())
    }
}
