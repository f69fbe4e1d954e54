//! Library linking
//!
//! Fills every placeholder marker of an artifact with the address its
//! library was deployed at. Linking performs no I/O: the same artifact and
//! resolver state always give the same bytecode.

use alloy::primitives::Address;

use crate::artifact::Artifact;
use crate::bytecode::Bytecode;
use crate::error::{Error, Result};
use crate::resolver::AddressResolver;

/// Produce deployable bytecode for `artifact`.
///
/// Fails with [`Error::UnresolvedDependency`] naming the first library that
/// has not been recorded in `resolver`.
pub fn link(artifact: &Artifact, resolver: &AddressResolver) -> Result<Bytecode> {
    let slots = artifact
        .libraries()
        .iter()
        .map(|reference| {
            resolver
                .get(&reference.library, artifact.name())
                .map(|address| (reference.offset, address))
        })
        .collect::<Result<Vec<(usize, Address)>>>()?;

    artifact
        .bytecode()
        .substitute(&slots)
        .map_err(|e| Error::invalid_artifact(artifact.name(), e.to_string()))
}
