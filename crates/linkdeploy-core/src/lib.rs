pub mod abi;
pub mod accounts;
pub mod artifact;
pub mod bytecode;
pub mod dir;
pub mod error;
pub mod graph;
pub mod linker;
pub mod orchestrator;
pub mod report;
pub mod resolver;
pub mod transport;
pub mod types;

pub use abi::{json_to_sol_value, parse_int, parse_uint, Abi, ConstructorInfo, ParamInfo};
pub use accounts::Accounts;
pub use artifact::{Artifact, ArtifactRegistry, InMemoryRegistry, LibraryReference};
pub use bytecode::{Bytecode, BytecodeTemplate};
pub use dir::DeploymentsDir;
pub use error::{Error, Result, TransportError};
pub use graph::DependencyGraph;
pub use linker::link;
pub use orchestrator::{DeployObserver, NoopObserver, Orchestrator};
pub use report::RunReport;
pub use resolver::AddressResolver;
pub use transport::{DeployReceipt, DeployRequest, Transport};
pub use types::*;
