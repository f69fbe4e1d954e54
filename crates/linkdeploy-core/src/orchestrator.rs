//! Dependency-ordered deployment
//!
//! The [`Orchestrator`] drives one run: it checks the requested order
//! against the library dependencies, then for each artifact links it against
//! the addresses recorded so far, submits it through the [`Transport`] and
//! records the confirmed address. Deployment is strictly sequential and the
//! first failure aborts the rest of the run.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::accounts::Accounts;
use crate::artifact::{Artifact, ArtifactRegistry};
use crate::error::{Error, Result};
use crate::graph::{self, DependencyGraph};
use crate::linker::link;
use crate::resolver::AddressResolver;
use crate::transport::{DeployRequest, Transport};
use crate::types::{DeployedContract, DeploymentSpec, DeploymentState, RunConfig};

// =============================================================================
// Observer
// =============================================================================

/// Receives progress for each artifact of a run
pub trait DeployObserver: Send + Sync {
    /// Called whenever an artifact enters a new [`DeploymentState`]
    fn on_transition(&self, _name: &str, _state: DeploymentState) {}

    /// Called once an artifact is confirmed and recorded
    fn on_deployed(&self, _deployed: &DeployedContract) {}

    /// Called when an artifact fails, just before the run aborts
    fn on_failed(&self, _name: &str, _error: &Error) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl DeployObserver for NoopObserver {}

// =============================================================================
// Orchestrator
// =============================================================================

/// An artifact that passed preflight, with its arguments ready to submit
struct Prepared {
    artifact: Artifact,
    args: Vec<serde_json::Value>,
    encoded_args: Vec<u8>,
}

pub struct Orchestrator<R, T> {
    config: RunConfig,
    accounts: Accounts,
    registry: R,
    transport: T,
    resolver: AddressResolver,
    observer: Arc<dyn DeployObserver>,
    cancel: Option<watch::Receiver<bool>>,
}

impl<R: ArtifactRegistry, T: Transport> Orchestrator<R, T> {
    pub fn new(config: RunConfig, accounts: Accounts, registry: R, transport: T) -> Self {
        Self {
            config,
            accounts,
            registry,
            transport,
            resolver: AddressResolver::new(),
            observer: Arc::new(NoopObserver),
            cancel: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn DeployObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Stop before the next artifact once `cancel` turns true.
    ///
    /// The signal is only checked between deployments, never while a
    /// transaction is in flight.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    pub fn deployer(&self) -> Address {
        self.accounts.deployer().address()
    }

    /// Addresses recorded so far, including those of an aborted run
    pub fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    /// Reorder `specs` so every library comes before its dependents
    pub fn plan(&self, specs: &[DeploymentSpec]) -> Result<Vec<DeploymentSpec>> {
        graph::plan(&self.registry, specs)
    }

    /// Deploy `specs` in the given order.
    ///
    /// Everything that can be checked without the network is checked before
    /// the first transaction: artifacts exist, the dependency graph is
    /// acyclic, the order is valid and constructor arguments encode.
    pub async fn deploy(&mut self, specs: &[DeploymentSpec]) -> Result<Vec<DeployedContract>> {
        let prepared = self.preflight(specs)?;

        let actual = self.transport.chain_id().await?;
        if actual != self.config.chain_id {
            return Err(Error::ChainMismatch {
                expected: self.config.chain_id,
                actual,
            });
        }

        info!(
            network = %self.config.network,
            chain_id = actual,
            deployer = %self.deployer(),
            artifacts = prepared.len(),
            "Starting deployment run"
        );

        let mut deployed = Vec::with_capacity(prepared.len());
        for item in prepared {
            let name = item.artifact.name().to_string();
            let mut state = DeploymentState::Pending;
            debug!(artifact = %name, state = %state, "Deployment state changed");
            self.observer.on_transition(&name, state);

            match self.deploy_one(item, &mut state).await {
                Ok(contract) => {
                    self.observer.on_deployed(&contract);
                    deployed.push(contract);
                }
                Err(e) => {
                    warn!(artifact = %name, error = %e, "Deployment failed, aborting run");
                    self.transition(&name, &mut state, DeploymentState::Failed);
                    self.observer.on_failed(&name, &e);
                    return Err(e);
                }
            }
        }

        Ok(deployed)
    }

    fn preflight(&self, specs: &[DeploymentSpec]) -> Result<Vec<Prepared>> {
        let artifacts = graph::load_all(&self.registry, specs)?;

        let graph = DependencyGraph::build(&artifacts)?;
        graph.ensure_acyclic()?;
        graph.validate_order()?;

        specs
            .iter()
            .zip(artifacts)
            .map(|(spec, artifact)| {
                if self.resolver.contains(artifact.name()) {
                    return Err(Error::DuplicateDeployment(artifact.name().to_string()));
                }
                let args = self.accounts.resolve_args(&spec.args)?;
                let encoded_args = artifact
                    .abi()
                    .encode_constructor_args(&args)
                    .map_err(|e| match e {
                        Error::InvalidParameter(msg) => {
                            Error::InvalidParameter(format!("{}: {}", artifact.name(), msg))
                        }
                        other => other,
                    })?;
                Ok(Prepared {
                    artifact,
                    args,
                    encoded_args,
                })
            })
            .collect()
    }

    async fn deploy_one(
        &mut self,
        item: Prepared,
        state: &mut DeploymentState,
    ) -> Result<DeployedContract> {
        let name = item.artifact.name().to_string();

        if self.cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Err(Error::Cancelled(name));
        }

        let bytecode = link(&item.artifact, &self.resolver)?;
        self.transition(&name, state, DeploymentState::Linked);

        let bytecode_hash = bytecode.hash();
        let mut data = bytecode.into_bytes();
        data.extend_from_slice(&item.encoded_args);

        let request = DeployRequest {
            from: self.deployer(),
            data: Bytes::from(data),
        };
        self.transition(&name, state, DeploymentState::Submitted);
        let receipt = self.transport.deploy(request).await?;

        let contract = DeployedContract {
            name: name.clone(),
            address: receipt.contract_address,
            constructor_args: item.args,
            encoded_args: Bytes::from(item.encoded_args),
            tx_hash: Some(receipt.tx_hash),
            block_number: receipt.block_number,
            bytecode_hash,
        };
        self.resolver.record(contract.clone())?;
        self.transition(&name, state, DeploymentState::Confirmed);

        info!(
            artifact = %name,
            address = %contract.address,
            tx_hash = %receipt.tx_hash,
            "Contract deployed"
        );

        Ok(contract)
    }

    fn transition(&self, name: &str, state: &mut DeploymentState, next: DeploymentState) {
        debug_assert!(
            state.can_transition_to(next),
            "illegal transition for {}: {} -> {}",
            name,
            state,
            next
        );
        debug!(artifact = %name, from = %state, state = %next, "Deployment state changed");
        *state = next;
        self.observer.on_transition(name, next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::Abi;
    use crate::artifact::{InMemoryRegistry, LibraryReference};
    use crate::bytecode::{placeholder_for, BytecodeTemplate};
    use crate::error::TransportError;
    use crate::transport::DeployReceipt;
    use alloy::primitives::B256;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";
    const CHAIN_ID: u64 = 740;
    const DESCRIPTOR_SOURCE: &str = "contracts/libraries/NFTDescriptor.sol";
    const MAIN_ABI: &str = r#"[{
        "type": "constructor",
        "inputs": [
            {"name": "_bot", "type": "address"},
            {"name": "_treasury", "type": "address"}
        ],
        "stateMutability": "nonpayable"
    }]"#;

    fn descriptor_address() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn main_address() -> Address {
        Address::repeat_byte(0xbb)
    }

    /// Transport that replays scripted outcomes and records what it was sent
    struct MockTransport {
        chain_id: u64,
        outcomes: Mutex<Vec<std::result::Result<Address, TransportError>>>,
        requests: Arc<Mutex<Vec<DeployRequest>>>,
    }

    impl MockTransport {
        fn new(outcomes: Vec<std::result::Result<Address, TransportError>>) -> Self {
            Self {
                chain_id: CHAIN_ID,
                outcomes: Mutex::new(outcomes.into_iter().rev().collect()),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn requests(&self) -> Arc<Mutex<Vec<DeployRequest>>> {
            self.requests.clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn chain_id(&self) -> std::result::Result<u64, TransportError> {
            Ok(self.chain_id)
        }

        async fn deploy(
            &self,
            request: DeployRequest,
        ) -> std::result::Result<DeployReceipt, TransportError> {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            let n = requests.len() as u8;
            let outcome = self
                .outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(TransportError::Rpc("no scripted outcome".into())));
            outcome.map(|contract_address| DeployReceipt {
                contract_address,
                tx_hash: B256::repeat_byte(n),
                block_number: Some(100 + n as u64),
            })
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<(String, DeploymentState)>>,
    }

    impl DeployObserver for RecordingObserver {
        fn on_transition(&self, name: &str, state: DeploymentState) {
            self.events.lock().unwrap().push((name.to_string(), state));
        }
    }

    fn descriptor() -> Artifact {
        Artifact::new(
            "NFTDescriptor",
            Abi::default(),
            BytecodeTemplate::parse("0x608060405234801561001057600080fd5b50").unwrap(),
            vec![],
        )
        .unwrap()
    }

    fn main_contract() -> Artifact {
        let marker = placeholder_for(&format!("{}:NFTDescriptor", DESCRIPTOR_SOURCE));
        Artifact::new(
            "LiquidCanto",
            Abi::parse(MAIN_ABI).unwrap(),
            BytecodeTemplate::parse(&format!("0x6080604052{}5b00", marker)).unwrap(),
            vec![LibraryReference::new(5, "NFTDescriptor").with_source(DESCRIPTOR_SOURCE)],
        )
        .unwrap()
    }

    fn registry() -> InMemoryRegistry {
        InMemoryRegistry::new()
            .with(descriptor())
            .with(main_contract())
    }

    fn config() -> RunConfig {
        RunConfig {
            network: "canto_testnet".to_string(),
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: CHAIN_ID,
            mnemonic: TEST_MNEMONIC.to_string(),
        }
    }

    fn orchestrator<R: ArtifactRegistry>(
        registry: R,
        transport: MockTransport,
    ) -> Orchestrator<R, MockTransport> {
        let accounts = Accounts::from_mnemonic(TEST_MNEMONIC).unwrap();
        Orchestrator::new(config(), accounts, registry, transport)
    }

    fn specs() -> Vec<DeploymentSpec> {
        vec![
            DeploymentSpec::new("NFTDescriptor"),
            DeploymentSpec::new("LiquidCanto").with_args(vec![json!("@bot"), json!("@treasury")]),
        ]
    }

    #[tokio::test]
    async fn test_deploys_library_then_dependent() {
        let transport = MockTransport::new(vec![Ok(descriptor_address()), Ok(main_address())]);
        let requests = transport.requests();
        let mut orchestrator = orchestrator(registry(), transport);
        let accounts = orchestrator.accounts().clone();

        let deployed = orchestrator.deploy(&specs()).await.unwrap();

        let summary: Vec<_> = deployed.iter().map(|d| (d.name.as_str(), d.address)).collect();
        assert_eq!(
            summary,
            vec![
                ("NFTDescriptor", descriptor_address()),
                ("LiquidCanto", main_address())
            ]
        );

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.from == accounts.admin()));

        // bytecode prefix, linked library address, tail, then two address words
        let data = &requests[1].data;
        assert_eq!(&data[..5], &hex::decode("6080604052").unwrap()[..]);
        assert_eq!(&data[5..25], descriptor_address().as_slice());
        assert_eq!(&data[25..27], &[0x5b, 0x00]);
        assert_eq!(&data[27 + 12..27 + 32], accounts.bot().as_slice());
        assert_eq!(&data[27 + 44..27 + 64], accounts.treasury().as_slice());

        assert_eq!(
            deployed[1].constructor_args,
            vec![
                json!(accounts.bot().to_string()),
                json!(accounts.treasury().to_string())
            ]
        );
        assert_eq!(orchestrator.resolver().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_after_library_keeps_library_recorded() {
        let transport = MockTransport::new(vec![
            Ok(descriptor_address()),
            Err(TransportError::Reverted {
                tx_hash: "0x02".to_string(),
            }),
        ]);
        let observer = Arc::new(RecordingObserver::default());
        let mut orchestrator = orchestrator(registry(), transport).with_observer(observer.clone());

        let err = orchestrator.deploy(&specs()).await.unwrap_err();

        assert!(matches!(err, Error::Transport(TransportError::Reverted { .. })));
        let resolver = orchestrator.resolver();
        assert_eq!(
            resolver.get("NFTDescriptor", "test").unwrap(),
            descriptor_address()
        );
        assert!(!resolver.contains("LiquidCanto"));

        let events = observer.events.lock().unwrap();
        assert_eq!(
            events.last().unwrap(),
            &("LiquidCanto".to_string(), DeploymentState::Failed)
        );
    }

    #[tokio::test]
    async fn test_observer_sees_every_state() {
        let transport = MockTransport::new(vec![Ok(descriptor_address())]);
        let observer = Arc::new(RecordingObserver::default());
        let mut orchestrator =
            orchestrator(registry(), transport).with_observer(observer.clone());

        orchestrator
            .deploy(&[DeploymentSpec::new("NFTDescriptor")])
            .await
            .unwrap();

        let states: Vec<_> = observer
            .events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, s)| *s)
            .collect();
        assert_eq!(
            states,
            vec![
                DeploymentState::Pending,
                DeploymentState::Linked,
                DeploymentState::Submitted,
                DeploymentState::Confirmed
            ]
        );
    }

    fn assert_legal_sequences(events: &[(String, DeploymentState)]) {
        let mut current: std::collections::HashMap<&str, DeploymentState> = Default::default();
        for (name, state) in events {
            match current.insert(name.as_str(), *state) {
                None => assert_eq!(*state, DeploymentState::Pending),
                Some(previous) => assert!(
                    previous.can_transition_to(*state),
                    "{}: {} -> {}",
                    name,
                    previous,
                    state
                ),
            }
        }
    }

    #[tokio::test]
    async fn test_reported_transitions_are_legal() {
        let transport = MockTransport::new(vec![
            Ok(descriptor_address()),
            Err(TransportError::Rpc("timeout".into())),
        ]);
        let observer = Arc::new(RecordingObserver::default());
        let mut orchestrator = orchestrator(registry(), transport).with_observer(observer.clone());

        orchestrator.deploy(&specs()).await.unwrap_err();

        let events = observer.events.lock().unwrap();
        assert_legal_sequences(&events);
        assert_eq!(
            events
                .iter()
                .filter(|(name, _)| name == "LiquidCanto")
                .map(|(_, s)| *s)
                .collect::<Vec<_>>(),
            vec![
                DeploymentState::Pending,
                DeploymentState::Linked,
                DeploymentState::Submitted,
                DeploymentState::Failed
            ]
        );
    }

    #[tokio::test]
    async fn test_cancelled_artifact_fails_from_pending() {
        let (tx, rx) = watch::channel(true);
        let observer = Arc::new(RecordingObserver::default());
        let mut orchestrator = orchestrator(registry(), MockTransport::new(vec![]))
            .with_cancellation(rx)
            .with_observer(observer.clone());

        orchestrator.deploy(&specs()).await.unwrap_err();
        drop(tx);

        let events = observer.events.lock().unwrap();
        assert_legal_sequences(&events);
        assert_eq!(
            *events,
            vec![
                ("NFTDescriptor".to_string(), DeploymentState::Pending),
                ("NFTDescriptor".to_string(), DeploymentState::Failed)
            ]
        );
    }

    #[tokio::test]
    async fn test_wrong_order_fails_before_submitting() {
        let transport = MockTransport::new(vec![Ok(descriptor_address()), Ok(main_address())]);
        let requests = transport.requests();
        let mut orchestrator = orchestrator(registry(), transport);

        let mut reversed = specs();
        reversed.reverse();
        let err = orchestrator.deploy(&reversed).await.unwrap_err();

        assert!(matches!(
            err,
            Error::UnresolvedDependency { ref library, .. } if library == "NFTDescriptor"
        ));
        assert!(requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cycle_is_rejected_before_submitting() {
        let x_marker = placeholder_for("Y");
        let y_marker = placeholder_for("X");
        let registry = InMemoryRegistry::new()
            .with(
                Artifact::new(
                    "X",
                    Abi::default(),
                    BytecodeTemplate::parse(&format!("60{}", x_marker)).unwrap(),
                    vec![LibraryReference::new(1, "Y")],
                )
                .unwrap(),
            )
            .with(
                Artifact::new(
                    "Y",
                    Abi::default(),
                    BytecodeTemplate::parse(&format!("60{}", y_marker)).unwrap(),
                    vec![LibraryReference::new(1, "X")],
                )
                .unwrap(),
            );
        let transport = MockTransport::new(vec![]);
        let requests = transport.requests();
        let mut orchestrator = orchestrator(registry, transport);

        let specs = [DeploymentSpec::new("X"), DeploymentSpec::new("Y")];
        assert!(matches!(
            orchestrator.deploy(&specs).await,
            Err(Error::DependencyCycle(_))
        ));
        assert!(matches!(
            orchestrator.plan(&specs),
            Err(Error::DependencyCycle(_))
        ));
        assert!(requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_artifact() {
        let transport = MockTransport::new(vec![]);
        let requests = transport.requests();
        let mut orchestrator = orchestrator(InMemoryRegistry::new().with(descriptor()), transport);

        let err = orchestrator.deploy(&specs()).await.unwrap_err();

        assert!(matches!(err, Error::ArtifactNotFound(ref n) if n == "LiquidCanto"));
        assert!(requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_constructor_args_fail_before_submitting() {
        let transport = MockTransport::new(vec![Ok(descriptor_address())]);
        let requests = transport.requests();
        let mut orchestrator = orchestrator(registry(), transport);

        let specs = [
            DeploymentSpec::new("NFTDescriptor"),
            DeploymentSpec::new("LiquidCanto").with_args(vec![json!("@bot")]),
        ];
        let err = orchestrator.deploy(&specs).await.unwrap_err();

        assert!(matches!(err, Error::InvalidParameter(_)));
        assert!(requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_chain_mismatch_submits_nothing() {
        let mut transport = MockTransport::new(vec![Ok(descriptor_address())]);
        transport.chain_id = 1;
        let requests = transport.requests();
        let mut orchestrator = orchestrator(registry(), transport);

        let err = orchestrator.deploy(&specs()).await.unwrap_err();

        assert!(matches!(
            err,
            Error::ChainMismatch {
                expected: CHAIN_ID,
                actual: 1
            }
        ));
        assert!(requests.lock().unwrap().is_empty());
    }

    /// Raises the cancellation signal as soon as the first contract lands
    struct CancelAfterFirst(watch::Sender<bool>);

    impl DeployObserver for CancelAfterFirst {
        fn on_deployed(&self, _deployed: &DeployedContract) {
            let _ = self.0.send(true);
        }
    }

    #[tokio::test]
    async fn test_cancellation_between_steps() {
        let (tx, rx) = watch::channel(false);
        let transport = MockTransport::new(vec![Ok(descriptor_address()), Ok(main_address())]);
        let requests = transport.requests();
        let mut orchestrator = orchestrator(registry(), transport)
            .with_cancellation(rx)
            .with_observer(Arc::new(CancelAfterFirst(tx)));

        let err = orchestrator.deploy(&specs()).await.unwrap_err();

        assert!(matches!(err, Error::Cancelled(ref n) if n == "LiquidCanto"));
        assert_eq!(requests.lock().unwrap().len(), 1);
        assert!(orchestrator.resolver().contains("NFTDescriptor"));
    }

    #[tokio::test]
    async fn test_second_run_on_same_resolver_is_duplicate() {
        let transport = MockTransport::new(vec![Ok(descriptor_address())]);
        let mut orchestrator = orchestrator(registry(), transport);
        let only_library = [DeploymentSpec::new("NFTDescriptor")];

        orchestrator.deploy(&only_library).await.unwrap();
        let err = orchestrator.deploy(&only_library).await.unwrap_err();

        assert!(matches!(err, Error::DuplicateDeployment(ref n) if n == "NFTDescriptor"));
    }

    #[test]
    fn test_plan_reorders_reversed_specs() {
        let orchestrator = orchestrator(registry(), MockTransport::new(vec![]));

        let mut reversed = specs();
        reversed.reverse();
        let planned = orchestrator.plan(&reversed).unwrap();

        assert_eq!(planned, specs());
    }
}
