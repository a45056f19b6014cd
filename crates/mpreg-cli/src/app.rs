//! Application: one command per process against a persisted gateway.
//!
//! Flow for a state-changing command:
//! 1. Load the gateway snapshot (or start uninitialized)
//! 2. Execute exactly one call as the `--from` identity
//! 3. Save the snapshot, only if the call succeeded
//! 4. Append the published events to the audit log, only if the save did

use crate::cli::{Command, PolicyAction};
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use mpreg_core::{Address, EventEnvelope, LogicHandle, MarketplaceId, MarketplaceRecord};
use mpreg_gateway::{Gateway, GatewaySnapshot};
use mpreg_persistence::{AuditLogWriter, SnapshotStore};
use mpreg_registry::{MarketplaceRegistry, RegistryLogic};
use mpreg_telemetry::Metrics;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a command, printed by the binary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandOutput {
    Events { events: Vec<EventEnvelope> },
    Marketplace(MarketplaceRecord),
    MarketplaceId { id: MarketplaceId },
    Count { count: u64 },
    Flag { value: bool },
    Owner { owner: Address },
    Implementation {
        implementation: LogicHandle,
        deployment: Option<String>,
        version: String,
    },
    Text(String),
}

/// A configured logic deployment.
struct Deployment {
    name: String,
    logic: Arc<dyn RegistryLogic>,
}

/// Main application.
pub struct Application {
    config: AppConfig,
    /// Deployments by address.
    deployments: BTreeMap<Address, Deployment>,
    store: SnapshotStore,
}

impl Application {
    /// Create the application, deploying every configured logic module.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;

        let mut deployments = BTreeMap::new();
        for entry in &config.deployments {
            let handle = entry.handle()?;
            debug!(name = %entry.name, %handle, "Deployment registered");
            deployments.insert(
                handle.address(),
                Deployment {
                    name: entry.name.clone(),
                    logic: Arc::new(MarketplaceRegistry::new(handle)),
                },
            );
        }

        let store = SnapshotStore::new(config.state_file.clone());
        Ok(Self {
            config,
            deployments,
            store,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run one command.
    pub fn execute(&self, command: Command) -> AppResult<CommandOutput> {
        let op = command_name(&command);
        let mut gateway = self.load_gateway()?;

        let result = if command.is_write() {
            self.execute_write(&mut gateway, command)
        } else {
            self.execute_read(&mut gateway, command)
        };

        match &result {
            Ok(_) => Metrics::call_ok(op),
            Err(e) => {
                warn!(op, kind = e.kind(), error = %e, "Command failed");
                Metrics::call_failed(op, e.kind());
            }
        }
        result
    }

    fn execute_write(&self, gateway: &mut Gateway, command: Command) -> AppResult<CommandOutput> {
        let mut rx = gateway.subscribe();

        match command {
            Command::Init { from, deployment } => {
                let logic = self.logic_by_name(&deployment)?;
                gateway.initialize(from, logic)?;
            }
            Command::Upgrade { from, deployment } => {
                let logic = self.logic_by_name(&deployment)?;
                gateway.upgrade_implementation(from, logic)?;
                Metrics::upgrade_completed();
            }
            Command::TransferOwnership { from, to } => {
                gateway.transfer_ownership(from, to)?;
            }
            Command::Create { from, id, fields } => {
                gateway
                    .marketplace()
                    .create_marketplace(from, id, fields.into())?;
            }
            Command::Update {
                from,
                id,
                fields,
                admin,
            } => {
                gateway
                    .marketplace()
                    .update_marketplace(from, id, fields.into(), admin)?;
            }
            Command::Approve { from, id } => {
                gateway.marketplace().approve_marketplace(from, id)?;
            }
            Command::Reject { from, id } => {
                gateway.marketplace().reject_marketplace(from, id)?;
            }
            Command::Policy { from, action } => {
                let mut mp = gateway.marketplace();
                match action {
                    PolicyAction::Activate => mp.activate_approval_policy(from)?,
                    PolicyAction::Deactivate => mp.deactivate_approval_policy(from)?,
                };
            }
            Command::Pause { from } => {
                gateway.marketplace().pause(from)?;
            }
            Command::Unpause { from } => {
                gateway.marketplace().unpause(from)?;
            }
            read => return self.execute_read(gateway, read),
        }

        let mut events = Vec::new();
        while let Ok(envelope) = rx.try_recv() {
            events.push(envelope);
        }

        self.store.save(&gateway.snapshot()?)?;

        let mut audit = AuditLogWriter::new(&self.config.audit_dir, self.config.audit_buffer_size)?;
        for envelope in &events {
            Metrics::event_committed(envelope.event.name());
            audit.append(envelope.clone())?;
        }
        audit.close()?;

        let state = gateway.state();
        Metrics::registry_state(state.count(), state.is_paused());

        info!(events = events.len(), "Command committed");
        Ok(CommandOutput::Events { events })
    }

    fn execute_read(&self, gateway: &mut Gateway, command: Command) -> AppResult<CommandOutput> {
        let output = match command {
            Command::Get { id } => CommandOutput::Marketplace(gateway.marketplace().get_marketplace(id)?),
            Command::IdAt { index } => CommandOutput::MarketplaceId {
                id: gateway.marketplace().get_marketplace_id(index)?,
            },
            Command::Count => CommandOutput::Count {
                count: gateway.marketplace().marketplaces_count()?,
            },
            Command::PolicyStatus => CommandOutput::Flag {
                value: gateway.marketplace().is_approval_policy_active()?,
            },
            Command::Paused => CommandOutput::Flag {
                value: gateway.marketplace().is_paused()?,
            },
            Command::Owner => CommandOutput::Owner {
                owner: gateway.owner()?,
            },
            Command::Implementation => {
                let implementation = gateway.implementation()?;
                CommandOutput::Implementation {
                    implementation,
                    deployment: self
                        .deployments
                        .get(&implementation.address())
                        .map(|d| d.name.clone()),
                    version: gateway.logic_version()?,
                }
            }
            Command::Metrics => {
                let state = gateway.state();
                Metrics::registry_state(state.count(), state.is_paused());
                CommandOutput::Text(Metrics::gather_text()?)
            }
            write => {
                return Err(AppError::Config(format!(
                    "{} is not a read command",
                    command_name(&write)
                )))
            }
        };
        Ok(output)
    }

    /// Load the persisted gateway, or a fresh uninitialized one.
    pub fn load_gateway(&self) -> AppResult<Gateway> {
        let Some(snapshot) = self.store.load::<GatewaySnapshot>()? else {
            debug!(path = %self.store.path().display(), "Starting uninitialized gateway");
            return Ok(Gateway::new());
        };

        let implementation = snapshot.reference.implementation;
        let deployment = self
            .deployments
            .get(&implementation.address())
            .ok_or_else(|| AppError::UnresolvedImplementation(implementation.to_string()))?;
        Ok(Gateway::restore(snapshot, Arc::clone(&deployment.logic))?)
    }

    fn logic_by_name(&self, name: &str) -> AppResult<Arc<dyn RegistryLogic>> {
        self.deployments
            .values()
            .find(|d| d.name == name)
            .map(|d| Arc::clone(&d.logic))
            .ok_or_else(|| AppError::UnknownDeployment(name.to_string()))
    }
}

/// Metric label for a command.
fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Init { .. } => "initialize",
        Command::Upgrade { .. } => "upgradeImplementation",
        Command::TransferOwnership { .. } => "transferOwnership",
        Command::Create { .. } => "createMarketplace",
        Command::Update { .. } => "updateMarketplace",
        Command::Approve { .. } => "approveMarketplace",
        Command::Reject { .. } => "rejectMarketplace",
        Command::Policy {
            action: PolicyAction::Activate,
            ..
        } => "activateApprovalPolicy",
        Command::Policy {
            action: PolicyAction::Deactivate,
            ..
        } => "deactivateApprovalPolicy",
        Command::Pause { .. } => "pause",
        Command::Unpause { .. } => "unpause",
        Command::Get { .. } => "getMarketplace",
        Command::IdAt { .. } => "getMarketplaceId",
        Command::Count => "marketplacesCount",
        Command::PolicyStatus => "isApprovalPolicyActive",
        Command::Paused => "isPaused",
        Command::Owner => "getOwner",
        Command::Implementation => "getImplementation",
        Command::Metrics => "metrics",
    }
}

