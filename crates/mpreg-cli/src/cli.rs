//! Command-line surface.

use clap::{Args, Parser, Subcommand, ValueEnum};
use mpreg_core::{parse_address, Address, MarketplaceFields, MarketplaceId};

/// Upgradeable marketplace registry operator
#[derive(Parser, Debug)]
#[command(name = "mpreg", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (can also be set via MPREG_CONFIG env var)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Initialize the gateway; the caller becomes owner
    Init {
        #[arg(long, value_parser = address_arg)]
        from: Address,
        /// Deployment name from the config
        #[arg(long)]
        deployment: String,
    },
    /// Point the gateway at another deployment (owner only)
    Upgrade {
        #[arg(long, value_parser = address_arg)]
        from: Address,
        #[arg(long)]
        deployment: String,
    },
    /// Hand ownership to another identity (owner only)
    TransferOwnership {
        #[arg(long, value_parser = address_arg)]
        from: Address,
        #[arg(long, value_parser = address_arg)]
        to: Address,
    },
    /// Register a marketplace; the caller becomes its admin
    Create {
        #[arg(long, value_parser = address_arg)]
        from: Address,
        #[arg(long, value_parser = id_arg)]
        id: MarketplaceId,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Replace a marketplace's fields and admin (admin only)
    Update {
        #[arg(long, value_parser = address_arg)]
        from: Address,
        #[arg(long, value_parser = id_arg)]
        id: MarketplaceId,
        #[command(flatten)]
        fields: FieldArgs,
        /// New admin (may equal the current one)
        #[arg(long, value_parser = address_arg)]
        admin: Address,
    },
    /// Approve a marketplace (owner only)
    Approve {
        #[arg(long, value_parser = address_arg)]
        from: Address,
        #[arg(long, value_parser = id_arg)]
        id: MarketplaceId,
    },
    /// Revoke a marketplace's approval (owner only)
    Reject {
        #[arg(long, value_parser = address_arg)]
        from: Address,
        #[arg(long, value_parser = id_arg)]
        id: MarketplaceId,
    },
    /// Switch the approval policy (owner only)
    Policy {
        #[arg(long, value_parser = address_arg)]
        from: Address,
        #[arg(value_enum)]
        action: PolicyAction,
    },
    /// Halt every registry write (owner only)
    Pause {
        #[arg(long, value_parser = address_arg)]
        from: Address,
    },
    /// Resume registry writes (owner only)
    Unpause {
        #[arg(long, value_parser = address_arg)]
        from: Address,
    },
    /// Show a marketplace record
    Get {
        #[arg(long, value_parser = id_arg)]
        id: MarketplaceId,
    },
    /// Show the id at an enumeration position
    IdAt {
        #[arg(long)]
        index: u64,
    },
    /// Number of registered marketplaces
    Count,
    /// Whether new marketplaces need approval
    PolicyStatus,
    /// Whether the registry is paused
    Paused,
    /// Current owner
    Owner,
    /// Current implementation handle
    Implementation,
    /// Prometheus metrics for the current state
    Metrics,
}

impl Command {
    /// Whether the command changes persisted state.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::Init { .. }
                | Self::Upgrade { .. }
                | Self::TransferOwnership { .. }
                | Self::Create { .. }
                | Self::Update { .. }
                | Self::Approve { .. }
                | Self::Reject { .. }
                | Self::Policy { .. }
                | Self::Pause { .. }
                | Self::Unpause { .. }
        )
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct FieldArgs {
    #[arg(long)]
    pub url: String,
    #[arg(long)]
    pub property_api: String,
    #[arg(long)]
    pub dispute_api: String,
    /// Exchange contract address
    #[arg(long, value_parser = address_arg)]
    pub exchange: Address,
}

impl From<FieldArgs> for MarketplaceFields {
    fn from(args: FieldArgs) -> Self {
        MarketplaceFields::new(args.url, args.property_api, args.dispute_api, args.exchange)
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyAction {
    Activate,
    Deactivate,
}

fn address_arg(s: &str) -> Result<Address, String> {
    parse_address(s).map_err(|e| e.to_string())
}

fn id_arg(s: &str) -> Result<MarketplaceId, String> {
    MarketplaceId::parse(s).map_err(|e| e.to_string())
}
