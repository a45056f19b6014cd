//! End-to-end command flow against files in a temp directory.

use clap::Parser;
use mpreg_cli::{AppConfig, AppError, Application, Cli, Command, CommandOutput};
use mpreg_core::{Address, MarketplaceId};
use mpreg_gateway::GatewayError;
use mpreg_persistence::read_audit_log;
use mpreg_registry::RegistryError;
use tempfile::TempDir;

const OWNER: &str = "0x0101010101010101010101010101010101010101";
const NOT_OWNER: &str = "0x0202020202020202020202020202020202020202";
const ADMIN: &str = "0x0303030303030303030303030303030303030303";
const EXCHANGE: &str = "0x2988ae7f92f5c8cad1997ae5208aeaa68878f76d";

fn app(dir: &TempDir) -> Application {
    let config = AppConfig {
        state_file: dir.path().join("state/registry.json"),
        audit_dir: dir.path().join("audit"),
        ..AppConfig::default()
    };
    Application::new(config).unwrap()
}

fn command(args: &[&str]) -> Command {
    let mut argv = vec!["mpreg"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap().command
}

fn run(app: &Application, args: &[&str]) -> Result<CommandOutput, AppError> {
    app.execute(command(args))
}

fn create_args<'a>(from: &'a str, id: &'a str) -> Vec<&'a str> {
    vec![
        "create",
        "--from",
        from,
        "--id",
        id,
        "--url",
        "https://lockchain.co/marketplace",
        "--property-api",
        "https://lockchain.co/PropertyAPI",
        "--dispute-api",
        "https://lockchain.co/DisuputeAPI",
        "--exchange",
        EXCHANGE,
    ]
}

fn event_names(output: &CommandOutput) -> Vec<&'static str> {
    match output {
        CommandOutput::Events { events } => events.iter().map(|e| e.event.name()).collect(),
        other => panic!("expected events, got {other:?}"),
    }
}

fn audit_sequences(dir: &TempDir) -> Vec<u64> {
    let mut sequences: Vec<u64> = std::fs::read_dir(dir.path().join("audit"))
        .unwrap()
        .filter_map(|e| e.ok())
        .flat_map(|e| read_audit_log(e.path()).unwrap())
        .map(|envelope| envelope.sequence)
        .collect();
    sequences.sort_unstable();
    sequences
}

fn audit_lines(dir: &TempDir) -> usize {
    let audit = dir.path().join("audit");
    if !audit.exists() {
        return 0;
    }
    std::fs::read_dir(audit)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| read_audit_log(e.path()).unwrap().len())
        .sum()
}

#[test]
fn test_full_flow_persists_between_commands() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let out = run(&app, &["init", "--from", OWNER, "--deployment", "v1"]).unwrap();
    assert_eq!(event_names(&out), vec!["Initialized"]);

    let out = run(&app, &create_args(ADMIN, "5a9d0e1a87")).unwrap();
    assert_eq!(event_names(&out), vec!["LogCreateMarketplace"]);

    let out = run(&app, &["approve", "--from", OWNER, "--id", "5a9d0e1a87"]).unwrap();
    assert_eq!(event_names(&out), vec!["LogApproveMarketplace"]);

    // A fresh application reads the same files.
    let app = self::app(&dir);
    assert_eq!(
        run(&app, &["count"]).unwrap(),
        CommandOutput::Count { count: 1 }
    );
    assert_eq!(
        run(&app, &["id-at", "--index", "0"]).unwrap(),
        CommandOutput::MarketplaceId {
            id: MarketplaceId::from_label("5a9d0e1a87").unwrap()
        }
    );
    match run(&app, &["get", "--id", "5a9d0e1a87"]).unwrap() {
        CommandOutput::Marketplace(record) => {
            assert_eq!(record.admin, ADMIN.parse::<Address>().unwrap());
            assert!(record.approved);
        }
        other => panic!("unexpected output {other:?}"),
    }
    assert_eq!(
        run(&app, &["owner"]).unwrap(),
        CommandOutput::Owner {
            owner: OWNER.parse().unwrap()
        }
    );

    assert_eq!(audit_lines(&dir), 3);
}

#[test]
fn test_failed_write_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    run(&app, &["init", "--from", OWNER, "--deployment", "v1"]).unwrap();
    let before = std::fs::read_to_string(dir.path().join("state/registry.json")).unwrap();

    let err = run(&app, &["pause", "--from", NOT_OWNER]).unwrap_err();
    assert!(matches!(
        err,
        AppError::Gateway(GatewayError::Registry(RegistryError::Unauthorized { .. }))
    ));

    let after = std::fs::read_to_string(dir.path().join("state/registry.json")).unwrap();
    assert_eq!(before, after);
    assert_eq!(audit_lines(&dir), 1);
    assert_eq!(
        run(&app, &["paused"]).unwrap(),
        CommandOutput::Flag { value: false }
    );
}

#[test]
fn test_failed_save_writes_no_audit_event() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    run(&app, &["init", "--from", OWNER, "--deployment", "v1"]).unwrap();

    // A directory where the staged snapshot goes makes the save fail.
    std::fs::create_dir_all(dir.path().join("state/registry.json.tmp")).unwrap();

    let err = run(&app, &["pause", "--from", OWNER]).unwrap_err();
    assert!(matches!(err, AppError::Persistence(_)));
    assert_eq!(audit_lines(&dir), 1);
    assert_eq!(
        run(&app, &["paused"]).unwrap(),
        CommandOutput::Flag { value: false }
    );
}

#[test]
fn test_sequences_continue_across_commands() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    run(&app, &["init", "--from", OWNER, "--deployment", "v1"]).unwrap();
    run(&app, &["pause", "--from", OWNER]).unwrap();
    let _ = run(&app, &["pause", "--from", OWNER]).unwrap_err();
    run(&app, &["unpause", "--from", OWNER]).unwrap();

    assert_eq!(audit_sequences(&dir), vec![1, 2, 3]);
}

#[test]
fn test_commands_before_init() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let err = run(&app, &["count"]).unwrap_err();
    assert!(matches!(err, AppError::Gateway(GatewayError::NotInitialized)));

    let err = run(&app, &create_args(ADMIN, "m1")).unwrap_err();
    assert!(matches!(err, AppError::Gateway(GatewayError::NotInitialized)));
    assert!(!dir.path().join("state/registry.json").exists());

    let err = run(&app, &["init", "--from", OWNER, "--deployment", "v9"]).unwrap_err();
    assert!(matches!(err, AppError::UnknownDeployment(_)));
}

#[test]
fn test_upgrade_keeps_records() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    run(&app, &["init", "--from", OWNER, "--deployment", "v1"]).unwrap();
    run(&app, &create_args(ADMIN, "m1")).unwrap();
    run(&app, &["policy", "deactivate", "--from", OWNER]).unwrap();

    let err = run(&app, &["upgrade", "--from", NOT_OWNER, "--deployment", "v2"]).unwrap_err();
    assert!(matches!(err, AppError::Gateway(GatewayError::Unauthorized { .. })));

    let out = run(&app, &["upgrade", "--from", OWNER, "--deployment", "v2"]).unwrap();
    assert_eq!(event_names(&out), vec!["Upgraded"]);

    match run(&app, &["implementation"]).unwrap() {
        CommandOutput::Implementation { deployment, .. } => {
            assert_eq!(deployment.as_deref(), Some("v2"));
        }
        other => panic!("unexpected output {other:?}"),
    }
    assert_eq!(
        run(&app, &["count"]).unwrap(),
        CommandOutput::Count { count: 1 }
    );
    assert_eq!(
        run(&app, &["policy-status"]).unwrap(),
        CommandOutput::Flag { value: false }
    );

    // Created under the policy carried over from before the upgrade.
    run(&app, &create_args(ADMIN, "m2")).unwrap();
    match run(&app, &["get", "--id", "m2"]).unwrap() {
        CommandOutput::Marketplace(record) => assert!(record.approved),
        other => panic!("unexpected output {other:?}"),
    }
}

#[test]
fn test_snapshot_for_unknown_deployment_is_rejected() {
    let dir = TempDir::new().unwrap();
    run(&app(&dir), &["init", "--from", OWNER, "--deployment", "v2"]).unwrap();

    // Same files, but a config that no longer lists v2.
    let mut config = AppConfig {
        state_file: dir.path().join("state/registry.json"),
        audit_dir: dir.path().join("audit"),
        ..AppConfig::default()
    };
    config.deployments.retain(|d| d.name == "v1");
    let app = Application::new(config).unwrap();

    let err = run(&app, &["owner"]).unwrap_err();
    assert!(matches!(err, AppError::UnresolvedImplementation(_)));
}

#[test]
fn test_metrics_command_renders_text() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    run(&app, &["init", "--from", OWNER, "--deployment", "v1"]).unwrap();

    match run(&app, &["metrics"]).unwrap() {
        CommandOutput::Text(text) => {
            assert!(text.contains("mpreg_calls_total"));
            assert!(text.contains("mpreg_marketplaces"));
        }
        other => panic!("unexpected output {other:?}"),
    }
}
