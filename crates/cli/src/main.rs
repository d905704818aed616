use clap::{Parser, Subcommand};
use consent_core::{
    config::core_config_from_lookup, BridgeError, BridgeResult, Connectivity, ConnectivityCheck,
    ConsentDispatcher, CoreConfig, DispatchOutcome, RedcapClient, TransferOutcome,
    TransferService,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod qc;

#[derive(Parser)]
#[command(name = "consent")]
#[command(about = "consent-sync command-line tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Transfer a record from the source project to the consent project
    Transfer {
        /// Record ID in the source project
        record_id: String,
    },
    /// Fire the consent alert for a transferred record
    Dispatch {
        /// Record ID in the consent project
        record_id: String,
    },
    /// Check that the REDCap host answers
    Check,
    /// Run GET /transfer against a running server for a range of record IDs
    Qc {
        /// First record ID
        #[arg(long, default_value_t = 30)]
        from: u32,
        /// Last record ID (inclusive)
        #[arg(long, default_value_t = 45)]
        to: u32,
        /// Base URL of the consent-sync server
        #[arg(long, default_value = "http://127.0.0.1:5000")]
        server: String,
    },
}

/// Any failure not covered by a more specific code.
const EXIT_FAILURE: i32 = 1;
/// No usable record ID was given.
const EXIT_INVALID_REQUEST: i32 = 2;
/// The source project has no such record.
const EXIT_NOT_FOUND: i32 = 3;

fn config_from_env() -> Result<CoreConfig, Box<dyn std::error::Error>> {
    Ok(core_config_from_lookup(|name| std::env::var(name).ok())?)
}

/// Process exit code for the result of a transfer or dispatch.
fn exit_code<T>(result: &BridgeResult<T>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(BridgeError::InvalidRequest(_)) => EXIT_INVALID_REQUEST,
        Err(BridgeError::NotFound(_)) => EXIT_NOT_FOUND,
        Err(_) => EXIT_FAILURE,
    }
}

/// Like [`exit_code`], but a rejected alert update also fails.
fn dispatch_exit_code(result: &BridgeResult<DispatchOutcome>) -> i32 {
    match result {
        Ok(DispatchOutcome::DispatchFailed { .. }) => EXIT_FAILURE,
        _ => exit_code(result),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let code = match cli.command {
        Some(Commands::Transfer { record_id }) => {
            let cfg = config_from_env()?;
            let service = TransferService::new(Arc::new(RedcapClient::new(&cfg)?));
            let outcome = service.transfer(&record_id).await;
            match &outcome {
                Ok(TransferOutcome::Committed { result, status }) => println!(
                    "Transferred record {} (status {}). Consent: {}",
                    result.record_id, status, result.consent_state
                ),
                Ok(TransferOutcome::CommittedWithUpstreamWarning {
                    result,
                    status,
                    body,
                }) => println!(
                    "Transferred record {} with warning: status {}: {}. Consent: {}",
                    result.record_id, status, body, result.consent_state
                ),
                Err(e) => eprintln!("Error transferring record: {}", e),
            }
            exit_code(&outcome)
        }
        Some(Commands::Dispatch { record_id }) => {
            let cfg = config_from_env()?;
            let dispatcher = ConsentDispatcher::new(Arc::new(RedcapClient::new(&cfg)?));
            let outcome = dispatcher.dispatch(&record_id).await;
            match &outcome {
                Ok(DispatchOutcome::Dispatched(branch)) => {
                    println!("Triggered {} consent alert for record {}", branch, record_id)
                }
                Ok(DispatchOutcome::NoActionTaken { consent_code }) => println!(
                    "No consent alert sent for record {} (choice: {:?})",
                    record_id, consent_code
                ),
                Ok(DispatchOutcome::DispatchFailed { status, body }) => eprintln!(
                    "REDCap rejected the alert for record {}: status {}: {}",
                    record_id, status, body
                ),
                Err(e) => eprintln!("Error dispatching consent alert: {}", e),
            }
            dispatch_exit_code(&outcome)
        }
        Some(Commands::Check) => {
            let cfg = config_from_env()?;
            let check = ConnectivityCheck::new(&cfg)?;
            match check.check().await {
                Connectivity::Reachable(status) => {
                    println!("REDCap connection check: {} - {}", status, check.probe_url());
                    0
                }
                Connectivity::Unreachable(reason) => {
                    eprintln!("Could not verify REDCap connection: {}", reason);
                    EXIT_FAILURE
                }
            }
        }
        Some(Commands::Qc { from, to, server }) => {
            let verdicts = qc::run(&server, from, to).await;
            let passed = verdicts.iter().filter(|(_, v)| v.is_success()).count();
            println!("{} of {} records synced", passed, verdicts.len());
            if passed < verdicts.len() {
                EXIT_FAILURE
            } else {
                0
            }
        }
        None => {
            println!("Use 'consent --help' for commands");
            0
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use consent_core::store::StoreError;
    use consent_core::{ConsentBranch, RecordId, Store};

    #[test]
    fn test_exit_code_success() {
        let ok: BridgeResult<()> = Ok(());
        assert_eq!(exit_code(&ok), 0);
    }

    #[test]
    fn test_exit_code_distinguishes_failures() {
        let missing_id: BridgeResult<()> =
            Err(BridgeError::InvalidRequest("no record ID provided".into()));
        let not_found: BridgeResult<()> =
            Err(BridgeError::NotFound(RecordId::parse("99").unwrap()));
        let upstream: BridgeResult<()> =
            Err(BridgeError::UpstreamUnavailable(StoreError::Status {
                store: Store::Source,
                status: 503,
                body: "down".into(),
            }));
        let unavailable: BridgeResult<()> = Err(BridgeError::RecordUnavailable {
            record_id: RecordId::parse("42").unwrap(),
            reason: "no record returned".into(),
        });

        assert_eq!(exit_code(&missing_id), EXIT_INVALID_REQUEST);
        assert_eq!(exit_code(&not_found), EXIT_NOT_FOUND);
        assert_eq!(exit_code(&upstream), EXIT_FAILURE);
        assert_eq!(exit_code(&unavailable), EXIT_FAILURE);

        let codes = [EXIT_FAILURE, EXIT_INVALID_REQUEST, EXIT_NOT_FOUND];
        assert!(codes.iter().all(|&c| c != 0));
    }

    #[test]
    fn test_dispatch_exit_code() {
        let dispatched = Ok(DispatchOutcome::Dispatched(ConsentBranch::InPerson));
        let no_action = Ok(DispatchOutcome::NoActionTaken {
            consent_code: String::new(),
        });
        let rejected = Ok(DispatchOutcome::DispatchFailed {
            status: 403,
            body: "forbidden".into(),
        });
        let missing_id = Err(BridgeError::InvalidRequest("no record ID provided".into()));

        assert_eq!(dispatch_exit_code(&dispatched), 0);
        assert_eq!(dispatch_exit_code(&no_action), 0);
        assert_eq!(dispatch_exit_code(&rejected), EXIT_FAILURE);
        assert_eq!(dispatch_exit_code(&missing_id), EXIT_INVALID_REQUEST);
    }
}
