use std::{fs, io::ErrorKind, os::unix::fs::FileTypeExt, path::Path, sync::Arc};

use anyhow::{Context, Result, bail};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{UnixListener, UnixStream},
    signal::unix::{SignalKind, signal},
    sync::mpsc,
};

use crate::{
    config::Config,
    evaluator::{EvaluatorCache, EvaluatorDiscovery, UnitLoader, builtin_catalog},
    orchestrator::{AllowedActionsService, RuleEvaluationOrchestrator},
    permission::{InMemoryDirectory, PermissionGate},
    protocol::{ClientMessage, ServerMessage, encode_server_message, parse_client_message},
};

enum ExitReason {
    SocketMessage,
    Signal(&'static str),
}

/// Wires the built-in catalog, discovery, cache and seeded directory together.
pub fn assemble_service(config: &Config) -> Result<AllowedActionsService> {
    let catalog = builtin_catalog()
        .build()
        .context("failed to build evaluator catalog")?;
    let loader: Arc<dyn UnitLoader> = Arc::new(catalog);
    let discovery = Arc::new(EvaluatorDiscovery::new(
        Arc::clone(&loader),
        config.discovery.unit_suffix.clone(),
    ));
    let cache = Arc::new(EvaluatorCache::new(discovery));
    let directory = Arc::new(InMemoryDirectory::from_seed(&config.directory));
    let gate = Arc::new(PermissionGate::new(directory, config.permissions.clone()));
    let orchestrator = RuleEvaluationOrchestrator::new(
        Arc::clone(&gate),
        cache,
        loader,
        config.discovery.search_path.clone(),
    );
    Ok(AllowedActionsService::new(gate, orchestrator))
}

pub async fn run(config: Config) -> Result<()> {
    let socket_path = config.server.socket_path.clone();
    let service = Arc::new(assemble_service(&config)?);

    prepare_socket_path(&socket_path)?;
    let listener = UnixListener::bind(&socket_path)
        .with_context(|| format!("unable to bind socket {}", socket_path.display()))?;

    let mut sigint =
        signal(SignalKind::interrupt()).context("unable to listen for SIGINT (Ctrl+C)")?;
    let mut sigterm = signal(SignalKind::terminate()).context("unable to listen for SIGTERM")?;
    let mut sighup = signal(SignalKind::hangup()).context("unable to listen for SIGHUP")?;
    let (exit_tx, mut exit_rx) = mpsc::unbounded_channel::<()>();

    tracing::info!(
        target: "server",
        socket_path = %socket_path.display(),
        search_path = %config.discovery.search_path,
        "server_listening"
    );
    eprintln!(
        "portgate listening on unix socket (NDJSON): {}",
        socket_path.display()
    );

    let exit_reason = loop {
        tokio::select! {
            _ = sigint.recv() => break ExitReason::Signal("SIGINT"),
            _ = sigterm.recv() => break ExitReason::Signal("SIGTERM"),
            _ = sighup.recv() => {
                let entries = service.flush_evaluator_cache();
                tracing::info!(target: "server", entries, "sighup_cache_flush");
            }
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, _)) => {
                        let service = Arc::clone(&service);
                        let exit_tx = exit_tx.clone();
                        tokio::spawn(async move {
                            if let Err(err) = handle_client(stream, service, exit_tx).await {
                                tracing::warn!(target: "server", error = %format!("{err:#}"), "client_handling_failed");
                            }
                        });
                    }
                    Err(err) => tracing::warn!(target: "server", error = %err, "accept_failed"),
                }
            }
            Some(()) = exit_rx.recv() => break ExitReason::SocketMessage,
        }
    };

    cleanup_socket_path(&socket_path)?;
    match exit_reason {
        ExitReason::SocketMessage => eprintln!("portgate stopped: received exit message"),
        ExitReason::Signal(signal_name) => eprintln!("portgate stopped: received {signal_name}"),
    }
    tracing::info!(target: "server", "server_stopped");

    Ok(())
}

async fn handle_client(
    stream: UnixStream,
    service: Arc<AllowedActionsService>,
    exit_tx: mpsc::UnboundedSender<()>,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = match parse_client_message(line) {
            Ok(ClientMessage::Exit) => {
                let _ = exit_tx.send(());
                return Ok(());
            }
            Ok(message) => respond(&service, message).await,
            Err(err) => {
                tracing::warn!(target: "server", error = %err, "invalid_protocol_message");
                ServerMessage::Error {
                    message: err.to_string(),
                }
            }
        };

        let encoded = encode_server_message(&reply).context("failed to encode reply")?;
        writer
            .write_all(encoded.as_bytes())
            .await
            .context("failed to write reply")?;
    }

    Ok(())
}

async fn respond(service: &AllowedActionsService, message: ClientMessage) -> ServerMessage {
    match message {
        ClientMessage::AllowedActions {
            request_id,
            caller,
            record,
        } => {
            let actions = service.allowed_actions_for_document(&caller, record).await;
            ServerMessage::AllowedActions {
                request_id,
                actions,
            }
        }
        ClientMessage::FlushEvaluatorCache => ServerMessage::EvaluatorCacheFlushed {
            entries: service.flush_evaluator_cache(),
        },
        ClientMessage::Exit => ServerMessage::Error {
            message: "exit is handled by the connection loop".to_string(),
        },
    }
}

fn prepare_socket_path(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("unable to create {}", parent.display()))?;
    }

    match fs::symlink_metadata(path) {
        Ok(metadata) => {
            if metadata.file_type().is_socket() || metadata.is_file() {
                fs::remove_file(path)
                    .with_context(|| format!("unable to remove stale socket {}", path.display()))?;
            } else {
                bail!(
                    "socket path exists but is not removable as file/socket: {}",
                    path.display()
                );
            }
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("unable to inspect {}", path.display()));
        }
    }

    Ok(())
}

fn cleanup_socket_path(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("unable to remove {}", path.display())),
    }
}
