use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};

use hostsync_core::SyncConfig;
use hostsync_engine::{ReconcileOutcome, Reconciler};
use hostsync_metadata::HostSource;

use crate::error::{io_err, DaemonError};
use crate::protocol::{DaemonRequest, DaemonResponse};

/// Rolling health counters, updated by the processor after every cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleStats {
    pub last_checked_unix: u64,
    pub last_applied_unix: u64,
    pub managed_hosts: usize,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

type SharedStats = Arc<RwLock<CycleStats>>;

struct CycleJob {
    source: &'static str,
    respond_to: oneshot::Sender<Result<CycleSummary, String>>,
}

/// Outcome of one reconciliation cycle, as reported to refresh callers.
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub source: String,
    pub outcome: String,
    pub managed_hosts: usize,
    pub duration_ms: u128,
}

/// The fetch-reconcile pair, owned exclusively by the processor task.
struct CycleWorker<S> {
    reconciler: Reconciler,
    host_source: S,
}

impl<S: HostSource> CycleWorker<S> {
    fn run_cycle(&mut self) -> Result<ReconcileOutcome, String> {
        let observed = match self.host_source.fetch_hosts() {
            Ok(observed) => observed,
            Err(err) => {
                tracing::error!(error = %err, "failed to fetch hosts from metadata service");
                return Err(format!("fetch failed: {err}"));
            }
        };
        match self.reconciler.reconcile(&observed) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                tracing::error!(error = %err, "reconciliation failed");
                Err(format!("reconcile failed: {err}"))
            }
        }
    }
}

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking<S>(config: SyncConfig, host_source: S) -> Result<(), DaemonError>
where
    S: HostSource + Send + 'static,
{
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config, host_source))
}

/// Run the daemon runtime until shutdown (ctrl-c or a `stop` request).
pub async fn run<S>(config: SyncConfig, host_source: S) -> Result<(), DaemonError>
where
    S: HostSource + Send + 'static,
{
    let stats: SharedStats = Arc::new(RwLock::new(CycleStats::default()));
    let started_at_unix = unix_seconds_now();

    let (job_tx, job_rx) = mpsc::channel::<CycleJob>(64);
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let reconciler = Reconciler::new(&config.hosts_path, &config.backup_path);
    let worker = CycleWorker {
        reconciler,
        host_source,
    };

    tracing::info!(
        hosts_file = %config.hosts_path.display(),
        metadata_url = %config.metadata_url,
        interval_secs = config.poll_interval.as_secs(),
        "hostsync daemon starting"
    );

    let processor_handle = {
        let shutdown = shutdown_tx.clone();
        let stats = stats.clone();
        tokio::spawn(async move {
            let result = cycle_processor_task(worker, stats, job_rx, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let ticker_handle = {
        let shutdown = shutdown_tx.clone();
        let job_tx = job_tx.clone();
        let interval = config.poll_interval;
        tokio::spawn(async move {
            let result = ticker_task(interval, job_tx, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let socket_handle = {
        let shutdown = shutdown_tx.clone();
        let config = config.clone();
        let stats = stats.clone();
        let job_tx = job_tx.clone();
        tokio::spawn(async move {
            let result = socket_server_task(
                config,
                stats,
                job_tx,
                shutdown.clone(),
                shutdown.subscribe(),
                started_at_unix,
            )
            .await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down daemon");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Protocol(format!("ctrl-c handler failed: {err}"))),
                    }
                }
            }
        })
    };

    let (processor_result, ticker_result, socket_result, signal_result) =
        tokio::join!(processor_handle, ticker_handle, socket_handle, signal_handle);

    handle_join("cycle_processor", processor_result)?;
    handle_join("ticker", ticker_result)?;
    handle_join("socket_server", socket_result)?;
    handle_join("signal_handler", signal_result)?;
    Ok(())
}

/// Fixed-delay poll loop: the next sleep starts only after the cycle it
/// enqueued has completed, so a slow cycle stretches the cadence instead of
/// piling up triggers.
async fn ticker_task(
    interval: Duration,
    job_tx: mpsc::Sender<CycleJob>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        match enqueue_cycle(&job_tx, "timer").await {
            Ok(summary) => tracing::debug!(
                outcome = %summary.outcome,
                duration_ms = summary.duration_ms,
                "timer cycle completed"
            ),
            Err(DaemonError::ChannelClosed(_)) => break,
            Err(err) => tracing::debug!(error = %err, "timer cycle failed, retrying next tick"),
        }
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            () = tokio::time::sleep(interval) => {}
        }
    }
    Ok(())
}

async fn cycle_processor_task<S>(
    worker: CycleWorker<S>,
    stats: SharedStats,
    mut job_rx: mpsc::Receiver<CycleJob>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError>
where
    S: HostSource + Send + 'static,
{
    let mut slot = Some(worker);
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe_job = job_rx.recv() => {
                let Some(job) = maybe_job else { break };
                let started = Instant::now();

                let Some(active) = slot.take() else {
                    return Err(DaemonError::Protocol("cycle worker state lost".to_string()));
                };
                let (active, result) = tokio::task::spawn_blocking(move || {
                    let mut active = active;
                    let result = active.run_cycle();
                    (active, result)
                })
                .await
                .map_err(|err| DaemonError::Protocol(format!("cycle task join error: {err}")))?;

                let managed_hosts = active.reconciler.managed().len();
                slot = Some(active);

                record_cycle(&stats, &result, managed_hosts).await;
                let outcome = result.map(|outcome| {
                    build_cycle_summary(job.source, &outcome, managed_hosts, started.elapsed())
                });
                let _ = job.respond_to.send(outcome);
            }
        }
    }
    Ok(())
}

async fn record_cycle(
    stats: &SharedStats,
    result: &Result<ReconcileOutcome, String>,
    managed_hosts: usize,
) {
    let mut stats = stats.write().await;
    stats.last_checked_unix = unix_seconds_now();
    match result {
        Ok(outcome) => {
            stats.consecutive_failures = 0;
            stats.last_error = None;
            stats.managed_hosts = managed_hosts;
            if matches!(outcome, ReconcileOutcome::Applied { .. }) {
                stats.last_applied_unix = stats.last_checked_unix;
            }
        }
        Err(message) => {
            stats.consecutive_failures += 1;
            stats.last_error = Some(message.clone());
        }
    }
}

fn build_cycle_summary(
    source: &'static str,
    outcome: &ReconcileOutcome,
    managed_hosts: usize,
    duration: Duration,
) -> CycleSummary {
    CycleSummary {
        source: source.to_string(),
        outcome: match outcome {
            ReconcileOutcome::Unchanged => "unchanged".to_string(),
            ReconcileOutcome::Applied { .. } => "applied".to_string(),
        },
        managed_hosts,
        duration_ms: duration.as_millis(),
    }
}

async fn socket_server_task(
    config: SyncConfig,
    stats: SharedStats,
    job_tx: mpsc::Sender<CycleJob>,
    shutdown_tx: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
    started_at_unix: u64,
) -> Result<(), DaemonError> {
    let socket = config.socket_path.clone();
    prepare_socket_for_bind(&socket)?;

    let listener = UnixListener::bind(&socket).map_err(|e| io_err(&socket, e))?;
    set_socket_permissions(&socket)?;
    tracing::info!(socket = %socket.display(), "control socket listening");

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                let (stream, _) = accepted.map_err(|e| io_err(&socket, e))?;
                let config = config.clone();
                let stats = stats.clone();
                let job_tx = job_tx.clone();
                let shutdown_tx = shutdown_tx.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_control_client(
                        stream,
                        config,
                        stats,
                        job_tx,
                        shutdown_tx,
                        started_at_unix,
                    )
                    .await
                    {
                        tracing::error!(error = %err, "control client error");
                    }
                });
            }
        }
    }

    if socket.exists() {
        let _ = fs::remove_file(&socket);
    }
    Ok(())
}

async fn handle_control_client(
    stream: UnixStream,
    config: SyncConfig,
    stats: SharedStats,
    job_tx: mpsc::Sender<CycleJob>,
    shutdown_tx: broadcast::Sender<()>,
    started_at_unix: u64,
) -> Result<(), DaemonError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| io_err("control socket read", e))?
    {
        if line.trim().is_empty() {
            continue;
        }

        let request: Result<DaemonRequest, _> = serde_json::from_str(&line);
        let request = match request {
            Ok(request) => request,
            Err(err) => {
                write_response(
                    &mut writer,
                    &DaemonResponse::error(format!("invalid request JSON: {err}")),
                )
                .await?;
                continue;
            }
        };

        let response = match request.cmd.as_str() {
            "status" => {
                let payload =
                    build_status_payload(&config, stats.clone(), started_at_unix).await;
                DaemonResponse::ok(payload)
            }
            "refresh" => match enqueue_cycle(&job_tx, "refresh").await {
                Ok(summary) => DaemonResponse::ok(json!(summary)),
                Err(err) => DaemonResponse::error(err.to_string()),
            },
            "stop" => {
                let _ = shutdown_tx.send(());
                DaemonResponse::ok(json!({ "stopping": true }))
            }
            other => DaemonResponse::error(format!("unknown command '{other}'")),
        };

        let stopping = request.cmd == "stop";
        write_response(&mut writer, &response).await?;
        if stopping {
            break;
        }
    }

    Ok(())
}

async fn build_status_payload(
    config: &SyncConfig,
    stats: SharedStats,
    started_at_unix: u64,
) -> Value {
    let snapshot = stats.read().await.clone();
    json!({
        "running": true,
        "started_at_unix": started_at_unix,
        "last_checked_unix": snapshot.last_checked_unix,
        "last_applied_unix": snapshot.last_applied_unix,
        "managed_hosts": snapshot.managed_hosts,
        "consecutive_failures": snapshot.consecutive_failures,
        "last_error": snapshot.last_error,
        "hosts_file": config.hosts_path.display().to_string(),
        "metadata_url": config.metadata_url,
        "poll_interval_secs": config.poll_interval.as_secs(),
        "socket": config.socket_path.display().to_string(),
    })
}

async fn enqueue_cycle(
    job_tx: &mpsc::Sender<CycleJob>,
    source: &'static str,
) -> Result<CycleSummary, DaemonError> {
    let (tx, rx) = oneshot::channel();
    job_tx
        .send(CycleJob {
            source,
            respond_to: tx,
        })
        .await
        .map_err(|_| DaemonError::ChannelClosed("cycle queue"))?;

    let outcome = rx
        .await
        .map_err(|_| DaemonError::ChannelClosed("cycle response"))?;
    outcome.map_err(DaemonError::Protocol)
}

fn prepare_socket_for_bind(socket: &Path) -> Result<(), DaemonError> {
    if !socket.exists() {
        return Ok(());
    }

    match StdUnixStream::connect(socket) {
        Ok(_) => {
            return Err(DaemonError::Protocol(format!(
                "daemon socket already in use: {}",
                socket.display()
            )));
        }
        Err(err) => {
            tracing::warn!(
                socket = %socket.display(),
                error = %err,
                "removing stale daemon socket before bind",
            );
        }
    }

    match fs::remove_file(socket) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(socket, err)),
    }
}

async fn write_response(
    writer: &mut OwnedWriteHalf,
    response: &DaemonResponse,
) -> Result<(), DaemonError> {
    let payload = serde_json::to_string(response)?;
    writer
        .write_all(payload.as_bytes())
        .await
        .map_err(|e| io_err("control socket write", e))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| io_err("control socket write", e))?;
    writer
        .flush()
        .await
        .map_err(|e| io_err("control socket flush", e))?;
    Ok(())
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Protocol(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

fn unix_seconds_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[cfg(unix)]
fn set_socket_permissions(path: &Path) -> Result<(), DaemonError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_socket_permissions(_path: &Path) -> Result<(), DaemonError> {
    Ok(())
}
