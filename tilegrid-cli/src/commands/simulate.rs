//! Simulate command - replay a viewport script against a simulated loader.
//!
//! Render commands are printed to stdout as JSON lines, followed by one
//! `{"metrics": ...}` line with the final grid counters.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tilegrid::provider::BoxFuture;
use tilegrid::{
    FetchError, GridConfig, GridSnapshot, RenderCommand, ShardTarget, TileGrid, TileLoader,
    ViewportBounds,
};

use crate::error::CliError;

/// Arguments for the simulate command.
pub struct SimulateArgs {
    pub script: PathBuf,
    pub latency_ms: u64,
    pub fail_every: Option<u64>,
    pub interval_ms: u64,
}

/// Loader that sleeps for a fixed latency and fails every n-th fetch.
///
/// The handle is the URL that was "downloaded".
#[derive(Clone)]
pub struct SimulatedLoader {
    latency: Duration,
    fail_every: Option<u64>,
    issued: Arc<AtomicU64>,
}

impl SimulatedLoader {
    pub fn new(latency: Duration, fail_every: Option<u64>) -> Self {
        Self {
            latency,
            fail_every: fail_every.filter(|n| *n > 0),
            issued: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl TileLoader for SimulatedLoader {
    type Handle = String;

    fn fetch(&self, target: &ShardTarget) -> BoxFuture<'static, Result<String, FetchError>> {
        let n = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        let fail = self.fail_every.is_some_and(|every| n % every == 0);
        let latency = self.latency;
        let url = target.url.clone();

        async move {
            tokio::time::sleep(latency).await;
            if fail {
                Err(FetchError::failed(format!("simulated failure on fetch #{}", n)))
            } else {
                Ok(url)
            }
        }
        .boxed()
    }
}

/// Read a JSON array of viewports.
pub fn load_script(path: &Path) -> Result<Vec<ViewportBounds>, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Script {
        path: path.to_path_buf(),
        source,
    })
}

/// Run the simulate command.
pub fn run(args: SimulateArgs, config: GridConfig) -> Result<(), CliError> {
    let viewports = load_script(&args.script)?;
    info!(
        script = %args.script.display(),
        viewports = viewports.len(),
        latency_ms = args.latency_ms,
        fail_every = ?args.fail_every,
        "Starting simulation"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    let snapshot = runtime.block_on(simulate(args, config, viewports))?;
    let metrics = serde_json::json!({ "metrics": snapshot });
    println!("{}", metrics);
    Ok(())
}

async fn simulate(
    args: SimulateArgs,
    config: GridConfig,
    viewports: Vec<ViewportBounds>,
) -> Result<GridSnapshot, CliError> {
    let loader = SimulatedLoader::new(Duration::from_millis(args.latency_ms), args.fail_every);
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderCommand<String>>();
    let mut grid = TileGrid::new(config, loader, render_tx)?;

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping simulation");
            ctrl_c.cancel();
        }
    });

    let printer = tokio::spawn(async move {
        let mut printed = 0usize;
        while let Some(command) = render_rx.recv().await {
            println!("{}", serde_json::to_string(&command)?);
            printed += 1;
        }
        Ok::<_, serde_json::Error>(printed)
    });

    let (viewport_tx, viewport_rx) = mpsc::channel(16);
    let interval = Duration::from_millis(args.interval_ms);
    let feeder_shutdown = shutdown.clone();
    tokio::spawn(async move {
        for viewport in viewports {
            if feeder_shutdown.is_cancelled() || viewport_tx.send(viewport).await.is_err() {
                break;
            }
            tokio::time::sleep(interval).await;
        }
    });

    grid.run(viewport_rx, shutdown.clone()).await;
    if !shutdown.is_cancelled() {
        debug!("Script finished, waiting for outstanding fetches");
        grid.settle().await;
    }
    let snapshot = grid.snapshot();

    // Dropping the grid drops the render sender and ends the printer.
    drop(grid);
    let printed = printer
        .await
        .map_err(|e| CliError::Runtime(e.to_string()))?
        .map_err(|e| CliError::Output(e.into()))?;
    debug!(printed, "Render commands written");

    Ok(snapshot)
}
