//! One client run: open, read, exchange, release.

use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use prooflink_core::{
    run_exchange, Channel, Endpoint, ExchangeConfig, Outcome, Proof, Result, Shutdown,
};

use crate::cli::Cli;
use crate::input::prompt_and_read;
use crate::interrupt::{spawn_interrupt_watcher, ChannelSlot};

/// Everything a run needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Remote endpoint.
    pub endpoint: Endpoint,
    /// Proof data given up front; prompts on stdin when `None`.
    pub data: Option<String>,
    /// Exchange timing.
    pub exchange: ExchangeConfig,
    /// Bound on opening the channel.
    pub connect_timeout: Duration,
}

impl TryFrom<&Cli> for ClientConfig {
    type Error = prooflink_core::Error;

    fn try_from(cli: &Cli) -> Result<Self> {
        Ok(Self {
            endpoint: cli.endpoint()?,
            data: cli.data.clone(),
            exchange: cli.exchange_config(),
            connect_timeout: cli.connect_timeout(),
        })
    }
}

/// Run the client against the real endpoint and terminal.
///
/// Setup failures (channel, input) come back as `Err`; everything after the
/// proof is built is reported through the [`Outcome`].
pub async fn run(config: ClientConfig) -> Result<Outcome> {
    run_with(
        Channel::open(&config.endpoint, config.connect_timeout),
        tokio::signal::ctrl_c(),
        config.data.as_deref(),
        config.exchange,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}

/// Run the client with the channel opener, interrupt signal and terminal
/// supplied by the caller.
///
/// The interrupt watcher is installed before `open` is awaited, so an
/// interrupt while connecting ends the run with [`Outcome::ShutdownRequested`].
/// The channel is released before this returns, whichever path ends the run.
pub async fn run_with<O, S, R, W>(
    open: O,
    signal: S,
    data: Option<&str>,
    exchange: ExchangeConfig,
    reader: R,
    writer: W,
) -> Result<Outcome>
where
    O: Future<Output = Result<Channel>>,
    S: Future<Output = std::io::Result<()>> + Send + 'static,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let shutdown = Shutdown::new();
    let slot = ChannelSlot::new();
    let watcher = spawn_interrupt_watcher(signal, shutdown.clone(), slot.clone());

    let opened = tokio::select! {
        _ = shutdown.wait() => None,
        result = open => Some(result),
    };
    let channel = match opened {
        Some(Ok(channel)) => channel,
        Some(Err(e)) => {
            stop_watcher(&shutdown, watcher).await;
            return Err(e);
        }
        None => {
            info!("Interrupted before the channel opened");
            stop_watcher(&shutdown, watcher).await;
            return Ok(Outcome::ShutdownRequested);
        }
    };
    slot.fill(channel.clone());

    let result = submit(&channel, &shutdown, data, exchange, reader, writer).await;

    // Let an interrupt already in progress finish its close before ours
    stop_watcher(&shutdown, watcher).await;
    channel.close().await;
    result
}

async fn stop_watcher(shutdown: &Shutdown, watcher: JoinHandle<()>) {
    shutdown.trigger();
    if let Err(e) = watcher.await {
        warn!(error = %e, "Interrupt watcher failed");
    }
}

/// Build the proof and run the exchange over an open channel.
///
/// Without `data`, prompts on `writer` and reads one line from `reader`;
/// shutdown while waiting for input ends the run.
pub async fn submit<R, W>(
    channel: &Channel,
    shutdown: &Shutdown,
    data: Option<&str>,
    exchange: ExchangeConfig,
    reader: R,
    writer: W,
) -> Result<Outcome>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let input = match data {
        Some(data) => data.to_string(),
        None => tokio::select! {
            _ = shutdown.wait() => return Ok(Outcome::ShutdownRequested),
            line = prompt_and_read(reader, writer) => line?,
        },
    };

    let proof = Proof::from_input(&input);
    debug!(placeholder = proof.is_placeholder(), "Proof built");
    info!(endpoint = channel.endpoint(), "Submitting proof");

    Ok(run_exchange(channel, shutdown, exchange, &proof).await)
}
