//! Async driver for chain synchronization.
//!
//! Block notifications arrive on a channel and each one triggers a catch-up
//! sync on the blocking pool. Full resyncs can be requested through the
//! service or spawned on their own.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, error, info};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::hdmint::{HdMintWallet, MintState, SyncReport};
use crate::ledger::Ledger;
use crate::storage::MintStore;

/// Chain notifications from the node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainEvent {
    BlockConnected { height: u64 },
    /// The active chain switched to another branch
    Reorganized { fork_height: u64 },
}

/// Messages for the sync service
pub enum SyncCommand {
    Notify(ChainEvent),
    /// Sync now and report the outcome
    Sync {
        full_resync: bool,
        reply: oneshot::Sender<crate::Result<SyncReport>>,
    },
    State(oneshot::Sender<crate::Result<MintState>>),
    Shutdown,
}

/// Async wrapper around a wallet for use with tokio
pub struct SyncService {
    command_tx: mpsc::Sender<SyncCommand>,
    handle: JoinHandle<()>,
}

impl SyncService {
    /// Start the service loop for `wallet`
    pub fn start<S, L>(wallet: Arc<HdMintWallet<S, L>>) -> Self
    where
        S: MintStore + 'static,
        L: Ledger + 'static,
    {
        let (command_tx, mut command_rx) = mpsc::channel::<SyncCommand>(1000);

        let handle = tokio::spawn(async move {
            while let Some(cmd) = command_rx.recv().await {
                match cmd {
                    SyncCommand::Notify(event) => {
                        debug!("Chain event: {:?}", event);
                        match run_sync(wallet.clone(), false).await {
                            Ok(report) => {
                                if !report.confirmed.is_empty() || !report.demoted.is_empty() {
                                    info!(
                                        "Synced to {:?}: {} confirmed, {} demoted",
                                        report.tip_height,
                                        report.confirmed.len(),
                                        report.demoted.len()
                                    );
                                }
                            }
                            Err(e) => error!("Sync after {:?} failed: {}", event, e),
                        }
                    }
                    SyncCommand::Sync { full_resync, reply } => {
                        let result = run_sync(wallet.clone(), full_resync).await;
                        let _ = reply.send(result);
                    }
                    SyncCommand::State(reply) => {
                        let _ = reply.send(wallet.state());
                    }
                    SyncCommand::Shutdown => break,
                }
            }
            info!("Sync service stopped");
        });

        Self { command_tx, handle }
    }

    /// Queue a chain notification
    pub async fn notify(&self, event: ChainEvent) -> Result<()> {
        self.command_tx
            .send(SyncCommand::Notify(event))
            .await
            .context("sync service unavailable")
    }

    /// Sync and wait for the report
    pub async fn sync(&self, full_resync: bool) -> Result<SyncReport> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(SyncCommand::Sync {
                full_resync,
                reply: reply_tx,
            })
            .await
            .context("sync service unavailable")?;
        Ok(reply_rx.await.context("sync service crashed")??)
    }

    pub async fn state(&self) -> Result<MintState> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(SyncCommand::State(reply_tx))
            .await
            .context("sync service unavailable")?;
        Ok(reply_rx.await.context("sync service crashed")??)
    }

    /// Stop after queued commands are handled
    pub async fn shutdown(self) -> Result<()> {
        self.command_tx
            .send(SyncCommand::Shutdown)
            .await
            .context("sync service unavailable")?;
        self.handle.await.context("sync service crashed")
    }
}

/// Run a full resync in the background
pub fn spawn_full_resync<S, L>(wallet: Arc<HdMintWallet<S, L>>) -> JoinHandle<crate::Result<SyncReport>>
where
    S: MintStore + 'static,
    L: Ledger + 'static,
{
    tokio::task::spawn_blocking(move || wallet.sync_with_chain(true))
}

async fn run_sync<S, L>(wallet: Arc<HdMintWallet<S, L>>, full_resync: bool) -> crate::Result<SyncReport>
where
    S: MintStore + 'static,
    L: Ledger + 'static,
{
    match tokio::task::spawn_blocking(move || wallet.sync_with_chain(full_resync)).await {
        Ok(result) => result,
        Err(e) => Err(crate::WalletError::Task(e.to_string())),
    }
}
