use std::{
    panic::AssertUnwindSafe,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use anyhow::anyhow;
use chrono::Utc;
use futures::{channel::mpsc, future, FutureExt, SinkExt, Stream, StreamExt};
use log::{info, warn};

use crate::{
    account::Account,
    backend::{AccountShapeInfo, AddressRequest, DeviceConnection, ShapeFetcher, Transport},
    config::{CurrencyConfig, DerivationModeConfig, SyncConfig},
    error::{DeviceError, Error, Result},
    updater::{apply_shape, RetainUnconfirmed},
};

use super::logic::{next_step, AddressCache, ScanStep};

#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    Discovered(Box<Account>),
    /// The device refused the mode's derivations; the mode was not scanned.
    DerivationModeSkipped { derivation_mode: String },
}

pub type DiscoveredAccountStream = Pin<Box<dyn Stream<Item = Result<ScanEvent>> + Send>>;

/// Whether the current mode's loop goes on with the next mode or the whole
/// scan ends.
enum Flow {
    NextMode,
    Stop,
}

pub struct AccountScanner {
    currency: CurrencyConfig,
    sync_config: SyncConfig,
    transport: Arc<dyn Transport>,
    fetcher: Arc<dyn ShapeFetcher>,
    keep_scanning: Arc<AtomicBool>, // used to interrupt scanning
}

impl AccountScanner {
    pub fn new(
        currency: CurrencyConfig,
        sync_config: SyncConfig,
        transport: Arc<dyn Transport>,
        fetcher: Arc<dyn ShapeFetcher>,
    ) -> Self {
        Self {
            currency,
            sync_config,
            transport,
            fetcher,
            keep_scanning: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Flag to clear to stop the scan. No event is emitted once it is false.
    pub fn keep_scanning(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.keep_scanning)
    }

    /// Start scanning on a background task that owns the device connection.
    ///
    /// Dropping the returned stream also stops the scan. The connection is
    /// closed whichever way the scan ends, a panicking collaborator included:
    /// the panic is reported as the stream's last item.
    pub fn scan_accounts(self, device_id: &str) -> DiscoveredAccountStream {
        let (tx, rx) = mpsc::channel(1);
        let device_id = device_id.to_string();
        let keep_scanning = self.keep_scanning();
        tokio::spawn(async move { self.run(device_id, tx).await });
        // events already queued when the flag is cleared are not delivered
        Box::pin(rx.take_while(move |_| future::ready(keep_scanning.load(Ordering::Relaxed))))
    }

    async fn run(self, device_id: String, mut tx: mpsc::Sender<Result<ScanEvent>>) {
        let mut connection = match self.transport.open(&device_id).await {
            Ok(connection) => connection,
            Err(e) => {
                let _ = tx.send(Err(e.into())).await;
                return;
            }
        };

        let start_time = Instant::now();
        // a panicking collaborator must not keep the device open
        let result = AssertUnwindSafe(self.scan_modes(connection.as_mut(), &mut tx))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(anyhow!("scan task panicked").into()));

        if let Err(e) = connection.close().await {
            warn!("failed to close device {}: {}", device_id, e);
        }

        match result {
            Ok(()) => info!(
                "{} scan complete in {} seconds",
                self.currency.id,
                start_time.elapsed().as_secs()
            ),
            Err(e) => {
                warn!("{} scan aborted: {}", self.currency.id, e);
                let _ = tx.send(Err(e)).await;
            }
        }
    }

    async fn scan_modes(
        &self,
        connection: &mut dyn DeviceConnection,
        tx: &mut mpsc::Sender<Result<ScanEvent>>,
    ) -> Result<()> {
        let mut cache = AddressCache::default();

        for mode in &self.currency.derivation_modes {
            if self.interrupt_requested() {
                return Ok(());
            }
            match self.scan_mode(connection, mode, &mut cache, tx).await? {
                Flow::NextMode => continue,
                Flow::Stop => return Ok(()),
            }
        }
        Ok(())
    }

    async fn scan_mode(
        &self,
        connection: &mut dyn DeviceConnection,
        mode: &DerivationModeConfig,
        cache: &mut AddressCache,
        tx: &mut mpsc::Sender<Result<ScanEvent>>,
    ) -> Result<Flow> {
        info!("scanning {} derivation mode '{}'", self.currency.id, mode.name);

        let seed_request = self.request(mode.seed_identifier_path()?, mode);
        let seed_identifier = match cache.get_address(connection, seed_request).await {
            Ok(result) => result.public_key,
            Err(Error::Device(e)) if e.is_recoverable() => return self.skip_mode(mode, e, tx).await,
            Err(e) => return Err(e),
        };

        let mut empty_count = 0;
        for index in mode.indices() {
            if !mode.supports_index(index) {
                continue;
            }
            if self.interrupt_requested() {
                return Ok(Flow::Stop);
            }

            let path = mode.path(index)?;
            let derived = match cache.get_address(connection, self.request(path.clone(), mode)).await {
                Ok(result) => result,
                Err(Error::Device(e)) if e.is_recoverable() => return self.skip_mode(mode, e, tx).await,
                Err(e) => return Err(e),
            };

            let info = AccountShapeInfo {
                currency: &self.currency.id,
                address: &derived.address,
                derivation_mode: &mode.name,
                derivation_path: &path,
                index,
                initial_account: None,
            };
            let shape = self.fetcher.get_account_shape(&info, &self.sync_config).await?;

            let mut account = Account::new(&self.currency.id, &mode.name, index, &derived.address, &path);
            account.seed_identifier = seed_identifier.clone();
            let account = apply_shape(
                account,
                shape,
                &self.sync_config,
                &RetainUnconfirmed::from(&self.sync_config),
                Utc::now(),
            );

            // in-flight results are dropped once interrupted
            if self.interrupt_requested() {
                return Ok(Flow::Stop);
            }

            match next_step(account.is_empty(), &mut empty_count, mode) {
                ScanStep::Emit => {
                    if !self.emit(tx, account).await {
                        return Ok(Flow::Stop);
                    }
                }
                ScanStep::Skip => {}
                ScanStep::Stop { emit } => {
                    info!(
                        "{} '{}': {} empty account(s) in a row at index {}, moving on",
                        self.currency.id,
                        mode.name,
                        empty_count + 1,
                        index
                    );
                    if emit && !self.emit(tx, account).await {
                        return Ok(Flow::Stop);
                    }
                    return Ok(Flow::NextMode);
                }
            }
        }
        Ok(Flow::NextMode)
    }

    async fn skip_mode(
        &self,
        mode: &DerivationModeConfig,
        error: DeviceError,
        tx: &mut mpsc::Sender<Result<ScanEvent>>,
    ) -> Result<Flow> {
        warn!("skipping derivation mode '{}': {}", mode.name, error);
        let event = ScanEvent::DerivationModeSkipped {
            derivation_mode: mode.name.clone(),
        };
        if tx.send(Ok(event)).await.is_err() {
            return Ok(Flow::Stop);
        }
        Ok(Flow::NextMode)
    }

    /// Send a discovered account. `false` when nobody listens anymore.
    async fn emit(&self, tx: &mut mpsc::Sender<Result<ScanEvent>>, account: Account) -> bool {
        info!("discovered {}", account.id);
        tx.send(Ok(ScanEvent::Discovered(Box::new(account))))
            .await
            .is_ok()
    }

    fn request(&self, path: String, mode: &DerivationModeConfig) -> AddressRequest {
        AddressRequest {
            currency: self.currency.id.clone(),
            path,
            derivation_mode: mode.name.clone(),
        }
    }

    fn interrupt_requested(&self) -> bool {
        !self.keep_scanning.load(Ordering::Relaxed)
    }
}
