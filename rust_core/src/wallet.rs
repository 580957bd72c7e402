//! Wallet session plumbing.
//!
//! Signing and wallet protocols live in the embedding application; this
//! module only defines the seams ([`SessionKit`], [`Session`]) and the
//! context that tracks the current session and submits marketplace actions
//! through it.
//!
//! Exactly one session kit exists per process: [`SessionKitHolder`] builds it
//! from a factory on first use and hands out the same instance afterwards.

use crate::actions::{buy_action, cancel_action, list_action, Action, ListMemo};
use crate::error::{OtcError, Result};
use crate::utils::asset::Asset;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

/// An authenticated wallet session
#[async_trait]
pub trait Session: Send + Sync {
    /// Account name the session signs for
    fn actor(&self) -> &str;

    /// Sign and submit actions; resolves to the transaction id once accepted
    async fn transact(&self, actions: Vec<Action>) -> Result<String>;
}

/// Factory for wallet sessions (login, logout, restore from storage)
#[async_trait]
pub trait SessionKit: Send + Sync {
    async fn login(&self) -> Result<Arc<dyn Session>>;

    async fn logout(&self, session: &dyn Session) -> Result<()>;

    /// Previously persisted session, if any
    async fn restore(&self) -> Result<Option<Arc<dyn Session>>>;
}

type KitFactory = Box<dyn Fn() -> Arc<dyn SessionKit> + Send + Sync>;

/// Lazily-built, process-wide session kit
pub struct SessionKitHolder {
    cell: OnceLock<Arc<dyn SessionKit>>,
    factory: KitFactory,
}

impl SessionKitHolder {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Arc<dyn SessionKit> + Send + Sync + 'static,
    {
        Self {
            cell: OnceLock::new(),
            factory: Box::new(factory),
        }
    }

    /// The kit, constructing it on first call
    pub fn get(&self) -> Arc<dyn SessionKit> {
        self.cell
            .get_or_init(|| {
                info!("Initializing wallet session kit");
                (self.factory)()
            })
            .clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

/// Current wallet session plus the marketplace actions it can submit
pub struct WalletContext {
    kits: Arc<SessionKitHolder>,
    otc_contract: String,
    session: RwLock<Option<Arc<dyn Session>>>,
}

impl WalletContext {
    pub fn new(kits: Arc<SessionKitHolder>, otc_contract: &str) -> Self {
        Self {
            kits,
            otc_contract: otc_contract.to_string(),
            session: RwLock::new(None),
        }
    }

    pub fn session(&self) -> Option<Arc<dyn Session>> {
        self.session.read().clone()
    }

    pub fn account_name(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.actor().to_string())
    }

    pub fn is_connected(&self) -> bool {
        self.session.read().is_some()
    }

    /// Pick up a persisted session. Failures are logged and leave the
    /// context disconnected.
    pub async fn restore(&self) {
        match self.kits.get().restore().await {
            Ok(Some(session)) => {
                info!("Restored wallet session for {}", session.actor());
                *self.session.write() = Some(session);
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to restore wallet session: {}", e),
        }
    }

    pub async fn login(&self) -> Result<String> {
        let session = self.kits.get().login().await?;
        let actor = session.actor().to_string();
        info!("Wallet logged in as {}", actor);
        *self.session.write() = Some(session);
        Ok(actor)
    }

    /// Log out the current session; no-op when disconnected
    pub async fn logout(&self) -> Result<()> {
        let current = self.session();
        if let Some(session) = current {
            self.kits.get().logout(session.as_ref()).await?;
            *self.session.write() = None;
            info!("Wallet logged out {}", session.actor());
        }
        Ok(())
    }

    /// Submit actions through the current session
    pub async fn transact(&self, actions: Vec<Action>) -> Result<String> {
        let session = self.session().ok_or(OtcError::NotConnected)?;
        match session.transact(actions).await {
            Ok(tx_id) => {
                info!("Transaction {} accepted for {}", tx_id, session.actor());
                Ok(tx_id)
            }
            Err(e) => {
                warn!("Transaction failed for {}: {}", session.actor(), e);
                if matches!(e, OtcError::Transaction(_)) {
                    Err(e)
                } else {
                    Err(OtcError::Transaction(e.to_string()))
                }
            }
        }
    }

    /// Send `spend` TLOS to buy from `listing_id`
    pub async fn buy(&self, listing_id: u64, spend: &Asset) -> Result<String> {
        let actor = self.account_name().ok_or(OtcError::NotConnected)?;
        let action = buy_action(&actor, &self.otc_contract, listing_id, spend)?;
        self.transact(vec![action]).await
    }

    /// Deposit `quantity` CLOAK as a new listing
    pub async fn create_listing(&self, quantity: &Asset, memo: &ListMemo) -> Result<String> {
        let actor = self.account_name().ok_or(OtcError::NotConnected)?;
        let action = list_action(&actor, &self.otc_contract, quantity, memo)?;
        self.transact(vec![action]).await
    }

    pub async fn cancel_listing(&self, listing_id: u64) -> Result<String> {
        let actor = self.account_name().ok_or(OtcError::NotConnected)?;
        self.transact(vec![cancel_action(&actor, &self.otc_contract, listing_id)])
            .await
    }
}
