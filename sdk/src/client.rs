//! Store client: fetch, one-time initialization and append
//!
//! Mutating operations never update the cache optimistically. After the
//! remote program accepts a transaction the client re-reads the account, so
//! the cache always reflects what was actually persisted.

use crate::{
    cache::RecordListCache,
    connection::ConnectionContext,
    credential::StoreCredential,
    descriptor::ProgramDescriptor,
    error::{FetchError, SubmissionError},
    instructions,
    record::{RecordList, StoreAccount, StoreState},
    rpc::{LedgerRpc, SolanaLedgerRpc},
    session::SigningAuthority,
};
use solana_sdk::{
    instruction::Instruction, pubkey::Pubkey, signature::Signature, transaction::Transaction,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// A transaction the remote program accepted, and the list re-read after it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub signature: Signature,
    pub records: RecordList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Empty link: nothing was submitted
    Skipped,
    Appended(Submitted),
}

pub struct RemoteStoreClient {
    rpc: Arc<dyn LedgerRpc>,
    credential: Arc<StoreCredential>,
    descriptor: Arc<ProgramDescriptor>,
    cache: Arc<RecordListCache>,
    initializing: AtomicBool,
}

/// Clears the in-flight flag however the initialization ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RemoteStoreClient {
    pub fn new(
        rpc: Arc<dyn LedgerRpc>,
        credential: StoreCredential,
        descriptor: ProgramDescriptor,
    ) -> Self {
        Self {
            rpc,
            credential: Arc::new(credential),
            descriptor: Arc::new(descriptor),
            cache: Arc::new(RecordListCache::new()),
            initializing: AtomicBool::new(false),
        }
    }

    /// Client talking to the endpoint named by `ctx`
    pub fn connect(
        ctx: &ConnectionContext,
        credential: StoreCredential,
        descriptor: ProgramDescriptor,
    ) -> Self {
        Self::new(
            Arc::new(SolanaLedgerRpc::from_context(ctx)),
            credential,
            descriptor,
        )
    }

    /// The fixed store account address
    pub fn store_address(&self) -> Pubkey {
        self.credential.address()
    }

    pub fn program_id(&self) -> Pubkey {
        self.descriptor.program_id
    }

    /// Read-only handle on the cached list
    pub fn cache(&self) -> Arc<RecordListCache> {
        self.cache.clone()
    }

    /// Read the store. Any failure reads as `Uninitialized`.
    pub async fn fetch(&self, ctx: &ConnectionContext) -> RecordList {
        self.fetch_state(ctx).await.into()
    }

    /// Read the store, keeping "never created" apart from "read failed"
    ///
    /// A failed read leaves the cache at its previous value.
    pub async fn fetch_state(&self, ctx: &ConnectionContext) -> StoreState {
        let store = self.store_address();
        let state = match self.rpc.get_account_data(&store, ctx.commitment()).await {
            Ok(None) => StoreState::Uninitialized,
            Ok(Some(data)) => {
                match StoreAccount::decode(&data, &self.descriptor.account_discriminator) {
                    Ok(account) => StoreState::Populated(account.into_records()),
                    Err(e) => StoreState::FetchFailed(e),
                }
            }
            Err(e) => StoreState::FetchFailed(FetchError::from(e)),
        };

        match &state {
            StoreState::Uninitialized => {
                info!("Store account {} not created yet", store);
                self.cache.replace(RecordList::Uninitialized);
            }
            StoreState::Populated(records) => {
                debug!("Fetched {} records from {}", records.len(), store);
                self.cache.replace(RecordList::Records(records.clone()));
            }
            StoreState::FetchFailed(e) => {
                warn!("Failed to fetch store account {}: {}", store, e);
            }
        }
        state
    }

    /// One-time creation of the store account
    ///
    /// A second call while one is outstanding fails locally. Sequential
    /// re-initialization is left to the program to reject.
    pub async fn initialize(&self, ctx: &ConnectionContext) -> Result<Submitted, SubmissionError> {
        let authority = ctx.authority()?;

        if self.initializing.swap(true, Ordering::AcqRel) {
            warn!("Initialization already in flight for {}", self.store_address());
            return Err(SubmissionError::InitializeInFlight);
        }
        let _guard = InFlight(&self.initializing);

        let store = self.store_address();
        let ix = instructions::initialize(&self.descriptor, &store, &authority.address());

        match self.submit(ctx, authority, ix, true).await {
            Ok(signature) => {
                info!("Created store account {} in {}", store, signature);
                let records = self.fetch(ctx).await;
                Ok(Submitted { signature, records })
            }
            Err(e) => {
                error!("Failed to initialize store account {}: {}", store, e);
                Err(e)
            }
        }
    }

    /// Append `link` and resynchronize. An empty link submits nothing.
    pub async fn append(
        &self,
        ctx: &ConnectionContext,
        link: &str,
    ) -> Result<AppendOutcome, SubmissionError> {
        if link.is_empty() {
            debug!("Empty link, nothing to submit");
            return Ok(AppendOutcome::Skipped);
        }
        let authority = ctx.authority()?;

        let store = self.store_address();
        let ix = instructions::append(&self.descriptor, &store, &authority.address(), link)
            .map_err(|e| SubmissionError::Encode(e.to_string()))?;

        match self.submit(ctx, authority, ix, false).await {
            Ok(signature) => {
                info!("Link {} sent to program in {}", link, signature);
                let records = self.fetch(ctx).await;
                Ok(AppendOutcome::Appended(Submitted { signature, records }))
            }
            Err(e) => {
                error!("Failed to append {}: {}", link, e);
                Err(e)
            }
        }
    }

    /// Build, sign and send a single-instruction transaction paid by `authority`
    async fn submit(
        &self,
        ctx: &ConnectionContext,
        authority: &SigningAuthority,
        ix: Instruction,
        store_signs: bool,
    ) -> Result<Signature, SubmissionError> {
        let recent_blockhash = self.rpc.latest_blockhash(ctx.commitment()).await?;

        let mut transaction = Transaction::new_with_payer(&[ix], Some(&authority.address()));
        transaction.message.recent_blockhash = recent_blockhash;

        if store_signs {
            self.credential
                .co_sign(&mut transaction, recent_blockhash)
                .map_err(|e| SubmissionError::Encode(e.to_string()))?;
        }

        let transaction = authority.sign(transaction).await?;
        if !transaction.is_signed() {
            return Err(SubmissionError::Unsigned);
        }

        Ok(self.rpc.submit_transaction(&transaction).await?)
    }
}
