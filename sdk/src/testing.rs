//! Testing infrastructure
//!
//! [`InMemoryLedger`] implements [`LedgerRpc`] by executing the store
//! program's two entry points against an in-memory account map, with switches
//! to simulate network failures.

use crate::descriptor::ProgramDescriptor;
use crate::error::LedgerError;
use crate::record::{StoreAccount, StoredItem};
use crate::rpc::LedgerRpc;
use async_trait::async_trait;
use borsh::BorshDeserialize;
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, instruction::CompiledInstruction,
    message::Message, pubkey::Pubkey, signature::Signature, transaction::Transaction,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Space the program allocates for the store account
pub const STORE_ACCOUNT_SPACE: usize = 9000;

pub struct InMemoryLedger {
    descriptor: ProgramDescriptor,
    accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
    submissions: AtomicUsize,
    fail_reads: AtomicBool,
    fail_submissions: AtomicBool,
    submit_delay: Mutex<Option<Duration>>,
}

impl InMemoryLedger {
    pub fn new(descriptor: ProgramDescriptor) -> Self {
        Self {
            descriptor,
            accounts: Mutex::new(HashMap::new()),
            submissions: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            fail_submissions: AtomicBool::new(false),
            submit_delay: Mutex::new(None),
        }
    }

    /// Number of `submit_transaction` calls, accepted or not
    pub fn submission_count(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Make every read fail with a network error
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every submission fail with a network error
    pub fn set_fail_submissions(&self, fail: bool) {
        self.fail_submissions.store(fail, Ordering::SeqCst);
    }

    /// Hold each submission for `delay` before executing it
    pub fn set_submit_delay(&self, delay: Option<Duration>) {
        *self.submit_delay.lock().expect("ledger lock poisoned") = delay;
    }

    /// Overwrite raw account data
    pub fn set_account_data(&self, address: Pubkey, data: Vec<u8>) {
        self.accounts
            .lock()
            .expect("ledger lock poisoned")
            .insert(address, data);
    }

    pub fn account_data(&self, address: &Pubkey) -> Option<Vec<u8>> {
        self.accounts
            .lock()
            .expect("ledger lock poisoned")
            .get(address)
            .cloned()
    }

    fn execute(&self, message: &Message, ix: &CompiledInstruction) -> Result<(), LedgerError> {
        let key = |position: usize| -> Result<(usize, Pubkey), LedgerError> {
            let index = *ix
                .accounts
                .get(position)
                .ok_or_else(|| LedgerError::Rejected("NotEnoughAccountKeys".to_string()))?
                as usize;
            Ok((index, message.account_keys[index]))
        };

        let program_id = message.account_keys[ix.program_id_index as usize];
        if program_id != self.descriptor.program_id {
            return Err(LedgerError::Rejected(format!("unknown program {}", program_id)));
        }
        if ix.data.len() < 8 {
            return Err(LedgerError::Rejected("InstructionDidNotDeserialize".to_string()));
        }
        let (selector, mut args) = ix.data.split_at(8);

        let mut accounts = self.accounts.lock().expect("ledger lock poisoned");
        let discriminator = &self.descriptor.account_discriminator;

        if selector == self.descriptor.initialize.discriminator {
            let (store_index, store) = key(0)?;
            let (user_index, _) = key(1)?;
            if !message.is_signer(store_index) || !message.is_signer(user_index) {
                return Err(LedgerError::Rejected("AccountNotSigner".to_string()));
            }
            if accounts.contains_key(&store) {
                return Err(LedgerError::Rejected(format!(
                    "Allocate: account {} already in use",
                    store
                )));
            }
            let data = StoreAccount::default()
                .encode(discriminator, STORE_ACCOUNT_SPACE)
                .map_err(|e| LedgerError::Rejected(e.to_string()))?;
            accounts.insert(store, data);
            Ok(())
        } else if selector == self.descriptor.append.discriminator {
            let (_, store) = key(0)?;
            let (user_index, user) = key(1)?;
            if !message.is_signer(user_index) {
                return Err(LedgerError::Rejected("AccountNotSigner".to_string()));
            }
            let link = String::deserialize(&mut args)
                .map_err(|_| LedgerError::Rejected("InstructionDidNotDeserialize".to_string()))?;
            let data = accounts
                .get(&store)
                .ok_or_else(|| LedgerError::Rejected("AccountNotInitialized".to_string()))?;
            let mut account = StoreAccount::decode(data, discriminator)
                .map_err(|e| LedgerError::Rejected(e.to_string()))?;

            account.records.push(StoredItem {
                link,
                creator: user.to_bytes(),
            });
            account.total_records += 1;

            let data = account
                .encode(discriminator, STORE_ACCOUNT_SPACE)
                .map_err(|e| LedgerError::Rejected(e.to_string()))?;
            accounts.insert(store, data);
            Ok(())
        } else {
            Err(LedgerError::Rejected("InstructionFallbackNotFound".to_string()))
        }
    }
}

#[async_trait]
impl LedgerRpc for InMemoryLedger {
    async fn get_account_data(
        &self,
        address: &Pubkey,
        _commitment: CommitmentConfig,
    ) -> Result<Option<Vec<u8>>, LedgerError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(LedgerError::Network("simulated network failure".to_string()));
        }
        Ok(self.account_data(address))
    }

    async fn latest_blockhash(&self, _commitment: CommitmentConfig) -> Result<Hash, LedgerError> {
        Ok(Hash::new_unique())
    }

    async fn submit_transaction(&self, transaction: &Transaction) -> Result<Signature, LedgerError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);

        let delay = *self.submit_delay.lock().expect("ledger lock poisoned");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_submissions.load(Ordering::SeqCst) {
            return Err(LedgerError::Network("simulated network failure".to_string()));
        }

        transaction
            .verify()
            .map_err(|e| LedgerError::Rejected(e.to_string()))?;
        for ix in &transaction.message.instructions {
            self.execute(&transaction.message, ix)?;
        }
        Ok(transaction.signatures[0])
    }
}
