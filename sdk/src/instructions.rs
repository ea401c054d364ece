//! Instruction builders for the store program's two entry points

use crate::descriptor::ProgramDescriptor;
use borsh::BorshSerialize;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

/// Create the store account. Store and user both sign; the user pays.
pub fn initialize(descriptor: &ProgramDescriptor, store: &Pubkey, user: &Pubkey) -> Instruction {
    Instruction {
        program_id: descriptor.program_id,
        accounts: vec![
            AccountMeta::new(*store, true),                         // Store account to create
            AccountMeta::new(*user, true),                          // Payer / initializer
            AccountMeta::new_readonly(system_program::id(), false), // System program
        ],
        data: descriptor.initialize.discriminator.to_vec(),
    }
}

/// Append `link` to the store, with `user` recorded as creator
pub fn append(
    descriptor: &ProgramDescriptor,
    store: &Pubkey,
    user: &Pubkey,
    link: &str,
) -> std::io::Result<Instruction> {
    let mut data = descriptor.append.discriminator.to_vec();
    data.extend_from_slice(&link.to_string().try_to_vec()?);

    Ok(Instruction {
        program_id: descriptor.program_id,
        accounts: vec![
            AccountMeta::new(*store, false), // Store account
            AccountMeta::new(*user, true),   // Creator
        ],
        data,
    })
}
