use thiserror::Error;

use crate::constants::{Address, Word};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    #[error("invalid instruction {opcode:#04x} at address {address:#04x}")]
    InvalidInstruction { opcode: Word, address: Address },
}
