use bitflags::bitflags;

use crate::constants as C;

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct StatusRegister: C::Word {
        const HALT  = 0b0000_0001;
        const CARRY = 0b0001_0000;
    }
}

impl std::fmt::Debug for StatusRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010b}", self.bits())
    }
}

/// The register file. Every register is exactly one byte wide.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Registers {
    /// General purpose
    pub ax: C::Word,

    /// General purpose
    pub bx: C::Word,

    /// Stack pointer, the next free slot of the stack
    pub sp: C::Address,

    /// Base pointer
    pub bp: C::Address,

    /// Instruction pointer
    pub ip: C::Address,

    /// Instruction register, holds the last fetched opcode
    pub ir: C::Word,

    /// Status register
    pub flags: StatusRegister,
}

impl Registers {
    /// Whether the HALT bit is set
    #[must_use]
    pub fn halted(&self) -> bool {
        self.flags.contains(StatusRegister::HALT)
    }
}

impl std::fmt::Display for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "AX = {} | BX = {} | IP = {} | IR = {:#04x} | SP = {} | BP = {} | FLAGS = {:?}",
            self.ax, self.bx, self.ip, self.ir, self.sp, self.bp, self.flags
        )
    }
}
