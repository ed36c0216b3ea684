use parse_display::Display;
use tracing::{debug, warn};

use crate::constants::{Address, Word};

use super::{
    exception::Exception, memory::Bus, registers::StatusRegister, Computer, InvalidOpcodePolicy,
};

/// The whole opcode space.
///
/// Every byte decodes to exactly one variant, bytes outside of the instruction set land in
/// [`Opcode::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Opcode {
    /// Stop the processor
    #[display("HALT")]
    Halt,

    /// Load an immediate value in `AX`
    #[display("LOAD_AX")]
    LoadAx,

    #[display("LOAD_AXBX")]
    LoadAxBx,

    #[display("LOAD_AXSP")]
    LoadAxSp,

    #[display("LOAD_AXBP")]
    LoadAxBp,

    /// Load an immediate value in `BX`
    #[display("LOAD_BX")]
    LoadBx,

    #[display("LOAD_BXAX")]
    LoadBxAx,

    #[display("LOAD_BXSP")]
    LoadBxSp,

    #[display("LOAD_BXBP")]
    LoadBxBp,

    #[display("LOAD_SPAX")]
    LoadSpAx,

    #[display("LOAD_SPBX")]
    LoadSpBx,

    #[display("LOAD_BPAX")]
    LoadBpAx,

    #[display("LOAD_BPBX")]
    LoadBpBx,

    #[display("PUSH_AX")]
    PushAx,

    #[display("PUSH_BX")]
    PushBx,

    /// Push `AX` then `BX`
    #[display("PUSH_REG")]
    PushReg,

    #[display("PUSH_FLAG")]
    PushFlag,

    /// Push `AX`, `BX` then `FLAGS`
    #[display("PUSH_ALL")]
    PushAll,

    #[display("POP_AX")]
    PopAx,

    #[display("POP_BX")]
    PopBx,

    /// Pop `BX` then `AX`
    #[display("POP_REG")]
    PopReg,

    #[display("POP_FLAG")]
    PopFlag,

    /// Pop `FLAGS`, `BX` then `AX`
    #[display("POP_ALL")]
    PopAll,

    /// Unconditional jump
    #[display("JUMP_ADDR")]
    JumpAddr,

    /// Jump if the carry flag is set
    #[display("JUMP_CRRY")]
    JumpCarry,

    /// Jump if `AX == BX`
    #[display("JUMP_EQU")]
    JumpEqu,

    /// Jump if `AX != BX`
    #[display("JUMP_NEQU")]
    JumpNequ,

    /// Jump if `AX > BX`
    #[display("JUMP_GRTR")]
    JumpGrtr,

    /// Jump if `AX < BX`
    #[display("JUMP_LESS")]
    JumpLess,

    /// Jump if `AX >= BX`
    #[display("JUMP_GEQU")]
    JumpGequ,

    /// Jump if `AX <= BX`
    #[display("JUMP_LEQU")]
    JumpLequ,

    /// A byte outside of the instruction set
    #[display("??? {0:#04x}")]
    Unknown(Word),
}

impl From<Word> for Opcode {
    fn from(byte: Word) -> Self {
        match byte {
            0x00 => Self::Halt,
            0x01 => Self::LoadAx,
            0x02 => Self::LoadAxBx,
            0x03 => Self::LoadAxSp,
            0x04 => Self::LoadAxBp,
            0x05 => Self::LoadBx,
            0x06 => Self::LoadBxAx,
            0x07 => Self::LoadBxSp,
            0x08 => Self::LoadBxBp,
            0x09 => Self::LoadSpAx,
            0x0A => Self::LoadSpBx,
            0x0B => Self::LoadBpAx,
            0x0C => Self::LoadBpBx,
            0x0D => Self::PushAx,
            0x0E => Self::PushBx,
            0x0F => Self::PushReg,
            0x10 => Self::PushFlag,
            0x11 => Self::PushAll,
            0x12 => Self::PopAx,
            0x13 => Self::PopBx,
            0x14 => Self::PopReg,
            0x15 => Self::PopFlag,
            0x16 => Self::PopAll,
            0x17 => Self::JumpAddr,
            0x18 => Self::JumpCarry,
            0x19 => Self::JumpEqu,
            0x1A => Self::JumpNequ,
            0x1B => Self::JumpGrtr,
            0x1C => Self::JumpLess,
            0x1D => Self::JumpGequ,
            0x1E => Self::JumpLequ,
            other => Self::Unknown(other),
        }
    }
}

impl From<Opcode> for Word {
    fn from(opcode: Opcode) -> Self {
        match opcode {
            Opcode::Halt => 0x00,
            Opcode::LoadAx => 0x01,
            Opcode::LoadAxBx => 0x02,
            Opcode::LoadAxSp => 0x03,
            Opcode::LoadAxBp => 0x04,
            Opcode::LoadBx => 0x05,
            Opcode::LoadBxAx => 0x06,
            Opcode::LoadBxSp => 0x07,
            Opcode::LoadBxBp => 0x08,
            Opcode::LoadSpAx => 0x09,
            Opcode::LoadSpBx => 0x0A,
            Opcode::LoadBpAx => 0x0B,
            Opcode::LoadBpBx => 0x0C,
            Opcode::PushAx => 0x0D,
            Opcode::PushBx => 0x0E,
            Opcode::PushReg => 0x0F,
            Opcode::PushFlag => 0x10,
            Opcode::PushAll => 0x11,
            Opcode::PopAx => 0x12,
            Opcode::PopBx => 0x13,
            Opcode::PopReg => 0x14,
            Opcode::PopFlag => 0x15,
            Opcode::PopAll => 0x16,
            Opcode::JumpAddr => 0x17,
            Opcode::JumpCarry => 0x18,
            Opcode::JumpEqu => 0x19,
            Opcode::JumpNequ => 0x1A,
            Opcode::JumpGrtr => 0x1B,
            Opcode::JumpLess => 0x1C,
            Opcode::JumpGequ => 0x1D,
            Opcode::JumpLequ => 0x1E,
            Opcode::Unknown(byte) => byte,
        }
    }
}

impl Opcode {
    /// Whether the opcode is followed by an operand byte
    #[must_use]
    pub const fn has_operand(self) -> bool {
        matches!(
            self,
            Self::LoadAx
                | Self::LoadBx
                | Self::JumpAddr
                | Self::JumpCarry
                | Self::JumpEqu
                | Self::JumpNequ
                | Self::JumpGrtr
                | Self::JumpLess
                | Self::JumpGequ
                | Self::JumpLequ
        )
    }

    /// Encoded length of the instruction, in bytes
    #[must_use]
    pub const fn size(self) -> usize {
        if self.has_operand() {
            2
        } else {
            1
        }
    }

    /// Execute the instruction
    ///
    /// The instruction pointer is left on the last byte of the instruction (or one byte before
    /// the jump target), the caller moves it forward.
    #[tracing::instrument(skip(computer), level = "trace")]
    pub(crate) fn execute<M: Bus>(self, computer: &mut Computer<M>) -> Result<(), Exception> {
        match self {
            Self::Halt => computer.halt(),

            Self::LoadAx => computer.registers.ax = computer.fetch_operand(),
            Self::LoadAxBx => computer.registers.ax = computer.registers.bx,
            Self::LoadAxSp => computer.registers.ax = computer.registers.sp,
            Self::LoadAxBp => computer.registers.ax = computer.registers.bp,

            Self::LoadBx => computer.registers.bx = computer.fetch_operand(),
            Self::LoadBxAx => computer.registers.bx = computer.registers.ax,
            Self::LoadBxSp => computer.registers.bx = computer.registers.sp,
            Self::LoadBxBp => computer.registers.bx = computer.registers.bp,

            Self::LoadSpAx => computer.registers.sp = computer.registers.ax,
            Self::LoadSpBx => computer.registers.sp = computer.registers.bx,
            Self::LoadBpAx => computer.registers.bp = computer.registers.ax,
            Self::LoadBpBx => computer.registers.bp = computer.registers.bx,

            Self::PushAx => computer.push(computer.registers.ax),
            Self::PushBx => computer.push(computer.registers.bx),
            Self::PushReg => {
                computer.push(computer.registers.ax);
                computer.push(computer.registers.bx);
            }
            Self::PushFlag => computer.push(computer.registers.flags.bits()),
            Self::PushAll => {
                computer.push(computer.registers.ax);
                computer.push(computer.registers.bx);
                computer.push(computer.registers.flags.bits());
            }

            Self::PopAx => computer.registers.ax = computer.pop(),
            Self::PopBx => computer.registers.bx = computer.pop(),
            Self::PopReg => {
                computer.registers.bx = computer.pop();
                computer.registers.ax = computer.pop();
            }
            Self::PopFlag => {
                computer.registers.flags = StatusRegister::from_bits_retain(computer.pop());
            }
            Self::PopAll => {
                computer.registers.flags = StatusRegister::from_bits_retain(computer.pop());
                computer.registers.bx = computer.pop();
                computer.registers.ax = computer.pop();
            }

            Self::JumpAddr => computer.jump(),
            Self::JumpCarry => {
                let carry = computer.registers.flags.contains(StatusRegister::CARRY);
                computer.jump_if(carry);
            }
            Self::JumpEqu => computer.jump_if(computer.registers.ax == computer.registers.bx),
            Self::JumpNequ => computer.jump_if(computer.registers.ax != computer.registers.bx),
            Self::JumpGrtr => computer.jump_if(computer.registers.ax > computer.registers.bx),
            Self::JumpLess => computer.jump_if(computer.registers.ax < computer.registers.bx),
            Self::JumpGequ => computer.jump_if(computer.registers.ax >= computer.registers.bx),
            Self::JumpLequ => {
                let (a, b) = (computer.registers.ax, computer.registers.bx);
                let taken = if computer.config.lequ_compat {
                    a != b
                } else {
                    a <= b
                };
                computer.jump_if(taken);
            }

            Self::Unknown(opcode) => {
                let address = computer.registers.ip;
                match computer.config.on_invalid_opcode {
                    InvalidOpcodePolicy::Halt => {
                        warn!(opcode, address, "Invalid instruction, halting");
                        computer.halt();
                    }
                    InvalidOpcodePolicy::Fault => {
                        return Err(Exception::InvalidInstruction { opcode, address });
                    }
                }
            }
        }

        Ok(())
    }
}

/// An opcode with its operand, as laid out in memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,

    /// `None` if the opcode takes no operand, or if the operand is out of the decoded region
    pub operand: Option<Word>,
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.opcode.has_operand(), self.operand) {
            (true, Some(operand)) => write!(f, "{:<9} {operand:#04x}", self.opcode.to_string()),
            (true, None) => write!(f, "{:<9} ?", self.opcode.to_string()),
            (false, _) => write!(f, "{}", self.opcode),
        }
    }
}

/// Iterator over the instructions of a memory region, see [`disassemble`]
#[derive(Debug, Clone)]
pub struct Disassembler<'a> {
    bytes: &'a [Word],
    offset: usize,
}

impl Iterator for Disassembler<'_> {
    type Item = (Address, Instruction);

    fn next(&mut self) -> Option<Self::Item> {
        let byte = *self.bytes.get(self.offset)?;
        let address = Address::try_from(self.offset).ok()?;
        let opcode = Opcode::from(byte);
        let operand = if opcode.has_operand() {
            self.bytes.get(self.offset + 1).copied()
        } else {
            None
        };

        self.offset += opcode.size();
        debug!(address, %opcode, "Decoded instruction");
        Some((address, Instruction { opcode, operand }))
    }
}

/// Decode a memory region, the first byte being at address 0
#[must_use]
pub fn disassemble(bytes: &[Word]) -> Disassembler<'_> {
    Disassembler { bytes, offset: 0 }
}
