pub type Address = u8;
pub type Word = u8;

/// Total size of the computer memory
pub const MEMORY_SIZE: usize = 1 << Address::BITS;

/// Number of consecutive faults before the driver gives up
pub const TRIPLE_FAULT: usize = 3;
