//! SPI-NOR opcodes used by the boot-stage driver
//!
//! Only the commands the driver actually issues are listed here. Naming
//! follows the JEDEC/flashprog conventions.

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required before any write/erase operation
pub const WREN: u8 = 0x06;

// ============================================================================
// Status and configuration registers
// ============================================================================

/// Read Status Register 1
pub const RDSR: u8 = 0x05;
/// Read Status Register 2
pub const RDSR2: u8 = 0x35;
/// Read Configuration Register
pub const RDCR: u8 = 0x15;
/// Write Status Register 1 (optionally followed by the configuration byte)
pub const WRSR: u8 = 0x01;
/// Write Status Register 2
pub const WRSR2: u8 = 0x31;

// ============================================================================
// Identification
// ============================================================================

/// Read JEDEC ID (manufacturer, memory type, capacity)
pub const RDID: u8 = 0x9F;

// ============================================================================
// Read commands
// ============================================================================

/// Read Data, no dummy cycles (slow legacy read)
pub const READ: u8 = 0x03;
/// Fast Read, one dummy byte
pub const FAST_READ: u8 = 0x0B;
/// Dual Output Read (1-1-2) with 3-byte address
pub const DOR: u8 = 0x3B;
/// Quad Output Read (1-1-4) with 3-byte address
pub const QOR: u8 = 0x6B;
/// Dual Output Read (1-1-2) with 4-byte address
pub const DOR_4B: u8 = 0x3C;
/// Quad Output Read (1-1-4) with 4-byte address
pub const QOR_4B: u8 = 0x6C;

// ============================================================================
// Program / erase
// ============================================================================

/// Page Program with 3-byte address
pub const PP: u8 = 0x02;
/// Sector Erase 4KB with 3-byte address
pub const SE_20: u8 = 0x20;

// ============================================================================
// 4-byte address mode control
// ============================================================================

/// Enter 4-Byte Address Mode
pub const EN4B: u8 = 0xB7;
/// Exit 4-Byte Address Mode
pub const EX4B: u8 = 0xE9;

// ============================================================================
// Block locking
// ============================================================================

/// Global Block Unlock - clears individual block/sector lock bits
pub const GBULK: u8 = 0x98;
