//! Probe command implementation

use super::{open_target, CmdResult};
use crate::cli::BootArgs;
use spinor_core::protocol::{self, QuadEnable};
use spinor_core::spi::Register;

/// Initialize the driver and report what it negotiated
pub fn run_probe(programmer: &str, boot: &BootArgs) -> CmdResult {
    let mut target = open_target(programmer, boot)?;

    let id = target
        .nor
        .identity()
        .ok_or("Driver did not record an identity")?;
    let session = *target.nor.session();

    println!("Flash chip:");
    println!("  Vendor:    {}", id.vendor_name());
    println!("  JEDEC ID:  {}", id);
    match target.chip_size() {
        Some(size) => println!("  Size:      {} bytes ({} KiB)", size, size / 1024),
        None => println!("  Size:      unknown (capacity 0x{:02X})", id.capacity),
    }
    println!("  Read:      opcode 0x{:02X}", session.read_opcode);
    println!("  Addresses: {}", session.address_width);
    println!("  Quad:      {}", QuadEnable::from(&id));
    if protocol::has_volatile_qe(&id) {
        println!("             (volatile, always on)");
    }

    println!("Registers:");
    let transport = target.nor.transport_mut();
    for reg in [Register::Status1, Register::Status2, Register::Config] {
        match protocol::read_register(transport, reg) {
            Ok(value) => println!("  {:4} 0x{:02X}", reg.to_string(), value),
            Err(e) => println!("  {:4} unreadable ({})", reg.to_string(), e),
        }
    }

    Ok(())
}
