//! Flash driver
//!
//! [`SpiNor`] owns the transport and the [`Session`] for one chip. The
//! data path in [`operations`] and the init sequence in [`init`] are free
//! functions over a transport and a session so they can be driven
//! directly in tests.

mod driver;
pub mod init;
pub mod operations;
mod session;

pub use driver::SpiNor;
pub use session::Session;
