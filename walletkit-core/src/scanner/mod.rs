//! Account discovery on a hardware device.

pub(crate) mod logic;

mod scanner;

pub use scanner::{AccountScanner, DiscoveredAccountStream, ScanEvent};
