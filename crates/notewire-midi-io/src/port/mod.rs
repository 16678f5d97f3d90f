//! Input sources and the registry that keeps them wired to the parser.

mod info;
mod registry;

pub use info::{PortInfo, PortState, PortType, SourceId};
pub use registry::DeviceRegistry;
