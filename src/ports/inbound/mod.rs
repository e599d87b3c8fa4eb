/// Inbound ports (Driving ports) - Use case interfaces
///
/// These ports define the interfaces that external adapters (e.g., the CLI
/// or a host editor's UI layer) use to interact with the application core.
pub mod reference_index_port;

pub use reference_index_port::ReferenceIndexPort;
