//! Port traits between the domain core and its collaborators.

pub mod config_port;
pub mod export_port;
pub mod table_port;
