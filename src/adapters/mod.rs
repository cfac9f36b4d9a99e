//! Concrete adapter implementations for ports.

pub mod csv_export_adapter;
pub mod csv_table_adapter;
pub mod file_config_adapter;
