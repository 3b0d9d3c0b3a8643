//! Utility functions for hex handling and log formatting.

pub mod formatting;

pub use formatting::{decode_node_message, truncate_id, without_0x_prefix};
