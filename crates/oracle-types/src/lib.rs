//! Common types module for the flux oracle node.
//!
//! This module defines the data types shared by every oracle component:
//! TRON addresses, the aggregator round state, submission receipts and the
//! secret wrapper used for private keys.

/// TRON address parsing and formatting.
pub mod address;
/// Submission receipts.
pub mod receipt;
/// Aggregator round state.
pub mod round;
/// Redacting wrapper for sensitive strings.
pub mod secret_string;
/// Utility functions for hex handling and formatting.
pub mod utils;

pub use address::{AddressError, TronAddress};
pub use receipt::TransactionReceipt;
pub use round::RoundState;
pub use secret_string::SecretString;
pub use utils::{decode_node_message, truncate_id, without_0x_prefix};

// Numeric types used by round state and contract calls.
pub use alloy_primitives::{B256, I256, U256};
