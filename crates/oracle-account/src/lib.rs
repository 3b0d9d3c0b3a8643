//! Account management module for the flux oracle node.
//!
//! This module provides the key-management seam of the node: the address
//! the oracle reports from and the signing of transaction hashes. Everything
//! else treats the account as opaque.

use async_trait::async_trait;
use oracle_types::{TronAddress, B256};
use std::fmt;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when signing operations fail.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
}

/// A recoverable secp256k1 signature: `r || s || v`, 65 bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(pub Vec<u8>);

impl Signature {
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	pub fn to_hex(&self) -> String {
		hex::encode(&self.0)
	}
}

impl fmt::Debug for Signature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Signature({})", self.to_hex())
	}
}

/// Trait defining the interface for account implementations.
///
/// Implementations hold the private key; callers only ever see the address
/// and signatures over hashes they computed themselves.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Retrieves the address associated with this account.
	///
	/// The address is derived from the account's public key and is used as the
	/// `owner_address` of every call the oracle makes.
	///
	/// # Returns
	///
	/// Returns the account's TRON address or an error if it cannot be derived.
	async fn address(&self) -> Result<TronAddress, AccountError>;

	/// Signs a 32-byte transaction hash.
	///
	/// The hash is signed as-is, without any message prefix, so the result can
	/// be attached directly to the transaction it was computed from.
	///
	/// # Arguments
	///
	/// * `hash` - SHA-256 of the raw transaction bytes
	///
	/// # Returns
	///
	/// Returns the 65-byte `r || s || v` signature, or
	/// `AccountError::SigningFailed` if the signer rejects the hash.
	async fn sign_hash(&self, hash: &B256) -> Result<Signature, AccountError>;
}

/// Service that manages account operations.
///
/// Wraps the configured account implementation so the rest of the node can
/// share it behind an `Arc`.
pub struct AccountService {
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	/// Retrieves the address of the managed account.
	pub async fn get_address(&self) -> Result<TronAddress, AccountError> {
		self.implementation.address().await
	}

	/// Signs a transaction hash with the managed account.
	pub async fn sign(&self, hash: &B256) -> Result<Signature, AccountError> {
		self.implementation.sign_hash(hash).await
	}
}
