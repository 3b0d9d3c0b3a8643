//! Local private key account.
//!
//! Keeps a secp256k1 key in memory. The TRON address is the EVM address of
//! the same key with the `0x41` prefix.

use crate::{AccountError, AccountInterface, Signature};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use oracle_types::{SecretString, TronAddress, B256};

/// Account backed by a private key held in memory.
pub struct LocalAccount {
	signer: PrivateKeySigner,
}

impl LocalAccount {
	/// Creates an account from a hex private key, with or without `0x`.
	pub fn new(private_key: &SecretString) -> Result<Self, AccountError> {
		let signer = private_key.with_exposed(|key| {
			key.trim()
				.parse::<PrivateKeySigner>()
				.map_err(|_| AccountError::InvalidKey("Invalid private key format".to_string()))
		})?;

		Ok(Self { signer })
	}

	pub fn tron_address(&self) -> TronAddress {
		TronAddress::from(self.signer.address())
	}
}

#[async_trait]
impl AccountInterface for LocalAccount {
	async fn address(&self) -> Result<TronAddress, AccountError> {
		Ok(self.tron_address())
	}

	async fn sign_hash(&self, hash: &B256) -> Result<Signature, AccountError> {
		let signature = self
			.signer
			.sign_hash_sync(hash)
			.map_err(|e| AccountError::SigningFailed(e.to_string()))?;

		Ok(Signature(signature.as_bytes().to_vec()))
	}
}

/// Creates the configured account implementation.
pub fn create_account(
	private_key: &SecretString,
) -> Result<Box<dyn AccountInterface>, AccountError> {
	Ok(Box::new(LocalAccount::new(private_key)?))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::AccountService;

	// Well-known development key; its EVM address is 0xf39F...2266
	const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	#[tokio::test]
	async fn test_address_is_prefixed_evm_address() {
		let account = LocalAccount::new(&SecretString::from(DEV_KEY)).unwrap();
		let address = account.address().await.unwrap();

		assert_eq!(
			address.to_hex(),
			"41f39fd6e51aad88f6f4ce6ab8827279cfffb92266"
		);
		assert!(address.to_base58().starts_with('T'));
	}

	#[tokio::test]
	async fn test_key_without_prefix() {
		let account = LocalAccount::new(&SecretString::from(&DEV_KEY[2..])).unwrap();
		assert_eq!(
			account.tron_address().to_hex(),
			"41f39fd6e51aad88f6f4ce6ab8827279cfffb92266"
		);
	}

	#[tokio::test]
	async fn test_sign_hash_is_deterministic() {
		let service = AccountService::new(create_account(&SecretString::from(DEV_KEY)).unwrap());
		let hash = B256::repeat_byte(0x11);

		let first = service.sign(&hash).await.unwrap();
		let second = service.sign(&hash).await.unwrap();

		assert_eq!(first.as_bytes().len(), 65);
		assert_eq!(first, second);
		assert!(matches!(first.as_bytes()[64], 0 | 1 | 27 | 28));
	}

	#[test]
	fn test_invalid_key_rejected() {
		let result = LocalAccount::new(&SecretString::from("0xnot-a-key"));
		assert!(matches!(result, Err(AccountError::InvalidKey(_))));
	}
}
