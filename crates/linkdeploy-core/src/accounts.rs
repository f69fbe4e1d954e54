//! Named accounts derived from the configured seed phrase
//!
//! The first three accounts on the standard `m/44'/60'/0'/0/i` path play
//! fixed roles: admin (deploys everything), bot and treasury (passed to
//! constructors).

use alloy::primitives::Address;
use alloy::signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};
use serde_json::Value;

use crate::error::{Error, Result};

/// Prefix marking a constructor argument as an account reference (`"@bot"`)
pub const ACCOUNT_REF_PREFIX: char = '@';

/// The fixed account roles used by a deployment run
#[derive(Debug, Clone)]
pub struct Accounts {
    admin: PrivateKeySigner,
    bot: PrivateKeySigner,
    treasury: PrivateKeySigner,
}

impl Accounts {
    /// Derive the admin, bot and treasury accounts (indices 0, 1, 2)
    pub fn from_mnemonic(phrase: &str) -> Result<Self> {
        Ok(Self {
            admin: derive_signer(phrase, 0)?,
            bot: derive_signer(phrase, 1)?,
            treasury: derive_signer(phrase, 2)?,
        })
    }

    /// The account that signs every deployment transaction
    pub fn deployer(&self) -> &PrivateKeySigner {
        &self.admin
    }

    pub fn admin(&self) -> Address {
        self.admin.address()
    }

    pub fn bot(&self) -> Address {
        self.bot.address()
    }

    pub fn treasury(&self) -> Address {
        self.treasury.address()
    }

    /// Role names paired with their addresses, in derivation order
    pub fn named(&self) -> [(&'static str, Address); 3] {
        [
            ("admin", self.admin()),
            ("bot", self.bot()),
            ("treasury", self.treasury()),
        ]
    }

    /// Look up an account by role name
    pub fn get(&self, role: &str) -> Option<Address> {
        self.named()
            .into_iter()
            .find(|(name, _)| *name == role)
            .map(|(_, address)| address)
    }

    /// Replace `"@role"` strings (at any depth) with the role's address
    pub fn resolve_arg(&self, value: &Value) -> Result<Value> {
        match value {
            Value::String(s) => match s.strip_prefix(ACCOUNT_REF_PREFIX) {
                Some(role) => self
                    .get(role)
                    .map(|address| Value::String(address.to_string()))
                    .ok_or_else(|| Error::Account(format!("Unknown account '{}'", s))),
                None => Ok(value.clone()),
            },
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve_arg(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            _ => Ok(value.clone()),
        }
    }

    pub fn resolve_args(&self, args: &[Value]) -> Result<Vec<Value>> {
        args.iter().map(|arg| self.resolve_arg(arg)).collect()
    }
}

/// Derive the signer at `index` on the default Ethereum derivation path
pub fn derive_signer(phrase: &str, index: u32) -> Result<PrivateKeySigner> {
    MnemonicBuilder::<English>::default()
        .phrase(phrase.trim())
        .index(index)
        .map_err(|e| Error::Account(format!("Invalid derivation index {}: {}", index, e)))?
        .build()
        .map_err(|e| Error::Account(format!("Invalid mnemonic: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";

    fn address(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn test_derives_well_known_accounts() {
        let accounts = Accounts::from_mnemonic(TEST_MNEMONIC).unwrap();

        assert_eq!(
            accounts.admin(),
            address("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
        assert_eq!(
            accounts.bot(),
            address("0x70997970C51812dc3A010C7d01b50e0d17dc79C8")
        );
        assert_eq!(
            accounts.treasury(),
            address("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC")
        );
        assert_eq!(accounts.deployer().address(), accounts.admin());
    }

    #[test]
    fn test_invalid_mnemonic() {
        assert!(matches!(
            Accounts::from_mnemonic("not a real phrase"),
            Err(Error::Account(_))
        ));
    }

    #[test]
    fn test_resolve_account_references() {
        let accounts = Accounts::from_mnemonic(TEST_MNEMONIC).unwrap();

        let resolved = accounts
            .resolve_args(&[json!("@bot"), json!("@treasury"), json!(7), json!(["@admin"])])
            .unwrap();

        assert_eq!(resolved[0], json!(accounts.bot().to_string()));
        assert_eq!(resolved[1], json!(accounts.treasury().to_string()));
        assert_eq!(resolved[2], json!(7));
        assert_eq!(resolved[3], json!([accounts.admin().to_string()]));
    }

    #[test]
    fn test_unknown_account_reference() {
        let accounts = Accounts::from_mnemonic(TEST_MNEMONIC).unwrap();
        assert!(accounts.resolve_arg(&json!("@nobody")).is_err());
        assert_eq!(
            accounts.resolve_arg(&json!("plain")).unwrap(),
            json!("plain")
        );
    }
}
