//! Connection setup documents
//!
//! What gets exported is the JSON form of the data a client needs to talk to
//! its node as a registered device: addresses, identity names and the
//! profile/device key pairs. Fields this crate does not know about are kept
//! verbatim so a restore never drops data a newer client wrote.

use crate::error::{ConnsealError, ErrorCategory, ErrorKind, Result};
use crate::secretcrypt;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Suffix of exported connection files.
pub const EXPORT_FILE_SUFFIX: &str = ".shinkai.key";

// Equality would compare secret keys in variable time; tests only.
#[cfg_attr(test, derive(PartialEq))]
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ConnectionSetup {
    pub node_address: String,
    pub shinkai_identity: String,
    pub profile: String,
    pub registration_name: String,
    pub permission_type: String,
    pub identity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_code: Option<String>,

    pub node_encryption_pk: String,
    pub node_signature_pk: String,
    pub profile_encryption_pk: String,
    pub profile_identity_pk: String,
    pub my_device_encryption_pk: String,
    pub my_device_identity_pk: String,

    pub profile_encryption_sk: String,
    pub profile_identity_sk: String,
    pub my_device_encryption_sk: String,
    pub my_device_identity_sk: String,

    #[serde(flatten)]
    #[zeroize(skip)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl fmt::Debug for ConnectionSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const REDACTED: &str = "<redacted>";
        f.debug_struct("ConnectionSetup")
            .field("node_address", &self.node_address)
            .field("shinkai_identity", &self.shinkai_identity)
            .field("profile", &self.profile)
            .field("registration_name", &self.registration_name)
            .field("permission_type", &self.permission_type)
            .field("identity_type", &self.identity_type)
            .field("node_encryption_pk", &self.node_encryption_pk)
            .field("node_signature_pk", &self.node_signature_pk)
            .field("profile_encryption_pk", &self.profile_encryption_pk)
            .field("profile_identity_pk", &self.profile_identity_pk)
            .field("my_device_encryption_pk", &self.my_device_encryption_pk)
            .field("my_device_identity_pk", &self.my_device_identity_pk)
            .field("profile_encryption_sk", &REDACTED)
            .field("profile_identity_sk", &REDACTED)
            .field("my_device_encryption_sk", &REDACTED)
            .field("my_device_identity_sk", &REDACTED)
            .finish_non_exhaustive()
    }
}

impl ConnectionSetup {
    /// Parse a setup document from JSON and check it is usable.
    pub fn from_json(json: &str) -> Result<Self> {
        // The serde_json error is not kept as a source: its message can quote
        // field values, and those include secret keys.
        let setup: ConnectionSetup = serde_json::from_str(json).map_err(|e| {
            invalid(format!(
                "not a valid connection setup document (line {}, column {})",
                e.line(),
                e.column()
            ))
        })?;
        setup.validate()?;
        Ok(setup)
    }

    /// Serialize to compact JSON. The buffer is wiped when dropped.
    pub fn to_json(&self) -> Result<Zeroizing<String>> {
        serde_json::to_string(self).map(Zeroizing::new).map_err(|e| {
            ConnsealError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::InternalInvariant,
                "failed to serialize connection setup",
                e,
            )
        })
    }

    /// Check the fields a restored connection cannot work without.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("node_address", &self.node_address),
            ("shinkai_identity", &self.shinkai_identity),
            ("profile", &self.profile),
            ("registration_name", &self.registration_name),
            ("profile_encryption_sk", &self.profile_encryption_sk),
            ("profile_identity_sk", &self.profile_identity_sk),
            ("my_device_encryption_sk", &self.my_device_encryption_sk),
            ("my_device_identity_sk", &self.my_device_identity_sk),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(invalid(format!("connection setup field {} is empty", name)));
        }
        if !self.shinkai_identity.starts_with("@@") {
            return Err(invalid("shinkai_identity must start with @@"));
        }
        Ok(())
    }

    /// Default file name for this connection's export.
    pub fn export_file_name(&self) -> String {
        export_file_name(&self.shinkai_identity, &self.registration_name)
    }
}

/// Build `{identity}_{registration_name}.shinkai.key` with every `@`
/// removed and every `/` replaced by `_`.
pub fn export_file_name(identity: &str, registration_name: &str) -> String {
    format!("{}_{}{}", identity, registration_name, EXPORT_FILE_SUFFIX)
        .replace('@', "")
        .replace('/', "_")
}

/// Encrypt a connection setup under `passphrase`.
pub fn export_connection(setup: &ConnectionSetup, passphrase: &str) -> Result<String> {
    let json = setup.to_json()?;
    secretcrypt::encrypt_with_passphrase(&json, passphrase)
}

/// Decrypt an export and parse it as a connection setup.
pub fn restore_connection(exported: &str, passphrase: &str) -> Result<ConnectionSetup> {
    let json = Zeroizing::new(secretcrypt::decrypt_with_passphrase(exported, passphrase)?);
    ConnectionSetup::from_json(&json)
}

fn invalid(msg: impl Into<String>) -> ConnsealError {
    ConnsealError::with_kind(ErrorCategory::User, ErrorKind::InvalidConnection, msg)
}
