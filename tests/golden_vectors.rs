//! Golden test vector validation
//!
//! The vectors were produced with libsodium (`crypto_pwhash` at the
//! interactive limits with Argon2id13, then
//! `crypto_aead_chacha20poly1305_ietf_encrypt`), the same construction the
//! original client used to write exports.

use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct GoldenVector {
    plaintext: String,
    passphrase: String,
    salt: String,
    nonce: String,
    exported: String,
    comment: String,
}

fn load_golden_vectors() -> Result<Vec<GoldenVector>> {
    let json_data = include_str!("../testdata/golden-vectors.json");
    let vectors: Vec<GoldenVector> = serde_json::from_str(json_data)?;
    Ok(vectors)
}

#[test]
fn test_golden_vectors() {
    let vectors = load_golden_vectors().expect("failed to load golden vectors");
    assert!(!vectors.is_empty(), "No golden vectors were tested");

    for (i, vector) in vectors.iter().enumerate() {
        let salt: [u8; 16] = hex::decode(&vector.salt)
            .expect("failed to decode salt")
            .try_into()
            .expect("salt must be 16 bytes");
        let nonce: [u8; 12] = hex::decode(&vector.nonce)
            .expect("failed to decode nonce")
            .try_into()
            .expect("nonce must be 12 bytes");

        let exported = connseal::secretcrypt::encrypt_deterministic(
            &vector.plaintext,
            &vector.passphrase,
            &salt,
            &nonce,
        )
        .unwrap_or_else(|e| panic!("vector {} ({}): encrypt failed: {}", i, vector.comment, e));
        assert_eq!(
            exported, vector.exported,
            "vector {} ({}): export mismatch",
            i, vector.comment
        );

        let decrypted = connseal::decrypt_with_passphrase(&vector.exported, &vector.passphrase)
            .unwrap_or_else(|e| panic!("vector {} ({}): decrypt failed: {}", i, vector.comment, e));
        assert_eq!(
            decrypted, vector.plaintext,
            "vector {} ({}): plaintext mismatch",
            i, vector.comment
        );
    }
}

#[test]
fn test_golden_vector_wrong_passphrase() {
    let vectors = load_golden_vectors().expect("failed to load golden vectors");
    let vector = &vectors[0];

    let err = connseal::decrypt_with_passphrase(&vector.exported, "not the passphrase")
        .expect_err("expected authentication failure");
    assert_eq!(err.kind, Some(connseal::ErrorKind::AuthenticationFailed));
}

#[test]
fn test_golden_connection_export() {
    let exported =
        include_str!("../testdata/localhost.arb-sep-shinkai_main_device.shinkai.key");
    let setup = connseal::connection::restore_connection(exported, "correct horse battery staple")
        .expect("failed to restore connection");

    assert_eq!(setup.shinkai_identity, "@@localhost.arb-sep-shinkai");
    assert_eq!(setup.registration_name, "main_device");
    assert_eq!(
        setup.profile_encryption_sk,
        "e82bd03bf86b935fa34d71ad7ebb049f1f10f87d343e521511d8f9e66256204d"
    );
    assert_eq!(
        setup.extra.get("api_v2_key").and_then(|v| v.as_str()),
        Some("legacy-field-kept")
    );
    assert_eq!(
        setup.export_file_name(),
        "localhost.arb-sep-shinkai_main_device.shinkai.key"
    );
}
