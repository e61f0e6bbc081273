use fieldcrypt_crypto::{
    CryptoError, Encryptor, EncryptorError, PassthroughEncryptor, PrefixedAesEncryptor,
};

fn encryptor() -> PrefixedAesEncryptor {
    PrefixedAesEncryptor::new("k", "s", "_ENC_")
}

// ── PrefixedAesEncryptor ────────────────────────────────────────

#[test]
fn deterministic_hello_roundtrip() {
    let enc = encryptor();
    let ciphertext = enc.encrypt_str("hello", true).unwrap();
    assert!(ciphertext.starts_with("_ENC_"));
    assert_eq!(enc.decrypt_str(&ciphertext, true).unwrap(), "hello");
}

#[test]
fn deterministic_ciphertext_starts_with_zero_iv() {
    let ciphertext = encryptor().encrypt_str("hello", true).unwrap();
    // 16 zero IV bytes encode to a run of 'A' characters.
    assert!(ciphertext.starts_with("_ENC_AAAAAAAAAAAAAAAAAAAA"));
}

#[test]
fn deterministic_ciphertext_length() {
    // salt + "hello" fits one block: base64(16 IV + 16 ciphertext) is 44 chars.
    let ciphertext = encryptor().encrypt_str("hello", true).unwrap();
    assert_eq!(ciphertext.len(), "_ENC_".len() + 44);
}

#[test]
fn deterministic_encryption_is_repeatable() {
    let enc = encryptor();
    let c1 = enc.encrypt_str("same value", true).unwrap();
    let c2 = enc.encrypt_str("same value", true).unwrap();
    assert_eq!(c1, c2);
}

#[test]
fn random_encryption_differs_each_call() {
    let enc = encryptor();
    let c1 = enc.encrypt_str("same value", false).unwrap();
    let c2 = enc.encrypt_str("same value", false).unwrap();
    assert_ne!(c1, c2);
    assert_eq!(enc.decrypt_str(&c1, false).unwrap(), "same value");
    assert_eq!(enc.decrypt_str(&c2, false).unwrap(), "same value");
}

#[test]
fn determinism_flag_is_ignored_on_decrypt() {
    let enc = encryptor();
    let random = enc.encrypt_str("value", false).unwrap();
    assert_eq!(enc.decrypt_str(&random, true).unwrap(), "value");
}

#[test]
fn different_salts_produce_different_deterministic_ciphertext() {
    let a = PrefixedAesEncryptor::new("k", "salt-a", "_ENC_");
    let b = PrefixedAesEncryptor::new("k", "salt-b", "_ENC_");
    assert_ne!(
        a.encrypt_str("hello", true).unwrap(),
        b.encrypt_str("hello", true).unwrap()
    );
}

#[test]
fn value_without_prefix_passes_through() {
    let enc = encryptor();
    assert_eq!(enc.decrypt_str("plain text", true).unwrap(), "plain text");
    assert_eq!(enc.decrypt_str("", false).unwrap(), "");
}

#[test]
fn decrypting_twice_is_idempotent() {
    let enc = encryptor();
    let ciphertext = enc.encrypt_str("hello", false).unwrap();
    let once = enc.decrypt_str(&ciphertext, false).unwrap();
    let twice = enc.decrypt_str(&once, false).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn empty_plaintext_roundtrip() {
    let enc = encryptor();
    let ciphertext = enc.encrypt_str("", false).unwrap();
    assert!(ciphertext.starts_with("_ENC_"));
    assert_eq!(enc.decrypt_str(&ciphertext, false).unwrap(), "");
}

#[test]
fn multi_block_plaintext_roundtrip() {
    let enc = encryptor();
    let plaintext = "a considerably longer value spanning several AES blocks of sixteen bytes";
    let ciphertext = enc.encrypt_str(plaintext, false).unwrap();
    assert_eq!(enc.decrypt_str(&ciphertext, false).unwrap(), plaintext);
}

#[test]
fn trailing_zero_bytes_are_lost() {
    let enc = encryptor();
    let ciphertext = enc.encrypt(b"abc\0\0", true).unwrap();
    assert_eq!(enc.decrypt(&ciphertext, true).unwrap(), b"abc");
}

#[test]
fn custom_prefix_marks_ciphertext() {
    let enc = PrefixedAesEncryptor::new("k", "s", "$sealed$");
    assert_eq!(enc.prefix(), "$sealed$");
    let ciphertext = enc.encrypt_str("hello", true).unwrap();
    assert!(ciphertext.starts_with("$sealed$"));
    assert!(enc.is_encrypted(ciphertext.as_bytes()));
    // The default marker is plain text to this encryptor.
    assert_eq!(enc.decrypt_str("_ENC_abc", true).unwrap(), "_ENC_abc");
}

#[test]
fn default_prefix_constructor() {
    let enc = PrefixedAesEncryptor::with_default_prefix("k", "s");
    assert_eq!(enc.prefix(), PrefixedAesEncryptor::DEFAULT_PREFIX);
    assert_eq!(enc.prefix(), "_ENC_");
}

#[test]
fn is_encrypted_checks_prefix() {
    let enc = encryptor();
    assert!(enc.is_encrypted(b"_ENC_abc"));
    assert!(!enc.is_encrypted(b"abc_ENC_"));
    assert!(!enc.is_encrypted(b""));
}

#[test]
fn malformed_base64_is_a_cipher_error() {
    let err = encryptor().decrypt(b"_ENC_%%%not-base64%%%", false).unwrap_err();
    assert!(matches!(
        err,
        EncryptorError::Crypto(CryptoError::InvalidCiphertext(_))
    ));
}

#[test]
fn truncated_iv_is_a_cipher_error() {
    // "AAAA" decodes to three bytes, shorter than the IV.
    let err = encryptor().decrypt(b"_ENC_AAAA", false).unwrap_err();
    assert!(matches!(
        err,
        EncryptorError::Crypto(CryptoError::InvalidIvLength { .. })
    ));
}

#[test]
fn truncated_ciphertext_is_a_cipher_error() {
    let enc = encryptor();
    let mut ciphertext = enc.encrypt_str("hello", true).unwrap();
    // Drop the last base64 quantum so the body is no longer block aligned.
    ciphertext.truncate(ciphertext.len() - 4);
    assert!(enc.decrypt_str(&ciphertext, true).is_err());
}

#[test]
fn wrong_secret_does_not_recover_plaintext() {
    let ciphertext = encryptor().encrypt(b"hello", true).unwrap();
    let other = PrefixedAesEncryptor::new("other", "s", "_ENC_");
    match other.decrypt(&ciphertext, true) {
        Ok(bytes) => assert_ne!(bytes, b"hello"),
        Err(_) => {}
    }
}

#[test]
fn debug_does_not_leak_secret() {
    let enc = PrefixedAesEncryptor::new("super-secret", "pepper", "_ENC_");
    let dbg = format!("{enc:?}");
    assert!(!dbg.contains("super-secret"));
    assert!(!dbg.contains("pepper"));
}

// ── PassthroughEncryptor ────────────────────────────────────────

#[test]
fn passthrough_encrypt_returns_same_data() {
    let enc = PassthroughEncryptor;
    assert_eq!(enc.encrypt(b"hello world", true).unwrap(), b"hello world");
}

#[test]
fn passthrough_decrypt_returns_same_data() {
    let enc = PassthroughEncryptor;
    assert_eq!(enc.decrypt_str("hello world", false).unwrap(), "hello world");
}

#[test]
fn passthrough_never_reports_ciphertext() {
    assert!(!PassthroughEncryptor.is_encrypted(b"_ENC_abc"));
}

#[test]
fn passthrough_works_as_trait_object() {
    let enc: Box<dyn Encryptor> = Box::new(PassthroughEncryptor);
    assert_eq!(enc.encrypt_str("x", false).unwrap(), "x");
}
