//! Keystore round trips at the production PBKDF2 round count, plus file I/O

use ledger_wallet_libs::{
    key_management::KDF_MAX_ITERATIONS, wallet::WalletBuilder, Address, Keystore, KeystoreError,
    KeystoreRecord, Wallet, WalletError,
};
use tempfile::TempDir;

#[test]
fn test_full_strength_round_trip() {
    let wallet = Wallet::generate().unwrap();
    let keystore = Keystore::default();

    let record = keystore.create(&wallet, "correct horse battery staple").unwrap();
    assert_eq!(record.crypto.kdfparams.c, 262_144);

    let recovered = keystore
        .recover(&record, "correct horse battery staple")
        .unwrap();
    assert_eq!(recovered.address(), wallet.address());
    assert_eq!(recovered.public_key(), wallet.public_key());

    let err = keystore.recover(&record, "Tr0ub4dor&3").unwrap_err();
    assert!(matches!(
        err,
        WalletError::KeystoreError(KeystoreError::WrongPassword)
    ));
}

#[test]
fn test_round_count_outside_accepted_range() {
    let wallet = Wallet::from_private_key([0x21; 32]).unwrap();
    let keystore = Keystore::default();
    let record = keystore.create(&wallet, "pw").unwrap();

    // Rejected before any key derivation runs
    for c in [1, 1_000, KDF_MAX_ITERATIONS + 1] {
        let mut weakened = record.clone();
        weakened.crypto.kdfparams.c = c;
        assert!(matches!(
            keystore.recover(&weakened, "pw"),
            Err(WalletError::KeystoreError(KeystoreError::UnsupportedVersion(_)))
        ));
        assert!(!keystore.verify_password(&weakened, "pw"));
    }
}

#[test]
fn test_verify_password_agrees_with_recover() {
    let wallet = Wallet::from_private_key([0x24; 32]).unwrap();
    let keystore = Keystore::default();
    let mut record = keystore.create(&wallet, "pw").unwrap();
    assert!(keystore.verify_password(&record, "pw"));

    record.address = Address::new([0xEE; 20]);
    assert!(keystore.recover(&record, "pw").is_err());
    assert!(!keystore.verify_password(&record, "pw"));
}

#[test]
fn test_save_load_and_build_from_keystore() {
    let wallet = Wallet::from_private_key([0x22; 32]).unwrap();
    let record = Keystore::default().create(&wallet, "pw").unwrap();

    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("wallet.json");
    record.save(&path).unwrap();
    let loaded = KeystoreRecord::load(&path).unwrap();
    assert_eq!(loaded, record);

    let rebuilt = WalletBuilder::new()
        .from_keystore(loaded.clone(), "pw")
        .build()
        .unwrap();
    assert_eq!(rebuilt.address(), wallet.address());

    assert!(matches!(
        WalletBuilder::new().from_keystore(loaded, "nope").build(),
        Err(WalletError::KeystoreError(KeystoreError::WrongPassword))
    ));
}

#[test]
fn test_missing_keystore_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("missing.json");
    assert!(matches!(
        KeystoreRecord::load(&path),
        Err(WalletError::ConfigurationError(_))
    ));
}

#[test]
fn test_malformed_record_json() {
    assert!(KeystoreRecord::from_json("{\"version\":3}").is_err());

    let wallet = Wallet::from_private_key([0x23; 32]).unwrap();
    let mut record = Keystore::default().create(&wallet, "pw").unwrap();
    record.crypto.kdfparams.salt = "not hex".to_string();
    assert!(matches!(
        Keystore::default().recover(&record, "pw"),
        Err(WalletError::KeystoreError(KeystoreError::Corrupted(_)))
    ));
}
