use dogecoin_signer::signing::{compute_sighash, sign, SighashDigest};
use dogecoin_signer::tx::{TxInput, TxOutput};
use dogecoin_signer::{
    api, Address, EngineConfig, ErrorCode, Network, OutPoint, PrivateKey, SighashType, SpendType,
    Transaction, Txid,
};
use proptest::prelude::*;

fn any_private_key() -> impl Strategy<Value = PrivateKey> {
    prop::array::uniform32(any::<u8>()).prop_filter_map("valid secp256k1 scalar", |bytes| {
        PrivateKey::from_slice(&bytes).ok()
    })
}

fn any_network() -> impl Strategy<Value = Network> {
    prop_oneof![Just(Network::Mainnet), Just(Network::Testnet)]
}

fn any_outpoint() -> impl Strategy<Value = OutPoint> {
    (prop::array::uniform32(any::<u8>()), any::<u32>())
        .prop_map(|(bytes, vout)| OutPoint::new(Txid::from_wire_bytes(bytes), vout))
}

fn any_input() -> impl Strategy<Value = TxInput> {
    (any_outpoint(), prop::collection::vec(any::<u8>(), 0..300), any::<u32>()).prop_map(
        |(previous_output, script_sig, sequence)| TxInput {
            previous_output,
            script_sig,
            sequence,
        },
    )
}

fn any_output() -> impl Strategy<Value = TxOutput> {
    (any::<u64>(), prop::collection::vec(any::<u8>(), 0..60)).prop_map(|(value, script_pubkey)| {
        TxOutput {
            value,
            script_pubkey,
        }
    })
}

fn any_transaction() -> impl Strategy<Value = Transaction> {
    (
        any::<i32>(),
        prop::collection::vec(any_input(), 0..5),
        prop::collection::vec(any_output(), 0..5),
        any::<u32>(),
    )
        .prop_map(|(version, inputs, outputs, lock_time)| Transaction {
            version,
            inputs,
            outputs,
            lock_time,
        })
}

proptest! {
    #[test]
    fn transactions_survive_the_wire(tx in any_transaction()) {
        let bytes = tx.serialize();
        let decoded = Transaction::deserialize(&bytes).expect("decodes");
        prop_assert_eq!(&decoded, &tx);
        prop_assert_eq!(decoded.serialize(), bytes);
        prop_assert_eq!(Transaction::from_hex(&tx.to_hex()).expect("hex decodes"), tx);
    }

    #[test]
    fn truncated_transactions_are_rejected(tx in any_transaction(), cut in 1usize..8) {
        let bytes = tx.serialize();
        let keep = bytes.len().saturating_sub(cut);
        prop_assert!(Transaction::deserialize(&bytes[..keep]).is_err());
    }

    #[test]
    fn addresses_round_trip(key in any_private_key(), network in any_network()) {
        let address = Address::p2pkh(&key.public_key(), network);
        let text = address.to_string();
        let expected_prefix = match network {
            Network::Mainnet => 'D',
            Network::Testnet => 'n',
        };
        prop_assert!(text.starts_with(expected_prefix));

        let parsed: Address = text.parse().expect("checksum verifies");
        prop_assert_eq!(parsed, address);
        prop_assert_eq!(parsed.to_string(), text);
    }

    #[test]
    fn signatures_verify(key in any_private_key(), digest in prop::array::uniform32(any::<u8>())) {
        let digest = SighashDigest::from_bytes(digest);
        let signature = sign(&digest, &key);
        prop_assert!(signature.verify(&digest, &key.public_key()));
        prop_assert_eq!(sign(&digest, &key), signature);

        let signature_hex = api::sign(&digest.to_hex(), &key.to_hex()).expect("signs");
        let public_hex = api::derive_public_key(&key.to_hex()).expect("derives");
        prop_assert!(api::verify(&digest.to_hex(), &signature_hex, &public_hex).expect("parses"));
    }

    #[test]
    fn sighash_isolated_from_other_script_sigs(
        first in any_outpoint(),
        second in any_outpoint(),
        junk in prop::collection::vec(any::<u8>(), 1..100),
        key in any_private_key(),
    ) {
        prop_assume!(first != second);
        let input = |previous_output| TxInput { previous_output, script_sig: vec![], sequence: u32::MAX };
        let tx = Transaction {
            version: 1,
            inputs: vec![input(first), input(second)],
            outputs: vec![],
            lock_time: 0,
        };
        let pubkey = key.public_key().serialize();
        let before = compute_sighash(&tx, &first, SpendType::P2pkh, &pubkey, SighashType::All).unwrap();

        // hashing the other input leaves the snapshot untouched
        compute_sighash(&tx, &second, SpendType::P2pkh, &pubkey, SighashType::All).unwrap();
        let again = compute_sighash(&tx, &first, SpendType::P2pkh, &pubkey, SighashType::All).unwrap();
        prop_assert_eq!(before, again);

        let mut partially_signed = tx.clone();
        partially_signed.inputs[1].script_sig = junk.clone();
        partially_signed.inputs[0].script_sig = junk;
        let after = compute_sighash(&partially_signed, &first, SpendType::P2pkh, &pubkey, SighashType::All).unwrap();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn threshold_bounds_are_enforced(count in 1usize..=15, threshold in -3i64..20) {
        let keys: Vec<String> = (1..=count as u8)
            .map(|i| {
                let mut bytes = [0u8; 32];
                bytes[31] = i;
                PrivateKey::from_slice(&bytes).unwrap().public_key().to_hex()
            })
            .collect();
        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();

        let result = api::build_redeem_script(&refs, threshold);
        if threshold >= 1 && threshold as usize <= count {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(result.unwrap_err().code, ErrorCode::InvalidThreshold);
        }
    }

    #[test]
    fn mismatched_arrays_fail_first(txid_count in 0usize..4, vout_count in 0usize..4) {
        prop_assume!(txid_count != vout_count);
        // deliberately malformed txids; the length check must fire before parsing
        let txids = vec!["not-a-txid"; txid_count];
        let vouts = vec![0u32; vout_count];
        let err = api::generate_raw_tx(&txids, &vouts, &[], &[], &EngineConfig::default()).unwrap_err();
        prop_assert_eq!(err.code, ErrorCode::LengthMismatch);
    }
}
