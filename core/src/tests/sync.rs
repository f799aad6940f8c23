use hdmint_coin::{COIN, MAX_MINT_AMOUNT, MINT_TAG, MintScript, PublicCoin, SerialHash};

use super::{coin, harness, identity, master, mint_tx, serial};
use crate::error::WalletError;
use crate::hdmint::{MintRecord, builder, seed};
use crate::ledger::{Transaction, TxOutput};
use crate::storage::MintStore;

#[test]
fn interior_mint_is_confirmed_without_moving_the_counter() {
    let h = harness(20);
    // Genesis is height 0, so the next push lands at 150
    h.ledger.push_empty_blocks(149);
    h.ledger.push_block(vec![mint_tx(&master(1), 7, 2 * COIN)]);

    let report = h.wallet.sync_with_chain(false).unwrap();
    assert_eq!(report.confirmed, vec![7]);
    assert_eq!(report.blocks_scanned, 151);
    assert_eq!(report.tip_height, Some(150));

    let record = h.wallet.get_mint(&serial(&master(1), 7)).unwrap().unwrap();
    assert_eq!(record.index, 7);
    assert_eq!(record.amount, 2 * COIN);
    assert_eq!(record.confirmed_height, Some(150));

    assert!(!h.wallet.is_in_pool(&identity(&master(1), 7)).unwrap());

    let state = h.wallet.state().unwrap();
    assert_eq!(state.last_used, 0);
    assert_eq!(state.last_generated, 20);

    let indices: Vec<u32> = h
        .wallet
        .pool_entries()
        .unwrap()
        .iter()
        .map(|e| e.index)
        .collect();
    let expected: Vec<u32> = (1..=20).filter(|i| *i != 7).collect();
    assert_eq!(indices, expected);
}

#[test]
fn second_sync_is_a_no_op() {
    let h = harness(20);
    h.ledger.push_block(vec![mint_tx(&master(1), 2, COIN)]);
    h.wallet.sync_with_chain(false).unwrap();

    let again = h.wallet.sync_with_chain(false).unwrap();
    assert_eq!(again.blocks_scanned, 0);
    assert!(again.confirmed.is_empty());
    assert_eq!(h.wallet.list_mints(true).unwrap().len(), 1);
}

#[test]
fn list_confirmed_versus_all() {
    let h = harness(20);
    let (i1, c1) = h.wallet.generate_next_mint(COIN, false).unwrap();
    h.wallet.generate_next_mint(COIN, false).unwrap();

    let output = h.wallet.mint_output(i1, &c1).unwrap();
    h.ledger.push_block(vec![Transaction::mint(output)]);
    h.wallet.sync_with_chain(false).unwrap();

    assert_eq!(h.wallet.list_mints(false).unwrap().len(), 2);
    let confirmed = h.wallet.list_mints(true).unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].index, i1);
    assert_eq!(confirmed[0].confirmed_height, Some(1));

    // Confirmed mint left the pool, the unseen allocation did not
    assert!(!h.wallet.is_in_pool(&identity(&master(1), 1)).unwrap());
    assert!(h.wallet.is_in_pool(&identity(&master(1), 2)).unwrap());
}

#[test]
fn unknown_serial_is_not_found() {
    let h = harness(5);
    h.ledger.push_block(vec![mint_tx(&master(1), 1, COIN)]);
    h.wallet.sync_with_chain(false).unwrap();

    assert!(h.wallet.get_mint(&serial(&master(1), 1)).unwrap().is_some());
    assert!(h.wallet.get_mint(&SerialHash([0x42; 32])).unwrap().is_none());
}

#[test]
fn foreign_and_malformed_outputs_are_ignored() {
    let h = harness(5);
    let truncated = TxOutput {
        value: COIN,
        script: vec![MINT_TAG, 1, 2, 3],
    };
    let plain = TxOutput {
        value: COIN,
        script: vec![0x76, 0xa9],
    };
    h.ledger.push_block(vec![
        mint_tx(&master(9), 1, COIN),
        Transaction::new(vec![truncated, plain], Vec::new()),
    ]);

    let report = h.wallet.sync_with_chain(false).unwrap();
    assert!(report.confirmed.is_empty());
    assert!(h.wallet.list_mints(false).unwrap().is_empty());
    assert_eq!(h.wallet.pool_entries().unwrap().len(), 5);
}

#[test]
fn identity_with_wrong_commitment_is_ignored() {
    let h = harness(5);
    let other = coin(&master(9), 1, COIN).public_coin();
    let script = MintScript::new(other, identity(&master(1), 3)).to_bytes();
    h.ledger.push_block(vec![Transaction::mint(TxOutput {
        value: COIN,
        script,
    })]);

    let report = h.wallet.sync_with_chain(false).unwrap();
    assert!(report.confirmed.is_empty());
    assert!(h.wallet.is_in_pool(&identity(&master(1), 3)).unwrap());
}

#[test]
fn mint_with_unusable_value_is_ignored() {
    let h = harness(5);
    let mint = |index: u32, value: u64| {
        let script =
            MintScript::new(coin(&master(1), index, COIN).public_coin(), identity(&master(1), index));
        Transaction::mint(TxOutput {
            value,
            script: script.to_bytes(),
        })
    };
    h.ledger.push_block(vec![mint(3, 0), mint(4, MAX_MINT_AMOUNT + 1)]);

    let report = h.wallet.sync_with_chain(false).unwrap();
    assert!(report.confirmed.is_empty());
    assert!(h.wallet.list_mints(false).unwrap().is_empty());
    assert!(h.wallet.is_in_pool(&identity(&master(1), 3)).unwrap());
    assert!(h.wallet.is_in_pool(&identity(&master(1), 4)).unwrap());

    // A later valid output for the same index still confirms it
    h.ledger.push_block(vec![mint(3, 2 * COIN)]);
    let report = h.wallet.sync_with_chain(false).unwrap();
    assert_eq!(report.confirmed, vec![3]);
    let record = h.wallet.get_mint(&serial(&master(1), 3)).unwrap().unwrap();
    assert_eq!(record.amount, 2 * COIN);
    assert_eq!(h.wallet.regenerate(3, record.amount).unwrap().amount().as_u64(), 2 * COIN);
}

#[test]
fn serial_already_on_ledger_is_rejected() {
    let h = harness(20);
    // Serial of index 3 revealed before its mint appears
    h.ledger.push_block(vec![Transaction::spend(serial(&master(1), 3))]);
    h.ledger.push_block(vec![mint_tx(&master(1), 3, COIN)]);

    let err = h.wallet.sync_with_chain(false).unwrap_err();
    assert!(matches!(err, WalletError::SerialCollision { index: 3, .. }));

    // Nothing from the offending block was committed
    assert!(h.wallet.is_in_pool(&identity(&master(1), 3)).unwrap());
    assert!(h.wallet.list_mints(false).unwrap().is_empty());
    assert_eq!(h.wallet.state().unwrap().last_used, 0);
    assert_eq!(h.store.last_processed().unwrap().map(|(height, _)| height), Some(1));
}

#[test]
fn serial_held_by_another_record_is_rejected() {
    let h = harness(20);
    let derived = seed::derive(&master(1), 4);
    let entry = builder::pool_entry(&derived).unwrap();
    let mut impostor = MintRecord::confirmed(&entry, COIN, 1);
    impostor.index = 99;
    impostor.identity = identity(&master(1), 99);
    h.store.put_mint_record(&impostor).unwrap();

    h.ledger.push_block(vec![mint_tx(&master(1), 4, COIN)]);
    let err = h.wallet.sync_with_chain(false).unwrap_err();
    assert!(matches!(err, WalletError::SerialCollision { index: 4, .. }));
    assert!(h.wallet.is_in_pool(&identity(&master(1), 4)).unwrap());
}

#[test]
fn later_spend_is_linked() {
    let h = harness(5);
    h.ledger.push_block(vec![mint_tx(&master(1), 1, COIN)]);
    h.wallet.sync_with_chain(false).unwrap();
    let serial_hash = serial(&master(1), 1);
    assert!(h.wallet.get_mint(&serial_hash).unwrap().unwrap().spend_txid.is_none());

    let spend = Transaction::spend(serial_hash);
    h.ledger.push_block(vec![spend.clone()]);
    let report = h.wallet.sync_with_chain(false).unwrap();
    assert_eq!(report.spends_linked, 1);

    let record = h.wallet.get_mint(&serial_hash).unwrap().unwrap();
    assert_eq!(record.spend_txid, Some(spend.txid));
    assert_eq!(record.confirmed_height, Some(1));
}

#[test]
fn spend_found_while_matching_is_linked_once() {
    let h = harness(5);
    let spend = Transaction::spend(serial(&master(1), 2));
    h.ledger.push_block(vec![mint_tx(&master(1), 2, COIN)]);
    h.ledger.push_block(vec![spend.clone()]);

    let report = h.wallet.sync_with_chain(false).unwrap();
    assert_eq!(report.confirmed, vec![2]);
    assert_eq!(report.spends_linked, 1);

    let record = h.wallet.get_mint(&serial(&master(1), 2)).unwrap().unwrap();
    assert_eq!(record.spend_txid, Some(spend.txid));
}

#[test]
fn mint_and_spend_in_one_block() {
    let h = harness(5);
    let spend = Transaction::spend(serial(&master(1), 1));
    h.ledger.push_block(vec![mint_tx(&master(1), 1, COIN), spend.clone()]);

    let report = h.wallet.sync_with_chain(false).unwrap();
    assert_eq!(report.spends_linked, 1);
    let record = h.wallet.get_mint(&serial(&master(1), 1)).unwrap().unwrap();
    assert_eq!(record.confirmed_height, Some(1));
    assert_eq!(record.spend_txid, Some(spend.txid));
}

#[test]
fn locked_wallet_scans_without_refilling() {
    let h = harness(5);
    h.wallet.lock().unwrap();

    h.ledger.push_block(vec![mint_tx(&master(1), 2, COIN)]);
    let report = h.wallet.sync_with_chain(false).unwrap();
    assert_eq!(report.confirmed, vec![2]);

    let record = h.wallet.get_mint(&serial(&master(1), 2)).unwrap().unwrap();
    assert_eq!(record.confirmed_height, Some(1));
    assert_eq!(h.wallet.pool_entries().unwrap().len(), 4);

    h.wallet.unlock(master(1)).unwrap();
    // Index 2 is confirmed, so the window is already complete
    assert_eq!(h.wallet.refill_pool().unwrap(), 0);
    assert_eq!(h.wallet.pool_entries().unwrap().len(), 4);
}

#[test]
fn normal_sync_only_watches_the_window() {
    let h = harness(20);
    h.ledger.push_block(vec![mint_tx(&master(1), 5, COIN)]);
    h.ledger.push_block(vec![mint_tx(&master(1), 23, COIN)]);

    let report = h.wallet.sync_with_chain(false).unwrap();
    assert_eq!(report.confirmed, vec![5]);
    assert_eq!(h.wallet.state().unwrap().last_used, 0);
    assert!(h.wallet.get_mint(&serial(&master(1), 23)).unwrap().is_none());
}

#[test]
fn full_resync_slides_the_window() {
    let h = harness(20);
    h.ledger.push_block(vec![mint_tx(&master(1), 5, COIN)]);
    h.ledger.push_block(vec![mint_tx(&master(1), 23, 4 * COIN)]);

    let report = h.wallet.sync_with_chain(true).unwrap();
    assert!(report.full_resync);
    assert_eq!(report.confirmed, vec![5, 23]);

    let state = h.wallet.state().unwrap();
    assert_eq!(state.last_used, 23);
    assert_eq!(state.last_generated, 43);
    assert_eq!(h.store.get_counter().unwrap(), 23);

    let record = h.wallet.get_mint(&serial(&master(1), 23)).unwrap().unwrap();
    assert_eq!(record.amount, 4 * COIN);
    assert_eq!(record.confirmed_height, Some(2));

    let (next, _) = h.wallet.generate_next_mint(COIN, false).unwrap();
    assert_eq!(next, 24);
}

#[test]
fn full_resync_is_repeatable() {
    let h = harness(10);
    h.ledger.push_block(vec![mint_tx(&master(1), 3, COIN)]);
    h.ledger.push_empty_blocks(3);

    let first = h.wallet.sync_with_chain(true).unwrap();
    let second = h.wallet.sync_with_chain(true).unwrap();
    assert_eq!(first.confirmed, second.confirmed);
    assert_eq!(second.blocks_scanned, 5);

    let confirmed = h.wallet.list_mints(true).unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].confirmed_height, Some(1));
    let expected = PublicCoin::from_seed(seed::derive(&master(1), 3).seed()).unwrap();
    assert_eq!(confirmed[0].public_coin, expected);
}
