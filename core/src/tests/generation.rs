use std::sync::Arc;

use hdmint_coin::{COIN, CoinError, MintScript};

use super::{coin, config, harness, identity, init_logger, master, mint_tx};
use crate::error::WalletError;
use crate::hdmint::HdMintWallet;
use crate::ledger::MemoryLedger;
use crate::storage::{MemoryStore, MintStore};

#[test]
fn allocations_are_sequential_and_persisted() {
    let h = harness(20);

    let (i1, c1) = h.wallet.generate_next_mint(COIN, false).unwrap();
    let (i2, _) = h.wallet.generate_next_mint(2 * COIN, false).unwrap();
    let (i3, _) = h.wallet.generate_next_mint(COIN, false).unwrap();
    assert_eq!((i1, i2, i3), (1, 2, 3));

    assert_eq!(h.store.get_counter().unwrap(), 3);
    assert_eq!(h.wallet.state().unwrap().last_used, 3);

    // Allocated but not yet on chain
    assert_eq!(h.wallet.list_mints(false).unwrap().len(), 3);
    assert!(h.wallet.list_mints(true).unwrap().is_empty());

    let record = h.wallet.get_mint(&c1.serial_hash()).unwrap().unwrap();
    assert_eq!(record.index, 1);
    assert_eq!(record.amount, COIN);
    assert_eq!(record.public_coin, c1.public_coin());
    assert!(record.confirmed_height.is_none());
}

#[test]
fn generate_only_does_not_allocate() {
    let h = harness(20);

    let (a, coin_a) = h.wallet.generate_next_mint(COIN, true).unwrap();
    let (b, coin_b) = h.wallet.generate_next_mint(COIN, true).unwrap();
    assert_eq!(a, 1);
    assert_eq!(b, 1);
    assert_eq!(coin_a, coin_b);
    assert_eq!(h.wallet.state().unwrap().last_used, 0);
    assert!(h.wallet.list_mints(false).unwrap().is_empty());

    let (c, coin_c) = h.wallet.generate_next_mint(COIN, false).unwrap();
    assert_eq!(c, 1);
    assert_eq!(coin_c, coin_a);
}

#[test]
fn same_seed_gives_same_coins() {
    let h1 = harness(5);
    let h2 = harness(5);

    for _ in 0..3 {
        let (i1, c1) = h1.wallet.generate_next_mint(COIN, false).unwrap();
        let (i2, c2) = h2.wallet.generate_next_mint(COIN, false).unwrap();
        assert_eq!(i1, i2);
        assert_eq!(c1, c2);
    }
}

#[test]
fn restart_never_reuses_an_index() {
    init_logger();
    let store = Arc::new(MemoryStore::new());
    let ledger = Arc::new(MemoryLedger::new());

    let first = HdMintWallet::open(store.clone(), ledger.clone(), config(20), Some(master(1))).unwrap();
    first.generate_next_mint(COIN, false).unwrap();
    let (_, before) = first.generate_next_mint(COIN, false).unwrap();
    drop(first);

    let second = HdMintWallet::open(store.clone(), ledger, config(20), Some(master(1))).unwrap();
    assert_eq!(second.state().unwrap().last_used, 2);

    let (index, after) = second.generate_next_mint(COIN, false).unwrap();
    assert_eq!(index, 3);
    assert_ne!(after.serial_hash(), before.serial_hash());
}

#[test]
fn indices_seen_on_chain_are_skipped() {
    let h = harness(20);
    h.ledger.push_block(vec![mint_tx(&master(1), 1, COIN)]);
    h.ledger.push_block(vec![mint_tx(&master(1), 2, COIN)]);
    h.wallet.sync_with_chain(false).unwrap();

    let (index, _) = h.wallet.generate_next_mint(COIN, false).unwrap();
    assert_eq!(index, 3);
    assert_eq!(h.wallet.state().unwrap().last_used, 3);

    // Generate-only skips them too
    let (peek, _) = h.wallet.generate_next_mint(COIN, true).unwrap();
    assert_eq!(peek, 4);
}

#[test]
fn window_stays_full_after_allocations() {
    let h = harness(20);
    for _ in 0..5 {
        h.wallet.generate_next_mint(COIN, false).unwrap();
    }

    let state = h.wallet.state().unwrap();
    assert_eq!(state.last_used, 5);
    assert_eq!(state.last_generated, 25);

    let indices: Vec<u32> = h
        .wallet
        .pool_entries()
        .unwrap()
        .iter()
        .map(|e| e.index)
        .collect();
    // Allocated mints stay watched until they are seen on chain
    assert_eq!(indices, (1..=25).collect::<Vec<_>>());
    assert_eq!(h.store.load_pool().unwrap().len(), 25);
}

#[test]
fn invalid_amount_allocates_nothing() {
    let h = harness(20);

    let err = h.wallet.generate_next_mint(0, false).unwrap_err();
    assert!(matches!(
        err,
        WalletError::Derivation(CoinError::InvalidAmount(0))
    ));
    assert_eq!(h.wallet.state().unwrap().last_used, 0);
    assert_eq!(h.store.get_counter().unwrap(), 0);
}

#[test]
fn counter_overflow_is_reported() {
    init_logger();
    let store = Arc::new(MemoryStore::new());
    store.set_counter(u32::MAX - 1).unwrap();
    let wallet = HdMintWallet::open(
        store.clone(),
        Arc::new(MemoryLedger::new()),
        config(20),
        Some(master(1)),
    )
    .unwrap();

    let (last, _) = wallet.generate_next_mint(COIN, false).unwrap();
    assert_eq!(last, u32::MAX);

    let err = wallet.generate_next_mint(COIN, false).unwrap_err();
    assert!(matches!(err, WalletError::IndexOverflow(u32::MAX)));
    assert_eq!(store.get_counter().unwrap(), u32::MAX);
}

#[test]
fn locked_wallet_refuses_derivation() {
    let h = harness(20);
    h.wallet.generate_next_mint(COIN, false).unwrap();
    h.wallet.lock().unwrap();
    assert!(h.wallet.is_locked().unwrap());

    assert!(matches!(
        h.wallet.generate_next_mint(COIN, false),
        Err(WalletError::Locked)
    ));
    assert!(matches!(h.wallet.refill_pool(), Err(WalletError::Locked)));
    assert!(matches!(h.wallet.regenerate(1, COIN), Err(WalletError::Locked)));
    assert!(matches!(
        h.wallet.sync_with_chain(true),
        Err(WalletError::Locked)
    ));

    assert!(matches!(
        h.wallet.unlock(master(2)),
        Err(WalletError::SeedMismatch)
    ));
    assert!(h.wallet.is_locked().unwrap());

    h.wallet.unlock(master(1)).unwrap();
    let (index, _) = h.wallet.generate_next_mint(COIN, false).unwrap();
    assert_eq!(index, 2);
}

#[test]
fn new_seed_starts_a_new_lineage() {
    let h = harness(5);
    h.wallet.generate_next_mint(COIN, false).unwrap();
    h.wallet.generate_next_mint(COIN, false).unwrap();

    h.wallet.set_seed(master(2), true).unwrap();
    assert_eq!(h.wallet.state().unwrap().last_used, 0);
    assert!(h.wallet.is_in_pool(&identity(&master(2), 1)).unwrap());
    assert!(!h.wallet.is_in_pool(&identity(&master(1), 3)).unwrap());
    assert_eq!(h.store.load_pool().unwrap().len(), 5);

    let (index, coin_new) = h.wallet.generate_next_mint(COIN, false).unwrap();
    assert_eq!(index, 1);
    assert_eq!(coin_new, coin(&master(2), 1, COIN));

    // Old seed no longer unlocks
    h.wallet.lock().unwrap();
    assert!(matches!(
        h.wallet.unlock(master(1)),
        Err(WalletError::SeedMismatch)
    ));
}

#[test]
fn same_seed_counter_reset_is_refused() {
    let h = harness(5);
    h.wallet.generate_next_mint(COIN, false).unwrap();

    let err = h.wallet.set_seed(master(1), true).unwrap_err();
    assert!(matches!(
        err,
        WalletError::CounterRegression {
            current: 1,
            requested: 0
        }
    ));

    h.wallet.set_seed(master(1), false).unwrap();
    assert_eq!(h.wallet.state().unwrap().last_used, 1);
}

#[test]
fn mint_output_carries_identity() {
    let h = harness(5);
    let (index, minted) = h.wallet.generate_next_mint(3 * COIN, false).unwrap();

    let output = h.wallet.mint_output(index, &minted).unwrap();
    assert_eq!(output.value, 3 * COIN);

    let script = MintScript::parse(&output.script).unwrap();
    assert_eq!(script.identity, identity(&master(1), index));
    assert_eq!(script.public_coin, minted.public_coin());

    assert!(matches!(
        h.wallet.mint_output(index + 1, &minted),
        Err(WalletError::RegenerationMismatch { .. })
    ));
}
