// Storage Collateral Scenario
//
// Le déploiement d'un contrat occupant 512 × 11 + 64 unités réserve
// exactement ce nombre d'unités × COLLATERAL_UNIT_IN_DRIP.

use super::harness::{genesis_address, TestLedger};
use crate::execution::{ExecutionError, ReceiptStatus};
use crate::types::{tokens, AccountError, Address, Drip, COLLATERAL_UNIT_IN_DRIP};
use serde_json::json;

const STORAGE_UNITS: u64 = 512 * 11 + 64;

#[test]
fn test_deploy_charges_exact_collateral() {
    let mut ledger = TestLedger::new();
    let addr = Address::from_bytes([0x50; 20]);

    ledger.send(ledger.tx(genesis_address()).to(addr).value(tokens(20)).build());
    assert_eq!(ledger.state.balance(&addr), tokens(20));

    let c0 = ledger.state.collateral().collateral_of(&addr);
    let balance = ledger.state.balance(&addr);
    let receipt = ledger.send(
        ledger
            .tx(addr)
            .storage_limit(STORAGE_UNITS)
            .deploy(STORAGE_UNITS)
            .build(),
    );
    assert!(receipt.is_success());
    let contract = receipt.contract_created.unwrap();
    let c1 = ledger.state.collateral().collateral_of(&addr);

    let expected = Drip::from(5_696u64) * Drip::from(976_562_500_000_000u64);
    assert_eq!(c1 - c0, expected);
    assert_eq!(receipt.collateral_charged, expected);
    assert_eq!(ledger.state.balance(&addr), balance - expected - receipt.fee_paid);

    // Visible par RPC, et le contrat ne porte pas de collatéral
    assert_eq!(
        ledger.rpc("cfx_getCollateralForStorage", addr),
        json!(format!("{:#x}", expected))
    );
    assert_eq!(ledger.state.collateral().collateral_of(&contract), Drip::zero());
}

#[test]
fn test_deploy_without_enough_balance_for_collateral() {
    let mut ledger = TestLedger::new();
    let addr = Address::from_bytes([0x51; 20]);

    // 5 tokens < 5696 unités × 1/1024 token
    ledger.send(ledger.tx(genesis_address()).to(addr).value(tokens(5)).build());
    let receipt = ledger.send(
        ledger
            .tx(addr)
            .storage_limit(STORAGE_UNITS)
            .deploy(STORAGE_UNITS)
            .build(),
    );

    assert_eq!(receipt.status, ReceiptStatus::Failed);
    assert!(matches!(
        receipt.error,
        Some(ExecutionError::Account(AccountError::InsufficientBalance { .. }))
    ));
    assert_eq!(ledger.state.collateral().collateral_of(&addr), Drip::zero());
    assert_eq!(ledger.state.balance(&addr), tokens(5) - receipt.fee_paid);
}

#[test]
fn test_collateral_accumulates_over_deployments() {
    let mut ledger = TestLedger::new();
    let addr = Address::from_bytes([0x52; 20]);
    ledger.send(ledger.tx(genesis_address()).to(addr).value(tokens(20)).build());

    for units in [64u64, 128] {
        let receipt = ledger.send(ledger.tx(addr).storage_limit(units).deploy(units).build());
        assert!(receipt.is_success());
    }

    assert_eq!(
        ledger.state.collateral().collateral_of(&addr),
        Drip::from(192u64) * Drip::from(COLLATERAL_UNIT_IN_DRIP)
    );
}
