// Executor - Application d'une transaction: gas, appel, annulation
use super::gas::{costs, BlockGasMeter, GasMeter};
use super::state::LedgerState;
use super::ExecutionError;
use crate::types::{
    AccountInfo, Address, BlockNumber, Drip, Hash, Transaction, TransactionCall,
    STAKING_CONTRACT_ADDRESS,
};
use tracing::{debug, info, warn};

// =============================================================================
// RECEIPTS
// =============================================================================

/// Issue d'une transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    /// Appliquée
    Success,
    /// Incluse, gas facturé, état annulé
    Failed,
    /// Rejetée sans frais (nonce, fonds pour le gas, bloc plein)
    NotExecuted,
}

/// Reçu d'exécution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: Hash,
    pub block_number: BlockNumber,
    pub status: ReceiptStatus,
    /// Gas effectivement consommé par l'appel
    pub gas_used: u64,
    /// Gas facturé (après remboursement plafonné)
    pub gas_charged: u64,
    /// Frais prélevés (gas_charged × gas_price)
    pub fee_paid: Drip,
    /// Intérêts versés par un retrait de staking
    pub interest_paid: Drip,
    /// Collatéral de stockage réservé
    pub collateral_charged: Drip,
    /// Adresse du contrat créé
    pub contract_created: Option<Address>,
    /// Erreur de rejet ou d'échec
    pub error: Option<ExecutionError>,
}

impl Receipt {
    fn not_executed(tx_hash: Hash, block_number: BlockNumber, error: ExecutionError) -> Self {
        Self {
            tx_hash,
            block_number,
            status: ReceiptStatus::NotExecuted,
            gas_used: 0,
            gas_charged: 0,
            fee_paid: Drip::zero(),
            interest_paid: Drip::zero(),
            collateral_charged: Drip::zero(),
            contract_created: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}

/// Effets d'un appel réussi
#[derive(Debug, Default)]
struct CallOutcome {
    interest_paid: Drip,
    collateral_charged: Drip,
    contract_created: Option<Address>,
}

// =============================================================================
// TRANSACTION EXECUTION
// =============================================================================

/// Exécuteur de transactions
pub struct TransactionExecutor;

impl TransactionExecutor {
    /// Exécute une transaction contre l'état, au bloc courant de l'état
    pub fn execute(state: &mut LedgerState, tx: &Transaction) -> Receipt {
        let tx_hash = tx.hash();
        let block_number = state.block_number();
        let sender = tx.sender();
        let mut sender_account = state.account(&sender);

        // Check nonce
        if tx.nonce() != sender_account.nonce {
            return Receipt::not_executed(
                tx_hash,
                block_number,
                ExecutionError::NonceMismatch {
                    expected: sender_account.nonce,
                    got: tx.nonce(),
                },
            );
        }

        // Check balance for gas + value
        let max_fee = tx.max_gas_fee();
        let required = match max_fee.checked_add(tx.value()) {
            Some(required) if required <= sender_account.balance => required,
            _ => {
                return Receipt::not_executed(
                    tx_hash,
                    block_number,
                    ExecutionError::NotEnoughCash {
                        required: max_fee.saturating_add(tx.value()),
                        available: sender_account.balance,
                    },
                );
            }
        };
        debug!(%sender, call = tx.call().name(), %required, "executing transaction");

        // Prélève le gas maximal et incrémente le nonce: acquis même en cas d'échec
        sender_account.balance -= max_fee;
        sender_account.nonce += 1;
        state.set_account(sender, sender_account);

        let mut touched = vec![sender];
        if let Some(receiver) = tx.receiver() {
            touched.push(receiver);
        }
        if let TransactionCall::DeployContract { .. } = tx.call() {
            touched.push(contract_address(&sender, tx.nonce()));
        }
        let checkpoint = state.checkpoint(&touched);
        let mut meter = GasMeter::new(tx.gas(), tx.gas_price());

        let (status, outcome, error) = match Self::execute_call(state, tx, &mut meter) {
            Ok(outcome) => (ReceiptStatus::Success, outcome, None),
            Err(e) => {
                warn!(%sender, call = tx.call().name(), error = %e, "transaction failed, state reverted");
                state.revert_to(checkpoint);
                (ReceiptStatus::Failed, CallOutcome::default(), Some(e))
            }
        };

        let settlement = meter.settle(status == ReceiptStatus::Success);
        let refund = max_fee - settlement.fee;
        if !refund.is_zero() {
            let mut account = state.account(&sender);
            // Rembourse au plus ce qui vient d'être prélevé: pas de dépassement
            account.balance = account.balance.saturating_add(refund);
            state.set_account(sender, account);
        }

        Receipt {
            tx_hash,
            block_number,
            status,
            gas_used: meter.used(),
            gas_charged: settlement.gas_charged,
            fee_paid: settlement.fee,
            interest_paid: outcome.interest_paid,
            collateral_charged: outcome.collateral_charged,
            contract_created: outcome.contract_created,
            error,
        }
    }

    fn execute_call(
        state: &mut LedgerState,
        tx: &Transaction,
        meter: &mut GasMeter,
    ) -> Result<CallOutcome, ExecutionError> {
        let call = tx.call();
        if call.is_staking_call() {
            if tx.receiver() != Some(STAKING_CONTRACT_ADDRESS) {
                return Err(ExecutionError::InvalidReceiver {
                    call: call.name(),
                    receiver: tx.receiver(),
                });
            }
            if !tx.value().is_zero() {
                return Err(ExecutionError::ValueNotAccepted);
            }
            meter.consume(costs::STAKING_CALL)?;
            meter.consume(costs::STAKING_RECORD_WRITE)?;
        }

        let sender = tx.sender();
        let block = state.block_number();

        match call {
            TransactionCall::Transfer => {
                let receiver = tx.receiver().ok_or(ExecutionError::InvalidReceiver {
                    call: call.name(),
                    receiver: None,
                })?;
                meter.consume(costs::TRANSFER)?;
                Self::execute_transfer(state, sender, receiver, tx.value())?;
                Ok(CallOutcome::default())
            }

            TransactionCall::StakingDeposit { amount } => {
                let mut account = state.account(&sender);
                account.debit(*amount)?;
                state.staking_mut().apply_deposit(sender, *amount, block)?;
                state.set_account(sender, account);
                Ok(CallOutcome::default())
            }

            TransactionCall::StakingWithdraw { amount } => {
                let (_, interest) = state.staking_mut().apply_withdraw(sender, *amount, block)?;
                let mut account = state.account(&sender);
                account.credit(
                    amount
                        .checked_add(interest)
                        .ok_or(crate::staking::StakingError::ArithmeticOverflow)?,
                )?;
                state.set_account(sender, account);
                Ok(CallOutcome {
                    interest_paid: interest,
                    ..CallOutcome::default()
                })
            }

            TransactionCall::VoteLock {
                amount,
                unlock_block,
            } => {
                state
                    .staking_mut()
                    .apply_vote_lock(sender, *amount, *unlock_block, block)?;
                Ok(CallOutcome::default())
            }

            TransactionCall::DeployContract { storage_units } => {
                if tx.receiver().is_some() {
                    return Err(ExecutionError::InvalidReceiver {
                        call: call.name(),
                        receiver: tx.receiver(),
                    });
                }
                if *storage_units > tx.storage_limit() {
                    return Err(ExecutionError::ExceedsStorageLimit {
                        units: *storage_units,
                        limit: tx.storage_limit(),
                    });
                }
                meter.consume_deployment(*storage_units)?;

                let contract = contract_address(&sender, tx.nonce());
                let collateral = state.collateral().collateral_for(*storage_units)?;

                let mut account = state.account(&sender);
                account.debit(collateral)?;
                account.debit(tx.value())?;
                state.set_account(sender, account);
                state.collateral_mut().charge_for_storage(sender, *storage_units)?;
                Self::execute_transfer_in(state, contract, tx.value())?;

                info!(%sender, %contract, storage_units, %collateral, "contract deployed");
                Ok(CallOutcome {
                    collateral_charged: collateral,
                    contract_created: Some(contract),
                    ..CallOutcome::default()
                })
            }
        }
    }

    fn execute_transfer(
        state: &mut LedgerState,
        sender: Address,
        receiver: Address,
        amount: Drip,
    ) -> Result<(), ExecutionError> {
        let mut from = state.account(&sender);
        from.debit(amount)?;
        state.set_account(sender, from);
        Self::execute_transfer_in(state, receiver, amount)
    }

    fn execute_transfer_in(
        state: &mut LedgerState,
        receiver: Address,
        amount: Drip,
    ) -> Result<(), ExecutionError> {
        let mut to: AccountInfo = state.account(&receiver);
        to.credit(amount)?;
        state.set_account(receiver, to);
        Ok(())
    }
}

/// Adresse d'un contrat créé: 20 premiers octets de blake3(sender || nonce)
pub fn contract_address(sender: &Address, nonce: u64) -> Address {
    let mut data = Vec::with_capacity(28);
    data.extend_from_slice(sender.as_bytes());
    data.extend_from_slice(&nonce.to_le_bytes());
    let hash = Hash::hash(&data);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash.as_bytes()[..20]);
    // Préfixe des adresses de contrat
    bytes[0] = (bytes[0] & 0x0f) | 0x80;
    Address::from_bytes(bytes)
}

// =============================================================================
// BLOCK APPLICATION
// =============================================================================

/// Applique les transactions d'un bloc dans l'ordre donné
pub fn apply_block(
    state: &mut LedgerState,
    height: BlockNumber,
    transactions: &[Transaction],
) -> Result<Vec<Receipt>, ExecutionError> {
    state.begin_block(height)?;
    let mut block_gas = BlockGasMeter::new(state.config().block_gas_limit);
    let mut receipts = Vec::with_capacity(transactions.len());

    for tx in transactions {
        if !block_gas.can_fit_transaction(tx.gas()) {
            receipts.push(Receipt::not_executed(
                tx.hash(),
                height,
                ExecutionError::BlockGasLimitReached {
                    requested: tx.gas(),
                    remaining: block_gas.remaining(),
                },
            ));
            continue;
        }

        let receipt = TransactionExecutor::execute(state, tx);
        block_gas.record_transaction(receipt.gas_charged)?;
        receipts.push(receipt);
    }

    let succeeded = receipts.iter().filter(|r| r.is_success()).count();
    info!(height, txs = receipts.len(), succeeded, "block applied");
    Ok(receipts)
}
