// Transaction - Transactions consommées par le ledger
use super::account::{Address, STAKING_CONTRACT_ADDRESS};
use super::primitives::{BlockNumber, Drip, Hash, Nonce};
use serde::{Deserialize, Serialize};

/// Gas par défaut d'un appel de contrat
pub const CONTRACT_DEFAULT_GAS: u64 = 3_000_000;

/// Transaction appliquée au ledger.
///
/// Forme fixe et immuable: construite uniquement via `TransactionBuilder`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    sender: Address,
    nonce: Nonce,
    receiver: Option<Address>,
    value: Drip,
    gas: u64,
    gas_price: u64,
    storage_limit: u64,
    call: TransactionCall,
}

impl Transaction {
    pub fn builder(sender: Address) -> TransactionBuilder {
        TransactionBuilder::new(sender)
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn nonce(&self) -> Nonce {
        self.nonce
    }

    pub fn receiver(&self) -> Option<Address> {
        self.receiver
    }

    pub fn value(&self) -> Drip {
        self.value
    }

    pub fn gas(&self) -> u64 {
        self.gas
    }

    pub fn gas_price(&self) -> u64 {
        self.gas_price
    }

    pub fn storage_limit(&self) -> u64 {
        self.storage_limit
    }

    pub fn call(&self) -> &TransactionCall {
        &self.call
    }

    /// Coût maximal du gas (gas × gas_price)
    pub fn max_gas_fee(&self) -> Drip {
        Drip::from(self.gas) * Drip::from(self.gas_price)
    }

    /// Hash de la transaction: blake3 de l'encodage canonique, séparé par domaine
    pub fn hash(&self) -> Hash {
        Hash::hash(&self.canonical_bytes())
    }

    /// Encodage canonique: champs à taille fixe, montants en big-endian
    /// sur 32 octets, destinataire et appel préfixés par un tag.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(160);
        out.extend_from_slice(DOMAIN_TRANSACTION);
        out.extend_from_slice(self.sender.as_bytes());
        out.extend_from_slice(&self.nonce.to_be_bytes());
        match self.receiver {
            Some(receiver) => {
                out.push(1);
                out.extend_from_slice(receiver.as_bytes());
            }
            None => out.push(0),
        }
        push_drip(&mut out, self.value);
        out.extend_from_slice(&self.gas.to_be_bytes());
        out.extend_from_slice(&self.gas_price.to_be_bytes());
        out.extend_from_slice(&self.storage_limit.to_be_bytes());
        self.call.encode_into(&mut out);
        out
    }
}

const DOMAIN_TRANSACTION: &[u8] = b"staking-ledger/tx/v1";

fn push_drip(out: &mut Vec<u8>, amount: Drip) {
    let mut bytes = [0u8; 32];
    amount.to_big_endian(&mut bytes);
    out.extend_from_slice(&bytes);
}

/// Données décodées de la transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransactionCall {
    /// Transfert simple de `value` vers `receiver`
    Transfer,

    /// Staking - dépôt depuis la balance libre
    #[serde(rename_all = "camelCase")]
    StakingDeposit { amount: Drip },

    /// Staking - retrait (capital + intérêts)
    #[serde(rename_all = "camelCase")]
    StakingWithdraw { amount: Drip },

    /// Verrouille une partie du staking jusqu'à `unlock_block`
    #[serde(rename_all = "camelCase")]
    VoteLock { amount: Drip, unlock_block: BlockNumber },

    /// Déploiement de contrat occupant `storage_units` unités de stockage
    #[serde(rename_all = "camelCase")]
    DeployContract { storage_units: u64 },
}

impl TransactionCall {
    /// Appel adressé au contrat interne de staking?
    pub fn is_staking_call(&self) -> bool {
        matches!(
            self,
            TransactionCall::StakingDeposit { .. }
                | TransactionCall::StakingWithdraw { .. }
                | TransactionCall::VoteLock { .. }
        )
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            TransactionCall::Transfer => out.push(0),
            TransactionCall::StakingDeposit { amount } => {
                out.push(1);
                push_drip(out, *amount);
            }
            TransactionCall::StakingWithdraw { amount } => {
                out.push(2);
                push_drip(out, *amount);
            }
            TransactionCall::VoteLock {
                amount,
                unlock_block,
            } => {
                out.push(3);
                push_drip(out, *amount);
                out.extend_from_slice(&unlock_block.to_be_bytes());
            }
            TransactionCall::DeployContract { storage_units } => {
                out.push(4);
                out.extend_from_slice(&storage_units.to_be_bytes());
            }
        }
    }

    /// Nom court pour les logs
    pub fn name(&self) -> &'static str {
        match self {
            TransactionCall::Transfer => "transfer",
            TransactionCall::StakingDeposit { .. } => "deposit",
            TransactionCall::StakingWithdraw { .. } => "withdraw",
            TransactionCall::VoteLock { .. } => "voteLock",
            TransactionCall::DeployContract { .. } => "deploy",
        }
    }
}

/// Constructeur de transaction avec options nommées
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    sender: Address,
    nonce: Nonce,
    receiver: Option<Address>,
    value: Drip,
    gas: u64,
    gas_price: u64,
    storage_limit: u64,
    call: TransactionCall,
}

impl TransactionBuilder {
    pub fn new(sender: Address) -> Self {
        Self {
            sender,
            nonce: 0,
            receiver: None,
            value: Drip::zero(),
            gas: CONTRACT_DEFAULT_GAS,
            gas_price: 1,
            storage_limit: 0,
            call: TransactionCall::Transfer,
        }
    }

    pub fn nonce(mut self, nonce: Nonce) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn to(mut self, receiver: Address) -> Self {
        self.receiver = Some(receiver);
        self
    }

    pub fn value(mut self, value: Drip) -> Self {
        self.value = value;
        self
    }

    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = gas;
        self
    }

    pub fn gas_price(mut self, gas_price: u64) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn storage_limit(mut self, storage_limit: u64) -> Self {
        self.storage_limit = storage_limit;
        self
    }

    /// Définit l'appel. Les appels de staking ciblent toujours le contrat interne.
    pub fn call(mut self, call: TransactionCall) -> Self {
        if call.is_staking_call() {
            self.receiver = Some(STAKING_CONTRACT_ADDRESS);
        }
        self.call = call;
        self
    }

    pub fn deposit(self, amount: Drip) -> Self {
        self.call(TransactionCall::StakingDeposit { amount })
    }

    pub fn withdraw(self, amount: Drip) -> Self {
        self.call(TransactionCall::StakingWithdraw { amount })
    }

    pub fn vote_lock(self, amount: Drip, unlock_block: BlockNumber) -> Self {
        self.call(TransactionCall::VoteLock { amount, unlock_block })
    }

    pub fn deploy(self, storage_units: u64) -> Self {
        self.call(TransactionCall::DeployContract { storage_units })
    }

    pub fn build(self) -> Transaction {
        Transaction {
            sender: self.sender,
            nonce: self.nonce,
            receiver: self.receiver,
            value: self.value,
            gas: self.gas,
            gas_price: self.gas_price,
            storage_limit: self.storage_limit,
            call: self.call,
        }
    }
}
