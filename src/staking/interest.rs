// Interest - Table des taux d'intérêt accumulés (virgule fixe 2^80)
//
// Toute l'arithmétique est entière. Les produits intermédiaires passent par
// U512 pour ne jamais perdre de bits avant la division.
use super::StakingError;
use crate::types::{BlockNumber, Drip};
use primitive_types::{U256, U512};
use serde::{Deserialize, Serialize};

/// Nombre de blocs d'une année (2 blocs/seconde)
pub const BLOCKS_PER_YEAR: u64 = 2 * 60 * 60 * 24 * 365;

/// Longueur de table utilisée en production
pub const DEFAULT_TABLE_LEN: usize = 1001;

/// Hauteur maximale couverte par défaut: dix ans de blocs
pub const DEFAULT_MAX_HEIGHT: BlockNumber = 10 * BLOCKS_PER_YEAR;

/// Un taux est conservé tous les `CHECKPOINT_INTERVAL` blocs
pub const CHECKPOINT_INTERVAL: BlockNumber = 256;

/// Dénominateur de virgule fixe: 2^80
pub const FIXED_POINT_SHIFT: usize = 80;

/// Numérateur du taux annuel (4% = 40000 / 1_000_000)
pub const ANNUAL_RATE_PPM: u64 = 40_000;

const PPM: u64 = 1_000_000;

/// Table des taux accumulés, indexée par hauteur de bloc.
///
/// `rate(0) = 2^80 × epoch_blocks` et chaque taux dérive du précédent par
/// `rate(h) × (40000 + 10^6 × epoch_blocks) / (epoch_blocks × 10^6)`.
///
/// Seul un taux sur `CHECKPOINT_INTERVAL` est gardé en mémoire. Un taux
/// intermédiaire est recalculé depuis le checkpoint qui le précède, ce qui
/// donne exactement la valeur de la récurrence complète. La hauteur couverte
/// ne fait que croître et reste bornée par `max_height`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestRateTable {
    epoch_blocks: u64,
    max_height: BlockNumber,
    covered: BlockNumber,
    /// `checkpoints[i]` = taux à la hauteur `i × CHECKPOINT_INTERVAL`
    checkpoints: Vec<U256>,
}

impl InterestRateTable {
    /// Table couvrant les hauteurs `0..len`
    pub fn compute(epoch_blocks: u64, len: usize) -> Result<Self, StakingError> {
        Self::with_max_height(epoch_blocks, len, DEFAULT_MAX_HEIGHT)
    }

    /// Table couvrant `0..len`, jamais allongée au-delà de `max_height`
    pub fn with_max_height(
        epoch_blocks: u64,
        len: usize,
        max_height: BlockNumber,
    ) -> Result<Self, StakingError> {
        if epoch_blocks == 0 || len == 0 {
            return Err(StakingError::InvalidInterestConfig);
        }

        let base = (U256::one() << FIXED_POINT_SHIFT)
            .checked_mul(U256::from(epoch_blocks))
            .ok_or(StakingError::ArithmeticOverflow)?;

        let mut table = Self {
            epoch_blocks,
            max_height,
            covered: 0,
            checkpoints: vec![base],
        };
        table.extend_to((len - 1) as BlockNumber)?;
        Ok(table)
    }

    /// Table de production
    pub fn production() -> Result<Self, StakingError> {
        Self::compute(BLOCKS_PER_YEAR, DEFAULT_TABLE_LEN)
    }

    pub fn epoch_blocks(&self) -> u64 {
        self.epoch_blocks
    }

    pub fn max_height(&self) -> BlockNumber {
        self.max_height
    }

    /// Plus haute hauteur indexable
    pub fn covered_height(&self) -> BlockNumber {
        self.covered
    }

    /// Nombre de hauteurs indexables
    pub fn len(&self) -> u64 {
        self.covered + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Nombre de taux gardés en mémoire
    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints.len()
    }

    /// Structure cohérente (relue depuis le stockage)
    pub fn is_consistent(&self) -> bool {
        self.epoch_blocks > 0
            && self.covered <= self.max_height
            && self.checkpoints.len() as u64 == self.covered / CHECKPOINT_INTERVAL + 1
    }

    /// Allonge la table pour que `height` soit indexable
    pub fn extend_to(&mut self, height: BlockNumber) -> Result<(), StakingError> {
        if height <= self.covered {
            return Ok(());
        }
        if height > self.max_height {
            return Err(StakingError::BlockBeyondInterestTable {
                block: height,
                covered: self.max_height,
            });
        }

        let wanted = height / CHECKPOINT_INTERVAL + 1;
        while (self.checkpoints.len() as u64) < wanted {
            let last = self.last_checkpoint();
            let next = self.advance(last, CHECKPOINT_INTERVAL)?;
            self.checkpoints.push(next);
        }
        self.covered = height;

        tracing::debug!(
            covered = self.covered,
            checkpoints = self.checkpoints.len(),
            "interest table extended"
        );
        Ok(())
    }

    /// Taux accumulé à la hauteur `block`
    pub fn rate_at(&self, block: BlockNumber) -> Result<U256, StakingError> {
        if block > self.covered {
            return Err(StakingError::BlockBeyondInterestTable {
                block,
                covered: self.covered,
            });
        }
        let index = (block / CHECKPOINT_INTERVAL) as usize;
        let from = self
            .checkpoints
            .get(index)
            .copied()
            .ok_or(StakingError::BlockBeyondInterestTable {
                block,
                covered: self.covered,
            })?;
        self.advance(from, block % CHECKPOINT_INTERVAL)
    }

    /// Intérêt d'un capital déposé à `deposit_block` et retiré à `withdraw_block`:
    /// `capital × rate[w] / rate[d] − capital`, division tronquée.
    ///
    /// Vaut 0 quand les deux hauteurs coïncident. Sur de courts intervalles
    /// l'intérêt reste faible mais n'est pas nul.
    pub fn interest(
        &self,
        capital: Drip,
        deposit_block: BlockNumber,
        withdraw_block: BlockNumber,
    ) -> Result<Drip, StakingError> {
        let at_deposit = self.rate_at(deposit_block)?;
        let at_withdraw = self.rate_at(withdraw_block)?;

        let grown = narrow(capital.full_mul(at_withdraw) / U512::from(at_deposit))?;
        grown
            .checked_sub(capital)
            .ok_or(StakingError::ArithmeticOverflow)
    }

    fn last_checkpoint(&self) -> U256 {
        // jamais vide: le taux de base est posé à la construction
        self.checkpoints.last().copied().unwrap_or_default()
    }

    /// Applique `steps` fois la récurrence à partir de `rate`
    fn advance(&self, mut rate: U256, steps: BlockNumber) -> Result<U256, StakingError> {
        let numerator =
            U256::from(ANNUAL_RATE_PPM) + U256::from(PPM) * U256::from(self.epoch_blocks);
        let denominator = U512::from(self.epoch_blocks) * U512::from(PPM);
        for _ in 0..steps {
            rate = narrow(rate.full_mul(numerator) / denominator)?;
        }
        Ok(rate)
    }
}

/// Ramène un U512 sur 256 bits, ou échoue
fn narrow(value: U512) -> Result<U256, StakingError> {
    U256::try_from(value).map_err(|_| StakingError::ArithmeticOverflow)
}
