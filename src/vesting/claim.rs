// The Merkle claim gate: current root, anti-double-claim registry, and the
// optional per-unit purchase terms of the purchasable variant.

use indexmap::IndexSet;
use primitive_types::{U256, U512};
use serde::{Deserialize, Serialize};

use crate::{
    config::{MAX_UNIT_COST, UNIT_SCALE},
    crypto::{Address, Hash},
    error::{VestingError, VestingResult},
};

/// Pricing of the purchasable claim variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseTerms {
    /// Native-currency cost per whole vested token unit, < 10^18
    pub unit_cost: U256,
    /// Recipient of collected payments, never zero
    pub payment_receiver: Address,
}

impl PurchaseTerms {
    pub fn validate(&self) -> VestingResult<()> {
        if self.unit_cost >= MAX_UNIT_COST {
            return Err(VestingError::InvalidAmount);
        }
        if self.payment_receiver.is_zero() {
            return Err(VestingError::InvalidAddress);
        }
        Ok(())
    }

    /// price = floor(unit_cost * amount / 10^18)
    ///
    /// The product can exceed 256 bits (amount up to 2^200, cost up to
    /// ~2^60), so it is taken in 512-bit space before the division brings it
    /// back under `amount`.
    pub fn price(&self, amount: U256) -> U256 {
        let wide = self.unit_cost.full_mul(amount) / U512::from(UNIT_SCALE);
        // unit_cost < UNIT_SCALE, so the quotient is below `amount`
        U256::try_from(wide).unwrap_or(U256::max_value())
    }
}

/// Gate state for Merkle-verified self-installation of schedules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleGate {
    root: Hash,
    /// Fingerprints already installed through the gate. Root rotation never
    /// clears this set.
    claimed: IndexSet<Hash>,
    purchase: Option<PurchaseTerms>,
}

impl MerkleGate {
    pub fn new(root: Hash, purchase: Option<PurchaseTerms>) -> Self {
        Self {
            root,
            claimed: IndexSet::new(),
            purchase,
        }
    }

    pub fn root(&self) -> Hash {
        self.root
    }

    /// Atomically replace the commitment. The claim registry is untouched:
    /// a tuple installed once stays uninstallable under every future root.
    pub fn set_root(&mut self, root: Hash) -> Hash {
        std::mem::replace(&mut self.root, root)
    }

    pub fn is_claimed(&self, fingerprint: &Hash) -> bool {
        self.claimed.contains(fingerprint)
    }

    /// Returns false if the fingerprint was already present
    pub fn record_claim(&mut self, fingerprint: Hash) -> bool {
        self.claimed.insert(fingerprint)
    }

    pub fn purchase(&self) -> Option<&PurchaseTerms> {
        self.purchase.as_ref()
    }

    pub fn set_unit_cost(&mut self, unit_cost: U256) -> VestingResult<U256> {
        let terms = self.purchase.as_mut().ok_or(VestingError::NotSupported)?;
        if unit_cost >= MAX_UNIT_COST {
            return Err(VestingError::InvalidAmount);
        }
        Ok(std::mem::replace(&mut terms.unit_cost, unit_cost))
    }

    pub fn set_payment_receiver(&mut self, receiver: Address) -> VestingResult<Address> {
        let terms = self.purchase.as_mut().ok_or(VestingError::NotSupported)?;
        if receiver.is_zero() {
            return Err(VestingError::InvalidAddress);
        }
        Ok(std::mem::replace(&mut terms.payment_receiver, receiver))
    }
}
