// The vesting state machine.
//
// Every public operation is atomic: state lives in plain-data structures
// (EngineState), each entry point runs against a snapshot-guarded
// transaction, and the at-most-one outbound token transfer plus at-most-one
// native transfer happen only after all state mutation. A failure anywhere,
// including in an outbound transfer, restores the pre-operation state and
// discards buffered events.
//
// Value-moving entry points additionally run under a reentrancy flag spanning
// the whole operation including the outbound call.

use log::{debug, warn};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{
    access::{AccessControl, AdminHandover, Role},
    config::VIRTUAL_TOKEN_DECIMALS,
    crypto::{merkle, Address, Hash},
    error::{VestingError, VestingResult},
    time::TimeProvider,
    token::{NativeSink, TokenAdapter},
};

use super::{
    claim::{MerkleGate, PurchaseTerms},
    events::EngineEvent,
    math,
    schedule::{fingerprint, leaf_hash, Schedule, ScheduleParams},
    store::ScheduleStore,
};

/// Claim-gate configuration. Present = the engine accepts Merkle claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    pub merkle_root: Hash,
    /// Present = claims cost native currency (the purchasable variant)
    pub purchase: Option<PurchaseTerms>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Virtual token name
    pub name: String,
    /// Virtual token symbol
    pub symbol: String,
    /// Initial administrator
    pub admin: Address,
    /// Initial grantee of the ScheduleCreator role
    pub vesting_creator: Address,
    pub gate: Option<GateConfig>,
}

/// The complete pure-data state of an engine instance. Cloneable for the
/// per-operation snapshot and serializable as the persisted-state layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    pub access: AccessControl,
    pub store: ScheduleStore,
    pub gate: Option<MerkleGate>,
}

pub struct VestingEngine {
    name: String,
    symbol: String,
    state: EngineState,
    token: Box<dyn TokenAdapter>,
    native: Option<Box<dyn NativeSink>>,
    clock: Box<dyn TimeProvider>,
    events: Vec<EngineEvent>,
    entered: bool,
}

impl VestingEngine {
    /// Bind the engine to its collaborators and validate the configuration.
    ///
    /// Fails with the decimals error unless the underlying token reports 18
    /// decimals. A gate with purchase terms requires a native sink.
    pub fn new(
        config: EngineConfig,
        token: Box<dyn TokenAdapter>,
        native: Option<Box<dyn NativeSink>>,
        clock: Box<dyn TimeProvider>,
    ) -> VestingResult<Self> {
        let found = token.decimals();
        if found != VIRTUAL_TOKEN_DECIMALS {
            return Err(VestingError::UnsupportedDecimals { found });
        }
        if config.admin.is_zero() || config.vesting_creator.is_zero() {
            return Err(VestingError::InvalidAddress);
        }

        let gate = match config.gate {
            Some(gate_config) => {
                if let Some(terms) = &gate_config.purchase {
                    terms.validate()?;
                    if native.is_none() {
                        return Err(VestingError::NotSupported);
                    }
                }
                Some(MerkleGate::new(gate_config.merkle_root, gate_config.purchase))
            }
            None => None,
        };

        Ok(Self {
            name: config.name,
            symbol: config.symbol,
            state: EngineState {
                access: AccessControl::new(config.admin, config.vesting_creator),
                store: ScheduleStore::new(),
                gate,
            },
            token,
            native,
            clock,
            events: Vec::new(),
            entered: false,
        })
    }

    // ========================================================================
    // Transaction plumbing
    // ========================================================================

    /// Run `f` atomically: on error the pure state and the event buffer are
    /// restored to their pre-operation snapshot.
    fn transact<T>(&mut self, f: impl FnOnce(&mut Self) -> VestingResult<T>) -> VestingResult<T> {
        let snapshot = self.state.clone();
        let mark = self.events.len();
        match f(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.state = snapshot;
                self.events.truncate(mark);
                Err(err)
            }
        }
    }

    /// `transact` under the reentrancy flag; used by every entry point that
    /// moves value out. The flag is cleared on all exit paths.
    fn guarded<T>(&mut self, f: impl FnOnce(&mut Self) -> VestingResult<T>) -> VestingResult<T> {
        if self.entered {
            return Err(VestingError::ReentrantCall);
        }
        self.entered = true;
        let result = self.transact(f);
        self.entered = false;
        result
    }

    // ========================================================================
    // Schedule lifecycle
    // ========================================================================

    /// Install a schedule for `beneficiary`. Caller must hold the
    /// ScheduleCreator role (Admin passes). Fails while paused.
    pub fn create(
        &mut self,
        caller: &Address,
        beneficiary: &Address,
        params: &ScheduleParams,
    ) -> VestingResult<Hash> {
        self.transact(|engine| {
            engine.state.access.require_not_paused()?;
            engine.state.access.require(Role::ScheduleCreator, caller)?;
            if beneficiary.is_zero() {
                return Err(VestingError::InvalidAddress);
            }
            engine.install_schedule(*beneficiary, params)
        })
    }

    /// Shared create path: range validation, solvency check, store insert,
    /// creation notifications. Used by both `create` and `claim`.
    fn install_schedule(
        &mut self,
        beneficiary: Address,
        params: &ScheduleParams,
    ) -> VestingResult<Hash> {
        params.validate(self.clock.now())?;

        let available = self.withdrawable()?;
        if params.amount > available {
            return Err(VestingError::InsufficientTokensInContract {
                requested: params.amount,
                available,
            });
        }

        let index = self.state.store.schedule_count(&beneficiary);
        let id = self.state.store.insert(beneficiary, params);

        self.events.push(EngineEvent::ScheduleCreated {
            id,
            beneficiary,
            index,
            start: params.start,
            cliff: params.start.saturating_add(params.cliff_offset),
            duration: params.duration,
            slice_seconds: params.slice_seconds,
            revokable: params.revokable,
            amount: params.amount,
        });
        self.events.push(EngineEvent::VirtualTransfer {
            from: Address::zero(),
            to: beneficiary,
            value: params.amount,
        });
        debug!(
            "created schedule {} for {} (index {}, amount {})",
            id, beneficiary, index, params.amount
        );

        Ok(id)
    }

    /// Pay out `amount` of the schedule's vested balance to its beneficiary.
    /// Callable by the beneficiary or an Admin.
    pub fn release(&mut self, caller: &Address, id: &Hash, amount: U256) -> VestingResult<()> {
        self.guarded(|engine| {
            let now = engine.clock.now();
            let schedule = engine
                .state
                .store
                .schedule(id)
                .ok_or(VestingError::InvalidSchedule)?;
            if schedule.is_revoked() {
                return Err(VestingError::ScheduleWasRevoked);
            }
            let beneficiary = schedule.beneficiary;
            if *caller != beneficiary && !engine.state.access.has_role(Role::Admin, caller) {
                return Err(VestingError::Unauthorized);
            }

            let releasable = math::releasable(schedule, now);
            if amount > releasable {
                return Err(VestingError::InsufficientReleasableTokens {
                    requested: amount,
                    releasable,
                });
            }

            engine.book_release(id, &beneficiary, amount);
            debug!("released {} from schedule {} to {}", amount, id, beneficiary);

            engine.transfer_out(&beneficiary, amount)?;
            Ok(())
        })
    }

    /// Release everything currently releasable across all of the
    /// beneficiary's schedules, in one outbound transfer. Returns the total
    /// paid out. Callable by the beneficiary or an Admin.
    pub fn release_all(&mut self, caller: &Address, beneficiary: &Address) -> VestingResult<U256> {
        self.guarded(|engine| {
            if caller != beneficiary && !engine.state.access.has_role(Role::Admin, caller) {
                return Err(VestingError::Unauthorized);
            }

            let now = engine.clock.now();
            let due_list: Vec<(Hash, U256)> = engine
                .state
                .store
                .schedules_of(beneficiary)
                .filter(|(_, schedule)| !schedule.is_revoked())
                .map(|(id, schedule)| (id, math::releasable(schedule, now)))
                .filter(|(_, due)| !due.is_zero())
                .collect();

            let mut total = U256::zero();
            for (id, due) in due_list {
                engine.book_release(&id, beneficiary, due);
                total = total.saturating_add(due);
            }

            if !total.is_zero() {
                debug!("released {} across schedules of {}", total, beneficiary);
                engine.transfer_out(beneficiary, total)?;
            }
            Ok(total)
        })
    }

    /// Terminate a revokable schedule. The beneficiary receives everything
    /// vested up to now; the unreleased remainder returns to the free pool.
    /// Admin only.
    pub fn revoke(&mut self, caller: &Address, id: &Hash) -> VestingResult<()> {
        self.guarded(|engine| {
            engine.state.access.require(Role::Admin, caller)?;

            let now = engine.clock.now();
            let schedule = engine
                .state
                .store
                .schedule(id)
                .ok_or(VestingError::InvalidSchedule)?;
            if schedule.is_revoked() {
                return Err(VestingError::ScheduleWasRevoked);
            }
            if !schedule.revokable {
                return Err(VestingError::NotRevokable);
            }
            let beneficiary = schedule.beneficiary;

            let vested = math::releasable(schedule, now);
            if !vested.is_zero() {
                engine.book_release(id, &beneficiary, vested);
            }

            let refunded = engine.state.store.record_revoke(id);
            engine.events.push(EngineEvent::ScheduleRevoked {
                id: *id,
                beneficiary,
                released: vested,
                refunded,
            });
            if !refunded.is_zero() {
                engine.events.push(EngineEvent::VirtualTransfer {
                    from: beneficiary,
                    to: Address::zero(),
                    value: refunded,
                });
            }
            debug!(
                "revoked schedule {} (released {}, refunded {})",
                id, vested, refunded
            );

            if !vested.is_zero() {
                engine.transfer_out(&beneficiary, vested)?;
            }
            Ok(())
        })
    }

    /// Move `amount` of the free pool (balance beyond committed principal)
    /// to the caller. Admin only. Never touches committed principal.
    pub fn withdraw(&mut self, caller: &Address, amount: U256) -> VestingResult<()> {
        self.guarded(|engine| {
            engine.state.access.require(Role::Admin, caller)?;

            let available = engine.withdrawable()?;
            if amount > available {
                return Err(VestingError::InsufficientTokensInContract {
                    requested: amount,
                    available,
                });
            }

            engine.events.push(EngineEvent::Withdrawn {
                to: *caller,
                amount,
            });
            debug!("withdrew {} to {}", amount, caller);

            engine.transfer_out(caller, amount)?;
            Ok(())
        })
    }

    /// Book a release on the store and emit the release + burn notifications
    fn book_release(&mut self, id: &Hash, beneficiary: &Address, amount: U256) {
        self.state.store.record_release(id, amount);
        self.events.push(EngineEvent::TokensReleased {
            id: *id,
            beneficiary: *beneficiary,
            amount,
        });
        self.events.push(EngineEvent::VirtualTransfer {
            from: *beneficiary,
            to: Address::zero(),
            value: amount,
        });
    }

    fn transfer_out(&mut self, to: &Address, amount: U256) -> VestingResult<()> {
        self.token.transfer(to, amount).map_err(|err| {
            warn!("outbound transfer of {} to {} failed: {}", amount, to, err);
            VestingError::from(err)
        })
    }

    // ========================================================================
    // Merkle-gated claim
    // ========================================================================

    /// Self-install a schedule by presenting a Merkle inclusion proof for the
    /// tuple under the caller's identity.
    ///
    /// On the purchasable variant the attached native value must equal the
    /// computed price exactly; it is forwarded to the payment receiver after
    /// all state mutation. Engines without a gate reject the call outright.
    pub fn claim(
        &mut self,
        caller: &Address,
        params: &ScheduleParams,
        proof: &[Hash],
        attached_value: U256,
    ) -> VestingResult<Hash> {
        self.guarded(|engine| {
            let gate = engine.state.gate.as_ref().ok_or(VestingError::NotSupported)?;
            let root = gate.root();
            let purchase = gate.purchase().copied();

            engine.state.access.require_not_paused()?;

            let fp = fingerprint(caller, params);
            if engine
                .state
                .gate
                .as_ref()
                .is_some_and(|g| g.is_claimed(&fp))
            {
                return Err(VestingError::AlreadyClaimed);
            }

            let leaf = leaf_hash(caller, params);
            if !merkle::verify_proof(&leaf, proof, &root) {
                return Err(VestingError::InvalidProof);
            }

            // Price check precedes all effects; both under- and over-payment
            // are rejected
            let (price, receiver) = match &purchase {
                Some(terms) => (terms.price(params.amount), terms.payment_receiver),
                None => (U256::zero(), Address::zero()),
            };
            if attached_value != price {
                return Err(VestingError::InvalidAmount);
            }

            if let Some(gate) = engine.state.gate.as_mut() {
                gate.record_claim(fp);
            }
            let id = engine.install_schedule(*caller, params)?;
            engine.events.push(EngineEvent::ScheduleClaimed {
                id,
                beneficiary: *caller,
                fingerprint: fp,
                amount: params.amount,
                price,
            });
            debug!(
                "claim installed schedule {} for {} (fingerprint {}, price {})",
                id, caller, fp, price
            );

            if !price.is_zero() {
                let sink = engine.native.as_mut().ok_or(VestingError::NotSupported)?;
                sink.transfer(&receiver, price).map_err(|err| {
                    warn!("payment forward of {} to {} failed: {}", price, receiver, err);
                    VestingError::from(err)
                })?;
            }
            Ok(id)
        })
    }

    /// Replace the Merkle root. The claim registry survives rotation. Admin
    /// only; fails on an ungated engine.
    pub fn set_merkle_root(&mut self, caller: &Address, root: Hash) -> VestingResult<()> {
        self.transact(|engine| {
            engine.state.access.require(Role::Admin, caller)?;
            let gate = engine.state.gate.as_mut().ok_or(VestingError::NotSupported)?;
            let previous = gate.set_root(root);
            engine.events.push(EngineEvent::MerkleRootUpdated {
                previous,
                current: root,
            });
            Ok(())
        })
    }

    /// Update the per-unit claim cost. Admin only, purchasable variant only.
    pub fn set_unit_cost(&mut self, caller: &Address, unit_cost: U256) -> VestingResult<()> {
        self.transact(|engine| {
            engine.state.access.require(Role::Admin, caller)?;
            let gate = engine.state.gate.as_mut().ok_or(VestingError::NotSupported)?;
            let previous = gate.set_unit_cost(unit_cost)?;
            engine.events.push(EngineEvent::UnitCostUpdated {
                previous,
                current: unit_cost,
            });
            Ok(())
        })
    }

    /// Update the payment receiver. Admin only, purchasable variant only.
    pub fn set_payment_receiver(&mut self, caller: &Address, receiver: Address) -> VestingResult<()> {
        self.transact(|engine| {
            engine.state.access.require(Role::Admin, caller)?;
            let gate = engine.state.gate.as_mut().ok_or(VestingError::NotSupported)?;
            let previous = gate.set_payment_receiver(receiver)?;
            engine.events.push(EngineEvent::PaymentReceiverUpdated {
                previous,
                current: receiver,
            });
            Ok(())
        })
    }

    // ========================================================================
    // Administration
    // ========================================================================

    /// Suspend schedule creation (direct and gated). Release, revoke and
    /// withdraw stay available so committed principal is never stranded.
    pub fn pause(&mut self, caller: &Address) -> VestingResult<()> {
        self.transact(|engine| {
            if engine.state.access.set_paused(caller, true)? {
                engine.events.push(EngineEvent::Paused);
            }
            Ok(())
        })
    }

    pub fn unpause(&mut self, caller: &Address) -> VestingResult<()> {
        self.transact(|engine| {
            if engine.state.access.set_paused(caller, false)? {
                engine.events.push(EngineEvent::Unpaused);
            }
            Ok(())
        })
    }

    pub fn grant_role(&mut self, caller: &Address, role: Role, who: &Address) -> VestingResult<()> {
        self.transact(|engine| {
            if engine.state.access.grant_role(caller, role, who)? {
                engine.events.push(EngineEvent::RoleGranted {
                    role,
                    account: *who,
                });
            }
            Ok(())
        })
    }

    pub fn revoke_role(&mut self, caller: &Address, role: Role, who: &Address) -> VestingResult<()> {
        self.transact(|engine| {
            if engine.state.access.revoke_role(caller, role, who)? {
                engine.events.push(EngineEvent::RoleRevoked {
                    role,
                    account: *who,
                });
            }
            Ok(())
        })
    }

    /// First half of the two-step admin handover
    pub fn begin_admin_transfer(&mut self, caller: &Address, nominee: &Address) -> VestingResult<()> {
        self.transact(|engine| {
            engine.state.access.begin_admin_transfer(caller, nominee)?;
            engine.events.push(EngineEvent::AdminTransferStarted {
                incumbent: *caller,
                nominee: *nominee,
            });
            Ok(())
        })
    }

    /// Second half: only the pending nominee may call
    pub fn accept_admin_transfer(&mut self, caller: &Address) -> VestingResult<()> {
        self.transact(|engine| {
            let handover = engine.state.access.accept_admin_transfer(caller)?;
            engine.events.push(EngineEvent::AdminTransferCompleted {
                incumbent: handover.incumbent,
                nominee: handover.nominee,
            });
            debug!("admin handover completed: {} -> {}", handover.incumbent, handover.nominee);
            Ok(())
        })
    }

    /// Abort a handover in flight; only the initiating incumbent may
    pub fn cancel_admin_transfer(&mut self, caller: &Address) -> VestingResult<()> {
        self.transact(|engine| {
            let handover = engine.state.access.cancel_admin_transfer(caller)?;
            engine.events.push(EngineEvent::AdminTransferCanceled {
                incumbent: handover.incumbent,
                nominee: handover.nominee,
            });
            Ok(())
        })
    }

    // ========================================================================
    // Virtual token surface (read-only projection of committed principal)
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        VIRTUAL_TOKEN_DECIMALS
    }

    /// Committed principal across all live schedules
    pub fn total_supply(&self) -> U256 {
        self.state.store.committed_total()
    }

    /// Committed principal across the beneficiary's live schedules
    pub fn balance_of(&self, beneficiary: &Address) -> U256 {
        self.state.store.committed_of(beneficiary)
    }

    /// The virtual balance is non-transferable by construction
    pub fn transfer(&mut self, _caller: &Address, _to: &Address, _value: U256) -> VestingResult<()> {
        Err(VestingError::NotSupported)
    }

    pub fn approve(&mut self, _caller: &Address, _spender: &Address, _value: U256) -> VestingResult<()> {
        Err(VestingError::NotSupported)
    }

    pub fn transfer_from(
        &mut self,
        _caller: &Address,
        _from: &Address,
        _to: &Address,
        _value: U256,
    ) -> VestingResult<()> {
        Err(VestingError::NotSupported)
    }

    pub fn allowance(&self, _owner: &Address, _spender: &Address) -> VestingResult<U256> {
        Err(VestingError::NotSupported)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn schedule(&self, id: &Hash) -> Option<&Schedule> {
        self.state.store.schedule(id)
    }

    pub fn schedule_by_index(&self, beneficiary: &Address, index: u64) -> Option<&Schedule> {
        self.state.store.schedule_by_index(beneficiary, index)
    }

    pub fn schedule_count(&self, beneficiary: &Address) -> u64 {
        self.state.store.schedule_count(beneficiary)
    }

    /// The beneficiary's slots in index order, bounded by their counter
    pub fn schedules_of<'a>(
        &'a self,
        beneficiary: &'a Address,
    ) -> impl Iterator<Item = (Hash, &'a Schedule)> + 'a {
        self.state.store.schedules_of(beneficiary)
    }

    /// Releasable amount of the schedule at the engine clock's current time
    pub fn releasable(&self, id: &Hash) -> VestingResult<U256> {
        let schedule = self
            .state
            .store
            .schedule(id)
            .ok_or(VestingError::InvalidSchedule)?;
        Ok(math::releasable(schedule, self.clock.now()))
    }

    /// Free pool: underlying balance beyond the committed principal
    pub fn withdrawable(&self) -> VestingResult<U256> {
        let balance = self.token.balance()?;
        Ok(balance.saturating_sub(self.state.store.committed_total()))
    }

    pub fn is_paused(&self) -> bool {
        self.state.access.is_paused()
    }

    pub fn has_role(&self, role: Role, who: &Address) -> bool {
        self.state.access.has_role(role, who)
    }

    pub fn pending_admin(&self) -> Option<&AdminHandover> {
        self.state.access.pending_admin()
    }

    pub fn merkle_root(&self) -> Option<Hash> {
        self.state.gate.as_ref().map(|gate| gate.root())
    }

    pub fn is_claimed(&self, fingerprint: &Hash) -> bool {
        self.state
            .gate
            .as_ref()
            .is_some_and(|gate| gate.is_claimed(fingerprint))
    }

    pub fn unit_cost(&self) -> Option<U256> {
        self.state
            .gate
            .as_ref()
            .and_then(|gate| gate.purchase())
            .map(|terms| terms.unit_cost)
    }

    pub fn payment_receiver(&self) -> Option<Address> {
        self.state
            .gate
            .as_ref()
            .and_then(|gate| gate.purchase())
            .map(|terms| terms.payment_receiver)
    }

    /// Snapshot view of the pure state (persisted-state layout)
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Drain the buffered notifications of all operations since the last call
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }
}
