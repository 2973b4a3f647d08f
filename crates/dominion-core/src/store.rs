//! Transactional store with optimistic concurrency.
//!
//! The [`Store`] owns the committed [`GameState`]. Writers work through a
//! [`Transaction`]:
//!
//! 1. **READ**: every empire read records the row version it saw
//! 2. **STAGE**: writes go to the transaction, not the committed state
//! 3. **COMMIT**: under the store lock, every recorded version is checked;
//!    if any changed the commit fails with [`StoreError::Conflict`],
//!    otherwise all staged rows are written and versions bumped
//!
//! Dropping a transaction without committing discards its writes, so rollback
//! is implicit. The lock is only held for single reads and for the commit
//! itself, never across battle computation.
//!
//! # Example
//!
//! ```
//! use dominion_core::empire::{Empire, GameId};
//! use dominion_core::state::GameState;
//! use dominion_core::store::Store;
//! use dominion_core::dominion_combat::EmpireId;
//!
//! let mut state = GameState::new(GameId::new("alpha"));
//! state.add_empire(Empire::new(EmpireId::new(1), "Vega"));
//! let store = Store::new(state);
//!
//! store
//!     .transaction(3, |tx| {
//!         let mut vega = tx.empire(EmpireId::new(1))?;
//!         vega.adjust_effectiveness(10.0);
//!         tx.put_empire(vega);
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! assert_eq!(store.version(EmpireId::new(1)), Some(1));
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use dominion_combat::EmpireId;

use crate::empire::{Empire, Sector, SectorId};
use crate::error::StoreError;
use crate::records::{AttackId, AttackRecord, PhaseLogRow};
use crate::state::GameState;

#[derive(Debug)]
struct Committed {
    state: GameState,
    versions: BTreeMap<EmpireId, u64>,
}

/// Shared, thread-safe owner of the committed game state.
#[derive(Debug)]
pub struct Store {
    inner: Mutex<Committed>,
    next_attack_id: AtomicU64,
}

impl Store {
    /// Creates a store holding `state`. All empire versions start at 0.
    #[must_use]
    pub fn new(state: GameState) -> Self {
        let next_attack = state
            .attacks()
            .iter()
            .map(|a| a.id.as_u64())
            .max()
            .map_or(1, |max| max + 1);
        let versions = state.empires().map(|e| (e.id, 0)).collect();
        Self {
            inner: Mutex::new(Committed { state, versions }),
            next_attack_id: AtomicU64::new(next_attack),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Committed> {
        // Commits write all rows before releasing the lock, so a poisoned
        // guard still holds consistent state.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` against the committed state under the store lock.
    pub fn read<T>(&self, f: impl FnOnce(&GameState) -> T) -> T {
        f(&self.lock().state)
    }

    /// Returns a copy of the committed state.
    #[must_use]
    pub fn snapshot(&self) -> GameState {
        self.lock().state.clone()
    }

    /// Current version of an empire row.
    #[must_use]
    pub fn version(&self, id: EmpireId) -> Option<u64> {
        self.lock().versions.get(&id).copied()
    }

    /// Starts a transaction.
    #[must_use]
    pub fn begin(&self) -> Transaction<'_> {
        Transaction {
            store: self,
            reads: BTreeMap::new(),
            empires: BTreeMap::new(),
            sectors: BTreeMap::new(),
            attacks: Vec::new(),
        }
    }

    /// Runs `body` in a transaction and commits it, retrying on conflict.
    ///
    /// Each attempt starts a fresh transaction, so `body` re-reads every row.
    /// An error returned by `body` rolls the attempt back and is returned as
    /// is.
    ///
    /// # Errors
    ///
    /// - any error returned by `body`
    /// - [`StoreError::RetriesExhausted`] if all `max_attempts` commits
    ///   conflicted
    pub fn transaction<T, F>(&self, max_attempts: u32, mut body: F) -> Result<T, StoreError>
    where
        F: FnMut(&mut Transaction<'_>) -> Result<T, StoreError>,
    {
        let attempts = max_attempts.max(1);
        for attempt in 1..=attempts {
            let mut tx = self.begin();
            let value = body(&mut tx)?;
            match tx.commit() {
                Ok(()) => return Ok(value),
                Err(err @ StoreError::Conflict { .. }) => {
                    warn!(attempt, %err, "commit conflicted; retrying");
                }
                Err(err) => return Err(err),
            }
        }
        Err(StoreError::RetriesExhausted { attempts })
    }

    fn allocate_attack_id(&self) -> AttackId {
        AttackId::new(self.next_attack_id.fetch_add(1, Ordering::Relaxed))
    }
}

/// A unit of work against the [`Store`].
///
/// Reads see committed rows overlaid with this transaction's own staged
/// writes.
#[derive(Debug)]
pub struct Transaction<'s> {
    store: &'s Store,
    /// Version of every empire row read, as first seen.
    reads: BTreeMap<EmpireId, u64>,
    empires: BTreeMap<EmpireId, Empire>,
    sectors: BTreeMap<SectorId, Sector>,
    attacks: Vec<(AttackRecord, Vec<PhaseLogRow>)>,
}

impl Transaction<'_> {
    /// Reads an empire row and records its version.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmpireNotFound`] if no such empire exists.
    pub fn empire(&mut self, id: EmpireId) -> Result<Empire, StoreError> {
        if let Some(staged) = self.empires.get(&id) {
            return Ok(staged.clone());
        }
        let committed = self.store.lock();
        let empire = committed
            .state
            .empire(id)
            .cloned()
            .ok_or(StoreError::EmpireNotFound(id))?;
        let version = committed.versions.get(&id).copied().unwrap_or_default();
        self.reads.entry(id).or_insert(version);
        Ok(empire)
    }

    /// Stages an empire row.
    pub fn put_empire(&mut self, empire: Empire) {
        self.empires.insert(empire.id, empire);
    }

    /// Reads a sector row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SectorNotFound`] if no such sector exists.
    pub fn sector(&self, id: SectorId) -> Result<Sector, StoreError> {
        if let Some(staged) = self.sectors.get(&id) {
            return Ok(*staged);
        }
        self.store
            .lock()
            .state
            .sector(id)
            .copied()
            .ok_or(StoreError::SectorNotFound(id))
    }

    /// Ids of the sectors `owner` holds, ascending, including staged
    /// transfers.
    ///
    /// Records a read of the owner's row, so a concurrent transfer of the
    /// owner's territory makes this transaction conflict.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmpireNotFound`] if the owner does not exist.
    pub fn sectors_owned_by(&mut self, owner: EmpireId) -> Result<Vec<SectorId>, StoreError> {
        self.empire(owner)?;
        let committed = self.store.lock();
        let mut owned: Vec<SectorId> = committed
            .state
            .sectors_owned_by(owner)
            .into_iter()
            .filter(|id| self.sectors.get(id).map_or(true, |s| s.owner == owner))
            .collect();
        owned.extend(
            self.sectors
                .values()
                .filter(|s| {
                    s.owner == owner
                        && committed.state.sector(s.id).map(|c| c.owner) != Some(owner)
                })
                .map(|s| s.id),
        );
        owned.sort_unstable();
        Ok(owned)
    }

    /// Stages a change of sector owner.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SectorNotFound`] if no such sector exists.
    pub fn transfer_sector(&mut self, id: SectorId, owner: EmpireId) -> Result<(), StoreError> {
        let mut sector = self.sector(id)?;
        sector.owner = owner;
        self.sectors.insert(id, sector);
        Ok(())
    }

    /// Allocates an attack id and stages its audit rows.
    ///
    /// `build` receives the new id and returns the record and its phase rows.
    /// Ids of rolled-back attacks are not reused.
    pub fn append_attack(
        &mut self,
        build: impl FnOnce(AttackId) -> (AttackRecord, Vec<PhaseLogRow>),
    ) -> AttackId {
        let id = self.store.allocate_attack_id();
        self.attacks.push(build(id));
        id
    }

    /// Commits all staged writes atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if any empire read by this
    /// transaction was committed by someone else in the meantime. Nothing is
    /// written in that case.
    pub fn commit(self) -> Result<(), StoreError> {
        let mut committed = self.store.lock();

        for (&empire, &read) in &self.reads {
            let current = committed.versions.get(&empire).copied().unwrap_or_default();
            if current != read {
                return Err(StoreError::Conflict {
                    empire,
                    read,
                    current,
                });
            }
        }

        let written = self.empires.len();
        for (id, empire) in self.empires {
            committed.state.add_empire(empire);
            *committed.versions.entry(id).or_default() += 1;
        }
        for sector in self.sectors.into_values() {
            committed.state.put_sector(sector);
        }
        for (record, phases) in self.attacks {
            committed.state.append_attack(record, phases);
        }

        debug!(empires = written, "transaction committed");
        Ok(())
    }
}
