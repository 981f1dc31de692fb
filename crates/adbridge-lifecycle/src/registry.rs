// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Instance registry — the authoritative map from caller-supplied id to live
// ad instance.
//
// Ids that were registered and later removed are remembered as retired, so a
// repeated destroy can be told apart from an id that never existed.  Only the
// most recent `RETIRED_CAPACITY` retirements are kept; older ones are
// forgotten oldest-first and read as never seen.  Every
// registration gets a fresh generation number; native callbacks carry the
// generation they were created with and are ignored once it no longer
// matches.

use std::collections::{HashMap, HashSet, VecDeque};

use adbridge_core::error::{BridgeError, Result};
use adbridge_core::types::{AdFormat, AdId, AdState, BannerSize};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::handle::SharedHandle;

/// One live ad object tracked by the bridge.
pub struct AdInstance {
    pub id: AdId,
    pub format: AdFormat,
    pub placement: String,
    /// Requested size; `None` for fullscreen formats.
    pub banner_size: Option<BannerSize>,
    pub state: AdState,
    pub auto_refresh_enabled: bool,
    /// Set once a reward has been published for the current show.
    pub reward_granted: bool,
    pub generation: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    handle: SharedHandle,
}

impl AdInstance {
    pub fn new(
        id: AdId,
        format: AdFormat,
        placement: impl Into<String>,
        banner_size: Option<BannerSize>,
        generation: u64,
        handle: SharedHandle,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            format,
            placement: placement.into(),
            banner_size,
            state: AdState::Created,
            auto_refresh_enabled: false,
            reward_granted: false,
            generation,
            created_at: now,
            updated_at: now,
            handle,
        }
    }

    pub fn handle(&self) -> SharedHandle {
        SharedHandle::clone(&self.handle)
    }

    pub fn set_state(&mut self, state: AdState) {
        if self.state != state {
            tracing::debug!(ad_id = %self.id, from = ?self.state, to = ?state, "state transition");
            self.state = state;
        }
        self.updated_at = Utc::now();
    }

    pub fn snapshot(&self) -> AdSnapshot {
        AdSnapshot {
            id: self.id.clone(),
            format: self.format,
            placement: self.placement.clone(),
            banner_size: self.banner_size,
            state: self.state,
            auto_refresh_enabled: self.auto_refresh_enabled,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl std::fmt::Debug for AdInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdInstance")
            .field("id", &self.id)
            .field("format", &self.format)
            .field("placement", &self.placement)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Read-only copy of an instance's bookkeeping, safe to hand to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdSnapshot {
    pub id: AdId,
    pub format: AdFormat,
    pub placement: String,
    pub banner_size: Option<BannerSize>,
    pub state: AdState,
    pub auto_refresh_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Number of retired ids remembered for repeat-destroy detection.
pub const RETIRED_CAPACITY: usize = 1024;

pub struct InstanceRegistry {
    live: HashMap<AdId, AdInstance>,
    retired: HashSet<AdId>,
    /// Retirement order, oldest first.  Holds exactly the ids in `retired`.
    retired_order: VecDeque<AdId>,
    retired_capacity: usize,
    next_generation: u64,
}

impl Default for InstanceRegistry {
    fn default() -> Self {
        Self::with_retired_capacity(RETIRED_CAPACITY)
    }
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retired_capacity(capacity: usize) -> Self {
        Self {
            live: HashMap::new(),
            retired: HashSet::new(),
            retired_order: VecDeque::new(),
            retired_capacity: capacity,
            next_generation: 0,
        }
    }

    /// Hand out the generation for an instance about to be allocated.
    pub fn reserve_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Insert a new instance.  Fails with `DuplicateId` if the id is live.
    pub fn register(&mut self, instance: AdInstance) -> Result<()> {
        if self.live.contains_key(&instance.id) {
            return Err(BridgeError::DuplicateId(instance.id));
        }
        if self.retired.remove(&instance.id) {
            self.retired_order.retain(|id| id != &instance.id);
        }
        self.live.insert(instance.id.clone(), instance);
        Ok(())
    }

    pub fn lookup(&self, id: &AdId) -> Option<&AdInstance> {
        self.live.get(id)
    }

    pub fn lookup_mut(&mut self, id: &AdId) -> Option<&mut AdInstance> {
        self.live.get_mut(id)
    }

    /// Remove an instance, returning it if it was live.  Removing an absent
    /// id is a no-op.
    pub fn unregister(&mut self, id: &AdId) -> Option<AdInstance> {
        let removed = self.live.remove(id)?;
        self.retire(id.clone());
        Some(removed)
    }

    /// Whether `id` was registered once and has since been removed.
    pub fn was_retired(&self, id: &AdId) -> bool {
        self.retired.contains(id)
    }

    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }

    fn retire(&mut self, id: AdId) {
        if !self.retired.insert(id.clone()) {
            return;
        }
        self.retired_order.push_back(id);
        while self.retired_order.len() > self.retired_capacity {
            if let Some(oldest) = self.retired_order.pop_front() {
                self.retired.remove(&oldest);
            }
        }
    }

    pub fn contains(&self, id: &AdId) -> bool {
        self.live.contains_key(id)
    }

    pub fn all_live(&self) -> Vec<&AdInstance> {
        self.live.values().collect()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Remove and return every live instance, retiring their ids.
    pub fn drain(&mut self) -> Vec<AdInstance> {
        let drained: Vec<AdInstance> = self.live.drain().map(|(_, inst)| inst).collect();
        for inst in &drained {
            self.retire(inst.id.clone());
        }
        drained
    }
}
