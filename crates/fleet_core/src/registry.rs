//! Ordered entity indexes kept alongside the ECS world.
//!
//! Query iteration order is an implementation detail of the ECS, so the
//! dispatcher walks these instead: vehicles by ascending id, requests by
//! ascending id.

use std::collections::BTreeMap;

use bevy_ecs::prelude::{Entity, Resource};

use crate::ecs::{RequestId, VehicleId};

/// Vehicle entities, indexed by [VehicleId] (ids are dense from 0).
#[derive(Debug, Default, Resource)]
pub struct Fleet {
    vehicles: Vec<Entity>,
}

impl Fleet {
    pub fn register(&mut self, entity: Entity) -> VehicleId {
        let id = VehicleId(self.vehicles.len() as u32);
        self.vehicles.push(entity);
        id
    }

    pub fn next_id(&self) -> VehicleId {
        VehicleId(self.vehicles.len() as u32)
    }

    pub fn entity(&self, id: VehicleId) -> Option<Entity> {
        self.vehicles.get(id.0 as usize).copied()
    }

    /// Vehicle entities in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.vehicles.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}

/// Every request ever created, in creation (= id) order. Never pruned.
#[derive(Debug, Default, Resource)]
pub struct Backlog {
    requests: Vec<(RequestId, Entity)>,
}

impl Backlog {
    pub fn push(&mut self, id: RequestId, entity: Entity) {
        debug_assert!(
            self.requests.last().map_or(true, |(last, _)| *last < id),
            "request ids must increase"
        );
        self.requests.push((id, entity));
    }

    pub fn entity(&self, id: RequestId) -> Option<Entity> {
        self.requests
            .binary_search_by_key(&id, |(request_id, _)| *request_id)
            .ok()
            .map(|idx| self.requests[idx].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RequestId, Entity)> + '_ {
        self.requests.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Requests still waiting for a vehicle, ordered oldest first.
///
/// Visiting this queue yields the same order as scanning the whole backlog for
/// unassigned requests, without revisiting completed history every tick.
#[derive(Debug, Default, Resource)]
pub struct PendingRequests {
    queue: BTreeMap<RequestId, Entity>,
}

impl PendingRequests {
    pub fn insert(&mut self, id: RequestId, entity: Entity) {
        self.queue.insert(id, entity);
    }

    pub fn remove(&mut self, id: RequestId) -> Option<Entity> {
        self.queue.remove(&id)
    }

    /// Snapshot of the queue, oldest first.
    pub fn ordered(&self) -> Vec<(RequestId, Entity)> {
        self.queue.iter().map(|(id, entity)| (*id, *entity)).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
