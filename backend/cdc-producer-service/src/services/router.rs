//! Chooses what a worker emits next.
//!
//! `slot = (worker_id + reference) mod 4`, where `reference` is the total
//! number of ids allocated so far across every table:
//!
//! ```text
//! slot 0 -> oracle CUSTOMERS create     slot 2 -> db2 PRODUCTS create
//! slot 1 -> oracle ORDERS create        slot 3 -> db2 INVENTORY create
//! ```
//!
//! When one system is disabled its slots fall through to the other system,
//! entity for entity (customers <-> products, orders <-> inventory). Workers
//! read the reference at different moments while it advances, so the mix is
//! deterministic per call and varied across workers without drawing from a
//! random distribution.

use cdc_envelope::Operation;

use crate::config::ProducerMode;
use crate::context::IdSequences;
use crate::models::{EntityKind, SourceSystem};

/// Outcome of one routing decision, one variant per system x table x create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dispatch {
    OracleCustomerCreate,
    OracleOrderCreate,
    Db2ProductCreate,
    Db2InventoryCreate,
}

impl Dispatch {
    pub fn entity(&self) -> EntityKind {
        match self {
            Dispatch::OracleCustomerCreate => EntityKind::Customer,
            Dispatch::OracleOrderCreate => EntityKind::Order,
            Dispatch::Db2ProductCreate => EntityKind::Product,
            Dispatch::Db2InventoryCreate => EntityKind::Inventory,
        }
    }

    pub fn system(&self) -> SourceSystem {
        self.entity().system()
    }

    pub fn operation(&self) -> Operation {
        Operation::Create
    }
}

/// A routing decision plus the id already allocated for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub dispatch: Dispatch,
    pub id: u64,
}

pub fn event_slot(worker_id: u64, reference: u64) -> u8 {
    (worker_id.wrapping_add(reference) % 4) as u8
}

/// Map a slot to a dispatch target under `mode`.
pub fn select(mode: ProducerMode, slot: u8) -> Dispatch {
    let oracle = mode.produces(SourceSystem::Oracle);
    let db2 = mode.produces(SourceSystem::Db2);

    match slot % 4 {
        0 if oracle => Dispatch::OracleCustomerCreate,
        1 if oracle => Dispatch::OracleOrderCreate,
        0 => Dispatch::Db2ProductCreate,
        1 => Dispatch::Db2InventoryCreate,
        2 if db2 => Dispatch::Db2ProductCreate,
        3 if db2 => Dispatch::Db2InventoryCreate,
        2 => Dispatch::OracleCustomerCreate,
        _ => Dispatch::OracleOrderCreate,
    }
}

/// Stateless router over the shared id sequences.
#[derive(Debug, Clone, Copy)]
pub struct DispatchRouter {
    mode: ProducerMode,
}

impl DispatchRouter {
    pub fn new(mode: ProducerMode) -> Self {
        Self { mode }
    }

    /// Pick the next target for `worker_id` and allocate its id.
    pub fn route(&self, worker_id: u64, sequences: &IdSequences) -> Allocation {
        let slot = event_slot(worker_id, sequences.total());
        let dispatch = select(self.mode, slot);
        let id = sequences.next(dispatch.entity());

        Allocation { dispatch, id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ProducerContext;

    #[test]
    fn test_slot_mapping_with_both_systems() {
        let targets: Vec<Dispatch> = (0..4).map(|slot| select(ProducerMode::Both, slot)).collect();

        assert_eq!(
            targets,
            vec![
                Dispatch::OracleCustomerCreate,
                Dispatch::OracleOrderCreate,
                Dispatch::Db2ProductCreate,
                Dispatch::Db2InventoryCreate,
            ]
        );
    }

    #[test]
    fn test_disabled_system_falls_through() {
        let db2_only: Vec<EntityKind> = (0..4)
            .map(|slot| select(ProducerMode::Db2, slot).entity())
            .collect();
        assert_eq!(
            db2_only,
            vec![
                EntityKind::Product,
                EntityKind::Inventory,
                EntityKind::Product,
                EntityKind::Inventory,
            ]
        );

        let oracle_only: Vec<EntityKind> = (0..4)
            .map(|slot| select(ProducerMode::Oracle, slot).entity())
            .collect();
        assert_eq!(
            oracle_only,
            vec![
                EntityKind::Customer,
                EntityKind::Order,
                EntityKind::Customer,
                EntityKind::Order,
            ]
        );
    }

    #[test]
    fn test_event_slot_is_modulo_four() {
        assert_eq!(event_slot(0, 0), 0);
        assert_eq!(event_slot(3, 2), 1);
        assert_eq!(event_slot(1, 10), 3);
        assert_eq!(event_slot(u64::MAX, 1), 0);
    }

    #[test]
    fn test_single_worker_cycles_through_all_tables() {
        let ctx = ProducerContext::with_position_seed(0);
        let router = DispatchRouter::new(ProducerMode::Both);

        let entities: Vec<EntityKind> = (0..8)
            .map(|_| router.route(0, &ctx.sequences).dispatch.entity())
            .collect();

        assert_eq!(&entities[..4], &EntityKind::ALL[..]);
        assert_eq!(&entities[4..], &EntityKind::ALL[..]);
        assert_eq!(ctx.sequence_snapshot().inventory, 2);
    }

    #[test]
    fn test_db2_mode_alternates_and_allocates_increasing_ids() {
        let ctx = ProducerContext::with_position_seed(0);
        let router = DispatchRouter::new(ProducerMode::Db2);

        let allocations: Vec<Allocation> =
            (0..6).map(|_| router.route(0, &ctx.sequences)).collect();

        let entities: Vec<EntityKind> = allocations.iter().map(|a| a.dispatch.entity()).collect();
        assert_eq!(
            entities,
            vec![
                EntityKind::Product,
                EntityKind::Inventory,
                EntityKind::Product,
                EntityKind::Inventory,
                EntityKind::Product,
                EntityKind::Inventory,
            ]
        );

        let product_ids: Vec<u64> = allocations
            .iter()
            .filter(|a| a.dispatch == Dispatch::Db2ProductCreate)
            .map(|a| a.id)
            .collect();
        assert_eq!(product_ids, vec![1, 2, 3]);
        assert!(allocations.iter().all(|a| a.dispatch.operation() == Operation::Create));
    }
}
