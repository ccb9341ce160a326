use crate::api::PointApi;
use crate::arena::{Slab, StatefulAlloc, StatefulArena};
use crate::database::PointDatabase;
use crate::descriptor::{IdKey, PointDescriptor};
use crate::factory::PointFactoryDatabase;
use foxtail_error::{BankError, Error};
use std::sync::Arc;

/// A contiguous slab of point stateful memory plus the ordered points that
/// own it.
///
/// Because every point stores its state exclusively inside the bank's slab,
/// a bank can be copied wholesale: to a raw buffer (HA snapshot), from a raw
/// buffer (HA restore), or from a layout-equivalent bank (input scan /
/// output flush). Two banks are layout-equivalent iff their point sequences
/// name identical type GUIDs, with identical stateful sizes, in the same
/// order — that is the only precondition for bank-to-bank copy.
pub struct Bank {
    slab: Slab,
    points: Vec<Arc<dyn PointApi>>,
    size: usize,
}

impl Bank {
    /// Build a bank from point descriptors: size the slab, then create each
    /// point bound to its slot and register it in the point database.
    ///
    /// `id_key` selects which descriptor key names the points (cards create
    /// three points per descriptor across three banks). Setters are created
    /// only when `create_setter` is set, and always draw from `setter_arena`
    /// rather than the bank slab.
    pub fn build(
        factory: &PointFactoryDatabase,
        descriptors: &[PointDescriptor],
        id_key: IdKey,
        create_setter: bool,
        arena: &StatefulArena,
        setter_arena: &StatefulArena,
        db: &PointDatabase,
    ) -> Result<Bank, Error> {
        let mut size = 0usize;
        for desc in descriptors {
            size += factory.stateful_size_of(&desc.type_guid, desc.type_cfg.as_ref())?;
        }

        let slab = arena.allocate_slab(size)?;
        let mut points = Vec::with_capacity(descriptors.len());
        let mut offset = 0usize;
        for desc in descriptors {
            let point = factory.create_point_from_descriptor(
                desc,
                id_key,
                create_setter,
                StatefulAlloc::Slab {
                    slab: &slab,
                    offset,
                },
                setter_arena,
                db,
            )?;
            offset += point.stateful_size();
            points.push(point);
        }

        Ok(Bank { slab, points, size })
    }

    /// A bank with no points (e.g. a card direction with no channels).
    pub fn empty(arena: &StatefulArena) -> Result<Bank, Error> {
        Ok(Bank {
            slab: arena.allocate_slab(0)?,
            points: Vec::new(),
            size: 0,
        })
    }

    /// Total stateful bytes owned by the bank.
    pub fn stateful_allocated_size(&self) -> usize {
        self.size
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn point_at(&self, index: usize) -> Option<&Arc<dyn PointApi>> {
        self.points.get(index)
    }

    pub fn points(&self) -> &[Arc<dyn PointApi>] {
        &self.points
    }

    pub fn is_layout_equivalent(&self, other: &Bank) -> bool {
        self.points.len() == other.points.len()
            && self
                .points
                .iter()
                .zip(other.points.iter())
                .all(|(a, b)| {
                    a.type_guid() == b.type_guid() && a.stateful_size() == b.stateful_size()
                })
    }

    /// Run `f` over the bank's raw stateful memory, locked. The safe analog
    /// of handing out the slab head for bulk I/O.
    pub fn with_stateful_memory<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let mem = self.slab.lock();
        f(&mem)
    }

    /// Bit-exact snapshot of the bank's stateful memory. `dst` must be
    /// exactly the bank's stateful size.
    pub fn copy_stateful_memory_to(&self, dst: &mut [u8]) -> Result<(), Error> {
        if dst.len() != self.size {
            return Err(BankError::SizeMismatch.into());
        }
        let mem = self.slab.lock();
        dst.copy_from_slice(&mem);
        Ok(())
    }

    /// Bit-exact restore of the bank's stateful memory. `src` must be
    /// exactly the bank's stateful size.
    pub fn copy_stateful_memory_from(&self, src: &[u8]) -> Result<(), Error> {
        if src.len() != self.size {
            return Err(BankError::SizeMismatch.into());
        }
        let mut mem = self.slab.lock();
        mem.copy_from_slice(src);
        Ok(())
    }

    /// Block-copy another bank's stateful memory into this bank. Fails
    /// without mutation unless the banks are layout-equivalent.
    pub fn copy_stateful_memory_from_bank(&self, src: &Bank) -> Result<(), Error> {
        if !self.is_layout_equivalent(src) {
            return Err(BankError::LayoutMismatch.into());
        }
        if self.size == 0 {
            return Ok(());
        }
        Slab::with_both(&self.slab, &src.slab, |dst, src| {
            dst.copy_from_slice(src);
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{read_value, write_value, LockRequest};
    use serde_json::json;

    fn descriptors(raw: serde_json::Value) -> Vec<PointDescriptor> {
        serde_json::from_value(raw).unwrap()
    }

    fn fixture() -> (PointFactoryDatabase, StatefulArena, PointDatabase) {
        (
            PointFactoryDatabase::with_core_types(),
            StatefulArena::new(4096),
            PointDatabase::new(64),
        )
    }

    fn sample_bank(
        factory: &PointFactoryDatabase,
        arena: &StatefulArena,
        db: &PointDatabase,
        first_id: u32,
    ) -> Bank {
        let descs = descriptors(json!([
            { "id": first_id,     "type": "f574ca64-b5f2-41ae-bdbf-d7cb7d52aeb0", "name": "flag" },
            { "id": first_id + 1, "type": "e1b2a3c4-5d68-47f0-9a1b-8c2d3e4f5a66", "name": "count" },
            { "id": first_id + 2, "type": "708745fa-cef6-4364-abad-063a40f35cbc", "name": "temp" },
        ]));
        Bank::build(factory, &descs, IdKey::Id, true, arena, arena, db).unwrap()
    }

    #[test]
    fn bank_size_is_the_sum_of_point_sizes() {
        let (factory, arena, db) = fixture();
        let bank = sample_bank(&factory, &arena, &db, 0);
        assert_eq!(bank.point_count(), 3);
        assert_eq!(bank.stateful_allocated_size(), (2 + 1) + (2 + 4) + (2 + 4));
    }

    #[test]
    fn layout_equivalent_banks_copy_values_flags_and_locks() {
        let (factory, arena, db) = fixture();
        let a = sample_bank(&factory, &arena, &db, 0);
        let b = sample_bank(&factory, &arena, &db, 10);

        write_value(b.point_at(0).unwrap().as_ref(), true, LockRequest::Lock).unwrap();
        write_value(b.point_at(1).unwrap().as_ref(), 7u32, LockRequest::NoRequest).unwrap();
        // Third point stays invalid.

        a.copy_stateful_memory_from_bank(&b).unwrap();

        let p0 = a.point_at(0).unwrap();
        assert_eq!(read_value::<bool>(p0.as_ref()).unwrap(), Some(true));
        assert!(p0.is_locked());
        assert_eq!(
            read_value::<u32>(a.point_at(1).unwrap().as_ref()).unwrap(),
            Some(7)
        );
        assert!(a.point_at(2).unwrap().is_not_valid());
    }

    #[test]
    fn mismatched_layouts_refuse_to_copy() {
        let (factory, arena, db) = fixture();
        let a = sample_bank(&factory, &arena, &db, 0);

        let descs = descriptors(json!([
            { "id": 20, "type": "f574ca64-b5f2-41ae-bdbf-d7cb7d52aeb0" },
        ]));
        let b = Bank::build(&factory, &descs, IdKey::Id, true, &arena, &arena, &db).unwrap();

        write_value(a.point_at(1).unwrap().as_ref(), 5u32, LockRequest::NoRequest).unwrap();
        let err = a.copy_stateful_memory_from_bank(&b).unwrap_err();
        assert_eq!(err.code_name(), "LAYOUT_MISMATCH");
        // Unchanged.
        assert_eq!(
            read_value::<u32>(a.point_at(1).unwrap().as_ref()).unwrap(),
            Some(5)
        );
    }

    #[test]
    fn raw_snapshot_and_restore_round_trip() {
        let (factory, arena, db) = fixture();
        let a = sample_bank(&factory, &arena, &db, 0);
        let b = sample_bank(&factory, &arena, &db, 10);

        write_value(a.point_at(2).unwrap().as_ref(), 19.5f32, LockRequest::NoRequest).unwrap();

        let mut snapshot = vec![0u8; a.stateful_allocated_size()];
        a.copy_stateful_memory_to(&mut snapshot).unwrap();
        b.copy_stateful_memory_from(&snapshot).unwrap();
        assert_eq!(
            read_value::<f32>(b.point_at(2).unwrap().as_ref()).unwrap(),
            Some(19.5)
        );

        let mut short = vec![0u8; 3];
        assert!(a.copy_stateful_memory_to(&mut short).is_err());
    }
}
