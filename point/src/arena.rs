use foxtail_error::{Error, PointError};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// Budgeted allocator for point stateful memory.
///
/// An arena never frees individual allocations; its whole budget drops with
/// the owning Node. Slabs handed out by one arena are independently locked,
/// so two banks in the same arena never contend except when copying between
/// each other.
pub struct StatefulArena {
    capacity: usize,
    used: Mutex<usize>,
}

impl StatefulArena {
    pub fn new(capacity: usize) -> Self {
        StatefulArena {
            capacity,
            used: Mutex::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes handed out so far.
    pub fn allocated(&self) -> usize {
        *self.used.lock()
    }

    /// Carve a zero-initialized contiguous slab out of the arena budget.
    pub fn allocate_slab(&self, size: usize) -> Result<Slab, Error> {
        let mut used = self.used.lock();
        let new_used = *used + size;
        if new_used > self.capacity {
            return Err(PointError::OutOfStatefulMemory.into());
        }
        *used = new_used;
        Ok(Slab::new(size))
    }
}

/// A contiguous, mutex-guarded byte region owning point stateful memory.
#[derive(Clone, Debug)]
pub struct Slab {
    mem: Arc<Mutex<Box<[u8]>>>,
    len: usize,
}

impl Slab {
    fn new(len: usize) -> Self {
        Slab {
            mem: Arc::new(Mutex::new(vec![0u8; len].into_boxed_slice())),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn lock(&self) -> MutexGuard<'_, Box<[u8]>> {
        self.mem.lock()
    }

    fn same_memory(&self, other: &Slab) -> bool {
        Arc::ptr_eq(&self.mem, &other.mem)
    }

    /// Run `f` with both slabs locked. Lock order is by allocation address
    /// so concurrent opposite-direction copies cannot deadlock.
    pub fn with_both<R>(a: &Slab, b: &Slab, f: impl FnOnce(&mut [u8], &mut [u8]) -> R) -> R {
        assert!(
            !a.same_memory(b),
            "with_both requires two distinct slabs"
        );
        if Arc::as_ptr(&a.mem) < Arc::as_ptr(&b.mem) {
            let mut ga = a.lock();
            let mut gb = b.lock();
            f(&mut ga, &mut gb)
        } else {
            let mut gb = b.lock();
            let mut ga = a.lock();
            f(&mut ga, &mut gb)
        }
    }
}

/// One point's stateful region inside a slab.
#[derive(Clone)]
pub struct Slot {
    slab: Slab,
    offset: usize,
    len: usize,
}

impl Slot {
    pub fn new(slab: Slab, offset: usize, len: usize) -> Self {
        debug_assert!(offset + len <= slab.len());
        Slot { slab, offset, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Run `f` over the slot's bytes with the slab locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let mut mem = self.slab.lock();
        f(&mut mem[self.offset..self.offset + self.len])
    }

    /// Run `f` over this slot's bytes and another point's bytes. The other
    /// slot may live in the same slab or a different one.
    pub fn with_pair<R>(&self, other: &Slot, f: impl FnOnce(&mut [u8], &[u8]) -> R) -> R {
        if self.slab.same_memory(&other.slab) {
            let mut mem = self.slab.lock();
            // Slots within one slab never overlap.
            let (dst, src) = split_disjoint(&mut mem, self.offset, self.len, other.offset, other.len);
            f(dst, src)
        } else {
            Slab::with_both(&self.slab, &other.slab, |a, b| {
                f(
                    &mut a[self.offset..self.offset + self.len],
                    &b[other.offset..other.offset + other.len],
                )
            })
        }
    }
}

/// Where a new point's stateful slot comes from: its own slab carved out of
/// an arena, or a region inside a bank's existing slab.
pub enum StatefulAlloc<'a> {
    Arena(&'a StatefulArena),
    Slab { slab: &'a Slab, offset: usize },
}

impl StatefulAlloc<'_> {
    pub fn slot(&self, size: usize) -> Result<Slot, Error> {
        match self {
            StatefulAlloc::Arena(arena) => Ok(Slot::new(arena.allocate_slab(size)?, 0, size)),
            StatefulAlloc::Slab { slab, offset } => {
                if offset + size > slab.len() {
                    return Err(foxtail_error::BankError::SlabExhausted.into());
                }
                Ok(Slot::new((*slab).clone(), *offset, size))
            }
        }
    }
}

fn split_disjoint(
    mem: &mut [u8],
    a_off: usize,
    a_len: usize,
    b_off: usize,
    b_len: usize,
) -> (&mut [u8], &mut [u8]) {
    if a_off < b_off {
        let (head, tail) = mem.split_at_mut(b_off);
        (&mut head[a_off..a_off + a_len], &mut tail[..b_len])
    } else {
        let (head, tail) = mem.split_at_mut(a_off);
        (&mut tail[..a_len], &mut head[b_off..b_off + b_len])
    }
}
