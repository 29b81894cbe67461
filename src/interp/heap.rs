//! The heap: a linear virtual address space.
//!
//! Addresses are small positive integers counting whole cells; address 0
//! is the null pointer and is never handed out.  Every allocation (an
//! explicit `malloc`, an array declaration, or taking the address of a
//! named scalar) reserves a run of cells here.
//!
//! The `pointers` table relates an address created by `&x` back to the
//! expression node that took the address.  Assignment through a pointer
//! consults it so the owning frame's binding for `x` can be updated
//! alongside the cell; see [Environment::bin_op].
//!
//! All preconditions are enforced with assertions.  A violation means the
//! program left the supported subset or the interpreter has a bug; either
//! way there is nothing to recover.
//!
//! [Environment::bin_op]: super::env::Environment::bin_op

use crate::common::Map;
use crate::front::ExprId;

use super::Value;

pub struct Heap {
    /// Base address of every live allocation and its size in cells.
    buffers: Map<Value, Value>,
    /// Stored value of every live cell.
    cells: Map<Value, Value>,
    /// Address taken by `&x` back to the expression that took it.
    pointers: Map<Value, ExprId>,
    /// Smallest address never yet allocated.
    next: Value,
}

impl Heap {
    pub fn new() -> Self {
        Heap {
            buffers: Map::new(),
            cells: Map::new(),
            pointers: Map::new(),
            next: 1,
        }
    }

    /// Reserve `size` consecutive zeroed cells and return the base address.
    /// A zero-size allocation returns the current watermark without
    /// reserving anything; a successful call never returns null.
    pub fn alloc(&mut self, size: Value) -> Value {
        assert!(size >= 0, "allocation of negative size {size}");
        let base = self.next;
        self.next += size;
        self.buffers.insert(base, size);
        for addr in base..base + size {
            self.cells.insert(addr, 0);
        }
        base
    }

    /// Release the allocation based at `addr`.  Freeing null is a no-op;
    /// freeing anything that is not a live base is a bug.  Releasing the
    /// newest allocation lowers the watermark so the space is reused;
    /// holes in the middle are not coalesced.
    pub fn free(&mut self, addr: Value) {
        if addr == 0 {
            return;
        }
        let size = self
            .buffers
            .remove(&addr)
            .unwrap_or_else(|| panic!("free of unallocated address {addr}"));
        for a in addr..addr + size {
            self.cells.remove(&a);
        }
        if addr + size == self.next {
            self.next = addr;
        }
    }

    /// Read the cell at `addr`, which must be live.
    pub fn load(&self, addr: Value) -> Value {
        *self
            .cells
            .get(&addr)
            .unwrap_or_else(|| panic!("load from unmapped address {addr}"))
    }

    /// Write the cell at `addr`, which must be live.
    pub fn store(&mut self, addr: Value, value: Value) {
        let cell = self
            .cells
            .get_mut(&addr)
            .unwrap_or_else(|| panic!("store to unmapped address {addr}"));
        *cell = value;
    }

    /// The address backing `&x` for the given variable-use expression.
    /// The first evaluation allocates one cell holding the variable's
    /// current value and records the back-reference; later evaluations of
    /// the same node return the same address without re-storing.
    pub fn address_of(&mut self, expr: ExprId, current: Value) -> Value {
        // The table stays small enough that a scan beats keeping a second
        // index in sync.
        if let Some((&addr, _)) = self.pointers.iter().find(|(_, &e)| e == expr) {
            return addr;
        }
        let addr = self.alloc(1);
        self.store(addr, current);
        self.pointers.insert(addr, expr);
        addr
    }

    /// The expression whose `&` produced `addr`, if any.  Writes through
    /// such an address must also update the named variable it shadows.
    pub fn back_ref(&self, addr: Value) -> Option<ExprId> {
        self.pointers.get(&addr).copied()
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}
