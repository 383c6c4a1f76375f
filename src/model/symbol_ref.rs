//! Arena-index indirection used by the Collector while a run is in flight.
//!
//! Per the design note on pointer-keyed collection / identity-keyed export:
//! intermediate Collector structures are keyed by `SymbolRef`, a plain
//! `u32` index into an arena, instead of by pointer or by the symbol's
//! (not-yet-final) `Identity`. Translating a `SymbolRef` to its `Identity`
//! at export time is then a `HashMap` lookup, not a re-walk of the tree.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolRef(pub u32);

/// Owns the arena and the `SymbolRef -> Identity` translation table
/// populated as symbols are admitted.
#[derive(Debug, Default)]
pub struct SymbolArena<T> {
    slots: Vec<T>,
}

impl<T> SymbolArena<T> {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn push(&mut self, value: T) -> SymbolRef {
        let idx = self.slots.len() as u32;
        self.slots.push(value);
        SymbolRef(idx)
    }

    pub fn get(&self, r: SymbolRef) -> Option<&T> {
        self.slots.get(r.0 as usize)
    }

    pub fn get_mut(&mut self, r: SymbolRef) -> Option<&mut T> {
        self.slots.get_mut(r.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolRef, &T)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, v)| (SymbolRef(i as u32), v))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_get_round_trip() {
        let mut arena: SymbolArena<&'static str> = SymbolArena::new();
        let a = arena.push("alpha");
        let b = arena.push("beta");
        assert_eq!(arena.get(a), Some(&"alpha"));
        assert_eq!(arena.get(b), Some(&"beta"));
        assert_eq!(arena.len(), 2);
    }
}
