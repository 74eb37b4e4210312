use std::collections::BTreeMap;
use std::fmt;

/// Opaque identity of something outside a table that holds an index into it
///
/// Tables never dereference these: they only store them so that they can report who would be
/// left dangling by a removal, and tell the owner when one of its indices gets renumbered.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct HolderId(pub u32);

impl fmt::Debug for HolderId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_fmt(format_args!("h{}", self.0))
    }
}

/// Holders registered on one slot of a table (a constant, an instruction)
///
/// This is a multiset: the same holder may point at a slot more than once (eg. a
/// `NameAndType` whose name and descriptor are the same `Utf8`, or a `tableswitch` with several
/// cases sharing a target) and each registration has to be undone separately. Iteration order is
/// the holder order, so error reports are deterministic.
#[derive(Clone, PartialEq, Eq)]
pub struct InboundRefs<H: Ord> {
    counts: BTreeMap<H, usize>,
}

impl<H: Ord + Copy> InboundRefs<H> {
    pub fn new() -> InboundRefs<H> {
        InboundRefs {
            counts: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, holder: H) {
        *self.counts.entry(holder).or_insert(0) += 1;
    }

    /// Undo one registration of `holder`, returning whether there was one to undo
    pub fn unregister(&mut self, holder: H) -> bool {
        match self.counts.get_mut(&holder) {
            None => false,
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.counts.remove(&holder);
                true
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn contains(&self, holder: H) -> bool {
        self.counts.contains_key(&holder)
    }

    /// Distinct holders, in order
    pub fn holders(&self) -> Vec<H> {
        self.counts.keys().copied().collect()
    }

    /// Rewrite the identity of the holders (eg. after the table containing them was reindexed)
    pub fn rename(&mut self, mut rename: impl FnMut(H) -> H) {
        let counts = std::mem::take(&mut self.counts);
        for (holder, count) in counts {
            *self.counts.entry(rename(holder)).or_insert(0) += count;
        }
    }
}

impl<H: Ord + Copy> Default for InboundRefs<H> {
    fn default() -> Self {
        InboundRefs::new()
    }
}

impl<H: Ord + fmt::Debug> fmt::Debug for InboundRefs<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for (holder, count) in &self.counts {
            for _ in 0..*count {
                set.entry(holder);
            }
        }
        set.finish()
    }
}

/// Generates fresh holder identities
#[derive(Clone, Debug)]
pub struct HolderIdGenerator(u32);

impl HolderIdGenerator {
    pub fn new() -> HolderIdGenerator {
        HolderIdGenerator(0)
    }

    pub fn fresh(&mut self) -> HolderId {
        let to_return = HolderId(self.0);
        self.0 += 1;
        to_return
    }
}

impl Default for HolderIdGenerator {
    fn default() -> Self {
        HolderIdGenerator::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn registrations_are_counted() {
        let mut refs: InboundRefs<HolderId> = InboundRefs::new();
        refs.register(HolderId(3));
        refs.register(HolderId(3));
        refs.register(HolderId(1));
        assert_eq!(refs.holders(), vec![HolderId(1), HolderId(3)]);

        assert!(refs.unregister(HolderId(3)));
        assert!(refs.contains(HolderId(3)));
        assert!(refs.unregister(HolderId(3)));
        assert!(!refs.contains(HolderId(3)));
        assert!(!refs.unregister(HolderId(3)));

        assert!(refs.unregister(HolderId(1)));
        assert!(refs.is_empty());
    }

    #[test]
    fn rename_merges_collisions() {
        let mut refs: InboundRefs<u16> = InboundRefs::new();
        refs.register(4);
        refs.register(5);
        refs.rename(|h| if h > 4 { h - 1 } else { h });
        assert_eq!(refs.holders(), vec![4]);
        assert!(refs.unregister(4));
        assert!(refs.unregister(4));
        assert!(refs.is_empty());
    }

    #[test]
    fn fresh_holders_are_distinct() {
        let mut generator = HolderIdGenerator::new();
        let first = generator.fresh();
        let second = generator.fresh();
        assert_ne!(first, second);
    }
}
