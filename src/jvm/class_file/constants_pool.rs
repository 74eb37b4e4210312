use super::constants::*;
use crate::jvm::binary_format::{Deserialize, Serialize};
use crate::jvm::{Error, FormatError, IndexError};
use crate::util::{HolderId, InboundRefs, Offset, OffsetResult, OffsetVec, Width};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;

/// Something holding an index into the constant pool
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum ConstantHolder {
    /// Another constant in the same pool (eg. the `Class` referenced by a `MethodRef`)
    Constant(ConstantIndex),

    /// Something outside the pool (eg. an instruction operand, a field declaration)
    External(HolderId),
}

/// Class file constants pool
///
/// The pool can be read from a class file or built up incrementally, and constants can be
/// removed again. Throughout, the pool maintains the following:
///
///   - constants are interned: adding a constant structurally equal to an existing one returns
///     the existing index
///   - every index held by a constant in the pool (or by an external holder that registered
///     itself) is tracked on the constant it points to, so that a constant which is still in use
///     can't be removed
///   - removing a constant compacts the pool and renumbers every index that pointed past it
///
pub struct ConstantsPool {
    constants: OffsetVec<Constant>,

    /// Holders of each constant, in the same order as `constants`
    inbound: Vec<InboundRefs<ConstantHolder>>,

    /// Index of every distinct constant (the first one, if the pool was read with duplicates)
    interned: HashMap<Constant, ConstantIndex>,
}

impl ConstantsPool {
    /// Make a fresh empty constants pool
    pub fn new() -> ConstantsPool {
        ConstantsPool::with_capacity(0)
    }

    /// Make a fresh empty constants pool, with room for `capacity` constants
    pub fn with_capacity(capacity: usize) -> ConstantsPool {
        ConstantsPool {
            constants: OffsetVec::with_capacity_starting_at(capacity, Offset(1)),
            inbound: Vec::with_capacity(capacity),
            interned: HashMap::with_capacity(capacity),
        }
    }

    /// Number of slots in the pool, counting the unusable slot 0 and the second slot of wide
    /// constants
    ///
    /// This is the `constant_pool_count` of the class file.
    pub fn len(&self) -> usize {
        self.constants.offset_len().0
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    /// Iterate through constants in index order
    pub fn entries(&self) -> impl Iterator<Item = (ConstantIndex, &Constant)> {
        self.constants
            .iter()
            .map(|(offset, _, constant)| (ConstantIndex(offset.0 as u16), constant))
    }

    /// Find the index of a constant, if it is in the pool
    pub fn index_of(&self, constant: &Constant) -> Option<ConstantIndex> {
        self.interned.get(constant).copied()
    }

    fn lookup(&self, index: ConstantIndex) -> Result<(usize, &Constant), IndexError> {
        if index.0 == 0 {
            return Err(IndexError::ZeroConstantIndex);
        }
        match self.constants.get_offset(Offset(index.0 as usize)) {
            OffsetResult::Ok(position, constant) => Ok((position, constant)),
            OffsetResult::InvalidOffset(_) => Err(IndexError::Tombstone(index)),
            OffsetResult::TooLarge => Err(IndexError::ConstantOutOfRange {
                index,
                len: self.len(),
            }),
        }
    }

    /// Get a constant, optionally checking that it is of the expected kind
    pub fn get(
        &self,
        index: ConstantIndex,
        expected: Option<ConstantTag>,
    ) -> Result<&Constant, Error> {
        let (_, constant) = self.lookup(index)?;
        match expected {
            Some(expected) if expected != constant.tag() => Err(Error::Index(IndexError::TagMismatch {
                index,
                expected,
                found: constant.tag(),
            })),
            _ => Ok(constant),
        }
    }

    /// Get and decode a `Utf8` constant
    pub fn get_utf8(&self, index: ConstantIndex) -> Result<String, Error> {
        let constant = self.get(index, Some(ConstantTag::Utf8))?;
        match constant.utf8_str() {
            Some(string) => Ok(string),
            None => Err(Error::Format(FormatError::MalformedUtf8 { index })),
        }
    }

    /// Everything currently holding `index`
    pub fn holders(&self, index: ConstantIndex) -> Result<Vec<ConstantHolder>, Error> {
        let (position, _) = self.lookup(index)?;
        Ok(self.inbound[position].holders())
    }

    /// Record that something outside the pool holds `index`
    ///
    /// A registered constant can't be removed until every registration has been undone. If some
    /// other constant is removed, the holder is told about its index changing through the
    /// callback passed to [`ConstantsPool::remove`].
    pub fn register_external(&mut self, holder: HolderId, index: ConstantIndex) -> Result<(), Error> {
        let (position, _) = self.lookup(index)?;
        self.inbound[position].register(ConstantHolder::External(holder));
        Ok(())
    }

    /// Undo one [`ConstantsPool::register_external`]
    pub fn unregister_external(
        &mut self,
        holder: HolderId,
        index: ConstantIndex,
    ) -> Result<(), Error> {
        let (position, _) = self.lookup(index)?;
        let holder = ConstantHolder::External(holder);
        if self.inbound[position].unregister(holder) {
            Ok(())
        } else {
            Err(Error::Index(IndexError::UnregisteredConstantHolder { index, holder }))
        }
    }

    fn register(&mut self, target: ConstantIndex, holder: ConstantHolder) {
        if let Ok((position, _)) = self.lookup(target) {
            self.inbound[position].register(holder);
        }
    }

    fn unregister(&mut self, target: ConstantIndex, holder: ConstantHolder) {
        if let Ok((position, _)) = self.lookup(target) {
            self.inbound[position].unregister(holder);
        }
    }

    /// Push a constant into the constant pool, provided there is space for it
    ///
    /// Note: the largest valid index is 65535, indexing starts at 1, and some constants take two
    /// spaces.
    fn push_constant(&mut self, constant: Constant) -> Result<ConstantIndex, Error> {
        if let Constant::Utf8(bytes) = &constant {
            if bytes.len() > u16::MAX as usize {
                return Err(Error::Utf8TooLong { len: bytes.len() });
            }
        }
        let offset = self.constants.offset_len();
        if offset.0 + constant.width(offset) > u16::MAX as usize {
            return Err(Error::ConstantPoolOverflow {
                constant,
                offset: offset.0 as u16,
            });
        }

        let index = ConstantIndex(offset.0 as u16);
        self.interned.entry(constant.clone()).or_insert(index);
        self.constants.push(constant);
        self.inbound.push(InboundRefs::new());
        Ok(index)
    }

    /// Get the index of a constant, adding it to the pool if it is not there yet
    ///
    /// A newly added constant registers itself on every constant it refers to, so all of those
    /// must already be in the pool.
    pub fn intern_or_add(&mut self, constant: Constant) -> Result<ConstantIndex, Error> {
        if let Some(index) = self.interned.get(&constant) {
            return Ok(*index);
        }

        let references: Vec<ConstantIndex> = constant.references().collect();
        for target in &references {
            self.lookup(*target)?;
        }

        log::trace!("interning {:?}", constant);
        let index = self.push_constant(constant)?;
        for target in references {
            self.register(target, ConstantHolder::Constant(index));
        }
        Ok(index)
    }

    /// Remove a constant, compacting the pool
    ///
    /// If anything still holds `index`, nothing happens and the holders are returned in
    /// [`Error::ConstantStillReferenced`]. Otherwise every index past `index` shifts down by the
    /// width of the removed constant: constants in the pool are renumbered in place, and
    /// `renumber_external(holder, old, new)` is called once for each external holder of each
    /// constant that moved.
    pub fn remove(
        &mut self,
        index: ConstantIndex,
        mut renumber_external: impl FnMut(HolderId, ConstantIndex, ConstantIndex),
    ) -> Result<Constant, Error> {
        let (position, outgoing) = {
            let (position, constant) = self.lookup(index)?;
            (position, constant.references().collect::<Vec<_>>())
        };

        // The constant no longer holds anything, but still needs to be unheld itself
        let holder = ConstantHolder::Constant(index);
        for target in &outgoing {
            self.unregister(*target, holder);
        }
        if !self.inbound[position].is_empty() {
            for target in &outgoing {
                self.register(*target, holder);
            }
            let holders = self.inbound[position].holders();
            log::warn!(
                "refusing to remove constant {}, it is still held by {:?}",
                index,
                holders
            );
            return Err(Error::ConstantStillReferenced { index, holders });
        }

        let (_, removed) = self.constants.remove(position);
        self.inbound.remove(position);
        let width = removed.width(Offset(index.0 as usize)) as u16;
        let shift = |old: ConstantIndex| {
            if old > index {
                ConstantIndex(old.0 - width)
            } else {
                old
            }
        };

        // Ascending order matters: a renumbered index must never collide with a stale one
        for (_, _, constant) in self.constants.iter_mut() {
            let mut stale: Vec<ConstantIndex> =
                constant.references().filter(|held| *held > index).collect();
            stale.sort();
            stale.dedup();
            for old in stale {
                constant.renumber(old, shift(old));
            }
        }
        for holders in &mut self.inbound {
            holders.rename(|holder| match holder {
                ConstantHolder::Constant(held) => ConstantHolder::Constant(shift(held)),
                external => external,
            });
        }
        for (offset, moved, _) in self.constants.iter().skip(position) {
            let new = ConstantIndex(offset.0 as u16);
            let old = ConstantIndex(new.0 + width);
            for holder in self.inbound[moved].holders() {
                if let ConstantHolder::External(holder) = holder {
                    renumber_external(holder, old, new);
                }
            }
        }

        self.reintern();
        log::debug!(
            "removed constant {} ({:?}), pool count is now {}",
            index,
            removed.tag(),
            self.len()
        );
        Ok(removed)
    }

    /// Rebuild the interning map after indices moved around
    fn reintern(&mut self) {
        let mut interned = HashMap::with_capacity(self.constants.len());
        for (offset, _, constant) in &self.constants {
            interned
                .entry(constant.clone())
                .or_insert(ConstantIndex(offset.0 as u16));
        }
        self.interned = interned;
    }

    /// Get or insert a utf8 constant
    pub fn utf8(&mut self, utf8: &str) -> Result<ConstantIndex, Error> {
        self.intern_or_add(Constant::Utf8(encode_modified_utf8(utf8)))
    }

    pub fn integer(&mut self, integer: i32) -> Result<ConstantIndex, Error> {
        self.intern_or_add(Constant::Integer(integer))
    }

    pub fn float(&mut self, float: f32) -> Result<ConstantIndex, Error> {
        self.intern_or_add(Constant::Float(float))
    }

    pub fn long(&mut self, long: i64) -> Result<ConstantIndex, Error> {
        self.intern_or_add(Constant::Long(long))
    }

    pub fn double(&mut self, double: f64) -> Result<ConstantIndex, Error> {
        self.intern_or_add(Constant::Double(double))
    }

    /// Get or insert a class constant (from a binary name like `java/lang/Object`)
    pub fn class(&mut self, name: &str) -> Result<ConstantIndex, Error> {
        let name = self.utf8(name)?;
        self.intern_or_add(Constant::Class(name))
    }

    /// Get or insert a string constant
    pub fn string(&mut self, value: &str) -> Result<ConstantIndex, Error> {
        let value = self.utf8(value)?;
        self.intern_or_add(Constant::String(value))
    }

    pub fn method_type(&mut self, descriptor: &str) -> Result<ConstantIndex, Error> {
        let descriptor = self.utf8(descriptor)?;
        self.intern_or_add(Constant::MethodType { descriptor })
    }

    pub fn module(&mut self, name: &str) -> Result<ConstantIndex, Error> {
        let name = self.utf8(name)?;
        self.intern_or_add(Constant::Module(name))
    }

    pub fn package(&mut self, name: &str) -> Result<ConstantIndex, Error> {
        let name = self.utf8(name)?;
        self.intern_or_add(Constant::Package(name))
    }

    /// Get or insert a name & type constant
    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> Result<ConstantIndex, Error> {
        let name = self.utf8(name)?;
        let descriptor = self.utf8(descriptor)?;
        self.intern_or_add(Constant::NameAndType { name, descriptor })
    }

    fn member_parts(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<(ConstantIndex, ConstantIndex), Error> {
        let class = self.class(owner)?;
        let name_and_type = self.name_and_type(name, descriptor)?;
        Ok((class, name_and_type))
    }

    pub fn field_ref(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<ConstantIndex, Error> {
        let (class, name_and_type) = self.member_parts(owner, name, descriptor)?;
        self.intern_or_add(Constant::FieldRef {
            class,
            name_and_type,
        })
    }

    pub fn method_ref(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<ConstantIndex, Error> {
        let (class, name_and_type) = self.member_parts(owner, name, descriptor)?;
        self.intern_or_add(Constant::MethodRef {
            class,
            name_and_type,
        })
    }

    pub fn interface_method_ref(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<ConstantIndex, Error> {
        let (class, name_and_type) = self.member_parts(owner, name, descriptor)?;
        self.intern_or_add(Constant::InterfaceMethodRef {
            class,
            name_and_type,
        })
    }

    /// Get or insert a method handle for a member already in the pool
    pub fn method_handle(
        &mut self,
        handle_kind: HandleKind,
        member: ConstantIndex,
    ) -> Result<ConstantIndex, Error> {
        self.intern_or_add(Constant::MethodHandle {
            handle_kind,
            member,
        })
    }

    /// Get or insert an invoke dynamic constant
    ///
    /// `bootstrap_method` is an index into the `BootstrapMethods` attribute of the class.
    pub fn invoke_dynamic(
        &mut self,
        bootstrap_method: u16,
        name: &str,
        descriptor: &str,
    ) -> Result<ConstantIndex, Error> {
        let name_and_type = self.name_and_type(name, descriptor)?;
        self.intern_or_add(Constant::InvokeDynamic {
            bootstrap_method,
            name_and_type,
        })
    }

    /// Get or insert a dynamically-computed constant
    pub fn dynamic(
        &mut self,
        bootstrap_method: u16,
        name: &str,
        descriptor: &str,
    ) -> Result<ConstantIndex, Error> {
        let name_and_type = self.name_and_type(name, descriptor)?;
        self.intern_or_add(Constant::Dynamic {
            bootstrap_method,
            name_and_type,
        })
    }
}

impl Default for ConstantsPool {
    fn default() -> Self {
        ConstantsPool::new()
    }
}

impl std::fmt::Debug for ConstantsPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.constants, f)
    }
}

/// Constant pool count, followed by the constants
impl Serialize for ConstantsPool {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        (self.len() as u16).serialize(writer)?;
        for (_, _, constant) in &self.constants {
            constant.serialize(writer)?;
        }
        Ok(())
    }
}

impl Deserialize for ConstantsPool {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        let count = u16::deserialize(reader)?;
        if count == 0 {
            return Err(Error::Format(FormatError::InvalidConstantCount(count)));
        }

        let mut pool = ConstantsPool::with_capacity(count as usize - 1);
        while pool.len() < count as usize {
            let index = ConstantIndex(pool.len() as u16);
            let constant = Constant::read(reader, index)?;
            pool.interned.entry(constant.clone()).or_insert(index);
            pool.constants.push(constant);
            pool.inbound.push(InboundRefs::new());
        }

        // A wide constant in the last slot would have a tombstone past the end
        if pool.len() != count as usize {
            return Err(Error::Format(FormatError::InvalidConstantCount(count)));
        }

        let edges: Vec<(ConstantIndex, ConstantIndex)> = pool
            .entries()
            .flat_map(|(index, constant)| constant.references().map(move |target| (index, target)))
            .collect();
        for (index, target) in edges {
            match pool.lookup(target) {
                Ok((position, _)) => pool.inbound[position].register(ConstantHolder::Constant(index)),
                Err(_) => {
                    return Err(Error::Format(FormatError::DanglingConstantReference {
                        index,
                        target,
                    }))
                }
            }
        }

        log::debug!(
            "read constant pool with {} constants ({} slots)",
            pool.constants.len(),
            count
        );
        Ok(pool)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn write(pool: &ConstantsPool) -> Vec<u8> {
        let mut bytes = vec![];
        pool.serialize(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn interning_is_idempotent() {
        let mut pool = ConstantsPool::new();
        let first = pool.method_ref("java/lang/Object", "<init>", "()V").unwrap();
        let len = pool.len();
        let second = pool.method_ref("java/lang/Object", "<init>", "()V").unwrap();
        assert_eq!(first, second);
        assert_eq!(pool.len(), len);

        // Utf8 "java/lang/Object", Class, "<init>", "()V", NameAndType, MethodRef
        assert_eq!(pool.len(), 7);
        assert_eq!(first, ConstantIndex(6));
    }

    #[test]
    fn shared_dependencies_are_reused() {
        let mut pool = ConstantsPool::new();
        let class = pool.class("Foo").unwrap();
        let field = pool.field_ref("Foo", "x", "I").unwrap();
        match pool.get(field, Some(ConstantTag::FieldRef)).unwrap() {
            Constant::FieldRef { class: owner, .. } => assert_eq!(*owner, class),
            other => panic!("unexpected constant {:?}", other),
        }
        assert_eq!(
            pool.holders(class).unwrap(),
            vec![ConstantHolder::Constant(field)]
        );
    }

    #[test]
    fn get_checks_index_and_tag() {
        let mut pool = ConstantsPool::new();
        let long = pool.long(1).unwrap();
        let string = pool.string("hi").unwrap();
        assert_eq!(long, ConstantIndex(1));
        assert_eq!(string, ConstantIndex(4));

        assert!(matches!(
            pool.get(ConstantIndex(0), None),
            Err(Error::Index(IndexError::ZeroConstantIndex))
        ));
        assert!(matches!(
            pool.get(ConstantIndex(2), None),
            Err(Error::Index(IndexError::Tombstone(ConstantIndex(2))))
        ));
        assert!(matches!(
            pool.get(ConstantIndex(5), None),
            Err(Error::Index(IndexError::ConstantOutOfRange { .. }))
        ));
        assert!(matches!(
            pool.get(string, Some(ConstantTag::Class)),
            Err(Error::Index(IndexError::TagMismatch {
                expected: ConstantTag::Class,
                found: ConstantTag::String,
                ..
            }))
        ));
        assert_eq!(pool.get_utf8(ConstantIndex(3)).unwrap(), "hi");
    }

    #[test]
    fn adding_requires_existing_dependencies() {
        let mut pool = ConstantsPool::new();
        assert!(matches!(
            pool.intern_or_add(Constant::Class(ConstantIndex(1))),
            Err(Error::Index(IndexError::ConstantOutOfRange { .. }))
        ));
        assert!(pool.is_empty());
    }

    #[test]
    fn removing_renumbers_later_constants() {
        let mut pool = ConstantsPool::new();
        let unused = pool.utf8("unused").unwrap();
        let class = pool.class("Foo").unwrap();
        assert_eq!((unused, class), (ConstantIndex(1), ConstantIndex(3)));

        pool.remove(unused, |_, _, _| panic!("no external holders")).unwrap();
        assert_eq!(pool.len(), 3);
        assert_eq!(
            pool.get(ConstantIndex(2), None).unwrap(),
            &Constant::Class(ConstantIndex(1))
        );
        assert_eq!(
            pool.holders(ConstantIndex(1)).unwrap(),
            vec![ConstantHolder::Constant(ConstantIndex(2))]
        );
        assert_eq!(pool.class("Foo").unwrap(), ConstantIndex(2));
    }

    #[test]
    fn removing_wide_constant_shifts_by_two() {
        let mut pool = ConstantsPool::new();
        let long = pool.long(i64::MAX).unwrap();
        let string = pool.string("s").unwrap();
        assert_eq!(string, ConstantIndex(4));

        let holder = HolderId(0);
        pool.register_external(holder, string).unwrap();

        let mut notices = vec![];
        pool.remove(long, |holder, old, new| notices.push((holder, old, new)))
            .unwrap();
        assert_eq!(notices, vec![(holder, ConstantIndex(4), ConstantIndex(2))]);
        assert_eq!(pool.len(), 3);
        assert_eq!(
            pool.get(ConstantIndex(2), None).unwrap(),
            &Constant::String(ConstantIndex(1))
        );
    }

    #[test]
    fn refused_removal_leaves_pool_untouched() {
        let mut pool = ConstantsPool::new();
        let method = pool.method_ref("Foo", "bar", "()V").unwrap();
        let name_and_type = ConstantIndex(5);
        let before = write(&pool);

        match pool.remove(name_and_type, |_, _, _| ()) {
            Err(Error::ConstantStillReferenced { index, holders }) => {
                assert_eq!(index, name_and_type);
                assert_eq!(holders, vec![ConstantHolder::Constant(method)]);
            }
            other => panic!("expected refusal, got {:?}", other),
        }
        assert_eq!(write(&pool), before);

        // The removal attempt rolled back the name and type unregistering from its strings
        assert!(matches!(
            pool.remove(ConstantIndex(3), |_, _, _| ()),
            Err(Error::ConstantStillReferenced { .. })
        ));
    }

    #[test]
    fn removing_a_holder_frees_its_dependencies() {
        let mut pool = ConstantsPool::new();
        let string = pool.string("s").unwrap();
        pool.remove(string, |_, _, _| ()).unwrap();
        assert!(pool.holders(ConstantIndex(1)).unwrap().is_empty());
        pool.remove(ConstantIndex(1), |_, _, _| ()).unwrap();
        assert!(pool.is_empty());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn external_holders_block_removal() {
        let mut pool = ConstantsPool::new();
        let integer = pool.integer(42).unwrap();
        pool.register_external(HolderId(7), integer).unwrap();
        assert!(pool.remove(integer, |_, _, _| ()).is_err());

        pool.unregister_external(HolderId(7), integer).unwrap();
        assert!(matches!(
            pool.unregister_external(HolderId(7), integer),
            Err(Error::Index(IndexError::UnregisteredConstantHolder { .. }))
        ));
        assert_eq!(pool.remove(integer, |_, _, _| ()).unwrap(), Constant::Integer(42));
    }

    #[test]
    fn overflow_past_last_index() {
        let mut pool = ConstantsPool::new();
        for long in 0..32767 {
            pool.long(long).unwrap();
        }
        assert_eq!(pool.len(), 65535);
        assert!(matches!(
            pool.integer(0),
            Err(Error::ConstantPoolOverflow { offset: 65535, .. })
        ));
    }

    #[test]
    fn utf8_length_must_fit_in_two_bytes() {
        let mut pool = ConstantsPool::new();
        assert!(matches!(
            pool.utf8(&"a".repeat(70000)),
            Err(Error::Utf8TooLong { len: 70000 })
        ));
        assert!(matches!(
            pool.string(&"a".repeat(65536)),
            Err(Error::Utf8TooLong { len: 65536 })
        ));
        assert_eq!(pool.len(), 1);
        assert!(pool.index_of(&Constant::Utf8(vec![b'a'; 70000])).is_none());

        let longest = pool.utf8(&"a".repeat(65535)).unwrap();
        let bytes = write(&pool);
        assert_eq!(&bytes[..5], &[0x00, 0x02, 0x01, 0xff, 0xff]);
        assert_eq!(bytes.len(), 5 + 65535);
        let reread = ConstantsPool::deserialize(&mut bytes.as_slice()).unwrap();
        assert_eq!(reread.get_utf8(longest).unwrap().len(), 65535);
    }

    #[test]
    fn read_rejects_dangling_references() {
        // count 2, Class -> #5
        let bytes = [0, 2, 7, 0, 5];
        assert!(matches!(
            ConstantsPool::deserialize(&mut &bytes[..]),
            Err(Error::Format(FormatError::DanglingConstantReference {
                index: ConstantIndex(1),
                target: ConstantIndex(5),
            }))
        ));
    }

    #[test]
    fn read_rejects_wide_constant_in_last_slot() {
        let bytes = [0, 2, 5, 0, 0, 0, 0, 0, 0, 0, 1];
        assert!(matches!(
            ConstantsPool::deserialize(&mut &bytes[..]),
            Err(Error::Format(FormatError::InvalidConstantCount(2)))
        ));
    }

    #[test]
    fn read_keeps_duplicates() {
        // count 3, Integer 1, Integer 1
        let bytes = [0, 3, 3, 0, 0, 0, 1, 3, 0, 0, 0, 1];
        let pool = ConstantsPool::deserialize(&mut &bytes[..]).unwrap();
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.index_of(&Constant::Integer(1)), Some(ConstantIndex(1)));
        assert_eq!(write(&pool), bytes);
    }
}
