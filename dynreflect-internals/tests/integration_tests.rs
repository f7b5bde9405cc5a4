//! Integration tests for the dynreflect-internals crate.
//!
//! ## Storage Tests
//! - `test_storage_selection`: Small values go inline, large and
//!   over-aligned values go to the heap
//! - `test_empty_and_void_states`: The two payload-less states
//! - `test_downcasting`: Checked and unchecked typed access
//!
//! ## Ownership Tests
//! - `test_clone_and_drop_behavior`: Payloads are cloned deeply and dropped
//!   exactly once, inline and boxed
//! - `test_take_leaves_source_empty`: Moving out of a value
//! - `test_downcast_into_does_not_drop_payload`: Extracting the payload
//!   transfers ownership instead of dropping
//!
//! ## Reference Tests
//! - `test_shared_reference`: Null, copy semantics and cloning out
//! - `test_exclusive_reference`: Writing through, reborrowing and cloning out
//! - `test_references_into_values`: References borrowed from stored payloads
//! - `test_interior_mutability_through_references`: `Cell` and `RefCell`
//!   payloads mutated through shared references, inline and boxed

use std::{
    any::TypeId,
    cell::{Cell, RefCell},
    rc::Rc,
};

use dynreflect_internals::{INLINE_CAPACITY, RawValue, RawValueMut, RawValueRef, fits_inline};

static_assertions::assert_not_impl_any!(RawValue: Send, Sync);
static_assertions::assert_impl_all!(RawValueRef<'static>: Copy);

#[derive(Clone, Debug, PartialEq)]
struct Large([u64; 8]);

#[derive(Clone, Debug, PartialEq)]
#[repr(align(32))]
struct OverAligned(u8);

/// Records clones and drops in a shared log.
///
/// Small enough to be stored inline.
#[derive(Debug)]
struct DropCounter {
    name: &'static str,
    generation: u8,
    log: Rc<RefCell<Vec<String>>>,
}

impl DropCounter {
    fn new(name: &'static str, log: Rc<RefCell<Vec<String>>>) -> Self {
        Self {
            name,
            generation: 0,
            log,
        }
    }
}

impl Clone for DropCounter {
    fn clone(&self) -> Self {
        self.log.borrow_mut().push(format!("Cloned: {}", self.name));
        Self {
            name: self.name,
            generation: self.generation + 1,
            log: self.log.clone(),
        }
    }
}

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.log
            .borrow_mut()
            .push(format!("Dropped: {}#{}", self.name, self.generation));
    }
}

#[derive(Clone, Debug)]
struct BigDropCounter {
    inner: DropCounter,
    _bytes: [u64; 8],
}

#[test]
fn test_storage_selection() {
    assert!(fits_inline::<u8>());
    assert!(fits_inline::<u128>());
    assert!(fits_inline::<String>());
    assert!(fits_inline::<[u8; INLINE_CAPACITY]>());
    assert!(!fits_inline::<[u8; INLINE_CAPACITY + 1]>());
    assert!(!fits_inline::<Large>());
    assert!(!fits_inline::<OverAligned>());

    let small = RawValue::new(7u32);
    assert!(small.has_value());
    assert!(!small.is_heap());
    assert_eq!(small.payload_size(), Some(4));

    let large = RawValue::new(Large([3; 8]));
    assert!(large.has_value());
    assert!(large.is_heap());
    assert_eq!(large.payload_size(), Some(64));
    assert_eq!(large.downcast_ref::<Large>(), Some(&Large([3; 8])));

    let aligned = RawValue::new(OverAligned(9));
    assert!(aligned.is_heap());
    assert_eq!(aligned.downcast_ref::<OverAligned>(), Some(&OverAligned(9)));
}

#[test]
fn test_empty_and_void_states() {
    let empty = RawValue::empty();
    assert!(!empty.has_value());
    assert!(!empty.is_void());
    assert_eq!(empty.type_id(), None);
    assert_eq!(empty.type_name(), None);
    assert_eq!(format!("{empty:?}"), "RawValue(empty)");

    let void = RawValue::void();
    assert!(!void.has_value());
    assert!(void.is_void());
    assert_eq!(void.type_id(), None);
    assert_eq!(format!("{void:?}"), "RawValue(void)");

    assert!(RawValue::default().clone().type_id().is_none());
    assert!(void.clone().is_void());
}

#[test]
fn test_downcasting() {
    let mut value = RawValue::new(String::from("hello"));
    assert_eq!(value.type_id(), Some(TypeId::of::<String>()));
    assert!(value.is::<String>());
    assert!(!value.is::<&str>());
    assert_eq!(value.downcast_ref::<u32>(), None);

    value.downcast_mut::<String>().unwrap().push_str(", world");
    // SAFETY: The payload is a `String`.
    let text = unsafe { value.downcast_ref_unchecked::<String>() };
    assert_eq!(text, "hello, world");

    let value = value.downcast_into::<u32>().unwrap_err();
    assert_eq!(value.downcast_into::<String>().unwrap(), "hello, world");
}

#[test]
fn test_clone_and_drop_behavior() {
    let log = Rc::new(RefCell::new(Vec::<String>::new()));

    {
        let value = RawValue::new(DropCounter::new("inline", log.clone()));
        assert!(!value.is_heap());
        let copy = value.clone();
        assert_eq!(copy.downcast_ref::<DropCounter>().unwrap().generation, 1);
        drop(value);
        assert_eq!(log.borrow().last().unwrap(), "Dropped: inline#0");
    }
    assert_eq!(
        *log.borrow(),
        ["Cloned: inline", "Dropped: inline#0", "Dropped: inline#1"]
    );

    log.borrow_mut().clear();
    {
        let value = RawValue::new(BigDropCounter {
            inner: DropCounter::new("boxed", log.clone()),
            _bytes: [0; 8],
        });
        assert!(value.is_heap());
        let _copy = value.clone();
    }
    let drops = log
        .borrow()
        .iter()
        .filter(|entry| entry.starts_with("Dropped"))
        .count();
    assert_eq!(drops, 2);
}

#[test]
fn test_take_leaves_source_empty() {
    let log = Rc::new(RefCell::new(Vec::<String>::new()));
    let mut value = RawValue::new(DropCounter::new("moved", log.clone()));

    let moved = value.take();
    assert!(!value.has_value());
    assert!(moved.is::<DropCounter>());
    assert!(log.borrow().is_empty());

    drop(value);
    assert!(log.borrow().is_empty());
    drop(moved);
    assert_eq!(*log.borrow(), ["Dropped: moved#0"]);
}

#[test]
fn test_downcast_into_does_not_drop_payload() {
    let log = Rc::new(RefCell::new(Vec::<String>::new()));

    let value = RawValue::new(DropCounter::new("owned", log.clone()));
    let counter = value.downcast_into::<DropCounter>().unwrap();
    assert!(log.borrow().is_empty());
    drop(counter);
    assert_eq!(*log.borrow(), ["Dropped: owned#0"]);

    log.borrow_mut().clear();
    let value = RawValue::new(BigDropCounter {
        inner: DropCounter::new("big", log.clone()),
        _bytes: [1; 8],
    });
    assert!(value.is_heap());
    // SAFETY: The payload is a `BigDropCounter`.
    let big = unsafe { value.into_inner_unchecked::<BigDropCounter>() };
    assert!(log.borrow().is_empty());
    drop(big);
    assert_eq!(*log.borrow(), ["Dropped: big#0"]);
}

#[test]
fn test_shared_reference() {
    let null = RawValueRef::null();
    assert!(!null.has_reference());
    assert_eq!(null.type_id(), None);
    assert_eq!(null.addr(), None);
    assert!(!null.to_value().has_value());

    let number = 12i64;
    let reference = RawValueRef::new(&number);
    let copy = reference;
    assert_eq!(copy.addr(), reference.addr());
    assert_eq!(reference.type_name(), Some("i64"));
    assert_eq!(reference.downcast_ref::<i64>(), Some(&12));
    assert_eq!(reference.downcast_ref::<i32>(), None);
    // SAFETY: The referent is an `i64`.
    assert_eq!(unsafe { reference.downcast_ref_unchecked::<i64>() }, &12);

    let cloned = reference.to_value();
    assert_eq!(cloned.downcast_ref::<i64>(), Some(&12));
}

#[test]
fn test_exclusive_reference() {
    let mut text = String::from("a");
    {
        let mut reference = RawValueMut::new(&mut text);
        assert!(reference.has_reference());
        assert_eq!(reference.type_id(), Some(TypeId::of::<String>()));
        reference.reborrow().downcast_mut::<String>().unwrap().push('b');
        assert_eq!(reference.as_ref().downcast_ref::<String>().unwrap(), "ab");
        assert_eq!(reference.to_value().downcast_ref::<String>().unwrap(), "ab");
        reference.into_mut::<String>().unwrap().push('c');
    }
    assert_eq!(text, "abc");

    let mut null = RawValueMut::null();
    assert!(!null.has_reference());
    assert!(null.downcast_mut::<String>().is_none());
    assert!(null.into_mut::<String>().is_none());
}

#[test]
fn test_references_into_values() {
    let mut value = RawValue::new(Large([1; 8]));
    value
        .as_value_mut()
        .downcast_mut::<Large>()
        .unwrap()
        .0[0] = 5;

    let reference = value.as_value_ref();
    assert_eq!(reference.downcast_ref::<Large>().unwrap().0[0], 5);
    assert_eq!(reference.to_value().downcast_ref::<Large>().unwrap().0[0], 5);

    let empty = RawValue::empty();
    assert!(!empty.as_value_ref().has_reference());
}

#[test]
fn test_interior_mutability_through_references() {
    let counter = RawValue::new(Cell::new(0u64));
    assert!(!counter.is_heap());
    let reference = counter.as_value_ref();
    for _ in 0..3 {
        let cell = reference.downcast_ref::<Cell<u64>>().unwrap();
        cell.set(cell.get() + 1);
    }
    assert_eq!(counter.downcast_ref::<Cell<u64>>().unwrap().get(), 3);

    let names = RawValue::new(RefCell::new(vec![String::from("a")]));
    assert!(!names.is_heap());
    names
        .downcast_ref::<RefCell<Vec<String>>>()
        .unwrap()
        .borrow_mut()
        .push(String::from("b"));
    assert_eq!(names.downcast_ref::<RefCell<Vec<String>>>().unwrap().borrow().len(), 2);

    let boxed = RawValue::new(RefCell::new([0u64; 8]));
    assert!(boxed.is_heap());
    boxed.as_value_ref().downcast_ref::<RefCell<[u64; 8]>>().unwrap().borrow_mut()[7] = 9;
    assert_eq!(boxed.downcast_ref::<RefCell<[u64; 8]>>().unwrap().borrow()[7], 9);
}
