//! Inline (small-object) storage: the eligibility boundary and the
//! observable address behavior on either side of it.

use static_assertions::const_assert;
use veneer::{Call, Handle, Ref, inline_eligible, ops};
use veneer_testhelpers::setup;

const WORD: usize = size_of::<*mut ()>();

#[derive(Clone, Copy)]
struct Exact(#[allow(dead_code)] [u8; WORD]);

#[derive(Clone, Copy)]
struct Over(#[allow(dead_code)] [u8; WORD + 1]);

#[derive(Clone, Copy)]
#[repr(align(16))]
struct Overaligned(#[allow(dead_code)] u8);

// the boundary sits exactly at one pointer
const_assert!(inline_eligible::<Exact>());
const_assert!(!inline_eligible::<Over>());
const_assert!(!inline_eligible::<Overaligned>());
const_assert!(inline_eligible::<usize>());

ops! {
    pub struct Whereami: fn whereami() -> usize;
}

impl Call<Whereami> for Exact {
    fn call(&self, _args: ()) -> usize {
        self as *const Exact as usize
    }
}

impl Call<Whereami> for Over {
    fn call(&self, _args: ()) -> usize {
        self as *const Over as usize
    }
}

type Locate = (Ref<Whereami>,);

#[test]
fn inline_storage_reports_the_copy_address() {
    setup();
    let original = Exact([7; WORD]);
    let lifted = Handle::<Locate>::lift(original).unwrap();
    let seen = lifted.invoke::<Whereami, _>(());
    assert_ne!(seen, &original as *const Exact as usize);
    // the inline copy is addressed stably across invocations
    assert_eq!(lifted.invoke::<Whereami, _>(()), seen);
}

#[test]
fn borrowed_storage_reports_the_original_address() {
    setup();
    let big = Over([7; WORD + 1]);
    // one byte over the boundary: by-value lifting is refused...
    assert!(Handle::<Locate>::lift(big).is_err());
    // ...and by-reference lifting wraps the original itself
    let lifted = Handle::<Locate>::lift_ref(&big).unwrap();
    assert_eq!(lifted.invoke::<Whereami, _>(()), &big as *const Over as usize);
}

#[test]
fn small_values_may_still_be_lifted_by_reference() {
    setup();
    let small = Exact([7; WORD]);
    let lifted = Handle::<Locate>::lift_ref(&small).unwrap();
    assert_eq!(
        lifted.invoke::<Whereami, _>(()),
        &small as *const Exact as usize
    );
}

#[test]
fn storage_word_is_the_borrowed_address() {
    setup();
    let big = Over([0; WORD + 1]);
    let lifted = Handle::<Locate>::lift_ref(&big).unwrap();
    assert_eq!(lifted.storage_word(), &big as *const Over as *const ());
}

ops! {
    pub struct A: fn a() -> u16;
    pub struct B: fn b() -> u16;
}

#[derive(Clone, Copy)]
struct Packed {
    a: u16,
    b: u16,
}

impl Call<A> for Packed {
    fn call(&self, _args: ()) -> u16 {
        self.a
    }
}

impl Call<B> for Packed {
    fn call(&self, _args: ()) -> u16 {
        self.b
    }
}

#[test]
fn inline_members_are_reachable() {
    setup();
    let lifted = Handle::<(Ref<A>, Ref<B>)>::lift(Packed { a: 1, b: 2 }).unwrap();
    assert_eq!(lifted.invoke::<A, _>(()), 1);
    assert_eq!(lifted.invoke::<B, _>(()), 2);
}

#[test]
fn handle_copies_duplicate_the_inline_value() {
    setup();
    let lifted = Handle::<(Ref<A>, Ref<B>)>::lift(Packed { a: 3, b: 4 }).unwrap();
    let copy = lifted;
    assert_eq!(copy.invoke::<A, _>(()), 3);
    assert_eq!(copy.invoke::<B, _>(()), 4);
    assert_eq!(copy.storage_word(), lifted.storage_word());
}

#[test]
fn narrowing_preserves_the_inline_bits() {
    setup();
    let lifted = Handle::<(Ref<A>, Ref<B>)>::lift(Packed { a: 5, b: 6 }).unwrap();
    let only_b = lifted.narrow::<(Ref<B>,)>().unwrap();
    assert_eq!(only_b.invoke::<B, _>(()), 6);
    assert_eq!(only_b.storage_word(), lifted.storage_word());
}
