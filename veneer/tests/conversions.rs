//! Conversion semantics: structural sharing for contiguous sub-signatures,
//! adapter synthesis for everything else.

use veneer::{Call, CallMut, Handle, Mut, Ref, Trampoline, ops};
use veneer_testhelpers::setup;

ops! {
    pub struct F: fn f() -> i32;
    pub struct G: fn g() -> i32;
    pub struct H: fn h() -> i32;
}

type Fgh = (Ref<F>, Ref<G>, Ref<H>);
type Fg = (Ref<F>, Ref<G>);
type Gh = (Ref<G>, Ref<H>);
type Gf = (Ref<G>, Ref<F>);
type Fh = (Ref<F>, Ref<H>);
type FOnly = (Ref<F>,);
type GOnly = (Ref<G>,);

struct Flat;

impl Call<F> for Flat {
    fn call(&self, _args: ()) -> i32 {
        1
    }
}

impl Call<G> for Flat {
    fn call(&self, _args: ()) -> i32 {
        2
    }
}

impl Call<H> for Flat {
    fn call(&self, _args: ()) -> i32 {
        3
    }
}

fn addr(entry: Trampoline) -> usize {
    entry as usize
}

#[test]
fn equal_signatures_share_storage_and_table() {
    setup();
    let flat = Flat;
    let source = Handle::<Fgh>::lift_ref(&flat).unwrap();
    let copied = source.narrow::<Fgh>().unwrap();
    assert_eq!(copied.table_ptr(), source.table_ptr());
    assert_eq!(copied.storage_word(), source.storage_word());
    assert_eq!(copied.invoke::<G, _>(()), 2);
}

#[test]
fn prefix_shares_the_table_base() {
    setup();
    let flat = Flat;
    let source = Handle::<Fgh>::lift_ref(&flat).unwrap();
    let prefix = source.narrow::<Fg>().unwrap();
    assert_eq!(prefix.table_ptr(), source.table_ptr());
    assert_eq!(prefix.storage_word(), source.storage_word());
    assert_eq!(prefix.invoke::<F, _>(()), 1);
    assert_eq!(prefix.invoke::<G, _>(()), 2);
}

#[test]
fn suffix_shares_at_an_offset() {
    setup();
    let flat = Flat;
    let source = Handle::<Fgh>::lift_ref(&flat).unwrap();
    let suffix = source.narrow::<Gh>().unwrap();
    let base = source.table_ptr().unwrap();
    assert_eq!(suffix.table_ptr().unwrap(), base.wrapping_add(1));
    assert_eq!(suffix.storage_word(), source.storage_word());
    assert_eq!(suffix.invoke::<G, _>(()), 2);
    assert_eq!(suffix.invoke::<H, _>(()), 3);
}

#[test]
fn single_operation_targets_embed_the_matched_entry() {
    setup();
    let flat = Flat;
    let source = Handle::<Fgh>::lift_ref(&flat).unwrap();
    let first = source.narrow::<FOnly>().unwrap();
    let second = source.narrow::<GOnly>().unwrap();

    // the entry is held by value, not behind the source's table reference
    assert_eq!(first.table_ptr(), None);
    assert_eq!(second.table_ptr(), None);
    assert_eq!(addr(first.entry(0)), addr(source.entry(0)));
    assert_eq!(addr(second.entry(0)), addr(source.entry(1)));

    // storage is still shared
    assert_eq!(first.storage_word(), source.storage_word());
    assert_eq!(second.storage_word(), source.storage_word());
    assert_eq!(first.invoke::<F, _>(()), 1);
    assert_eq!(second.invoke::<G, _>(()), 2);
}

#[test]
fn reordered_targets_do_not_share() {
    setup();
    let flat = Flat;
    let source = Handle::<Fgh>::lift_ref(&flat).unwrap();
    assert!(source.narrow::<Gf>().is_none());
}

#[test]
fn reordered_targets_convert_through_an_adapter() {
    setup();
    let flat = Flat;
    let source = Handle::<Fgh>::lift_ref(&flat).unwrap();
    let adapted = source.convert::<Gf>().unwrap();
    assert_ne!(adapted.table_ptr(), source.table_ptr());
    // the adapter wraps the handle, not the object
    assert_ne!(adapted.storage_word(), source.storage_word());
    assert_eq!(adapted.invoke::<G, _>(()), 2);
    assert_eq!(adapted.invoke::<F, _>(()), 1);
}

#[test]
fn gapped_targets_convert_through_an_adapter() {
    setup();
    let flat = Flat;
    let source = Handle::<Fgh>::lift_ref(&flat).unwrap();
    assert!(source.narrow::<Fh>().is_none());
    let adapted = source.convert::<Fh>().unwrap();
    assert_ne!(adapted.table_ptr(), source.table_ptr());
    assert_eq!(adapted.invoke::<F, _>(()), 1);
    assert_eq!(adapted.invoke::<H, _>(()), 3);
}

#[test]
fn contiguous_targets_convert_by_sharing() {
    setup();
    let flat = Flat;
    let source = Handle::<Fgh>::lift_ref(&flat).unwrap();
    let converted = source.convert::<Gh>().unwrap();
    assert_eq!(
        converted.table_ptr().unwrap(),
        source.table_ptr().unwrap().wrapping_add(1)
    );
    assert_eq!(converted.storage_word(), source.storage_word());
}

ops! {
    pub struct F2: fn f() -> i32;
}

#[test]
fn structural_equality_ignores_marker_identity() {
    setup();
    let flat = Flat;
    let source = Handle::<Fgh>::lift_ref(&flat).unwrap();
    // F2 describes the same operation as F; the narrowed handle binds the
    // same entry even though the marker type differs.
    let renamed = source.narrow::<(Ref<F2>,)>().unwrap();
    assert_eq!(addr(renamed.entry(0)), addr(source.entry(0)));
    assert_eq!(renamed.invoke::<F2, _>(()), 1);
}

ops! {
    pub struct Next: mut fn next() -> i32;
}

struct Counter {
    n: i32,
}

impl CallMut<Next> for Counter {
    fn call_mut(&mut self, _args: ()) -> i32 {
        self.n += 1;
        self.n
    }
}

type Counting = (Mut<Next>,);

#[test]
fn nested_equal_conversions_preserve_reference_semantics() {
    setup();
    let mut counter = Counter { n: 0 };
    let mut first = Handle::<Counting>::lift_mut(&mut counter).unwrap();
    assert_eq!(first.invoke_mut::<Next, _>(()), 1);
    let mut second = first.narrow::<Counting>().unwrap();
    assert_eq!(second.invoke_mut::<Next, _>(()), 2);
    let mut third = second.narrow::<Counting>().unwrap();
    assert_eq!(third.invoke_mut::<Next, _>(()), 3);
}

ops! {
    pub struct Peek: fn peek() -> i32;
}

impl Call<Peek> for Counter {
    fn call(&self, _args: ()) -> i32 {
        self.n
    }
}

#[test]
fn adapters_forward_exclusive_operations_to_the_source() {
    setup();
    let mut counter = Counter { n: 0 };
    let mut source = Handle::<(Mut<Next>, Ref<Peek>)>::lift_mut(&mut counter).unwrap();
    {
        let mut adapted = source.convert::<(Ref<Peek>, Mut<Next>)>().unwrap();
        assert_eq!(adapted.invoke_mut::<Next, _>(()), 1);
        assert_eq!(adapted.invoke::<Peek, _>(()), 1);
    }
    assert_eq!(source.invoke_mut::<Next, _>(()), 2);
}
