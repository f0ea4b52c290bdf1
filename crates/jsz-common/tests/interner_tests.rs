use super::*;

#[test]
fn intern_dedupes() {
    let interner = Interner::new();
    let a = interner.intern("foo");
    let b = interner.intern("foo");
    let c = interner.intern("bar");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(interner.len(), 2);
}

#[test]
fn resolve_round_trips() {
    let interner = Interner::new();
    let a = interner.intern("x.y.z");
    assert_eq!(&*interner.resolve(a), "x.y.z");
}

#[test]
fn none_sentinel_is_not_a_real_atom() {
    let interner = Interner::new();
    let a = interner.intern("anything");
    assert_ne!(a, Atom::NONE);
    assert_eq!(&*interner.resolve(Atom::NONE), "");
}
