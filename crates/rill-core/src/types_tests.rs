use crate::{HostTypeId, PrimitiveKind, Ty};

#[test]
fn kind_index_matches_all_order() {
    for (i, kind) in PrimitiveKind::ALL.iter().enumerate() {
        assert_eq!(kind.index(), i);
    }
}

#[test]
fn char_is_unsigned_integral() {
    let c = PrimitiveKind::Char;
    assert!(c.is_integral());
    assert!(c.is_unsigned());
    assert!(c.is_numeric());
    assert!(!c.is_real());
}

#[test]
fn boolean_is_not_numeric() {
    assert!(!PrimitiveKind::Boolean.is_numeric());
    assert!(!PrimitiveKind::Boolean.is_integral());
    assert!(!Ty::BOOL.is_numeric());
    assert!(Ty::BOOL.is_bool());
}

#[test]
fn display_renders_arrays_and_hosts() {
    let ty = Ty::array_of(Ty::array_of(Ty::I32));
    assert_eq!(ty.to_string(), "Int32[][]");
    assert_eq!(Ty::Host(HostTypeId(3)).to_string(), "#3");
    assert_eq!(Ty::Null.to_string(), "null");
}

#[test]
fn array_element_unwraps_one_level() {
    let ty = Ty::array_of(Ty::String);
    assert_eq!(ty.array_element(), Some(&Ty::String));
    assert_eq!(Ty::String.array_element(), None);
}

#[test]
fn bit_widths() {
    assert_eq!(PrimitiveKind::Char.bit_width(), 16);
    assert_eq!(PrimitiveKind::Single.bit_width(), 32);
    assert_eq!(PrimitiveKind::UInt64.bit_width(), 64);
}
