//! Table index newtypes.

/// Index into the constant pool.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(transparent)]
pub struct ConstId(pub u16);

/// Index into the type table.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(transparent)]
pub struct TypeRef(pub u16);

/// Index into the member table.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(transparent)]
pub struct MemberId(pub u16);

/// Local slot, valid for one evaluation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(transparent)]
pub struct LocalId(pub u16);

/// Index into the variable table.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(transparent)]
pub struct VariableId(pub u16);

macro_rules! impl_index {
    ($($name:ident),*) => {
        $(
            impl $name {
                #[inline]
                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

impl_index!(ConstId, TypeRef, MemberId, LocalId, VariableId);
