//! Schema descriptions of Rust types.

use crate::schema::TypeDef;

/// A Rust type with a fixed fracpack description.
///
/// ```
/// use fracpack::{ToTypeDef, TypeDef};
///
/// assert_eq!(
///     <Vec<Option<u16>>>::type_def(),
///     TypeDef::list(TypeDef::option(TypeDef::u16()))
/// );
/// ```
pub trait ToTypeDef {
    fn type_def() -> TypeDef;
}

macro_rules! int_type_def {
    ($($t:ty => $bits:expr, $signed:expr;)*) => {
        $(
            impl ToTypeDef for $t {
                fn type_def() -> TypeDef {
                    TypeDef::int($bits, $signed)
                }
            }
        )*
    };
}

int_type_def! {
    u8 => 8, false;
    u16 => 16, false;
    u32 => 32, false;
    u64 => 64, false;
    i8 => 8, true;
    i16 => 16, true;
    i32 => 32, true;
    i64 => 64, true;
}

impl ToTypeDef for f32 {
    fn type_def() -> TypeDef {
        TypeDef::f32()
    }
}

impl ToTypeDef for f64 {
    fn type_def() -> TypeDef {
        TypeDef::f64()
    }
}

impl ToTypeDef for bool {
    fn type_def() -> TypeDef {
        TypeDef::bool()
    }
}

impl ToTypeDef for String {
    fn type_def() -> TypeDef {
        TypeDef::string()
    }
}

impl ToTypeDef for str {
    fn type_def() -> TypeDef {
        TypeDef::string()
    }
}

impl<T: ToTypeDef> ToTypeDef for Vec<T> {
    fn type_def() -> TypeDef {
        TypeDef::list(T::type_def())
    }
}

impl<T: ToTypeDef> ToTypeDef for Option<T> {
    fn type_def() -> TypeDef {
        TypeDef::option(T::type_def())
    }
}

impl<T: ToTypeDef, const N: usize> ToTypeDef for [T; N] {
    fn type_def() -> TypeDef {
        TypeDef::array(T::type_def(), N as u64)
    }
}

impl<T: ToTypeDef + ?Sized> ToTypeDef for Box<T> {
    fn type_def() -> TypeDef {
        T::type_def()
    }
}

macro_rules! tuple_type_def {
    ($($name:ident)+) => {
        impl<$($name: ToTypeDef),+> ToTypeDef for ($($name,)+) {
            fn type_def() -> TypeDef {
                TypeDef::tuple([$($name::type_def()),+])
            }
        }
    };
}

tuple_type_def!(A);
tuple_type_def!(A B);
tuple_type_def!(A B C);
tuple_type_def!(A B C D);
tuple_type_def!(A B C D E);
tuple_type_def!(A B C D E F);
tuple_type_def!(A B C D E F G);
tuple_type_def!(A B C D E F G H);
