use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet, VecDeque};
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;
use core::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

use crate::{Bindable, DynamicDef, OptionDef, ScalarType, Shape, shape_of};

macro_rules! impl_scalar {
    ($($ty:ty => $scalar:ident),* $(,)?) => {
        $(
            impl Bindable for $ty {
                const SHAPE: &'static Shape =
                    &const { Shape::scalar::<$ty>(ScalarType::$scalar) };
            }
        )*
    };
}

impl_scalar! {
    String => String,
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    isize => ISize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    usize => USize,
    f32 => F32,
    f64 => F64,
}

crate::impl_bindable_from_str!(
    char,
    IpAddr,
    Ipv4Addr,
    Ipv6Addr,
    SocketAddr,
    SocketAddrV4,
    SocketAddrV6,
);

#[cfg(feature = "std")]
crate::impl_bindable_from_str!(std::path::PathBuf);

fn option_clear<T: 'static>(option: &mut dyn Any) -> bool {
    match option.downcast_mut::<Option<T>>() {
        Some(option) => {
            *option = None;
            true
        }
        None => false,
    }
}

fn option_get_or_insert<T: Default + 'static>(option: &mut dyn Any) -> Option<&mut dyn Any> {
    option
        .downcast_mut::<Option<T>>()
        .map(|option| option.get_or_insert_with(T::default) as &mut dyn Any)
}

impl<T: Bindable + Default> Bindable for Option<T> {
    const SHAPE: &'static Shape = &const {
        Shape::option::<Self>(OptionDef {
            t: shape_of::<T>,
            clear: option_clear::<T>,
            get_or_insert: option_get_or_insert::<T>,
        })
    };
}

/// Object-safe view of a [`Bindable`] value.
///
/// Fields declared as `Box<dyn DynBindable>` are bound through whatever
/// concrete value they hold when the bind starts.
pub trait DynBindable: Any {
    /// The shape of the concrete value.
    fn shape(&self) -> &'static Shape;
}

impl<T: Bindable> DynBindable for T {
    fn shape(&self) -> &'static Shape {
        T::SHAPE
    }
}

fn dynamic_unwrap(holder: &mut dyn Any) -> Option<(&'static Shape, &mut dyn Any)> {
    let holder = holder.downcast_mut::<Box<dyn DynBindable>>()?;
    let value: &mut dyn DynBindable = &mut **holder;
    let shape = value.shape();
    Some((shape, value as &mut dyn Any))
}

impl Bindable for Box<dyn DynBindable> {
    const SHAPE: &'static Shape = &const {
        Shape::dynamic::<Self>(DynamicDef {
            unwrap: dynamic_unwrap,
        })
    };
}

macro_rules! impl_opaque {
    ($($(#[$cfg:meta])* [$($generics:tt)*] $ty:ty),* $(,)?) => {
        $(
            $(#[$cfg])*
            impl<$($generics)*> Bindable for $ty {
                const SHAPE: &'static Shape = &const { Shape::opaque::<Self>() };
            }
        )*
    };
}

impl_opaque! {
    [T: 'static] Vec<T>,
    [T: 'static] VecDeque<T>,
    [T: 'static] BTreeSet<T>,
    [K: 'static, V: 'static] BTreeMap<K, V>,
    [T: 'static, const N: usize] [T; N],
    #[cfg(feature = "std")]
    [T: 'static, S: 'static] std::collections::HashSet<T, S>,
    #[cfg(feature = "std")]
    [K: 'static, V: 'static, S: 'static] std::collections::HashMap<K, V, S>,
}
