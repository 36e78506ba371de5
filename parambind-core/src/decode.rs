use alloc::boxed::Box;
use core::any::Any;

/// Error returned by a [`DecodeText`] implementation.
pub type DecodeError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// A type that can populate itself from a raw parameter string.
///
/// Implementing this trait (and pointing the type's shape at
/// [`decode_text_thunk`]) makes the binder hand the raw value to the type
/// instead of using its built-in scalar conversions. The binder calls it with
/// an empty string when the key is absent and has no default.
///
/// ```
/// use parambind_core::{Bindable, DecodeError, DecodeText, Shape, decode_text_thunk};
///
/// #[derive(Default)]
/// struct Csv(Vec<String>);
///
/// impl DecodeText for Csv {
///     fn decode_text(&mut self, text: &str) -> Result<(), DecodeError> {
///         self.0 = text.split(',').filter(|s| !s.is_empty()).map(str::to_owned).collect();
///         Ok(())
///     }
/// }
///
/// impl Bindable for Csv {
///     const SHAPE: &'static Shape =
///         &const { Shape::opaque::<Csv>().with_decode(decode_text_thunk::<Csv>) };
/// }
///
/// assert!(Csv::SHAPE.decode.is_some());
/// ```
pub trait DecodeText {
    /// Replaces the contents of `self` with the value described by `text`.
    fn decode_text(&mut self, text: &str) -> Result<(), DecodeError>;
}

/// Type-erased entry point into a [`DecodeText`] implementation.
///
/// Returns `None` if `target` is not of the type the function was built for.
pub type DecodeTextFn = fn(target: &mut dyn Any, text: &str) -> Option<Result<(), DecodeError>>;

/// Builds the [`DecodeTextFn`] for `T`.
pub fn decode_text_thunk<T: DecodeText + 'static>(
    target: &mut dyn Any,
    text: &str,
) -> Option<Result<(), DecodeError>> {
    target
        .downcast_mut::<T>()
        .map(|value| value.decode_text(text))
}

/// Implements [`DecodeText`] and [`Bindable`](crate::Bindable) for types that
/// implement `FromStr`.
///
/// An empty string leaves the value untouched, matching how the built-in
/// scalars treat absent keys.
///
/// ```
/// use parambind_core::{Bindable, DecodeText};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Millis(u64);
///
/// impl core::str::FromStr for Millis {
///     type Err = core::num::ParseIntError;
///     fn from_str(s: &str) -> Result<Self, Self::Err> {
///         Ok(Millis(s.trim_end_matches("ms").parse()?))
///     }
/// }
///
/// parambind_core::impl_bindable_from_str!(Millis);
///
/// let mut m = Millis::default();
/// m.decode_text("250ms").unwrap();
/// assert_eq!(m, Millis(250));
/// assert!(Millis::SHAPE.decode.is_some());
/// ```
#[macro_export]
macro_rules! impl_bindable_from_str {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::DecodeText for $ty {
                fn decode_text(
                    &mut self,
                    text: &str,
                ) -> ::core::result::Result<(), $crate::DecodeError> {
                    if text.is_empty() {
                        return ::core::result::Result::Ok(());
                    }
                    *self = <$ty as ::core::str::FromStr>::from_str(text)?;
                    ::core::result::Result::Ok(())
                }
            }

            impl $crate::Bindable for $ty {
                const SHAPE: &'static $crate::Shape = &const {
                    $crate::Shape::opaque::<$ty>().with_decode($crate::decode_text_thunk::<$ty>)
                };
            }
        )*
    };
}
