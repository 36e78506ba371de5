use core::any::Any;
use core::fmt;
use core::str::FromStr;

use parambind_core::{
    Bindable, DecodeError, DecodeTextFn, Def, DynamicDef, OptionDef, ScalarType, Shape,
};

use crate::{BindError, BindErrorKind, Binder, Values};

/// Sets one field from the value stored under a key.
///
/// A setter is picked from the field's [`Shape`] by [`Setter::for_shape`],
/// then optionally wrapped by [`Setter::with_default`] and
/// [`Setter::required`]. Setters hold no state of their own and are built
/// afresh for every field of every bind.
#[derive(Debug)]
#[non_exhaustive]
pub enum Setter {
    /// Hands the raw value (empty if absent) to the type's `DecodeText` impl.
    Decode {
        /// Shape of the decoded type
        shape: &'static Shape,
        /// The type's decode entry point
        decode: DecodeTextFn,
    },

    /// Clears the option if the key is absent, otherwise fills it in place,
    /// allocating a default value first if it was empty.
    Pointer {
        /// Shape of the option
        shape: &'static Shape,
        /// How to reach inside the option
        def: OptionDef,
        /// Setter for the pointee
        inner: Box<Setter>,
    },

    /// Binds whatever concrete value the holder contains.
    Dynamic {
        /// Shape of the holder
        shape: &'static Shape,
        /// How to reach inside the holder
        def: DynamicDef,
    },

    /// Binds a nested record, using the key as its prefix.
    Record {
        /// Shape of the nested record
        shape: &'static Shape,
    },

    /// Assigns the raw value to a `String`.
    Text,

    /// Parses a base-10 signed integer of the given width.
    Signed(ScalarType),

    /// Parses a base-10 unsigned integer of the given width.
    Unsigned(ScalarType),

    /// Parses a floating point number of the given precision.
    Float(ScalarType),

    /// Parses `1 t T TRUE true True` as true and `0 f F FALSE false False` as false.
    Bool,

    /// Always fails: the type cannot be bound from a string.
    Unsupported {
        /// Shape of the unsupported type
        shape: &'static Shape,
    },

    /// Fails if the key is absent, otherwise delegates.
    Required(Box<Setter>),

    /// Delegates with the default value standing in for an absent key.
    Default {
        /// Value used when the key is absent
        value: &'static str,
        /// The decorated setter
        inner: Box<Setter>,
    },
}

impl Setter {
    /// Picks the setter for a field of the given shape.
    ///
    /// A text decode capability wins over everything else. Otherwise the
    /// shape's [`Def`] decides.
    pub fn for_shape(shape: &'static Shape) -> Self {
        if let Some(decode) = shape.decode {
            return Setter::Decode { shape, decode };
        }

        match shape.def {
            Def::Option(def) => Setter::Pointer {
                shape,
                def,
                inner: Box::new(Setter::for_shape(def.t())),
            },
            Def::Dynamic(def) => Setter::Dynamic { shape, def },
            Def::Struct(_) => Setter::Record { shape },
            Def::Scalar(ScalarType::String) => Setter::Text,
            Def::Scalar(ScalarType::Bool) => Setter::Bool,
            Def::Scalar(scalar) if scalar.is_signed_int() => Setter::Signed(scalar),
            Def::Scalar(scalar) if scalar.is_unsigned_int() => Setter::Unsigned(scalar),
            Def::Scalar(scalar) if scalar.is_float() => Setter::Float(scalar),
            _ => Setter::Unsupported { shape },
        }
    }

    /// Makes the key mandatory: an absent or invalid key fails with
    /// [`BindErrorKind::MissingValue`]. An empty value counts as present.
    pub fn required(self) -> Self {
        Setter::Required(Box::new(self))
    }

    /// Substitutes `value` when the key is absent or invalid.
    ///
    /// An explicitly empty value is not replaced.
    pub fn with_default(self, value: &'static str) -> Self {
        Setter::Default {
            value,
            inner: Box::new(self),
        }
    }

    /// Sets `target` from the value of `key` in `values`.
    ///
    /// `target` must be a value of the type this setter was built for.
    pub fn set(
        &self,
        binder: &Binder<'_>,
        target: &mut dyn Any,
        key: &str,
        values: &Values,
    ) -> Result<(), BindError> {
        let text = values.get(key).unwrap_or("");

        match self {
            Setter::Decode { shape, decode } => match decode(target, text) {
                Some(Ok(())) => Ok(()),
                Some(Err(source)) => Err(conversion(key, *shape, source)),
                None => Err(mismatch(*shape)),
            },

            Setter::Pointer { shape, def, inner } => {
                if !values.contains(key) {
                    return if (def.clear)(target) {
                        Ok(())
                    } else {
                        Err(mismatch(*shape))
                    };
                }
                let pointee = (def.get_or_insert)(target).ok_or_else(|| mismatch(*shape))?;
                inner.set(binder, pointee, key, values)
            }

            Setter::Dynamic { shape, def } => {
                let (concrete, value) = (def.unwrap)(target).ok_or_else(|| mismatch(*shape))?;
                trace!(key, concrete = %concrete, "binding dynamic value");
                Setter::for_shape(concrete).set(binder, value, key, values)
            }

            Setter::Record { shape } => binder.bind_record(*shape, target, key, values),

            Setter::Text => {
                let slot = downcast::<String>(target)?;
                text.clone_into(slot);
                Ok(())
            }

            Setter::Signed(scalar) | Setter::Unsigned(scalar) | Setter::Float(scalar) => {
                set_number(*scalar, target, key, text)
            }

            Setter::Bool => {
                let slot = downcast::<bool>(target)?;
                *slot = if text.is_empty() {
                    false
                } else {
                    parse_bool(text).map_err(|err| conversion(key, bool::SHAPE, Box::new(err)))?
                };
                Ok(())
            }

            Setter::Unsupported { shape } => Err(BindErrorKind::UnsupportedType {
                key: key.to_owned(),
                shape: *shape,
            }
            .into()),

            Setter::Required(inner) => {
                if !values.contains(key) {
                    return Err(BindErrorKind::MissingValue {
                        key: key.to_owned(),
                    }
                    .into());
                }
                inner.set(binder, target, key, values)
            }

            Setter::Default { value, inner } => {
                if values.contains(key) {
                    inner.set(binder, target, key, values)
                } else {
                    trace!(key, "using default value");
                    inner.set(binder, target, key, &Values::single(key, *value))
                }
            }
        }
    }
}

fn set_number(
    scalar: ScalarType,
    target: &mut dyn Any,
    key: &str,
    text: &str,
) -> Result<(), BindError> {
    match scalar {
        ScalarType::I8 => parse_into::<i8>(target, key, text),
        ScalarType::I16 => parse_into::<i16>(target, key, text),
        ScalarType::I32 => parse_into::<i32>(target, key, text),
        ScalarType::I64 => parse_into::<i64>(target, key, text),
        ScalarType::I128 => parse_into::<i128>(target, key, text),
        ScalarType::ISize => parse_into::<isize>(target, key, text),
        ScalarType::U8 => parse_into::<u8>(target, key, text),
        ScalarType::U16 => parse_into::<u16>(target, key, text),
        ScalarType::U32 => parse_into::<u32>(target, key, text),
        ScalarType::U64 => parse_into::<u64>(target, key, text),
        ScalarType::U128 => parse_into::<u128>(target, key, text),
        ScalarType::USize => parse_into::<usize>(target, key, text),
        ScalarType::F32 => parse_float::<f32>(target, key, text),
        ScalarType::F64 => parse_float::<f64>(target, key, text),
        // a hand-built `Setter` over a non-numeric scalar
        ScalarType::Bool => Err(mismatch(bool::SHAPE)),
        _ => Err(mismatch(String::SHAPE)),
    }
}

/// Parses `text` into the declared type; an empty string yields zero.
fn parse_into<T>(target: &mut dyn Any, key: &str, text: &str) -> Result<(), BindError>
where
    T: Bindable + Default + FromStr,
    T::Err: core::error::Error + Send + Sync + 'static,
{
    let slot = downcast::<T>(target)?;
    *slot = if text.is_empty() {
        T::default()
    } else {
        text.parse::<T>()
            .map_err(|err| conversion(key, T::SHAPE, Box::new(err)))?
    };
    Ok(())
}

/// Like `parse_into`, but a finite literal that overflows to infinity is
/// out of range. `inf`, `infinity` and `nan` spellings are taken as written.
fn parse_float<T>(target: &mut dyn Any, key: &str, text: &str) -> Result<(), BindError>
where
    T: Bindable + Default + FromStr + Into<f64> + Copy,
    T::Err: core::error::Error + Send + Sync + 'static,
{
    let slot = downcast::<T>(target)?;
    if text.is_empty() {
        *slot = T::default();
        return Ok(());
    }

    let value = text
        .parse::<T>()
        .map_err(|err| conversion(key, T::SHAPE, Box::new(err)))?;
    let wide: f64 = value.into();
    if wide.is_infinite() && !is_infinity_literal(text) {
        return Err(conversion(key, T::SHAPE, Box::new(OutOfRange)));
    }
    *slot = value;
    Ok(())
}

fn is_infinity_literal(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

fn downcast<T: Bindable>(target: &mut dyn Any) -> Result<&mut T, BindError> {
    target.downcast_mut::<T>().ok_or_else(|| mismatch(T::SHAPE))
}

fn mismatch(shape: &'static Shape) -> BindError {
    BindErrorKind::ShapeMismatch { shape }.into()
}

fn conversion(key: &str, shape: &'static Shape, source: DecodeError) -> BindError {
    BindErrorKind::Conversion {
        key: key.to_owned(),
        shape,
        source,
    }
    .into()
}

/// Parses the boolean spellings accepted by parameter values.
///
/// `1`, `t`, `T`, `TRUE`, `true` and `True` are true; `0`, `f`, `F`,
/// `FALSE`, `false` and `False` are false.
pub(crate) fn parse_bool(text: &str) -> Result<bool, InvalidBool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(InvalidBool),
    }
}

/// A value was not one of the accepted boolean spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidBool;

impl fmt::Display for InvalidBool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected one of 1, t, T, TRUE, true, True, 0, f, F, FALSE, false, False")
    }
}

impl core::error::Error for InvalidBool {}

/// A number was too large in magnitude for the declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange;

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("value out of range")
    }
}

impl core::error::Error for OutOfRange {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SpecCache;

    fn set<T: Bindable>(
        setter: &Setter,
        target: &mut T,
        key: &str,
        values: &Values,
    ) -> Result<(), BindError> {
        let cache = SpecCache::new();
        setter.set(&Binder::new(&cache), target, key, values)
    }

    fn setter_of<T: Bindable>() -> Setter {
        Setter::for_shape(T::SHAPE)
    }

    #[parambind_testhelpers::test]
    fn factory_follows_the_shape() {
        assert!(matches!(setter_of::<String>(), Setter::Text));
        assert!(matches!(setter_of::<bool>(), Setter::Bool));
        assert!(matches!(setter_of::<i16>(), Setter::Signed(ScalarType::I16)));
        assert!(matches!(setter_of::<usize>(), Setter::Unsigned(ScalarType::USize)));
        assert!(matches!(setter_of::<f32>(), Setter::Float(ScalarType::F32)));
        assert!(matches!(setter_of::<Vec<u8>>(), Setter::Unsupported { .. }));
        assert!(matches!(setter_of::<std::net::Ipv4Addr>(), Setter::Decode { .. }));

        let Setter::Pointer { inner, .. } = setter_of::<Option<u8>>() else {
            panic!("expected a pointer setter");
        };
        assert!(matches!(*inner, Setter::Unsigned(ScalarType::U8)));
    }

    #[parambind_testhelpers::test]
    fn absent_keys_yield_zero_values() {
        let empty = Values::new();

        let mut n = 5_i64;
        set(&setter_of::<i64>(), &mut n, "/n", &empty).unwrap();
        assert_eq!(n, 0);

        let mut x = 1.5_f64;
        set(&setter_of::<f64>(), &mut x, "/x", &empty).unwrap();
        assert_eq!(x, 0.0);

        let mut b = true;
        set(&setter_of::<bool>(), &mut b, "/b", &empty).unwrap();
        assert!(!b);

        let mut s = String::from("old");
        set(&setter_of::<String>(), &mut s, "/s", &empty).unwrap();
        assert_eq!(s, "");
    }

    #[parambind_testhelpers::test]
    fn integers_parse_into_their_declared_width() {
        let setter = setter_of::<u8>();
        let mut small = 0_u8;
        let n = |text: &str| Values::single("/n", text);

        set(&setter, &mut small, "/n", &n("255")).unwrap();
        assert_eq!(small, 255);

        let err = set(&setter, &mut small, "/n", &n("256")).unwrap_err();
        insta::assert_snapshot!(err, @"could not decode /n into u8: number too large to fit in target type");

        let err = set(&setter, &mut small, "/n", &n("-1")).unwrap_err();
        assert!(matches!(err.kind, BindErrorKind::Conversion { .. }));

        let mut signed = 0_i32;
        set(&setter_of::<i32>(), &mut signed, "/n", &n("-42")).unwrap();
        assert_eq!(signed, -42);
    }

    #[parambind_testhelpers::test]
    fn floats_reject_overflow() {
        let setter = setter_of::<f32>();
        let mut x = 1.5_f32;
        let v = |text: &str| Values::single("/x", text);

        let err = set(&setter, &mut x, "/x", &v("1e40")).unwrap_err();
        insta::assert_snapshot!(err, @"could not decode /x into f32: value out of range");
        assert_eq!(x, 1.5);

        set(&setter, &mut x, "/x", &v("3.4e38")).unwrap();
        assert!(x.is_finite());

        set(&setter, &mut x, "/x", &v("-Infinity")).unwrap();
        assert_eq!(x, f32::NEG_INFINITY);

        let setter = setter_of::<f64>();
        let mut y = 0.0_f64;
        assert!(set(&setter, &mut y, "/x", &v("1e400")).is_err());
        set(&setter, &mut y, "/x", &v("1e40")).unwrap();
        assert_eq!(y, 1e40);
    }

    #[parambind_testhelpers::test]
    fn bools_accept_the_usual_spellings() {
        let spellings = [
            ("1", true),
            ("T", true),
            ("True", true),
            ("0", false),
            ("f", false),
            ("FALSE", false),
        ];
        for (text, expected) in spellings {
            assert_eq!(parse_bool(text), Ok(expected), "{text}");
        }
        assert_eq!(parse_bool("yes"), Err(InvalidBool));

        let mut b = false;
        let values = Values::single("/b", "notABool");
        let err = set(&Setter::Bool, &mut b, "/b", &values).unwrap_err();
        insta::assert_snapshot!(err, @"could not decode /b into bool: expected one of 1, t, T, TRUE, true, True, 0, f, F, FALSE, false, False");
    }

    #[parambind_testhelpers::test]
    fn required_accepts_empty_values() {
        let setter = setter_of::<String>().required();
        let mut s = String::new();

        set(&setter, &mut s, "/s", &Values::single("/s", "")).unwrap();

        let mut invalid = Values::new();
        invalid.mark_invalid("/s");
        let err = set(&setter, &mut s, "/s", &invalid).unwrap_err();
        insta::assert_snapshot!(err, @"/s is required");
    }

    #[parambind_testhelpers::test]
    fn defaults_only_fill_absent_keys() {
        let setter = setter_of::<u16>().with_default("8080");
        let mut port = 0_u16;
        let v = |text: &str| Values::single("/port", text);

        set(&setter, &mut port, "/port", &Values::new()).unwrap();
        assert_eq!(port, 8080);

        set(&setter, &mut port, "/port", &v("")).unwrap();
        assert_eq!(port, 0);

        set(&setter, &mut port, "/port", &v("9090")).unwrap();
        assert_eq!(port, 9090);
    }

    #[parambind_testhelpers::test]
    fn required_wins_over_default() {
        let setter = setter_of::<u16>().with_default("8080").required();
        let mut port = 1_u16;
        let err = set(&setter, &mut port, "/port", &Values::new()).unwrap_err();
        assert!(matches!(err.kind, BindErrorKind::MissingValue { .. }));
        assert_eq!(port, 1);
    }

    #[parambind_testhelpers::test]
    fn pointers_allocate_and_clear() {
        let setter = setter_of::<Option<u32>>();
        let mut value: Option<u32> = None;
        let v = |text: &str| Values::single("/v", text);

        set(&setter, &mut value, "/v", &v("7")).unwrap();
        assert_eq!(value, Some(7));

        set(&setter, &mut value, "/v", &Values::new()).unwrap();
        assert_eq!(value, None);

        set(&setter, &mut value, "/v", &v("")).unwrap();
        assert_eq!(value, Some(0));
    }

    #[parambind_testhelpers::test]
    fn unsupported_types_fail_without_converting() {
        let mut list: Vec<String> = Vec::new();
        let values = Values::single("/list", "a,b");
        let err = set(&setter_of::<Vec<String>>(), &mut list, "/list", &values).unwrap_err();
        assert!(matches!(err.kind, BindErrorKind::UnsupportedType { .. }));
        assert!(list.is_empty());
    }

    #[parambind_testhelpers::test]
    fn wrong_targets_are_reported() {
        let mut not_a_string = 0_u8;
        let err = set(&Setter::Text, &mut not_a_string, "/s", &Values::new()).unwrap_err();
        insta::assert_snapshot!(err, @"value does not match its shape alloc::string::String");
    }
}
