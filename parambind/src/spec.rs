use parambind_core::{FieldAccessFn, Shape};

use crate::{BindError, BindErrorKind};

/// The binding rules of one record, one entry per declared field.
#[derive(Debug)]
pub struct RecordSpec {
    /// The record these rules belong to.
    pub shape: &'static Shape,

    /// Aligned with the record's fields, in declaration order.
    pub fields: Vec<FieldSpec>,
}

impl RecordSpec {
    /// Iterates over the fields the binder populates.
    pub fn bound_fields(&self) -> impl Iterator<Item = (&'static str, &BoundField)> {
        self.fields
            .iter()
            .filter_map(|field| field.binding.as_ref().map(|bound| (field.name, bound)))
    }
}

/// Binding rules for one declared field.
#[derive(Debug)]
pub struct FieldSpec {
    /// Name of the field in the Rust source, for error reporting.
    pub name: &'static str,

    /// `None` for fields without `#[param]`, which are skipped entirely.
    pub binding: Option<BoundField>,
}

/// Binding rules of a field that carries `#[param]`.
#[derive(Debug)]
pub struct BoundField {
    /// Key relative to the record's prefix, verbatim from `#[param(key = ...)]`.
    ///
    /// Empty when no key was given.
    pub lookup_name: &'static str,

    /// Shape of the field's declared type.
    pub shape: &'static Shape,

    /// Value to use when the key is absent. Empty means no default.
    pub default_value: &'static str,

    /// True if `#[param(required = "true")]` was given.
    pub required: bool,

    /// Projects the record onto this field.
    pub access: FieldAccessFn,
}

impl BoundField {
    /// Returns true if a default value was declared.
    pub fn has_default(&self) -> bool {
        !self.default_value.is_empty()
    }
}

/// Derives the binding rules of a record from its shape.
///
/// This is a pure function of the type; [`SpecCache`](crate::SpecCache)
/// memoizes it.
pub fn derive_record_spec(shape: &'static Shape) -> Result<RecordSpec, BindError> {
    let fields = shape.fields().ok_or(BindErrorKind::NotARecord { shape })?;

    let fields = fields
        .iter()
        .map(|field| FieldSpec {
            name: field.name,
            binding: field.binding.map(|binding| BoundField {
                lookup_name: binding.attr("key").unwrap_or(""),
                shape: binding.shape(),
                default_value: binding.attr("default").unwrap_or(""),
                required: binding.attr("required") == Some("true"),
                access: binding.access,
            }),
        })
        .collect();

    trace!(record = %shape, "derived record spec");
    Ok(RecordSpec { shape, fields })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bindable;

    #[derive(Bindable, Default)]
    #[allow(dead_code)]
    struct Service {
        #[param(key = "/port", default = "8080")]
        port: u16,
        #[param(key = "/token", required)]
        token: String,
        #[param(key = "/verbose", required = "yes")]
        verbose: bool,
        scratch: Vec<u8>,
        #[param]
        limits: Limits,
    }

    #[derive(Bindable, Default)]
    struct Limits {
        #[param(key = "max")]
        max: u32,
    }

    #[parambind_testhelpers::test]
    fn specs_follow_declaration_order() {
        let spec = derive_record_spec(Service::SHAPE).unwrap();
        let names: Vec<_> = spec.fields.iter().map(|f| f.name).collect();
        assert_eq!(names, ["port", "token", "verbose", "scratch", "limits"]);
        assert!(spec.fields[3].binding.is_none());

        let bound: Vec<_> = spec.bound_fields().map(|(name, _)| name).collect();
        assert_eq!(bound, ["port", "token", "verbose", "limits"]);
    }

    #[parambind_testhelpers::test]
    fn attributes_are_interpreted() {
        let spec = derive_record_spec(Service::SHAPE).unwrap();
        let field = |i: usize| spec.fields[i].binding.as_ref().unwrap();

        let port = field(0);
        assert_eq!(port.lookup_name, "/port");
        assert_eq!(port.default_value, "8080");
        assert!(port.has_default());
        assert!(!port.required);
        assert_eq!(*port.shape, *u16::SHAPE);

        assert!(field(1).required);
        // only the exact value "true" marks a field required
        assert!(!field(2).required);

        let limits = field(4);
        assert_eq!(limits.lookup_name, "");
        assert!(limits.shape.is_record());
    }

    #[parambind_testhelpers::test]
    fn non_records_are_rejected() {
        let err = derive_record_spec(u16::SHAPE).unwrap_err();
        assert!(matches!(err.kind, BindErrorKind::NotARecord { .. }));
    }
}
