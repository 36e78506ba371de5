use core::any::Any;

use parambind_core::{Bindable, Shape};

use crate::{BindError, BindErrorKind, Setter, SpecCache, Values, path};

/// Binds [`Values`] into records.
///
/// A binder only borrows a [`SpecCache`]; it is cheap to create and can be
/// shared between threads.
#[derive(Debug, Clone, Copy)]
pub struct Binder<'a> {
    cache: &'a SpecCache,
}

impl Default for Binder<'static> {
    fn default() -> Self {
        Self::new(SpecCache::global())
    }
}

impl<'a> Binder<'a> {
    /// Creates a binder that stores record specs in `cache`.
    pub fn new(cache: &'a SpecCache) -> Self {
        Self { cache }
    }

    /// The cache this binder uses.
    pub fn cache(&self) -> &'a SpecCache {
        self.cache
    }

    /// Fills the `#[param]` fields of `target` from `values`.
    ///
    /// Each field's key is its lookup name joined onto `prefix`. Fields are
    /// bound in declaration order and binding stops at the first error;
    /// fields bound before it keep their new values.
    pub fn bind<T: Bindable>(
        &self,
        prefix: &str,
        target: &mut T,
        values: &Values,
    ) -> Result<(), BindError> {
        let shape = T::SHAPE;
        if !shape.is_record() {
            return Err(BindErrorKind::NotARecord { shape }.into());
        }

        debug!(record = %shape, prefix, values = values.len(), "binding record");
        self.bind_record(shape, target, prefix, values)
    }

    pub(crate) fn bind_record(
        &self,
        shape: &'static Shape,
        target: &mut dyn Any,
        prefix: &str,
        values: &Values,
    ) -> Result<(), BindError> {
        let spec = self.cache.get(shape)?;

        for (name, field) in spec.bound_fields() {
            let key = path::join([prefix, field.lookup_name]);

            let mut setter = Setter::for_shape(field.shape);
            if field.has_default() {
                setter = setter.with_default(field.default_value);
            }
            if field.required {
                setter = setter.required();
            }

            trace!(field = name, key = %key, ty = %field.shape, "binding field");
            let slot = (field.access)(&mut *target)
                .ok_or_else(|| BindError::from(BindErrorKind::ShapeMismatch { shape }))?;
            setter
                .set(self, slot, &key, values)
                .map_err(|err| err.in_field(name))?;
        }

        Ok(())
    }
}

/// Fills the `#[param]` fields of `target` from `values`, using the
/// process-wide [`SpecCache`].
///
/// ```
/// use parambind::{Bindable, Values};
///
/// #[derive(Bindable, Default)]
/// struct Server {
///     #[param(key = "port")]
///     port: u16,
///     #[param(key = "debug", default = "true")]
///     debug: bool,
/// }
///
/// let values = Values::from_pairs([("/svc/port", "8080"), ("/svc/debug", "")]);
/// let mut server = Server::default();
/// parambind::bind("/svc", &mut server, &values).unwrap();
///
/// assert_eq!(server.port, 8080);
/// // an empty value is not replaced by the default
/// assert!(!server.debug);
/// ```
pub fn bind<T: Bindable>(prefix: &str, target: &mut T, values: &Values) -> Result<(), BindError> {
    Binder::default().bind(prefix, target, values)
}
