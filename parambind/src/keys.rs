//! Computing the keys a record will look up.
//!
//! [`Provider`](crate::Provider) uses this to know what to request from the
//! parameter store before binding. Keys are produced with the same
//! [`path::join`] the binder uses, so every key the binder reads has been
//! requested.

use core::any::Any;

use indexmap::IndexSet;
use parambind_core::{Bindable, Def, Shape};

use crate::{BindError, BindErrorKind, SpecCache, path};

/// Returns the absolute keys binding `target` under `prefix` would read, in
/// field declaration order and without duplicates.
///
/// Nested records contribute the keys of their fields, `Option` fields their
/// own key plus those of the pointee, and `Box<dyn DynBindable>` fields the
/// keys of the value they currently hold. A field that is required or has a
/// default also contributes its own key, since that is what those checks
/// read.
///
/// ```
/// use parambind::{Bindable, SpecCache, keys::collect_keys};
///
/// #[derive(Bindable, Default)]
/// struct Db {
///     #[param(key = "host")]
///     host: String,
///     #[param(key = "port", default = "5432")]
///     port: u16,
/// }
///
/// #[derive(Bindable, Default)]
/// struct App {
///     #[param(key = "/name")]
///     name: String,
///     #[param(key = "db")]
///     db: Db,
/// }
///
/// let keys = collect_keys(SpecCache::global(), "/app", &mut App::default()).unwrap();
/// assert_eq!(
///     keys.into_iter().collect::<Vec<_>>(),
///     ["/app/name", "/app/db/host", "/app/db/port"],
/// );
/// ```
pub fn collect_keys<T: Bindable>(
    cache: &SpecCache,
    prefix: &str,
    target: &mut T,
) -> Result<IndexSet<String>, BindError> {
    let shape = T::SHAPE;
    if !shape.is_record() {
        return Err(BindErrorKind::NotARecord { shape }.into());
    }

    let mut keys = IndexSet::new();
    collect_record(
        cache,
        shape,
        Some(target as &mut dyn Any),
        prefix,
        &mut keys,
    )?;
    Ok(keys)
}

fn collect_record(
    cache: &SpecCache,
    shape: &'static Shape,
    mut value: Option<&mut dyn Any>,
    prefix: &str,
    keys: &mut IndexSet<String>,
) -> Result<(), BindError> {
    let spec = cache.get(shape)?;
    for (name, field) in spec.bound_fields() {
        let key = path::join([prefix, field.lookup_name]);
        // the required and default decorators look up the field's own key,
        // whatever its type
        if field.required || field.has_default() {
            keys.insert(key.clone());
        }
        let child = value
            .as_deref_mut()
            .and_then(|record| (field.access)(record));
        collect_field(cache, field.shape, child, key, keys).map_err(|err| err.in_field(name))?;
    }
    Ok(())
}

fn collect_field(
    cache: &SpecCache,
    shape: &'static Shape,
    value: Option<&mut dyn Any>,
    key: String,
    keys: &mut IndexSet<String>,
) -> Result<(), BindError> {
    if shape.decode.is_some() {
        keys.insert(key);
        return Ok(());
    }

    match shape.def {
        Def::Struct(_) => collect_record(cache, shape, value, &key, keys),
        Def::Option(def) => {
            keys.insert(key.clone());
            // an empty option is walked by shape alone, without allocating
            collect_field(cache, def.t(), None, key, keys)
        }
        Def::Dynamic(def) => match value.and_then(def.unwrap) {
            Some((concrete, inner)) => collect_field(cache, concrete, Some(inner), key, keys),
            None => {
                keys.insert(key);
                Ok(())
            }
        },
        _ => {
            keys.insert(key);
            Ok(())
        }
    }
}
