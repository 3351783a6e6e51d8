//! Cell factories: deferred builder calls that composite cells receive as
//! parameters.

use std::fmt;
use std::sync::Arc;

use photonic_core::{cell_name, Cell, LayoutResult, Library};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Keyword overrides a composite passes to a factory, e.g.
/// `{"width": 1.0, "length": 7.0}`.
pub type Overrides = serde_json::Map<String, Value>;

/// Anything that can produce a cell in a library.
pub trait CellFactory: Send + Sync {
    fn build(&self, lib: &Library, overrides: &Overrides) -> LayoutResult<Arc<Cell>>;
}

impl<F> CellFactory for F
where
    F: Fn(&Library, &Overrides) -> LayoutResult<Arc<Cell>> + Send + Sync,
{
    fn build(&self, lib: &Library, overrides: &Overrides) -> LayoutResult<Arc<Cell>> {
        self(lib, overrides)
    }
}

/// A builder's configuration record.
///
/// Records are serde types with `deny_unknown_fields`, so a misspelt override
/// is an error rather than silently ignored.
pub trait CellConfig: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Builder name, used as the cell name prefix.
    const BUILDER: &'static str;

    fn build_cell(&self, lib: &Library) -> LayoutResult<Arc<Cell>>;

    /// Deterministic name of the cell this record produces.
    fn cell_name(&self) -> LayoutResult<String> {
        cell_name(Self::BUILDER, self)
    }
}

/// A configuration record bound ahead of time. Overrides are merged into the
/// serialized record, which is then validated again.
#[derive(Clone)]
pub struct Bound<C>(pub C);

impl<C: CellConfig> Bound<C> {
    pub fn new(config: C) -> Self {
        Self(config)
    }

    pub fn config(&self) -> &C {
        &self.0
    }

    /// The record with `overrides` applied.
    pub fn resolve(&self, overrides: &Overrides) -> LayoutResult<C> {
        if overrides.is_empty() {
            return Ok(self.0.clone());
        }
        let mut value = serde_json::to_value(&self.0)?;
        if let Value::Object(fields) = &mut value {
            for (key, v) in overrides {
                fields.insert(key.clone(), v.clone());
            }
        }
        Ok(serde_json::from_value(value)?)
    }
}

impl<C: CellConfig> CellFactory for Bound<C> {
    fn build(&self, lib: &Library, overrides: &Overrides) -> LayoutResult<Arc<Cell>> {
        self.resolve(overrides)?.build_cell(lib)
    }
}

impl<C: CellConfig + fmt::Debug> fmt::Debug for Bound<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(C::BUILDER).field(&self.0).finish()
    }
}

/// Build an [`Overrides`] map from `key => value` pairs.
#[macro_export]
macro_rules! overrides {
    () => { $crate::factory::Overrides::new() };
    ($($key:literal => $value:expr),+ $(,)?) => {{
        let mut map = $crate::factory::Overrides::new();
        $( map.insert($key.to_string(), ::serde_json::json!($value)); )+
        map
    }};
}
