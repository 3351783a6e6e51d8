use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, trace};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellBuilder};
use crate::error::{LayoutError, LayoutResult};
use crate::layer::LayerMap;
use crate::units::DEFAULT_DBU;

/// Library-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LibraryConfig {
    pub name: String,
    /// Database unit in micrometres.
    #[serde(default = "default_dbu")]
    pub dbu: f64,
}

fn default_dbu() -> f64 {
    DEFAULT_DBU
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            name: "photonic".to_string(),
            dbu: DEFAULT_DBU,
        }
    }
}

type Slot = Arc<OnceCell<Arc<Cell>>>;

/// The cell registry. Every builder receives it explicitly; each distinct
/// cell name is built at most once.
#[derive(Debug, Default)]
pub struct Library {
    pub config: LibraryConfig,
    layers: LayerMap,
    cells: RwLock<BTreeMap<String, Slot>>,
}

impl Library {
    pub fn new(name: &str) -> Self {
        Self::with_config(LibraryConfig {
            name: name.to_string(),
            ..LibraryConfig::default()
        })
    }

    pub fn with_config(config: LibraryConfig) -> Self {
        Self {
            config,
            layers: LayerMap::new(),
            cells: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn from_config_json(json: &str) -> LayoutResult<Self> {
        let config: LibraryConfig = serde_json::from_str(json)?;
        if config.dbu.is_nan() || config.dbu <= 0.0 {
            return Err(LayoutError::invalid("dbu", "must be positive"));
        }
        Ok(Self::with_config(config))
    }

    pub fn with_layers(mut self, layers: LayerMap) -> Self {
        self.layers = layers;
        self
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn dbu(&self) -> f64 {
        self.config.dbu
    }

    pub fn layers(&self) -> &LayerMap {
        &self.layers
    }

    // ── Cell management ──────────────────────────────────────────────

    fn slot(&self, name: &str) -> Slot {
        if let Some(slot) = self
            .cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return slot.clone();
        }
        self.cells
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    /// Return the cell called `name`, running `build` only if it does not
    /// exist yet. Concurrent callers for the same name wait for the first
    /// build and share its result. A failed build registers nothing.
    pub fn lookup_or_build<F>(&self, name: &str, build: F) -> LayoutResult<Arc<Cell>>
    where
        F: FnOnce(&mut CellBuilder) -> LayoutResult<()>,
    {
        let slot = self.slot(name);
        if let Some(cell) = slot.get() {
            trace!("cell cache hit: {name}");
            return Ok(cell.clone());
        }
        let cell = slot.get_or_try_init(|| {
            let mut builder = CellBuilder::new(name, self.dbu());
            build(&mut builder)?;
            let cell = builder.finish();
            debug!(
                "built cell {} ({} ports, {} instances)",
                cell.name,
                cell.ports().len(),
                cell.instances().len()
            );
            Ok::<_, LayoutError>(Arc::new(cell))
        })?;
        Ok(cell.clone())
    }

    pub fn get(&self, name: &str) -> Option<Arc<Cell>> {
        self.cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .and_then(|slot| slot.get().cloned())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Finished cells, in name order.
    pub fn cells(&self) -> Vec<Arc<Cell>> {
        self.cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter_map(|slot| slot.get().cloned())
            .collect()
    }

    pub fn cell_names(&self) -> Vec<String> {
        self.cells().iter().map(|c| c.name.clone()).collect()
    }

    pub fn cell_count(&self) -> usize {
        self.cells().len()
    }

    // ── Serialization ────────────────────────────────────────────────

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        #[derive(Serialize)]
        struct Snapshot<'a> {
            config: &'a LibraryConfig,
            layers: &'a LayerMap,
            cells: Vec<&'a Cell>,
        }
        let cells = self.cells();
        serde_json::to_string_pretty(&Snapshot {
            config: &self.config,
            layers: &self.layers,
            cells: cells.iter().map(|c| c.as_ref()).collect(),
        })
    }
}
