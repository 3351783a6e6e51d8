use std::fmt;

use serde::{Deserialize, Serialize};

/// A GDS `(layer, datatype)` pair. Opaque to the geometry code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub u16, pub u16);

impl LayerId {
    pub const fn new(layer: u16, datatype: u16) -> Self {
        Self(layer, datatype)
    }

    pub fn layer(&self) -> u16 {
        self.0
    }

    pub fn datatype(&self) -> u16 {
        self.1
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, self.1)
    }
}

/// A named technology layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub id: LayerId,
    #[serde(default)]
    pub description: String,
}

impl Layer {
    pub fn new(name: &str, id: LayerId) -> Self {
        Self {
            name: name.to_string(),
            id,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }
}

/// Name to GDS pair lookup table for a technology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerMap {
    layers: Vec<Layer>,
}

impl LayerMap {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Add a layer, replacing any previous entry with the same name.
    pub fn add_layer(&mut self, layer: Layer) {
        match self.layers.iter_mut().find(|l| l.name == layer.name) {
            Some(existing) => *existing = layer,
            None => self.layers.push(layer),
        }
    }

    pub fn with_layer(mut self, name: &str, id: LayerId) -> Self {
        self.add_layer(Layer::new(name, id));
        self
    }

    pub fn get(&self, name: &str) -> Option<LayerId> {
        self.layers.iter().find(|l| l.name == name).map(|l| l.id)
    }

    pub fn get_layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// First name registered for a GDS pair.
    pub fn name_of(&self, id: LayerId) -> Option<&str> {
        self.layers
            .iter()
            .find(|l| l.id == id)
            .map(|l| l.name.as_str())
    }

    pub fn all_layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}
