//! Data and GUI beans submitted by producers.
//!
//! A producer delivers one [`DataBean`] per update: the datasets to plot,
//! an optional display-mode hint, and an optional [`GuiBean`] of key-value
//! GUI parameters. Ownership of the bean transfers to the pipeline for the
//! duration of one cycle; after a successful cycle it is retained as the
//! window's "last processed" bean (newer beans overwrite it, no history).

use std::collections::HashMap;

use downcast_rs::{impl_downcast, Downcast};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::UpdateError;
use crate::modes::PlotMode;

/// Opaque dataset payload carried by a [`DataBean`].
///
/// The pipeline never inspects the data; mode-specific [`PlotUi`]
/// implementations downcast to the concrete types they render. Datasets are
/// immutable once submitted, hence `Sync`: the retained bean may be read
/// from any thread while a later cycle runs.
///
/// [`PlotUi`]: crate::surface::PlotUi
pub trait PlotData: Downcast + Send + Sync + std::fmt::Debug {}
impl_downcast!(PlotData);

// ─────────────────────────────────────────────────────────────────────────────
// GUI parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Recognized GUI parameter keys.
///
/// Values are free-form JSON; only these keys are interpreted by the
/// pipeline itself. Anything else in a [`GuiBean`] is carried through to the
/// active plot UI untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuiParam {
    /// Display-mode selector; the value is a mode name string.
    #[serde(rename = "PLOTMODE")]
    PlotMode,
    /// Operation flag; the string value `"UPDATE"` selects update-in-place,
    /// anything else (or an absent key) means replace.
    #[serde(rename = "PLOTOPERATION")]
    PlotOperation,
    /// A single region-of-interest payload.
    #[serde(rename = "ROIDATA")]
    RoiData,
    /// A list of region-of-interest payloads.
    #[serde(rename = "ROIDATALIST")]
    RoiDataList,
}

/// Whether an update replaces the displayed data or updates it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlotOperation {
    /// Discard the displayed data and plot the payload from scratch.
    #[default]
    Replace,
    /// Update the displayed data in place with the payload.
    Update,
}

/// Key-value GUI state attached to an update.
///
/// Beans historically arrive from out-of-process producers, so values are
/// kept as JSON and decoded lazily.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuiBean {
    params: HashMap<GuiParam, Value>,
}

impl GuiBean {
    /// Create an empty bean.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter value.
    pub fn set(&mut self, key: GuiParam, value: impl Into<Value>) -> &mut Self {
        self.params.insert(key, value.into());
        self
    }

    /// Get a parameter value.
    pub fn get(&self, key: GuiParam) -> Option<&Value> {
        self.params.get(&key)
    }

    /// Whether the bean carries the given key.
    pub fn contains(&self, key: GuiParam) -> bool {
        self.params.contains_key(&key)
    }

    /// Decode the display-mode selector, if present.
    ///
    /// `None` means the bean carries no mode (it may contain ROIs only);
    /// an unknown mode name is the [`UpdateError::InvalidMode`] path.
    pub fn plot_mode(&self) -> Option<Result<PlotMode, UpdateError>> {
        let value = self.params.get(&GuiParam::PlotMode)?;
        Some(match value.as_str() {
            Some(name) => PlotMode::from_name(name),
            None => Err(UpdateError::InvalidMode(value.to_string())),
        })
    }

    /// Decode the operation flag. Absent or unrecognized values mean replace.
    pub fn operation(&self) -> PlotOperation {
        match self.params.get(&GuiParam::PlotOperation).and_then(Value::as_str) {
            Some("UPDATE") => PlotOperation::Update,
            _ => PlotOperation::Replace,
        }
    }

    /// Collect the region-of-interest payloads (single + list) in order.
    pub fn rois(&self) -> Vec<Value> {
        let mut rois = Vec::new();
        if let Some(roi) = self.params.get(&GuiParam::RoiData) {
            rois.push(roi.clone());
        }
        match self.params.get(&GuiParam::RoiDataList) {
            Some(Value::Array(list)) => rois.extend(list.iter().cloned()),
            Some(other) => rois.push(other.clone()),
            None => {}
        }
        rois
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DataBean
// ─────────────────────────────────────────────────────────────────────────────

/// One inbound update request.
#[derive(Debug, Default)]
pub struct DataBean {
    /// Datasets to render, in producer order.
    pub data: Vec<Box<dyn PlotData>>,
    /// Display mode this bean asks for, if any.
    pub mode: Option<PlotMode>,
    /// GUI parameters attached to the update, if any.
    pub gui: Option<GuiBean>,
}

impl DataBean {
    /// Create an empty bean.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bean asking for the given display mode.
    pub fn with_mode(mode: PlotMode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::default()
        }
    }

    /// Append a dataset to the payload.
    pub fn add_data(&mut self, data: impl PlotData) -> &mut Self {
        self.data.push(Box::new(data));
        self
    }

    /// Attach a GUI bean.
    pub fn set_gui(&mut self, gui: GuiBean) -> &mut Self {
        self.gui = Some(gui);
        self
    }
}
