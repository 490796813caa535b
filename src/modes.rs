//! Display modes and the transition engine.
//!
//! A plot window is always in exactly one [`PlotMode`]. Transitions are the
//! only way to change it: the current mode's sub-component is torn down
//! (best-effort) and the target mode's sub-component is built through the
//! window's [`PlotUiFactory`]. Re-requesting the current mode is a no-op so
//! that data-only updates never rebuild the view.

use serde::{Deserialize, Serialize};

use crate::bean::{DataBean, PlotOperation};
use crate::error::UpdateError;
use crate::surface::{PlotUi, PlotUiFactory, RenderSurface};

// ─────────────────────────────────────────────────────────────────────────────
// PlotMode
// ─────────────────────────────────────────────────────────────────────────────

/// The mutually exclusive rendering configurations of a plot window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlotMode {
    /// Nothing plotted; the surface is cleared.
    #[serde(rename = "EMPTY")]
    Empty,
    /// One-dimensional series plot.
    #[serde(rename = "SERIES_1D")]
    Series1d,
    /// Two-dimensional image plot.
    #[serde(rename = "IMAGE_2D")]
    Image2d,
    /// Two-dimensional scatter plot.
    #[serde(rename = "SCATTER_2D")]
    Scatter2d,
}

impl PlotMode {
    /// All modes, in declaration order.
    pub const ALL: [PlotMode; 4] = [
        PlotMode::Empty,
        PlotMode::Series1d,
        PlotMode::Image2d,
        PlotMode::Scatter2d,
    ];

    /// The wire spelling of this mode.
    pub fn name(self) -> &'static str {
        match self {
            PlotMode::Empty => "EMPTY",
            PlotMode::Series1d => "SERIES_1D",
            PlotMode::Image2d => "IMAGE_2D",
            PlotMode::Scatter2d => "SCATTER_2D",
        }
    }

    /// Parse a wire-format mode name.
    ///
    /// Unknown names fail with [`UpdateError::InvalidMode`]; this is the only
    /// way an unsupported mode can enter the pipeline, since in-crate
    /// transitions are matched exhaustively on the enum.
    pub fn from_name(name: &str) -> Result<PlotMode, UpdateError> {
        match name {
            "EMPTY" => Ok(PlotMode::Empty),
            "SERIES_1D" => Ok(PlotMode::Series1d),
            "IMAGE_2D" => Ok(PlotMode::Image2d),
            "SCATTER_2D" => Ok(PlotMode::Scatter2d),
            other => Err(UpdateError::InvalidMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for PlotMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ModeMachine
// ─────────────────────────────────────────────────────────────────────────────

/// Transition engine owning the surface and the active mode sub-component.
///
/// The machine itself is not synchronized; the window only mutates it while
/// holding the update lock, which is what serializes mode changes.
pub struct ModeMachine {
    current: PlotMode,
    active: Option<Box<dyn PlotUi>>,
    surface: Box<dyn RenderSurface>,
    factory: Box<dyn PlotUiFactory>,
}

impl ModeMachine {
    /// Create a machine in [`PlotMode::Empty`] with no active sub-component.
    pub fn new(surface: Box<dyn RenderSurface>, factory: Box<dyn PlotUiFactory>) -> Self {
        Self {
            current: PlotMode::Empty,
            active: None,
            surface,
            factory,
        }
    }

    /// Create a machine and immediately transition to `initial`.
    pub fn with_initial_mode(
        surface: Box<dyn RenderSurface>,
        factory: Box<dyn PlotUiFactory>,
        initial: PlotMode,
    ) -> Result<Self, UpdateError> {
        let mut machine = Self::new(surface, factory);
        machine.request_mode(initial)?;
        Ok(machine)
    }

    /// The currently active display mode.
    pub fn current(&self) -> PlotMode {
        self.current
    }

    /// Transition to `target`, rebuilding the mode sub-component.
    ///
    /// Requesting the current mode is a no-op and returns `Ok(false)`; an
    /// actual transition returns `Ok(true)`. Teardown of the previous
    /// sub-component is best-effort: its errors are logged and swallowed so
    /// a broken previous view cannot block establishing the new one. If
    /// building the new sub-component fails the machine is left in
    /// [`PlotMode::Empty`].
    pub fn request_mode(&mut self, target: PlotMode) -> Result<bool, UpdateError> {
        if target == self.current {
            return Ok(false);
        }
        log::debug!("plot mode transition {} -> {}", self.current, target);
        self.teardown_active();
        match target {
            PlotMode::Empty => {
                self.surface.clear_regions();
                self.surface.reset();
                self.surface.repaint();
            }
            mode => {
                self.current = PlotMode::Empty;
                let ui = self
                    .factory
                    .build(mode, self.surface.as_mut())
                    .map_err(UpdateError::Apply)?;
                self.active = Some(ui);
            }
        }
        self.current = target;
        Ok(true)
    }

    /// Apply one update payload to the active sub-component.
    ///
    /// ROI parameters in the GUI bean are forwarded first, then the payload
    /// itself. In [`PlotMode::Empty`] there is nothing to render and the
    /// payload is ignored.
    pub fn apply(&mut self, bean: &DataBean, op: PlotOperation) -> Result<(), UpdateError> {
        let Some(ui) = self.active.as_mut() else {
            log::debug!("no active plot UI, payload ignored");
            return Ok(());
        };
        if let Some(gui) = &bean.gui {
            let rois = gui.rois();
            if !rois.is_empty() {
                ui.process_roi(&rois).map_err(UpdateError::Apply)?;
            }
        }
        ui.process_update(bean, op).map_err(UpdateError::Apply)
    }

    /// Tear down the active sub-component and the surface.
    pub fn dispose(&mut self) {
        self.teardown_active();
        if let Err(e) = self.surface.dispose() {
            log::warn!("render surface dispose failed: {e}");
        }
        self.current = PlotMode::Empty;
    }

    fn teardown_active(&mut self) {
        if let Some(mut ui) = self.active.take() {
            if let Err(e) = ui.deactivate() {
                log::warn!("plot UI deactivate failed: {e}");
            }
            if let Err(e) = ui.dispose() {
                log::warn!("plot UI dispose failed: {e}");
            }
        }
    }
}
