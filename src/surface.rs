//! Traits for the rendering collaborators driven by the update pipeline.
//!
//! The crate never draws anything itself. The toolkit side supplies a
//! [`RenderSurface`] plus a [`PlotUiFactory`] that builds the mode-specific
//! [`PlotUi`] sub-components; all three are only ever invoked on the
//! UI-owner thread.

use serde_json::Value;

use crate::bean::{DataBean, PlotOperation};
use crate::modes::PlotMode;

/// Error from applying a payload or building a sub-component.
pub type ApplyError = Box<dyn std::error::Error + Send + Sync>;

/// Error from tearing down a sub-component or surface. Teardown failures are
/// logged and swallowed by the caller; they never block the next mode.
pub type TeardownError = Box<dyn std::error::Error + Send + Sync>;

/// The rendering surface a plot window draws on.
pub trait RenderSurface: Send {
    /// Remove any displayed regions of interest.
    fn clear_regions(&mut self);
    /// Reset the surface to its empty state (no traces, no images).
    fn reset(&mut self);
    /// Force a repaint.
    fn repaint(&mut self);
    /// Release toolkit resources held by the surface.
    fn dispose(&mut self) -> Result<(), TeardownError> {
        Ok(())
    }
}

/// A mode-specific plot sub-component (1D series, 2D image, 2D scatter).
///
/// Built by a [`PlotUiFactory`] when its mode becomes active and torn down
/// when the mode changes. Only `process_update` is required; the lifecycle
/// hooks default to no-ops.
pub trait PlotUi: Send {
    /// The display mode this sub-component renders.
    fn mode(&self) -> PlotMode;

    /// Render the payload of one update cycle.
    ///
    /// `op` distinguishes updating the displayed data in place from
    /// replacing it wholesale.
    fn process_update(&mut self, bean: &DataBean, op: PlotOperation) -> Result<(), ApplyError>;

    /// Apply region-of-interest parameters carried in the GUI bean.
    fn process_roi(&mut self, rois: &[Value]) -> Result<(), ApplyError> {
        let _ = rois;
        Ok(())
    }

    /// Detach from the surface before disposal.
    fn deactivate(&mut self) -> Result<(), TeardownError> {
        Ok(())
    }

    /// Release resources owned by this sub-component.
    fn dispose(&mut self) -> Result<(), TeardownError> {
        Ok(())
    }
}

/// Builds the [`PlotUi`] for a display mode on each transition.
pub trait PlotUiFactory: Send {
    /// Construct the sub-component for `mode`, attached to `surface`.
    ///
    /// Never called for [`PlotMode::Empty`], which has no sub-component.
    fn build(
        &mut self,
        mode: PlotMode,
        surface: &mut dyn RenderSurface,
    ) -> Result<Box<dyn PlotUi>, ApplyError>;
}
