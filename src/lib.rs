//! Serialized update pipeline for scientific plot windows.
//!
//! Producers on arbitrary threads submit data beans; rendering happens on
//! exactly one UI-owner thread; at most one update cycle is in flight at a
//! time; each display-mode change tears down and rebuilds the mode-specific
//! plot sub-component. The toolkit layer is consumed through traits and is
//! not part of this crate.
//!
//! Module map:
//! - `bean`: data/GUI beans submitted by producers
//! - `lock`: the single-slot update lock with scoped release
//! - `modes`: display modes and the transition engine
//! - `surface`: traits for the rendering collaborators
//! - `dispatch`: UI-owner thread predicate, scheduling, and a ready-made
//!   owner event loop
//! - `window`: the plot window façade tying the pieces together
//! - `observers`: update-finished notification fan-out
//! - `registry`: session-scoped window lookup by name

pub mod bean;
pub mod dispatch;
pub mod error;
pub mod lock;
pub mod modes;
pub mod observers;
pub mod registry;
pub mod surface;
pub mod window;

// Public re-exports for a compact external API
pub use bean::{DataBean, GuiBean, GuiParam, PlotData, PlotOperation};
pub use dispatch::{UiDispatcher, UiTask, UiThread};
pub use error::UpdateError;
pub use lock::{UpdateGuard, UpdateLock};
pub use modes::{ModeMachine, PlotMode};
pub use observers::{ObserverHub, ObserverId, UpdateEvent, UpdateObserver};
pub use registry::WindowRegistry;
pub use surface::{ApplyError, PlotUi, PlotUiFactory, RenderSurface, TeardownError};
pub use window::PlotWindow;
