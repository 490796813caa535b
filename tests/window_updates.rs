use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde_json::json;

use plotsync::{
    DataBean, GuiBean, GuiParam, PlotData, PlotMode, PlotOperation, PlotUi, PlotUiFactory,
    PlotWindow, RenderSurface, UiDispatcher, UiTask, UiThread, UpdateError, UpdateEvent,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test doubles
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct Series(Vec<[f64; 2]>);
impl PlotData for Series {}

#[derive(Default)]
struct Stats {
    builds: AtomicUsize,
    teardowns: AtomicUsize,
    applies: AtomicUsize,
    update_ops: AtomicUsize,
    rois: AtomicUsize,
    inside: AtomicUsize,
    max_inside: AtomicUsize,
    fail_apply: AtomicBool,
}

struct TestSurface;
impl RenderSurface for TestSurface {
    fn clear_regions(&mut self) {}
    fn reset(&mut self) {}
    fn repaint(&mut self) {}
}

struct TestUi {
    mode: PlotMode,
    stats: Arc<Stats>,
}

impl PlotUi for TestUi {
    fn mode(&self) -> PlotMode {
        self.mode
    }

    fn process_update(
        &mut self,
        _bean: &DataBean,
        op: PlotOperation,
    ) -> Result<(), plotsync::ApplyError> {
        let now = self.stats.inside.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_inside.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_micros(300));
        self.stats.inside.fetch_sub(1, Ordering::SeqCst);

        if self.stats.fail_apply.load(Ordering::SeqCst) {
            return Err("renderer rejected payload".into());
        }
        self.stats.applies.fetch_add(1, Ordering::SeqCst);
        if op == PlotOperation::Update {
            self.stats.update_ops.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn process_roi(&mut self, rois: &[serde_json::Value]) -> Result<(), plotsync::ApplyError> {
        self.stats.rois.fetch_add(rois.len(), Ordering::SeqCst);
        Ok(())
    }

    fn dispose(&mut self) -> Result<(), plotsync::TeardownError> {
        self.stats.teardowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct TestFactory {
    stats: Arc<Stats>,
}

impl PlotUiFactory for TestFactory {
    fn build(
        &mut self,
        mode: PlotMode,
        _surface: &mut dyn RenderSurface,
    ) -> Result<Box<dyn PlotUi>, plotsync::ApplyError> {
        self.stats.builds.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(TestUi {
            mode,
            stats: self.stats.clone(),
        }))
    }
}

/// Treats every thread as the UI owner, so submits run synchronously on the
/// caller and the update lock is the only serializer.
struct InlineDispatcher;
impl UiDispatcher for InlineDispatcher {
    fn is_owner_thread(&self) -> bool {
        true
    }
    fn schedule(&self, _task: UiTask) -> Result<(), UpdateError> {
        unreachable!("inline dispatcher never marshals")
    }
}

fn inline_window(name: &str) -> (PlotWindow, Arc<Stats>) {
    let stats = Arc::new(Stats::default());
    let window = PlotWindow::new(
        name,
        Box::new(TestSurface),
        Box::new(TestFactory {
            stats: stats.clone(),
        }),
        Arc::new(InlineDispatcher),
    );
    (window, stats)
}

fn series_bean(mode: PlotMode) -> DataBean {
    let mut bean = DataBean::with_mode(mode);
    bean.add_data(Series(vec![[0.0, 1.0], [1.0, 4.0]]));
    bean
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

// ─────────────────────────────────────────────────────────────────────────────
// Synchronous path
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn owner_thread_submit_applies_before_returning() {
    let (window, stats) = inline_window("Plot 1");
    window
        .submit(series_bean(PlotMode::Series1d), None)
        .unwrap();
    assert_eq!(window.mode(), PlotMode::Series1d);
    assert_eq!(stats.applies.load(Ordering::SeqCst), 1);
    assert!(window.last_bean().is_some());
}

#[test]
fn explicit_mode_argument_overrides_bean_hint() {
    let (window, _stats) = inline_window("Plot 1");
    window
        .submit(series_bean(PlotMode::Series1d), Some(PlotMode::Scatter2d))
        .unwrap();
    assert_eq!(window.mode(), PlotMode::Scatter2d);
}

#[test]
fn concurrent_submits_never_overlap() {
    let (window, stats) = inline_window("Plot 1");
    let mut handles = Vec::new();
    for _ in 0..8 {
        let window = window.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..20 {
                window
                    .submit(series_bean(PlotMode::Series1d), None)
                    .unwrap();
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(stats.max_inside.load(Ordering::SeqCst), 1);
    assert_eq!(stats.applies.load(Ordering::SeqCst), 160);
    // One transition out of Empty; every other submit reused the view.
    assert_eq!(stats.builds.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_mode_race_settles_on_exactly_one_mode() {
    let (window, stats) = inline_window("Plot 1");
    let w1 = window.clone();
    let w2 = window.clone();
    let a = thread::spawn(move || w1.submit(series_bean(PlotMode::Series1d), None));
    let b = thread::spawn(move || w2.submit(series_bean(PlotMode::Image2d), None));
    a.join().unwrap().unwrap();
    b.join().unwrap().unwrap();

    let final_mode = window.mode();
    assert!(
        final_mode == PlotMode::Series1d || final_mode == PlotMode::Image2d,
        "unexpected final mode {final_mode}"
    );
    // Two full teardown/rebuild cycles in some serial order.
    assert_eq!(stats.builds.load(Ordering::SeqCst), 2);
    assert_eq!(stats.teardowns.load(Ordering::SeqCst), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Marshaled path
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn worker_thread_submit_is_eventually_visible() {
    let ui = UiThread::spawn();
    let stats = Arc::new(Stats::default());
    let window = PlotWindow::new(
        "Plot 1",
        Box::new(TestSurface),
        Box::new(TestFactory {
            stats: stats.clone(),
        }),
        ui.dispatcher(),
    );
    let events = window.subscribe();

    window
        .submit(series_bean(PlotMode::Image2d), None)
        .unwrap();
    // Fire-and-forget: completion shows up via state and observers.
    let w = window.clone();
    assert!(wait_until(Duration::from_secs(2), move || {
        w.mode() == PlotMode::Image2d
    }));
    let event = events.recv_timeout(Duration::from_secs(2)).unwrap();
    assert!(event.is_success());
    assert_eq!(event.mode, PlotMode::Image2d);
    ui.shutdown();
}

#[test]
fn submit_on_owner_thread_is_synchronous() {
    let ui = UiThread::spawn();
    let (tx, rx) = channel();
    let stats = Arc::new(Stats::default());
    let window = PlotWindow::new(
        "Plot 1",
        Box::new(TestSurface),
        Box::new(TestFactory {
            stats: stats.clone(),
        }),
        ui.dispatcher(),
    );
    let w = window.clone();
    ui.dispatcher()
        .schedule(Box::new(move || {
            let result = w.submit(series_bean(PlotMode::Scatter2d), None);
            // The mode change is visible before submit returns.
            tx.send((result.is_ok(), w.mode())).unwrap();
        }))
        .unwrap();
    let (ok, mode) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert!(ok);
    assert_eq!(mode, PlotMode::Scatter2d);
    ui.shutdown();
}

#[test]
fn submit_after_owner_loop_shutdown_is_rejected() {
    let ui = UiThread::spawn();
    let stats = Arc::new(Stats::default());
    let window = PlotWindow::new(
        "Plot 1",
        Box::new(TestSurface),
        Box::new(TestFactory { stats }),
        ui.dispatcher(),
    );
    ui.shutdown();
    let result = window.submit(series_bean(PlotMode::Series1d), None);
    assert!(matches!(result, Err(UpdateError::DisposedTarget)));
    assert_eq!(window.mode(), PlotMode::Empty);
}

// ─────────────────────────────────────────────────────────────────────────────
// Observers
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn observer_gets_exactly_one_notification_per_update() {
    let (window, _stats) = inline_window("Plot 1");
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    let id = window.add_observer(Arc::new(move |_: &UpdateEvent| {
        h.fetch_add(1, Ordering::SeqCst);
    }));

    window
        .submit(series_bean(PlotMode::Series1d), None)
        .unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    window.remove_observer(id);
    window
        .submit(series_bean(PlotMode::Series1d), None)
        .unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn notify_update_finished_broadcasts_bare_event() {
    let (window, _stats) = inline_window("Plot 1");
    let events = window.subscribe();
    window.notify_update_finished();
    let event = events.recv_timeout(Duration::from_secs(1)).unwrap();
    assert!(event.is_success());
    assert_eq!(event.operation, None);
    assert_eq!(event.mode, PlotMode::Empty);
}

// ─────────────────────────────────────────────────────────────────────────────
// GUI parameters
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn update_operation_flag_reaches_the_plot_ui() {
    let (window, stats) = inline_window("Plot 1");
    window
        .submit(series_bean(PlotMode::Series1d), None)
        .unwrap();

    let mut bean = series_bean(PlotMode::Series1d);
    let mut gui = GuiBean::new();
    gui.set(GuiParam::PlotOperation, "UPDATE");
    bean.set_gui(gui);
    window.submit(bean, None).unwrap();

    assert_eq!(stats.applies.load(Ordering::SeqCst), 2);
    assert_eq!(stats.update_ops.load(Ordering::SeqCst), 1);
}

#[test]
fn roi_parameters_are_forwarded() {
    let (window, stats) = inline_window("Plot 1");
    let mut bean = series_bean(PlotMode::Image2d);
    let mut gui = GuiBean::new();
    gui.set(GuiParam::RoiData, json!({"kind": "rect"}));
    gui.set(GuiParam::RoiDataList, json!([{"kind": "line"}, {"kind": "line"}]));
    bean.set_gui(gui);
    window.submit(bean, None).unwrap();
    assert_eq!(stats.rois.load(Ordering::SeqCst), 3);
}

#[test]
fn unknown_gui_mode_is_rejected_and_state_preserved() {
    let (window, stats) = inline_window("Plot 1");
    let events = window.subscribe();

    let mut bean = DataBean::new();
    let mut gui = GuiBean::new();
    gui.set(GuiParam::PlotMode, "HOLOGRAM");
    bean.set_gui(gui);

    let result = window.submit(bean, None);
    assert!(matches!(result, Err(UpdateError::InvalidMode(_))));
    assert_eq!(window.mode(), PlotMode::Empty);
    assert_eq!(stats.builds.load(Ordering::SeqCst), 0);
    assert!(window.last_bean().is_none());

    let event = events.recv_timeout(Duration::from_secs(1)).unwrap();
    assert!(!event.is_success());
}

// ─────────────────────────────────────────────────────────────────────────────
// Failure and lifecycle
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn failed_apply_releases_the_lock_and_keeps_last_bean() {
    let (window, stats) = inline_window("Plot 1");
    window
        .submit(series_bean(PlotMode::Series1d), None)
        .unwrap();
    let retained = window.last_bean().unwrap();

    stats.fail_apply.store(true, Ordering::SeqCst);
    let result = window.submit(series_bean(PlotMode::Series1d), None);
    assert!(matches!(result, Err(UpdateError::Apply(_))));
    // The failed cycle never became the retained bean.
    assert!(Arc::ptr_eq(&retained, &window.last_bean().unwrap()));

    // The lock was released; the next cycle runs instead of deadlocking.
    stats.fail_apply.store(false, Ordering::SeqCst);
    window
        .submit(series_bean(PlotMode::Series1d), None)
        .unwrap();
    assert!(!Arc::ptr_eq(&retained, &window.last_bean().unwrap()));
    assert_eq!(stats.applies.load(Ordering::SeqCst), 2);
}

#[test]
fn disposed_window_rejects_submits() {
    let (window, stats) = inline_window("Plot 1");
    window
        .submit(series_bean(PlotMode::Series1d), None)
        .unwrap();
    window.dispose();
    assert!(window.is_disposed());
    assert_eq!(stats.teardowns.load(Ordering::SeqCst), 1);

    let result = window.submit(series_bean(PlotMode::Image2d), None);
    assert!(matches!(result, Err(UpdateError::DisposedTarget)));
    // Disposal is idempotent.
    window.dispose();
}
