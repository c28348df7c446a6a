//! Scenario tests for [`GridController`] against a fake grid host.
//!
//! The fake host stands in for a native table widget: it tracks selection
//! in view-space row indices, clears it on reload, and echoes every
//! selection command back through `notify_selection_changed` on the same
//! call stack.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use trellis::node::{GridRow, VecSource};
use trellis::source::HasText;
use trellis::{GridController, GridHost, GridItemRef, ItemKey};

struct FakeGridHost {
    controller: Mutex<Weak<GridController>>,
    selected: Mutex<BTreeSet<usize>>,
    single_select: AtomicBool,
}

impl FakeGridHost {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            controller: Mutex::new(Weak::new()),
            selected: Mutex::new(BTreeSet::new()),
            single_select: AtomicBool::new(true),
        })
    }

    /// Injects the back-reference and registers with the controller.
    fn bind(self: &Arc<Self>, controller: &Arc<GridController>) {
        *self.controller.lock() = Arc::downgrade(controller);
        controller.attach_host(self.clone());
    }

    fn controller(&self) -> Arc<GridController> {
        self.controller
            .lock()
            .upgrade()
            .expect("controller outlives the host in these tests")
    }

    fn set_single_select(&self, single: bool) {
        self.single_select.store(single, Ordering::SeqCst);
    }

    /// Simulates the user clicking a view row.
    fn click_row(&self, view_row: usize) {
        let controller = self.controller();
        {
            let mut selected = self.selected.lock();
            selected.clear();
            selected.insert(view_row);
        }
        controller.notify_selection_changed();
    }
}

impl GridHost for FakeGridHost {
    fn select_row(&self, view_row: usize) {
        let controller = self.controller();
        {
            let mut selected = self.selected.lock();
            if self.single_select.load(Ordering::SeqCst) {
                selected.clear();
            }
            selected.insert(view_row);
        }
        controller.notify_selection_changed();
    }

    fn deselect_row(&self, view_row: usize) {
        let controller = self.controller();
        self.selected.lock().remove(&view_row);
        controller.notify_selection_changed();
    }

    fn select_all(&self) {
        let controller = self.controller();
        let count = controller.view_row_count();
        *self.selected.lock() = (0..count).collect();
        controller.notify_selection_changed();
    }

    fn deselect_all(&self) {
        let controller = self.controller();
        self.selected.lock().clear();
        controller.notify_selection_changed();
    }

    fn reload(&self) {
        let controller = self.controller();
        self.selected.lock().clear();
        controller.notify_selection_changed();
    }

    fn selected_rows(&self) -> Vec<usize> {
        self.selected.lock().iter().copied().collect()
    }
}

struct Fixture {
    source: Arc<VecSource>,
    controller: Arc<GridController>,
    host: Arc<FakeGridHost>,
    rows: Vec<Arc<GridRow>>,
    labels: Arc<HashMap<ItemKey, String>>,
}

impl Fixture {
    fn text_fn(&self) -> impl Fn(&GridItemRef) -> String + use<> {
        let labels = self.labels.clone();
        move |item| labels[&ItemKey::of(item)].clone()
    }
}

/// Model order: charlie, alice, bob, dave.
fn fixture() -> Fixture {
    let rows: Vec<Arc<GridRow>> = ["charlie", "alice", "bob", "dave"]
        .into_iter()
        .map(GridRow::new)
        .collect();
    let labels: HashMap<ItemKey, String> = rows
        .iter()
        .map(|row| (ItemKey::of(row), row.text()))
        .collect();
    let source = VecSource::from_items(
        rows.iter()
            .map(|row| row.clone() as GridItemRef)
            .collect(),
    );

    let controller = GridController::new();
    let host = FakeGridHost::new();
    host.bind(&controller);
    controller.set_source(source.clone());

    Fixture {
        source,
        controller,
        host,
        rows,
        labels: Arc::new(labels),
    }
}

fn selection_counter(controller: &Arc<GridController>) -> Arc<AtomicUsize> {
    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = counter.clone();
    controller
        .signals()
        .selection_changed
        .connect(move |()| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });
    counter
}

#[test]
fn programmatic_selection_fires_exactly_once() {
    let fx = fixture();
    let events = selection_counter(&fx.controller);

    fx.controller.select_row(2);

    // The host echoed its own callback during select_row; the public
    // signal still fired exactly once.
    assert_eq!(events.load(Ordering::SeqCst), 1);
    assert_eq!(fx.controller.selected_rows(), vec![2]);
    assert_eq!(fx.host.selected_rows(), vec![2]);
}

#[test]
fn user_clicks_are_adopted_from_the_host() {
    let fx = fixture();
    let events = selection_counter(&fx.controller);

    fx.host.click_row(3);

    assert_eq!(events.load(Ordering::SeqCst), 1);
    assert_eq!(fx.controller.selected_rows(), vec![3]);

    // The same click again changes nothing.
    fx.host.click_row(3);
    assert_eq!(events.load(Ordering::SeqCst), 1);
}

#[test]
fn mapping_round_trips_under_filter_and_sort() {
    let fx = fixture();
    let text = fx.text_fn();
    fx.controller.set_filter(move |item| text(item) != "dave");
    let text = fx.text_fn();
    fx.controller.set_sort(move |a, b| text(a).cmp(&text(b)));

    // View order: alice, bob, charlie.
    assert_eq!(fx.controller.view_row_count(), 3);
    assert_eq!(fx.controller.model_to_view(3), None);

    for model_row in 0..4 {
        if let Some(view_row) = fx.controller.model_to_view(model_row) {
            assert_eq!(fx.controller.view_to_model(view_row), Some(model_row));
        }
    }
    assert_eq!(fx.controller.view_to_model(0), Some(1)); // alice
    assert_eq!(fx.controller.view_to_model(2), Some(0)); // charlie
}

#[test]
fn selection_is_translated_to_view_rows() {
    let fx = fixture();
    let text = fx.text_fn();
    fx.controller.set_sort(move |a, b| text(a).cmp(&text(b)));

    // Model row 0 is "charlie", which sorts to view row 2.
    fx.controller.select_row(0);
    assert_eq!(fx.host.selected_rows(), vec![2]);
    assert_eq!(fx.controller.selected_rows(), vec![0]);
}

#[test]
fn host_clicks_are_translated_to_model_rows() {
    let fx = fixture();
    let text = fx.text_fn();
    fx.controller.set_sort(move |a, b| text(a).cmp(&text(b)));

    // View row 0 is "alice" = model row 1.
    fx.host.click_row(0);
    assert_eq!(fx.controller.selected_rows(), vec![1]);
}

#[test]
fn criteria_changes_reapply_selection_without_events() {
    let fx = fixture();
    fx.controller.select_row(0); // charlie
    let events = selection_counter(&fx.controller);

    let text = fx.text_fn();
    fx.controller.set_sort(move |a, b| text(a).cmp(&text(b)));

    // Recomputing the projection moved charlie's view row; the model-space
    // selection did not change, so no signal fired.
    assert_eq!(events.load(Ordering::SeqCst), 0);
    assert_eq!(fx.controller.selected_rows(), vec![0]);
    assert_eq!(fx.host.selected_rows(), vec![2]);
}

#[test]
fn filtered_out_selection_stays_in_model_space() {
    let fx = fixture();
    fx.controller.select_row(2); // bob
    let events = selection_counter(&fx.controller);

    let text = fx.text_fn();
    fx.controller.set_filter(move |item| text(item) != "bob");

    assert_eq!(events.load(Ordering::SeqCst), 0);
    assert!(fx.controller.is_selected(2));
    assert_eq!(fx.controller.model_to_view(2), None);
    assert!(fx.host.selected_rows().is_empty());

    fx.controller.clear_filter();
    assert_eq!(events.load(Ordering::SeqCst), 0);
    assert_eq!(fx.host.selected_rows(), vec![2]);
}

#[test]
fn select_all_uses_the_fast_path() {
    let fx = fixture();
    fx.controller.set_multi_select(true);
    fx.host.set_single_select(false);
    let events = selection_counter(&fx.controller);

    fx.controller.select_all();
    assert_eq!(events.load(Ordering::SeqCst), 1);
    assert_eq!(fx.controller.selected_rows(), vec![0, 1, 2, 3]);
    assert_eq!(fx.host.selected_rows(), vec![0, 1, 2, 3]);

    // Removing one row demotes the flag into explicit indices.
    fx.controller.unselect_row(1);
    assert_eq!(events.load(Ordering::SeqCst), 2);
    assert_eq!(fx.controller.selected_rows(), vec![0, 2, 3]);

    fx.controller.unselect_all();
    assert_eq!(events.load(Ordering::SeqCst), 3);
    assert!(fx.controller.selected_rows().is_empty());
    assert!(fx.host.selected_rows().is_empty());
}

#[test]
fn reload_rematches_selection_by_identity() {
    let fx = fixture();
    fx.controller.select_row(2); // bob
    let events = selection_counter(&fx.controller);

    // Drop charlie; bob shifts from model row 2 to model row 1.
    fx.source.remove(0);
    fx.controller.reload_all();

    assert_eq!(events.load(Ordering::SeqCst), 0);
    assert_eq!(fx.controller.selected_rows(), vec![1]);
    assert_eq!(fx.host.selected_rows(), vec![1]);
}

#[test]
fn reload_drops_vanished_selection_with_one_event() {
    let fx = fixture();
    fx.controller.select_row(2); // bob
    let events = selection_counter(&fx.controller);

    fx.source.remove(2);
    fx.controller.reload_all();

    assert_eq!(events.load(Ordering::SeqCst), 1);
    assert!(fx.controller.selected_rows().is_empty());
    assert!(fx.host.selected_rows().is_empty());
}

#[test]
fn replacing_the_source_preserves_common_items() {
    let fx = fixture();
    fx.controller.select_row(2); // bob
    let events = selection_counter(&fx.controller);

    // New store keeps bob (same item handle) at the front.
    let replacement = VecSource::from_items(vec![
        fx.rows[2].clone() as GridItemRef,
        GridRow::new("erin"),
    ]);
    fx.controller.set_source(replacement);

    assert_eq!(events.load(Ordering::SeqCst), 0);
    assert_eq!(fx.controller.selected_rows(), vec![0]);
}

#[test]
fn select_all_survives_reload_without_rematching() {
    let fx = fixture();
    fx.controller.set_multi_select(true);
    fx.host.set_single_select(false);
    fx.controller.select_all();
    let events = selection_counter(&fx.controller);

    fx.source.remove(3);
    fx.controller.reload_all();

    assert_eq!(events.load(Ordering::SeqCst), 0);
    assert_eq!(fx.controller.selected_rows(), vec![0, 1, 2]);
    assert_eq!(fx.host.selected_rows(), vec![0, 1, 2]);
}
