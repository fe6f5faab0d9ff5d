use std::cell::RefCell;
use std::future::Future;

use crate::engine;
use crate::executor::{self, Task};
use crate::sim_if::SimCallback;
use crate::trigger;
use crate::value::Val;
use crate::TbResult;

thread_local! {
    static RESULT: RefCell<Option<TbResult>> = const { RefCell::new(None) };
}

/// Runs a test future to completion on the thread-local simulation.
///
/// The future is spawned as the root task; the scheduler then alternates
/// between settling the current timestep (edge events, then ReadWrite, then
/// ReadOnly callbacks) and advancing to the next timer. Forked tasks that are
/// still suspended when the root future resolves (clock generators, strobe
/// processes, monitors) are torn down, matching how a simulator ends a run.
///
/// Returns the root future's result, or `Err` if the event queue ran dry
/// before it resolved (a wait that can never complete).
pub fn run_test(
    name: &str,
    fut: impl Future<Output = TbResult> + Send + 'static,
) -> TbResult {
    RESULT.with(|r| *r.borrow_mut() = None);

    Task::spawn_from_future(
        async move {
            let result = fut.await;
            RESULT.with(|r| *r.borrow_mut() = Some(result));
            Ok(Val::None)
        },
        name,
    );
    executor::run_once();

    let stalled = format!("test '{}' stalled: no pending events", name);
    let result = loop {
        if let Some(result) = RESULT.with(|r| r.borrow_mut().take()) {
            break result;
        }
        // settle the current timestep before advancing time
        if let Some((sig_hdl, kind)) = engine::with(|e| e.pop_edge()) {
            trigger::react(SimCallback::Edge(sig_hdl), Some(kind));
            continue;
        }
        if engine::with(|e| e.take_read_write()) {
            trigger::react(SimCallback::ReadWrite, None);
            continue;
        }
        if engine::with(|e| e.take_read_only()) {
            trigger::react(SimCallback::ReadOnly, None);
            continue;
        }
        match engine::with(|e| e.advance()) {
            Some(t) => trigger::react(SimCallback::Time(t), None),
            None => break Err(Val::String(stalled)),
        }
    };

    // tear down whatever the test left running
    trigger::cancel_all_triggers();
    executor::clear_ready_queue();
    result
}
