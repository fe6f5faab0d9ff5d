use num_format::{Locale, ToFormattedString};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::sim_if::{SimCallback, SimIf};
use crate::trigger::EdgeKind;
use crate::SimpleResult;

// One engine per thread. Simulations are strictly single threaded and
// cooperative, so scoping all engine state to the owning thread gives each
// test its own isolated simulation.
thread_local! {
    static ENGINE: RefCell<Engine> = RefCell::new(Engine::new());
}

pub(crate) fn with<R>(f: impl FnOnce(&mut Engine) -> R) -> R {
    ENGINE.with(|e| f(&mut e.borrow_mut()))
}

const DEFAULT_PRECISION: i8 = -9; // 1 step = 1 ns

struct SignalState {
    name: String,
    width: u32,
    value: u32,
    last_change: u64,
}

enum CbKind {
    Time(u64),
    Edge(usize),
    ReadWrite,
    ReadOnly,
}

/// Discrete-event kernel backing the `SimIf` contract: signal storage with
/// last-change tracking, a timer queue and end-of-delta callback slots.
/// Signal writes apply immediately; resulting edge events are queued and
/// dispatched by the scheduler loop in `sim`, never from within the write.
pub(crate) struct Engine {
    now: u64,
    precision: i8,
    signals: Vec<SignalState>,
    names: HashMap<String, usize>,
    // absolute step -> callback handle; one callback per distinct time
    timers: BTreeMap<u64, usize>,
    // signal handle -> callback handle
    watched: HashMap<usize, usize>,
    callbacks: HashMap<usize, CbKind>,
    pending_edges: VecDeque<(usize, EdgeKind)>,
    ro_handle: Option<usize>,
    rw_handle: Option<usize>,
    next_cb_hdl: usize,
}

impl Engine {
    fn new() -> Self {
        Engine {
            now: 0,
            precision: DEFAULT_PRECISION,
            signals: Vec::new(),
            names: HashMap::new(),
            timers: BTreeMap::new(),
            watched: HashMap::new(),
            callbacks: HashMap::new(),
            pending_edges: VecDeque::new(),
            ro_handle: None,
            rw_handle: None,
            next_cb_hdl: 0,
        }
    }

    fn new_cb_handle(&mut self, kind: CbKind) -> usize {
        let hdl = self.next_cb_hdl;
        self.next_cb_hdl += 1;
        self.callbacks.insert(hdl, kind);
        hdl
    }

    /// Next pending edge event on a still-watched signal. Events for signals
    /// whose callback was cancelled in the meantime are discarded.
    pub(crate) fn pop_edge(&mut self) -> Option<(usize, EdgeKind)> {
        while let Some((sig_hdl, kind)) = self.pending_edges.pop_front() {
            if self.watched.contains_key(&sig_hdl) {
                return Some((sig_hdl, kind));
            }
        }
        None
    }

    pub(crate) fn take_read_write(&mut self) -> bool {
        match self.rw_handle.take() {
            Some(hdl) => {
                self.callbacks.remove(&hdl);
                true
            }
            None => false,
        }
    }

    pub(crate) fn take_read_only(&mut self) -> bool {
        match self.ro_handle.take() {
            Some(hdl) => {
                self.callbacks.remove(&hdl);
                true
            }
            None => false,
        }
    }

    /// Advance simulated time to the earliest scheduled timer and return its
    /// absolute time. `None` means the event queue has run dry.
    pub(crate) fn advance(&mut self) -> Option<u64> {
        let (time, hdl) = self.timers.pop_first()?;
        self.callbacks.remove(&hdl);
        debug_assert!(time >= self.now);
        self.now = time;
        Some(time)
    }
}

impl SimIf for Engine {
    fn add_signal(&mut self, name: &str, width: u32) -> SimpleResult<usize> {
        if width == 0 || width > 32 || self.names.contains_key(name) {
            return Err(());
        }
        let handle = self.signals.len();
        self.signals.push(SignalState {
            name: name.to_string(),
            width,
            value: 0,
            last_change: 0,
        });
        self.names.insert(name.to_string(), handle);
        Ok(handle)
    }

    fn get_handle_by_name(&self, name: &str) -> SimpleResult<usize> {
        self.names.get(name).copied().ok_or(())
    }

    fn get_full_name(&self, handle: usize) -> SimpleResult<String> {
        self.signals.get(handle).map(|s| s.name.clone()).ok_or(())
    }

    fn get_size(&self, handle: usize) -> u32 {
        self.signals[handle].width
    }

    fn get_value_u32(&self, handle: usize) -> SimpleResult<u32> {
        self.signals.get(handle).map(|s| s.value).ok_or(())
    }

    fn set_value_u32(&mut self, handle: usize, value: u32) -> SimpleResult<()> {
        let now = self.now;
        let sig = self.signals.get_mut(handle).ok_or(())?;
        let masked = if sig.width == 32 {
            value
        } else {
            value & ((1 << sig.width) - 1)
        };
        if masked == sig.value {
            return Ok(());
        }
        sig.value = masked;
        sig.last_change = now;
        let kind = match (sig.width, masked) {
            (1, 1) => EdgeKind::Rising,
            (1, _) => EdgeKind::Falling,
            _ => EdgeKind::Any,
        };
        if self.watched.contains_key(&handle) {
            self.pending_edges.push_back((handle, kind));
        }
        Ok(())
    }

    fn steps_since_change(&self, handle: usize) -> u64 {
        self.now - self.signals[handle].last_change
    }

    fn get_sim_time_steps(&self) -> u64 {
        self.now
    }

    fn get_sim_precision(&self) -> i8 {
        self.precision
    }

    fn register_callback(&mut self, cb: SimCallback) -> SimpleResult<usize> {
        match cb {
            SimCallback::Time(delta) => {
                let abs_time = self.now + delta;
                if self.timers.contains_key(&abs_time) {
                    // trigger aggregates wakers per time, so this is a caller bug
                    return Err(());
                }
                let hdl = self.new_cb_handle(CbKind::Time(abs_time));
                self.timers.insert(abs_time, hdl);
                Ok(hdl)
            }
            SimCallback::Edge(sig_hdl) => {
                if sig_hdl >= self.signals.len() || self.watched.contains_key(&sig_hdl) {
                    return Err(());
                }
                let hdl = self.new_cb_handle(CbKind::Edge(sig_hdl));
                self.watched.insert(sig_hdl, hdl);
                Ok(hdl)
            }
            SimCallback::ReadWrite => {
                if self.rw_handle.is_some() {
                    return Err(());
                }
                let hdl = self.new_cb_handle(CbKind::ReadWrite);
                self.rw_handle = Some(hdl);
                Ok(hdl)
            }
            SimCallback::ReadOnly => {
                if self.ro_handle.is_some() {
                    return Err(());
                }
                let hdl = self.new_cb_handle(CbKind::ReadOnly);
                self.ro_handle = Some(hdl);
                Ok(hdl)
            }
        }
    }

    fn cancel_callback(&mut self, cb_hdl: usize) -> SimpleResult<()> {
        match self.callbacks.remove(&cb_hdl).ok_or(())? {
            CbKind::Time(abs_time) => {
                self.timers.remove(&abs_time);
            }
            CbKind::Edge(sig_hdl) => {
                self.watched.remove(&sig_hdl);
            }
            CbKind::ReadWrite => self.rw_handle = None,
            CbKind::ReadOnly => self.ro_handle = None,
        }
        Ok(())
    }

    fn log(&self, s: &str) {
        println!(
            "{:>14} ns | {}",
            self.now.to_formatted_string(&Locale::en),
            s
        );
    }
}
