use intmap::IntMap;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use crate::executor;
use crate::{
    signal::Signal,
    sim_if::{self, SimCallback},
    value::Val,
    TbResult,
};

// IntMap specializes on u64 keys, so waker lookup doesn't need to hash anything.
thread_local! {
    // key is signal handle as u64
    static EDGE_MAP: RefCell<IntMap<CallbackHandles>> = RefCell::new(IntMap::new());
    // key is absolute callback time
    static TIMER_MAP: RefCell<IntMap<CallbackHandles>> = RefCell::new(IntMap::new());
    static READ_ONLY: RefCell<CallbackHandles> = RefCell::new(CallbackHandles { handle: None, callbacks: VecDeque::new() });
    static READ_WRITE: RefCell<CallbackHandles> = RefCell::new(CallbackHandles { handle: None, callbacks: VecDeque::new() });
}

struct CallbackHandles {
    handle: Option<usize>,
    callbacks: VecDeque<TrigShared>,
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum EdgeKind {
    Any,
    Rising,
    Falling,
}

pub(crate) fn cancel_all_triggers() {
    // RO
    READ_ONLY.with(|ro| {
        let mut ro = ro.borrow_mut();
        ro.callbacks = VecDeque::new();
        if let Some(handle) = ro.handle.take() {
            sim_if::cancel_callback(handle).unwrap();
        }
    });
    // RW
    READ_WRITE.with(|rw| {
        let mut rw = rw.borrow_mut();
        rw.callbacks = VecDeque::new();
        if let Some(handle) = rw.handle.take() {
            sim_if::cancel_callback(handle).unwrap();
        }
    });
    // Timers
    TIMER_MAP.with(|map| {
        for (_, cb) in map.borrow_mut().drain() {
            sim_if::cancel_callback(cb.handle.unwrap()).unwrap();
        }
    });
    // Edges
    EDGE_MAP.with(|map| {
        for (_, cb) in map.borrow_mut().drain() {
            sim_if::cancel_callback(cb.handle.unwrap()).unwrap();
        }
    });
}

#[derive(Debug, Clone)]
pub struct TrigShared {
    waker: Waker,
    // If trigger is an edge, react() needs to know if it is a rising or falling
    // edge so an existing callback does not have to be rescheduled.
    edge_kind: EdgeKind,
}

#[derive(Clone)]
pub enum TrigKind {
    Edge(usize, EdgeKind),
    Timer(u64),
    ReadWrite,
    ReadOnly,
}

#[derive(Clone)]
pub struct Trigger {
    kind: TrigKind,
    awaited: bool,
}

impl Trigger {
    pub fn timer(time: u64, unit: &str) -> Self {
        Trigger {
            kind: TrigKind::Timer(sim_if::sim_steps(time as f64, unit)),
            awaited: false,
        }
    }
    pub fn timer_steps(steps: u64) -> Self {
        Trigger {
            kind: TrigKind::Timer(steps),
            awaited: false,
        }
    }
    pub async fn timer_ro(time: u64, unit: &str) -> TbResult {
        Trigger::timer(time, unit).await;
        Trigger::read_only().await;
        Ok(Val::None)
    }
    pub async fn timer_rw(time: u64, unit: &str) -> TbResult {
        Trigger::timer(time, unit).await;
        Trigger::read_write().await;
        Ok(Val::None)
    }
    pub fn edge(signal: Signal) -> Self {
        Trigger {
            kind: TrigKind::Edge(signal.handle(), EdgeKind::Any),
            awaited: false,
        }
    }
    pub fn rising_edge(signal: Signal) -> Self {
        Trigger {
            kind: TrigKind::Edge(signal.handle(), EdgeKind::Rising),
            awaited: false,
        }
    }
    pub fn falling_edge(signal: Signal) -> Self {
        Trigger {
            kind: TrigKind::Edge(signal.handle(), EdgeKind::Falling),
            awaited: false,
        }
    }
    pub fn read_write() -> Self {
        Trigger {
            kind: TrigKind::ReadWrite,
            awaited: false,
        }
    }
    pub fn read_only() -> Self {
        Trigger {
            kind: TrigKind::ReadOnly,
            awaited: false,
        }
    }
}

impl Future for Trigger {
    type Output = Val;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A Trigger is only awaited once, so the second time it is polled it
        // must be because the waker signaled its completion.
        if self.awaited {
            return Poll::Ready(Val::None);
        }
        self.awaited = true;
        let mut shared = TrigShared {
            waker: cx.waker().clone(),
            edge_kind: EdgeKind::Any,
        };

        match self.kind {
            TrigKind::ReadWrite => READ_WRITE.with(|rw| {
                let mut rw = rw.borrow_mut();
                rw.callbacks.push_back(shared);
                if rw.handle.is_none() {
                    let cb_hdl = sim_if::register_callback(SimCallback::ReadWrite).unwrap();
                    rw.handle.replace(cb_hdl);
                }
            }),
            TrigKind::ReadOnly => READ_ONLY.with(|ro| {
                let mut ro = ro.borrow_mut();
                ro.callbacks.push_back(shared);
                if ro.handle.is_none() {
                    let cb_hdl = sim_if::register_callback(SimCallback::ReadOnly).unwrap();
                    ro.handle.replace(cb_hdl);
                }
            }),
            TrigKind::Timer(t) => TIMER_MAP.with(|map| {
                // key on absolute time since the engine reports back absolute time, not delta
                let abs_time = t + sim_if::sim_time_steps();
                let mut map = map.borrow_mut();
                if let Some(callbacks) = map.get_mut(abs_time) {
                    callbacks.callbacks.push_back(shared);
                } else {
                    let handle = sim_if::register_callback(SimCallback::Time(t)).unwrap();
                    let mut vec = VecDeque::new();
                    vec.push_back(shared);
                    map.insert(
                        abs_time,
                        CallbackHandles {
                            handle: Some(handle),
                            callbacks: vec,
                        },
                    );
                }
            }),
            TrigKind::Edge(sig_hdl, edge_kind) => EDGE_MAP.with(|map| {
                shared.edge_kind = edge_kind;
                let mut map = map.borrow_mut();
                if let Some(callbacks) = map.get_mut(sig_hdl as u64) {
                    callbacks.callbacks.push_back(shared);
                } else {
                    let handle = sim_if::register_callback(SimCallback::Edge(sig_hdl)).unwrap();
                    let mut vec = VecDeque::new();
                    vec.push_back(shared);
                    map.insert(
                        sig_hdl as u64,
                        CallbackHandles {
                            handle: Some(handle),
                            callbacks: vec,
                        },
                    );
                }
            }),
        }
        Poll::Pending
    }
}

/// Dispatch a fired engine callback to the wakers waiting on it, then pump
/// the executor so woken tasks run to their next suspension point.
#[inline]
pub(crate) fn react(cb: SimCallback, edge: Option<EdgeKind>) {
    let mut vec_wake: Option<VecDeque<TrigShared>> = None;

    match cb {
        SimCallback::ReadWrite => READ_WRITE.with(|rw| {
            let mut rw = rw.borrow_mut();
            rw.handle = None; // remove handle, since CB is now done
            if !rw.callbacks.is_empty() {
                vec_wake = Some(std::mem::take(&mut rw.callbacks));
            } else {
                panic!("Did not expect ReadWrite callback");
            }
        }),
        SimCallback::ReadOnly => READ_ONLY.with(|ro| {
            let mut ro = ro.borrow_mut();
            ro.handle = None; // remove handle, since CB is now done
            if !ro.callbacks.is_empty() {
                vec_wake = Some(std::mem::take(&mut ro.callbacks));
            } else {
                panic!("Did not expect ReadOnly callback");
            }
        }),
        SimCallback::Time(t) => TIMER_MAP.with(|map| {
            if let Some(callbacks) = map.borrow_mut().remove(t) {
                vec_wake = Some(callbacks.callbacks);
            } else {
                panic!("Did not expect Timer callback: t={}", t);
            }
        }),
        SimCallback::Edge(sig_hdl) => EDGE_MAP.with(|map| {
            let mut map = map.borrow_mut();
            let callbacks = map.remove(sig_hdl as u64);
            if let Some(mut callbacks) = callbacks {
                let edge = edge.unwrap();
                match edge {
                    EdgeKind::Any => {
                        sim_if::cancel_callback(callbacks.handle.unwrap()).unwrap();
                        vec_wake = Some(std::mem::take(&mut callbacks.callbacks));
                    }
                    _ => {
                        let mut vec_resched: VecDeque<TrigShared> = VecDeque::new();
                        let mut vec_wake_tmp: VecDeque<TrigShared> = VecDeque::new();
                        for trig in callbacks.callbacks.drain(..) {
                            if trig.edge_kind == EdgeKind::Any || trig.edge_kind == edge {
                                vec_wake_tmp.push_back(trig);
                            } else {
                                vec_resched.push_back(trig);
                            }
                        }
                        if vec_resched.is_empty() {
                            // no callbacks remaining, cancel with the engine
                            sim_if::cancel_callback(callbacks.handle.unwrap()).unwrap();
                        } else {
                            // put rescheduled callbacks back into EDGE_MAP
                            callbacks.callbacks = vec_resched;
                            map.insert(sig_hdl as u64, callbacks);
                        }
                        if !vec_wake_tmp.is_empty() {
                            vec_wake = Some(vec_wake_tmp);
                        }
                    }
                }
            } else {
                panic!("Did not expect Edge callback: sig_hdl={}", sig_hdl);
            }
        }),
    }

    if let Some(vec_wake) = vec_wake {
        for shared in vec_wake {
            shared.waker.wake();
        }
        // execute woken tasks
        executor::run_once();
    }
}
