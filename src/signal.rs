#![allow(clippy::result_unit_err)]

use crate::sim_if;
use crate::trigger::Trigger;
use crate::value::Val;
use crate::{SimpleResult, TbResult};

/// Handle to a signal owned by the simulation engine. Single-bit or vector
/// (up to 32 bits), with host-tracked time of last value change.
#[derive(Clone, Copy, Debug)]
pub struct Signal {
    handle: usize,
    width: u32,
}

impl Signal {
    /// Registers a new signal with the engine. Panics on duplicate names or
    /// unsupported widths, which are testbench configuration bugs.
    pub fn new(name: &str, width: u32) -> Self {
        Signal::try_new(name, width)
            .unwrap_or_else(|_| panic!("Could not create signal {} (width {})", name, width))
    }

    pub fn try_new(name: &str, width: u32) -> SimpleResult<Self> {
        let handle = sim_if::with_sim(|sim| sim.add_signal(name, width))?;
        Ok(Signal { handle, width })
    }

    pub fn from_name(name: &str) -> SimpleResult<Self> {
        let handle = sim_if::with_sim(|sim| sim.get_handle_by_name(name))?;
        let width = sim_if::with_sim(|sim| sim.get_size(handle));
        Ok(Signal { handle, width })
    }

    pub fn handle(&self) -> usize {
        self.handle
    }

    pub fn size(&self) -> u32 {
        self.width
    }

    pub fn name(&self) -> String {
        sim_if::with_sim(|sim| sim.get_full_name(self.handle))
            .expect("Couldn't get name of signal")
    }

    pub fn u32(&self) -> u32 {
        sim_if::with_sim(|sim| sim.get_value_u32(self.handle)).unwrap()
    }

    pub fn is_high(&self) -> bool {
        self.u32() != 0
    }

    pub fn set(&self, val: u32) {
        sim_if::with_sim(|sim| sim.set_value_u32(self.handle, val)).unwrap();
    }

    /// Steps elapsed since the last value change ('last_event in HDL terms).
    /// A signal that never changed reports the full simulation time.
    pub fn steps_since_change(&self) -> u64 {
        sim_if::with_sim(|sim| sim.steps_since_change(self.handle))
    }

    // convenience functions to get edge triggers for this signal
    pub fn rising_edge(self) -> Trigger {
        Trigger::rising_edge(self)
    }
    pub async fn rising_edge_ro(self) -> TbResult {
        self.rising_edge().await;
        Trigger::read_only().await;
        Ok(Val::None)
    }
    pub async fn rising_edge_rw(self) -> TbResult {
        self.rising_edge().await;
        Trigger::read_write().await;
        Ok(Val::None)
    }
    pub fn falling_edge(self) -> Trigger {
        Trigger::falling_edge(self)
    }
    pub async fn falling_edge_ro(self) -> TbResult {
        self.falling_edge().await;
        Trigger::read_only().await;
        Ok(Val::None)
    }
    pub fn edge(self) -> Trigger {
        Trigger::edge(self)
    }
}
