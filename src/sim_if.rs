#![allow(clippy::result_unit_err)]

use crate::engine;
use crate::SimpleResult;

#[derive(Debug, Hash, Clone, Eq, PartialEq)]
pub enum SimCallback {
    Time(u64),
    Edge(usize),
    ReadWrite,
    ReadOnly,
}

/// Contract this crate expects from the hosting simulation engine: signal
/// storage with last-change tracking, simulated time, and suspension
/// callbacks. The in-process `engine::Engine` is the only backend, but all
/// access goes through this trait so the primitives stay decoupled from it.
pub trait SimIf {
    fn add_signal(&mut self, name: &str, width: u32) -> SimpleResult<usize>;
    fn get_handle_by_name(&self, name: &str) -> SimpleResult<usize>;
    fn get_full_name(&self, handle: usize) -> SimpleResult<String>;
    fn get_size(&self, handle: usize) -> u32;
    fn get_value_u32(&self, handle: usize) -> SimpleResult<u32>;
    fn set_value_u32(&mut self, handle: usize, value: u32) -> SimpleResult<()>;
    fn steps_since_change(&self, handle: usize) -> u64;
    fn get_sim_time_steps(&self) -> u64;
    fn get_sim_precision(&self) -> i8;
    fn register_callback(&mut self, cb: SimCallback) -> SimpleResult<usize>;
    fn cancel_callback(&mut self, cb_hdl: usize) -> SimpleResult<()>;
    fn log(&self, s: &str);
    fn get_sim_time(&self, unit: &str) -> f64 {
        // this function does not preserve precision, so don't use carelessly
        let t = self.get_sim_time_steps() as f64;
        let precision = self.get_sim_precision();
        ldexp10(t, precision - time_scale(unit).unwrap())
    }
    fn get_sim_steps(&self, time: f64, unit: &str) -> u64 {
        let precision = self.get_sim_precision();
        let steps = ldexp10(time, time_scale(unit).unwrap() - precision);
        if steps % 1.0 == 0.0 {
            steps as u64
        } else {
            panic!(
                "Can't convert time {} {} to sim steps without rounding (sim precision: {})",
                time,
                unit,
                scale_time(precision).unwrap()
            );
        }
    }
}

pub fn with_sim<R>(f: impl FnOnce(&mut dyn SimIf) -> R) -> R {
    engine::with(|e| f(e))
}

// Free-function facade over the thread-current engine, so callers don't have
// to thread a `&mut dyn SimIf` through every await point.

pub fn log(s: &str) {
    with_sim(|sim| sim.log(s))
}

pub fn sim_time_steps() -> u64 {
    with_sim(|sim| sim.get_sim_time_steps())
}

pub fn sim_time(unit: &str) -> f64 {
    with_sim(|sim| sim.get_sim_time(unit))
}

pub fn sim_steps(time: f64, unit: &str) -> u64 {
    with_sim(|sim| sim.get_sim_steps(time, unit))
}

pub(crate) fn register_callback(cb: SimCallback) -> SimpleResult<usize> {
    with_sim(|sim| sim.register_callback(cb))
}

pub(crate) fn cancel_callback(cb_hdl: usize) -> SimpleResult<()> {
    with_sim(|sim| sim.cancel_callback(cb_hdl))
}

fn time_scale(unit: &str) -> SimpleResult<i8> {
    match unit {
        "fs" => Ok(-15),
        "ps" => Ok(-12),
        "ns" => Ok(-9),
        "us" => Ok(-6),
        "ms" => Ok(-3),
        "sec" => Ok(0),
        _ => Err(()),
    }
}

fn scale_time(unit: i8) -> SimpleResult<String> {
    match unit {
        -15 => Ok("fs".to_string()),
        -12 => Ok("ps".to_string()),
        -9 => Ok("ns".to_string()),
        -6 => Ok("us".to_string()),
        -3 => Ok("ms".to_string()),
        0 => Ok("sec".to_string()),
        _ => Err(()),
    }
}

fn ldexp10(frac: f64, exp: i8) -> f64 {
    // Like math.ldexp, but base 10
    if exp >= 0 {
        frac * 10_u64.pow(exp as u32) as f64
    } else {
        let div = 10_u64.pow(-exp as u32) as f64;
        frac / div
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_conversion_round_trips_at_ns_precision() {
        // default precision is 1 ns per step
        assert_eq!(sim_steps(10.0, "ns"), 10);
        assert_eq!(sim_steps(1.0, "us"), 1_000);
        assert_eq!(sim_steps(2.0, "ms"), 2_000_000);
    }

    #[test]
    #[should_panic]
    fn sub_precision_time_panics() {
        sim_steps(1.0, "ps");
    }
}
