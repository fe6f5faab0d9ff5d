use crate::signal::Signal;
use crate::sim_if;
use crate::trigger::Trigger;
use crate::value::Val;
use crate::TbResult;

/// Free-running 50/50 clock generator. Never returns; fork it and let test
/// teardown cancel it.
#[allow(unreachable_code)]
pub async fn clock(clk: Signal, period: u32, unit: &str) -> TbResult {
    let high_t = period / 2;
    let low_t = period - high_t;
    if period % 2 != 0 {
        sim_if::log(&format!(
            "Warning: Clock period {period}{unit} not dividable by 2. High time will be {high_t}{unit}; low time will be {low_t}{unit}."
        ));
    }
    loop {
        clk.set(0);
        Trigger::timer(low_t as u64, unit).await;
        clk.set(1);
        Trigger::timer(high_t as u64, unit).await;
    }
    Ok(Val::None)
}

/// Drives `sig` high for exactly one clock period: waits for the next rising
/// edge of `clk`, drives high, waits for the following rising edge, drives
/// low. The pulse is edge aligned and never glitches between edges.
pub async fn pulse(sig: Signal, clk: Signal) -> TbResult {
    clk.rising_edge().await;
    sig.set(1);
    clk.rising_edge().await;
    sig.set(0);
    Ok(Val::None)
}

/// Blocks until a rising edge of `clk` at which `sig` holds `value`. The
/// signal is sampled after values settle for the tick; a mid-cycle match
/// never satisfies the wait. A condition that is never met stalls the owning
/// task indefinitely, as in any event-driven testbench.
pub async fn clocked_wait_for(value: u32, sig: Signal, clk: Signal) -> TbResult {
    loop {
        clk.rising_edge_ro().await?;
        if sig.u32() == value {
            return Ok(Val::None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn pulse_is_exactly_one_clock_period_wide() {
        let events = TbObj::new(Vec::new());
        let ev = events.clone();
        let result = sim::run_test("pulse", async move {
            let clk = Signal::new("pulse.clk", 1);
            let sig = Signal::new("pulse.sig", 1);
            Task::fork(clock(clk, 10, "ns"));
            Task::fork(async move {
                loop {
                    sig.edge().await;
                    ev.with_mut(|v| v.push((sim_if::sim_time_steps(), sig.u32())));
                }
            });
            pulse(sig, clk).await?;
            // let the monitor observe the falling edge before finishing
            Trigger::timer(1, "ns").await;
            Ok(Val::None)
        });
        assert_eq!(result, Ok(Val::None));
        // clock rises at t=5 and t=15: pulse spans exactly one period
        assert_eq!(events.get().as_slice(), &[(5, 1), (15, 0)]);
    }

    #[test]
    fn clocked_wait_for_resolves_on_edge_not_midcycle() {
        let result = sim::run_test("clocked wait", async {
            let clk = Signal::new("cwf.clk", 1);
            let sig = Signal::new("cwf.sig", 1);
            Task::fork(clock(clk, 10, "ns"));
            Task::fork(async move {
                // mid-cycle change, between the edges at t=5 and t=15
                Trigger::timer(12, "ns").await;
                sig.set(1);
                Ok(Val::None)
            });
            clocked_wait_for(1, sig, clk).await?;
            // resolves at the first rising edge with sig high, not at t=12
            assert_eq!(sim_if::sim_time_steps(), 15);
            Ok(Val::None)
        });
        assert_eq!(result, Ok(Val::None));
    }

    #[test]
    fn clocked_wait_for_matches_on_first_edge_if_already_held() {
        let result = sim::run_test("clocked wait held", async {
            let clk = Signal::new("cwf2.clk", 1);
            let sig = Signal::new("cwf2.sig", 1);
            Task::fork(clock(clk, 10, "ns"));
            // sig already holds 0; still must wait for an edge
            clocked_wait_for(0, sig, clk).await?;
            assert_eq!(sim_if::sim_time_steps(), 5);
            Ok(Val::None)
        });
        assert_eq!(result, Ok(Val::None));
    }

    #[test]
    fn clock_cycles_counts_rising_edges() {
        let result = sim::run_test("cycles", async {
            let clk = Signal::new("cc.clk", 1);
            Task::fork(clock(clk, 10, "ns"));
            utils::clock_cycles(clk, 3).await?;
            assert_eq!(sim_if::sim_time_steps(), 25);
            Ok(Val::None)
        });
        assert_eq!(result, Ok(Val::None));
    }
}
