use crate::signal::Signal;
use crate::value::Val;
use crate::TbResult;

/// Logic level that activates the synchronous reset of a strobe generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetPolarity {
    ActiveHigh,
    ActiveLow,
}

impl ResetPolarity {
    pub fn is_active(self, level: u32) -> bool {
        match self {
            ResetPolarity::ActiveHigh => level != 0,
            ResetPolarity::ActiveLow => level == 0,
        }
    }
}

/// Strobe period in clock cycles for the given frequency ratio.
pub fn strobe_period(clock_freq: f64, strobe_freq: f64) -> u32 {
    assert!(
        clock_freq > 0.0 && clock_freq.is_finite() && strobe_freq > 0.0 && strobe_freq.is_finite(),
        "strobe frequencies must be positive and finite (clock: {}, strobe: {})",
        clock_freq,
        strobe_freq
    );
    let period = (clock_freq / strobe_freq).ceil() as u32;
    assert!(
        period >= 1,
        "strobe period must be at least one clock cycle (clock: {}, strobe: {})",
        clock_freq,
        strobe_freq
    );
    period
}

// Cycle counter owned by exactly one running generator, advanced once per
// rising clock tick.
struct StrobeState {
    period: u32,
    counter: u32,
    output: bool,
}

impl StrobeState {
    fn new(period: u32) -> Self {
        StrobeState {
            period,
            counter: 0,
            output: false,
        }
    }

    fn tick(&mut self, reset_active: bool) -> bool {
        if reset_active {
            // synchronous reset, highest priority
            self.counter = 0;
            self.output = false;
        } else if self.counter != self.period - 1 {
            self.output = false;
            self.counter += 1;
        } else {
            self.output = true;
            self.counter = 0;
        }
        self.output
    }
}

/// Perpetual frequency-divider strobe process: one evaluation per rising
/// edge of `clock`, driving `strobe_out` high for exactly one cycle out of
/// every `period = ceil(clock_freq / strobe_freq)` cycles. Asserting `reset`
/// (per `polarity`) zeroes the counter and forces the output low on the next
/// evaluated tick; the next pulse arrives exactly `period` ticks after reset
/// is released. Never returns; fork it and let simulation teardown cancel it.
#[allow(unreachable_code)]
pub async fn generate_strobe(
    clock_freq: f64,
    strobe_freq: f64,
    polarity: ResetPolarity,
    reset: Signal,
    clock: Signal,
    strobe_out: Signal,
) -> TbResult {
    let mut state = StrobeState::new(strobe_period(clock_freq, strobe_freq));
    loop {
        // sample reset after values settle for this tick
        clock.rising_edge_ro().await?;
        let out = state.tick(polarity.is_active(reset.u32()));
        strobe_out.set(out as u32);
    }
    Ok(Val::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::clock;
    use crate::prelude::*;

    #[test]
    fn period_is_frequency_ratio_rounded_up() {
        assert_eq!(strobe_period(100.0e6, 1.0e6), 100);
        assert_eq!(strobe_period(100.0e6, 3.0e6), 34);
        assert_eq!(strobe_period(1.0e6, 2.0e6), 1);
    }

    #[test]
    #[should_panic]
    fn non_positive_frequency_is_rejected() {
        strobe_period(100.0e6, 0.0);
    }

    // Samples strobe_out at each falling clock edge, where the value driven
    // at the preceding rising edge is stable. Returns the 1-based indices of
    // the cycles where the strobe was observed high.
    async fn sample_high_cycles(
        clk: Signal,
        strobe_out: Signal,
        cycles: u32,
        mut on_cycle: impl FnMut(u32),
    ) -> Result<Vec<u32>, Val> {
        let mut highs = Vec::new();
        for n in 1..=cycles {
            clk.falling_edge_ro().await?;
            on_cycle(n);
            if strobe_out.is_high() {
                highs.push(n);
            }
        }
        Ok(highs)
    }

    #[test]
    fn strobe_pulses_once_per_period() {
        let result = sim::run_test("strobe period", async {
            let clk = Signal::new("strobe.clk", 1);
            let rst = Signal::new("strobe.rst", 1);
            let out = Signal::new("strobe.out", 1);
            Task::fork(clock(clk, 10, "ns"));
            Task::fork(generate_strobe(
                100.0e6,
                1.0e6,
                ResetPolarity::ActiveHigh,
                rst,
                clk,
                out,
            ));
            let highs = sample_high_cycles(clk, out, 250, |_| {}).await?;
            assert_eq!(highs, vec![100, 200]);
            Ok(Val::None)
        });
        assert_eq!(result, Ok(Val::None));
    }

    #[test]
    fn reset_resynchronizes_the_divider() {
        let result = sim::run_test("strobe reset", async {
            let clk = Signal::new("srst.clk", 1);
            let rst = Signal::new("srst.rst", 1);
            let out = Signal::new("srst.out", 1);
            Task::fork(clock(clk, 10, "ns"));
            Task::fork(generate_strobe(
                100.0e6,
                1.0e6,
                ResetPolarity::ActiveHigh,
                rst,
                clk,
                out,
            ));
            // reset asserted at falling edge 150, released at falling edge
            // 155: rising ticks 151..=155 see it active
            let highs = sample_high_cycles(clk, out, 400, |n| {
                if n == 150 {
                    rst.set(1);
                }
                if n == 155 {
                    rst.set(0);
                }
            })
            .await?;
            // the pulse due at 200 is suppressed; the divider restarts at
            // tick 156 and pulses exactly 100 ticks after the last reset tick
            assert_eq!(highs, vec![100, 255, 355]);
            Ok(Val::None)
        });
        assert_eq!(result, Ok(Val::None));
    }

    #[test]
    fn active_low_reset_polarity() {
        let result = sim::run_test("strobe active low", async {
            let clk = Signal::new("sal.clk", 1);
            let rst_n = Signal::new("sal.rst_n", 1);
            let out = Signal::new("sal.out", 1);
            rst_n.set(1); // deassert before the generator starts
            Task::fork(clock(clk, 10, "ns"));
            Task::fork(generate_strobe(
                100.0e6,
                1.0e6,
                ResetPolarity::ActiveLow,
                rst_n,
                clk,
                out,
            ));
            let highs = sample_high_cycles(clk, out, 210, |_| {}).await?;
            assert_eq!(highs, vec![100, 200]);
            Ok(Val::None)
        });
        assert_eq!(result, Ok(Val::None));
    }

    #[test]
    fn unit_period_strobes_every_cycle() {
        let result = sim::run_test("strobe unit period", async {
            let clk = Signal::new("sup.clk", 1);
            let rst = Signal::new("sup.rst", 1);
            let out = Signal::new("sup.out", 1);
            Task::fork(clock(clk, 10, "ns"));
            Task::fork(generate_strobe(
                1.0e6,
                2.0e6,
                ResetPolarity::ActiveHigh,
                rst,
                clk,
                out,
            ));
            let highs = sample_high_cycles(clk, out, 5, |_| {}).await?;
            assert_eq!(highs, vec![1, 2, 3, 4, 5]);
            Ok(Val::None)
        });
        assert_eq!(result, Ok(Val::None));
    }

    #[test]
    fn reset_at_random_cycle_always_restarts_cleanly() {
        let reset_at = 20 + utils::rand_int(60);
        let result = sim::run_test("strobe random reset", async move {
            let clk = Signal::new("srr.clk", 1);
            let rst = Signal::new("srr.rst", 1);
            let out = Signal::new("srr.out", 1);
            Task::fork(clock(clk, 10, "ns"));
            Task::fork(generate_strobe(
                100.0e6,
                1.0e6,
                ResetPolarity::ActiveHigh,
                rst,
                clk,
                out,
            ));
            let end = reset_at + 101;
            let highs = sample_high_cycles(clk, out, end, |n| {
                if n == reset_at {
                    rst.set(1);
                }
                if n == reset_at + 1 {
                    rst.set(0);
                }
            })
            .await?;
            // single reset tick at reset_at + 1; pulse 100 ticks later
            assert_eq!(highs, vec![reset_at + 101]);
            Ok(Val::None)
        });
        assert_eq!(result, Ok(Val::None));
    }
}
