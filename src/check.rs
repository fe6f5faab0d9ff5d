use crate::compare::{self, Base, ExpectedLevel, ExpectedValue};
use crate::report::{self, CheckError};
use crate::signal::Signal;
use crate::trigger::Trigger;
use crate::value::Val;
use crate::{sim_if, TbResult};

fn check_activity(sig: Signal, idle_steps: u64, msg: &str, prefix: &str) {
    let since = sig.steps_since_change();
    if since < idle_steps {
        report::fail(
            CheckError::UnexpectedActivity,
            prefix,
            msg,
            format!(
                "unexpected activity on '{}': last change {} steps ago, required idle {} steps",
                sig.name(),
                since,
                idle_steps
            ),
        );
    } else {
        report::pass(
            prefix,
            msg,
            format!("'{}' idle for {} steps", sig.name(), since),
        );
    }
}

/// Suspends for `idle_time`, then asserts that no transition occurred on
/// `sig` during that window. If `expected` is not `NoCheck`, additionally
/// verifies the signal currently holds that level. Advances simulated time
/// by `idle_time`; failures are reported, never propagated.
pub async fn check_no_activity(
    sig: Signal,
    idle_time: u64,
    unit: &str,
    expected: ExpectedLevel,
    msg: &str,
    prefix: &str,
) -> TbResult {
    let idle_steps = sim_if::sim_steps(idle_time as f64, unit);
    Trigger::timer_ro(idle_time, unit).await?;
    check_activity(sig, idle_steps, msg, prefix);
    compare::compare_level(expected, sig, msg, prefix);
    Ok(Val::None)
}

/// Vector variant of [`check_no_activity`]: identical idle check, level
/// comparison delegated to the unsigned-value comparator.
pub async fn check_no_activity_vec(
    sig: Signal,
    idle_time: u64,
    unit: &str,
    expected: ExpectedValue,
    msg: &str,
    base: Base,
    prefix: &str,
) -> TbResult {
    let idle_steps = sim_if::sim_steps(idle_time as f64, unit);
    Trigger::timer_ro(idle_time, unit).await?;
    check_activity(sig, idle_steps, msg, prefix);
    compare::compare_unsigned(expected, sig, msg, base, prefix);
    Ok(Val::None)
}

/// Non-blocking: asserts that `sig` has not changed within the last
/// `idle_time`, without advancing simulated time. Used to retroactively
/// validate timing without stalling the caller.
pub fn check_last_activity(
    sig: Signal,
    idle_time: u64,
    unit: &str,
    expected: ExpectedLevel,
    msg: &str,
    prefix: &str,
) {
    let idle_steps = sim_if::sim_steps(idle_time as f64, unit);
    check_activity(sig, idle_steps, msg, prefix);
    compare::compare_level(expected, sig, msg, prefix);
}

/// Vector variant of [`check_last_activity`].
pub fn check_last_activity_vec(
    sig: Signal,
    idle_time: u64,
    unit: &str,
    expected: ExpectedValue,
    msg: &str,
    base: Base,
    prefix: &str,
) {
    let idle_steps = sim_if::sim_steps(idle_time as f64, unit);
    check_activity(sig, idle_steps, msg, prefix);
    compare::compare_unsigned(expected, sig, msg, base, prefix);
}
