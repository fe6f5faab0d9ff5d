use crate::report::{self, CheckError};
use crate::signal::Signal;

/// Expected level of a single-bit signal. `NoCheck` always suppresses the
/// comparison, it never matches or mismatches any value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedLevel {
    NoCheck,
    Low,
    High,
}

/// Expected value of a vector signal, interpreted as an unsigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedValue {
    NoCheck,
    Value(u32),
}

/// Radix used when formatting vector values in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    Bin,
    Dec,
    Hex,
}

fn format_value(value: u32, base: Base) -> String {
    match base {
        Base::Bin => format!("{:#b}", value),
        Base::Dec => format!("{}", value),
        Base::Hex => format!("{:#x}", value),
    }
}

/// Compares a single-bit signal against an expected level and reports a
/// `LevelMismatch` on failure. Reporting is non-fatal.
pub fn compare_level(expected: ExpectedLevel, observed: Signal, msg: &str, prefix: &str) {
    assert!(
        observed.size() == 1,
        "compare_level expects a single-bit signal, {} has width {}",
        observed.name(),
        observed.size()
    );
    let expected = match expected {
        ExpectedLevel::NoCheck => return,
        ExpectedLevel::Low => 0,
        ExpectedLevel::High => 1,
    };
    let got = observed.u32();
    if got == expected {
        report::pass(
            prefix,
            msg,
            format!("'{}' holds level {}", observed.name(), got),
        );
    } else {
        report::fail(
            CheckError::LevelMismatch,
            prefix,
            msg,
            format!(
                "level mismatch on '{}': expected {}, got {}",
                observed.name(),
                expected,
                got
            ),
        );
    }
}

/// Compares a vector signal, interpreted as an unsigned integer, against an
/// expected value and reports a `LevelMismatch` on failure.
pub fn compare_unsigned(
    expected: ExpectedValue,
    observed: Signal,
    msg: &str,
    base: Base,
    prefix: &str,
) {
    let expected = match expected {
        ExpectedValue::NoCheck => return,
        ExpectedValue::Value(v) => v,
    };
    let got = observed.u32();
    if got == expected {
        report::pass(
            prefix,
            msg,
            format!(
                "'{}' holds value {}",
                observed.name(),
                format_value(got, base)
            ),
        );
    } else {
        report::fail(
            CheckError::LevelMismatch,
            prefix,
            msg,
            format!(
                "value mismatch on '{}': expected {}, got {}",
                observed.name(),
                format_value(expected, base),
                format_value(got, base)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn no_check_sentinel_never_mismatches() {
        let result = sim::run_test("sentinel", async {
            let bit = Signal::new("cmp.bit", 1);
            let vec = Signal::new("cmp.vec", 8);
            bit.set(1);
            vec.set(0xa5);
            compare_level(ExpectedLevel::NoCheck, bit, "bit", "");
            compare_unsigned(ExpectedValue::NoCheck, vec, "vec", Base::Hex, "");
            Ok(Val::None)
        });
        assert_eq!(result, Ok(Val::None));
        assert_eq!(report::total_count(), 0);
        assert_eq!(report::error_count(CheckError::LevelMismatch), 0);
    }

    #[test]
    fn mismatches_are_reported_once_each() {
        let result = sim::run_test("mismatch", async {
            let bit = Signal::new("cmp2.bit", 1);
            let vec = Signal::new("cmp2.vec", 8);
            vec.set(0x5a);
            compare_level(ExpectedLevel::High, bit, "bit level", "TB: ");
            compare_unsigned(
                ExpectedValue::Value(0xa5),
                vec,
                "vec value",
                Base::Hex,
                "TB: ",
            );
            Ok(Val::None)
        });
        assert_eq!(result, Ok(Val::None));
        assert_eq!(report::error_count(CheckError::LevelMismatch), 2);
        let failed: Vec<_> = report::reports().into_iter().filter(|r| !r.passed()).collect();
        assert!(failed[1].detail.contains("0xa5"));
        assert!(failed[1].detail.contains("0x5a"));
    }

    #[test]
    fn matches_are_recorded_as_passes() {
        let result = sim::run_test("match", async {
            let bit = Signal::new("cmp3.bit", 1);
            bit.set(1);
            compare_level(ExpectedLevel::High, bit, "bit level", "");
            Ok(Val::None)
        });
        assert_eq!(result, Ok(Val::None));
        assert_eq!(report::total_count(), 1);
        assert_eq!(report::failed_count(), 0);
    }
}
