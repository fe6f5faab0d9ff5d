use junit_report::{Duration, ReportBuilder, TestCaseBuilder, TestSuiteBuilder};
use once_cell::sync::OnceCell;
use prettytable::{Cell, Row, Table};
use std::cell::RefCell;
use std::path::Path;

use crate::sim_if;

pub static HARNESS_NAME: OnceCell<String> = OnceCell::new();

/// Names the JUnit test suite. First caller wins; defaults to the crate name.
pub fn set_harness_name(name: &str) {
    let _ = HARNESS_NAME.set(name.to_string());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckError {
    /// A transition occurred where idleness was required, or the signal
    /// changed more recently than the idle-time claim allows.
    UnexpectedActivity,
    /// A signal's value did not equal the expected level/value.
    LevelMismatch,
}

#[derive(Debug, Clone)]
pub struct CheckReport {
    pub error: Option<CheckError>,
    pub prefix: String,
    pub msg: String,
    pub detail: String,
    pub sim_time: u64,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

thread_local! {
    static REPORTS: RefCell<Vec<CheckReport>> = const { RefCell::new(Vec::new()) };
}

pub(crate) fn pass(prefix: &str, msg: &str, detail: String) {
    REPORTS.with(|r| {
        r.borrow_mut().push(CheckReport {
            error: None,
            prefix: prefix.to_string(),
            msg: msg.to_string(),
            detail,
            sim_time: sim_if::sim_time_steps(),
        })
    });
}

/// Record a failed check. Non-fatal: the report is logged and collected, the
/// owning task keeps running, so one harness run can surface several
/// independent failures.
pub(crate) fn fail(error: CheckError, prefix: &str, msg: &str, detail: String) {
    sim_if::log(&format!("{}FAIL ({:?}) {}: {}", prefix, error, msg, detail));
    REPORTS.with(|r| {
        r.borrow_mut().push(CheckReport {
            error: Some(error),
            prefix: prefix.to_string(),
            msg: msg.to_string(),
            detail,
            sim_time: sim_if::sim_time_steps(),
        })
    });
}

pub fn reports() -> Vec<CheckReport> {
    REPORTS.with(|r| r.borrow().clone())
}

pub fn total_count() -> usize {
    REPORTS.with(|r| r.borrow().len())
}

pub fn failed_count() -> usize {
    REPORTS.with(|r| r.borrow().iter().filter(|c| !c.passed()).count())
}

pub fn error_count(error: CheckError) -> usize {
    REPORTS.with(|r| {
        r.borrow()
            .iter()
            .filter(|c| c.error == Some(error))
            .count()
    })
}

pub fn clear() {
    REPORTS.with(|r| r.borrow_mut().clear());
}

/// Print a summary table of all recorded checks to stdout.
pub fn print_summary() {
    let mut table = Table::new();
    table.set_titles(Row::new(vec![
        Cell::new("result"),
        Cell::new("check"),
        Cell::new("time"),
        Cell::new("detail"),
    ]));
    for report in reports() {
        let result = match report.error {
            None => "pass".to_string(),
            Some(e) => format!("FAIL ({:?})", e),
        };
        table.add_row(Row::new(vec![
            Cell::new(&result),
            Cell::new(&format!("{}{}", report.prefix, report.msg)),
            Cell::new(&report.sim_time.to_string()),
            Cell::new(&report.detail),
        ]));
    }
    table.printstd();
    sim_if::log(&format!(
        "{} checks, {} failed",
        total_count(),
        failed_count()
    ));
}

/// Write all recorded checks as a JUnit XML report, one test case per check.
pub fn write_junit_xml(path: &Path) -> std::io::Result<()> {
    let mut test_cases = Vec::new();
    for (i, check) in reports().iter().enumerate() {
        let name = format!("{}: {}{}", i, check.prefix, check.msg);
        // simulated nanoseconds stand in for wall-clock duration
        let duration = Duration::seconds_f64(check.sim_time as f64 * 1e-9);
        let tc = match check.error {
            None => TestCaseBuilder::success(&name, duration),
            Some(e) => {
                TestCaseBuilder::failure(&name, duration, &format!("{:?}", e), &check.detail)
            }
        }
        .build();
        test_cases.push(tc);
    }

    let suite_name = HARNESS_NAME
        .get()
        .map(|s| s.as_str())
        .unwrap_or(env!("CARGO_PKG_NAME"));
    let test_suite = TestSuiteBuilder::new(suite_name)
        .add_testcases(test_cases)
        .build();
    let report = ReportBuilder::new().add_testsuite(test_suite).build();
    let file = std::fs::File::create(path)?;
    report
        .write_xml(file)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_distinguish_error_kinds() {
        clear();
        pass("TB: ", "idle check", "ok".to_string());
        fail(
            CheckError::UnexpectedActivity,
            "TB: ",
            "idle check",
            "changed 3 steps ago".to_string(),
        );
        fail(
            CheckError::LevelMismatch,
            "TB: ",
            "level check",
            "expected 1, got 0".to_string(),
        );
        assert_eq!(total_count(), 3);
        assert_eq!(failed_count(), 2);
        assert_eq!(error_count(CheckError::UnexpectedActivity), 1);
        assert_eq!(error_count(CheckError::LevelMismatch), 1);
        clear();
        assert_eq!(total_count(), 0);
    }

    #[test]
    fn junit_export_writes_a_file() {
        clear();
        pass("", "a check", String::new());
        fail(
            CheckError::LevelMismatch,
            "",
            "b check",
            "expected 1, got 0".to_string(),
        );
        let path = std::env::temp_dir().join("clkcheck_junit_test.xml");
        write_junit_xml(&path).unwrap();
        let xml = std::fs::read_to_string(&path).unwrap();
        assert!(xml.contains("b check"));
        assert!(xml.contains("LevelMismatch"));
        let _ = std::fs::remove_file(&path);
        clear();
    }
}
