//! googletest console output → pass/fail summary.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    /// Started but never reported a verdict (crash, abort, timeout).
    Incomplete,
}

/// One test case, in the order it ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseDetail {
    /// `Suite.Name`
    pub name: String,
    pub status: TestStatus,
    pub duration_ms: Option<u64>,
    /// Output printed between `[ RUN ]` and the verdict.
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTest {
    pub name: String,
    pub duration_ms: Option<u64>,
    /// The verdict line as printed.
    pub output: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GtestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: Vec<FailedTest>,
    pub details: Vec<TestCaseDetail>,
}

impl GtestSummary {
    pub fn all_passed(&self) -> bool {
        self.failed.is_empty() && self.details.iter().all(|d| d.status == TestStatus::Passed)
    }
}

struct Patterns {
    run: Regex,
    ok: Regex,
    failed: Regex,
    total: Regex,
    passed: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |pattern: &str| Regex::new(pattern).expect("valid gtest pattern");
        Patterns {
            run: re(r"^\[\s*RUN\s*\]\s+(?P<name>\S+)"),
            ok: re(r"^\[\s*OK\s*\]\s+(?P<name>\S+)(?:.*?\((?P<ms>\d+) ms\))?"),
            failed: re(r"^\[\s*FAILED\s*\]\s+(?P<name>[^\s,]+)(?:.*?\((?P<ms>\d+) ms\))?"),
            total: re(r"(?P<count>\d+) tests? from \d+ test (?:suites?|cases?)"),
            passed: re(r"^\[\s*PASSED\s*\]\s+(?P<count>\d+) tests?"),
        }
    })
}

fn duration(caps: &regex::Captures<'_>) -> Option<u64> {
    caps.name("ms").and_then(|m| m.as_str().parse().ok())
}

/// Parse the console output of a googletest binary.
///
/// The trailing `[ FAILED ]` re-listing is ignored because those names are no
/// longer running. If no `[ PASSED ]` line is printed, `passed` is the number
/// of `[ OK ]` verdicts; if no banner total is printed, `total` is the number
/// of tests seen.
pub fn parse_gtest_output(output: &str) -> GtestSummary {
    let p = patterns();
    let mut summary = GtestSummary::default();
    let mut current: Option<TestCaseDetail> = None;
    let mut total: Option<usize> = None;
    let mut passed: Option<usize> = None;

    for line in output.lines() {
        let line = line.trim_end();

        if line.starts_with("[==========]") {
            if let Some(caps) = p.total.captures(line) {
                total = caps["count"].parse().ok();
            }
        } else if let Some(caps) = p.run.captures(line) {
            if let Some(unfinished) = current.take() {
                finish_incomplete(&mut summary, unfinished);
            }
            current = Some(TestCaseDetail {
                name: caps["name"].to_string(),
                status: TestStatus::Incomplete,
                duration_ms: None,
                messages: Vec::new(),
            });
        } else if let Some(caps) = p.ok.captures(line) {
            if let Some(mut test) = current.take_if(|t| t.name == caps["name"]) {
                test.status = TestStatus::Passed;
                test.duration_ms = duration(&caps);
                summary.details.push(test);
            }
        } else if let Some(caps) = p.failed.captures(line) {
            if let Some(mut test) = current.take_if(|t| t.name == caps["name"]) {
                test.status = TestStatus::Failed;
                test.duration_ms = duration(&caps);
                summary.failed.push(FailedTest {
                    name: test.name.clone(),
                    duration_ms: test.duration_ms,
                    output: line.trim().to_string(),
                });
                summary.details.push(test);
            }
        } else if let Some(caps) = p.passed.captures(line) {
            passed = caps["count"].parse().ok();
        } else if let Some(test) = current.as_mut()
            && !line.trim().is_empty()
        {
            test.messages.push(line.trim().to_string());
        }
    }

    if let Some(unfinished) = current {
        finish_incomplete(&mut summary, unfinished);
    }

    summary.passed = passed.unwrap_or_else(|| {
        summary
            .details
            .iter()
            .filter(|d| d.status == TestStatus::Passed)
            .count()
    });
    summary.total = total.unwrap_or(summary.details.len());
    summary
}

fn finish_incomplete(summary: &mut GtestSummary, test: TestCaseDetail) {
    summary.failed.push(FailedTest {
        name: test.name.clone(),
        duration_ms: None,
        output: format!("{} did not finish", test.name),
    });
    summary.details.push(test);
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUN_OUTPUT: &str = "\
[==========] Running 3 tests from 1 test suite.
[----------] Global test environment set-up.
[----------] 3 tests from MathTest
[ RUN      ] MathTest.Add
[       OK ] MathTest.Add (0 ms)
[ RUN      ] MathTest.Divide
tests/math_test.cpp:14: Failure
Expected equality of these values:
  divide(4, 2)
    Which is: 3
  2
[  FAILED  ] MathTest.Divide (1 ms)
[ RUN      ] MathTest.Negate
[       OK ] MathTest.Negate (0 ms)
[----------] 3 tests from MathTest (1 ms total)

[==========] 3 tests from 1 test suite ran. (1 ms total)
[  PASSED  ] 2 tests.
[  FAILED  ] 1 test, listed below:
[  FAILED  ] MathTest.Divide

 1 FAILED TEST
";

    #[test]
    fn test_counts_and_details() {
        let summary = parse_gtest_output(RUN_OUTPUT);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].name, "MathTest.Divide");
        assert_eq!(summary.failed[0].duration_ms, Some(1));
        assert_eq!(summary.details.len(), 3);
        assert!(!summary.all_passed());
    }

    #[test]
    fn test_messages_collected_between_run_and_verdict() {
        let summary = parse_gtest_output(RUN_OUTPUT);
        let divide = &summary.details[1];
        assert_eq!(divide.status, TestStatus::Failed);
        assert_eq!(divide.messages[0], "tests/math_test.cpp:14: Failure");
        assert_eq!(divide.messages.len(), 5);
        assert!(summary.details[0].messages.is_empty());
    }

    #[test]
    fn test_crashed_test_is_incomplete() {
        let output = "\
[ RUN      ] Io.Read
[       OK ] Io.Read (2 ms)
[ RUN      ] Io.Write
Segmentation fault
";
        let summary = parse_gtest_output(output);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.details[1].status, TestStatus::Incomplete);
        assert_eq!(summary.details[1].messages, vec!["Segmentation fault"]);
        assert_eq!(summary.failed[0].name, "Io.Write");
    }

    #[test]
    fn test_empty_output() {
        let summary = parse_gtest_output("");
        assert_eq!(summary, GtestSummary::default());
        assert!(summary.all_passed());
    }
}
