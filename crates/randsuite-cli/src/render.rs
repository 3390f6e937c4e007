//! Plain-text tables for battery and single-test results.

use std::fmt::Write;

use randsuite_tests::{BatteryReport, TestKind, TestResult};

const WIDTH: usize = 78;

/// Multi-outcome tests with more p-values than this are elided in the summary.
const ELIDE_ABOVE: usize = 5;

fn conclusion(random: bool) -> &'static str {
    if random { "Random" } else { "Non-Random" }
}

fn header(out: &mut String) {
    let _ = writeln!(out, "{}", "=".repeat(WIDTH));
    let _ = writeln!(
        out,
        "{:>3}  {:<36} {:>11}  {:<11} {:>10}",
        "#", "Test", "Sub-tests", "Conclusion", "P-value"
    );
    let _ = writeln!(out, "{}", "-".repeat(WIDTH));
}

fn outcome_row(out: &mut String, index: usize, label: &str, random: bool, p: f64) {
    let _ = writeln!(
        out,
        "{:>3}  {:<36} {:>11}  {:<11} {:>10.6}",
        "",
        format!("  {index}: {label}"),
        "",
        conclusion(random),
        p
    );
}

fn result_rows(out: &mut String, number: usize, title: &str, result: &TestResult, elide: bool) {
    if !result.is_multi() {
        let p = result.p_value().unwrap_or(f64::NAN);
        let _ = writeln!(
            out,
            "{number:>3}  {title:<36} {:>11}  {:<11} {p:>10.6}",
            "-",
            conclusion(result.passed()),
        );
        return;
    }

    let total = result.outcomes.len();
    let _ = writeln!(
        out,
        "{number:>3}  {title:<36} {:>11}  {:<11} {:>10}",
        format!("{}/{total} pass", result.pass_count()),
        conclusion(result.passed()),
        "-"
    );
    let shown: Vec<usize> = if elide && total > ELIDE_ABOVE {
        vec![0, 1, total - 2, total - 1]
    } else {
        (0..total).collect()
    };
    for (pos, &i) in shown.iter().enumerate() {
        if pos > 0 && i != shown[pos - 1] + 1 {
            let _ = writeln!(out, "{:>3}  {:<36}", "", "  ...");
        }
        let o = &result.outcomes[i];
        outcome_row(out, i + 1, &o.label, o.random, o.p_value);
    }
}

/// Summary table for a full battery run.
pub fn battery_table(report: &BatteryReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "NIST SP 800-22 battery: {} bits, α = {}\n",
        report.bits, report.level
    );
    header(&mut out);
    for (i, entry) in report.entries.iter().enumerate() {
        let number = i + 1;
        match &entry.outcome {
            Ok(result) => result_rows(&mut out, number, entry.kind.title(), result, true),
            Err(e) => {
                let _ = writeln!(
                    out,
                    "{number:>3}  {:<36} {:>11}  {:<11} {:>10}",
                    entry.kind.title(),
                    "-",
                    "Error",
                    "-"
                );
                let _ = writeln!(out, "{:>3}    {e}", "");
            }
        }
    }
    let _ = writeln!(out, "{}", "=".repeat(WIDTH));
    let _ = writeln!(
        out,
        "{}/{} tests judged random, {} not applicable or failed to run",
        report.passed_count(),
        report.entries.len(),
        report.error_count()
    );
    out
}

/// Every outcome of one test, followed by its details line.
pub fn result_table(kind: TestKind, result: &TestResult) -> String {
    let mut out = String::new();
    header(&mut out);
    result_rows(&mut out, kind_number(kind), kind.title(), result, false);
    let _ = writeln!(out, "{}", "-".repeat(WIDTH));
    let _ = writeln!(out, "{}", result.details);
    out
}

fn kind_number(kind: TestKind) -> usize {
    TestKind::ALL
        .iter()
        .position(|&k| k == kind)
        .map_or(0, |i| i + 1)
}
