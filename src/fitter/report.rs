use std::fmt::Write as _;

use super::fit_engine::FitResult;

fn value_line(
    out: &mut String,
    name: &str,
    value: f64,
    uncertainty: Option<f64>,
    fixed: bool,
) -> std::fmt::Result {
    write!(out, "    {name:<10} = {value:.6} ± ")?;
    match uncertainty {
        Some(u) => write!(out, "{u:.6}")?,
        None => out.push_str("n/a"),
    }
    if fixed {
        out.push_str(" (fixed)");
    }
    out.push('\n');
    Ok(())
}

fn render(result: &FitResult, out: &mut String) -> std::fmt::Result {
    let status = if result.succeeded { "succeeded" } else { "failed" };
    writeln!(out, "[[Fit #{}]] {status}: {}", result.fit_index, result.message)?;

    writeln!(out, "[[Variables]]")?;
    for param in &result.params {
        value_line(out, &param.name, param.value, param.uncertainty, !param.vary)?;
    }

    let peaks = result.peaks();
    if !peaks.is_empty() {
        writeln!(out, "[[Derived]]")?;
        for (i, peak) in peaks.iter().enumerate() {
            value_line(out, &format!("fwhm_{i}"), peak.fwhm.value, peak.fwhm.uncertainty, false)?;
            value_line(out, &format!("area_{i}"), peak.area.value, peak.area.uncertainty, false)?;
        }
    }

    let stats = &result.statistics;
    writeln!(out, "[[Statistics]]")?;
    writeln!(out, "    chi-square         = {:.6e}", stats.chisqr)?;
    match stats.redchi {
        Some(redchi) => writeln!(out, "    reduced chi-square = {redchi:.6e}")?,
        None => writeln!(out, "    reduced chi-square = n/a")?,
    }
    writeln!(
        out,
        "    data points = {}, variables = {}, function evals = {}",
        stats.ndata, stats.nvarys, stats.nfev
    )
}

/// Fixed-format text record of one fit.
///
/// ```text
/// [[Fit #0]] succeeded: Fit succeeded: relative step size is below xtol
/// [[Variables]]
///     amp_0      = 100.000000 ± 0.012345
///     ...
/// [[Derived]]
///     fwhm_0     = 7.064460 ± 0.000321
///     area_0     = 751.988482 ± 0.104000
/// [[Statistics]]
///     chi-square         = 1.234568e-3
///     reduced chi-square = 1.286008e-5
///     data points = 81, variables = 5, function evals = 12
/// ```
pub fn fit_report(result: &FitResult) -> String {
    let mut out = String::new();
    if let Err(e) = render(result, &mut out) {
        log::error!("Failed to format report of fit #{}: {e}", result.fit_index);
    }
    out
}
