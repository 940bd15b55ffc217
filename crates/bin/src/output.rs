//! Output formatting helpers for human-readable and JSON output.

use scholar_sync::transfer::TransferReport;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Print a table with aligned columns in human-readable format.
///
/// `headers` and each row in `rows` must have the same length.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    let col_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:<width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_line.join("  ").trim_end());

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .take(col_count)
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect();
        println!("{}", line.join("  ").trim_end());
    }
}

/// Print one line per field of a transfer and fail if any field failed.
pub fn print_report(
    report: &TransferReport,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Human => {
            for outcome in &report.outcomes {
                let field = outcome.field.as_str();
                match &outcome.result {
                    Ok(path) => println!("{field:<13} ok      {}", path.display()),
                    Err(err) => {
                        println!("{field:<13} failed  {err}");
                        if let Some(hint) = err.suggestion() {
                            println!("{:<13}         {hint}", "");
                        }
                    }
                }
                if let Some(warning) = outcome.warning {
                    println!("{field:<13} warning {warning}");
                }
            }
        }
        OutputFormat::Json => {
            let entries: Vec<_> = report
                .outcomes
                .iter()
                .map(|o| match &o.result {
                    Ok(path) => serde_json::json!({
                        "field": o.field,
                        "ok": true,
                        "path": path,
                        "warning": o.warning,
                    }),
                    Err(err) => serde_json::json!({
                        "field": o.field,
                        "ok": false,
                        "error": err.to_string(),
                        "suggestion": err.suggestion(),
                    }),
                })
                .collect();
            println!("{}", serde_json::to_string(&entries)?);
        }
    }

    let failed = report.failed().count();
    if failed > 0 {
        return Err(format!("{failed} of {} transfers failed", report.outcomes.len()).into());
    }
    Ok(())
}
