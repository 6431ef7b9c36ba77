//! Terminal rendering of the collected series, raw data, and correlation

use comfy_table::{Cell, Color, Table};

use super::ui;
use crate::core::series::{NamedSeriesSet, PipelineWarning, SeriesOutcome};
use crate::core::table::{CorrelationMatrix, MergedTable};

/// One overview row per named series, index first: observation count,
/// covered range, latest value, and change over the range. Absent series
/// keep their row with N/A cells so the user sees they were attempted.
pub fn series_overview_table(set: &NamedSeriesSet) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Series"),
        ui::header_cell("Points"),
        ui::header_cell("From"),
        ui::header_cell("To"),
        ui::header_cell("Last"),
        ui::header_cell("Change (%)"),
    ]);

    for (label, outcome) in set.iter() {
        match outcome {
            SeriesOutcome::Series(series) => {
                let first = series.first();
                let last = series.last();
                let change = match (first, last) {
                    (Some((_, first_value)), Some((_, last_value))) if *first_value != 0.0 => {
                        Some(((last_value - first_value) / first_value) * 100.0)
                    }
                    _ => None,
                };

                let change_cell = match change {
                    Some(change) if change >= 0.0 => {
                        Cell::new(format!("{change:.2}%")).fg(Color::Green)
                    }
                    Some(change) => Cell::new(format!("{change:.2}%")).fg(Color::Red),
                    None => ui::na_cell(false),
                };

                table.add_row(vec![
                    Cell::new(label),
                    Cell::new(series.len().to_string()),
                    ui::format_optional_cell(first, |(date, _)| date.to_string()),
                    ui::format_optional_cell(last, |(date, _)| date.to_string()),
                    ui::format_optional_cell(last, |(_, value)| format!("{value:.4}")),
                    change_cell,
                ]);
            }
            SeriesOutcome::Absent(reason) => {
                let is_error = matches!(reason, crate::core::series::AbsenceReason::Transport(_));
                table.add_row(vec![
                    Cell::new(label),
                    ui::na_cell(is_error),
                    ui::na_cell(is_error),
                    ui::na_cell(is_error),
                    ui::na_cell(is_error),
                    ui::na_cell(is_error),
                ]);
            }
        }
    }

    table
}

/// The outer-joined raw data, most recent row first.
pub fn merged_data_table(merged: &MergedTable) -> Table {
    let mut table = ui::new_styled_table();

    let mut header = vec![ui::header_cell("Date")];
    for label in &merged.labels {
        header.push(ui::header_cell(label));
    }
    table.set_header(header);

    for (date, cells) in &merged.rows {
        let mut row = vec![Cell::new(date.to_string())];
        for cell in cells {
            row.push(ui::format_optional_cell(*cell, |v| format!("{v:.4}")));
        }
        table.add_row(row);
    }

    table
}

/// Pairwise Pearson correlation over the merged columns.
pub fn correlation_table(matrix: &CorrelationMatrix) -> Table {
    let mut table = ui::new_styled_table();

    let mut header = vec![ui::header_cell("")];
    for label in &matrix.labels {
        header.push(ui::header_cell(label));
    }
    table.set_header(header);

    for (label, row) in matrix.labels.iter().zip(&matrix.cells) {
        let mut cells = vec![ui::header_cell(label)];
        for value in row {
            cells.push(ui::format_optional_cell(*value, |v| format!("{v:.4}")));
        }
        table.add_row(cells);
    }

    table
}

/// Prints the whole dashboard: warnings first, then the three grids.
pub fn render(
    index_label: &str,
    set: &NamedSeriesSet,
    warnings: &[PipelineWarning],
    merged: &MergedTable,
    matrix: &CorrelationMatrix,
) {
    for warning in warnings {
        let style_type = if warning.is_error() {
            ui::StyleType::Error
        } else {
            ui::StyleType::Warning
        };
        println!("{}", ui::style_text(&warning.to_string(), style_type));
    }
    if !warnings.is_empty() {
        println!();
    }

    println!(
        "{}\n",
        ui::style_text(
            &format!("{index_label} Index and Selected Currencies"),
            ui::StyleType::Title
        )
    );
    println!("{}", series_overview_table(set));

    println!("\n{}\n", ui::style_text("Raw Data", ui::StyleType::Title));
    if merged.is_empty() {
        println!("{}", ui::style_text("No data to display.", ui::StyleType::Subtle));
    } else {
        println!("{}", merged_data_table(merged));
    }

    println!(
        "\n{}\n",
        ui::style_text("Correlation Table", ui::StyleType::Title)
    );
    println!("{}", correlation_table(matrix));
}
