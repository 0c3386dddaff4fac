//! Plain-text rendering of table views for the terminal.

use std::fmt::Write as _;

use anyhow::Result;
use shared::domain::Record;
use table_core::{Align, CellView, ColumnSet, DetailView, Phase, TableView};

const ACTION_TEXT: &str = "[ver]";

pub fn table(view: &TableView) -> String {
    let mut out = String::new();

    match view.phase {
        Phase::Idle => return "no data requested\n".into(),
        Phase::Bootstrapping => return "loading...\n".into(),
        Phase::ListFailed => {
            if let Some(err) = &view.list_error {
                let _ = writeln!(out, "error: {err}");
            }
            return out;
        }
        Phase::ListReady => {}
    }

    let grid: Vec<Vec<(String, Align)>> = view
        .rows
        .iter()
        .map(|row| row.cells.iter().map(cell_text).collect())
        .collect();

    let mut widths: Vec<usize> = view.headers.iter().map(|h| h.label.chars().count()).collect();
    for row in &grid {
        for (width, (text, _)) in widths.iter_mut().zip(row) {
            *width = (*width).max(text.chars().count());
        }
    }

    let header_line: Vec<String> = view
        .headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| pad(h.label, *w, h.align))
        .collect();
    let _ = writeln!(out, "{}", header_line.join(" | ").trim_end());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));

    for row in &grid {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|((text, align), w)| pad(text, *w, *align))
            .collect();
        let _ = writeln!(out, "{}", line.join(" | ").trim_end());
    }

    let _ = writeln!(out, "{}", footer(view));

    if let Some(err) = &view.list_error {
        let _ = writeln!(out, "refresh failed, showing previous rows: {err}");
    }
    if view.refreshing {
        let _ = writeln!(out, "refreshing...");
    }
    out
}

/// Pagination line: rows-per-page choice, visible range and page position.
pub fn footer(view: &TableView) -> String {
    let (from, to) = if view.rows.is_empty() {
        (0, 0)
    } else {
        let from = view.page_index.saturating_mul(view.page_size).saturating_add(1);
        (from, from.saturating_add(view.rows.len() - 1))
    };
    let pages = view.page_count.max(1);
    let options: Vec<String> = view
        .rows_per_page_options
        .iter()
        .map(|size| {
            if *size == view.page_size {
                format!("[{size}]")
            } else {
                size.to_string()
            }
        })
        .collect();
    format!(
        "Filas por página: {} | {from}-{to} de {} | página {}/{pages}",
        options.join(" "),
        view.total,
        view.page_index.saturating_add(1),
    )
}

pub fn detail(view: &DetailView) -> Result<String> {
    Ok(match view {
        DetailView::Hidden => String::new(),
        DetailView::Loading { id } => format!("loading detail for order {id}...\n"),
        DetailView::Ready { detail } => {
            format!("{}\n", serde_json::to_string_pretty(&detail.payload)?)
        }
        DetailView::Failed { id, error } => format!("detail for order {id} failed: {error}\n"),
    })
}

pub fn columns(set: &ColumnSet) -> String {
    set.iter()
        .map(|column| format!("{:<14} {}\n", column.id, column.label))
        .collect()
}

/// Products have no fixed column layout; every delivered field is listed.
pub fn products(records: &[Record]) -> String {
    let mut out = String::new();
    for record in records {
        let fields: Vec<String> = record
            .fields()
            .filter(|(key, _)| *key != shared::domain::RECORD_ID_FIELD)
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        let _ = writeln!(out, "#{} {}", record.id(), fields.join(" "));
    }
    let _ = writeln!(out, "{} product(s)", records.len());
    out
}

fn cell_text(cell: &CellView) -> (String, Align) {
    match cell {
        CellView::Text { text, align } => (text.clone(), *align),
        CellView::Action { .. } => (ACTION_TEXT.to_string(), Align::Start),
    }
}

fn pad(text: &str, width: usize, align: Align) -> String {
    match align {
        Align::Start => format!("{text:<width$}"),
        Align::End => format!("{text:>width$}"),
    }
}
