//! Renders rate data, statistics and the converter as terminal text.
use super::ui;
use crate::core::board::{BoardView, DashboardState, RefreshPhase};
use crate::core::converter::ConversionRequest;
use crate::core::rates::RateRecord;
use chrono::{DateTime, Local, TimeZone};
use clap::ValueEnum;
use comfy_table::Cell;
use std::cmp::Ordering;
use tracing::warn;

/// Row order of the rate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortKey {
    /// Order published by the feed
    #[default]
    Feed,
    Code,
    Name,
    Value,
    Change,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardOptions {
    pub sort: SortKey,
    pub descending: bool,
    pub converter: Option<ConversionRequest>,
}

fn format_time<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%d.%m.%Y %H:%M:%S")
        .to_string()
}

pub fn sorted_records(records: &[RateRecord], sort: SortKey, descending: bool) -> Vec<&RateRecord> {
    let mut rows: Vec<&RateRecord> = records.iter().collect();
    let compare = |a: &&RateRecord, b: &&RateRecord| -> Ordering {
        match sort {
            SortKey::Feed => Ordering::Equal,
            SortKey::Code => a.code.cmp(&b.code),
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::Value => a.value.total_cmp(&b.value),
            SortKey::Change => a.change().total_cmp(&b.change()),
        }
    };
    // Stable sort keeps feed order among equal keys.
    rows.sort_by(compare);
    if descending {
        rows.reverse();
    }
    rows
}

/// Maximum, minimum and average as a three-column card row.
pub fn render_stats(state: &DashboardState) -> String {
    let stats = &state.stats;
    let symbol = ui::currency_symbol(&state.snapshot.base_currency);
    let mut table = ui::new_styled_table();

    table.set_header(vec![
        ui::header_cell("Maximum rate"),
        ui::header_cell("Minimum rate"),
        ui::header_cell("Average rate"),
    ]);
    table.add_row(vec![
        ui::rate_cell(stats.max.record.value, symbol),
        ui::rate_cell(stats.min.record.value, symbol),
        ui::rate_cell(stats.average, symbol),
    ]);
    table.add_row(vec![
        Cell::new(format!("{} - {}", stats.max.record.code, stats.max.record.name)),
        Cell::new(format!("{} - {}", stats.min.record.code, stats.min.record.name)),
        Cell::new(format!("Across {} currencies", stats.count)),
    ]);
    table.add_row(vec![
        Cell::new(format_time(&stats.max.timestamp)),
        Cell::new(format_time(&stats.min.timestamp)),
        Cell::new(format_time(&state.snapshot.fetched_at)),
    ]);

    table.to_string()
}

pub fn render_rates_table(state: &DashboardState, options: &DashboardOptions) -> String {
    let symbol = ui::currency_symbol(&state.snapshot.base_currency);
    let mut table = ui::new_styled_table();

    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Code"),
        ui::header_cell("Units"),
        ui::header_cell(&format!("Rate ({symbol})")),
        ui::header_cell("Change"),
    ]);

    for record in sorted_records(&state.snapshot.records, options.sort, options.descending) {
        table.add_row(vec![
            Cell::new(&record.name),
            Cell::new(&record.code),
            Cell::new(record.nominal),
            ui::rate_cell(record.value, symbol),
            ui::change_cell(record),
        ]);
    }

    table.to_string()
}

/// One converter line. A failed conversion is reported, never shown as a number.
pub fn render_conversion(state: &DashboardState, request: &ConversionRequest) -> String {
    match request.apply(&state.snapshot.units_per_base()) {
        Ok(result) => format!(
            "{} {} = {} {}",
            request.amount,
            request.from,
            ui::style_text(&format!("{result:.4}"), ui::StyleType::TotalValue),
            request.to
        ),
        Err(e) => {
            warn!("Cannot convert {request}: {e}");
            ui::style_text(
                &format!("Cannot convert {request}: {e}"),
                ui::StyleType::Error,
            )
        }
    }
}

pub fn render(state: &DashboardState, options: &DashboardOptions) -> String {
    let snapshot = &state.snapshot;
    let mut output = format!(
        "{}\n",
        ui::style_text(
            &format!("Exchange rates against {}", snapshot.base_currency),
            ui::StyleType::Title
        )
    );

    let mut updated = format!("Updated {}", format_time(&snapshot.fetched_at));
    if let Some(as_of) = &snapshot.as_of {
        updated.push_str(&format!(" (published for {})", as_of.format("%d.%m.%Y")));
    }
    output.push_str(&ui::style_text(&updated, ui::StyleType::Subtle));
    output.push_str("\n\n");

    output.push_str(&render_stats(state));
    output.push_str("\n\n");
    output.push_str(&render_rates_table(state, options));

    if let Some(request) = &options.converter {
        output.push_str(&format!(
            "\n\n{}: {}",
            ui::style_text("Converter", ui::StyleType::TotalLabel),
            render_conversion(state, request)
        ));
    }

    output
}

/// Full screen for live mode, including refresh status.
pub fn render_view(view: &BoardView, options: &DashboardOptions) -> String {
    let mut output = match &view.state {
        Some(state) => render(state, options),
        None if view.phase == RefreshPhase::Fetching => {
            ui::style_text("Loading exchange rates...", ui::StyleType::Subtle)
        }
        None => ui::style_text("No data", ui::StyleType::Error),
    };

    if view.phase == RefreshPhase::Fetching && view.state.is_some() {
        output.push_str(&format!(
            "\n\n{}",
            ui::style_text("Refreshing...", ui::StyleType::Subtle)
        ));
    }
    if let Some(e) = &view.last_error {
        let message = if view.is_stale() {
            format!("Refresh failed, showing last good data: {e}")
        } else {
            format!("Refresh failed: {e}")
        };
        output.push_str(&format!("\n\n{}", ui::style_text(&message, ui::StyleType::Warning)));
    }

    output
}
