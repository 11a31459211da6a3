//! 実行結果のコンソール表示。
use std::fmt::Write;

use console::style;

use super::{LocationOutcome, RunSummary};
use crate::business::BusinessRecord;
use crate::classification::MaterialCategory;

const SEPARATOR_WIDTH: usize = 50;

/// ロケーションごとの結果表と、事業者ごとの詳細一覧を描画する。
#[must_use]
pub fn render(summary: &RunSummary) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", style("Locations").bold());
    for report in &summary.locations {
        let outcome = match &report.outcome {
            LocationOutcome::Searched { found, added } => {
                style(format!("{found} found, {added} new")).green()
            }
            LocationOutcome::NotFound => style("not found".to_string()).yellow(),
            LocationOutcome::Failed { reason } => style(format!("failed: {reason}")).red(),
        };
        let _ = writeln!(out, "  {}: {outcome}", report.location);
    }

    let _ = writeln!(
        out,
        "\n{}\n",
        style(format!(
            "Found {} unique recycling businesses:",
            summary.records.len()
        ))
        .bold()
    );

    for record in &summary.records {
        render_record(&mut out, record);
        let _ = writeln!(out, "\n{}\n", "-".repeat(SEPARATOR_WIDTH));
    }

    out
}

fn render_record(out: &mut String, record: &BusinessRecord) {
    let _ = writeln!(out, "Name: {}", style(&record.name).bold());
    let _ = writeln!(out, "Address: {}", display_or_none(record.address.as_deref()));
    match record.coordinates {
        Some(coordinates) => {
            let _ = writeln!(out, "Coordinates: {}, {}", coordinates.lat, coordinates.lng);
        }
        None => {
            let _ = writeln!(out, "Coordinates: None");
        }
    }
    let _ = writeln!(out, "Place ID: {}", display_or_none(record.external_id()));

    if !record.address_components.is_empty() {
        let _ = writeln!(out, "\nAddress Components:");
        for (component_type, name) in &record.address_components {
            let _ = writeln!(out, "  {component_type}: {name}");
        }
    }

    let _ = writeln!(out, "Phone: {}", display_or_none(record.phone.as_deref()));
    let _ = writeln!(out, "Website: {}", display_or_none(record.website.as_deref()));
    if let Some(rating) = record.rating {
        let _ = writeln!(out, "Rating: {rating}");
    }

    if !record.materials().is_empty() {
        let materials: Vec<&str> = record
            .materials()
            .iter()
            .copied()
            .map(MaterialCategory::as_str)
            .collect();
        let _ = writeln!(out, "\n{}", style("Materials Handled:").cyan());
        let _ = writeln!(out, "{}", materials.join(", "));
    }

    if !record.content_materials().is_empty() {
        let _ = writeln!(out, "\nDetailed Materials (from website analysis):");
        for (category, keywords) in record.content_materials() {
            let _ = writeln!(out, "- {category}: {}", keywords.join(", "));
        }
    }

    if !record.opening_hours.is_empty() {
        let _ = writeln!(out, "\nOpening Hours:");
        for hours in &record.opening_hours {
            let _ = writeln!(out, "  {hours}");
        }
    }
}

fn display_or_none(value: Option<&str>) -> &str {
    value.unwrap_or("None")
}
