use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use rxmap_cli::dashboard::{DashboardData, bar};
use rxmap_model::{FinalStatus, RunStatistics};
use rxmap_output::ExportRow;

use crate::commands::ProcessResult;

const HISTOGRAM_WIDTH: usize = 40;

pub fn print_run_summary(result: &ProcessResult) {
    println!();
    println!("Mapping completed!");
    let mut table = metrics_table(&result.statistics);
    table.add_row(vec![
        Cell::new("Rows in input"),
        Cell::new(result.total_rows),
    ]);
    println!("{table}");
    println!("Results exported to: {}", result.export_path.display());
    if result.interrupted {
        eprintln!("Run was interrupted; the export holds the products processed so far.");
    }
}

pub fn print_dashboard(data: &DashboardData, limit: usize) {
    let stats = &data.statistics;
    println!("RxNorm Mapping Dashboard");

    let mut metrics = Table::new();
    metrics.set_header(vec![
        header_cell("Total Products"),
        header_cell("Successful Mappings"),
        header_cell("Need Review"),
        header_cell("Success Rate"),
    ]);
    apply_compact_style(&mut metrics);
    metrics.add_row(vec![
        Cell::new(stats.total_processed),
        Cell::new(stats.successful_mappings).fg(Color::Green),
        Cell::new(stats.needs_manual_review).fg(Color::Yellow),
        Cell::new(format!("{:.1}%", stats.success_rate)),
    ]);
    for index in 0..4 {
        align_column(&mut metrics, index, CellAlignment::Right);
    }
    println!("{metrics}");

    print_status_overview(stats);
    print_histogram(data);
    print_details(&data.rows, limit);
}

fn metrics_table(stats: &RunStatistics) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Metric"), header_cell("Value")]);
    apply_compact_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![
        Cell::new("Total processed"),
        Cell::new(stats.total_processed).add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("Successful"),
        count_cell(stats.successful_mappings, Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("Failed"),
        count_cell(stats.failed_mappings, Color::Red),
    ]);
    table.add_row(vec![
        Cell::new("Need review"),
        count_cell(stats.needs_manual_review, Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Success rate"),
        Cell::new(format!("{:.2}%", stats.success_rate)),
    ]);
    table.add_row(vec![
        Cell::new("Review rate"),
        Cell::new(format!("{:.2}%", stats.review_rate)),
    ]);
    table
}

fn print_status_overview(stats: &RunStatistics) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Status"), header_cell("Count")]);
    apply_compact_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![
        Cell::new("Successful"),
        count_cell(stats.successful_mappings, Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("Failed"),
        count_cell(stats.failed_mappings, Color::Red),
    ]);
    table.add_row(vec![
        Cell::new("Need Review"),
        count_cell(stats.needs_manual_review, Color::Yellow),
    ]);
    println!("Mapping Status Overview");
    println!("{table}");
}

fn print_histogram(data: &DashboardData) {
    let histogram = &data.histogram;
    if histogram.total() == 0 {
        return;
    }
    let max = histogram.max_count();
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Score"),
        header_cell("Count"),
        header_cell(""),
    ]);
    apply_compact_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 1, CellAlignment::Right);
    for (score, count) in histogram.buckets() {
        table.add_row(vec![
            Cell::new(score),
            if count == 0 {
                dim_cell(count)
            } else {
                Cell::new(count)
            },
            Cell::new(bar(count, max, HISTOGRAM_WIDTH)).fg(Color::Blue),
        ]);
    }
    println!("AI Confidence Score Distribution");
    println!("{table}");
}

fn print_details(rows: &[ExportRow], limit: usize) {
    if rows.is_empty() || limit == 0 {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Code"),
        header_cell("Product"),
        header_cell("AI Concept"),
        header_cell("Conf."),
        header_cell("RxCUI"),
        header_cell("RxNorm Name"),
        header_cell("TTY"),
        header_cell("Match"),
        header_cell("Status"),
        header_cell("Review"),
        header_cell("Error"),
    ]);
    apply_detail_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 9, CellAlignment::Center);
    for row in rows.iter().take(limit) {
        table.add_row(vec![
            Cell::new(&row.original_code),
            Cell::new(&row.original_name),
            text_cell(&row.ai_primary_concept),
            Cell::new(row.ai_confidence_score),
            text_cell(&row.rxnorm_rxcui),
            text_cell(&row.rxnorm_name),
            text_cell(&row.rxnorm_tty),
            text_cell(&row.rxnorm_match_type),
            status_cell(&row.final_status),
            if row.needs_review {
                Cell::new("yes").fg(Color::Yellow)
            } else {
                dim_cell("no")
            },
            text_cell(&row.error_message),
        ]);
    }
    println!("Detailed Results");
    println!("{table}");
    if rows.len() > limit {
        println!("Showing {limit} of {} rows (use --limit to change)", rows.len());
    }
}

fn apply_compact_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn apply_detail_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(200);
    if table.column_count() >= 11 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Fixed(12)),
            ColumnConstraint::UpperBoundary(Width::Percentage(20)),
            ColumnConstraint::UpperBoundary(Width::Percentage(20)),
            ColumnConstraint::LowerBoundary(Width::Fixed(5)),
            ColumnConstraint::UpperBoundary(Width::Fixed(10)),
            ColumnConstraint::UpperBoundary(Width::Percentage(25)),
            ColumnConstraint::UpperBoundary(Width::Fixed(6)),
            ColumnConstraint::UpperBoundary(Width::Fixed(12)),
            ColumnConstraint::LowerBoundary(Width::Fixed(10)),
            ColumnConstraint::LowerBoundary(Width::Fixed(6)),
            ColumnConstraint::UpperBoundary(Width::Percentage(20)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(status: &str) -> Cell {
    let color = match status.parse::<FinalStatus>() {
        Ok(FinalStatus::Success) => Color::Green,
        Ok(FinalStatus::Failed | FinalStatus::AiFailed) => Color::Yellow,
        Ok(FinalStatus::Error) | Err(_) => Color::Red,
    };
    Cell::new(status).fg(color)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count == 0 {
        dim_cell(count)
    } else {
        Cell::new(count).fg(color)
    }
}

fn text_cell(value: &str) -> Cell {
    if value.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(value)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
