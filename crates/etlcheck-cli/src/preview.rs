use etlcheck_core::Dataset;

/// Render the first `rows` rows as a fixed-width text table.
pub fn render_preview(dataset: &Dataset, rows: usize) -> String {
    let header: Vec<String> = dataset.column_names().map(str::to_string).collect();
    if header.is_empty() {
        return "(no columns)".to_string();
    }
    let body = dataset.head(rows);

    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            body.iter()
                .map(|row| row[idx].chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = vec![format_row(&header, &widths)];
    lines.extend(body.iter().map(|row| format_row(row, &widths)));
    lines.push(format!(
        "[{} row(s) x {} column(s)]",
        dataset.row_count(),
        header.len()
    ));
    lines.join("\n")
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
