use etlcheck_catalog::Registration;
use etlcheck_core::{RuleOutcome, ValidationResult};

use crate::orchestrator::{PipelineOutcome, PipelineReport};
use crate::reconcile::ReconcileSummary;

const MAX_EXAMPLES: usize = 5;

/// Render a deterministic markdown report for a pipeline run.
pub fn render_report(report: &PipelineReport) -> String {
    let mut lines = Vec::new();

    lines.push("# etlcheck Validation Report".to_string());
    lines.push(String::new());
    lines.push("## Run summary".to_string());
    lines.push(format!("- outcome: {}", outcome_label(report.outcome)));
    lines.push(format!(
        "- stages: {}",
        report
            .stages_run
            .iter()
            .map(|stage| stage.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    ));
    lines.push(String::new());

    lines.push("## Registrations".to_string());
    lines.push("| resource | status |".to_string());
    lines.push("| --- | --- |".to_string());
    lines.push(format!(
        "| data source | {} |",
        registration_label(report.registrations.data_source)
    ));
    lines.push(format!(
        "| data asset | {} |",
        registration_label(report.registrations.data_asset)
    ));
    lines.push(format!(
        "| batch definition | {} |",
        registration_label(report.registrations.batch_definition)
    ));
    lines.push(String::new());

    push_stage(&mut lines, "Source stage", report.source.as_ref());
    if let Some(summary) = &report.reconciliation {
        push_reconciliation(&mut lines, summary);
    }
    push_stage(&mut lines, "Target stage", report.target.as_ref());

    lines.join("\n")
}

fn push_stage(lines: &mut Vec<String>, title: &str, result: Option<&ValidationResult>) {
    lines.push(format!("## {title}"));
    let Some(result) = result else {
        lines.push("- not run".to_string());
        lines.push(String::new());
        return;
    };

    lines.push(format!("- suite: {}", result.suite_name));
    lines.push(format!("- rows: {}", result.row_count));
    lines.push(format!(
        "- success: {}",
        if result.success { "yes" } else { "no" }
    ));
    lines.push(String::new());

    if result.rule_outcomes.is_empty() {
        lines.push("- suite has no rules".to_string());
        lines.push(String::new());
        return;
    }

    lines.push("| rule | condition | evaluated | unexpected | passed |".to_string());
    lines.push("| --- | --- | --- | --- | --- |".to_string());
    for outcome in &result.rule_outcomes {
        lines.push(format!(
            "| {} | {} | {} | {} | {} |",
            outcome.rule,
            outcome.rule.row_condition.as_deref().unwrap_or("-"),
            outcome.evaluated_row_count,
            outcome.unexpected_row_count,
            if outcome.passed { "yes" } else { "no" }
        ));
    }
    lines.push(String::new());

    let failures: Vec<&RuleOutcome> = result.failed_outcomes().collect();
    if !failures.is_empty() {
        lines.push("### Failures".to_string());
        for outcome in failures {
            lines.push(failure_line(outcome));
        }
        lines.push(String::new());
    }
}

fn failure_line(outcome: &RuleOutcome) -> String {
    if let Some(error) = &outcome.error {
        return format!("- {}: error: {}", outcome.rule.kind, error);
    }
    let rows = outcome
        .unexpected_rows
        .iter()
        .take(MAX_EXAMPLES)
        .map(|row| row.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let examples = outcome
        .unexpected_values
        .iter()
        .take(MAX_EXAMPLES)
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "- {}: rows [{}] examples [{}]",
        outcome.rule.kind, rows, examples
    )
}

fn push_reconciliation(lines: &mut Vec<String>, summary: &ReconcileSummary) {
    lines.push("## Reconciliation".to_string());
    lines.push("| source | target | output |".to_string());
    lines.push("| --- | --- | --- |".to_string());
    for pair in &summary.pairs {
        lines.push(format!(
            "| {} | {} | {} |",
            pair.source_column, pair.target_column, pair.output_column
        ));
    }
    for skipped in &summary.skipped {
        lines.push(format!(
            "- skipped {} -> {}: {}",
            skipped.source_column, skipped.target_column, skipped.reason
        ));
    }
    lines.push(format!(
        "- rules added: {}, already present: {}",
        summary.rules_added, summary.rules_skipped
    ));
    if summary.padded {
        lines.push("- row counts differed; shorter side padded with nulls".to_string());
    }
    lines.push(String::new());
}

fn outcome_label(outcome: PipelineOutcome) -> &'static str {
    match outcome {
        PipelineOutcome::Passed => "passed",
        PipelineOutcome::SourceFailed => "source validation failed",
        PipelineOutcome::TargetFailed => "target validation failed",
    }
}

fn registration_label(registration: Registration) -> &'static str {
    match registration {
        Registration::Created => "created",
        Registration::AlreadyExists => "already exists",
    }
}
