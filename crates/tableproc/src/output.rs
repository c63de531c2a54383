use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use tableproc_api::{KeyKind, Outcome};

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One answered request, as printed by `query`.
#[derive(Debug, Serialize)]
pub struct QueryReport {
    pub op: &'static str,
    pub kind: i32,
    pub kind_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub result: Outcome,
    pub code: i32,
    pub value: Option<String>,
}

impl QueryReport {
    pub fn new(op: &'static str, kind: i32, key: Option<String>, result: Outcome) -> Self {
        Self {
            op,
            kind,
            kind_name: KeyKind::describe(kind),
            key,
            result,
            code: result.code(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: Option<String>) -> Self {
        self.value = value;
        self
    }
}

pub fn render_report(report: &QueryReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OP", "KIND", "KEY", "RESULT", "VALUE"])
                .add_row(vec![
                    report.op.to_string(),
                    format!("{} ({})", report.kind_name, report.kind),
                    report.key.clone().unwrap_or_default(),
                    result_name(report.result).to_string(),
                    report.value.clone().unwrap_or_default(),
                ]);
            table.to_string()
        }
        OutputFormat::Pretty => {
            let mut line = format!(
                "{} kind={} ({})",
                report.op, report.kind_name, report.kind
            );
            if let Some(key) = &report.key {
                line.push_str(&format!(" key={key}"));
            }
            line.push_str(&format!(
                " result={} ({})",
                result_name(report.result),
                report.code
            ));
            if let Some(value) = &report.value {
                line.push_str(&format!(" value={value}"));
            }
            line
        }
    }
}

pub fn print_report(report: &QueryReport, format: OutputFormat) {
    println!("{}", render_report(report, format));
}

fn result_name(result: Outcome) -> &'static str {
    match result {
        Outcome::Found => "found",
        Outcome::NotFound => "not_found",
        Outcome::Failed => "failed",
    }
}
