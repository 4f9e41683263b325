use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use osod_payload::{Payload, PayloadDescriptor};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Csv,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PayloadOutput<'a> {
    tag: u8,
    size: usize,
    #[serde(flatten)]
    payload: &'a Payload,
    timestamp: String,
}

#[derive(Serialize)]
struct KindOutput<'a> {
    tag: u8,
    kind: &'a str,
    size: usize,
    fields: Vec<FieldOutput<'a>>,
}

#[derive(Serialize)]
struct FieldOutput<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    ty: &'a str,
}

pub fn print_payload(payload: &Payload, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PayloadOutput {
                tag: payload.kind().tag(),
                size: payload.size(),
                payload,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "FIELD", "VALUE"]);
            for (name, value) in payload.fields() {
                table.add_row(vec![
                    payload.kind().name().to_string(),
                    name.to_string(),
                    value.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{payload}");
        }
        OutputFormat::Csv => {
            println!("{}", csv_line(payload));
        }
    }
}

pub fn print_kinds(descriptors: &[PayloadDescriptor], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<_> = descriptors
                .iter()
                .map(|d| KindOutput {
                    tag: d.kind.tag(),
                    kind: d.kind.name(),
                    size: d.size,
                    fields: d
                        .fields
                        .iter()
                        .map(|f| FieldOutput {
                            name: f.name,
                            ty: f.ty.name(),
                        })
                        .collect(),
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TAG", "KIND", "SIZE", "FIELDS"]);
            for d in descriptors {
                table.add_row(vec![
                    d.kind.tag().to_string(),
                    d.kind.name().to_string(),
                    d.size.to_string(),
                    describe_fields(d),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Csv => {
            for d in descriptors {
                println!(
                    "{} {} size={} fields={}",
                    d.kind.tag(),
                    d.kind.name(),
                    d.size,
                    describe_fields(d)
                );
            }
        }
    }
}

/// Field values joined by commas, in wire order.
pub fn csv_line(payload: &Payload) -> String {
    payload
        .fields()
        .iter()
        .map(|(_, value)| value.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn describe_fields(descriptor: &PayloadDescriptor) -> String {
    descriptor
        .fields
        .iter()
        .map(|f| format!("{}:{}", f.name, f.ty.name()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
