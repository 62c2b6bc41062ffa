//! Schema output formatter

use comfy_table::{presets::NOTHING, Table};
use serde::Serialize;

use super::common::print_json;
use crate::cli::OutputFormat;
use crate::migration::schema::AttributeSchema;

#[derive(Serialize)]
struct SerializableAttribute<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    required: bool,
    computed: bool,
    requires_replace: bool,
    description: &'a str,
}

#[derive(Serialize)]
struct SerializableSchema<'a> {
    resource_type: &'a str,
    attributes: Vec<SerializableAttribute<'a>>,
}

/// Output the resource schema
pub fn output_schema(resource_type: &str, attributes: &[AttributeSchema], format: &OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!("{}\n", resource_type);
            let mut table = Table::new();
            table.load_preset(NOTHING).set_header(vec![
                "Attribute",
                "Type",
                "Mode",
                "Forces Replace",
                "Description",
            ]);
            for attr in attributes {
                let mode = if attr.required { "required" } else { "computed" };
                let replace = if attr.requires_replace { "Yes" } else { "No" };
                table.add_row(vec![
                    attr.name,
                    attr.kind.as_str(),
                    mode,
                    replace,
                    attr.description,
                ]);
            }
            println!("{}", table);
        }
        OutputFormat::Json => print_json(&SerializableSchema {
            resource_type,
            attributes: attributes
                .iter()
                .map(|a| SerializableAttribute {
                    name: a.name,
                    kind: a.kind.as_str(),
                    required: a.required,
                    computed: a.computed,
                    requires_replace: a.requires_replace,
                    description: a.description,
                })
                .collect(),
        }),
    }
}
