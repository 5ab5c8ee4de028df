//! Endpoint listing command.

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use console::style;

use gl_api::{EndpointDescriptor, EndpointTable, ResponseMode};
use gl_core::config::AppConfig;
use gl_core::error::GlResult;

use crate::GlobalArgs;

pub fn run(config: &AppConfig, global: &GlobalArgs, filter: Option<&str>) -> GlResult<()> {
    let table = super::load_endpoints(config, global)?;
    let matching = filtered(&table, filter);

    if matching.is_empty() {
        println!("No endpoints match.");
        return Ok(());
    }

    println!("{}", render_table(&matching));
    println!(
        "\n{} endpoint(s) for API {}",
        style(matching.len()).bold(),
        config.gitlab.api_version
    );
    Ok(())
}

fn filtered<'a>(table: &'a EndpointTable, filter: Option<&str>) -> Vec<&'a EndpointDescriptor> {
    let needle = filter.map(|f| f.replace('-', "_").to_ascii_lowercase());
    table
        .iter()
        .filter(|e| match needle {
            Some(ref n) => e.name.contains(n.as_str()) || e.path.contains(n.as_str()),
            None => true,
        })
        .collect()
}

fn render_table(endpoints: &[&EndpointDescriptor]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec!["Command", "Verb", "Path", "Params", "Response"]);

    for e in endpoints {
        let response = match e.response {
            ResponseMode::Decoded => "json",
            ResponseMode::Raw => "raw",
            ResponseMode::None => "-",
        };
        table.add_row(vec![
            e.name.replace('_', "-"),
            e.verb.to_string(),
            e.path.clone(),
            if e.params { "yes" } else { "-" }.to_string(),
            response.to_string(),
        ]);
    }
    table
}
