use anyhow::Result;
use serde_json::json;
use tagsync_config::SyncConfig;
use tagsync_core::Plan;
use tagsync_engine::ServiceBinding;

use crate::cli::{OutputFormat, PlanArgs};
use crate::document::{read_tags, read_tags_or_stdin, to_wire_json};
use crate::output::{print_field, print_json, print_success, print_table};

pub fn plan(config: &SyncConfig, args: &PlanArgs, format: OutputFormat) -> Result<()> {
    let binding = super::binding_for(config, &args.service)?;
    let previous = read_tags(args.previous.as_deref())?;
    let current = read_tags_or_stdin(args.current.as_deref())?;

    let plan = binding.plan(&previous, &current);
    let (_, reserved) = binding.filter.split(&current);
    let reserved: Vec<&str> = reserved.keys().collect();

    match format {
        OutputFormat::Json => print_json(&json!({
            "service": binding.name,
            "change_mode": binding.change_mode,
            "to_delete": plan.to_delete,
            "to_upsert": to_wire_json(&plan.to_upsert, args.shape, &binding.filter)?,
            "ignored_reserved": reserved,
        })),
        OutputFormat::Table => {
            print_plan_table(&binding, &plan, &reserved);
            Ok(())
        }
    }
}

fn print_plan_table(binding: &ServiceBinding, plan: &Plan, reserved: &[&str]) {
    print_field("Service", &binding.name);
    print_field("Change mode", binding.change_mode);
    if !reserved.is_empty() {
        print_field("Ignored reserved keys", reserved.join(", "));
    }

    if plan.is_empty() {
        print_success("No changes");
        return;
    }

    let mut rows = Vec::new();
    for key in &plan.to_delete {
        rows.push(vec!["delete".to_string(), key.clone(), "-".to_string()]);
    }
    for (key, value) in plan.to_upsert.iter() {
        rows.push(vec!["upsert".to_string(), key.to_string(), value.to_string()]);
    }
    print_table(&["Action", "Key", "Value"], rows);
    println!("Plan: {plan}");
}
