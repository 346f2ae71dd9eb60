use anyhow::Result;
use serde_json::{Map, Value, json};
use tagsync_config::SyncConfig;

use crate::cli::OutputFormat;
use crate::output::{print_json, print_table};

pub fn list(config: &SyncConfig, format: OutputFormat) -> Result<()> {
    let services = config.services();

    match format {
        OutputFormat::Json => {
            let mut out = Map::new();
            for (name, profile) in &services {
                out.insert(
                    name.clone(),
                    json!({
                        "reserved_patterns": profile.reserved_patterns,
                        "reserved_names": profile.reserved_names,
                        "not_found_codes": profile.not_found_codes,
                        "change_mode": profile.change_mode,
                        "retry_window_secs": config.retry_window(profile).as_secs(),
                    }),
                );
            }
            print_json(&Value::Object(out))
        }
        OutputFormat::Table => {
            let rows = services
                .iter()
                .map(|(name, profile)| {
                    let reserved: Vec<&str> = profile
                        .reserved_patterns
                        .iter()
                        .chain(&profile.reserved_names)
                        .map(String::as_str)
                        .collect();
                    let window = config.retry_window(profile);
                    vec![
                        name.clone(),
                        reserved.join(" "),
                        or_dash(profile.not_found_codes.join(" ")),
                        profile.change_mode.to_string(),
                        if window.is_zero() {
                            "-".to_string()
                        } else {
                            format!("{}s", window.as_secs())
                        },
                    ]
                })
                .collect();
            print_table(
                &["Service", "Reserved", "Not found codes", "Change mode", "Retry window"],
                rows,
            );
            Ok(())
        }
    }
}

fn or_dash(s: String) -> String {
    if s.is_empty() { "-".to_string() } else { s }
}
