//! Built-in service profiles.
//!
//! Only EC2 (instances and their volumes) and DynamoDB retry on "not found"; every
//! other service is tagged with a single attempt unless configured otherwise.
//! Elastic Beanstalk overwrites changed values in place; every other service deletes
//! a changed key before writing its new value.

use std::collections::BTreeMap;

use tagsync_core::ChangeMode;

use crate::settings::ServiceProfile;

/// Names of all built-in profiles, sorted.
pub const SERVICE_NAMES: &[&str] = &[
    "acm",
    "cloudtrail",
    "directoryservice",
    "dynamodb",
    "ec2",
    "ec2-volume",
    "elasticache",
    "elasticbeanstalk",
    "elasticsearch",
    "elbv2",
    "generic",
    "inspector",
    "kms",
];

/// Returns the built-in profile for `name`, if there is one.
pub fn profile(name: &str) -> Option<ServiceProfile> {
    let recreate = || ServiceProfile::default().with_change_mode(ChangeMode::DeleteBeforeRecreate);
    let single_attempt = || recreate().with_retry_window_secs(0);

    let profile = match name {
        "ec2" => recreate()
            .with_not_found_codes([".NotFound"])
            .with_retry_window_secs(300),
        "ec2-volume" => recreate()
            .with_not_found_codes([".NotFound"])
            .with_retry_window_secs(120),
        // DynamoDB tags are passed through unfiltered
        "dynamodb" => recreate()
            .with_reserved_patterns(Vec::<String>::new())
            .with_not_found_codes(["ResourceNotFoundException"])
            .with_retry_window_secs(120),
        "elasticbeanstalk" => ServiceProfile::default()
            .with_retry_window_secs(0)
            .with_reserved_patterns(["^aws:", "^elasticbeanstalk:"])
            .with_reserved_names(["Name"]),
        "acm" | "cloudtrail" | "directoryservice" | "elasticache" | "elasticsearch"
        | "elbv2" | "generic" | "inspector" | "kms" => single_attempt(),
        _ => return None,
    };
    Some(profile)
}

/// All built-in profiles keyed by service name.
pub fn profiles() -> BTreeMap<String, ServiceProfile> {
    SERVICE_NAMES
        .iter()
        .filter_map(|name| profile(name).map(|p| (name.to_string(), p)))
        .collect()
}
