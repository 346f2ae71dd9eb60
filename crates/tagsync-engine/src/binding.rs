//! Per-service parameters for the synchronizer.

use tagsync_config::{ServiceProfile, SyncConfig};
use tagsync_core::{ApiError, ChangeMode, Plan, ReservedKeyFilter, TagSet, TagSyncError};

use crate::retry::RetryPolicy;

/// Recognizes remote error codes meaning "the resource is not visible yet".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotFoundMatcher {
    codes: Vec<String>,
}

impl NotFoundMatcher {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).filter(|c: &String| !c.is_empty()).collect(),
        }
    }

    /// True when the error code contains any configured code.
    pub fn matches(&self, err: &ApiError) -> bool {
        self.codes.iter().any(|code| err.code.contains(code.as_str()))
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Everything that differs between services: reserved keys, how changed values are
/// written, and how long "not found" is tolerated.
#[derive(Debug, Clone)]
pub struct ServiceBinding {
    pub name: String,
    pub filter: ReservedKeyFilter,
    pub change_mode: ChangeMode,
    pub retry: RetryPolicy,
    pub not_found: NotFoundMatcher,
}

impl ServiceBinding {
    /// A binding reserving the provider namespace, overwriting in place, without retries.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filter: ReservedKeyFilter::provider_namespace(),
            change_mode: ChangeMode::default(),
            retry: RetryPolicy::no_retry(),
            not_found: NotFoundMatcher::default(),
        }
    }

    /// Builds a binding from a configured or built-in profile.
    pub fn from_profile(
        name: impl Into<String>,
        profile: &ServiceProfile,
        config: &SyncConfig,
    ) -> Result<Self, TagSyncError> {
        let filter = ReservedKeyFilter::new(&profile.reserved_patterns, profile.reserved_names.iter().cloned())?;
        let retry = RetryPolicy::from_settings(&config.retry, config.retry_window(profile));

        Ok(Self {
            name: name.into(),
            filter,
            change_mode: profile.change_mode,
            retry,
            not_found: NotFoundMatcher::new(profile.not_found_codes.iter().cloned()),
        })
    }

    pub fn with_filter(mut self, filter: ReservedKeyFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_change_mode(mut self, mode: ChangeMode) -> Self {
        self.change_mode = mode;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_not_found_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.not_found = NotFoundMatcher::new(codes);
        self
    }

    /// True when `err` should be retried under this binding's policy.
    pub fn is_transient(&self, err: &ApiError) -> bool {
        self.not_found.matches(err)
    }

    /// Diffs two desired tag sets with reserved keys removed on both sides and from
    /// the result.
    pub fn plan(&self, previous: &TagSet, current: &TagSet) -> Plan {
        Plan::diff(
            &self.filter.retain(previous),
            &self.filter.retain(current),
            self.change_mode,
        )
        .without_reserved(&self.filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_not_found_matcher() {
        let m = NotFoundMatcher::new([".NotFound"]);
        assert!(m.matches(&ApiError::new("InvalidInstanceID.NotFound", "")));
        assert!(m.matches(&ApiError::new("InvalidVolume.NotFound", "")));
        assert!(!m.matches(&ApiError::new("UnauthorizedOperation", "")));
        assert!(!NotFoundMatcher::default().matches(&ApiError::new("X.NotFound", "")));
        assert!(NotFoundMatcher::new([""]).is_empty());
    }

    #[test]
    fn test_from_builtin_profiles() {
        let config = SyncConfig::default();

        let ec2 = ServiceBinding::from_profile("ec2", &config.service("ec2").unwrap(), &config).unwrap();
        assert_eq!(ec2.retry.window(), Duration::from_secs(300));
        assert!(ec2.is_transient(&ApiError::new("InvalidInstanceID.NotFound", "")));
        assert!(ec2.filter.is_reserved("aws:cloudformation:stack-name"));

        let beanstalk = ServiceBinding::from_profile(
            "elasticbeanstalk",
            &config.service("elasticbeanstalk").unwrap(),
            &config,
        )
        .unwrap();
        assert!(!beanstalk.retry.retries_enabled());
        assert!(beanstalk.filter.is_reserved("Name"));
        assert!(beanstalk.filter.is_reserved("elasticbeanstalk:environment-name"));
        assert!(!beanstalk.filter.is_reserved("Names"));
    }

    #[test]
    fn test_builtin_plans_for_changed_value() {
        let config = SyncConfig::default();
        let observed = TagSet::from_pairs([("a", "1"), ("b", "2"), ("c", "3")]).unwrap();
        let desired = TagSet::from_pairs([("a", "1"), ("b", "9"), ("d", "4")]).unwrap();
        let upsert = TagSet::from_pairs([("b", "9"), ("d", "4")]).unwrap();

        for name in tagsync_config::builtin::SERVICE_NAMES {
            let binding =
                ServiceBinding::from_profile(*name, &config.service(name).unwrap(), &config).unwrap();
            let plan = binding.plan(&observed, &desired);

            let expected_delete: Vec<&str> = if *name == "elasticbeanstalk" {
                vec!["c"]
            } else {
                vec!["b", "c"]
            };
            assert_eq!(plan.to_upsert, upsert, "service {name}");
            assert_eq!(
                plan.to_delete.iter().map(String::as_str).collect::<Vec<_>>(),
                expected_delete,
                "service {name}"
            );
        }
    }

    #[test]
    fn test_dynamodb_keeps_provider_namespace() {
        let config = SyncConfig::default();
        let dynamodb =
            ServiceBinding::from_profile("dynamodb", &config.service("dynamodb").unwrap(), &config).unwrap();
        assert!(!dynamodb.filter.is_reserved("aws:cloudformation:stack-name"));
    }

    #[test]
    fn test_profile_without_window_uses_global_default() {
        let config = SyncConfig::default();
        let profile = ServiceProfile::default().with_not_found_codes(["NoSuchEntity"]);
        let binding = ServiceBinding::from_profile("iam", &profile, &config).unwrap();
        assert_eq!(binding.retry.window(), config.retry.window());
        assert_eq!(binding.change_mode, ChangeMode::Overwrite);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let profile = ServiceProfile::default().with_reserved_patterns(["^aws:", "(unclosed"]);
        let err = ServiceBinding::from_profile("broken", &profile, &SyncConfig::default()).unwrap_err();
        assert!(matches!(err, TagSyncError::InvalidPattern { ref pattern, .. } if pattern == "(unclosed"));
    }

    #[test]
    fn test_builders() {
        let binding = ServiceBinding::new("custom")
            .with_filter(ReservedKeyFilter::none())
            .with_change_mode(ChangeMode::DeleteBeforeRecreate)
            .with_retry(RetryPolicy::new(Duration::from_secs(5)))
            .with_not_found_codes(["Missing"]);
        assert!(!binding.filter.is_reserved("aws:x"));
        assert_eq!(binding.change_mode, ChangeMode::DeleteBeforeRecreate);
        assert!(binding.is_transient(&ApiError::new("ResourceMissing", "")));
    }
}
