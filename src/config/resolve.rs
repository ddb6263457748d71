//! Environment, group and endpoint selection.
//!
//! Turns the merged [`Config`] plus the user's selectors into the ordered list
//! of endpoints one invocation will contact.

use crate::config::merge::CliOverrides;
use crate::domain::{Config, ConnectionProfile, ResolvedTarget};
use std::collections::BTreeMap;
use thiserror::Error;

/// Name given to the target built from CLI flags when no environment applies.
pub const AD_HOC_TARGET: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("The specified group is not defined: {0}")]
    UndefinedGroup(String),

    #[error("The specified environment is not defined: {0}")]
    UndefinedEnvironment(String),

    #[error("The default environment is not defined: {0}")]
    UndefinedDefaultEnvironment(String),

    #[error("The endpoint {endpoint} is not defined in environment {environment}")]
    UndefinedEndpoint { environment: String, endpoint: String },
}

/// Which environments to act on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selector {
    Environment(String),
    Group(String),
    /// Fall back to `default_environment`
    #[default]
    Default,
}

/// Which endpoints within each selected environment to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointSelector {
    All,
    Named(Vec<String>),
}

impl EndpointSelector {
    /// Parse a comma-separated list; `"all"` and empty input select everything.
    pub fn parse(raw: &str) -> Self {
        let names: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();
        if names.is_empty() || (names.len() == 1 && names[0] == "all") {
            Self::All
        } else {
            Self::Named(names)
        }
    }
}

/// Environment names the selector expands to, in order, without duplicates.
pub fn select_environments(
    config: &Config,
    selector: &Selector,
) -> Result<Vec<String>, ResolveError> {
    let names = match selector {
        Selector::Environment(name) => vec![name.clone()],
        Selector::Group(group) => config
            .groups
            .get(group)
            .cloned()
            .ok_or_else(|| ResolveError::UndefinedGroup(group.clone()))?,
        Selector::Default => match &config.default_environment {
            None => return Ok(Vec::new()),
            Some(name) if !config.environments.contains_key(name) => {
                return Err(ResolveError::UndefinedDefaultEnvironment(name.clone()))
            }
            Some(name) => vec![name.clone()],
        },
    };

    let mut selected: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !config.environments.contains_key(&name) {
            return Err(ResolveError::UndefinedEnvironment(name));
        }
        if !selected.contains(&name) {
            selected.push(name);
        }
    }
    Ok(selected)
}

/// Resolve selectors into raw (not yet defaulted) profiles.
///
/// `endpoints` of `None` falls back to `default_endpoint`, then to every
/// endpoint. Either every target resolves or an error is returned.
pub fn resolve_profiles(
    config: &Config,
    selector: &Selector,
    endpoints: Option<&EndpointSelector>,
) -> Result<Vec<(String, String, ConnectionProfile)>, ResolveError> {
    let endpoint_selector = match endpoints {
        Some(sel) => sel.clone(),
        None => config
            .default_endpoint
            .as_deref()
            .map(EndpointSelector::parse)
            .unwrap_or(EndpointSelector::All),
    };

    let mut resolved = Vec::new();
    for env_name in select_environments(config, selector)? {
        let env: &BTreeMap<String, ConnectionProfile> = config
            .environments
            .get(&env_name)
            .ok_or_else(|| ResolveError::UndefinedEnvironment(env_name.clone()))?;

        match &endpoint_selector {
            EndpointSelector::All => {
                for (endpoint, profile) in env {
                    resolved.push((env_name.clone(), endpoint.clone(), profile.clone()));
                }
            }
            EndpointSelector::Named(names) => {
                for endpoint in names {
                    let profile = env.get(endpoint).ok_or_else(|| {
                        ResolveError::UndefinedEndpoint {
                            environment: env_name.clone(),
                            endpoint: endpoint.clone(),
                        }
                    })?;
                    if !resolved.iter().any(|(e, n, _)| e == &env_name && n == endpoint) {
                        resolved.push((env_name.clone(), endpoint.clone(), profile.clone()));
                    }
                }
            }
        }
    }
    Ok(resolved)
}

/// Full resolution: select, then apply CLI overrides and defaults per target.
///
/// When nothing is selected and no default environment exists, a single
/// ad-hoc target is built from `overrides` if any were given.
pub fn resolve_targets(
    config: &Config,
    selector: &Selector,
    endpoints: Option<&EndpointSelector>,
    overrides: &CliOverrides,
) -> Result<Vec<ResolvedTarget>, ResolveError> {
    let profiles = resolve_profiles(config, selector, endpoints)?;

    if profiles.is_empty()
        && *selector == Selector::Default
        && config.default_environment.is_none()
        && !overrides.is_empty()
    {
        tracing::debug!("No environment selected; using connection flags directly");
        return Ok(vec![ResolvedTarget {
            environment: None,
            name: AD_HOC_TARGET.to_string(),
            settings: overrides.apply(&ConnectionProfile::default()),
        }]);
    }

    let targets: Vec<ResolvedTarget> = profiles
        .into_iter()
        .map(|(environment, name, profile)| ResolvedTarget {
            environment: Some(environment),
            name,
            settings: overrides.apply(&profile),
        })
        .collect();

    tracing::debug!(
        "Resolved {} target(s): {}",
        targets.len(),
        targets.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    );
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(src: &str) -> Config {
        serde_yaml::from_str(src).expect("config")
    }

    fn names(targets: &[ResolvedTarget]) -> Vec<String> {
        targets.iter().map(ToString::to_string).collect()
    }

    const MULTI: &str = "
environments:
  prod:
    a: {endpoint: a.prod}
    b: {endpoint: b.prod}
    c: {endpoint: c.prod}
  env1:
    main: {endpoint: one.example}
  env2:
    main: {endpoint: two.example, port: 5000}
    spare: {endpoint: spare.example}
groups:
  everyone: [env1, env2]
  broken: [env1, nowhere]
  repeated: [env1, env1]
";

    #[test]
    fn explicit_environment_with_defaults_applied() {
        let cfg = config("environments:\n  prod:\n    main: {endpoint: a.com, port: 4000}\n");
        let targets = resolve_targets(
            &cfg,
            &Selector::Environment("prod".to_string()),
            None,
            &CliOverrides::default(),
        )
        .expect("targets");
        assert_eq!(targets.len(), 1);
        let main = &targets[0];
        assert_eq!(main.name, "main");
        assert_eq!(main.settings.base_url(), "http://a.com:4000");
        assert!(!main.settings.use_ssl);
        assert!(main.settings.verify);
        assert!(main.settings.user.is_none());
        assert!(main.settings.password.is_none());
    }

    #[test]
    fn undefined_environment_fails_without_partial_targets() {
        let cfg = config(MULTI);
        let err = resolve_targets(
            &cfg,
            &Selector::Environment("staging".to_string()),
            None,
            &CliOverrides::default(),
        )
        .unwrap_err();
        assert_eq!(err, ResolveError::UndefinedEnvironment("staging".to_string()));
    }

    #[test]
    fn group_expands_to_all_member_endpoints() {
        let cfg = config(MULTI);
        let targets = resolve_targets(
            &cfg,
            &Selector::Group("everyone".to_string()),
            None,
            &CliOverrides::default(),
        )
        .expect("targets");
        assert_eq!(names(&targets), vec!["env1/main", "env2/main", "env2/spare"]);
    }

    #[test]
    fn undefined_group_fails() {
        let err = select_environments(&config(MULTI), &Selector::Group("nobody".to_string()))
            .unwrap_err();
        assert_eq!(err, ResolveError::UndefinedGroup("nobody".to_string()));
    }

    #[test]
    fn group_member_missing_from_environments_fails() {
        let err = select_environments(&config(MULTI), &Selector::Group("broken".to_string()))
            .unwrap_err();
        assert_eq!(err, ResolveError::UndefinedEnvironment("nowhere".to_string()));
    }

    #[test]
    fn group_duplicates_are_removed() {
        let envs = select_environments(&config(MULTI), &Selector::Group("repeated".to_string()))
            .expect("envs");
        assert_eq!(envs, vec!["env1"]);
    }

    #[test]
    fn endpoint_selector_intersects() {
        let cfg = config(MULTI);
        let prod = Selector::Environment("prod".to_string());

        let some = resolve_profiles(&cfg, &prod, Some(&EndpointSelector::parse("a,c")))
            .expect("profiles");
        let some: Vec<&str> = some.iter().map(|(_, n, _)| n.as_str()).collect();
        assert_eq!(some, vec!["a", "c"]);

        for sel in [Some(EndpointSelector::parse("all")), None] {
            let all = resolve_profiles(&cfg, &prod, sel.as_ref()).expect("profiles");
            let all: Vec<&str> = all.iter().map(|(_, n, _)| n.as_str()).collect();
            assert_eq!(all, vec!["a", "b", "c"]);
        }
    }

    #[test]
    fn unknown_endpoint_is_fatal() {
        let cfg = config(MULTI);
        let err = resolve_profiles(
            &cfg,
            &Selector::Environment("prod".to_string()),
            Some(&EndpointSelector::parse("a,z")),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ResolveError::UndefinedEndpoint {
                environment: "prod".to_string(),
                endpoint: "z".to_string()
            }
        );
    }

    #[test]
    fn default_endpoint_used_when_selector_absent() {
        let cfg = config(&format!("{MULTI}default_endpoint: b\n"));
        let profiles =
            resolve_profiles(&cfg, &Selector::Environment("prod".to_string()), None)
                .expect("profiles");
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].1, "b");
    }

    #[test]
    fn default_environment_used_when_no_selector() {
        let cfg = config(&format!("{MULTI}default_environment: env2\n"));
        let targets =
            resolve_targets(&cfg, &Selector::Default, None, &CliOverrides::default())
                .expect("targets");
        assert_eq!(names(&targets), vec!["env2/main", "env2/spare"]);
        assert_eq!(targets[0].settings.port, 5000);
    }

    #[test]
    fn undefined_default_environment_fails() {
        let cfg = config(&format!("{MULTI}default_environment: gone\n"));
        let err = resolve_targets(&cfg, &Selector::Default, None, &CliOverrides::default())
            .unwrap_err();
        assert_eq!(err, ResolveError::UndefinedDefaultEnvironment("gone".to_string()));
    }

    #[test]
    fn no_selection_and_no_default_is_noop() {
        let cfg = config(MULTI);
        let targets = resolve_targets(&cfg, &Selector::Default, None, &CliOverrides::default())
            .expect("targets");
        assert!(targets.is_empty());
    }

    #[test]
    fn connection_flags_without_environment_build_ad_hoc_target() {
        let overrides =
            CliOverrides { endpoint: Some("jojo.local".to_string()), ..CliOverrides::default() };
        let targets =
            resolve_targets(&Config::default(), &Selector::Default, None, &overrides)
                .expect("targets");
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].name, AD_HOC_TARGET);
        assert_eq!(targets[0].environment, None);
        assert_eq!(targets[0].settings.base_url(), "http://jojo.local:3000");
    }

    #[test]
    fn overrides_apply_to_every_target() {
        let cfg = config(MULTI);
        let overrides = CliOverrides { port: Some(7000), ..CliOverrides::default() };
        let targets =
            resolve_targets(&cfg, &Selector::Group("everyone".to_string()), None, &overrides)
                .expect("targets");
        assert!(targets.iter().all(|t| t.settings.port == 7000));
    }

    #[test]
    fn endpoint_selector_parsing() {
        assert_eq!(EndpointSelector::parse("all"), EndpointSelector::All);
        assert_eq!(EndpointSelector::parse(" "), EndpointSelector::All);
        assert_eq!(
            EndpointSelector::parse("a, c,"),
            EndpointSelector::Named(vec!["a".to_string(), "c".to_string()])
        );
    }
}
