use crate::app_config::{AppConfig, Environment};
use crate::geo::Coordinates;
use crate::ConfigError;

pub const DEFAULT_BANNED_CHAINS: &str = "ulta,sephora,sally beauty,walgreens,cvs,target,walmart";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(invalid(var, "must be a finite number".to_string()))
        }
    };

    let env = parse_environment(&or_default("GLOWDROP_ENV", "development"))?;
    let bind_addr = parse_addr("GLOWDROP_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("GLOWDROP_LOG_LEVEL", "info");
    let reference_data_path = lookup("GLOWDROP_REFERENCE_DATA_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let hub = Coordinates::new(
        parse_f64("GLOWDROP_HUB_LATITUDE", "29.7604")?,
        parse_f64("GLOWDROP_HUB_LONGITUDE", "-95.3698")?,
    );
    if !hub.is_valid() {
        return Err(invalid(
            "GLOWDROP_HUB_LATITUDE",
            format!(
                "hub ({}, {}) is outside valid latitude/longitude ranges",
                hub.latitude, hub.longitude
            ),
        ));
    }

    let banned_chains = split_list(&or_default("GLOWDROP_BANNED_CHAINS", DEFAULT_BANNED_CHAINS));
    let allowed_radii = parse_radii(&or_default("GLOWDROP_ALLOWED_RADII", "3,5,10"))
        .map_err(|reason| invalid("GLOWDROP_ALLOWED_RADII", reason))?;
    let discovery_cache_max_entries = parse_usize("GLOWDROP_DISCOVERY_CACHE_MAX_ENTRIES", "1024")?;

    let mut admin_tokens = split_list(&or_default("GLOWDROP_ADMIN_TOKENS", ""));
    admin_tokens.sort();
    admin_tokens.dedup();
    if admin_tokens.is_empty() && env != Environment::Development {
        return Err(ConfigError::MissingEnvVar(
            "GLOWDROP_ADMIN_TOKENS".to_string(),
        ));
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        reference_data_path,
        hub,
        banned_chains,
        allowed_radii,
        discovery_cache_max_entries,
        admin_tokens,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "GLOWDROP_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn parse_radii(raw: &str) -> Result<Vec<u32>, String> {
    let mut radii = Vec::new();
    for item in split_list(raw) {
        let radius = item
            .parse::<u32>()
            .map_err(|e| format!("'{item}' is not a whole number of miles: {e}"))?;
        if radius == 0 {
            return Err("radius must be greater than zero".to_string());
        }
        radii.push(radius);
    }
    if radii.is_empty() {
        return Err("at least one radius is required".to_string());
    }
    radii.sort_unstable();
    radii.dedup();
    Ok(radii)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn parse_environment_known_values() {
        assert_eq!(
            parse_environment("development").unwrap(),
            Environment::Development
        );
        assert_eq!(parse_environment("test").unwrap(), Environment::Test);
        assert_eq!(
            parse_environment("production").unwrap(),
            Environment::Production
        );
    }

    #[test]
    fn parse_environment_unknown_fails() {
        let err = parse_environment("staging").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "GLOWDROP_ENV"));
    }

    #[test]
    fn build_app_config_defaults() {
        let map = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).expect("defaults are valid");
        assert_eq!(cfg.env, Environment::Development);
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.reference_data_path.is_none());
        assert_eq!(cfg.hub, Coordinates::new(29.7604, -95.3698));
        assert_eq!(cfg.allowed_radii, vec![3, 5, 10]);
        assert_eq!(cfg.discovery_cache_max_entries, 1024);
        assert!(cfg.banned_chains.iter().any(|c| c == "sally beauty"));
        assert!(cfg.admin_tokens.is_empty());
    }

    #[test]
    fn build_app_config_requires_admin_tokens_outside_development() {
        let mut map = HashMap::new();
        map.insert("GLOWDROP_ENV", "production");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref var)) if var == "GLOWDROP_ADMIN_TOKENS"),
            "got: {result:?}"
        );

        map.insert("GLOWDROP_ADMIN_TOKENS", " , ");
        assert!(build_app_config(lookup_from_map(&map)).is_err());
    }

    #[test]
    fn build_app_config_admin_tokens_trimmed_and_deduped() {
        let mut map = HashMap::new();
        map.insert("GLOWDROP_ENV", "production");
        map.insert("GLOWDROP_ADMIN_TOKENS", "ops-b, ops-a,ops-b");
        let cfg = build_app_config(lookup_from_map(&map)).expect("tokens present");
        assert_eq!(cfg.env, Environment::Production);
        assert_eq!(cfg.admin_tokens, vec!["ops-a", "ops-b"]);
    }

    #[test]
    fn build_app_config_fails_with_invalid_bind_addr() {
        let mut map = HashMap::new();
        map.insert("GLOWDROP_BIND_ADDR", "not-a-socket-addr");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GLOWDROP_BIND_ADDR"),
            "expected InvalidEnvVar(GLOWDROP_BIND_ADDR), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_reads_reference_path() {
        let mut map = HashMap::new();
        map.insert("GLOWDROP_REFERENCE_DATA_PATH", "./config/atlanta.yaml");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(
            cfg.reference_data_path.as_deref(),
            Some(std::path::Path::new("./config/atlanta.yaml"))
        );
    }

    #[test]
    fn build_app_config_hub_override() {
        let mut map = HashMap::new();
        map.insert("GLOWDROP_HUB_LATITUDE", "33.7490");
        map.insert("GLOWDROP_HUB_LONGITUDE", "-84.3880");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.hub, Coordinates::new(33.749, -84.388));
    }

    #[test]
    fn build_app_config_rejects_out_of_range_hub() {
        let mut map = HashMap::new();
        map.insert("GLOWDROP_HUB_LATITUDE", "129.0");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GLOWDROP_HUB_LATITUDE"),
            "got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_rejects_non_numeric_hub() {
        let mut map = HashMap::new();
        map.insert("GLOWDROP_HUB_LONGITUDE", "west");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GLOWDROP_HUB_LONGITUDE"),
            "got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_banned_chains_override() {
        let mut map = HashMap::new();
        map.insert("GLOWDROP_BANNED_CHAINS", " Ulta , ,Sephora");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.banned_chains, vec!["Ulta", "Sephora"]);
        assert!(cfg.discovery_settings().chains.matches("ULTA Beauty"));
    }

    #[test]
    fn build_app_config_radii_sorted_and_deduped() {
        let mut map = HashMap::new();
        map.insert("GLOWDROP_ALLOWED_RADII", "10, 3,5,3");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.allowed_radii, vec![3, 5, 10]);
    }

    #[test]
    fn build_app_config_rejects_bad_radii() {
        for raw in ["", "0", "five", "3,-5"] {
            let mut map = HashMap::new();
            map.insert("GLOWDROP_ALLOWED_RADII", raw);
            let result = build_app_config(lookup_from_map(&map));
            assert!(
                matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GLOWDROP_ALLOWED_RADII"),
                "radii {raw:?} should be rejected, got: {result:?}"
            );
        }
    }

    #[test]
    fn build_app_config_cache_size_invalid() {
        let mut map = HashMap::new();
        map.insert("GLOWDROP_DISCOVERY_CACHE_MAX_ENTRIES", "lots");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GLOWDROP_DISCOVERY_CACHE_MAX_ENTRIES"),
            "got: {result:?}"
        );
    }
}
