//! Property-test run profile shared by every clustrum property suite.
//!
//! Case counts and process forking can be tuned from the environment so CI
//! can run deeper sweeps than a local `cargo test`.

use std::{env, fmt, num::ParseIntError};

/// Environment variable controlling proptest case counts.
pub const PROPTEST_CASES_ENV_KEY: &str = "PROPTEST_CASES";
/// Environment variable controlling proptest process forking.
pub const CLUSTRUM_PBT_FORK_ENV_KEY: &str = "CLUSTRUM_PBT_FORK";

/// Runtime profile for property-test execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProptestRunProfile {
    cases: u32,
    fork: bool,
}

/// Reason an override was ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OverrideRejected {
    NotANumber(ParseIntError),
    ZeroCases,
    NotABool,
}

impl fmt::Display for OverrideRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotANumber(error) => write!(f, "parse error: {error}"),
            Self::ZeroCases => f.write_str("cases must be > 0"),
            Self::NotABool => f.write_str("expected one of: true/false/1/0/yes/no/on/off"),
        }
    }
}

impl ProptestRunProfile {
    /// Loads a profile from the process environment, falling back to the
    /// provided defaults for absent or malformed values.
    ///
    /// # Examples
    ///
    /// ```
    /// use clustrum_test_support::ci::property_test_profile::ProptestRunProfile;
    ///
    /// let profile = ProptestRunProfile::load(64, false);
    /// assert!(profile.cases() > 0);
    /// ```
    #[must_use]
    pub fn load(default_cases: u32, default_fork: bool) -> Self {
        Self::from_lookup(default_cases, default_fork, |key| env::var(key).ok())
    }

    /// Loads a profile through `lookup`, which maps a variable name to its
    /// raw value.
    ///
    /// # Examples
    ///
    /// ```
    /// use clustrum_test_support::ci::property_test_profile::{
    ///     PROPTEST_CASES_ENV_KEY, ProptestRunProfile,
    /// };
    ///
    /// let profile = ProptestRunProfile::from_lookup(64, false, |key| {
    ///     (key == PROPTEST_CASES_ENV_KEY).then(|| "512".to_owned())
    /// });
    /// assert_eq!(profile.cases(), 512);
    /// assert!(!profile.fork());
    /// ```
    #[must_use]
    pub fn from_lookup<F>(default_cases: u32, default_fork: bool, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let cases = resolve(&lookup, PROPTEST_CASES_ENV_KEY, default_cases, parse_cases);
        let fork = resolve(&lookup, CLUSTRUM_PBT_FORK_ENV_KEY, default_fork, parse_bool);
        Self { cases, fork }
    }

    /// Number of cases to run per property.
    #[must_use]
    pub const fn cases(&self) -> u32 {
        self.cases
    }

    /// Whether to run proptest cases in forked subprocesses.
    #[must_use]
    pub const fn fork(&self) -> bool {
        self.fork
    }
}

fn resolve<T, L, P>(lookup: &L, key: &'static str, default: T, parse: P) -> T
where
    L: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Result<T, OverrideRejected>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    parse(&raw).unwrap_or_else(|reason| {
        tracing::warn!(
            env = key,
            raw = %raw,
            reason = %reason,
            "invalid property-test profile override; using default",
        );
        default
    })
}

fn parse_cases(raw: &str) -> Result<u32, OverrideRejected> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err(OverrideRejected::ZeroCases),
        Ok(cases) => Ok(cases),
        Err(error) => Err(OverrideRejected::NotANumber(error)),
    }
}

fn parse_bool(raw: &str) -> Result<bool, OverrideRejected> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(OverrideRejected::NotABool),
    }
}
