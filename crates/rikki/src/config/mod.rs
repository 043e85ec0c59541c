//! Rule file configuration.
//!
//! A rule file lists named rules, each pairing match criteria with an
//! overlay. YAML is the default format; files ending in `.json` are read as
//! JSON.
//!
//! ```yaml
//! rules:
//!   - name: stub-user
//!     request:
//!       host: api\.example\.com
//!       path: /v1/user
//!     overlay:
//!       response:
//!         code: 200
//!         content: '{"id": 1}'
//! ```

mod rules;

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use rules::{Overlay, Rule};

use crate::predicate::CompiledRequestCriterion;
use crate::rewrite;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RulesConfig {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RulesConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json(&contents)
        } else {
            Self::from_yaml(&contents)
        }
        .with_context(|| format!("Invalid rules file {}", path.display()))?;

        debug!(path = %path.display(), rules = config.rules.len(), "loaded rules");
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, anyhow::Error> {
        let config: RulesConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(contents: &str) -> Result<Self, anyhow::Error> {
        let config: RulesConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Look up a rule by name.
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.name.trim().is_empty() {
                anyhow::bail!("Rule names must not be empty");
            }
            if !seen.insert(rule.name.as_str()) {
                anyhow::bail!("Duplicate rule name: '{}'", rule.name);
            }
            if let Some(request) = &rule.request {
                CompiledRequestCriterion::compile(request)
                    .with_context(|| format!("Invalid criteria in rule '{}'", rule.name))?;
            }
            rewrite::validate(
                rule.overlay.request.as_ref(),
                rule.overlay.response.as_ref(),
            )
            .with_context(|| format!("Invalid overlay in rule '{}'", rule.name))?;
        }
        Ok(())
    }
}
