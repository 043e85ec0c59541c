//! Rule-driven interception: find the first matching rule, apply its overlay.

use crate::config::{Overlay, Rule, RulesConfig};
use crate::error::{RewriteError, RuleError};
use crate::exchange::Exchange;
use crate::filter::ExchangeFilter;
use crate::rewrite;
use tracing::{debug, info};

/// A rule with its criteria compiled and its overlay validated.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: String,
    pub filter: ExchangeFilter,
    pub overlay: Overlay,
}

impl CompiledRule {
    pub fn compile(rule: &Rule) -> Result<Self, RuleError> {
        let filter = ExchangeFilter::new(rule.request.as_ref(), rule.response.as_ref()).map_err(
            |source| RuleError::Filter {
                rule: rule.name.clone(),
                source,
            },
        )?;
        rewrite::validate(
            rule.overlay.request.as_ref(),
            rule.overlay.response.as_ref(),
        )
        .map_err(|source| RuleError::Overlay {
            rule: rule.name.clone(),
            source,
        })?;

        Ok(CompiledRule {
            name: rule.name.clone(),
            filter,
            overlay: rule.overlay.clone(),
        })
    }

    pub fn matches(&self, exchange: &Exchange) -> bool {
        self.filter.matches(exchange)
    }

    /// Apply this rule's overlay to `exchange`.
    pub fn apply(&self, exchange: &mut Exchange) -> Result<(), RewriteError> {
        rewrite::rewrite(
            exchange,
            self.overlay.request.as_ref(),
            self.overlay.response.as_ref(),
        )
    }
}

/// Ordered rule set. Holds no mutable state; share it freely across threads.
#[derive(Debug, Clone, Default)]
pub struct Interceptor {
    rules: Vec<CompiledRule>,
}

impl Interceptor {
    pub fn new(rules: &[Rule]) -> Result<Self, RuleError> {
        let rules = rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        info!("Compiled {} interception rules", rules.len());
        Ok(Interceptor { rules })
    }

    pub fn from_config(config: &RulesConfig) -> Result<Self, RuleError> {
        Self::new(&config.rules)
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn rule(&self, name: &str) -> Option<&CompiledRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule matching `exchange`, in declaration order.
    pub fn find(&self, exchange: &Exchange) -> Option<&CompiledRule> {
        self.rules.iter().find(|rule| rule.matches(exchange))
    }

    /// Rewrite `exchange` with the first matching rule; returns that rule's name.
    pub fn intercept(&self, exchange: &mut Exchange) -> Result<Option<&str>, RewriteError> {
        let Some(rule) = self.find(exchange) else {
            return Ok(None);
        };
        debug!(
            rule = %rule.name,
            host = %exchange.request.host,
            path = %exchange.request.path,
            "rule matched"
        );
        rule.apply(exchange)?;
        Ok(Some(rule.name.as_str()))
    }

    /// Exchanges matched by at least one rule, in input order.
    pub fn filter(&self, exchanges: &[Exchange]) -> Vec<Exchange> {
        exchanges
            .iter()
            .filter(|x| self.find(x).is_some())
            .cloned()
            .collect()
    }
}
