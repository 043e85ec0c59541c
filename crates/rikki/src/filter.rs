//! Exchange matching and the filter pipeline.

use crate::error::FilterError;
use crate::exchange::Exchange;
use crate::predicate::{
    CompiledRequestCriterion, CompiledResponseCriterion, RequestCriterion, ResponseCriterion,
};
use tracing::debug;

/// A request/response criterion pair compiled for repeated use.
///
/// Missing or empty criteria compile to "no constraint" on that side.
#[derive(Debug, Clone, Default)]
pub struct ExchangeFilter {
    request: Option<CompiledRequestCriterion>,
    response: Option<CompiledResponseCriterion>,
}

impl ExchangeFilter {
    pub fn new(
        request: Option<&RequestCriterion>,
        response: Option<&ResponseCriterion>,
    ) -> Result<Self, FilterError> {
        let request = request
            .filter(|c| !c.is_empty())
            .map(CompiledRequestCriterion::compile)
            .transpose()?;
        let response = response
            .filter(|c| !c.is_empty())
            .map(CompiledResponseCriterion::compile);
        Ok(ExchangeFilter { request, response })
    }

    /// True when neither side constrains anything.
    pub fn is_unconstrained(&self) -> bool {
        self.request.is_none() && self.response.is_none()
    }

    /// Request criteria first, then response criteria; first failure wins.
    pub fn matches(&self, exchange: &Exchange) -> bool {
        if let Some(request) = &self.request {
            if !request.matches(&exchange.request) {
                return false;
            }
        }
        if let Some(response) = &self.response {
            if !response.matches(exchange.response.as_ref()) {
                return false;
            }
        }
        true
    }

    /// Borrow the matching exchanges in input order.
    pub fn select<'a>(&'a self, exchanges: &'a [Exchange]) -> impl Iterator<Item = &'a Exchange> {
        exchanges.iter().filter(move |x| self.matches(x))
    }

    /// Clone the matching exchanges in input order.
    pub fn apply(&self, exchanges: &[Exchange]) -> Vec<Exchange> {
        let matched: Vec<Exchange> = self.select(exchanges).cloned().collect();
        debug!(
            total = exchanges.len(),
            matched = matched.len(),
            "filtered exchanges"
        );
        matched
    }
}

/// Check one exchange against optional criteria.
pub fn matches(
    exchange: &Exchange,
    request: Option<&RequestCriterion>,
    response: Option<&ResponseCriterion>,
) -> Result<bool, FilterError> {
    Ok(ExchangeFilter::new(request, response)?.matches(exchange))
}

/// Return the exchanges matching all given criteria, preserving order.
///
/// The input is left untouched.
pub fn filter(
    exchanges: &[Exchange],
    request: Option<&RequestCriterion>,
    response: Option<&ResponseCriterion>,
) -> Result<Vec<Exchange>, FilterError> {
    Ok(ExchangeFilter::new(request, response)?.apply(exchanges))
}
