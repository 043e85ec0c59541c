//! Rikki: flow filtering and substitution for captured HTTP exchanges.
//!
//! The host proxy hands over [`Exchange`]s. [`filter()`] selects those that
//! match a pair of request/response criteria, [`rewrite()`] overlays
//! replacement fields onto one exchange, and [`Interceptor`] runs a named
//! rule set loaded from a [`RulesConfig`] file.
//!
//! ```
//! use rikki::{filter, Exchange, Request, RequestCriterion, Response};
//!
//! let exchanges = vec![Exchange::new(
//!     Request::new("POST", "api.example.com", 443, "/v1/users")
//!         .with_body(r#"{"name":"ada","admin":true}"#),
//! )
//! .with_response(Response::new(201))];
//!
//! let criterion = RequestCriterion::default().with_content(r#"?{"admin":true}"#);
//! let matched = filter(&exchanges, Some(&criterion), None).unwrap();
//! assert_eq!(matched.len(), 1);
//! ```

pub mod config;
pub mod error;
pub mod exchange;
pub mod filter;
pub mod interceptor;
pub mod predicate;
pub mod rewrite;

pub use config::{Overlay, Rule, RulesConfig};
pub use error::{FilterError, RewriteError, RuleError};
pub use exchange::{Exchange, MultiMap, Request, Response};
pub use filter::{filter, matches, ExchangeFilter};
pub use interceptor::{CompiledRule, Interceptor};
pub use predicate::{
    compare, Content, Payload, RequestCriterion, RequestOverlay, ResponseCriterion,
    ResponseOverlay,
};
pub use rewrite::{rewrite, rewritten};
