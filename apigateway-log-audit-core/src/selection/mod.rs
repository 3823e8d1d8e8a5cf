//! Selector parsing and include/exclude scoping of APIs and stages.

mod filter;
mod selector;

pub use filter::{scope_apis, ScopeDecision};
pub use selector::{check_selector_list, Selection};
