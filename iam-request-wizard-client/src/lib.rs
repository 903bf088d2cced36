//! HTTP client for the policy review backend.
//!
//! Covers the three endpoints the wizard needs — typeahead search,
//! eligible-role listing, and review submission — plus the CSRF and
//! stale-response handling around them. Everything behind these endpoints
//! (approval workflow, policy application, AWS access) is the backend's
//! business.

mod backend;
mod errors;
mod typeahead;

pub use backend::{BackendClient, TypeaheadResult, TypeaheadResults, XSRF_COOKIE, XSRF_HEADER};
pub use errors::{ClientError, Result};
pub use typeahead::{TypeaheadSearch, DEFAULT_DEBOUNCE};
