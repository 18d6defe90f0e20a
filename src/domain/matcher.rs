//! Matching a request hostname against a stored license domain pattern.
//!
//! A license domain is either an exact hostname (`example.com`) or a single
//! leading wildcard (`*.example.com`). The wildcard form covers the base
//! domain itself and every subdomain below it. Hostnames are compared as
//! given: no case folding, port stripping or trailing-dot handling.

/// Prefix that marks a wildcard license domain.
pub const WILDCARD_PREFIX: &str = "*.";

/// The one single-label host that is allowed to match itself explicitly.
pub const LOCALHOST: &str = "localhost";

/// Decide whether `request_domain` is covered by `license_domain`.
///
/// Rules, first hit wins:
/// 1. `localhost` against `localhost` matches.
/// 2. `*.base` matches `base` and anything ending in `.base`.
/// 3. Anything else needs exact equality.
pub fn matches(license_domain: &str, request_domain: &str) -> bool {
    if request_domain == LOCALHOST && license_domain == LOCALHOST {
        return true;
    }

    if let Some(base) = license_domain.strip_prefix(WILDCARD_PREFIX) {
        return request_domain == base || is_subdomain_of(request_domain, base);
    }

    license_domain == request_domain
}

/// `request` ends with `"." + base`, checked without allocating.
fn is_subdomain_of(request: &str, base: &str) -> bool {
    request
        .strip_suffix(base)
        .is_some_and(|head| head.ends_with('.'))
}
