//! Fail-closed gate: verify once, then load the gated script or do nothing.
//!
//! The loader starts `Unverified` and makes exactly one verification request
//! for its lifetime. Only an explicit `{"valid": true}` moves it to
//! `Verified` and triggers script injection. Every other outcome (negative
//! answer, HTTP error, unreadable body, network failure) leaves it
//! `Unverified` for good.

use crate::client::http::VerifyClient;
use crate::config::GateConfig;
use crate::LicenseGateError;
use std::sync::Mutex;
use tracing::{error, info};

/// Where the gate stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No clear "yes" has been received.
    Unverified,
    /// The license was confirmed and the script injected. Terminal.
    Verified,
}

/// Receives the gated script URL once verification succeeds.
///
/// In a browser this creates a `<script>` element; a host application can
/// fetch and run the resource or simply record the decision.
pub trait ScriptInjector: Send + Sync {
    /// Inject the script at `script_url`.
    fn inject(&self, script_url: &str);
}

/// Source of verification answers. Implemented by [`VerifyClient`].
pub trait Verifier: Send + Sync {
    /// Ask whether `domain` is licensed for `token`.
    fn verify(&self, domain: &str, token: &str) -> Result<bool, LicenseGateError>;
}

impl Verifier for VerifyClient {
    fn verify(&self, domain: &str, token: &str) -> Result<bool, LicenseGateError> {
        VerifyClient::verify(self, domain, token).map(|r| r.valid)
    }
}

#[derive(Debug)]
struct Progress {
    state: GateState,
    attempted: bool,
}

/// One-shot license gate.
pub struct GateLoader<V: Verifier, I: ScriptInjector> {
    config: GateConfig,
    verifier: V,
    injector: I,
    progress: Mutex<Progress>,
}

impl<I: ScriptInjector> GateLoader<VerifyClient, I> {
    /// Create a gate that talks HTTP to the configured endpoint.
    pub fn new(config: GateConfig, injector: I) -> Result<Self, LicenseGateError> {
        config.validate()?;
        let client = VerifyClient::new(&config)?;
        Ok(Self::with_verifier(config, client, injector))
    }
}

impl<V: Verifier, I: ScriptInjector> GateLoader<V, I> {
    /// Create a gate with a custom verifier.
    pub fn with_verifier(config: GateConfig, verifier: V, injector: I) -> Self {
        Self {
            config,
            verifier,
            injector,
            progress: Mutex::new(Progress {
                state: GateState::Unverified,
                attempted: false,
            }),
        }
    }

    /// Run the gate for the page served from `hostname`.
    ///
    /// Only the first call does any work; later calls return the state the
    /// first one settled on.
    pub fn load(&self, hostname: &str) -> GateState {
        let mut progress = match self.progress.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if progress.attempted {
            return progress.state;
        }
        progress.attempted = true;

        match self.verifier.verify(hostname, &self.config.token) {
            Ok(true) => {
                info!(hostname, script = %self.config.script_url, "license verified, loading script");
                self.injector.inject(&self.config.script_url);
                progress.state = GateState::Verified;
            }
            Ok(false) => {
                error!(hostname, "Invalid license for this domain");
            }
            Err(e) => {
                error!(hostname, error = %e, "License validation error");
            }
        }
        progress.state
    }

    /// Current state without triggering verification.
    pub fn state(&self) -> GateState {
        match self.progress.lock() {
            Ok(guard) => guard.state,
            Err(poisoned) => poisoned.into_inner().state,
        }
    }

    /// The injector, e.g. to inspect what was loaded.
    pub fn injector(&self) -> &I {
        &self.injector
    }
}

/// Injector that records every URL it was asked to load.
#[derive(Debug, Default)]
pub struct RecordingInjector {
    loaded: Mutex<Vec<String>>,
}

impl RecordingInjector {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs injected so far.
    pub fn loaded(&self) -> Vec<String> {
        match self.loaded.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ScriptInjector for RecordingInjector {
    fn inject(&self, script_url: &str) {
        match self.loaded.lock() {
            Ok(mut guard) => guard.push(script_url.to_string()),
            Err(poisoned) => poisoned.into_inner().push(script_url.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_config() -> GateConfig {
        GateConfig {
            endpoint: "http://127.0.0.1:3000/public/licenses/check-license".to_string(),
            token: "T1".to_string(),
            script_url: "http://127.0.0.1:3000/core.js".to_string(),
        }
    }

    struct ScriptedVerifier {
        answer: fn() -> Result<bool, LicenseGateError>,
        calls: AtomicUsize,
    }

    impl ScriptedVerifier {
        fn new(answer: fn() -> Result<bool, LicenseGateError>) -> Self {
            Self {
                answer,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Verifier for ScriptedVerifier {
        fn verify(&self, _domain: &str, token: &str) -> Result<bool, LicenseGateError> {
            assert_eq!(token, "T1");
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.answer)()
        }
    }

    #[test]
    fn test_valid_license_injects_script() {
        let gate = GateLoader::with_verifier(
            test_config(),
            ScriptedVerifier::new(|| Ok(true)),
            RecordingInjector::new(),
        );
        assert_eq!(gate.state(), GateState::Unverified);
        assert_eq!(gate.load("shop.com"), GateState::Verified);
        assert_eq!(gate.injector().loaded(), vec!["http://127.0.0.1:3000/core.js"]);
    }

    #[test]
    fn test_invalid_license_stays_unverified() {
        let gate = GateLoader::with_verifier(
            test_config(),
            ScriptedVerifier::new(|| Ok(false)),
            RecordingInjector::new(),
        );
        assert_eq!(gate.load("shop.com"), GateState::Unverified);
        assert!(gate.injector().loaded().is_empty());
    }

    #[test]
    fn test_errors_fail_closed() {
        let answers: [fn() -> Result<bool, LicenseGateError>; 2] = [
            || Err(LicenseGateError::Transport("connection refused".to_string())),
            || Err(LicenseGateError::ProtocolError("bad body".to_string())),
        ];
        for answer in answers {
            let gate = GateLoader::with_verifier(
                test_config(),
                ScriptedVerifier::new(answer),
                RecordingInjector::new(),
            );
            assert_eq!(gate.load("shop.com"), GateState::Unverified);
            assert!(gate.injector().loaded().is_empty());
        }
    }

    #[test]
    fn test_verifies_exactly_once() {
        let gate = GateLoader::with_verifier(
            test_config(),
            ScriptedVerifier::new(|| Ok(true)),
            RecordingInjector::new(),
        );
        gate.load("shop.com");
        gate.load("shop.com");
        gate.load("other.com");
        assert_eq!(gate.verifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(gate.injector().loaded().len(), 1);
    }

    #[test]
    fn test_failure_is_permanent() {
        let gate = GateLoader::with_verifier(
            test_config(),
            ScriptedVerifier::new(|| Err(LicenseGateError::Transport("timeout".to_string()))),
            RecordingInjector::new(),
        );
        assert_eq!(gate.load("shop.com"), GateState::Unverified);
        assert_eq!(gate.load("shop.com"), GateState::Unverified);
        assert_eq!(gate.verifier.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let config = GateConfig {
            token: String::new(),
            ..test_config()
        };
        let result = GateLoader::new(config, RecordingInjector::new());
        assert!(matches!(result, Err(LicenseGateError::ConfigError(_))));
    }
}
