//! PIN verification gate
//!
//! An [`AuthSession`] starts in [`AuthState::AwaitingInput`] and moves to one
//! of two terminal states: `Verified` on the first matching PIN, or
//! `LockedOut` once the number of mismatches reaches the policy bound.
//! Terminal sessions ignore further input.

use crate::config::AuthConfig;
use crate::error::{Result, ScreeningError};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use tracing::{debug, info, warn};

/// Correct PIN plus the attempt bound, validated once at startup
#[derive(Clone)]
pub struct PinPolicy {
    pin: String,
    max_attempts: u32,
}

impl PinPolicy {
    pub fn new(pin: impl Into<String>, max_attempts: u32) -> Result<Self> {
        let pin = pin.into();
        if max_attempts == 0 {
            return Err(ScreeningError::Configuration(
                "maximum PIN attempts must be at least 1".to_string(),
            ));
        }
        if pin.is_empty() {
            return Err(ScreeningError::Configuration(
                "correct PIN is not configured".to_string(),
            ));
        }
        Ok(Self { pin, max_attempts })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        Self::new(config.pin.clone(), config.max_attempts)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Start a fresh session for one transaction check
    pub fn open_session(&self) -> AuthSession<'_> {
        AuthSession {
            policy: self,
            attempts: 0,
            state: AuthState::AwaitingInput,
        }
    }

    fn matches(&self, submitted: &str) -> bool {
        self.pin == submitted
    }
}

impl std::fmt::Debug for PinPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinPolicy")
            .field("pin", &"****")
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    AwaitingInput,
    Verified,
    LockedOut,
}

impl AuthState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, AuthState::AwaitingInput)
    }
}

/// Terminal result of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Verified,
    LockedOut,
}

/// PIN verification progress for a single request
#[derive(Debug)]
pub struct AuthSession<'p> {
    policy: &'p PinPolicy,
    attempts: u32,
    state: AuthState,
}

impl AuthSession<'_> {
    /// Submit one PIN and return the resulting state
    pub fn submit(&mut self, pin: &str) -> AuthState {
        if self.state.is_terminal() {
            debug!(state = ?self.state, "Ignoring PIN for resolved session");
            return self.state;
        }

        if self.policy.matches(pin) {
            self.state = AuthState::Verified;
            info!(attempts = self.attempts, "PIN verified");
            return self.state;
        }

        self.attempts += 1;
        if self.attempts >= self.policy.max_attempts {
            self.state = AuthState::LockedOut;
            warn!(attempts = self.attempts, "PIN attempts exhausted, session locked out");
        } else {
            warn!(
                attempt = self.attempts,
                max_attempts = self.policy.max_attempts,
                remaining = self.remaining(),
                "Incorrect PIN"
            );
        }
        self.state
    }

    /// Pull PINs from `source` until the session resolves
    pub fn run<S: PinSource + ?Sized>(&mut self, source: &mut S) -> Result<AuthOutcome> {
        while !self.state.is_terminal() {
            let prompt = PinPrompt {
                attempt: self.attempts + 1,
                max_attempts: self.policy.max_attempts,
            };
            let pin = source.next_pin(&prompt)?;
            if self.submit(&pin) != AuthState::Verified {
                source.rejected(self.attempts, self.policy.max_attempts);
            }
        }

        // `state` is terminal here
        Ok(match self.state {
            AuthState::Verified => AuthOutcome::Verified,
            _ => AuthOutcome::LockedOut,
        })
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Incorrect PINs submitted so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn remaining(&self) -> u32 {
        self.policy.max_attempts.saturating_sub(self.attempts)
    }

    pub fn outcome(&self) -> Option<AuthOutcome> {
        match self.state {
            AuthState::AwaitingInput => None,
            AuthState::Verified => Some(AuthOutcome::Verified),
            AuthState::LockedOut => Some(AuthOutcome::LockedOut),
        }
    }
}

/// Context handed to a [`PinSource`] when a PIN is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinPrompt {
    /// 1-based attempt number
    pub attempt: u32,
    pub max_attempts: u32,
}

/// Supplies PIN strings on demand
pub trait PinSource {
    fn next_pin(&mut self, prompt: &PinPrompt) -> io::Result<String>;

    /// Called after each mismatch, including the one that locks the session
    fn rejected(&mut self, _attempts: u32, _max_attempts: u32) {}
}

/// Line-based interactive input
pub struct ConsolePinSource<R, W> {
    input: R,
    output: W,
}

impl ConsolePinSource<io::StdinLock<'static>, io::Stdout> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsolePinSource<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> PinSource for ConsolePinSource<R, W> {
    fn next_pin(&mut self, _prompt: &PinPrompt) -> io::Result<String> {
        write!(self.output, "Enter your 4-digit PIN: ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "PIN input closed",
            ));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn rejected(&mut self, attempts: u32, max_attempts: u32) {
        // Feedback is best effort; a broken stdout surfaces on the next prompt
        let _ = writeln!(
            self.output,
            "Incorrect PIN. Attempt {attempts}/{max_attempts}"
        );
    }
}

/// Pre-recorded PINs, for tests and non-interactive runs
#[derive(Debug, Default)]
pub struct ScriptedPinSource {
    pins: VecDeque<String>,
    requested: u32,
}

impl ScriptedPinSource {
    pub fn new<I, S>(pins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pins: pins.into_iter().map(Into::into).collect(),
            requested: 0,
        }
    }

    /// Number of PINs handed out so far
    pub fn requested(&self) -> u32 {
        self.requested
    }
}

impl PinSource for ScriptedPinSource {
    fn next_pin(&mut self, _prompt: &PinPrompt) -> io::Result<String> {
        let pin = self.pins.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted PINs left")
        })?;
        self.requested += 1;
        Ok(pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_attempts_rejected() {
        let err = PinPolicy::new("1234", 0).err().unwrap();
        assert!(matches!(err, ScreeningError::Configuration(_)));
    }

    #[test]
    fn test_missing_pin_rejected() {
        let err = PinPolicy::new("", 2).err().unwrap();
        assert!(matches!(err, ScreeningError::Configuration(_)));
    }

    #[test]
    fn test_verified_on_first_attempt() {
        let policy = PinPolicy::new("1234", 2).unwrap();
        let mut session = policy.open_session();
        assert_eq!(session.state(), AuthState::AwaitingInput);
        assert_eq!(session.submit("1234"), AuthState::Verified);
        assert_eq!(session.attempts(), 0);
        assert_eq!(session.outcome(), Some(AuthOutcome::Verified));
    }

    #[test]
    fn test_lockout_for_every_bound() {
        for max in 1..=6 {
            let policy = PinPolicy::new("1234", max).unwrap();
            let mut session = policy.open_session();
            for attempt in 1..=max {
                let state = session.submit("0000");
                if attempt < max {
                    assert_eq!(state, AuthState::AwaitingInput);
                } else {
                    assert_eq!(state, AuthState::LockedOut);
                }
            }
            assert_eq!(session.attempts(), max);
            assert_eq!(session.remaining(), 0);

            // Correct PIN after lockout is ignored
            assert_eq!(session.submit("1234"), AuthState::LockedOut);
            assert_eq!(session.attempts(), max);
        }
    }

    #[test]
    fn test_verified_after_misses_below_bound() {
        for max in 1..=5 {
            for misses in 0..max {
                let policy = PinPolicy::new("1234", max).unwrap();
                let mut session = policy.open_session();
                for _ in 0..misses {
                    session.submit("9999");
                }
                assert_eq!(session.submit("1234"), AuthState::Verified);
                assert_eq!(session.attempts(), misses);
                // Terminal: a later mismatch does not count
                assert_eq!(session.submit("0000"), AuthState::Verified);
                assert_eq!(session.attempts(), misses);
            }
        }
    }

    #[test]
    fn test_malformed_pin_is_an_ordinary_miss() {
        let policy = PinPolicy::new("1234", 2).unwrap();
        let mut session = policy.open_session();
        assert_eq!(session.submit("12a"), AuthState::AwaitingInput);
        assert_eq!(session.submit(""), AuthState::LockedOut);
    }

    #[test]
    fn test_run_with_scripted_source() {
        let policy = PinPolicy::new("1234", 2).unwrap();
        let mut source = ScriptedPinSource::new(["0000", "0000", "1234"]);
        let mut session = policy.open_session();

        assert_eq!(session.run(&mut source).unwrap(), AuthOutcome::LockedOut);
        assert_eq!(source.requested(), 2);
    }

    #[test]
    fn test_run_fails_when_input_closes() {
        let policy = PinPolicy::new("1234", 3).unwrap();
        let mut source = ScriptedPinSource::new(["0000"]);
        let mut session = policy.open_session();

        let err = session.run(&mut source).err().unwrap();
        assert!(matches!(err, ScreeningError::Input(_)));
        assert_eq!(session.state(), AuthState::AwaitingInput);
    }

    #[test]
    fn test_console_source_reports_remaining_attempts() {
        let policy = PinPolicy::new("1234", 3).unwrap();
        let input = b"0000\n1234\n".as_slice();
        let mut source = ConsolePinSource::new(input, Vec::new());
        let mut session = policy.open_session();

        assert_eq!(session.run(&mut source).unwrap(), AuthOutcome::Verified);

        let output = String::from_utf8(source.into_output()).unwrap();
        assert!(output.contains("Incorrect PIN. Attempt 1/3"));
        assert!(!output.contains("Attempt 2/3"));
        assert_eq!(output.matches("Enter your 4-digit PIN").count(), 2);
    }

    #[test]
    fn test_console_source_strips_line_endings() {
        let mut source = ConsolePinSource::new(b"1234\r\n".as_slice(), Vec::new());
        let prompt = PinPrompt {
            attempt: 1,
            max_attempts: 2,
        };
        assert_eq!(source.next_pin(&prompt).unwrap(), "1234");
        assert!(source.next_pin(&prompt).is_err());
    }
}
