//! Session idle timeout.
//!
//! A session is considered idle a fixed time after sign-in (or the last token
//! refresh, or the last "stay" from the user). Input activity is not observed.
//! After [`SESSION_TIMEOUT`] a warning with a [`WARNING_COUNTDOWN`] countdown is
//! shown; when the countdown runs out the session is signed out.

use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

pub const SESSION_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const WARNING_COUNTDOWN: Duration = Duration::from_secs(30);

/// Events published by the auth backend.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AuthEvent {
    SignedIn,
    TokenRefreshed,
    SignedOut,
}

/// Choices offered to the user by the warning prompt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UserAction {
    Stay,
    LogoutNow,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionInput {
    Auth(AuthEvent),
    User(UserAction),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Effect {
    ShowWarning { seconds_left: u64 },
    Countdown { seconds_left: u64 },
    HideWarning,
    SignOut,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionState {
    /// No session, no timer running.
    Dormant,
    Active { deadline: Instant },
    Warning { expires_at: Instant },
    /// Sign-out was requested; waiting for the backend to confirm with `SignedOut`.
    Expired,
}

#[derive(Debug)]
pub struct IdleTimeout {
    state: SessionState,
    timeout: Duration,
    countdown: Duration,
    last_reported: Option<u64>,
}

impl Default for IdleTimeout {
    fn default() -> Self {
        Self::new(SESSION_TIMEOUT, WARNING_COUNTDOWN)
    }
}

impl IdleTimeout {
    pub fn new(timeout: Duration, countdown: Duration) -> Self {
        Self {
            state: SessionState::Dormant,
            timeout,
            countdown,
            last_reported: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn on_auth_event(&mut self, event: AuthEvent, now: Instant) -> Vec<Effect> {
        let effects = self.hide_warning();

        self.state = match event {
            AuthEvent::SignedIn | AuthEvent::TokenRefreshed => SessionState::Active {
                deadline: now + self.timeout,
            },
            AuthEvent::SignedOut => SessionState::Dormant,
        };

        effects
    }

    pub fn on_user_action(&mut self, action: UserAction, now: Instant) -> Vec<Effect> {
        match (action, self.state) {
            (UserAction::Stay, SessionState::Warning { .. }) => {
                let effects = self.hide_warning();
                self.state = SessionState::Active {
                    deadline: now + self.timeout,
                };
                effects
            }
            (UserAction::LogoutNow, SessionState::Active { .. })
            | (UserAction::LogoutNow, SessionState::Warning { .. }) => self.expire(),
            _ => Vec::new(),
        }
    }

    /// Advances timers to `now`.
    pub fn poll(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();

        if let SessionState::Active { deadline } = self.state {
            if now < deadline {
                return effects;
            }

            let expires_at = deadline + self.countdown;
            if now >= expires_at {
                return self.expire();
            }

            let seconds_left = seconds_until(expires_at, now);
            self.state = SessionState::Warning { expires_at };
            self.last_reported = Some(seconds_left);
            effects.push(Effect::ShowWarning { seconds_left });

            return effects;
        }

        if let SessionState::Warning { expires_at } = self.state {
            if now >= expires_at {
                return self.expire();
            }

            let seconds_left = seconds_until(expires_at, now);
            if self.last_reported != Some(seconds_left) {
                self.last_reported = Some(seconds_left);
                effects.push(Effect::Countdown { seconds_left });
            }
        }

        effects
    }

    /// The next instant at which [`IdleTimeout::poll`] has something to do.
    pub fn next_wakeup(&self, now: Instant) -> Option<Instant> {
        match self.state {
            SessionState::Active { deadline } => Some(deadline),
            SessionState::Warning { expires_at } => {
                if now >= expires_at {
                    return Some(now);
                }

                let seconds_left = seconds_until(expires_at, now);
                if seconds_left <= 1 {
                    Some(expires_at)
                } else {
                    Some(expires_at - Duration::from_secs(seconds_left - 1))
                }
            }
            SessionState::Dormant | SessionState::Expired => None,
        }
    }

    fn hide_warning(&mut self) -> Vec<Effect> {
        self.last_reported = None;

        match self.state {
            SessionState::Warning { .. } => vec![Effect::HideWarning],
            _ => Vec::new(),
        }
    }

    fn expire(&mut self) -> Vec<Effect> {
        let mut effects = self.hide_warning();
        effects.push(Effect::SignOut);

        self.state = SessionState::Expired;

        effects
    }
}

fn seconds_until(later: Instant, now: Instant) -> u64 {
    let millis = later.saturating_duration_since(now).as_millis() as u64;

    (millis + 999) / 1000
}

/// Drives an [`IdleTimeout`] from a stream of inputs on the tokio clock and
/// forwards the resulting effects.
pub struct SessionTimeoutController {
    machine: IdleTimeout,
}

impl Default for SessionTimeoutController {
    fn default() -> Self {
        Self::new(IdleTimeout::default())
    }
}

impl SessionTimeoutController {
    pub fn new(machine: IdleTimeout) -> Self {
        Self { machine }
    }

    /// Runs until the input channel closes or the effect receiver is dropped.
    pub async fn run(
        mut self,
        mut inputs: mpsc::Receiver<SessionInput>,
        effects: mpsc::UnboundedSender<Effect>,
    ) {
        loop {
            let wakeup = self.machine.next_wakeup(Instant::now());

            let input = match wakeup {
                Some(at) => tokio::select! {
                    received = inputs.recv() => Some(received),
                    _ = tokio::time::sleep_until(at) => None,
                },
                None => Some(inputs.recv().await),
            };

            let now = Instant::now();
            let emitted = match input {
                None => self.machine.poll(now),
                Some(None) => return,
                Some(Some(SessionInput::Auth(event))) => {
                    tracing::debug!("session: auth event {:?}", event);
                    self.machine.on_auth_event(event, now)
                }
                Some(Some(SessionInput::User(action))) => {
                    tracing::debug!("session: user action {:?}", action);
                    self.machine.on_user_action(action, now)
                }
            };

            for effect in emitted {
                if effects.send(effect).is_err() {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(receiver: &mut mpsc::UnboundedReceiver<Effect>) -> Vec<Effect> {
        let mut effects = Vec::new();
        while let Ok(effect) = receiver.try_recv() {
            effects.push(effect);
        }
        effects
    }

    #[test]
    fn test_dormant_until_signed_in() {
        let start = Instant::now();
        let mut machine = IdleTimeout::default();

        assert_eq!(machine.state(), SessionState::Dormant);
        assert!(machine.poll(start + Duration::from_secs(3600)).is_empty());
        assert!(machine.next_wakeup(start).is_none());
        assert!(machine
            .on_user_action(UserAction::LogoutNow, start)
            .is_empty());
    }

    #[test]
    fn test_warning_then_sign_out() {
        let start = Instant::now();
        let mut machine = IdleTimeout::default();
        machine.on_auth_event(AuthEvent::SignedIn, start);

        assert!(machine.poll(start + Duration::from_secs(299)).is_empty());

        let effects = machine.poll(start + SESSION_TIMEOUT);
        assert_eq!(effects, vec![Effect::ShowWarning { seconds_left: 30 }]);

        let effects = machine.poll(start + SESSION_TIMEOUT + Duration::from_secs(10));
        assert_eq!(effects, vec![Effect::Countdown { seconds_left: 20 }]);

        let effects = machine.poll(start + SESSION_TIMEOUT + WARNING_COUNTDOWN);
        assert_eq!(effects, vec![Effect::HideWarning, Effect::SignOut]);
        assert_eq!(machine.state(), SessionState::Expired);

        // no second sign-out while waiting for the backend
        assert!(machine
            .poll(start + SESSION_TIMEOUT + WARNING_COUNTDOWN * 2)
            .is_empty());

        machine.on_auth_event(AuthEvent::SignedOut, start + SESSION_TIMEOUT * 2);
        assert_eq!(machine.state(), SessionState::Dormant);
    }

    #[test]
    fn test_stay_restarts_timer() {
        let start = Instant::now();
        let mut machine = IdleTimeout::default();
        machine.on_auth_event(AuthEvent::SignedIn, start);
        machine.poll(start + SESSION_TIMEOUT);

        let stay_at = start + SESSION_TIMEOUT + Duration::from_secs(5);
        let effects = machine.on_user_action(UserAction::Stay, stay_at);

        assert_eq!(effects, vec![Effect::HideWarning]);
        assert_eq!(
            machine.state(),
            SessionState::Active {
                deadline: stay_at + SESSION_TIMEOUT
            }
        );
        assert!(machine
            .poll(start + SESSION_TIMEOUT + WARNING_COUNTDOWN)
            .is_empty());
    }

    #[test]
    fn test_stay_outside_warning_is_ignored() {
        let start = Instant::now();
        let mut machine = IdleTimeout::default();
        machine.on_auth_event(AuthEvent::SignedIn, start);

        let effects = machine.on_user_action(UserAction::Stay, start + Duration::from_secs(60));

        assert!(effects.is_empty());
        assert_eq!(
            machine.state(),
            SessionState::Active {
                deadline: start + SESSION_TIMEOUT
            }
        );
    }

    #[test]
    fn test_logout_now_from_warning() {
        let start = Instant::now();
        let mut machine = IdleTimeout::default();
        machine.on_auth_event(AuthEvent::SignedIn, start);
        machine.poll(start + SESSION_TIMEOUT);

        let effects = machine.on_user_action(
            UserAction::LogoutNow,
            start + SESSION_TIMEOUT + Duration::from_secs(1),
        );

        assert_eq!(effects, vec![Effect::HideWarning, Effect::SignOut]);
    }

    #[test]
    fn test_signed_out_collapses_warning() {
        let start = Instant::now();
        let mut machine = IdleTimeout::default();
        machine.on_auth_event(AuthEvent::SignedIn, start);
        machine.poll(start + SESSION_TIMEOUT);

        let effects = machine.on_auth_event(AuthEvent::SignedOut, start + SESSION_TIMEOUT);

        assert_eq!(effects, vec![Effect::HideWarning]);
        assert_eq!(machine.state(), SessionState::Dormant);
    }

    #[test]
    fn test_token_refresh_restarts_timer() {
        let start = Instant::now();
        let mut machine = IdleTimeout::default();
        machine.on_auth_event(AuthEvent::SignedIn, start);

        let refreshed_at = start + Duration::from_secs(240);
        machine.on_auth_event(AuthEvent::TokenRefreshed, refreshed_at);

        assert!(machine.poll(start + SESSION_TIMEOUT).is_empty());
        assert_eq!(machine.next_wakeup(start), Some(refreshed_at + SESSION_TIMEOUT));
    }

    #[test]
    fn test_late_poll_expires_without_warning() {
        let start = Instant::now();
        let mut machine = IdleTimeout::default();
        machine.on_auth_event(AuthEvent::SignedIn, start);

        let effects = machine.poll(start + Duration::from_secs(3600));

        assert_eq!(effects, vec![Effect::SignOut]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_controller_signs_out_exactly_once() {
        let (input_sender, input_receiver) = mpsc::channel(8);
        let (effect_sender, mut effect_receiver) = mpsc::unbounded_channel();

        let controller = tokio::spawn(
            SessionTimeoutController::default().run(input_receiver, effect_sender),
        );

        input_sender
            .send(SessionInput::Auth(AuthEvent::SignedIn))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert!(drain(&mut effect_receiver).is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        let effects = drain(&mut effect_receiver);
        assert_eq!(effects.first(), Some(&Effect::ShowWarning { seconds_left: 30 }));

        tokio::time::sleep(Duration::from_secs(60)).await;
        let effects = drain(&mut effect_receiver);

        let sign_outs = effects
            .iter()
            .filter(|effect| **effect == Effect::SignOut)
            .count();
        assert_eq!(sign_outs, 1);
        assert_eq!(effects.last(), Some(&Effect::SignOut));

        drop(input_sender);
        controller.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_controller_stay_prevents_sign_out() {
        let (input_sender, input_receiver) = mpsc::channel(8);
        let (effect_sender, mut effect_receiver) = mpsc::unbounded_channel();

        tokio::spawn(SessionTimeoutController::default().run(input_receiver, effect_sender));

        input_sender
            .send(SessionInput::Auth(AuthEvent::SignedIn))
            .await
            .unwrap();

        tokio::time::sleep(SESSION_TIMEOUT + Duration::from_secs(10)).await;
        input_sender
            .send(SessionInput::User(UserAction::Stay))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(60)).await;
        let effects = drain(&mut effect_receiver);

        assert!(effects.contains(&Effect::HideWarning));
        assert!(!effects.contains(&Effect::SignOut));
    }
}
