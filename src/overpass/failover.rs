use std::time::Duration;

use super::transport::AttemptError;

/// Position of one category query in the mirror/attempt grid.
///
/// Mirrors are tried in priority order. Each mirror gets up to `attempts`
/// tries; once it is exhausted it is never revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailoverState {
    /// About to send attempt number `attempt` (1-based) to `mirror`.
    Trying { mirror: usize, attempt: u32 },
    Succeeded,
    ExhaustedMirror { mirror: usize },
    ExhaustedAll,
}

impl FailoverState {
    pub fn start(mirrors: usize) -> Self {
        if mirrors == 0 {
            FailoverState::ExhaustedAll
        } else {
            FailoverState::Trying {
                mirror: 0,
                attempt: 1,
            }
        }
    }

    pub fn on_success(self) -> Self {
        match self {
            FailoverState::Trying { .. } => FailoverState::Succeeded,
            other => other,
        }
    }

    pub fn on_failure(self, attempts: u32) -> Self {
        match self {
            FailoverState::Trying { mirror, attempt } if attempt < attempts => {
                FailoverState::Trying {
                    mirror,
                    attempt: attempt + 1,
                }
            }
            FailoverState::Trying { mirror, .. } => FailoverState::ExhaustedMirror { mirror },
            other => other,
        }
    }

    pub fn advance(self, mirrors: usize) -> Self {
        match self {
            FailoverState::ExhaustedMirror { mirror } if mirror + 1 < mirrors => {
                FailoverState::Trying {
                    mirror: mirror + 1,
                    attempt: 1,
                }
            }
            FailoverState::ExhaustedMirror { .. } => FailoverState::ExhaustedAll,
            other => other,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, FailoverState::Succeeded | FailoverState::ExhaustedAll)
    }
}

/// Retry tunables for one mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff_step: Duration,
    pub backoff_cap: Duration,
    pub rate_limit_backoff: Duration,
}

impl RetryPolicy {
    /// Linear backoff `min(cap, attempt * step)`; rate limiting waits the
    /// dedicated delay instead.
    pub fn delay_after(&self, attempt: u32, error: &AttemptError) -> Duration {
        match error {
            AttemptError::RateLimited => self.rate_limit_backoff,
            _ => self.backoff_step.saturating_mul(attempt).min(self.backoff_cap),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(mirrors: usize, attempts: u32) -> Vec<FailoverState> {
        let mut state = FailoverState::start(mirrors);
        let mut seen = vec![state];
        while !state.is_terminal() {
            state = match state {
                FailoverState::Trying { .. } => state.on_failure(attempts),
                _ => state.advance(mirrors),
            };
            seen.push(state);
        }
        seen
    }

    #[test]
    fn walks_every_mirror_once_then_gives_up() {
        let states = walk(2, 2);
        assert_eq!(
            states,
            vec![
                FailoverState::Trying { mirror: 0, attempt: 1 },
                FailoverState::Trying { mirror: 0, attempt: 2 },
                FailoverState::ExhaustedMirror { mirror: 0 },
                FailoverState::Trying { mirror: 1, attempt: 1 },
                FailoverState::Trying { mirror: 1, attempt: 2 },
                FailoverState::ExhaustedMirror { mirror: 1 },
                FailoverState::ExhaustedAll,
            ]
        );
    }

    #[test]
    fn attempt_count_is_bounded_by_grid_size() {
        for mirrors in 0..4 {
            for attempts in 1..4 {
                let tries = walk(mirrors, attempts)
                    .into_iter()
                    .filter(|s| matches!(s, FailoverState::Trying { .. }))
                    .count();
                assert_eq!(tries, mirrors * attempts as usize);
            }
        }
    }

    #[test]
    fn success_is_terminal() {
        let state = FailoverState::start(3).on_failure(3).on_success();
        assert_eq!(state, FailoverState::Succeeded);
        assert_eq!(state.on_failure(3), FailoverState::Succeeded);
        assert_eq!(state.advance(3), FailoverState::Succeeded);
    }

    #[test]
    fn backoff_grows_linearly_up_to_the_cap() {
        let policy = RetryPolicy {
            attempts: 3,
            backoff_step: Duration::from_secs(2),
            backoff_cap: Duration::from_secs(5),
            rate_limit_backoff: Duration::from_secs(7),
        };
        let timeout = AttemptError::Timeout;
        assert_eq!(policy.delay_after(1, &timeout), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2, &timeout), Duration::from_secs(4));
        assert_eq!(policy.delay_after(3, &timeout), Duration::from_secs(5));
        assert_eq!(
            policy.delay_after(1, &AttemptError::RateLimited),
            Duration::from_secs(7)
        );
    }
}
