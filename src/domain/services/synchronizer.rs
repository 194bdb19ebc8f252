#[cfg(test)]
#[path = "synchronizer_test.rs"]
mod tests;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BotStep;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::Session;
use crate::domain::models::SessionStatus;
use crate::domain::models::Transcript;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// A cancellable task that emits `Event::PollTick` for one session activation
/// at a fixed period. The first tick fires one period after the start.
pub struct Ticker {
    epoch: String,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Ticker {
    pub fn start(epoch: &str, period: Duration, tx: mpsc::UnboundedSender<Event>) -> Ticker {
        let token = CancellationToken::new();
        let child = token.clone();
        let tick_epoch = epoch.to_string();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = interval.tick() => {
                        if tx.send(Event::PollTick(tick_epoch.to_string())).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        return Ticker {
            epoch: epoch.to_string(),
            token,
            handle,
        };
    }

    pub fn epoch(&self) -> &str {
        return &self.epoch;
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        return self.handle.is_finished();
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Snapshot of everything that decides whether a poll tick may fetch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PollContext {
    pub has_session: bool,
    pub visible: bool,
    pub step: BotStep,
    pub upload_in_flight: bool,
    pub recording: bool,
}

pub struct Synchronizer {
    ticker: Option<Ticker>,
    fetch_in_flight: bool,
    period: Duration,
}

impl Default for Synchronizer {
    fn default() -> Synchronizer {
        let period = Config::get(ConfigKey::PollInterval)
            .parse::<u64>()
            .ok()
            .filter(|e| return *e > 0)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        return Synchronizer::with_period(period);
    }
}

impl Synchronizer {
    pub fn with_period(period: Duration) -> Synchronizer {
        return Synchronizer {
            ticker: None,
            fetch_in_flight: false,
            period,
        };
    }

    pub fn period(&self) -> Duration {
        return self.period;
    }

    /// Polls the given session activation, replacing any ticker for another.
    pub fn start(&mut self, epoch: &str, tx: mpsc::UnboundedSender<Event>) {
        if let Some(ticker) = &self.ticker {
            if ticker.epoch() == epoch && !ticker.is_finished() {
                return;
            }
        }

        tracing::debug!(epoch, period_ms = self.period.as_millis() as u64, "starting poller");
        self.ticker = Some(Ticker::start(epoch, self.period, tx));
        self.fetch_in_flight = false;
    }

    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            tracing::debug!(epoch = ticker.epoch(), "stopping poller");
            ticker.stop();
        }
        self.fetch_in_flight = false;
    }

    pub fn is_running(&self) -> bool {
        return self.ticker.is_some();
    }

    pub fn should_fetch(&self, ctx: &PollContext) -> bool {
        if !ctx.has_session || !ctx.visible || !ctx.step.is_chattable() {
            return false;
        }

        if ctx.upload_in_flight || ctx.recording {
            return false;
        }

        return !self.fetch_in_flight;
    }

    pub fn begin_fetch(&mut self) {
        self.fetch_in_flight = true;
    }

    pub fn fetch_done(&mut self) {
        self.fetch_in_flight = false;
    }

    /// Returns the messages to render when the transcript differs from what
    /// the session last saw. A forced apply always renders and makes the
    /// rendered length the new baseline, even when it is shorter.
    pub fn apply(session: &mut Session, transcript: &Transcript, forced: bool) -> Option<Vec<Message>> {
        let count = transcript.messages.len();
        let known = session.last_known_message_count();

        if forced {
            session.reset_count();
        } else if count == known {
            return None;
        } else if count < known {
            tracing::warn!(
                session_id = session.session_id,
                count,
                known,
                "transcript shrank, keeping the known count"
            );
            return None;
        }

        session.observe_count(count);
        tracing::debug!(session_id = session.session_id, count, forced, "transcript replaced");
        return Some(transcript.messages.clone());
    }

    /// The bot step a transcript status moves the session to, if any.
    pub fn status_transition(step: BotStep, status: SessionStatus) -> Option<BotStep> {
        match (step, status) {
            (BotStep::Chatting, SessionStatus::Closed) => return Some(BotStep::Closed),
            (BotStep::Closed, SessionStatus::Open) => return Some(BotStep::Chatting),
            _ => return None,
        }
    }
}
