//! The host event loop.
//!
//! One task owns the [`GameEngine`] and runs every handler to completion in
//! turn. It multiplexes:
//!
//! - decoded inbound frames and debounce timer firings, both arriving FIFO
//!   on one [`HostEvent`] queue
//! - engine notifications from the broadcast channel, written out as frames
//!   right after the handler that produced them
//! - the fixed-interval health check (first tick one interval after start)
//! - an external shutdown signal
//!
//! A separate reader task turns the input pipe into [`HostEvent`]s.
//! Malformed JSON frames are logged and skipped; a framing error or end of
//! input ends the session.

use std::future::Future;
use std::time::Duration;

use goblin_core::{Debouncer, GameEngine, ReportedTabs, TabMonitor, TimerId};
use goblin_types::{Inbound, Notification, Outbound};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::error::{CodecError, HostError};
use crate::native::{read_frame, write_frame};
use crate::scheduler::TokioScheduler;

/// Work items for the event loop, delivered in arrival order.
#[derive(Debug)]
pub enum HostEvent {
    /// A decoded inbound frame.
    Frame(Inbound),
    /// A debounce timer elapsed.
    TimerFired(TimerId),
    /// The input pipe reached its end or failed.
    InputClosed,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The browser closed the pipe.
    InputClosed,
    /// The shutdown signal fired.
    Shutdown,
    /// Every notification sender was dropped.
    NotificationsClosed,
}

/// Owns the engine and drives it from the pipe, timers and the ticker.
pub struct Host {
    engine: GameEngine,
    monitor: TabMonitor<TokioScheduler>,
    tabs: ReportedTabs,
    events_tx: mpsc::UnboundedSender<HostEvent>,
    events: mpsc::UnboundedReceiver<HostEvent>,
    notifications: broadcast::Receiver<Notification>,
    health_interval: Duration,
}

impl Host {
    /// Wire a host around `engine`.
    ///
    /// `notifications` must be subscribed to the bus the engine sends
    /// through. Timing comes from the engine's configuration.
    pub fn new(engine: GameEngine, notifications: broadcast::Receiver<Notification>) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        let timing = &engine.config().timing;
        let debouncer = Debouncer::new(
            TokioScheduler::new(events_tx.clone()),
            timing.debounce_window(),
        );
        let health_interval = timing.health_check_interval();

        Self {
            engine,
            monitor: TabMonitor::new(debouncer),
            tabs: ReportedTabs::new(),
            events_tx,
            events,
            notifications,
            health_interval,
        }
    }

    /// Spawn the task that reads frames from `reader` into the event queue.
    pub fn attach_reader<R>(&self, reader: R) -> JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        tokio::spawn(read_loop(reader, self.events_tx.clone()))
    }

    /// Run until the input closes or `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Codec`] if writing to the output pipe fails.
    pub async fn run<W, F>(mut self, mut writer: W, shutdown: F) -> Result<SessionEnd, HostError>
    where
        W: AsyncWrite + Unpin,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let first_check = Instant::now()
            .checked_add(self.health_interval)
            .unwrap_or_else(Instant::now);
        let mut ticker = tokio::time::interval_at(first_check, self.health_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            health_interval_secs = self.health_interval.as_secs(),
            debounce = ?self.monitor.debouncer().window(),
            "Host event loop started"
        );

        let end = loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(HostEvent::Frame(inbound)) => {
                        self.handle_inbound(inbound, &mut writer).await?;
                        self.flush_notifications(&mut writer).await?;
                    }
                    Some(HostEvent::TimerFired(id)) => {
                        self.monitor.on_timer(&mut self.engine, id, &mut self.tabs);
                        self.flush_notifications(&mut writer).await?;
                    }
                    Some(HostEvent::InputClosed) | None => break SessionEnd::InputClosed,
                },
                received = self.notifications.recv() => match received {
                    Ok(notification) => {
                        send(&mut writer, &Outbound::Notification { notification }).await?;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Notification forwarding lagged, skipping ahead");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        warn!("Notification channel closed, ending session");
                        break SessionEnd::NotificationsClosed;
                    }
                },
                _ = ticker.tick() => {
                    self.engine.perform_health_check();
                    self.flush_notifications(&mut writer).await?;
                }
                () = &mut shutdown => break SessionEnd::Shutdown,
            }
        };

        self.monitor.debouncer_mut().cancel();
        info!(reason = ?end, "Host event loop stopped");
        Ok(end)
    }

    async fn handle_inbound<W>(&mut self, inbound: Inbound, writer: &mut W) -> Result<(), HostError>
    where
        W: AsyncWrite + Unpin,
    {
        match inbound {
            Inbound::Tab { event, tab_count } => {
                debug!(?event, tab_count, "Tab event");
                self.tabs.report(tab_count);
                self.monitor.on_event(&mut self.engine, event);
            }
            Inbound::Request { id, request } => {
                debug!(id, ?request, "Request");
                let response = self.engine.handle_request(request);
                send(writer, &Outbound::Response { id, response }).await?;
            }
        }
        Ok(())
    }

    /// Write every queued notification before the next event is taken.
    async fn flush_notifications<W>(&mut self, writer: &mut W) -> Result<(), HostError>
    where
        W: AsyncWrite + Unpin,
    {
        loop {
            match self.notifications.try_recv() {
                Ok(notification) => {
                    send(writer, &Outbound::Notification { notification }).await?;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Notification forwarding lagged, skipping ahead");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return Ok(()),
            }
        }
    }
}

impl core::fmt::Debug for Host {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Host")
            .field("engine", &self.engine)
            .field("health_interval", &self.health_interval)
            .finish_non_exhaustive()
    }
}

/// Write one outbound frame. An oversized frame is dropped with a warning;
/// any other failure ends the session.
async fn send<W>(writer: &mut W, message: &Outbound) -> Result<(), HostError>
where
    W: AsyncWrite + Unpin,
{
    match write_frame(writer, message).await {
        Ok(()) => Ok(()),
        Err(CodecError::FrameTooLarge { len, max }) => {
            warn!(len, max, "Outbound frame too large, dropped");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn read_loop<R>(mut reader: R, events: mpsc::UnboundedSender<HostEvent>)
where
    R: AsyncRead + Unpin,
{
    loop {
        match read_frame(&mut reader).await {
            Ok(Some(payload)) => match serde_json::from_slice::<Inbound>(&payload) {
                Ok(inbound) => {
                    if events.send(HostEvent::Frame(inbound)).is_err() {
                        return;
                    }
                }
                Err(e) => warn!(error = %e, len = payload.len(), "Skipping malformed frame"),
            },
            Ok(None) => {
                info!("Input closed by browser");
                break;
            }
            Err(e) => {
                error!(error = %e, "Input framing error, ending session");
                break;
            }
        }
    }
    if events.send(HostEvent::InputClosed).is_err() {
        debug!("Host already stopped");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::Utc;
    use goblin_core::{GameConfig, ManualClock};
    use goblin_store::{MemoryBackend, StateStore};
    use goblin_types::{Level, Mood, Request, Response, TabEvent};
    use tokio::io::{DuplexStream, ReadHalf, WriteHalf};

    use super::*;
    use crate::bus::ChannelBus;

    struct Browser {
        rx: ReadHalf<DuplexStream>,
        tx: WriteHalf<DuplexStream>,
    }

    impl Browser {
        async fn send(&mut self, inbound: &Inbound) {
            write_frame(&mut self.tx, inbound).await.unwrap();
        }

        async fn recv(&mut self) -> Outbound {
            let payload = read_frame(&mut self.rx).await.unwrap().unwrap();
            serde_json::from_slice(&payload).unwrap()
        }

        async fn recv_notification(&mut self) -> Notification {
            match self.recv().await {
                Outbound::Notification { notification } => notification,
                other => panic!("expected a notification, got {other:?}"),
            }
        }
    }

    fn start(config: GameConfig) -> (Browser, JoinHandle<Result<SessionEnd, HostError>>) {
        let bus = ChannelBus::new(crate::bus::NOTIFICATION_CAPACITY);
        let notifications = bus.subscribe();
        let mut engine = GameEngine::new(
            StateStore::new(Box::new(MemoryBackend::new())),
            Box::new(bus.clone()),
            Box::new(ManualClock::new(Utc::now(), 12)),
            config,
        );
        bus.forward_state_changes(&mut engine);

        let (browser_end, host_end) = tokio::io::duplex(64 * 1024);
        let (host_rx, host_tx) = tokio::io::split(host_end);
        let (rx, tx) = tokio::io::split(browser_end);

        let host = Host::new(engine, notifications);
        host.attach_reader(host_rx);
        let task = tokio::spawn(host.run(host_tx, std::future::pending()));
        (Browser { rx, tx }, task)
    }

    #[tokio::test(start_paused = true)]
    async fn request_gets_a_correlated_response() {
        let (mut browser, task) = start(GameConfig::default());

        browser
            .send(&Inbound::Request {
                id: 7,
                request: Request::ToggleFocusMode,
            })
            .await;

        let Outbound::Response { id, response } = browser.recv().await else {
            panic!("expected a response first");
        };
        assert_eq!(id, 7);
        assert_eq!(response, Response::FocusMode { active: true });

        let Notification::StateChanged { state } = browser.recv_notification().await else {
            panic!("expected STATE_CHANGED");
        };
        assert!(state.settings.focus_mode_active);

        drop(browser);
        assert_eq!(task.await.unwrap().unwrap(), SessionEnd::InputClosed);
    }

    #[tokio::test(start_paused = true)]
    async fn tab_removal_credits_then_debounced_count_lands() {
        let (mut browser, _task) = start(GameConfig::default());

        browser
            .send(&Inbound::Tab {
                event: TabEvent::TabRemoved,
                tab_count: 12,
            })
            .await;

        let Notification::StateChanged { state } = browser.recv_notification().await else {
            panic!("expected STATE_CHANGED from the credit");
        };
        assert_eq!(state.stats.tabs_closed, 1);
        assert_eq!(state.environment.tab_count, 0);
        assert_eq!(
            browser.recv_notification().await,
            Notification::TabClosed { xp_gain: 5 }
        );

        // Quiet for the debounce window: the reported count is applied.
        let Notification::StateChanged { state } = browser.recv_notification().await else {
            panic!("expected STATE_CHANGED from the count update");
        };
        assert_eq!(state.environment.tab_count, 12);
        assert_eq!(state.pet.mood, Mood::Greedy);
    }

    #[tokio::test(start_paused = true)]
    async fn close_burst_delivers_every_notification() {
        const CLOSES: usize = 150;

        let mut config = GameConfig::default();
        config.diminishing_returns.start_after_tabs = 10_000;
        let (mut browser, _task) = start(config);

        for _ in 0..CLOSES {
            browser
                .send(&Inbound::Tab {
                    event: TabEvent::TabRemoved,
                    tab_count: 3,
                })
                .await;
        }

        // 20 closes reach level 2, 50 more reach level 3.
        let mut closed = 0;
        let mut levels = Vec::new();
        while closed < CLOSES {
            match browser.recv_notification().await {
                Notification::TabClosed { xp_gain } => {
                    assert_eq!(xp_gain, 5);
                    closed += 1;
                }
                Notification::LevelUp { level } => levels.push(level),
                Notification::StateChanged { .. } => {}
            }
        }
        assert_eq!(levels, vec![Level::Teen, Level::Monster]);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_notification_channel_ends_the_session() {
        let (tx, notifications) = broadcast::channel(1);
        drop(tx);
        let engine = GameEngine::new(
            StateStore::new(Box::new(MemoryBackend::new())),
            Box::new(goblin_core::NullBus),
            Box::new(ManualClock::new(Utc::now(), 12)),
            GameConfig::default(),
        );

        let host = Host::new(engine, notifications);
        let end = host
            .run(tokio::io::sink(), std::future::pending())
            .await
            .unwrap();
        assert_eq!(end, SessionEnd::NotificationsClosed);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_frame_is_skipped() {
        let (mut browser, _task) = start(GameConfig::default());

        write_frame(&mut browser.tx, "not an envelope").await.unwrap();
        browser
            .send(&Inbound::Request {
                id: 1,
                request: Request::CompleteTutorial,
            })
            .await;

        let Outbound::Response { id, response } = browser.recv().await else {
            panic!("expected a response");
        };
        assert_eq!((id, response), (1, Response::Ack));
    }

    #[tokio::test(start_paused = true)]
    async fn health_check_runs_on_the_interval() {
        let (mut browser, _task) = start(GameConfig::default());
        let started = Instant::now();

        let Notification::StateChanged { .. } = browser.recv_notification().await else {
            panic!("expected STATE_CHANGED from the health check");
        };
        assert!(started.elapsed() >= Duration::from_secs(60));
    }
}
