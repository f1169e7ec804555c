//! 轮询调度器 - 驱动展示状态机的唯一时间源
//!
//! 单个事件循环串行处理所有触发：拉取计时、1 秒倒计时、触摸确认停留、外部命令。
//! 网络请求（拉取、事件推送、视频下载）在独立任务中执行，完成后通过 channel
//! 回到循环，按到达顺序交给状态机，慢请求不会阻塞计时器。

use crate::cache::ContentCache;
use crate::client::NotificationSource;
use crate::display::{DisplayMachine, DisplayStatus, Effect, Event, ResolvedMedia};
use crate::error::{CacheError, ClientError};
use crate::notification::{Content, UserEvent};
use crate::render::Renderer;
use chrono::Utc;
use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, interval_at, sleep, Instant, Interval, MissedTickBehavior, Sleep};
use tracing::{debug, error, info, warn};

/// 默认拉取间隔
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
/// 默认拉取超时
pub const DEFAULT_PULL_TIMEOUT: Duration = Duration::from_millis(1500);
/// 默认事件推送超时
pub const DEFAULT_EVENT_TIMEOUT: Duration = Duration::from_millis(4000);
/// 倒计时精度
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// 调度器配置
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub poll_interval: Duration,
    /// 超时的拉取在传输层中止，结果不会进入缓冲区
    pub pull_timeout: Duration,
    pub event_timeout: Duration,
    pub countdown_tick: Duration,
    /// 启动时清理过期缓存
    pub sweep_cache_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            pull_timeout: DEFAULT_PULL_TIMEOUT,
            event_timeout: DEFAULT_EVENT_TIMEOUT,
            countdown_tick: COUNTDOWN_TICK,
            sweep_cache_on_start: true,
        }
    }
}

enum Command {
    Touch(i64),
    Stop,
}

/// 运行中调度器的句柄
#[derive(Clone)]
pub struct SchedulerHandle {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<DisplayStatus>,
}

impl SchedulerHandle {
    /// 用户触摸指定通知
    pub fn touch(&self, notification_id: i64) {
        let _ = self.commands.send(Command::Touch(notification_id));
    }

    /// 触摸当前展示的通知，返回被触摸的通知 ID
    pub fn touch_current(&self) -> Option<i64> {
        match self.status() {
            DisplayStatus::Showing {
                notification_id, ..
            } => {
                self.touch(notification_id);
                Some(notification_id)
            }
            _ => None,
        }
    }

    /// 停止调度（可重复调用）
    pub fn stop(&self) {
        let _ = self.commands.send(Command::Stop);
    }

    /// 当前状态
    pub fn status(&self) -> DisplayStatus {
        *self.status.borrow()
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<DisplayStatus> {
        self.status.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}

/// 轮询调度器
pub struct PollScheduler {
    machine: DisplayMachine,
    source: Arc<dyn NotificationSource>,
    cache: Arc<ContentCache>,
    renderer: Arc<dyn Renderer>,
    config: SchedulerConfig,
}

impl PollScheduler {
    pub fn new(
        machine: DisplayMachine,
        source: Arc<dyn NotificationSource>,
        cache: Arc<ContentCache>,
        renderer: Arc<dyn Renderer>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            machine,
            source,
            cache,
            renderer,
            config,
        }
    }

    /// 在后台任务中启动调度
    pub fn spawn(self) -> (SchedulerHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(DisplayStatus::Idle);
        let task = tokio::spawn(self.run(command_rx, status_tx));
        (
            SchedulerHandle {
                commands: command_tx,
                status: status_rx,
            },
            task,
        )
    }

    async fn run(
        self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        status_tx: watch::Sender<DisplayStatus>,
    ) {
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let mut driver = Driver {
            timers: Timers::new(self.config.poll_interval),
            machine: self.machine,
            source: self.source,
            cache: self.cache,
            renderer: self.renderer,
            config: self.config,
            events_tx,
            tasks: JoinSet::new(),
            status_tx,
        };

        if driver.config.sweep_cache_on_start {
            match driver.cache.remove_expired().await {
                Ok(removed) => debug!(removed, "Startup cache sweep finished"),
                Err(e) => warn!(error = %e, "Startup cache sweep failed"),
            }
        }

        info!(
            poll_interval_ms = driver.config.poll_interval.as_millis() as u64,
            "Poll scheduler started"
        );
        driver.dispatch(Event::Started);

        loop {
            tokio::select! {
                _ = driver.timers.pull.tick(), if driver.timers.pulls_active => {
                    driver.spawn_pull();
                }
                _ = next_countdown_tick(&mut driver.timers.countdown) => {
                    driver.dispatch(Event::CountdownTick);
                }
                _ = confirmation_elapsed(&mut driver.timers.confirmation) => {
                    driver.timers.confirmation = None;
                    driver.dispatch(Event::ConfirmationElapsed);
                }
                Some(event) = events_rx.recv() => {
                    driver.dispatch(event);
                }
                command = commands.recv() => match command {
                    Some(Command::Touch(notification_id)) => {
                        driver.dispatch(Event::Touched { notification_id, at: Utc::now() });
                    }
                    Some(Command::Stop) | None => break,
                },
                Some(_) = driver.tasks.join_next(), if !driver.tasks.is_empty() => {}
            }
        }

        // 中止仍在进行的请求，结果不再投递
        driver.tasks.abort_all();
        info!("Poll scheduler stopped");
    }
}

struct Timers {
    pulls_active: bool,
    poll_interval: Duration,
    pull: Interval,
    countdown: Option<Interval>,
    confirmation: Option<Pin<Box<Sleep>>>,
}

impl Timers {
    fn new(poll_interval: Duration) -> Self {
        // 首次 tick 立即触发
        let mut pull = interval(poll_interval);
        pull.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            pulls_active: true,
            poll_interval,
            pull,
            countdown: None,
            confirmation: None,
        }
    }

    fn rearm_pulls(&mut self) {
        let mut pull = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        pull.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.pull = pull;
        self.pulls_active = true;
    }
}

async fn next_countdown_tick(countdown: &mut Option<Interval>) {
    match countdown {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending::<()>().await,
    }
}

async fn confirmation_elapsed(confirmation: &mut Option<Pin<Box<Sleep>>>) {
    match confirmation {
        Some(dwell) => dwell.as_mut().await,
        None => pending::<()>().await,
    }
}

/// 事件循环内部状态，执行状态机返回的副作用
struct Driver {
    timers: Timers,
    machine: DisplayMachine,
    source: Arc<dyn NotificationSource>,
    cache: Arc<ContentCache>,
    renderer: Arc<dyn Renderer>,
    config: SchedulerConfig,
    events_tx: mpsc::UnboundedSender<Event>,
    tasks: JoinSet<()>,
    status_tx: watch::Sender<DisplayStatus>,
}

impl Driver {
    fn dispatch(&mut self, event: Event) {
        for effect in self.machine.handle(event) {
            self.execute(effect);
        }
        self.status_tx.send_replace(self.machine.status());
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Render(frame) => self.renderer.render(&frame),
            Effect::StartCountdown => {
                let tick = self.config.countdown_tick;
                self.timers.countdown = Some(interval_at(Instant::now() + tick, tick));
            }
            Effect::StopCountdown => self.timers.countdown = None,
            Effect::SuspendPulls => {
                debug!("Notification pulling suspended");
                self.timers.pulls_active = false;
            }
            Effect::ResumePulls => {
                debug!("Notification pulling resumed");
                self.timers.rearm_pulls();
            }
            Effect::PullNow => self.spawn_pull(),
            Effect::ResolveContent {
                notification_id,
                content,
            } => self.resolve_content(notification_id, content),
            Effect::PushEvent(event) => self.spawn_push(event),
            Effect::ScheduleConfirmation(dwell) => {
                self.timers.confirmation = Some(Box::pin(sleep(dwell)));
            }
            Effect::ReportError(err) => error!(
                kind = err.kind(),
                error = %err,
                "Error in REST call for notification pulling"
            ),
        }
    }

    fn spawn_pull(&mut self) {
        let source = self.source.clone();
        let events = self.events_tx.clone();
        let timeout = self.config.pull_timeout;
        self.tasks.spawn(async move {
            let started = Instant::now();
            let result = match tokio::time::timeout(timeout, source.pull()).await {
                Ok(result) => result,
                Err(_) => Err(ClientError::Timeout(timeout)),
            };
            let _ = events.send(Event::PullCompleted {
                result,
                elapsed: started.elapsed(),
            });
        });
    }

    fn spawn_push(&mut self, event: UserEvent) {
        let source = self.source.clone();
        let events = self.events_tx.clone();
        let timeout = self.config.event_timeout;
        let notification_id = event.source_id;
        self.tasks.spawn(async move {
            let result = match tokio::time::timeout(timeout, source.push_event(&event)).await {
                Ok(result) => result,
                Err(_) => Err(ClientError::Timeout(timeout)),
            };
            let _ = events.send(Event::EventPushed {
                notification_id,
                result,
            });
        });
    }

    /// 按内容类型解析媒体（图片由渲染端直接加载，视频先落地到缓存）
    fn resolve_content(&mut self, notification_id: i64, content: Content) {
        match content {
            Content::Image(uri) => {
                let _ = self.events_tx.send(Event::ContentResolved {
                    notification_id,
                    media: ResolvedMedia::RemoteImage { uri },
                });
            }
            Content::Video(uri) => {
                let cache = self.cache.clone();
                let events = self.events_tx.clone();
                self.tasks.spawn(async move {
                    // 先查本地条目，未命中再下载
                    let resolved = match cache.resolve_local_file(&uri).await {
                        Ok(handle) => {
                            debug!(
                                notification_id,
                                path = %handle.path.display(),
                                "Video served from cache"
                            );
                            Ok(handle)
                        }
                        Err(CacheError::Miss(_)) => cache.get_or_fetch(&uri).await,
                        Err(e) => Err(e),
                    };
                    let event = match resolved {
                        Ok(handle) => Event::ContentResolved {
                            notification_id,
                            media: ResolvedMedia::LocalVideo(handle),
                        },
                        Err(e) => Event::ContentFailed {
                            notification_id,
                            reason: e.to_string(),
                        },
                    };
                    let _ = events.send(event);
                });
            }
        }
    }
}
