//! Warnings about an upcoming border shrink.
//!
//! While a warning is armed, every player standing outside the future border is
//! reminded of it at a fixed interval. Re-arming replaces the previous warning
//! entirely, and any change to the actual border cancels it.

use crate::clock::Countdown;
use crate::config::BorderSettings;
use crate::events::UhcEvent;
use crate::host::{HostContext, Task};
use crate::types::{CommandSender, Dimension, Location, PlayerId, TaskHandle, TICKS_PER_SECOND};
use chrono::TimeDelta;
use tracing::{debug, info};

/// Name of the countdown shown while a timed warning is armed.
pub const WARNING_TIMER_NAME: &str = "Border shrinking";

pub struct WarningScheduler {
    settings: BorderSettings,
    host: HostContext,

    diameter: Option<u32>,
    timer: Option<Countdown>,
    sender: Option<CommandSender>,
    task: Option<TaskHandle>,
    /// Bumped on every arm so tasks from a replaced warning are ignored.
    generation: u64,
}

impl WarningScheduler {
    pub fn new(settings: BorderSettings, host: HostContext) -> Self {
        Self {
            settings,
            host,
            diameter: None,
            timer: None,
            sender: None,
            task: None,
            generation: 0,
        }
    }

    /// Arms a warning for a future border of `diameter` blocks.
    ///
    /// `time_left` adds a countdown to the announcements. The previous sender is
    /// kept when `sender` is `None`.
    pub fn arm(&mut self, diameter: u32, time_left: Option<TimeDelta>, sender: Option<CommandSender>) {
        self.cancel();

        self.diameter = Some(diameter);

        if let Some(time_left) = time_left {
            let mut timer = Countdown::new(WARNING_TIMER_NAME, time_left.num_seconds());
            self.host.display.register_timer(&timer);
            timer.start(self.host.time.now());
            self.timer = Some(timer);
        }

        if sender.is_some() {
            self.sender = sender;
        }

        self.generation += 1;
        self.task = Some(self.host.scheduler.run_periodic(
            TICKS_PER_SECOND,
            self.settings
                .warning_interval_secs
                .saturating_mul(TICKS_PER_SECOND),
            Task::BorderWarning {
                generation: self.generation,
            },
        ));

        let seconds_left = self.timer.as_ref().map(Countdown::duration_secs);
        info!(diameter, ?seconds_left, generation = self.generation, "⚠️ Border warning armed");
        self.host.events.emit(&UhcEvent::BorderWarningArmed {
            diameter,
            seconds_left,
        });
    }

    /// Stops the current warning. Returns false if nothing was armed.
    pub fn cancel(&mut self) -> bool {
        let task = self.task.take();
        let timer = self.timer.take();
        let was_armed = task.is_some();

        if let Some(handle) = task {
            if !self.host.scheduler.cancel(handle) {
                debug!(?handle, "warning task already stopped");
            }
        }

        if let Some(mut timer) = timer {
            timer.stop();
            self.host.display.unregister_timer(timer.name());
        }

        self.diameter = None;

        if was_armed {
            info!("Border warning cancelled");
            self.host.events.emit(&UhcEvent::BorderWarningCancelled);
        }
        was_armed
    }

    /// The actual border changed; the warning no longer applies.
    pub fn on_border_changed(&mut self, diameter: u32) {
        if self.cancel() {
            debug!(diameter, "border changed, warning dropped");
        }
    }

    /// Sends one round of announcements.
    ///
    /// Returns how many players were warned; tasks from a replaced warning warn nobody.
    pub fn announce<F>(&self, generation: u64, is_alive: F) -> usize
    where
        F: Fn(PlayerId) -> bool,
    {
        if generation != self.generation || self.task.is_none() {
            debug!(generation, current = self.generation, "stale border warning skipped");
            return 0;
        }
        let Some(diameter) = self.diameter else {
            return 0;
        };

        let message = self.message(diameter);
        let players = &self.host.players;
        let mut warned = 0;
        for player in players.online() {
            if !is_alive(player) {
                continue;
            }
            let Some(location) = players.location(player) else {
                continue;
            };
            if self.is_outside(&location, diameter) {
                players.send_message(player, &message);
                warned += 1;
            }
        }

        debug!(diameter, warned, "border warning sent");
        warned
    }

    fn message(&self, diameter: u32) -> String {
        let mut message = format!(
            "You are outside the future border ({diameter}×{diameter} blocks). Move inside it!"
        );

        if let Some(timer) = &self.timer {
            let left = timer.remaining(self.host.time.now());
            if !left.is_zero() {
                message.push_str(&format!(
                    " Time left: {} min {:02} s.",
                    left.num_minutes(),
                    left.num_seconds() % 60
                ));
            }
        }
        message
    }

    /// Square border centred on the configured point, overworld only.
    fn is_outside(&self, location: &Location, diameter: u32) -> bool {
        if location.dimension != Dimension::Overworld {
            return false;
        }
        let radius = f64::from(diameter) / 2.0;
        (location.x - self.settings.center_x).abs() > radius
            || (location.z - self.settings.center_z).abs() > radius
    }

    pub fn is_armed(&self) -> bool {
        self.task.is_some()
    }

    pub fn diameter(&self) -> Option<u32> {
        self.diameter
    }

    pub fn sender(&self) -> Option<CommandSender> {
        self.sender
    }

    pub fn timer(&self) -> Option<&Countdown> {
        self.timer.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
