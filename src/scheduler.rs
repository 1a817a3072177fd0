//! The control loop.
//!
//! Each iteration polls at most one command line without blocking, then runs
//! the update step if at least [`TICK_FLOOR`] has elapsed since the previous
//! one. The actuator is written only when an axis moved.

use crate::{
    actuator::Actuator,
    command::{Command, HELP},
    constants::TICK_FLOOR,
    controller::MotionController,
};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

/// What a single loop iteration did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Iteration {
    pub command_handled: bool,
    pub ticked: bool,
    pub wrote: bool,
}

pub struct Scheduler<A> {
    controller: MotionController,
    actuator: A,
    commands: mpsc::UnboundedReceiver<String>,
    feedback: mpsc::UnboundedSender<String>,
    last_update: Instant,
    input_closed: bool,
}

impl<A: Actuator> Scheduler<A> {
    pub fn new(
        actuator: A,
        commands: mpsc::UnboundedReceiver<String>,
        feedback: mpsc::UnboundedSender<String>,
    ) -> Self {
        Scheduler {
            controller: MotionController::new(),
            actuator,
            commands,
            feedback,
            last_update: Instant::now(),
            input_closed: false,
        }
    }

    pub fn controller(&self) -> &MotionController {
        &self.controller
    }

    fn say(&self, line: impl Into<String>) {
        // the feedback receiver may already be gone
        let _ = self.feedback.send(line.into());
    }

    /// Print the banner and hold both servos at their centers.
    pub async fn start(&mut self) {
        self.say("Pan-tilt controller ready");
        self.say("Commands:");
        for line in HELP {
            self.say(format!("  {}", line));
        }

        let angles = self.controller.angles();
        if let Err(e) = self.actuator.write(angles).await {
            warn!(error = %e, "initial servo write failed");
        }
        self.last_update = Instant::now();
    }

    fn handle_line(&mut self, line: &str) {
        match line.parse::<Command>() {
            Ok(command) => {
                if let Some(ack) = self.controller.apply(command) {
                    self.say(ack);
                }
            }
            Err(e) => {
                debug!(line, error = %e, "rejected command");
                self.say(e.to_string());
            }
        }
    }

    pub async fn iterate(&mut self) -> Iteration {
        let mut iteration = Iteration::default();

        match self.commands.try_recv() {
            Ok(line) => {
                self.handle_line(&line);
                iteration.command_handled = true;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                if !self.input_closed {
                    debug!("command input closed, holding last commands");
                    self.input_closed = true;
                }
            }
        }

        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update);
        if elapsed >= TICK_FLOOR {
            self.last_update = now;
            iteration.ticked = true;

            let outcome = self.controller.tick(elapsed.as_secs_f32());
            if outcome.calibration_finished {
                self.say("Calibration complete");
            }
            if outcome.moved {
                match self.actuator.write(self.controller.angles()).await {
                    Ok(()) => iteration.wrote = true,
                    Err(e) => warn!(error = %e, "servo write failed"),
                }
            }
        }

        iteration
    }

    /// Run forever. `idle` is slept between iterations; zero just yields.
    pub async fn run(mut self, idle: Duration) {
        self.start().await;
        loop {
            self.iterate().await;
            if idle.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(idle).await;
            }
        }
    }
}

/// Forward every line read from `reader` into `tx` until EOF.
pub fn spawn_line_reader<R>(reader: R, tx: mpsc::UnboundedSender<String>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "command input failed");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::{ActuatorError, SimActuator};
    use crate::types::{Angles, Axis};
    use async_trait::async_trait;
    use tokio::io::AsyncWriteExt;

    struct Harness {
        scheduler: Scheduler<SimActuator>,
        servo: SimActuator,
        commands: mpsc::UnboundedSender<String>,
        feedback: mpsc::UnboundedReceiver<String>,
    }

    impl Harness {
        async fn new() -> Self {
            let servo = SimActuator::new();
            let (commands, command_rx) = mpsc::unbounded_channel();
            let (feedback_tx, feedback) = mpsc::unbounded_channel();
            let mut scheduler = Scheduler::new(servo.clone(), command_rx, feedback_tx);
            scheduler.start().await;
            Harness {
                scheduler,
                servo,
                commands,
                feedback,
            }
        }

        fn send(&self, line: &str) {
            self.commands.send(line.to_string()).unwrap();
        }

        async fn step(&mut self, dt: Duration) -> Iteration {
            tokio::time::advance(dt).await;
            self.scheduler.iterate().await
        }

        fn drain_feedback(&mut self) -> Vec<String> {
            let mut lines = Vec::new();
            while let Ok(line) = self.feedback.try_recv() {
                lines.push(line);
            }
            lines
        }

        fn pan(&self) -> f32 {
            self.scheduler.controller().axis(Axis::Pan).current()
        }

        fn tilt(&self) -> f32 {
            self.scheduler.controller().axis(Axis::Tilt).current()
        }
    }

    const TICK: Duration = Duration::from_millis(10);

    #[tokio::test(start_paused = true)]
    async fn start_prints_banner_and_centers_servos() {
        let mut h = Harness::new().await;
        let banner = h.drain_feedback();
        assert_eq!(banner[0], "Pan-tilt controller ready");
        assert!(banner.iter().any(|l| l.contains("vp:<deg/s>")));
        assert_eq!(h.servo.writes(), vec![Angles { pan: 90, tilt: 110 }]);
    }

    #[tokio::test(start_paused = true)]
    async fn velocity_then_position_scenario() {
        let mut h = Harness::new().await;
        h.drain_feedback();

        h.send("vp:30");
        let first = h.scheduler.iterate().await;
        assert!(first.command_handled);
        assert!(!first.ticked);
        assert_eq!(h.drain_feedback(), vec!["Pan velocity: 30".to_string()]);

        let mut last = h.pan();
        let mut ticks = 0;
        while h.scheduler.controller().axis(Axis::Pan).in_velocity_mode() {
            h.step(TICK).await;
            assert!(h.pan() >= last);
            last = h.pan();
            ticks += 1;
            assert!(ticks <= 302, "pan never saturated");
        }
        assert!(ticks >= 299);
        assert_eq!(h.pan(), 180.0);
        assert_eq!(h.servo.last().unwrap().pan, 180);

        h.send("t:95");
        let mut last = h.tilt();
        for _ in 0..100 {
            h.step(TICK).await;
            assert!(h.tilt() <= last);
            assert!(h.tilt() >= 95.0 - 1e-3);
            last = h.tilt();
        }
        assert!((h.tilt() - 95.0).abs() < 1e-3);
        assert_eq!(h.servo.last(), Some(Angles { pan: 180, tilt: 95 }));
    }

    #[tokio::test(start_paused = true)]
    async fn consumes_at_most_one_command_per_iteration() {
        let mut h = Harness::new().await;
        h.send("p:10");
        h.send("t:170");

        h.scheduler.iterate().await;
        assert_eq!(h.scheduler.controller().axis(Axis::Pan).target(), 10.0);
        assert_eq!(h.scheduler.controller().axis(Axis::Tilt).target(), 110.0);

        h.scheduler.iterate().await;
        assert_eq!(h.scheduler.controller().axis(Axis::Tilt).target(), 170.0);
    }

    #[tokio::test(start_paused = true)]
    async fn update_waits_for_the_tick_floor() {
        let mut h = Harness::new().await;
        h.send("p:0");
        let iteration = h.step(Duration::from_millis(4)).await;
        assert!(iteration.command_handled);
        assert!(!iteration.ticked);
        assert_eq!(h.pan(), 90.0);

        let iteration = h.step(Duration::from_millis(6)).await;
        assert!(iteration.ticked);
        assert!(iteration.wrote);
        assert!((h.pan() - 89.4).abs() < 1e-3);
    }

    #[tokio::test(start_paused = true)]
    async fn late_tick_uses_the_real_elapsed_time() {
        let mut h = Harness::new().await;
        h.send("vt:20");
        h.scheduler.iterate().await;
        h.step(Duration::from_millis(250)).await;
        assert!((h.tilt() - 115.0).abs() < 1e-3);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_axes_are_not_rewritten() {
        let mut h = Harness::new().await;
        for _ in 0..50 {
            let iteration = h.step(TICK).await;
            assert!(iteration.ticked);
            assert!(!iteration.wrote);
        }
        assert_eq!(h.servo.write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_commands_report_and_change_nothing() {
        let mut h = Harness::new().await;
        h.drain_feedback();

        h.send("b:45");
        h.send("wiggle");
        h.send("   ");
        for _ in 0..3 {
            h.step(TICK).await;
        }

        assert_eq!(
            h.drain_feedback(),
            vec![
                "Invalid format, expected b:<pan>,<tilt>: b:45".to_string(),
                "Unknown command: wiggle".to_string(),
                "Empty command".to_string(),
            ]
        );
        let controller = h.scheduler.controller();
        assert_eq!(controller.axis(Axis::Pan).target(), 90.0);
        assert_eq!(controller.axis(Axis::Tilt).target(), 110.0);
        assert_eq!(h.servo.write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn paired_move_sets_both_targets() {
        let mut h = Harness::new().await;
        h.send("b:30,150");
        h.scheduler.iterate().await;
        let controller = h.scheduler.controller();
        assert_eq!(controller.axis(Axis::Pan).target(), 30.0);
        assert_eq!(controller.axis(Axis::Tilt).target(), 150.0);
    }

    #[tokio::test(start_paused = true)]
    async fn calibration_reports_completion() {
        let mut h = Harness::new().await;
        h.drain_feedback();
        h.send("cal");
        let mut feedback = Vec::new();
        for _ in 0..1000 {
            h.step(TICK).await;
            feedback.extend(h.drain_feedback());
        }
        assert_eq!(
            feedback,
            vec!["Calibrating...".to_string(), "Calibration complete".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn closed_input_keeps_motion_running() {
        let mut h = Harness::new().await;
        h.send("vp:-45");
        let Harness {
            mut scheduler,
            servo,
            commands,
            ..
        } = h;
        drop(commands);

        for _ in 0..300 {
            tokio::time::advance(TICK).await;
            scheduler.iterate().await;
        }
        assert_eq!(scheduler.controller().axis(Axis::Pan).current(), 0.0);
        assert_eq!(servo.last().unwrap().pan, 0);
    }

    struct BrokenActuator {
        attempts: usize,
    }

    #[async_trait]
    impl Actuator for BrokenActuator {
        async fn write(&mut self, _angles: Angles) -> Result<(), ActuatorError> {
            self.attempts += 1;
            Err(ActuatorError::Device("unplugged".into()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn write_failures_do_not_stop_the_loop() {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (feedback_tx, _feedback) = mpsc::unbounded_channel();
        let mut scheduler = Scheduler::new(BrokenActuator { attempts: 0 }, command_rx, feedback_tx);
        scheduler.start().await;

        commands.send("p:60".to_string()).unwrap();
        for _ in 0..10 {
            tokio::time::advance(TICK).await;
            let iteration = scheduler.iterate().await;
            assert!(!iteration.wrote);
        }
        assert_eq!(scheduler.actuator.attempts, 11);
        assert!(scheduler.controller().axis(Axis::Pan).current() < 90.0);
    }

    #[tokio::test]
    async fn line_reader_forwards_lines_until_eof() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_line_reader(reader, tx);

        writer.write_all(b"p:45\r\nVP:-3\n").await.unwrap();
        drop(writer);

        assert_eq!(rx.recv().await.as_deref(), Some("p:45"));
        assert_eq!(rx.recv().await.as_deref(), Some("VP:-3"));
        assert_eq!(rx.recv().await, None);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn run_drives_the_servos_from_a_reader() {
        let servo = SimActuator::new();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (feedback_tx, _feedback) = mpsc::unbounded_channel();
        let (mut writer, reader) = tokio::io::duplex(64);
        spawn_line_reader(reader, command_tx);

        let scheduler = Scheduler::new(servo.clone(), command_rx, feedback_tx);
        let run = tokio::spawn(scheduler.run(Duration::from_millis(1)));

        writer.write_all(b"b:120,150\n").await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(servo.last(), Some(Angles { pan: 120, tilt: 150 }));
        run.abort();
    }
}
