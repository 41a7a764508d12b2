use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::config::CaptureConfig;

/// Where the capture flow currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    /// Countdown showing `n`
    Counting(u32),
    /// Waiting for the capture command to be executed
    Triggering,
    /// Between photos
    Pausing,
    /// Target count reached; terminal until reset
    Done,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureState::Idle => f.write_str("idle"),
            CaptureState::Counting(n) => write!(f, "counting({})", n),
            CaptureState::Triggering => f.write_str("triggering"),
            CaptureState::Pausing => f.write_str("pausing"),
            CaptureState::Done => f.write_str("done"),
        }
    }
}

/// Which wait a timer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// One countdown step
    Tick,
    /// Short delay between the countdown hitting zero and the shutter
    Settle,
    /// Gap between photos
    Pause,
}

/// Timer token handed out with every `Schedule` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub epoch: u64,
    pub kind: TimerKind,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Arm a timer; deliver it back through `timer_elapsed`
    Schedule { delay: Duration, timer: Timer },
    /// New countdown display value, `None` hides it
    Countdown(Option<u32>),
    /// Audible tick for a countdown value above zero
    Beep(u32),
    /// Grab a frame, compose it and append it
    Capture,
    /// Target reached
    Finished,
    /// Drop any armed timer
    CancelTimers,
    /// Drop every captured photo
    ReleasePhotos,
}

/// Result of one transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: CaptureState,
    pub commands: Vec<Command>,
}

impl Transition {
    fn stay(state: CaptureState) -> Self {
        Self { state, commands: Vec::new() }
    }
}

/// Countdown-and-capture controller
///
/// Pure state: it never touches the camera or a clock. Callers execute the
/// returned commands and feed timer expiry and capture outcomes back in.
#[derive(Debug, Clone)]
pub struct CaptureMachine {
    state: CaptureState,
    epoch: u64,
    captured: u32,
    target: u32,
    countdown_start: u32,
    tick: Duration,
    settle: Duration,
    pause: Duration,
}

impl CaptureMachine {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            state: CaptureState::Idle,
            epoch: 0,
            captured: 0,
            target: config.target_photos,
            countdown_start: config.countdown_start,
            tick: config.tick(),
            settle: config.settle(),
            pause: config.pause(),
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Countdown display value
    pub fn countdown(&self) -> Option<u32> {
        match self.state {
            CaptureState::Counting(n) => Some(n),
            _ => None,
        }
    }

    /// Photos captured so far and the target
    pub fn progress(&self) -> (u32, u32) {
        (self.captured, self.target)
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_done(&self) -> bool {
        self.state == CaptureState::Done
    }

    /// Begin a capture run; ignored unless idle
    pub fn start(&mut self) -> Transition {
        if self.state != CaptureState::Idle {
            debug!("start ignored while {}", self.state);
            return Transition::stay(self.state);
        }
        self.captured = 0;
        self.begin_countdown()
    }

    /// A previously scheduled timer fired
    pub fn timer_elapsed(&mut self, timer: Timer) -> Transition {
        if timer.epoch != self.epoch {
            debug!("stale timer {:?} (epoch {} now {})", timer.kind, timer.epoch, self.epoch);
            return Transition::stay(self.state);
        }

        match (self.state, timer.kind) {
            (CaptureState::Counting(n), TimerKind::Tick) if n > 0 => {
                let next = n - 1;
                let mut commands = vec![Command::Countdown(Some(next))];
                if next > 0 {
                    commands.push(Command::Beep(next));
                    commands.push(self.schedule(TimerKind::Tick));
                } else {
                    commands.push(self.schedule(TimerKind::Settle));
                }
                self.enter(CaptureState::Counting(next), commands)
            }
            (CaptureState::Counting(0), TimerKind::Settle) => self.enter(
                CaptureState::Triggering,
                vec![Command::Countdown(None), Command::Capture],
            ),
            (CaptureState::Pausing, TimerKind::Pause) => self.begin_countdown(),
            (state, kind) => {
                debug!("timer {:?} does not apply to {}", kind, state);
                Transition::stay(state)
            }
        }
    }

    /// The capture command produced a photo
    pub fn photo_captured(&mut self) -> Transition {
        if self.state != CaptureState::Triggering {
            debug!("photo_captured ignored while {}", self.state);
            return Transition::stay(self.state);
        }

        self.captured += 1;
        if self.captured >= self.target {
            self.enter(CaptureState::Done, vec![Command::Finished])
        } else {
            let pause = self.schedule(TimerKind::Pause);
            self.enter(CaptureState::Pausing, vec![pause])
        }
    }

    /// The capture command found no stream; nothing was appended
    pub fn capture_skipped(&mut self) -> Transition {
        if self.state != CaptureState::Triggering {
            return Transition::stay(self.state);
        }
        self.enter(CaptureState::Idle, Vec::new())
    }

    /// Abandon the session from any state
    pub fn reset(&mut self) -> Transition {
        self.epoch += 1;
        self.captured = 0;
        self.enter(CaptureState::Idle, vec![Command::CancelTimers, Command::ReleasePhotos])
    }

    fn begin_countdown(&mut self) -> Transition {
        let start = self.countdown_start;
        let mut commands = vec![Command::Countdown(Some(start))];
        if start > 0 {
            commands.push(Command::Beep(start));
            commands.push(self.schedule(TimerKind::Tick));
        } else {
            commands.push(self.schedule(TimerKind::Settle));
        }
        self.enter(CaptureState::Counting(start), commands)
    }

    fn schedule(&self, kind: TimerKind) -> Command {
        let delay = match kind {
            TimerKind::Tick => self.tick,
            TimerKind::Settle => self.settle,
            TimerKind::Pause => self.pause,
        };
        Command::Schedule { delay, timer: Timer { epoch: self.epoch, kind } }
    }

    fn enter(&mut self, state: CaptureState, commands: Vec<Command>) -> Transition {
        debug!("capture: {} -> {}", self.state, state);
        self.state = state;
        Transition { state, commands }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> CaptureMachine {
        CaptureMachine::new(&CaptureConfig::default())
    }

    fn scheduled(transition: &Transition) -> Option<Timer> {
        transition.commands.iter().find_map(|c| match c {
            Command::Schedule { timer, .. } => Some(*timer),
            _ => None,
        })
    }

    /// Drive the machine until it asks for a capture, collecting countdown values
    fn count_down(machine: &mut CaptureMachine, mut transition: Transition, shown: &mut Vec<Option<u32>>) {
        loop {
            for command in &transition.commands {
                if let Command::Countdown(value) = command {
                    shown.push(*value);
                }
            }
            if transition.commands.contains(&Command::Capture) {
                return;
            }
            let timer = scheduled(&transition).expect("countdown must keep a timer armed");
            transition = machine.timer_elapsed(timer);
        }
    }

    #[test]
    fn test_full_run_of_four_photos() {
        let mut m = machine();
        let mut shown = Vec::new();
        let mut captures = 0;

        let mut transition = m.start();
        loop {
            count_down(&mut m, transition, &mut shown);
            assert_eq!(m.state(), CaptureState::Triggering);
            captures += 1;

            let after = m.photo_captured();
            if after.commands.contains(&Command::Finished) {
                break;
            }
            assert_eq!(after.state, CaptureState::Pausing);
            let pause = scheduled(&after).unwrap();
            assert_eq!(pause.kind, TimerKind::Pause);
            transition = m.timer_elapsed(pause);
        }

        assert_eq!(captures, 4);
        assert_eq!(m.state(), CaptureState::Done);
        assert_eq!(m.progress(), (4, 4));

        let one_cycle = [Some(3), Some(2), Some(1), Some(0), None];
        let expected: Vec<Option<u32>> = one_cycle.iter().copied().cycle().take(20).collect();
        assert_eq!(shown, expected);
    }

    #[test]
    fn test_beeps_only_above_zero() {
        let mut m = machine();
        let mut beeps = Vec::new();
        let mut transition = m.start();
        while !transition.commands.contains(&Command::Capture) {
            for command in &transition.commands {
                if let Command::Beep(n) = command {
                    beeps.push(*n);
                }
            }
            transition = m.timer_elapsed(scheduled(&transition).unwrap());
        }
        assert_eq!(beeps, vec![3, 2, 1]);
    }

    #[test]
    fn test_timer_durations() {
        let mut m = machine();
        let start = m.start();
        assert!(start
            .commands
            .contains(&Command::Schedule { delay: Duration::from_millis(1000), timer: Timer { epoch: 0, kind: TimerKind::Tick } }));

        let mut transition = start;
        for _ in 0..3 {
            transition = m.timer_elapsed(scheduled(&transition).unwrap());
        }
        assert_eq!(m.countdown(), Some(0));
        assert!(transition
            .commands
            .contains(&Command::Schedule { delay: Duration::from_millis(800), timer: Timer { epoch: 0, kind: TimerKind::Settle } }));
    }

    #[test]
    fn test_done_is_terminal() {
        let config = CaptureConfig { target_photos: 1, ..CaptureConfig::default() };
        let mut m = CaptureMachine::new(&config);
        let mut shown = Vec::new();
        let start = m.start();
        count_down(&mut m, start, &mut shown);
        assert!(m.photo_captured().commands.contains(&Command::Finished));

        // Further events cannot append or restart
        assert!(m.photo_captured().commands.is_empty());
        assert!(m.start().commands.is_empty());
        assert_eq!(m.progress(), (1, 1));
        assert!(m.is_done());
    }

    #[test]
    fn test_start_ignored_while_counting() {
        let mut m = machine();
        m.start();
        let again = m.start();
        assert_eq!(again.state, CaptureState::Counting(3));
        assert!(again.commands.is_empty());
    }

    #[test]
    fn test_reset_invalidates_timers() {
        let mut m = machine();
        let start = m.start();
        let stale = scheduled(&start).unwrap();

        let reset = m.reset();
        assert_eq!(reset.state, CaptureState::Idle);
        assert_eq!(reset.commands, vec![Command::CancelTimers, Command::ReleasePhotos]);
        assert_eq!(m.countdown(), None);

        // A tick armed before the reset must not move the new run
        let restart = m.start();
        let fresh = scheduled(&restart).unwrap();
        assert_ne!(fresh.epoch, stale.epoch);
        assert!(m.timer_elapsed(stale).commands.is_empty());
        assert_eq!(m.countdown(), Some(3));
        m.timer_elapsed(fresh);
        assert_eq!(m.countdown(), Some(2));
    }

    #[test]
    fn test_mismatched_timer_kind_is_noop() {
        let mut m = machine();
        m.start();
        let wrong = Timer { epoch: m.epoch(), kind: TimerKind::Pause };
        assert!(m.timer_elapsed(wrong).commands.is_empty());
        assert_eq!(m.countdown(), Some(3));
    }

    #[test]
    fn test_capture_skipped_returns_to_idle() {
        let mut m = machine();
        let start = m.start();
        let mut shown = Vec::new();
        count_down(&mut m, start, &mut shown);

        let skipped = m.capture_skipped();
        assert_eq!(skipped.state, CaptureState::Idle);
        assert_eq!(m.progress(), (0, 4));
        assert_eq!(m.start().state, CaptureState::Counting(3));
    }
}
