//! Audio feedback: terminal-bell pulses keyed off game events.
//!
//! Fire-and-forget: writes never block the frame loop and failures are
//! swallowed. Muted games skip the writes entirely.

use crate::game::GameEvent;
use std::io::Write;

pub struct Sound {
    enabled: bool,
}

impl Sound {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// React to one drained engine event.
    pub fn handle(&self, event: &GameEvent) {
        if !self.enabled {
            return;
        }
        match event {
            GameEvent::Rotated | GameEvent::Moved { .. } => {}
            GameEvent::HardDropped { distance } if *distance > 0 => self.bell(1),
            GameEvent::LinesCleared { count, .. } => self.bell(*count as usize),
            GameEvent::LevelUp(_) => self.bell(2),
            GameEvent::GameOver => self.bell(3),
            _ => {}
        }
    }

    /// Emit n BEL characters. The terminal coalesces them; errors ignored.
    fn bell(&self, n: usize) {
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(&vec![0x07; n]);
        let _ = stdout.flush();
    }
}
