/// Transport commands the UI can issue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportCommand {
    Play,
    Pause,
    Restart,
    /// Jump to global progress in [0, 1].
    Seek(f32),
    SetSpeed(f32),
    SetExplanationMode(bool),
    /// Leave the current explanation gate.
    ContinueExplanation,
}

/// A queue of transport commands.
/// JS pushes commands as the user clicks; the visualizer drains them at the
/// start of the next tick.
pub struct CommandQueue {
    commands: Vec<TransportCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self {
            commands: Vec::with_capacity(8),
        }
    }

    pub fn push(&mut self, command: TransportCommand) {
        self.commands.push(command);
    }

    /// Drain all pending commands in arrival order.
    pub fn drain(&mut self) -> Vec<TransportCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}
