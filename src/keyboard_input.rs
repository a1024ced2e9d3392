use crate::error::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Session controls the terminal can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Start the session when idle, stop it when active
    ToggleSession,
    NextPose,
    PreviousPose,
    Quit,
}

/// Map a key to its session control, if it has one
pub fn command_for_key(code: KeyCode) -> Option<ControlCommand> {
    match code {
        KeyCode::Char(' ') => Some(ControlCommand::ToggleSession),
        KeyCode::Char('n') | KeyCode::Right => Some(ControlCommand::NextPose),
        KeyCode::Char('p') | KeyCode::Left => Some(ControlCommand::PreviousPose),
        KeyCode::Char('q') | KeyCode::Esc => Some(ControlCommand::Quit),
        _ => None,
    }
}

/// Keyboard control of a coaching session from the terminal
pub struct KeyboardInputHandler {
    commands: mpsc::UnboundedSender<ControlCommand>,
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    /// Create a handler that forwards key commands to `commands`
    pub fn new(commands: mpsc::UnboundedSender<ControlCommand>) -> Self {
        Self {
            commands,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for keyboard input
    pub async fn start(&self) -> Result<()> {
        info!("Keyboard controls: SPACE start/stop, n/p next/previous pose, q quit");

        let commands = self.commands.clone();
        let cancellation_token = self.cancellation_token.clone();

        task::spawn_blocking(move || {
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            debug!("Raw mode enabled - keyboard handler active");

            loop {
                if cancellation_token.is_cancelled() {
                    debug!("Keyboard input handler stopping");
                    break;
                }

                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        let Ok(Event::Key(key_event)) = event::read() else {
                            continue;
                        };
                        if key_event.kind != KeyEventKind::Press {
                            continue;
                        }

                        let Some(command) = command_for_key(key_event.code) else {
                            debug!("Key pressed: {:?}", key_event.code);
                            continue;
                        };

                        debug!("Key {:?} -> {:?}", key_event.code, command);
                        if commands.send(command).is_err() {
                            warn!("Session control channel closed");
                            break;
                        }
                        if command == ControlCommand::Quit {
                            break;
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            } else {
                debug!("Raw mode disabled");
            }
        });

        Ok(())
    }

    /// Stop the keyboard input handler
    pub async fn stop(&self) -> Result<()> {
        debug!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        // Let the polling task notice and restore the terminal
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = disable_raw_mode();

        Ok(())
    }
}
