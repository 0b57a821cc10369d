use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, KeyEvent, KeyEventKind, MouseButton, MouseEventKind};

pub enum Event {
    /// Press or auto-repeat.
    Key(KeyEvent),
    /// Only delivered by terminals with keyboard enhancement enabled.
    Release(KeyEvent),
    /// Left button down at a terminal cell.
    Click { column: u16, row: u16 },
    Tick,
}

pub struct EventHandler {
    rx: mpsc::Receiver<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || loop {
            let sent = if event::poll(tick_rate).unwrap_or(false) {
                match event::read() {
                    Ok(crossterm::event::Event::Key(key)) => match key.kind {
                        KeyEventKind::Press | KeyEventKind::Repeat => tx.send(Event::Key(key)),
                        KeyEventKind::Release => tx.send(Event::Release(key)),
                    },
                    Ok(crossterm::event::Event::Mouse(mouse)) => match mouse.kind {
                        MouseEventKind::Down(MouseButton::Left) => tx.send(Event::Click {
                            column: mouse.column,
                            row: mouse.row,
                        }),
                        _ => Ok(()),
                    },
                    _ => Ok(()),
                }
            } else {
                tx.send(Event::Tick)
            };
            if sent.is_err() {
                return;
            }
        });

        Self { rx }
    }

    pub fn next(&self) -> io::Result<Event> {
        self.rx
            .recv()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}
