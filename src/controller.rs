use std::time::Duration;
use tracing::trace;

use datatable::domain::{TableError, ViewerConfig};
use ratatui::crossterm::event::{self, Event, KeyCode, KeyModifiers};

use crate::message::Message;
use crate::model::Model;

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &ViewerConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, TableError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            match event::read()? {
                Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                    if model.raw_keyevents() {
                        return Ok(Some(Message::RawKey(key)));
                    }
                    return Ok(self.handle_key(key));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Esc, _) => Some(Message::Exit),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Left, _) => Some(Message::MoveLeft),
            (KeyCode::Right, _) => Some(Message::MoveRight),
            (KeyCode::Char('n'), _) | (KeyCode::PageDown, _) => Some(Message::NextPage),
            (KeyCode::Char('p'), _) | (KeyCode::PageUp, _) => Some(Message::PrevPage),
            (KeyCode::Char('g'), _) | (KeyCode::Home, _) => Some(Message::FirstPage),
            (KeyCode::Char('G'), _) | (KeyCode::End, _) => Some(Message::LastPage),
            (KeyCode::Char('+'), _) => Some(Message::GrowPage),
            (KeyCode::Char('-'), _) => Some(Message::ShrinkPage),
            (KeyCode::Char('s'), _) => Some(Message::ToggleSort),
            (KeyCode::Char('S'), _) => Some(Message::AppendSort),
            (KeyCode::Char('c'), _) => Some(Message::ClearSort),
            (KeyCode::Char('/'), _) => Some(Message::GlobalFilter),
            (KeyCode::Char('f'), _) => Some(Message::ColumnFilter),
            (KeyCode::Char('r'), _) => Some(Message::ResetFilters),
            (KeyCode::Char('h'), _) => Some(Message::HideColumn),
            (KeyCode::Char('H'), _) => Some(Message::ShowAllColumns),
            (KeyCode::Char('e'), _) => Some(Message::ExportFile),
            (KeyCode::Char('y'), _) => Some(Message::ExportClipboard),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
