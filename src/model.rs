use ratatui::crossterm::event::KeyEvent;
use std::time::Instant;
use tracing::{info, trace, warn};

use datatable::domain::{TableError, ViewerConfig};
use datatable::export::{ClipboardSink, FileSink, Persist};
use datatable::sort::Direction;
use datatable::ViewController;

use crate::inputter::{InputResult, Inputter};
use crate::message::{CMDMode, HELP_TEXT, Message};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    POPUP,
    CMDINPUT,
}

/// A rendered column of the current page.
#[derive(Debug, Clone)]
pub struct ColumnView {
    pub name: String,
    pub width: usize,
    pub align_right: bool,
    pub data: Vec<String>,
}

/// Everything the UI needs to draw one frame.
#[derive(Debug, Clone, Default)]
pub struct UIData {
    pub name: String,
    pub table: Vec<ColumnView>,
    pub selected_column: usize,
    pub filtered_count: usize,
    pub total_count: usize,
    pub page_index: usize,
    pub page_count: usize,
    pub first_row: usize,
    pub global_filter: String,
    pub filter_active: bool,
    pub show_popup: bool,
    pub popup_message: String,
    pub cmdinput: InputResult,
    pub cmd_mode: Option<CMDMode>,
    pub active_cmdinput: bool,
    pub status_message: String,
}

pub struct Model {
    config: ViewerConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    table: ViewController,
    selected_column: usize,
    uidata: UIData,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(config: &ViewerConfig, table: ViewController) -> Self {
        let mut model = Self {
            config: config.clone(),
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            table,
            selected_column: 0,
            uidata: UIData::default(),
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        };
        let count = model.table.records().len();
        model.set_status_message(format!("Loaded {count} records"));
        model
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::CMDINPUT
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Message) -> Result<(), TableError> {
        trace!("Update: Modus {:?}, Message {:?}", self.modus, message);
        match self.modus {
            Modus::TABLE => match message {
                Message::Quit => self.quit(),
                Message::Help => self.show_help(),
                Message::MoveLeft => self.move_selection(-1),
                Message::MoveRight => self.move_selection(1),
                Message::NextPage => self.table.next_page(),
                Message::PrevPage => self.table.prev_page(),
                Message::FirstPage => self.table.first_page(),
                Message::LastPage => self.table.last_page(),
                Message::GrowPage => self.resize_page(true),
                Message::ShrinkPage => self.resize_page(false),
                Message::ToggleSort => self.toggle_sort(false),
                Message::AppendSort => self.toggle_sort(true),
                Message::ClearSort => self.table.clear_sort(),
                Message::GlobalFilter => self.enter_cmd_mode(CMDMode::GlobalFilter),
                Message::ColumnFilter => self.enter_cmd_mode(CMDMode::ColumnFilter),
                Message::ResetFilters => {
                    self.table.reset_filters();
                    self.set_status_message("Filters cleared");
                }
                Message::HideColumn => self.hide_selected_column(),
                Message::ShowAllColumns => self.show_all_columns(),
                Message::ExportFile => {
                    let mut sink = FileSink::new(self.config.export_dir.clone());
                    self.export(&mut sink);
                }
                Message::ExportClipboard => match ClipboardSink::new() {
                    Ok(mut sink) => self.export(&mut sink),
                    Err(e) => {
                        warn!("Clipboard unavailable: {e}");
                        self.set_status_message(format!("Clipboard unavailable: {e}"));
                    }
                },
                _ => (),
            },
            Modus::POPUP => match message {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.exit_popup(),
                _ => (),
            },
            Modus::CMDINPUT => {
                if let Message::RawKey(key) = message {
                    self.raw_input(key)
                }
            }
        }
        self.update_uidata();
        Ok(())
    }

    fn selected_column_id(&self) -> Option<String> {
        self.table
            .visible_columns()
            .nth(self.selected_column)
            .map(|c| c.id.clone())
    }

    fn move_selection(&mut self, step: isize) {
        let visible = self.table.visible_columns().count();
        if visible == 0 {
            return;
        }
        self.selected_column = self
            .selected_column
            .saturating_add_signed(step)
            .min(visible - 1);
    }

    fn resize_page(&mut self, grow: bool) {
        let size = self.table.state().pagination.page_size();
        let next = if grow { size + 5 } else { size.saturating_sub(5).max(1) };
        self.table.set_page_size(next);
        self.set_status_message(format!("Page size {next}"));
    }

    fn toggle_sort(&mut self, append: bool) {
        let Some(id) = self.selected_column_id() else {
            return;
        };
        if append {
            let direction = match self.table.sort_direction(&id) {
                Some(Direction::Ascending) => Direction::Descending,
                _ => Direction::Ascending,
            };
            self.table.append_sort(&id, direction);
        } else {
            self.table.toggle_sort(&id);
        }
        match self.table.sort_direction(&id) {
            Some(d) => self.set_status_message(format!("Sorted by {id} {}", d.arrow())),
            None => self.set_status_message("Sort cleared"),
        }
    }

    fn hide_selected_column(&mut self) {
        let visible = self.table.visible_columns().count();
        if visible <= 1 {
            self.set_status_message("Cannot hide the last column");
            return;
        }
        if let Some(id) = self.selected_column_id() {
            self.table.set_column_visibility(&id, false);
            self.selected_column = self.selected_column.min(visible - 2);
            self.set_status_message(format!("Hid column {id}"));
        }
    }

    fn show_all_columns(&mut self) {
        let ids: Vec<String> = self.table.columns().iter().map(|c| c.id.clone()).collect();
        for id in ids {
            self.table.set_column_visibility(&id, true);
        }
    }

    fn export(&mut self, sink: &mut dyn Persist) {
        match self.table.export_current_view(&self.config.title, sink) {
            Ok(Some(outcome)) => self.set_status_message(format!(
                "Exported {} rows to {}",
                outcome.rows, outcome.filename
            )),
            Ok(None) => self.set_status_message("Nothing to export"),
            Err(e) => {
                warn!("Export failed: {e}");
                self.set_status_message(format!("Export failed: {e}"));
            }
        }
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.uidata.popup_message = HELP_TEXT.to_string();
    }

    fn exit_popup(&mut self) {
        trace!("Close popup ...");
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        trace!("Entering command mode {mode:?}");
        let current = match mode {
            CMDMode::GlobalFilter => self.table.global_filter().to_string(),
            CMDMode::ColumnFilter => self
                .selected_column_id()
                .and_then(|id| self.table.column_filter(&id).map(str::to_string))
                .unwrap_or_default(),
        };
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);
        self.input.start(&current);
        self.last_input = self.input.get();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        self.last_input = self.input.read(key);
        if self.last_input.finished {
            self.handle_cmd_input();
        }
    }

    fn handle_cmd_input(&mut self) {
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;
        let cmd_mode = self.cmd_mode.take();
        if self.last_input.canceled {
            return;
        }

        let query = self.last_input.input.clone();
        match cmd_mode {
            Some(CMDMode::GlobalFilter) => {
                self.table.set_global_filter(&query);
                info!("Global filter set to {query:?}");
            }
            Some(CMDMode::ColumnFilter) => {
                if let Some(id) = self.selected_column_id() {
                    self.table.set_column_filter(&id, &query);
                    info!("Filter on {id} set to {query:?}");
                }
            }
            None => info!("Cmd mode is none!"),
        }
        let count = self.table.view().filtered_count;
        self.set_status_message(format!("Found {count} results"));
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    fn update_uidata(&mut self) {
        let view = self.table.view();
        let rows = self.table.current_page_rows();
        let max_width = self.config.max_column_width;

        let table = self
            .table
            .visible_columns()
            .map(|column| {
                let arrow = self
                    .table
                    .sort_direction(&column.id)
                    .map(|d| format!(" {}", d.arrow()))
                    .unwrap_or_default();
                let name = format!("{}{arrow}", column.header);
                let data: Vec<String> = rows
                    .iter()
                    .map(|r| column.render(r).replace('\n', " ↵ "))
                    .collect();
                let width = data
                    .iter()
                    .map(|s| s.chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
                    .min(max_width);
                ColumnView {
                    name,
                    width,
                    align_right: column.align_right,
                    data,
                }
            })
            .collect();

        // Status messages fade after a few seconds
        let status_message = if self.last_status_message_update.elapsed().as_secs() < 5 {
            self.status_message.clone()
        } else {
            String::new()
        };

        self.uidata = UIData {
            name: self.config.title.clone(),
            table,
            selected_column: self.selected_column,
            filtered_count: view.filtered_count,
            total_count: self.table.records().len(),
            page_index: view.page_index,
            page_count: view.page_count,
            first_row: view.page_range.start,
            global_filter: self.table.global_filter().to_string(),
            filter_active: self.table.state().filters.is_active(),
            show_popup: self.modus == Modus::POPUP,
            popup_message: HELP_TEXT.to_string(),
            cmdinput: self.last_input.clone(),
            cmd_mode: self.cmd_mode,
            active_cmdinput: self.modus == Modus::CMDINPUT,
            status_message,
        };
    }

    /// Refreshes the frame data without a message, e.g. on startup.
    pub fn refresh(&mut self) {
        self.update_uidata();
    }
}
