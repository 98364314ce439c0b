use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table},
};

use crate::model::{Model, UIData};

pub const CMDLINE_HEIGHT: u16 = 1;
pub const COLUMN_SPACING: u16 = 1;

#[derive(Debug, Default)]
pub struct TableUI {}

impl TableUI {
    pub fn new() -> Self {
        Self {}
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let [table_area, cmdline_area] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(CMDLINE_HEIGHT)])
                .areas(frame.area());

        self.render_table(uidata, frame, table_area);
        self.render_cmdline(uidata, frame, cmdline_area);
        if uidata.show_popup {
            self.render_popup(uidata, frame);
        }
    }

    fn render_table(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let marker = if uidata.filter_active { " filtered" } else { "" };
        let title = Line::from(format!(
            " {} [{}/{}]{marker} ",
            uidata.name, uidata.filtered_count, uidata.total_count
        ))
        .bold();
        let nrows = uidata.table.first().map(|c| c.data.len()).unwrap_or(0);
        let footer = Line::from(vec![
            format!(" {} result(s) ", uidata.filtered_count).into(),
            format!(" rows {}-{} ", uidata.first_row + 1, uidata.first_row + nrows).into(),
            format!(" Page {} of {} ", uidata.page_index + 1, uidata.page_count)
                .blue()
                .bold(),
            " ? help ".into(),
        ]);
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(footer.centered())
            .border_set(border::THICK);

        if uidata.filtered_count == 0 {
            let empty = Paragraph::new("No results.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let header = Row::new(uidata.table.iter().enumerate().map(|(idx, c)| {
            let style = if idx == uidata.selected_column {
                Style::new().add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::new().add_modifier(Modifier::BOLD)
            };
            Cell::from(c.name.clone()).style(style)
        }));

        let rows = (0..nrows).map(|ridx| {
            Row::new(uidata.table.iter().map(|c| {
                let line = Line::from(c.data[ridx].clone());
                if c.align_right {
                    Cell::from(line.alignment(Alignment::Right))
                } else {
                    Cell::from(line)
                }
            }))
        });

        let widths = uidata
            .table
            .iter()
            .map(|c| Constraint::Length(c.width as u16));
        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(COLUMN_SPACING)
            .block(block);
        frame.render_widget(table, area);
    }

    fn render_cmdline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        if uidata.active_cmdinput {
            let prompt = uidata.cmd_mode.map(|m| m.prompt()).unwrap_or(":");
            let line = Line::from(vec![prompt.yellow(), uidata.cmdinput.input.clone().into()]);
            frame.render_widget(Paragraph::new(line), area);
            let x = area.x + (prompt.chars().count() + uidata.cmdinput.curser_pos) as u16;
            frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
        } else {
            let filter = if uidata.global_filter.is_empty() {
                String::new()
            } else {
                format!("/{}  ", uidata.global_filter)
            };
            let line = Line::from(vec![filter.yellow(), uidata.status_message.clone().into()]);
            frame.render_widget(Paragraph::new(line), area);
        }
    }

    fn render_popup(&self, uidata: &UIData, frame: &mut Frame) {
        let text = Text::from(uidata.popup_message.as_str());
        let height = text.height() as u16 + 2;
        let width = text.width() as u16 + 4;
        let area = centered(frame.area(), width, height);
        let popup = Paragraph::new(text).block(
            Block::bordered()
                .title(Line::from(" Help ").centered())
                .border_set(border::ROUNDED),
        );
        frame.render_widget(Clear, area);
        frame.render_widget(popup, area);
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
