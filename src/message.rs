use ratatui::crossterm::event::KeyEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CMDMode {
    GlobalFilter,
    ColumnFilter,
}

impl CMDMode {
    pub fn prompt(&self) -> &'static str {
        match self {
            CMDMode::GlobalFilter => "/",
            CMDMode::ColumnFilter => "filter: ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Quit,
    Exit,
    Help,
    MoveLeft,
    MoveRight,
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    GrowPage,
    ShrinkPage,
    ToggleSort,
    AppendSort,
    ClearSort,
    GlobalFilter,
    ColumnFilter,
    ResetFilters,
    HideColumn,
    ShowAllColumns,
    ExportFile,
    ExportClipboard,
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
q         quit
?         this help
Esc       close popup / cancel input
<- ->     select column
n p       next / previous page
g G       first / last page
+ -       grow / shrink page
s         cycle sort on column
S         add column as next sort key
c         clear sort
/         filter all columns
f         filter selected column
r         reset filters
h H       hide column / show all
e         export view to file
y         export view to clipboard";
