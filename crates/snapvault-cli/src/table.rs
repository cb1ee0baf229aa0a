use std::io::IsTerminal;

use comfy_table::{presets::NOTHING, Attribute, Cell, Table};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CliTableTheme {
    pub use_color: bool,
}

impl CliTableTheme {
    pub(crate) fn detect() -> Self {
        let is_tty = std::io::stdout().is_terminal();
        let no_color = std::env::var_os("NO_COLOR").is_some();
        resolve_table_theme(is_tty, no_color)
    }

    pub(crate) fn new_data_table(self, headers: &[&str]) -> Table {
        let mut table = Table::new();
        table.load_preset(NOTHING);
        let header_cells: Vec<Cell> = headers.iter().map(|h| self.header_cell(h)).collect();
        table.set_header(header_cells);
        table
    }

    fn header_cell(self, text: &str) -> Cell {
        let mut cell = Cell::new(text);
        if self.use_color {
            cell = cell.add_attribute(Attribute::Bold);
        }
        cell
    }
}

fn resolve_table_theme(is_tty: bool, no_color: bool) -> CliTableTheme {
    CliTableTheme {
        use_color: is_tty && !no_color,
    }
}

pub(crate) fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    if bytes >= GIB {
        format!("{:.2} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.2} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.2} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}
