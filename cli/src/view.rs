use std::fmt::Write;
use sweeper_core::{Battlefield, CellKind, CellSnapshot, Notice, NoticeKind};

fn cell_glyph(cell: &CellSnapshot) -> char {
    match (cell.closed, cell.marked, cell.kind) {
        (true, true, _) => 'F',
        (true, false, _) => '#',
        (false, _, CellKind::Mine) => '*',
        (false, _, CellKind::Regular) if cell.danger_rate == 0 => '.',
        (false, _, CellKind::Regular) => char::from(b'0' + cell.danger_rate),
    }
}

/// Draws the board with row and column indices.
pub fn render_battlefield(battlefield: &Battlefield) -> String {
    let (_, columns) = battlefield.size();
    let mut out = String::from("   ");
    for column in 0..columns {
        let _ = write!(out, "{:>3}", column);
    }
    out.push('\n');

    for (row, cells) in battlefield.snapshot().iter().enumerate() {
        let _ = write!(out, "{:>3}", row);
        for cell in cells {
            let _ = write!(out, "{:>3}", cell_glyph(cell));
        }
        out.push('\n');
    }
    out
}

pub fn render_notice(notice: &Notice) -> String {
    let tag = match notice.kind {
        NoticeKind::Regular => "--",
        NoticeKind::Success => "**",
        NoticeKind::Danger => "!!",
    };
    format!("{tag} {} {tag}", notice.text)
}
