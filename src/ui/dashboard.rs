use crate::engine::ParsingEngine;
use crate::highlight::Channel;
use crate::ui::app::App;
use crate::ui::viewport::{overlay, Cell};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, Wrap},
    Frame,
};

// Brandbook colors
const BRAND_DARK: Color = Color::Rgb(0x1F, 0x2F, 0x3C);
const BRAND_GREEN: Color = Color::Rgb(0x82, 0x9A, 0x68);
const BRAND_ORANGE: Color = Color::Rgb(0x9E, 0x68, 0x3C);
const BRAND_MUTED: Color = Color::Rgb(0x71, 0x65, 0x65);
const GRID_COLOR: Color = Color::Rgb(0x3A, 0x3A, 0x3A);

const HEADER_STYLE: Style = Style::new().fg(BRAND_DARK).add_modifier(Modifier::BOLD);
const COUNT_COLOR: Color = BRAND_GREEN;

const TYPES_ROWS: u16 = 10;

fn split(area: Rect) -> (Rect, Rect, Rect, Rect, Rect) {
    let rows = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(10),   // Main content
        Constraint::Length(3), // Footer
    ])
    .split(area);
    let columns = Layout::horizontal([
        Constraint::Percentage(65), // Viewport
        Constraint::Percentage(35), // Inspector + types
    ])
    .split(rows[1]);
    let side = Layout::vertical([Constraint::Min(5), Constraint::Length(TYPES_ROWS)])
        .split(columns[1]);
    (rows[0], columns[0], side[0], side[1], rows[2])
}

/// Screen cells the scene is drawn into.
#[must_use]
pub fn viewport_area(area: Rect) -> Rect {
    let (_, viewport, ..) = split(area);
    Block::default().borders(Borders::ALL).inner(viewport)
}

pub fn draw_dashboard<E: ParsingEngine + 'static>(frame: &mut Frame, app: &App<E>) {
    let (header, viewport, inspector, types, footer) = split(frame.area());

    draw_header(frame, header, app);
    draw_viewport(frame, viewport, app);
    draw_inspector(frame, inspector, app);
    draw_types(frame, types, app);
    draw_footer(
        frame,
        footer,
        " Mouse Hover/Select | ←→↑↓ Orbit | +/- Zoom | PgUp/PgDn Scroll | q Quit ",
    );
}

fn draw_header<E: ParsingEngine + 'static>(frame: &mut Frame, area: Rect, app: &App<E>) {
    let names: Vec<&str> = app
        .session
        .models()
        .map(|(_, model)| model.name.as_str())
        .collect();
    let lines: usize = app.session.models().map(|(_, m)| m.index.len()).sum();
    let title = format!(
        " IFC Picker | {} | {} models | {} lines ",
        names.join(", "),
        names.len(),
        lines
    );

    let header = Paragraph::new(title)
        .style(HEADER_STYLE)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

fn element_label<E: ParsingEngine + 'static>(app: &App<E>, channel: Channel) -> String {
    let element = match channel {
        Channel::Hover => app.session.hovered(),
        Channel::Select => app.session.selected(),
    };
    element.map_or_else(
        || "-".to_string(),
        |element| {
            let tag = app
                .session
                .index(element.model)
                .and_then(|index| index.get(element.id))
                .map_or("?", |entry| entry.type_tag.as_str());
            format!("{tag} {}", element.id)
        },
    )
}

fn draw_viewport<E: ParsingEngine + 'static>(frame: &mut Frame, area: Rect, app: &App<E>) {
    let title = format!(
        " Hover: {} | Selected: {} ",
        element_label(app, Channel::Hover),
        element_label(app, Channel::Select)
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BRAND_ORANGE));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    paint_cells(frame.buffer_mut(), inner, app);
}

fn paint_cells<E: ParsingEngine + 'static>(buf: &mut Buffer, inner: Rect, app: &App<E>) {
    let (width, height) = app.pick_map.size();
    let has_subsets = app.session.scene().subsets().next().is_some();

    for row in 0..inner.height.min(height) {
        for col in 0..inner.width.min(width) {
            let highlight = if has_subsets {
                overlay(&app.session, col, row)
            } else {
                None
            };
            let (symbol, color) = match (highlight, app.pick_map.get(col, row)) {
                (Some(color), _) => ("█", color),
                (None, Cell::Element { color, .. }) => ("█", color),
                (None, Cell::Grid) => ("·", GRID_COLOR),
                (None, Cell::Empty) => (" ", Color::Reset),
            };
            if let Some(cell) = buf.cell_mut((inner.x + col, inner.y + row)) {
                cell.set_symbol(symbol).set_fg(color);
            }
        }
    }
}

fn draw_inspector<E: ParsingEngine + 'static>(frame: &mut Frame, area: Rect, app: &App<E>) {
    let title = match app.session.inspection() {
        Some(inspection) => format!(" Inspector: {} ", inspection.element),
        None => " Inspector ".to_string(),
    };
    let text = app.inspector_text();
    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .scroll((app.inspector_scroll, 0))
        .block(Block::default().title(title).borders(Borders::ALL));

    frame.render_widget(paragraph, area);
}

fn draw_types<E: ParsingEngine + 'static>(frame: &mut Frame, area: Rect, app: &App<E>) {
    // Types of the selected element's model, or of the first loaded model
    let index = app
        .session
        .selected()
        .and_then(|element| app.session.index(element.model))
        .or_else(|| {
            app.session
                .models()
                .next()
                .map(|(_, model)| model.index.as_ref())
        });
    let summary = index.map(|index| index.type_summary()).unwrap_or_default();

    let visible_rows = usize::from(area.height.saturating_sub(3));
    let header = Row::new(vec!["Type", "Category", "Count"])
        .style(HEADER_STYLE)
        .height(1);
    let rows: Vec<Row> = summary
        .iter()
        .take(visible_rows)
        .map(|t| {
            Row::new(vec![
                Line::from(t.type_tag.clone()),
                Line::from(Span::styled(t.category, Style::default().fg(BRAND_MUTED))),
                Line::from(Span::styled(
                    t.count.to_string(),
                    Style::default().fg(COUNT_COLOR),
                )),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(50),
        Constraint::Percentage(30),
        Constraint::Percentage(20),
    ];
    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(format!(" Types ({}) ", summary.len()))
            .borders(Borders::ALL),
    );

    frame.render_widget(table, area);
}

fn draw_footer(frame: &mut Frame, area: Rect, help: &str) {
    let footer = Paragraph::new(help)
        .style(Style::default().fg(BRAND_MUTED))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}
