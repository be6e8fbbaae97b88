use ratatui::prelude::*;
use ratatui::widgets::*;

use std::collections::HashMap;

use crate::app::App;
use crate::game::{self, AlienPhase, DodgeGame};

pub fn render(frame: &mut Frame, app: &mut App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(120, 160, 255)))
        .title(" 🚀 Astro Dodge ")
        .title_style(
            Style::default()
                .fg(Color::Rgb(150, 190, 255))
                .add_modifier(Modifier::BOLD),
        );
    let inner = block.inner(frame.area());
    frame.render_widget(block, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Status bar
            Constraint::Min(8),    // Playfield
            Constraint::Length(1), // Help
        ])
        .split(inner);

    render_status(frame, &app.game, chunks[0]);

    let fw = chunks[1].width as usize;
    let fh = chunks[1].height as usize;
    if fw > 0 && fh > 0 {
        let lines = render_field(&app.game, fw, fh);
        frame.render_widget(Paragraph::new(lines), chunks[1]);
    }

    let help = Paragraph::new(Line::from(vec![
        Span::styled(" ←→ Move ", Style::default().fg(Color::DarkGray)),
        Span::styled("│ ", Style::default().fg(Color::Rgb(60, 60, 60))),
        Span::styled("R Restart ", Style::default().fg(Color::DarkGray)),
        Span::styled("│ ", Style::default().fg(Color::Rgb(60, 60, 60))),
        Span::styled("Q Quit", Style::default().fg(Color::DarkGray)),
    ]));
    frame.render_widget(help, chunks[2]);

    if app.game.game_over {
        render_game_over(frame, frame.area(), app.game.score);
    }
}

fn render_status(frame: &mut Frame, game: &DodgeGame, area: Rect) {
    let alien_status = match game.alien.phase {
        AlienPhase::Dormant => ("quiet", Color::DarkGray),
        AlienPhase::Entering => ("INCOMING", Color::Rgb(255, 120, 120)),
        AlienPhase::Active => ("attacking", Color::Rgb(255, 80, 80)),
    };
    let status = Line::from(vec![
        Span::styled(" ☄ ", Style::default()),
        Span::styled(
            format!("Score: {} ", game.score),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("Level: {} ", game.difficulty),
            Style::default().fg(Color::Green),
        ),
        Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
        Span::styled("Alien: ", Style::default().fg(Color::Gray)),
        Span::styled(
            alien_status.0,
            Style::default().fg(alien_status.1).add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(Paragraph::new(status), area);
}

/// Modal overlay with the final tally and the restart control.
fn render_game_over(frame: &mut Frame, area: Rect, score: u32) {
    let overlay_w = 40u16.min(area.width.saturating_sub(4));
    let overlay_h = 9u16.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(overlay_w)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_h)) / 2;
    let overlay_area = Rect::new(x, y, overlay_w, overlay_h);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Rgb(255, 90, 90)))
        .title(" 💀 GAME OVER ")
        .title_style(
            Style::default()
                .fg(Color::Rgb(255, 120, 120))
                .add_modifier(Modifier::BOLD),
        )
        .style(Style::default().bg(Color::Rgb(15, 15, 25)));
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Asteroids avoided: ", Style::default().fg(Color::Rgb(180, 180, 200))),
            Span::styled(
                format!("{score}"),
                Style::default().fg(Color::Rgb(255, 215, 0)).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Enter", Style::default().fg(Color::Rgb(80, 200, 255)).add_modifier(Modifier::BOLD)),
            Span::styled(" play again  ", Style::default().fg(Color::Rgb(100, 100, 130))),
            Span::styled("Q", Style::default().fg(Color::Rgb(80, 200, 255)).add_modifier(Modifier::BOLD)),
            Span::styled(" quit", Style::default().fg(Color::Rgb(100, 100, 130))),
        ]),
    ];
    let p = Paragraph::new(lines).style(Style::default().bg(Color::Rgb(15, 15, 25)));
    frame.render_widget(p, inner);
}

// ── Braille playfield ──────────────────────────────────────────────────

fn braille_bit(sub_x: usize, sub_y: usize) -> u8 {
    match (sub_x, sub_y) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0,
    }
}

fn set_dot(map: &mut HashMap<(usize, usize), u8>, bx: i32, by: i32, bw: i32, bh: i32) {
    if bx < 0 || by < 0 || bx >= bw || by >= bh {
        return;
    }
    let cx = bx as usize / 2;
    let cy = by as usize / 4;
    let sx = bx as usize % 2;
    let sy = by as usize % 4;
    *map.entry((cx, cy)).or_insert(0) |= braille_bit(sx, sy);
}

fn write_layer(
    grid: &mut [Vec<(char, Style)>],
    map: &HashMap<(usize, usize), u8>,
    w: usize,
    h: usize,
    color: Color,
    bg: Color,
    bold: bool,
) {
    for (&(cx, cy), &bits) in map {
        if cx < w && cy < h && bits != 0 {
            let ch = char::from_u32(0x2800 + bits as u32).unwrap_or(' ');
            let mut style = Style::default().fg(color).bg(bg);
            if bold {
                style = style.add_modifier(Modifier::BOLD);
            }
            grid[cy][cx] = (ch, style);
        }
    }
}

/// The five asteroid looks, as braille-dot offsets around the center.
const ASTEROID_SHAPES: [&[(i32, i32)]; game::ASTEROID_VARIANTS] = [
    // Round boulder
    &[
        (-1, -2), (0, -2), (1, -2),
        (-2, -1), (-1, -1), (0, -1), (1, -1), (2, -1),
        (-2, 0), (-1, 0), (0, 0), (1, 0), (2, 0),
        (-2, 1), (-1, 1), (0, 1), (1, 1), (2, 1),
        (-1, 2), (0, 2), (1, 2),
    ],
    // Lumpy, bitten on the right
    &[
        (-1, -2), (0, -2),
        (-2, -1), (-1, -1), (0, -1), (1, -1),
        (-3, 0), (-2, 0), (-1, 0), (0, 0), (1, 0), (2, 0),
        (-2, 1), (-1, 1), (0, 1), (1, 1),
        (-1, 2), (0, 2), (1, 2),
    ],
    // Wide slab
    &[
        (-2, -1), (-1, -1), (0, -1), (1, -1), (2, -1), (3, -1),
        (-3, 0), (-2, 0), (-1, 0), (0, 0), (1, 0), (2, 0), (3, 0),
        (-3, 1), (-2, 1), (-1, 1), (0, 1), (1, 1), (2, 1),
    ],
    // Tall shard
    &[
        (0, -3), (1, -3),
        (-1, -2), (0, -2), (1, -2),
        (-1, -1), (0, -1), (1, -1),
        (-1, 0), (0, 0), (1, 0),
        (-1, 1), (0, 1),
        (0, 2),
    ],
    // Cratered ring
    &[
        (-1, -2), (0, -2), (1, -2),
        (-2, -1), (2, -1),
        (-2, 0), (2, 0),
        (-2, 1), (2, 1),
        (-1, 2), (0, 2), (1, 2),
    ],
];

fn render_asteroid(
    map: &mut HashMap<(usize, usize), u8>,
    cx: i32,
    cy: i32,
    variant: usize,
    angle_deg: f32,
    bw: i32,
    bh: i32,
) {
    let rad = angle_deg.to_radians();
    let (sin, cos) = rad.sin_cos();
    for &(dx, dy) in ASTEROID_SHAPES[variant % ASTEROID_SHAPES.len()] {
        let rx = dx as f32 * cos - dy as f32 * sin;
        let ry = dx as f32 * sin + dy as f32 * cos;
        set_dot(map, cx + rx.round() as i32, cy + ry.round() as i32, bw, bh);
    }
}

fn render_player_ship(map: &mut HashMap<(usize, usize), u8>, cx: i32, cy: i32, bw: i32, bh: i32) {
    let pixels: &[(i32, i32)] = &[
        (0, -3),
        (-1, -2), (0, -2), (1, -2),
        (-1, -1), (0, -1), (1, -1),
        (-2, 0), (-1, 0), (0, 0), (1, 0), (2, 0),
        (-3, 1), (-2, 1), (-1, 1), (0, 1), (1, 1), (2, 1), (3, 1),
        (-3, 2), (-1, 2), (1, 2), (3, 2),
    ];
    for &(dx, dy) in pixels {
        set_dot(map, cx + dx, cy + dy, bw, bh);
    }
}

fn render_alien_ship(map: &mut HashMap<(usize, usize), u8>, cx: i32, cy: i32, bw: i32, bh: i32) {
    let pixels: &[(i32, i32)] = &[
        (-1, -2), (0, -2), (1, -2),
        (-2, -1), (-1, -1), (0, -1), (1, -1), (2, -1),
        (-4, 0), (-3, 0), (-2, 0), (-1, 0), (0, 0), (1, 0), (2, 0), (3, 0), (4, 0),
        (-3, 1), (-1, 1), (1, 1), (3, 1),
    ];
    for &(dx, dy) in pixels {
        set_dot(map, cx + dx, cy + dy, bw, bh);
    }
}

fn render_field(game: &DodgeGame, width: usize, height: usize) -> Vec<Line<'static>> {
    let w = width;
    let h = height;
    let bw = (w * 2) as i32;
    let bh = (h * 4) as i32;
    let bsx = bw as f32 / game::WORLD_W;
    let bsy = bh as f32 / game::WORLD_H;

    let bg = Color::Rgb(0, 0, 8);
    let mut grid: Vec<Vec<(char, Style)>> = vec![vec![(' ', Style::default().bg(bg)); w]; h];

    // Static starfield
    for y in 0..h {
        for x in 0..w {
            let hash = (x.wrapping_mul(31) + y.wrapping_mul(17)) % 43;
            if hash == 0 {
                grid[y][x] = ('·', Style::default().fg(Color::Rgb(70, 70, 100)).bg(bg));
            } else if hash == 21 {
                grid[y][x] = ('.', Style::default().fg(Color::Rgb(45, 45, 70)).bg(bg));
            }
        }
    }

    // Asteroid
    {
        let mut amap: HashMap<(usize, usize), u8> = HashMap::new();
        let cx = (game.asteroid.x * bsx) as i32;
        let cy = (game.asteroid.y * bsy) as i32;
        render_asteroid(&mut amap, cx, cy, game.asteroid.variant, game.asteroid.angle, bw, bh);
        let color = match game.asteroid.variant {
            0 => Color::Rgb(190, 160, 130),
            1 => Color::Rgb(170, 140, 110),
            2 => Color::Rgb(150, 150, 160),
            3 => Color::Rgb(200, 180, 150),
            _ => Color::Rgb(160, 130, 100),
        };
        write_layer(&mut grid, &amap, w, h, color, bg, false);
    }

    // Alien ship
    if game.alien.phase != AlienPhase::Dormant {
        let mut amap: HashMap<(usize, usize), u8> = HashMap::new();
        let cx = (game.alien.x * bsx) as i32;
        let cy = (game.alien.y * bsy) as i32;
        render_alien_ship(&mut amap, cx, cy, bw, bh);
        write_layer(&mut grid, &amap, w, h, Color::Rgb(180, 100, 255), bg, false);
    }

    // Laser bolt, drawn along its heading
    if game.laser.visible {
        let mut lmap: HashMap<(usize, usize), u8> = HashMap::new();
        let lx = (game.laser.x * bsx) as i32;
        let ly = (game.laser.y * bsy) as i32;
        let (sin, cos) = game.laser.angle.sin_cos();
        for i in 0..4 {
            let bx = lx + (cos * i as f32).round() as i32;
            let by = ly + (sin * i as f32).round() as i32;
            set_dot(&mut lmap, bx, by, bw, bh);
        }
        write_layer(&mut grid, &lmap, w, h, Color::Rgb(80, 255, 80), bg, true);
    }

    // Player ship
    if !game.game_over {
        let mut pmap: HashMap<(usize, usize), u8> = HashMap::new();
        let px = (game.player.x * bsx) as i32;
        let py = (game::PLAYER_Y * bsy) as i32;
        render_player_ship(&mut pmap, px, py, bw, bh);
        write_layer(&mut grid, &pmap, w, h, Color::Rgb(120, 200, 255), bg, true);
    }

    grid.into_iter()
        .map(|row| {
            let spans: Vec<Span<'static>> = row
                .into_iter()
                .map(|(ch, style)| Span::styled(String::from(ch), style))
                .collect();
            Line::from(spans)
        })
        .collect()
}
