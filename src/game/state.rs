//! Puzzle state machine
//!
//! `BlockFall` owns the grid, the tray of draggable shapes, the scene
//! tree, score/combo/milestone state, and the deferred-task queue. All
//! mutation happens synchronously inside `update`/`handle_touch`;
//! deferred work (batch respawn, delayed node teardown) is queued and
//! drained at a fixed point in `update`, never from timer callbacks.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::color::Color;
use crate::consts::*;
use crate::game::grid::Grid;
use crate::game::shapes::{self, PALETTE, SHAPES, Shape};
use crate::render::RenderContext;
use crate::scene::{Action, Easing, Node, NodeId, ParticleEmitter, Scene, Size};
use crate::services::{ImpactStyle, NotifyKind, Services};
use crate::settings::Settings;

/// Top-level game mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Entry screen; first tap starts play
    Menu,
    Playing,
    GameOver,
}

/// Touch phases delivered by the host input layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Began,
    Moved,
    Ended,
}

/// One of the three currently offered tray shapes
struct BlockSlot {
    shape: Shape,
    color: Color,
    node: NodeId,
    /// Tray position the shape bounces back to on an illegal drop
    origin: Vec2,
    placed: bool,
}

struct PlacedBlock {
    node: NodeId,
    x: usize,
    y: usize,
}

/// Score label drifting upward while fading, tracked outside the
/// action system so progress drives both position and alpha together
struct FloatingLabel {
    node: NodeId,
    start_y: f32,
    elapsed: f32,
    duration: f32,
}

#[derive(Debug, Clone, Copy)]
enum Task {
    SpawnBlocks,
    RemoveNode(NodeId),
    HideNode(NodeId),
    ShowGameOverUi,
}

struct Deferred {
    remaining_ms: f32,
    task: Task,
}

/// Milestone celebration phrases, one per threshold
const MILESTONE_PHRASES: [&str; 7] = [
    "NICE!",
    "GREAT!",
    "AMAZING!",
    "INCREDIBLE!",
    "LEGENDARY!",
    "GODLIKE!",
    "UNSTOPPABLE!",
];

/// The block-placement puzzle game
pub struct BlockFall {
    width: f32,
    height: f32,
    grid_origin: Vec2,

    grid: Grid,
    mode: Mode,
    score: u64,
    high_score: u64,
    combo_count: u32,
    lines_cleared: u32,
    last_milestone: Option<usize>,

    slots: Vec<BlockSlot>,
    selected: Option<usize>,
    drag_offset: Vec2,
    shadow: Option<NodeId>,
    ghost_cells: Vec<NodeId>,
    placed_blocks: Vec<PlacedBlock>,
    floating_labels: Vec<FloatingLabel>,

    scene: Scene,
    emitter: NodeId,
    score_label: NodeId,
    high_score_label: NodeId,
    lines_label: NodeId,
    combo_label: NodeId,
    grid_glow: NodeId,
    game_over_label: NodeId,
    restart_label: NodeId,
    milestone_label: NodeId,
    milestone_glow: NodeId,
    start_label: NodeId,
    stats_label: Option<NodeId>,

    shake_offset: Vec2,
    shake_intensity: f32,
    shake_duration: f32,
    shake_elapsed: f32,

    tasks: Vec<Deferred>,
    ambient_ms: f32,

    rng: Pcg32,
    settings: Settings,
    services: Services,
}

impl BlockFall {
    pub fn new(seed: u64, settings: Settings, services: Services) -> Self {
        let width = SCREEN_WIDTH;
        let height = SCREEN_HEIGHT;
        let grid_px = GRID_SIZE as f32 * CELL_SIZE;
        let grid_origin = Vec2::new((width - grid_px) / 2.0, SAFE_TOP + 280.0);

        let mut scene = Scene::new(Color::new(0.08, 0.08, 0.12));

        // Background gradient layers
        let layer_colors = [
            Color::new(0.05, 0.05, 0.10),
            Color::new(0.08, 0.08, 0.14),
            Color::new(0.06, 0.06, 0.11),
        ];
        let layer_h = height / 3.0;
        for (i, &color) in layer_colors.iter().enumerate() {
            let mut bg = Node::sprite(color, Size::new(width, layer_h + 10.0));
            bg.position = Vec2::new(width / 2.0, layer_h * i as f32 + layer_h / 2.0);
            bg.z_position = -10.0;
            scene.add_node(bg);
        }

        // HUD labels
        let mut title = Node::label("BLOCKFALL", 72.0, Color::WHITE);
        title.position = Vec2::new(width / 2.0, SAFE_TOP + 60.0);
        scene.add_node(title);

        let mut score = Node::label("0", 120.0, Color::WHITE);
        score.position = Vec2::new(width / 2.0, SAFE_TOP + 170.0);
        let score_label = scene.add_node(score);

        let high_score = services.scores.load().unwrap_or(0);
        let mut best = Node::label(format!("BEST: {}", high_score), 36.0, Color::GRAY);
        best.position = Vec2::new(width / 2.0, SAFE_TOP + 240.0);
        let high_score_label = scene.add_node(best);

        let mut lines = Node::label("LINES: 0", 32.0, Color::new(0.5, 0.7, 1.0));
        lines.position = Vec2::new(width - 120.0, SAFE_TOP + 60.0);
        let lines_label = scene.add_node(lines);

        let mut combo = Node::label("", 48.0, Color::YELLOW);
        combo.position = Vec2::new(width / 2.0, SAFE_TOP + 210.0);
        combo.hidden = true;
        combo.z_position = 20.0;
        let combo_label = scene.add_node(combo);

        let mut over = Node::label("GAME OVER", 96.0, Color::RED);
        over.position = Vec2::new(width / 2.0, height / 2.0);
        over.hidden = true;
        over.z_position = 100.0;
        let game_over_label = scene.add_node(over);

        let mut tap_restart = Node::label("TAP TO RESTART", 48.0, Color::WHITE.with_opacity(0.7));
        tap_restart.position = Vec2::new(width / 2.0, height / 2.0 + 100.0);
        tap_restart.hidden = true;
        tap_restart.z_position = 100.0;
        let restart_label = scene.add_node(tap_restart);

        let mut milestone = Node::label("", 72.0, Color::GOLD);
        milestone.position = Vec2::new(width / 2.0, height / 2.0 - 50.0);
        milestone.hidden = true;
        milestone.z_position = 95.0;
        let milestone_label = scene.add_node(milestone);

        let mut flash = Node::sprite(Color::GOLD.with_opacity(0.25), Size::new(width, height));
        flash.position = Vec2::new(width / 2.0, height / 2.0);
        flash.z_position = 90.0;
        flash.alpha = 0.0;
        let milestone_glow = scene.add_node(flash);

        let mut start = Node::label("TAP TO START", 48.0, Color::WHITE.with_opacity(0.7));
        start.position = Vec2::new(width / 2.0, height / 2.0);
        start.z_position = 100.0;
        let start_label = scene.add_node(start);

        // Grid glow (combo feedback), backdrop, and cell wells
        let mut glow = Node::rounded_sprite(
            Color::YELLOW.with_opacity(0.0),
            Size::new(grid_px + GRID_PADDING * 2.0 + 20.0, grid_px + GRID_PADDING * 2.0 + 20.0),
            32.0,
        );
        glow.position = grid_origin + Vec2::splat(grid_px / 2.0);
        glow.z_position = -1.0;
        let grid_glow = scene.add_node(glow);

        let mut backdrop = Node::rounded_sprite(
            Color::new(0.12, 0.12, 0.18),
            Size::new(grid_px + GRID_PADDING * 2.0, grid_px + GRID_PADDING * 2.0),
            24.0,
        );
        backdrop.position = grid_origin + Vec2::splat(grid_px / 2.0);
        backdrop.z_position = 0.0;
        scene.add_node(backdrop);

        for y in 0..GRID_SIZE {
            for x in 0..GRID_SIZE {
                let mut well = Node::rounded_sprite(
                    Color::new(0.15, 0.15, 0.22),
                    Size::new(CELL_SIZE - 6.0, CELL_SIZE - 6.0),
                    12.0,
                );
                well.position = grid_origin
                    + Vec2::new(
                        x as f32 * CELL_SIZE + CELL_SIZE / 2.0,
                        y as f32 * CELL_SIZE + CELL_SIZE / 2.0,
                    );
                well.z_position = 1.0;
                scene.add_node(well);
            }
        }

        // Celebration particle emitter
        let mut emitter = ParticleEmitter::new(seed ^ 0x9E37_79B9_7F4A_7C15);
        emitter.particle_color = Color::YELLOW;
        emitter.particle_size = 18.0;
        emitter.particle_lifetime = 600.0;
        emitter.particle_speed = 400.0;
        emitter.particle_speed_range = 200.0;
        emitter.max_particles = settings.max_particles();
        let mut emitter_node = Node::emitter(emitter);
        emitter_node.z_position = 80.0;
        let emitter = scene.add_node(emitter_node);

        let mut game = Self {
            width,
            height,
            grid_origin,
            grid: Grid::new(GRID_SIZE, GRID_SIZE),
            mode: Mode::Menu,
            score: 0,
            high_score,
            combo_count: 0,
            lines_cleared: 0,
            last_milestone: None,
            slots: Vec::new(),
            selected: None,
            drag_offset: Vec2::ZERO,
            shadow: None,
            ghost_cells: Vec::new(),
            placed_blocks: Vec::new(),
            floating_labels: Vec::new(),
            scene,
            emitter,
            score_label,
            high_score_label,
            lines_label,
            combo_label,
            grid_glow,
            game_over_label,
            restart_label,
            milestone_label,
            milestone_glow,
            start_label,
            stats_label: None,
            shake_offset: Vec2::ZERO,
            shake_intensity: 0.0,
            shake_duration: 0.0,
            shake_elapsed: 0.0,
            tasks: Vec::new(),
            ambient_ms: 0.0,
            rng: Pcg32::seed_from_u64(seed),
            settings,
            services,
        };
        game.spawn_new_blocks();
        log::info!("Blockfall initialized (seed {})", seed);
        game
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    pub fn combo(&self) -> u32 {
        self.combo_count
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Live scene object count, for the host's debug HUD
    pub fn object_count(&self) -> usize {
        self.scene.node_count()
    }

    /// Screen-space center of a grid cell
    pub fn cell_center(&self, x: usize, y: usize) -> Vec2 {
        self.grid_origin
            + Vec2::new(
                x as f32 * CELL_SIZE + CELL_SIZE / 2.0,
                y as f32 * CELL_SIZE + CELL_SIZE / 2.0,
            )
    }

    /// Tray position of an offered slot, if it exists
    pub fn slot_origin(&self, index: usize) -> Option<Vec2> {
        self.slots.get(index).map(|s| s.origin)
    }

    fn screen_to_grid(&self, point: Vec2) -> (i32, i32) {
        let local = point - self.grid_origin;
        ((local.x / CELL_SIZE).floor() as i32, (local.y / CELL_SIZE).floor() as i32)
    }

    /// Build the draggable container node for a shape at the given scale
    fn make_block_node(&mut self, shape: Shape, color: Color, scale: f32) -> NodeId {
        let (w, h, min_x, min_y) = shapes::bounds(shape);
        let cell = CELL_SIZE * scale;
        let offset = Vec2::new(
            -(w as f32) * cell / 2.0 + cell / 2.0,
            -(h as f32) * cell / 2.0 + cell / 2.0,
        );

        let container = self.scene.insert(Node::group());
        for &(dx, dy) in shape {
            let mut block = Node::rounded_sprite(
                color,
                Size::new((CELL_SIZE - 8.0) * scale, (CELL_SIZE - 8.0) * scale),
                10.0 * scale,
            );
            block.position =
                offset + Vec2::new((dx - min_x) as f32 * cell, (dy - min_y) as f32 * cell);
            let block_id = self.scene.add_child_node(container, block);

            let mut highlight = Node::rounded_sprite(
                Color::WHITE.with_opacity(0.2),
                Size::new((CELL_SIZE - 24.0) * scale, (CELL_SIZE - 24.0) * scale),
                6.0 * scale,
            );
            highlight.position = Vec2::new(0.0, -4.0 * scale);
            self.scene.add_child_node(block_id, highlight);
        }
        container
    }

    /// Dark translucent copy of a shape, offset under the dragged block
    fn make_shadow_node(&mut self, shape: Shape) -> NodeId {
        let (w, h, min_x, min_y) = shapes::bounds(shape);
        let offset = Vec2::new(
            -(w as f32) * CELL_SIZE / 2.0 + CELL_SIZE / 2.0,
            -(h as f32) * CELL_SIZE / 2.0 + CELL_SIZE / 2.0,
        );
        let container = self.scene.insert(Node::group());
        for &(dx, dy) in shape {
            let mut block = Node::rounded_sprite(
                Color::BLACK.with_opacity(0.3),
                Size::new(CELL_SIZE - 8.0, CELL_SIZE - 8.0),
                10.0,
            );
            block.position = offset
                + Vec2::new((dx - min_x) as f32 * CELL_SIZE, (dy - min_y) as f32 * CELL_SIZE);
            self.scene.add_child_node(container, block);
        }
        container
    }

    /// Discard the old batch and offer three fresh random shapes
    fn spawn_new_blocks(&mut self) {
        for slot in std::mem::take(&mut self.slots) {
            self.scene.remove_node(slot.node);
        }

        let grid_px = GRID_SIZE as f32 * CELL_SIZE;
        let slot_y = self.grid_origin.y + grid_px + 180.0;
        let spacing = self.width / (TRAY_SLOTS as f32 + 1.0);

        for i in 0..TRAY_SLOTS {
            let shape = SHAPES[self.rng.random_range(0..SHAPES.len())];
            let color = PALETTE[self.rng.random_range(0..PALETTE.len())];
            let origin = Vec2::new(spacing * (i as f32 + 1.0), slot_y);

            let node = self.make_block_node(shape, color, TRAY_SCALE);
            self.scene[node].position = origin;
            self.scene[node].z_position = 10.0;
            let root = self.scene.root();
            self.scene.add_child(root, node);

            self.slots.push(BlockSlot { shape, color, node, origin, placed: false });
        }
    }

    fn clear_ghost_cells(&mut self) {
        for ghost in std::mem::take(&mut self.ghost_cells) {
            self.scene.remove_node(ghost);
        }
    }

    /// Preview the drop target at ~30% opacity; nothing is shown for an
    /// illegal position
    fn update_ghost_preview(&mut self, slot_index: usize, gx: i32, gy: i32) {
        self.clear_ghost_cells();
        let (shape, color) = {
            let slot = &self.slots[slot_index];
            (slot.shape, slot.color)
        };
        if !self.grid.can_place(shape, gx, gy) {
            return;
        }
        for &(dx, dy) in shape {
            let x = (gx + dx as i32) as usize;
            let y = (gy + dy as i32) as usize;
            let mut ghost = Node::rounded_sprite(
                color.with_opacity(0.3),
                Size::new(CELL_SIZE - 8.0, CELL_SIZE - 8.0),
                10.0,
            );
            ghost.position = self.cell_center(x, y);
            // Between the cell wells (1) and placed blocks (5)
            ghost.z_position = 4.0;
            let id = self.scene.add_node(ghost);
            self.ghost_cells.push(id);
        }
    }

    /// Commit a legal drop. Precondition: `can_place` holds for the
    /// slot's shape at `(gx, gy)`.
    fn place_block(&mut self, slot_index: usize, gx: i32, gy: i32) {
        let (shape, color) = {
            let slot = &self.slots[slot_index];
            (slot.shape, slot.color)
        };
        self.grid.place(shape, color, gx, gy);

        for &(dx, dy) in shape {
            let x = (gx + dx as i32) as usize;
            let y = (gy + dy as i32) as usize;
            let mut block = Node::rounded_sprite(
                color,
                Size::new(CELL_SIZE - 8.0, CELL_SIZE - 8.0),
                10.0,
            );
            block.position = self.cell_center(x, y);
            block.z_position = 5.0;
            block.alpha = 0.0;
            let id = self.scene.add_node(block);
            self.scene.run(id, Action::fade_in(150.0));
            self.placed_blocks.push(PlacedBlock { node: id, x, y });
        }

        self.scene.remove_node(self.slots[slot_index].node);
        self.slots[slot_index].placed = true;

        self.add_score(shape.len() as u64 * PLACE_POINTS_PER_CELL);

        let cleared = self.check_and_clear_lines();
        if cleared {
            self.combo_count += 1;
            self.update_combo_ui();
        } else {
            if self.combo_count > 0 {
                self.hide_combo_ui();
            }
            self.combo_count = 0;
        }

        if self.slots.iter().all(|s| s.placed) {
            self.tasks.push(Deferred {
                remaining_ms: RESPAWN_DELAY_MS,
                task: Task::SpawnBlocks,
            });
        }

        self.check_game_over();
        self.haptic_impact(ImpactStyle::Medium);
    }

    /// Clear every full row and column, scoring the deduplicated cell
    /// union. The combo multiplier is read *before* the caller
    /// increments the counter: the first clear of a streak scores x1.
    fn check_and_clear_lines(&mut self) -> bool {
        let clear = self.grid.clear_full_lines();
        if clear.is_empty() {
            return false;
        }

        let lines = clear.line_count() as u64;
        self.lines_cleared += lines as u32;
        let lines_text = format!("LINES: {}", self.lines_cleared);
        self.scene[self.lines_label].set_text(lines_text);
        self.scene.run(
            self.lines_label,
            Action::sequence(vec![Action::scale_to(1.3, 100.0), Action::scale_to(1.0, 150.0)]),
        );

        if lines >= 2 {
            self.show_multi_line_label(lines);
        }

        let bonus = if lines > 1 { lines * MULTI_LINE_BONUS } else { 0 };
        let base = clear.cells.len() as u64 * CLEAR_POINTS_PER_CELL + bonus;
        let multiplier = (self.combo_count as u64 + 1).max(1);
        let gained = base * multiplier;
        self.add_score(gained);

        self.screen_shake((6.0 + lines as f32 * 2.0).min(10.0), 250.0);

        // Per-cell bursts, tinted by the cleared cell, and the centroid
        // for the floating score
        let mut centroid = Vec2::ZERO;
        for &(x, y, color) in &clear.cells {
            let center = self.cell_center(x, y);
            centroid += center;
            self.emit_at(center, |emitter| {
                emitter.particle_color = color;
                let count = 8 + (emitter.jitter() * 3.0) as usize;
                for _ in 0..count {
                    emitter.particle_size = 14.0 + emitter.jitter() * 8.0;
                    emitter.burst(1);
                }
                emitter.particle_size = 18.0;
            });
        }
        centroid /= clear.cells.len() as f32;

        let text = if multiplier > 1 {
            format!("+{} x{}", gained, multiplier)
        } else {
            format!("+{}", gained)
        };
        self.create_floating_score(text, centroid);

        let mut removed = Vec::new();
        self.placed_blocks.retain(|block| {
            let hit = clear
                .cells
                .iter()
                .any(|&(x, y, _)| x == block.x && y == block.y);
            if hit {
                removed.push(block.node);
            }
            !hit
        });
        for id in removed {
            self.scene.run(
                id,
                Action::sequence(vec![Action::scale_to(1.2, 100.0), Action::fade_out(150.0)]),
            );
            self.tasks.push(Deferred { remaining_ms: 300.0, task: Task::RemoveNode(id) });
        }

        self.haptic_notification(NotifyKind::Success);

        if self.grid.is_empty() {
            self.trigger_perfect_clear();
        }
        true
    }

    fn show_multi_line_label(&mut self, lines: u64) {
        let (text, color) = if lines >= 4 {
            ("QUAD CLEAR!", Color::new(1.0, 0.3, 0.8))
        } else if lines == 3 {
            ("TRIPLE!", Color::new(1.0, 0.5, 0.0))
        } else {
            ("DOUBLE!", Color::YELLOW)
        };
        let grid_px = GRID_SIZE as f32 * CELL_SIZE;
        let mut label = Node::label(text, 64.0, color);
        label.position = Vec2::new(self.width / 2.0, self.grid_origin.y + grid_px / 2.0);
        label.z_position = 85.0;
        label.scale = Vec2::splat(0.5);
        label.alpha = 0.0;
        let id = self.scene.add_node(label);

        self.scene.run(id, Action::scale_to(1.2, 150.0).with_easing(Easing::EaseOut));
        self.scene.run(id, Action::fade_in(100.0));
        self.scene.run(
            id,
            Action::sequence(vec![Action::wait(400.0), Action::fade_out(400.0)]),
        );
        self.scene.run(
            id,
            Action::sequence(vec![
                Action::wait(400.0),
                Action::move_by(Vec2::new(0.0, -80.0), 400.0),
            ]),
        );
        self.tasks.push(Deferred { remaining_ms: 900.0, task: Task::RemoveNode(id) });
    }

    /// Flat bonus and full-grid celebration when a clear empties the
    /// entire board
    fn trigger_perfect_clear(&mut self) {
        self.add_score(PERFECT_CLEAR_BONUS);
        log::info!("Perfect clear at score {}", self.score);

        let mut label = Node::label("PERFECT CLEAR!", 84.0, Color::new(0.2, 1.0, 0.6));
        label.position = Vec2::new(self.width / 2.0, self.height / 2.0);
        label.z_position = 100.0;
        label.scale = Vec2::splat(0.3);
        let id = self.scene.add_node(label);
        self.scene.run(
            id,
            Action::sequence(vec![
                Action::scale_to(1.2, 200.0).with_easing(Easing::EaseOut),
                Action::scale_to(1.0, 100.0),
                Action::wait(800.0),
                Action::fade_out(400.0),
            ]),
        );
        self.tasks.push(Deferred { remaining_ms: 1600.0, task: Task::RemoveNode(id) });

        // Screen-wide burst across the grid area
        let grid_px = GRID_SIZE as f32 * CELL_SIZE;
        let colors = [Color::CYAN, Color::GREEN, Color::YELLOW, Color::new(0.2, 1.0, 0.6)];
        for _ in 0..40 {
            let position = self.grid_origin
                + Vec2::new(
                    self.rng.random::<f32>() * grid_px,
                    self.rng.random::<f32>() * grid_px,
                );
            let color = colors[self.rng.random_range(0..colors.len())];
            self.emit_at(position, |emitter| {
                emitter.particle_color = color;
                emitter.particle_size = 16.0 + emitter.jitter() * 12.0;
                emitter.burst(1);
                emitter.particle_size = 18.0;
            });
        }

        self.screen_shake(15.0, 400.0);
        self.haptic_notification(NotifyKind::Success);
    }

    /// Exhaustively test every remaining shape at every cell; with no
    /// legal (shape, cell) pair left, the run is over. Placements that
    /// empty the tray defer this to the moment the next batch spawns.
    fn check_game_over(&mut self) {
        let remaining: Vec<Shape> = self
            .slots
            .iter()
            .filter(|s| !s.placed)
            .map(|s| s.shape)
            .collect();
        if remaining.is_empty() {
            return;
        }
        for shape in &remaining {
            for y in 0..self.grid.height() as i32 {
                for x in 0..self.grid.width() as i32 {
                    if self.grid.can_place(shape, x, y) {
                        return;
                    }
                }
            }
        }
        self.trigger_game_over();
    }

    fn trigger_game_over(&mut self) {
        self.mode = Mode::GameOver;
        log::info!("Game over: score {}, {} lines", self.score, self.lines_cleared);

        if self.score > self.high_score {
            self.high_score = self.score;
            let text = format!("BEST: {}", self.high_score);
            self.scene[self.high_score_label].set_text(text);
            self.services.scores.save(self.high_score);

            let mut best = Node::label("NEW BEST!", 42.0, Color::GOLD);
            best.position = Vec2::new(self.width / 2.0, SAFE_TOP + 280.0);
            best.z_position = 100.0;
            best.alpha = 0.0;
            let id = self.scene.add_node(best);
            self.scene.run(
                id,
                Action::sequence(vec![
                    Action::fade_in(200.0),
                    Action::wait(1500.0),
                    Action::fade_out(500.0),
                ]),
            );
            self.tasks.push(Deferred { remaining_ms: 2500.0, task: Task::RemoveNode(id) });
        }

        // Blocks explode outward from the grid center
        let grid_px = GRID_SIZE as f32 * CELL_SIZE;
        let center = self.grid_origin + Vec2::splat(grid_px / 2.0);
        let blocks: Vec<(NodeId, Vec2, Color)> = self
            .placed_blocks
            .iter()
            .filter_map(|b| {
                let position = self.scene.get(b.node)?.position;
                let color = self.grid.color_at(b.x, b.y).unwrap_or(Color::WHITE);
                Some((b.node, position, color))
            })
            .collect();
        for (id, position, color) in blocks {
            let angle = (position.y - center.y).atan2(position.x - center.x);
            let speed = 300.0 + self.rng.random::<f32>() * 400.0;
            let target = position + Vec2::new(angle.cos(), angle.sin()) * speed;
            self.scene.run(id, Action::move_to(target, 600.0).with_easing(Easing::EaseOut));
            self.scene.run(id, Action::fade_out(600.0));
            self.scene.run(id, Action::scale_to(0.3, 600.0));
            self.emit_at(position, |emitter| {
                emitter.particle_color = color;
                emitter.particle_size = 18.0;
                emitter.burst(3);
            });
        }

        self.tasks.push(Deferred { remaining_ms: 300.0, task: Task::ShowGameOverUi });
        self.screen_shake(12.0, 400.0);
        self.haptic_notification(NotifyKind::Error);
    }

    fn show_game_over_ui(&mut self) {
        self.scene[self.game_over_label].hidden = false;
        self.scene[self.restart_label].hidden = false;

        self.scene[self.game_over_label].scale = Vec2::splat(0.5);
        self.scene.run(
            self.game_over_label,
            Action::scale_to(1.0, 300.0).with_easing(Easing::EaseOut),
        );

        let text = format!("SCORE: {}  -  LINES: {}", self.score, self.lines_cleared);
        let mut stats = Node::label(text, 32.0, Color::WHITE.with_opacity(0.7));
        stats.position = Vec2::new(self.width / 2.0, self.height / 2.0 + 180.0);
        stats.z_position = 100.0;
        stats.alpha = 0.0;
        let id = self.scene.add_node(stats);
        self.scene.run(id, Action::fade_in(300.0));
        self.stats_label = Some(id);
    }

    /// Award points and re-check milestones. The score label pops on
    /// every award.
    fn add_score(&mut self, points: u64) {
        self.score += points;
        let text = self.score.to_string();
        self.scene[self.score_label].set_text(text);
        self.scene.run(
            self.score_label,
            Action::sequence(vec![Action::scale_to(1.2, 100.0), Action::scale_to(1.0, 150.0)]),
        );
        self.check_milestone();
    }

    /// Fire the celebration for the highest newly reached threshold.
    ///
    /// Monotonic: a score jump across several thresholds fires once,
    /// for the highest; nothing re-fires until `restart` resets the
    /// index. Returns the fired index.
    fn check_milestone(&mut self) -> Option<usize> {
        let mut reached = None;
        for (i, &threshold) in MILESTONES.iter().enumerate() {
            if self.score >= threshold {
                reached = Some(i);
            }
        }
        let fired = match (reached, self.last_milestone) {
            (Some(i), Some(last)) if i > last => Some(i),
            (Some(i), None) => Some(i),
            _ => None,
        };
        if let Some(i) = fired {
            self.last_milestone = Some(i);
            self.trigger_milestone(i);
        }
        fired
    }

    fn trigger_milestone(&mut self, index: usize) {
        let text = MILESTONE_PHRASES[index.min(MILESTONE_PHRASES.len() - 1)];
        log::info!("Milestone {} reached: {}", MILESTONES[index], text);

        let label = self.milestone_label;
        self.scene[label].set_text(text);
        self.scene[label].hidden = false;
        self.scene[label].scale = Vec2::splat(0.3);
        self.scene[label].alpha = 1.0;
        self.scene.run(
            label,
            Action::sequence(vec![
                Action::scale_to(1.2, 150.0).with_easing(Easing::EaseOut),
                Action::scale_to(1.0, 100.0),
                Action::wait(600.0),
                Action::fade_out(300.0),
            ]),
        );
        self.tasks.push(Deferred { remaining_ms: 1200.0, task: Task::HideNode(label) });

        // Golden full-screen flash
        self.scene.run(
            self.milestone_glow,
            Action::sequence(vec![Action::fade_in(100.0), Action::fade_out(400.0)]),
        );

        // Big burst from the score label
        let position = self.scene[self.score_label].position;
        self.emit_at(position, |emitter| {
            emitter.particle_color = Color::GOLD;
            emitter.particle_size = 24.0;
            emitter.particle_speed = 500.0;
            emitter.burst(25);
            emitter.particle_size = 18.0;
            emitter.particle_speed = 400.0;
        });

        self.haptic_notification(NotifyKind::Success);
    }

    /// Combo color ramps yellow, orange, then cycles rainbow at 4x+
    fn combo_color(&self, level: u32) -> Color {
        if level >= 4 {
            let cycle = [
                Color::RED,
                Color::new(1.0, 0.5, 0.0),
                Color::YELLOW,
                Color::GREEN,
                Color::CYAN,
                Color::PURPLE,
            ];
            cycle[(self.ambient_ms / 200.0) as usize % cycle.len()]
        } else if level == 3 {
            Color::new(1.0, 0.5, 0.0)
        } else {
            Color::YELLOW
        }
    }

    /// Shows the multiplier the *next* clear will earn
    fn update_combo_ui(&mut self) {
        let level = self.combo_count + 1;
        if level < 2 {
            return;
        }
        let color = self.combo_color(level);
        let label = self.combo_label;
        self.scene[label].hidden = false;
        self.scene[label].set_text(format!("X{} COMBO!", level));
        if let Some(data) = self.scene[label].label_data_mut() {
            data.color = color;
        }
        self.scene[label].scale = Vec2::splat(0.5);
        self.scene.run(
            label,
            Action::sequence(vec![Action::scale_to(1.3, 100.0), Action::scale_to(1.0, 150.0)]),
        );

        if let Some(data) = self.scene[self.grid_glow].sprite_data_mut() {
            data.color = color.with_opacity(0.4);
        }
        self.scene.run(
            self.grid_glow,
            Action::sequence(vec![Action::fade_in(150.0), Action::fade_to(0.6, 200.0)]),
        );
    }

    fn hide_combo_ui(&mut self) {
        self.scene.run(self.combo_label, Action::fade_out(300.0));
        self.tasks.push(Deferred {
            remaining_ms: 300.0,
            task: Task::HideNode(self.combo_label),
        });
        self.scene.run(self.grid_glow, Action::fade_out(300.0));
    }

    fn screen_shake(&mut self, intensity: f32, duration_ms: f32) {
        if !self.settings.effective_screen_shake() {
            return;
        }
        self.shake_intensity = intensity;
        self.shake_duration = duration_ms;
        self.shake_elapsed = 0.0;
    }

    fn update_screen_shake(&mut self, dt: f32) {
        if self.shake_elapsed < self.shake_duration {
            self.shake_elapsed += dt;
            let progress = (self.shake_elapsed / self.shake_duration).min(1.0);
            let decay = 1.0 - progress * progress;
            let phase = self.shake_elapsed * 30.0 / 100.0;
            self.shake_offset = Vec2::new(
                phase.sin() * self.shake_intensity * decay,
                phase.cos() * self.shake_intensity * decay,
            );
        } else {
            self.shake_offset = Vec2::ZERO;
        }
    }

    fn create_floating_score(&mut self, text: String, position: Vec2) {
        let mut label = Node::label(text, 60.0, Color::WHITE);
        label.position = position;
        label.z_position = 90.0;
        let node = self.scene.add_node(label);
        self.floating_labels.push(FloatingLabel {
            node,
            start_y: position.y,
            elapsed: 0.0,
            duration: 600.0,
        });
    }

    fn update_floating_labels(&mut self, dt: f32) {
        let mut finished = Vec::new();
        for label in &mut self.floating_labels {
            label.elapsed += dt;
            let progress = label.elapsed / label.duration;
            if progress >= 1.0 {
                finished.push(label.node);
                continue;
            }
            let eased = 1.0 - (1.0 - progress) * (1.0 - progress);
            if let Some(node) = self.scene.get_mut(label.node) {
                node.position.y = label.start_y - 100.0 * eased;
                node.alpha = 1.0 - eased;
            }
        }
        self.floating_labels.retain(|l| l.elapsed < l.duration);
        for node in finished {
            self.scene.remove_node(node);
        }
    }

    fn emit_at(&mut self, position: Vec2, configure: impl FnOnce(&mut ParticleEmitter)) {
        let id = self.emitter;
        if let Some(node) = self.scene.get_mut(id) {
            node.position = position;
            if let Some(emitter) = node.emitter_mut() {
                emitter.origin = position;
                configure(emitter);
            }
        }
    }

    fn haptic_impact(&self, style: ImpactStyle) {
        if self.settings.haptics {
            self.services.feedback.impact(style);
        }
    }

    fn haptic_notification(&self, kind: NotifyKind) {
        if self.settings.haptics {
            self.services.feedback.notification(kind);
        }
    }

    fn haptic_selection(&self) {
        if self.settings.haptics {
            self.services.feedback.selection();
        }
    }

    fn drain_tasks(&mut self, dt: f32) {
        for task in &mut self.tasks {
            task.remaining_ms -= dt;
        }
        let mut due = Vec::new();
        self.tasks.retain(|t| {
            if t.remaining_ms <= 0.0 {
                due.push(t.task);
                false
            } else {
                true
            }
        });
        for task in due {
            self.run_task(task);
        }
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::SpawnBlocks => {
                self.spawn_new_blocks();
                // A batch spawned after the tray emptied completes the
                // deferred game-over check
                if self.mode == Mode::Playing {
                    self.check_game_over();
                }
            }
            Task::RemoveNode(id) => self.scene.remove_node(id),
            Task::HideNode(id) => {
                if let Some(node) = self.scene.get_mut(id) {
                    node.hidden = true;
                    node.alpha = 1.0;
                }
            }
            Task::ShowGameOverUi => self.show_game_over_ui(),
        }
    }

    fn start_game(&mut self) {
        self.mode = Mode::Playing;
        self.scene[self.start_label].hidden = true;
        log::info!("Game started");
    }

    /// Reset everything but the high score and offer a fresh batch
    pub fn restart(&mut self) {
        log::info!("Restarting (high score {})", self.high_score);
        self.score = 0;
        self.combo_count = 0;
        self.lines_cleared = 0;
        self.last_milestone = None;
        self.mode = Mode::Playing;
        self.grid.clear();
        self.tasks.clear();
        self.selected = None;
        self.shake_offset = Vec2::ZERO;
        self.shake_elapsed = 0.0;
        self.shake_duration = 0.0;

        self.scene[self.score_label].set_text("0");
        self.scene[self.lines_label].set_text("LINES: 0");
        self.scene[self.game_over_label].hidden = true;
        self.scene[self.restart_label].hidden = true;
        self.scene[self.combo_label].hidden = true;
        self.scene[self.milestone_label].hidden = true;
        self.scene[self.start_label].hidden = true;
        self.scene.remove_all_actions(self.grid_glow);
        self.scene[self.grid_glow].alpha = 0.0;

        if let Some(stats) = self.stats_label.take() {
            self.scene.remove_node(stats);
        }
        for block in std::mem::take(&mut self.placed_blocks) {
            self.scene.remove_node(block.node);
        }
        for label in std::mem::take(&mut self.floating_labels) {
            self.scene.remove_node(label.node);
        }
        if let Some(shadow) = self.shadow.take() {
            self.scene.remove_node(shadow);
        }
        self.clear_ghost_cells();

        self.spawn_new_blocks();
    }

    /// Single input entry point; coordinates are in logical screen
    /// space
    pub fn handle_touch(&mut self, phase: TouchPhase, x: f32, y: f32) {
        let point = Vec2::new(x, y);
        match self.mode {
            Mode::Menu => {
                if phase == TouchPhase::Began {
                    self.start_game();
                }
            }
            Mode::GameOver => {
                if phase == TouchPhase::Began {
                    self.restart();
                }
            }
            Mode::Playing => self.handle_drag(phase, point),
        }
    }

    fn handle_drag(&mut self, phase: TouchPhase, point: Vec2) {
        match phase {
            TouchPhase::Began => {
                let mut grabbed = None;
                for (i, slot) in self.slots.iter().enumerate() {
                    if slot.placed {
                        continue;
                    }
                    let Some(node) = self.scene.get(slot.node) else { continue };
                    if node.position.distance(point) < GRAB_RADIUS {
                        grabbed = Some(i);
                        break;
                    }
                }
                let Some(i) = grabbed else { return };

                self.selected = Some(i);
                let node = self.slots[i].node;
                let position = self.scene[node].position;
                self.drag_offset = position - point;
                self.scene[node].scale = Vec2::splat(DRAG_SCALE);
                self.scene[node].z_position = 50.0;

                let shadow = self.make_shadow_node(self.slots[i].shape);
                self.scene[shadow].scale = Vec2::splat(DRAG_SCALE);
                self.scene[shadow].z_position = 49.0;
                self.scene[shadow].position = position + Vec2::new(15.0, 15.0);
                let root = self.scene.root();
                self.scene.add_child(root, shadow);
                self.shadow = Some(shadow);

                self.haptic_selection();
            }
            TouchPhase::Moved => {
                let Some(i) = self.selected else { return };
                let new_position = point + self.drag_offset;
                let node = self.slots[i].node;
                self.scene[node].position = new_position;
                if let Some(shadow) = self.shadow {
                    self.scene[shadow].position = new_position + Vec2::new(15.0, 15.0);
                }
                let (gx, gy) = self.screen_to_grid(new_position);
                self.update_ghost_preview(i, gx, gy);
            }
            TouchPhase::Ended => {
                let Some(i) = self.selected.take() else { return };
                if let Some(shadow) = self.shadow.take() {
                    self.scene.remove_node(shadow);
                }
                self.clear_ghost_cells();

                let node = self.slots[i].node;
                let position = self.scene[node].position;
                let (gx, gy) = self.screen_to_grid(position);

                if self.grid.can_place(self.slots[i].shape, gx, gy) {
                    self.place_block(i, gx, gy);
                } else {
                    // Bounce back to the tray
                    let origin = self.slots[i].origin;
                    self.scene.run(
                        node,
                        Action::move_to(origin, 200.0).with_easing(Easing::EaseOut),
                    );
                    self.scene[node].scale = Vec2::splat(TRAY_SCALE);
                    self.scene[node].z_position = 10.0;
                }
            }
        }
    }

    /// Advance animations, particles, shake, floating labels, and the
    /// deferred-task queue by `dt` milliseconds
    pub fn update(&mut self, dt: f32) {
        self.ambient_ms += dt;
        self.scene.update(dt);
        self.update_screen_shake(dt);
        self.update_floating_labels(dt);
        self.drain_tasks(dt);
    }

    /// Draw the frame, applying the screen-shake offset to the whole
    /// scene
    pub fn render(&self, ctx: &mut dyn RenderContext, width: f32, height: f32) {
        ctx.save();
        ctx.translate(self.shake_offset.x, self.shake_offset.y);
        self.scene.render(ctx, width, height);
        ctx.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COLOR: Color = Color::CYAN;

    /// A game already past the menu screen
    fn playing_game() -> BlockFall {
        let mut game = BlockFall::new(42, Settings::default(), Services::noop());
        game.handle_touch(TouchPhase::Began, 1.0, 1.0);
        assert_eq!(game.mode(), Mode::Playing);
        game
    }

    /// Replace the random tray with a single chosen shape
    fn single_slot(game: &mut BlockFall, shape: Shape) -> usize {
        game.slots.clear();
        push_slot(game, shape)
    }

    fn push_slot(game: &mut BlockFall, shape: Shape) -> usize {
        let node = game.make_block_node(shape, TEST_COLOR, TRAY_SCALE);
        let root = game.scene.root();
        game.scene.add_child(root, node);
        game.slots.push(BlockSlot {
            shape,
            color: TEST_COLOR,
            node,
            origin: Vec2::new(200.0, 2200.0),
            placed: false,
        });
        game.slots.len() - 1
    }

    #[test]
    fn test_menu_tap_starts_game() {
        let mut game = BlockFall::new(1, Settings::default(), Services::noop());
        assert_eq!(game.mode(), Mode::Menu);
        game.handle_touch(TouchPhase::Began, 500.0, 500.0);
        assert_eq!(game.mode(), Mode::Playing);
        assert_eq!(game.slots.len(), TRAY_SLOTS);
    }

    #[test]
    fn test_placement_scores_ten_per_cell() {
        let mut game = playing_game();
        let slot = single_slot(&mut game, &[(0, 0), (1, 0), (0, 1)]);
        game.place_block(slot, 2, 2);
        assert_eq!(game.score(), 30);
        assert_eq!(game.placed_blocks.len(), 3);
        assert!(game.grid.is_occupied(2, 2));
        assert!(game.grid.is_occupied(3, 2));
        assert!(game.grid.is_occupied(2, 3));
    }

    #[test]
    fn test_row_clear_scenario_scores_240() {
        let mut game = playing_game();
        // Sentinel outside row 0 keeps this from also being a perfect
        // clear, which would add its own bonus
        let sentinel = single_slot(&mut game, &[(0, 0)]);
        game.place_block(sentinel, 3, 3);
        let before = game.score();

        let bar = single_slot(&mut game, &[(0, 0), (1, 0), (2, 0), (3, 0)]);
        game.place_block(bar, 0, 0);
        for x in 4..8 {
            let dot = single_slot(&mut game, &[(0, 0)]);
            game.place_block(dot, x, 0);
        }

        // 40 placement + 4x10 placements + (8 * 20) * 1 clear
        assert_eq!(game.score() - before, 240);
        assert!((0..8).all(|x| !game.grid.is_occupied(x, 0)));
        assert!(game.grid.is_occupied(3, 3));
        assert_eq!(game.lines_cleared(), 1);
    }

    #[test]
    fn test_union_clear_counts_shared_cell_once() {
        let mut game = playing_game();
        // Sentinel so the union clear does not empty the grid
        let sentinel = single_slot(&mut game, &[(0, 0)]);
        game.place_block(sentinel, 4, 4);
        // Row 0 missing only (0,0); column 0 missing only (0,0)
        for x in 1..8 {
            game.grid.place(&[(0, 0)], TEST_COLOR, x, 0);
        }
        for y in 1..8 {
            game.grid.place(&[(0, 0)], TEST_COLOR, 0, y);
        }
        let before = game.score();

        let dot = single_slot(&mut game, &[(0, 0)]);
        game.place_block(dot, 0, 0);

        // 10 placement + (15 cells * 20 + 2 lines * 50) * 1
        assert_eq!(game.score() - before, 10 + (15 * 20 + 100));
        assert!(!game.grid.is_occupied(0, 0));
        assert!(game.grid.is_occupied(4, 4));
        assert_eq!(game.lines_cleared(), 2);
    }

    #[test]
    fn test_combo_multiplier_monotonic_then_resets() {
        let mut game = playing_game();
        // Sentinel keeps the grid non-empty across clears
        let sentinel = single_slot(&mut game, &[(0, 0)]);
        game.place_block(sentinel, 0, 7);

        // Three consecutive clearing placements: multipliers 1, 2, 3
        for expected_multiplier in 1..=3u64 {
            for x in 0..7 {
                if !game.grid.is_occupied(x, 0) {
                    game.grid.place(&[(0, 0)], TEST_COLOR, x as i32, 0);
                }
            }
            let before = game.score();
            let dot = single_slot(&mut game, &[(0, 0)]);
            game.place_block(dot, 7, 0);
            assert_eq!(game.score() - before, 10 + 160 * expected_multiplier);
        }
        assert_eq!(game.combo(), 3);

        // A non-clearing placement resets the streak
        let dot = single_slot(&mut game, &[(0, 0)]);
        game.place_block(dot, 4, 4);
        assert_eq!(game.combo(), 0);

        // The next clear is back to x1
        for x in 0..7 {
            if !game.grid.is_occupied(x, 0) {
                game.grid.place(&[(0, 0)], TEST_COLOR, x as i32, 0);
            }
        }
        let before = game.score();
        let dot = single_slot(&mut game, &[(0, 0)]);
        game.place_block(dot, 7, 0);
        assert_eq!(game.score() - before, 10 + 160);
    }

    #[test]
    fn test_milestone_fires_once_for_highest_threshold() {
        let mut game = playing_game();
        game.score = 90;
        assert_eq!(game.check_milestone(), None);

        // One jump across three thresholds fires once, for 500
        game.score = 600;
        assert_eq!(game.check_milestone(), Some(2));

        // Never again for the same or lower thresholds
        assert_eq!(game.check_milestone(), None);
        game.score = 700;
        assert_eq!(game.check_milestone(), None);

        game.score = 1000;
        assert_eq!(game.check_milestone(), Some(3));
    }

    #[test]
    fn test_milestone_index_resets_only_on_restart() {
        let mut game = playing_game();
        game.score = 300;
        assert_eq!(game.check_milestone(), Some(1));

        game.restart();
        assert_eq!(game.last_milestone, None);
        game.score = 150;
        assert_eq!(game.check_milestone(), Some(0));
    }

    #[test]
    fn test_game_over_when_nothing_fits() {
        let mut game = playing_game();
        // Fill everything except (0,0); a domino fits nowhere
        for y in 0..8 {
            for x in 0..8 {
                if (x, y) != (0, 0) {
                    game.grid.place(&[(0, 0)], TEST_COLOR, x, y);
                }
            }
        }
        single_slot(&mut game, &[(0, 0), (1, 0)]);
        game.check_game_over();
        assert_eq!(game.mode(), Mode::GameOver);
    }

    #[test]
    fn test_no_game_over_while_one_placement_remains() {
        let mut game = playing_game();
        // Leave exactly (0,0) and (1,0) free: one legal domino drop
        for y in 0..8 {
            for x in 0..8 {
                if (x, y) != (0, 0) && (x, y) != (1, 0) {
                    game.grid.place(&[(0, 0)], TEST_COLOR, x, y);
                }
            }
        }
        single_slot(&mut game, &[(0, 0), (1, 0)]);
        game.check_game_over();
        assert_eq!(game.mode(), Mode::Playing);
    }

    #[test]
    fn test_game_over_deferred_until_batch_spawns() {
        let mut game = playing_game();
        // Every slot placed: nothing to test against yet
        single_slot(&mut game, &[(0, 0)]);
        game.slots[0].placed = true;
        game.check_game_over();
        assert_eq!(game.mode(), Mode::Playing);
    }

    #[test]
    fn test_perfect_clear_awards_flat_bonus() {
        let mut game = playing_game();
        for x in 0..7 {
            game.grid.place(&[(0, 0)], TEST_COLOR, x, 0);
        }
        let dot = single_slot(&mut game, &[(0, 0)]);
        game.place_block(dot, 7, 0);

        // 10 placement + 160 clear + 500 perfect
        assert_eq!(game.score(), 670);
        assert!(game.grid.is_empty());
    }

    #[test]
    fn test_batch_respawns_after_delay() {
        let mut game = playing_game();
        game.slots.clear();
        for _ in 0..TRAY_SLOTS {
            push_slot(&mut game, &[(0, 0)]);
        }
        for i in 0..TRAY_SLOTS {
            game.place_block(i, i as i32 * 2, 4);
        }
        assert!(game.slots.iter().all(|s| s.placed));
        assert_eq!(game.tasks.len(), 1);

        game.update(100.0);
        assert!(game.slots.iter().all(|s| s.placed));

        game.update(250.0);
        assert_eq!(game.slots.len(), TRAY_SLOTS);
        assert!(game.slots.iter().all(|s| !s.placed));
    }

    #[test]
    fn test_drag_and_drop_places_shape() {
        let mut game = playing_game();
        let slot = single_slot(&mut game, &[(0, 0), (1, 0)]);
        let origin = Vec2::new(200.0, 2200.0);
        game.scene[game.slots[slot].node].position = origin;

        game.handle_touch(TouchPhase::Began, origin.x, origin.y);
        assert_eq!(game.selected, Some(slot));
        assert!(game.shadow.is_some());

        let target = game.cell_center(2, 2);
        game.handle_touch(TouchPhase::Moved, target.x, target.y);
        assert!(!game.ghost_cells.is_empty());

        game.handle_touch(TouchPhase::Ended, target.x, target.y);
        assert!(game.slots[slot].placed);
        assert!(game.shadow.is_none());
        assert!(game.ghost_cells.is_empty());
        assert!(game.grid.is_occupied(2, 2));
        assert!(game.grid.is_occupied(3, 2));
        assert_eq!(game.score(), 20);
    }

    #[test]
    fn test_illegal_drop_bounces_back() {
        let mut game = playing_game();
        game.grid.place(&[(0, 0)], TEST_COLOR, 2, 2);
        let slot = single_slot(&mut game, &[(0, 0)]);
        let origin = Vec2::new(200.0, 2200.0);
        game.scene[game.slots[slot].node].position = origin;

        game.handle_touch(TouchPhase::Began, origin.x, origin.y);
        let target = game.cell_center(2, 2);
        game.handle_touch(TouchPhase::Moved, target.x, target.y);
        // Occupied target: no ghost preview
        assert!(game.ghost_cells.is_empty());

        game.handle_touch(TouchPhase::Ended, target.x, target.y);
        assert!(!game.slots[slot].placed);
        assert_eq!(game.score(), 0);
        // The rejection path animates the shape back to the tray
        let node = game.slots[slot].node;
        assert!(game.scene.has_actions(node));
        assert_eq!(game.scene[node].scale, Vec2::splat(TRAY_SCALE));
    }

    #[test]
    fn test_restart_keeps_high_score() {
        let mut game = playing_game();
        let dot = single_slot(&mut game, &[(0, 0)]);
        game.place_block(dot, 3, 3);
        game.trigger_game_over();
        assert_eq!(game.mode(), Mode::GameOver);
        let high = game.high_score();
        assert_eq!(high, 10);

        game.handle_touch(TouchPhase::Began, 500.0, 500.0);
        assert_eq!(game.mode(), Mode::Playing);
        assert_eq!(game.score(), 0);
        assert_eq!(game.combo(), 0);
        assert_eq!(game.high_score(), high);
        assert!(game.grid.is_empty());
        assert!(game.placed_blocks.is_empty());
        assert_eq!(game.slots.len(), TRAY_SLOTS);
    }

    #[test]
    fn test_update_advances_shake_and_decays() {
        let mut game = playing_game();
        game.screen_shake(10.0, 250.0);
        game.update(50.0);
        assert!(game.shake_offset.length() > 0.0);
        game.update(300.0);
        assert_eq!(game.shake_offset, Vec2::ZERO);
    }

    #[test]
    fn test_reduced_motion_suppresses_shake() {
        let settings = Settings { reduced_motion: true, ..Settings::default() };
        let mut game = BlockFall::new(3, settings, Services::noop());
        game.handle_touch(TouchPhase::Began, 1.0, 1.0);
        game.screen_shake(10.0, 250.0);
        game.update(50.0);
        assert_eq!(game.shake_offset, Vec2::ZERO);
    }

    #[test]
    fn test_floating_score_label_expires() {
        let mut game = playing_game();
        game.create_floating_score("+160".to_string(), Vec2::new(500.0, 800.0));
        let node = game.floating_labels[0].node;
        game.update(300.0);
        let n = &game.scene[node];
        assert!(n.alpha < 1.0);
        assert!(n.position.y < 800.0);
        game.update(400.0);
        assert!(game.floating_labels.is_empty());
        assert!(game.scene.get(node).is_none());
    }
}
