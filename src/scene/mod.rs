//! Retained scene graph with actions and particles
//!
//! A `Scene` owns the node arena, the per-node action table, and the
//! background fill. All mutation happens inside the per-frame
//! `update(dt)` / `render(ctx, w, h)` pair driven by the host loop.

pub mod action;
pub mod node;
pub mod particle;

pub use action::{Action, Easing};
pub use node::{LabelData, Node, NodeId, NodeKind, ShapeData, ShapeGeometry, Size, SpriteData};
pub use particle::{Particle, ParticleEmitter};

use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use crate::color::Color;
use crate::render::RenderContext;

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Debug)]
struct ActionEntry {
    action: Action,
    key: Option<&'static str>,
}

/// The scene: a node arena rooted at an implicit group node, plus the
/// action table that animates it
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    pub background_color: Color,
    actions: HashMap<NodeId, Vec<ActionEntry>>,
}

impl Scene {
    pub fn new(background_color: Color) -> Self {
        let mut scene = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId { index: 0, generation: 0 },
            background_color,
            actions: HashMap::new(),
        };
        scene.root = scene.insert(Node::group());
        scene
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Allocate a detached node
    pub fn insert(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId { index, generation: slot.generation }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot { generation: 0, node: Some(node) });
            NodeId { index, generation: 0 }
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Reparent `child` under `parent`, keeping the child list sorted by
    /// ascending z-position (stable for equal z). Re-sorts the whole
    /// list, so z-position changes made since the last insertion take
    /// effect on the next `add_child` anywhere under the same parent.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        if self.get(child).is_none() || self.get(parent).is_none() {
            return;
        }
        self.remove_from_parent(child);
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        let mut kids = match self.get_mut(parent) {
            Some(p) => std::mem::take(&mut p.children),
            None => return,
        };
        kids.push(child);
        kids.sort_by(|&a, &b| {
            let za = self.get(a).map(|n| n.z_position).unwrap_or(0.0);
            let zb = self.get(b).map(|n| n.z_position).unwrap_or(0.0);
            za.partial_cmp(&zb).unwrap_or(std::cmp::Ordering::Equal)
        });
        if let Some(p) = self.get_mut(parent) {
            p.children = kids;
        }
    }

    /// Insert a node and attach it to the scene root
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = self.insert(node);
        self.add_child(self.root, id);
        id
    }

    /// Insert a node and attach it under `parent`
    pub fn add_child_node(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.insert(node);
        self.add_child(parent, id);
        id
    }

    /// Sever the parent link; the node stays alive and can be re-added
    pub fn remove_from_parent(&mut self, id: NodeId) {
        let Some(parent) = self.get(id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = None;
        }
    }

    /// Detach and destroy a node and its entire subtree, cancelling
    /// their actions. No-op for stale handles.
    pub fn remove_node(&mut self, id: NodeId) {
        if self.get(id).is_none() {
            return;
        }
        self.remove_from_parent(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            self.actions.remove(&current);
            let slot = &mut self.slots[current.index as usize];
            if slot.generation != current.generation {
                continue;
            }
            if let Some(node) = slot.node.take() {
                stack.extend(node.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
            }
        }
    }

    /// Live node count (root included)
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    /// Attach an action to a node
    pub fn run(&mut self, id: NodeId, action: Action) {
        self.run_with_key(id, action, None);
    }

    pub fn run_keyed(&mut self, id: NodeId, action: Action, key: &'static str) {
        self.run_with_key(id, action, Some(key));
    }

    fn run_with_key(&mut self, id: NodeId, action: Action, key: Option<&'static str>) {
        if self.get(id).is_none() {
            return;
        }
        self.actions.entry(id).or_default().push(ActionEntry { action, key });
    }

    /// Cancel the action registered under `key`, if any
    pub fn remove_action(&mut self, id: NodeId, key: &'static str) {
        if let Some(entries) = self.actions.get_mut(&id) {
            entries.retain(|e| e.key != Some(key));
        }
    }

    pub fn remove_all_actions(&mut self, id: NodeId) {
        self.actions.remove(&id);
    }

    pub fn has_actions(&self, id: NodeId) -> bool {
        self.actions.get(&id).is_some_and(|e| !e.is_empty())
    }

    /// Tick all actions and emitters by `dt` milliseconds.
    ///
    /// Completed non-repeating actions are removed; entries whose node
    /// has been destroyed are dropped.
    pub fn update(&mut self, dt: f32) {
        let Self { slots, actions, .. } = self;
        actions.retain(|id, entries| {
            let Some(slot) = slots.get_mut(id.index as usize) else {
                return false;
            };
            if slot.generation != id.generation {
                return false;
            }
            let Some(node) = slot.node.as_mut() else {
                return false;
            };
            entries.retain_mut(|entry| {
                entry.action.tick(node, dt);
                !entry.action.is_complete()
            });
            !entries.is_empty()
        });

        for slot in slots.iter_mut() {
            if let Some(node) = slot.node.as_mut() {
                let origin = node.position;
                if let NodeKind::Emitter(emitter) = &mut node.kind {
                    emitter.origin = origin;
                    emitter.update(dt);
                }
            }
        }
    }

    /// Paint the background, then walk the tree in ascending z-order
    pub fn render(&self, ctx: &mut dyn RenderContext, width: f32, height: f32) {
        ctx.fill_rect(0.0, 0.0, width, height, self.background_color);
        self.render_node(self.root, ctx);
    }

    fn render_node(&self, id: NodeId, ctx: &mut dyn RenderContext) {
        let Some(node) = self.get(id) else { return };
        if node.hidden || node.alpha <= 0.0 {
            return;
        }
        ctx.save();
        ctx.translate(node.position.x, node.position.y);
        ctx.rotate(node.rotation);
        ctx.scale(node.scale.x, node.scale.y);
        ctx.multiply_alpha(node.alpha);

        self.draw_kind(node, ctx);
        for &child in &node.children {
            self.render_node(child, ctx);
        }

        ctx.restore();
    }

    fn draw_kind(&self, node: &Node, ctx: &mut dyn RenderContext) {
        match &node.kind {
            NodeKind::Group => {}
            NodeKind::Sprite(data) => {
                let x = -data.size.width * data.anchor.x;
                let y = -data.size.height * data.anchor.y;
                if data.corner_radius > 0.0 {
                    ctx.fill_rounded_rect(
                        x,
                        y,
                        data.size.width,
                        data.size.height,
                        data.corner_radius,
                        data.color,
                    );
                } else {
                    ctx.fill_rect(x, y, data.size.width, data.size.height, data.color);
                }
            }
            NodeKind::Shape(data) => match data.geometry {
                ShapeGeometry::Circle { radius } => {
                    if data.fill_color.a > 0.0 {
                        ctx.fill_circle(0.0, 0.0, radius, data.fill_color);
                    }
                    if data.stroke_color.a > 0.0 && data.line_width > 0.0 {
                        ctx.stroke_circle(0.0, 0.0, radius, data.line_width, data.stroke_color);
                    }
                }
                ShapeGeometry::Rect { size, corner_radius } => {
                    let x = -size.width / 2.0;
                    let y = -size.height / 2.0;
                    if data.fill_color.a > 0.0 {
                        ctx.fill_rounded_rect(
                            x,
                            y,
                            size.width,
                            size.height,
                            corner_radius,
                            data.fill_color,
                        );
                    }
                    if data.stroke_color.a > 0.0 && data.line_width > 0.0 {
                        ctx.stroke_rounded_rect(
                            x,
                            y,
                            size.width,
                            size.height,
                            corner_radius,
                            data.line_width,
                            data.stroke_color,
                        );
                    }
                }
            },
            NodeKind::Label(data) => {
                ctx.fill_text(&data.text, 0.0, 0.0, data.font_size, data.color, data.align);
            }
            NodeKind::Emitter(emitter) => {
                for particle in &emitter.particles {
                    let color = particle.color.with_opacity(particle.color.a * particle.alpha());
                    ctx.fill_circle(
                        particle.position.x - emitter.origin.x,
                        particle.position.y - emitter.origin.y,
                        particle.size / 2.0,
                        color,
                    );
                }
            }
        }
    }
}

impl Index<NodeId> for Scene {
    type Output = Node;

    /// Panics if the handle is stale; use `get` when unsure.
    fn index(&self, id: NodeId) -> &Node {
        match self.get(id) {
            Some(node) => node,
            None => panic!("stale NodeId {:?}", id),
        }
    }
}

impl IndexMut<NodeId> for Scene {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("stale NodeId {:?}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::TextAlign;
    use glam::Vec2;

    /// Records the label text of every text draw, in visit order
    #[derive(Default)]
    struct RecordingContext {
        texts: Vec<String>,
    }

    impl RenderContext for RecordingContext {
        fn save(&mut self) {}
        fn restore(&mut self) {}
        fn translate(&mut self, _x: f32, _y: f32) {}
        fn rotate(&mut self, _radians: f32) {}
        fn scale(&mut self, _sx: f32, _sy: f32) {}
        fn multiply_alpha(&mut self, _alpha: f32) {}
        fn fill_rect(&mut self, _x: f32, _y: f32, _w: f32, _h: f32, _color: Color) {}
        fn fill_rounded_rect(
            &mut self,
            _x: f32,
            _y: f32,
            _w: f32,
            _h: f32,
            _radius: f32,
            _color: Color,
        ) {
        }
        fn stroke_rounded_rect(
            &mut self,
            _x: f32,
            _y: f32,
            _w: f32,
            _h: f32,
            _radius: f32,
            _line_width: f32,
            _color: Color,
        ) {
        }
        fn fill_circle(&mut self, _x: f32, _y: f32, _radius: f32, _color: Color) {}
        fn stroke_circle(&mut self, _x: f32, _y: f32, _radius: f32, _line_width: f32, _color: Color) {}
        fn fill_text(
            &mut self,
            text: &str,
            _x: f32,
            _y: f32,
            _font_size: f32,
            _color: Color,
            _align: TextAlign,
        ) {
            self.texts.push(text.to_string());
        }
    }

    fn labeled(scene: &mut Scene, text: &str, z: f32) -> NodeId {
        let mut node = Node::label(text, 48.0, Color::WHITE);
        node.z_position = z;
        scene.add_node(node)
    }

    #[test]
    fn test_render_visits_children_in_z_order() {
        let mut scene = Scene::new(Color::BLACK);
        labeled(&mut scene, "mid", 5.0);
        labeled(&mut scene, "top", 50.0);
        labeled(&mut scene, "bottom", -10.0);
        labeled(&mut scene, "mid2", 5.0);

        let mut ctx = RecordingContext::default();
        scene.render(&mut ctx, 100.0, 100.0);
        assert_eq!(ctx.texts, vec!["bottom", "mid", "mid2", "top"]);
    }

    #[test]
    fn test_z_order_survives_interleaved_removal() {
        let mut scene = Scene::new(Color::BLACK);
        let a = labeled(&mut scene, "a", 1.0);
        labeled(&mut scene, "b", 3.0);
        scene.remove_node(a);
        labeled(&mut scene, "c", 2.0);
        labeled(&mut scene, "d", 0.0);

        let mut ctx = RecordingContext::default();
        scene.render(&mut ctx, 100.0, 100.0);
        assert_eq!(ctx.texts, vec!["d", "c", "b"]);
    }

    #[test]
    fn test_add_child_reparents() {
        let mut scene = Scene::new(Color::BLACK);
        let a = scene.add_node(Node::group());
        let b = scene.add_node(Node::group());
        let child = scene.add_child_node(a, Node::group());
        assert_eq!(scene.children(a), &[child]);

        scene.add_child(b, child);
        assert!(scene.children(a).is_empty());
        assert_eq!(scene.children(b), &[child]);
        assert_eq!(scene[child].parent(), Some(b));
    }

    #[test]
    fn test_hidden_subtree_is_skipped() {
        let mut scene = Scene::new(Color::BLACK);
        let parent = scene.add_node(Node::group());
        scene.add_child_node(parent, Node::label("inner", 48.0, Color::WHITE));
        scene[parent].hidden = true;

        let mut ctx = RecordingContext::default();
        scene.render(&mut ctx, 100.0, 100.0);
        assert!(ctx.texts.is_empty());
    }

    #[test]
    fn test_remove_node_frees_subtree_and_actions() {
        let mut scene = Scene::new(Color::BLACK);
        let parent = scene.add_node(Node::group());
        let child = scene.add_child_node(parent, Node::group());
        scene.run(child, Action::fade_out(100.0));
        assert!(scene.has_actions(child));

        scene.remove_node(parent);
        assert!(scene.get(parent).is_none());
        assert!(scene.get(child).is_none());
        assert!(!scene.has_actions(child));

        // Stale handles stay stale even after slot reuse
        let fresh = scene.add_node(Node::group());
        assert!(scene.get(parent).is_none());
        assert!(scene.get(fresh).is_some());
    }

    #[test]
    fn test_completed_actions_are_removed() {
        let mut scene = Scene::new(Color::BLACK);
        let node = scene.add_node(Node::label("x", 48.0, Color::WHITE));
        scene.run(node, Action::move_to(Vec2::new(10.0, 10.0), 100.0));
        scene.update(50.0);
        assert!(scene.has_actions(node));
        scene.update(60.0);
        assert!(!scene.has_actions(node));
        assert_eq!(scene[node].position, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_repeat_forever_action_persists() {
        let mut scene = Scene::new(Color::BLACK);
        let node = scene.add_node(Node::label("x", 48.0, Color::WHITE));
        scene.run(node, Action::repeat_forever(Action::rotate_by(1.0, 100.0)));
        for _ in 0..10 {
            scene.update(100.0);
        }
        assert!(scene.has_actions(node));
        assert!(scene[node].rotation > 9.0);
    }

    #[test]
    fn test_keyed_action_cancellation() {
        let mut scene = Scene::new(Color::BLACK);
        let node = scene.add_node(Node::label("x", 48.0, Color::WHITE));
        scene.run_keyed(node, Action::fade_out(1000.0), "fade");
        scene.remove_action(node, "fade");
        scene.update(500.0);
        assert_eq!(scene[node].alpha, 1.0);
    }
}
