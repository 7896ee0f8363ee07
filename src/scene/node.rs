//! Scene-graph nodes
//!
//! Nodes live in the scene's slab arena and are addressed by `NodeId`
//! handles. Drawable payloads are a closed set of kinds dispatched by
//! `match` in the render walk rather than an open subclass hierarchy.

use glam::Vec2;

use crate::color::Color;
use crate::render::TextAlign;
use crate::scene::particle::ParticleEmitter;

/// Generational handle to a node in a `Scene`
///
/// Handles of removed nodes go stale; `Scene::get` returns `None` for
/// them and removal through a stale handle is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// Width/height pair for rectangular payloads
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Filled, optionally rounded rectangle about an anchor point
#[derive(Debug, Clone)]
pub struct SpriteData {
    pub color: Color,
    pub size: Size,
    /// Anchor in unit coordinates; (0.5, 0.5) centers the sprite
    pub anchor: Vec2,
    pub corner_radius: f32,
}

/// Geometry of a shape node
#[derive(Debug, Clone, Copy)]
pub enum ShapeGeometry {
    Circle { radius: f32 },
    Rect { size: Size, corner_radius: f32 },
}

/// Fillable/strokable primitive shape
#[derive(Debug, Clone)]
pub struct ShapeData {
    pub geometry: ShapeGeometry,
    pub fill_color: Color,
    pub stroke_color: Color,
    pub line_width: f32,
}

/// Text drawn with alignment, baseline centered
#[derive(Debug, Clone)]
pub struct LabelData {
    pub text: String,
    pub font_size: f32,
    pub color: Color,
    pub align: TextAlign,
}

/// Closed set of drawable node kinds
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Pure container
    Group,
    Sprite(SpriteData),
    Shape(ShapeData),
    Label(LabelData),
    Emitter(ParticleEmitter),
}

/// A positioned, styled node in the scene tree
///
/// A node has at most one parent; child lists are kept in ascending
/// z-order by `Scene::add_child`. Lifetime is explicit: nodes exist
/// until removed through the scene.
#[derive(Debug, Clone)]
pub struct Node {
    pub position: Vec2,
    pub z_position: f32,
    pub alpha: f32,
    pub hidden: bool,
    pub scale: Vec2,
    pub rotation: f32,
    pub kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            position: Vec2::ZERO,
            z_position: 0.0,
            alpha: 1.0,
            hidden: false,
            scale: Vec2::ONE,
            rotation: 0.0,
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group() -> Self {
        Self::new(NodeKind::Group)
    }

    pub fn sprite(color: Color, size: Size) -> Self {
        Self::new(NodeKind::Sprite(SpriteData {
            color,
            size,
            anchor: Vec2::new(0.5, 0.5),
            corner_radius: 0.0,
        }))
    }

    pub fn rounded_sprite(color: Color, size: Size, corner_radius: f32) -> Self {
        let mut node = Self::sprite(color, size);
        if let NodeKind::Sprite(data) = &mut node.kind {
            data.corner_radius = corner_radius;
        }
        node
    }

    pub fn label(text: impl Into<String>, font_size: f32, color: Color) -> Self {
        Self::new(NodeKind::Label(LabelData {
            text: text.into(),
            font_size,
            color,
            align: TextAlign::Center,
        }))
    }

    pub fn circle(radius: f32) -> Self {
        Self::new(NodeKind::Shape(ShapeData {
            geometry: ShapeGeometry::Circle { radius },
            fill_color: Color::CLEAR,
            stroke_color: Color::WHITE,
            line_width: 1.0,
        }))
    }

    pub fn emitter(emitter: ParticleEmitter) -> Self {
        Self::new(NodeKind::Emitter(emitter))
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn sprite_data_mut(&mut self) -> Option<&mut SpriteData> {
        match &mut self.kind {
            NodeKind::Sprite(data) => Some(data),
            _ => None,
        }
    }

    pub fn label_data_mut(&mut self) -> Option<&mut LabelData> {
        match &mut self.kind {
            NodeKind::Label(data) => Some(data),
            _ => None,
        }
    }

    pub fn emitter_mut(&mut self) -> Option<&mut ParticleEmitter> {
        match &mut self.kind {
            NodeKind::Emitter(emitter) => Some(emitter),
            _ => None,
        }
    }

    /// Set the label text, if this is a label node
    pub fn set_text(&mut self, text: impl Into<String>) {
        if let NodeKind::Label(data) = &mut self.kind {
            data.text = text.into();
        }
    }

    /// Hit test in parent coordinates.
    ///
    /// Sprites test an anchor-relative AABB, circles test Euclidean
    /// distance to the center. Rotation and non-uniform scale are
    /// ignored; other kinds never hit.
    pub fn contains(&self, point: Vec2) -> bool {
        match &self.kind {
            NodeKind::Sprite(data) => {
                let local = point - self.position;
                let left = -data.size.width * data.anchor.x;
                let top = -data.size.height * data.anchor.y;
                local.x >= left
                    && local.x <= left + data.size.width
                    && local.y >= top
                    && local.y <= top + data.size.height
            }
            NodeKind::Shape(data) => match data.geometry {
                ShapeGeometry::Circle { radius } => point.distance(self.position) <= radius,
                ShapeGeometry::Rect { .. } => false,
            },
            _ => false,
        }
    }
}
