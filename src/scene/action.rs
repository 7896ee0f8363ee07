//! Timed node animations
//!
//! An action mutates one node property over a duration in milliseconds.
//! Start values are captured lazily on the first tick, so the same
//! constructor works from whatever state the node is in when the action
//! begins. At `t = 1` the property lands exactly on the target and the
//! action reports completion.

use glam::Vec2;

use crate::scene::node::Node;

/// Easing curve applied to normalized time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
enum ActionKind {
    MoveTo { start: Option<Vec2>, target: Vec2 },
    MoveBy { start: Option<Vec2>, delta: Vec2 },
    ScaleTo { start: Option<Vec2>, target: Vec2 },
    FadeTo { start: Option<f32>, target: f32 },
    RotateTo { start: Option<f32>, target: f32 },
    RotateBy { start: Option<f32>, delta: f32 },
    Wait,
    Sequence { actions: Vec<Action>, index: usize },
    RepeatForever { template: Box<Action>, current: Box<Action> },
}

/// A timed, interpolated mutation of one node property
#[derive(Debug, Clone)]
pub struct Action {
    kind: ActionKind,
    duration: f32,
    elapsed: f32,
    complete: bool,
    easing: Easing,
}

impl Action {
    fn new(kind: ActionKind, duration_ms: f32) -> Self {
        Self {
            kind,
            duration: duration_ms,
            elapsed: 0.0,
            complete: false,
            easing: Easing::Linear,
        }
    }

    pub fn move_to(target: Vec2, duration_ms: f32) -> Self {
        Self::new(ActionKind::MoveTo { start: None, target }, duration_ms)
    }

    pub fn move_by(delta: Vec2, duration_ms: f32) -> Self {
        Self::new(ActionKind::MoveBy { start: None, delta }, duration_ms)
    }

    /// Uniform scale to `scale` on both axes
    pub fn scale_to(scale: f32, duration_ms: f32) -> Self {
        Self::new(
            ActionKind::ScaleTo {
                start: None,
                target: Vec2::splat(scale),
            },
            duration_ms,
        )
    }

    pub fn fade_to(alpha: f32, duration_ms: f32) -> Self {
        Self::new(ActionKind::FadeTo { start: None, target: alpha }, duration_ms)
    }

    pub fn fade_in(duration_ms: f32) -> Self {
        Self::fade_to(1.0, duration_ms)
    }

    pub fn fade_out(duration_ms: f32) -> Self {
        Self::fade_to(0.0, duration_ms)
    }

    pub fn rotate_to(radians: f32, duration_ms: f32) -> Self {
        Self::new(ActionKind::RotateTo { start: None, target: radians }, duration_ms)
    }

    pub fn rotate_by(radians: f32, duration_ms: f32) -> Self {
        Self::new(ActionKind::RotateBy { start: None, delta: radians }, duration_ms)
    }

    pub fn wait(duration_ms: f32) -> Self {
        Self::new(ActionKind::Wait, duration_ms)
    }

    /// Run `actions` one after another
    pub fn sequence(actions: Vec<Action>) -> Self {
        Self::new(ActionKind::Sequence { actions, index: 0 }, 0.0)
    }

    /// Repeat `action` indefinitely; each cycle runs a fresh reset clone
    /// so lazily captured start values are re-captured from live state.
    pub fn repeat_forever(action: Action) -> Self {
        let current = Box::new(action.clone());
        Self::new(
            ActionKind::RepeatForever {
                template: Box::new(action),
                current,
            },
            0.0,
        )
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Fresh copy with captured starts and all progress cleared
    fn reset_clone(&self) -> Self {
        let kind = match &self.kind {
            ActionKind::MoveTo { target, .. } => ActionKind::MoveTo { start: None, target: *target },
            ActionKind::MoveBy { delta, .. } => ActionKind::MoveBy { start: None, delta: *delta },
            ActionKind::ScaleTo { target, .. } => ActionKind::ScaleTo { start: None, target: *target },
            ActionKind::FadeTo { target, .. } => ActionKind::FadeTo { start: None, target: *target },
            ActionKind::RotateTo { target, .. } => ActionKind::RotateTo { start: None, target: *target },
            ActionKind::RotateBy { delta, .. } => ActionKind::RotateBy { start: None, delta: *delta },
            ActionKind::Wait => ActionKind::Wait,
            ActionKind::Sequence { actions, .. } => ActionKind::Sequence {
                actions: actions.iter().map(Action::reset_clone).collect(),
                index: 0,
            },
            ActionKind::RepeatForever { template, .. } => ActionKind::RepeatForever {
                template: template.clone(),
                current: Box::new(template.reset_clone()),
            },
        };
        Self {
            kind,
            duration: self.duration,
            elapsed: 0.0,
            complete: false,
            easing: self.easing,
        }
    }

    /// Advance by `dt` milliseconds, applying the interpolated value
    pub fn tick(&mut self, node: &mut Node, dt: f32) {
        if self.complete {
            return;
        }
        self.elapsed += dt;

        match &mut self.kind {
            ActionKind::MoveTo { start, target } => {
                let from = *start.get_or_insert(node.position);
                let (eased, done) = Self::eased(self.easing, self.elapsed, self.duration);
                // Land exactly on the target, not one lerp step short
                node.position = if done { *target } else { from.lerp(*target, eased) };
                self.complete = done;
            }
            ActionKind::MoveBy { start, delta } => {
                let from = *start.get_or_insert(node.position);
                let (eased, done) = Self::eased(self.easing, self.elapsed, self.duration);
                node.position = if done { from + *delta } else { from + *delta * eased };
                self.complete = done;
            }
            ActionKind::ScaleTo { start, target } => {
                let from = *start.get_or_insert(node.scale);
                let (eased, done) = Self::eased(self.easing, self.elapsed, self.duration);
                node.scale = if done { *target } else { from.lerp(*target, eased) };
                self.complete = done;
            }
            ActionKind::FadeTo { start, target } => {
                let from = *start.get_or_insert(node.alpha);
                let (eased, done) = Self::eased(self.easing, self.elapsed, self.duration);
                node.alpha = if done { *target } else { from + (*target - from) * eased };
                self.complete = done;
            }
            ActionKind::RotateTo { start, target } => {
                let from = *start.get_or_insert(node.rotation);
                let (eased, done) = Self::eased(self.easing, self.elapsed, self.duration);
                node.rotation = if done { *target } else { from + (*target - from) * eased };
                self.complete = done;
            }
            ActionKind::RotateBy { start, delta } => {
                let from = *start.get_or_insert(node.rotation);
                let (eased, done) = Self::eased(self.easing, self.elapsed, self.duration);
                node.rotation = if done { from + *delta } else { from + *delta * eased };
                self.complete = done;
            }
            ActionKind::Wait => {
                let (_, done) = Self::eased(self.easing, self.elapsed, self.duration);
                self.complete = done;
            }
            ActionKind::Sequence { actions, index } => {
                if let Some(current) = actions.get_mut(*index) {
                    current.tick(node, dt);
                    if current.is_complete() {
                        *index += 1;
                    }
                }
                if *index >= actions.len() {
                    self.complete = true;
                }
            }
            ActionKind::RepeatForever { template, current } => {
                current.tick(node, dt);
                if current.is_complete() {
                    *current = Box::new(template.reset_clone());
                }
            }
        }
    }

    fn eased(easing: Easing, elapsed: f32, duration: f32) -> (f32, bool) {
        let t = if duration <= 0.0 {
            1.0
        } else {
            (elapsed / duration).min(1.0)
        };
        (easing.apply(t), t >= 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::scene::node::Size;

    fn test_node() -> Node {
        Node::sprite(Color::WHITE, Size::new(10.0, 10.0))
    }

    #[test]
    fn test_move_to_lands_exactly_on_target() {
        let mut node = test_node();
        node.position = Vec2::new(3.0, 7.0);
        let target = Vec2::new(100.0, 50.0);
        let mut action = Action::move_to(target, 200.0);

        action.tick(&mut node, 120.0);
        assert!(!action.is_complete());
        assert_ne!(node.position, target);

        // Overshooting the duration clamps t to 1
        action.tick(&mut node, 120.0);
        assert!(action.is_complete());
        assert_eq!(node.position, target);
    }

    #[test]
    fn test_completed_action_stops_mutating() {
        let mut node = test_node();
        let mut action = Action::move_to(Vec2::new(10.0, 0.0), 100.0);
        action.tick(&mut node, 150.0);
        let landed = node.position;
        node.position = Vec2::new(99.0, 99.0);
        action.tick(&mut node, 16.0);
        assert_eq!(node.position, Vec2::new(99.0, 99.0));
        assert_eq!(landed, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_fade_to_exact() {
        let mut node = test_node();
        node.alpha = 0.0;
        let mut action = Action::fade_in(150.0);
        action.tick(&mut node, 75.0);
        assert!((node.alpha - 0.5).abs() < 1e-6);
        action.tick(&mut node, 75.0);
        assert_eq!(node.alpha, 1.0);
        assert!(action.is_complete());
    }

    #[test]
    fn test_move_by_is_relative() {
        let mut node = test_node();
        node.position = Vec2::new(10.0, 20.0);
        let mut action = Action::move_by(Vec2::new(0.0, -80.0), 100.0);
        action.tick(&mut node, 100.0);
        assert_eq!(node.position, Vec2::new(10.0, -60.0));
    }

    #[test]
    fn test_sequence_runs_children_in_order() {
        let mut node = test_node();
        node.alpha = 0.0;
        let mut action = Action::sequence(vec![
            Action::fade_in(100.0),
            Action::wait(50.0),
            Action::fade_out(100.0),
        ]);

        action.tick(&mut node, 100.0);
        assert_eq!(node.alpha, 1.0);
        assert!(!action.is_complete());

        action.tick(&mut node, 50.0); // wait
        assert!(!action.is_complete());

        action.tick(&mut node, 100.0);
        assert_eq!(node.alpha, 0.0);
        assert!(action.is_complete());
    }

    #[test]
    fn test_repeat_forever_restarts_from_live_state() {
        let mut node = test_node();
        let mut action = Action::repeat_forever(Action::move_by(Vec2::new(5.0, 0.0), 100.0));

        action.tick(&mut node, 100.0);
        assert_eq!(node.position.x, 5.0);
        assert!(!action.is_complete());

        // Second cycle re-captures the start, so deltas accumulate
        action.tick(&mut node, 100.0);
        assert_eq!(node.position.x, 10.0);
        assert!(!action.is_complete());
    }

    #[test]
    fn test_ease_out_faster_early() {
        let linear = Easing::Linear.apply(0.25);
        let ease_out = Easing::EaseOut.apply(0.25);
        assert!(ease_out > linear);
        assert_eq!(Easing::EaseOut.apply(1.0), 1.0);
        assert_eq!(Easing::EaseInOut.apply(1.0), 1.0);
    }
}
