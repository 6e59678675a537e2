/// Pointer input, drag rotation and hover smoothing.
///
/// Mouse and touch events are normalized into one pointer action stream
/// before they reach the drag and hover state machines.
use log::trace;

use crate::config::InteractionParams;
use crate::transform::RotationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MousePhase {
    Down,
    Move,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseInput {
    pub phase: MousePhase,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchInput {
    pub phase: TouchPhase,
    /// First touch point; absent when the last finger lifted
    pub position: Option<(f32, f32)>,
}

/// Raw input as delivered by a front end, in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Mouse(MouseInput),
    Touch(TouchInput),
    Leave,
    Resize { width: u32, height: u32 },
}

impl InputEvent {
    pub fn mouse(phase: MousePhase, x: f32, y: f32) -> Self {
        InputEvent::Mouse(MouseInput { phase, x, y })
    }

    pub fn touch(phase: TouchPhase, position: Option<(f32, f32)>) -> Self {
        InputEvent::Touch(TouchInput { phase, position })
    }
}

/// Normalized pointer action
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerAction {
    Press { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Release,
    Leave,
}

/// Map an input event to the pointer actions it implies.
///
/// Touch end releases the drag and also takes the pointer off the canvas.
pub fn normalize(event: &InputEvent) -> Vec<PointerAction> {
    match *event {
        InputEvent::Mouse(MouseInput { phase, x, y }) => match phase {
            MousePhase::Down => vec![PointerAction::Press { x, y }],
            MousePhase::Move => vec![PointerAction::Move { x, y }],
            MousePhase::Up => vec![PointerAction::Release],
        },
        InputEvent::Touch(TouchInput { phase, position }) => match (phase, position) {
            (TouchPhase::Start, Some((x, y))) => vec![PointerAction::Press { x, y }],
            (TouchPhase::Move, Some((x, y))) => vec![PointerAction::Move { x, y }],
            (TouchPhase::End, _) => vec![PointerAction::Release, PointerAction::Leave],
            (_, None) => Vec::new(),
        },
        InputEvent::Leave => vec![PointerAction::Leave],
        InputEvent::Resize { .. } => Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging { last: (f32, f32) },
}

/// Drag-to-rotate state machine. No inertia: rotation only changes on moves.
#[derive(Debug, Clone)]
pub struct DragRotation {
    state: DragState,
    sensitivity: f32,
    max_pitch: f32,
}

impl DragRotation {
    pub fn new(sensitivity: f32, max_pitch: f32) -> Self {
        Self {
            state: DragState::Idle,
            sensitivity,
            max_pitch,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn press(&mut self, x: f32, y: f32) {
        self.state = DragState::Dragging { last: (x, y) };
    }

    /// Apply a move; returns whether `rotation` changed
    pub fn drag_to(&mut self, x: f32, y: f32, rotation: &mut RotationState) -> bool {
        let DragState::Dragging { last } = self.state else {
            return false;
        };
        let dx = x - last.0;
        let dy = y - last.1;
        rotation.rotate_clamped(-dy * self.sensitivity, dx * self.sensitivity, self.max_pitch);
        self.state = DragState::Dragging { last: (x, y) };
        true
    }

    pub fn release(&mut self) {
        self.state = DragState::Idle;
    }
}

/// Hover scalar eased toward 0 or 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverReveal {
    value: f32,
    target: f32,
    lerp: f32,
}

impl HoverReveal {
    pub fn new(lerp: f32) -> Self {
        Self {
            value: 0.0,
            target: 0.0,
            lerp: lerp.clamp(0.0, 1.0),
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        self.target = if hovered { 1.0 } else { 0.0 };
    }

    /// Advance one frame
    pub fn tick(&mut self) -> f32 {
        self.value += (self.target - self.value) * self.lerp;
        self.value = self.value.clamp(0.0, 1.0);
        self.value
    }
}

/// Drives rotation and hover from pointer input
#[derive(Debug, Clone)]
pub struct InteractionController {
    pub rotation: RotationState,
    drag: DragRotation,
    hover: HoverReveal,
    pointer: Option<(f32, f32)>,
    viewport: (u32, u32),
    sensitivity: f32,
    max_pitch: f32,
}

impl InteractionController {
    pub fn new(params: &InteractionParams, width: u32, height: u32) -> Self {
        Self {
            rotation: RotationState::zero(),
            drag: DragRotation::new(params.drag_sensitivity, params.max_pitch()),
            hover: HoverReveal::new(params.hover_lerp),
            pointer: None,
            viewport: (width.max(1), height.max(1)),
            sensitivity: params.drag_sensitivity,
            max_pitch: params.max_pitch(),
        }
    }

    pub fn handle(&mut self, event: &InputEvent) {
        if let InputEvent::Resize { width, height } = *event {
            self.viewport = (width.max(1), height.max(1));
        }
        for action in normalize(event) {
            self.apply(action);
        }
    }

    pub fn apply(&mut self, action: PointerAction) {
        match action {
            PointerAction::Press { x, y } => {
                self.pointer = Some((x, y));
                self.drag.press(x, y);
            }
            PointerAction::Move { x, y } => {
                self.pointer = Some((x, y));
                if self.drag.drag_to(x, y, &mut self.rotation) {
                    trace!("Rotation pitch={:.3} yaw={:.3}", self.rotation.pitch, self.rotation.yaw);
                }
            }
            PointerAction::Release => self.drag.release(),
            PointerAction::Leave => self.pointer = None,
        }
    }

    /// Rotate by a number of drag-pixel steps, as a keyboard would
    pub fn nudge(&mut self, dx: f32, dy: f32) {
        self.rotation
            .rotate_clamped(-dy * self.sensitivity, dx * self.sensitivity, self.max_pitch);
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Pointer in normalized device coordinates; `None` when off the canvas
    pub fn pointer_ndc(&self) -> Option<(f32, f32)> {
        let (x, y) = self.pointer?;
        let (w, h) = (self.viewport.0 as f32, self.viewport.1 as f32);
        Some((x / w * 2.0 - 1.0, -(y / h) * 2.0 + 1.0))
    }

    pub fn hover(&self) -> f32 {
        self.hover.value()
    }

    /// Whether the hover scalar is currently heading toward 1
    pub fn hover_targeted(&self) -> bool {
        self.hover.target() > 0.5
    }

    /// Set this frame's hover target and advance the hover scalar
    pub fn update_hover(&mut self, hovered: bool) -> f32 {
        self.hover.set_hovered(hovered);
        self.hover.tick()
    }
}
