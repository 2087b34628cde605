//! Drag session state machine.
//!
//! One pointer gesture at a time moves through
//! `Idle → Armed → Dragging → Resolving → Idle`. The machine knows nothing
//! about the store: it decides what happened and reports it as a
//! [`DragTransition`], and the caller acts on the [`DragEffect`].
//!
//! Events that do not apply in the current state are not errors. They yield a
//! [`DragEffect::Noop`] carrying the reason, so a stray pointer-up after a
//! cancel is harmless.

use crate::error::{BoardError, Result};
use crate::geometry::{self, Point, Rect, DEFAULT_ACTIVATION_DISTANCE};
use crate::types::{CardId, ColumnId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// What kind of entity is being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragKind {
    Card,
    Column,
}

/// The entity picked up by a gesture
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DragItem {
    Card(CardId),
    Column(ColumnId),
}

impl DragItem {
    pub fn kind(&self) -> DragKind {
        match self {
            Self::Card(_) => DragKind::Card,
            Self::Column(_) => DragKind::Column,
        }
    }
}

impl fmt::Display for DragItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Card(id) => write!(f, "card:{id}"),
            Self::Column(id) => write!(f, "column:{id}"),
        }
    }
}

/// The element under the pointer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DropTarget {
    /// A card element
    Card(CardId),
    /// The body of a column (including an empty one)
    Column(ColumnId),
}

impl fmt::Display for DropTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Card(id) => write!(f, "card:{id}"),
            Self::Column(id) => write!(f, "column:{id}"),
        }
    }
}

/// Hover report from the rendering layer: target plus its bounding box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hover {
    pub target: DropTarget,
    pub bounds: Rect,
}

impl Hover {
    pub fn new(target: DropTarget, bounds: Rect) -> Self {
        Self { target, bounds }
    }

    /// Which side of the target the pointer is on. Only cards have sides.
    fn side(&self, pointer: Point) -> bool {
        match self.target {
            DropTarget::Card(_) => geometry::insert_after(pointer, &self.bounds),
            DropTarget::Column(_) => false,
        }
    }
}

/// Identifies one drop whose persistence is outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DropTicket(u64);

impl DropTicket {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DropTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "drop#{}", self.0)
    }
}

/// Why a gesture was cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    Escape,
    SourceUnmounted,
    Programmatic,
}

/// Gesture settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Pointer travel in pixels before a press becomes a drag
    pub activation_distance: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            activation_distance: DEFAULT_ACTIVATION_DISTANCE,
        }
    }
}

impl DragConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.activation_distance.is_finite() || self.activation_distance <= 0.0 {
            return Err(BoardError::invalid_config(
                "activation_distance",
                format!(
                    "must be a positive number of pixels, got {}",
                    self.activation_distance
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DragState {
    Idle,
    /// Pressed but not yet moved past the activation distance
    Armed { item: DragItem, origin: Point },
    Dragging {
        item: DragItem,
        origin: Point,
        current: Point,
        /// Last target and side handed out as an `Over` effect
        last_over: Option<(DropTarget, bool)>,
    },
    /// Dropped; persistence in flight
    Resolving { ticket: DropTicket },
}

impl DragState {
    /// The item under active drag, if any
    pub fn dragged(&self) -> Option<&DragItem> {
        match self {
            Self::Dragging { item, .. } => Some(item),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DragEvent {
    PointerDown { item: DragItem, position: Point },
    PointerMove { position: Point, hover: Option<Hover> },
    PointerUp { position: Point, hover: Option<Hover> },
    Cancel { reason: CancelReason },
    /// Persistence for a drop finished, successfully or not
    Resolved { ticket: DropTicket },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoopReason {
    /// Pointer move/up or cancel with no gesture to act on
    IdleWithoutDrag,
    /// Armed, but the pointer has not travelled far enough
    ThresholdNotReached,
    /// Press while another gesture is still armed or dragging
    DragAlreadyActive,
    /// Still over the target and side last reported
    SameTarget,
    /// Moving through a gap between targets
    NoHoverTarget,
    /// Resolved for a ticket that is not outstanding
    UnknownTicket,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DragEffect {
    Armed {
        item: DragItem,
    },
    DragStarted {
        item: DragItem,
    },
    /// The caller should recompute the placement
    Over {
        item: DragItem,
        target: DropTarget,
        insert_after: bool,
    },
    /// Released over a target
    Dropped {
        item: DragItem,
        target: DropTarget,
        insert_after: bool,
        /// The release target differs from the last `Over`
        retarget: bool,
        ticket: DropTicket,
    },
    /// Released before the activation distance was reached
    Click {
        item: DragItem,
    },
    /// Released over nothing; the caller restores the pre-drag ordering
    Reverted {
        item: DragItem,
    },
    Cancelled {
        item: DragItem,
        reason: CancelReason,
    },
    Resolved {
        ticket: DropTicket,
    },
    Noop {
        reason: NoopReason,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragTransition {
    pub transition_id: u64,
    pub from: DragState,
    pub to: DragState,
    pub effect: DragEffect,
}

/// The single drag session of a board surface
#[derive(Debug, Clone)]
pub struct DragSession {
    state: DragState,
    activation_distance: f64,
    transition_counter: u64,
    ticket_counter: u64,
    outstanding: BTreeSet<DropTicket>,
}

impl Default for DragSession {
    fn default() -> Self {
        Self {
            state: DragState::Idle,
            activation_distance: DEFAULT_ACTIVATION_DISTANCE,
            transition_counter: 0,
            ticket_counter: 0,
            outstanding: BTreeSet::new(),
        }
    }
}

impl DragSession {
    pub fn new(config: DragConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            activation_distance: config.activation_distance,
            ..Self::default()
        })
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn activation_distance(&self) -> f64 {
        self.activation_distance
    }

    /// Whether a gesture is armed or dragging
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            DragState::Armed { .. } | DragState::Dragging { .. }
        )
    }

    /// Drops whose persistence has not been acknowledged yet
    pub fn outstanding(&self) -> impl Iterator<Item = DropTicket> + '_ {
        self.outstanding.iter().copied()
    }

    /// Force the active gesture back to idle. Returns `None` if nothing was
    /// active.
    pub fn force_cancel(&mut self, reason: CancelReason) -> Option<DragTransition> {
        if !self.is_active() {
            return None;
        }
        Some(self.apply(DragEvent::Cancel { reason }))
    }

    /// Feed one event through the machine
    pub fn apply(&mut self, event: DragEvent) -> DragTransition {
        let from = self.state.clone();
        let effect = self.step(event);
        self.transition_counter = self.transition_counter.saturating_add(1);
        DragTransition {
            transition_id: self.transition_counter,
            from,
            to: self.state.clone(),
            effect,
        }
    }

    fn step(&mut self, event: DragEvent) -> DragEffect {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        match (state, event) {
            (
                DragState::Idle | DragState::Resolving { .. },
                DragEvent::PointerDown { item, position },
            ) => {
                self.state = DragState::Armed {
                    item: item.clone(),
                    origin: position,
                };
                DragEffect::Armed { item }
            }
            (
                state @ (DragState::Armed { .. } | DragState::Dragging { .. }),
                DragEvent::PointerDown { .. },
            ) => {
                self.state = state;
                noop(NoopReason::DragAlreadyActive)
            }

            (DragState::Armed { item, origin }, DragEvent::PointerMove { position, .. }) => {
                let distance = self.activation_distance;
                if geometry::exceeds_activation_distance(origin, position, distance) {
                    self.state = DragState::Dragging {
                        item: item.clone(),
                        origin,
                        current: position,
                        last_over: None,
                    };
                    DragEffect::DragStarted { item }
                } else {
                    self.state = DragState::Armed { item, origin };
                    noop(NoopReason::ThresholdNotReached)
                }
            }
            (
                DragState::Dragging {
                    item,
                    origin,
                    last_over,
                    ..
                },
                DragEvent::PointerMove { position, hover },
            ) => {
                let Some(hover) = hover else {
                    self.state = DragState::Dragging {
                        item,
                        origin,
                        current: position,
                        last_over,
                    };
                    return noop(NoopReason::NoHoverTarget);
                };

                let side = hover.side(position);
                let over = (hover.target, side);
                if last_over.as_ref() == Some(&over) {
                    self.state = DragState::Dragging {
                        item,
                        origin,
                        current: position,
                        last_over,
                    };
                    return noop(NoopReason::SameTarget);
                }

                let (target, insert_after) = over.clone();
                self.state = DragState::Dragging {
                    item: item.clone(),
                    origin,
                    current: position,
                    last_over: Some(over),
                };
                DragEffect::Over {
                    item,
                    target,
                    insert_after,
                }
            }

            (DragState::Armed { item, .. }, DragEvent::PointerUp { .. }) => {
                DragEffect::Click { item }
            }
            (
                DragState::Dragging {
                    item, last_over, ..
                },
                DragEvent::PointerUp { position, hover },
            ) => match hover {
                Some(hover) => {
                    let insert_after = hover.side(position);
                    let retarget = last_over.as_ref().map(|(t, a)| (t, *a))
                        != Some((&hover.target, insert_after));
                    self.ticket_counter = self.ticket_counter.saturating_add(1);
                    let ticket = DropTicket(self.ticket_counter);
                    self.outstanding.insert(ticket);
                    self.state = DragState::Resolving { ticket };
                    DragEffect::Dropped {
                        item,
                        target: hover.target,
                        insert_after,
                        retarget,
                        ticket,
                    }
                }
                None => DragEffect::Reverted { item },
            },

            (
                DragState::Armed { item, .. } | DragState::Dragging { item, .. },
                DragEvent::Cancel { reason },
            ) => DragEffect::Cancelled { item, reason },

            (state, DragEvent::Resolved { ticket }) => {
                if !self.outstanding.remove(&ticket) {
                    self.state = state;
                    return noop(NoopReason::UnknownTicket);
                }
                // A newer gesture may already be under way
                self.state = match state {
                    DragState::Resolving { ticket: current } if current == ticket => {
                        DragState::Idle
                    }
                    other => other,
                };
                DragEffect::Resolved { ticket }
            }

            (
                state @ (DragState::Idle | DragState::Resolving { .. }),
                DragEvent::PointerMove { .. }
                | DragEvent::PointerUp { .. }
                | DragEvent::Cancel { .. },
            ) => {
                self.state = state;
                noop(NoopReason::IdleWithoutDrag)
            }
        }
    }
}

fn noop(reason: NoopReason) -> DragEffect {
    DragEffect::Noop { reason }
}
