// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event dispatch.

use alloc::rc::Rc;
use alloc::vec::Vec;

use kurbo::Point;

use crate::cursor::{Cursor, InstancePath};
use crate::error::{Error, PropertyError};
use crate::mark::{MarkId, Vis};
use crate::property::next_id;
use crate::render::Renderer;
use crate::scene::DefState;
use crate::value::Value;

/// Event types, including the pseudo events raised by interactive behaviors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Pointer click.
    Click,
    /// Pointer button pressed.
    MouseDown,
    /// Pointer button released.
    MouseUp,
    /// Pointer moved.
    MouseMove,
    /// Pointer entered a mark.
    MouseOver,
    /// Pointer left a mark.
    MouseOut,
    /// A drag started.
    DragStart,
    /// A drag moved.
    Drag,
    /// A drag ended.
    DragEnd,
    /// A selection started.
    SelectStart,
    /// A selection changed.
    Select,
    /// A selection ended.
    SelectEnd,
    /// An instance became the nearest to the pointer.
    Point,
    /// An instance stopped being the nearest to the pointer.
    Unpoint,
    /// An instance entered during a transition.
    Enter,
    /// An instance exited during a transition.
    Exit,
    /// An application-defined event.
    Custom(&'static str),
}

impl Event {
    /// The event name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::MouseDown => "mousedown",
            Self::MouseUp => "mouseup",
            Self::MouseMove => "mousemove",
            Self::MouseOver => "mouseover",
            Self::MouseOut => "mouseout",
            Self::DragStart => "dragstart",
            Self::Drag => "drag",
            Self::DragEnd => "dragend",
            Self::SelectStart => "selectstart",
            Self::Select => "select",
            Self::SelectEnd => "selectend",
            Self::Point => "point",
            Self::Unpoint => "unpoint",
            Self::Enter => "enter",
            Self::Exit => "exit",
            Self::Custom(name) => name,
        }
    }

    /// Parses an event name; unknown names become [`Event::Custom`].
    pub fn from_name(name: &'static str) -> Self {
        match name {
            "click" => Self::Click,
            "mousedown" => Self::MouseDown,
            "mouseup" => Self::MouseUp,
            "mousemove" => Self::MouseMove,
            "mouseover" => Self::MouseOver,
            "mouseout" => Self::MouseOut,
            "dragstart" => Self::DragStart,
            "drag" => Self::Drag,
            "dragend" => Self::DragEnd,
            "selectstart" => Self::SelectStart,
            "select" => Self::Select,
            "selectend" => Self::SelectEnd,
            "point" => Self::Point,
            "unpoint" => Self::Unpoint,
            "enter" => Self::Enter,
            "exit" => Self::Exit,
            other => Self::Custom(other),
        }
    }
}

/// Keyboard modifiers held during an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift.
    pub shift: bool,
    /// Control.
    pub ctrl: bool,
    /// Alt / option.
    pub alt: bool,
    /// Meta / command.
    pub meta: bool,
}

/// The renderer-side event that triggered a dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawEvent {
    /// Pointer position in canvas coordinates.
    pub position: Point,
    /// Pressed button, if any.
    pub button: Option<u8>,
    /// Held modifiers.
    pub modifiers: Modifiers,
}

impl RawEvent {
    /// A pointer event at `position` with no buttons or modifiers.
    pub fn at(position: impl Into<Point>) -> Self {
        Self {
            position: position.into(),
            ..Self::default()
        }
    }
}

/// An event handler. Returning a mark schedules it for re-rendering once all handlers ran.
pub type Handler = Rc<dyn Fn(&mut EventCtx<'_, '_>) -> Result<Option<MarkId>, PropertyError>>;

#[derive(Debug)]
enum Write {
    Def {
        name: &'static str,
        value: Value,
    },
    Property {
        mark: MarkId,
        name: &'static str,
        value: Value,
    },
}

/// What a handler sees: the resolved instance, the raw event and a queue of writes.
///
/// Writes are applied after every handler ran, so all handlers observe the same state.
#[derive(Debug)]
pub struct EventCtx<'a, 'c> {
    cursor: &'a Cursor<'c>,
    event: Event,
    raw: &'a RawEvent,
    writes: Vec<Write>,
}

impl<'a, 'c> EventCtx<'a, 'c> {
    /// The instance the handler is attached to.
    pub fn cursor(&self) -> &'a Cursor<'c> {
        self.cursor
    }

    /// The dispatched event.
    pub fn event(&self) -> Event {
        self.event
    }

    /// The raw event.
    pub fn raw(&self) -> &'a RawEvent {
        self.raw
    }

    /// The pointer in the local coordinates of the handler's panel.
    pub fn mouse(&self) -> Point {
        self.cursor.mouse(self.raw.position)
    }

    /// Writes a def of the handler's scene. Writing `Null` lets the declaration take over again
    /// on the next render.
    pub fn set_def(&mut self, name: &'static str, value: impl Into<Value>) {
        self.writes.push(Write::Def {
            name,
            value: value.into(),
        });
    }

    /// Sets a constant property on the handler's mark.
    pub fn set(&mut self, name: &'static str, value: impl Into<Value>) {
        let mark = self.cursor.mark();
        self.set_on(mark, name, value);
    }

    /// Sets a constant property on any mark.
    pub fn set_on(&mut self, mark: MarkId, name: &'static str, value: impl Into<Value>) {
        self.writes.push(Write::Property {
            mark,
            name,
            value: value.into(),
        });
    }
}

impl Vis {
    /// Dispatches `event` to the instance at `path`.
    ///
    /// If the instance's mark has no handler for the event, the enclosing panel instances are
    /// tried in turn. All matching handlers of the first mark that has any run in registration
    /// order. Their writes are then applied, and the marks they returned are re-rendered in
    /// order, each once. Returns whether any handler ran.
    pub fn dispatch(
        &mut self,
        event: Event,
        path: &InstancePath,
        raw: RawEvent,
        renderer: &mut dyn Renderer,
    ) -> Result<bool, Error> {
        let mut path = path.clone();
        let handlers = loop {
            let (mark, _) = path.last().ok_or(Error::InvalidPath)?;
            let handlers: Vec<_> = self
                .mark(mark)?
                .handlers
                .iter()
                .filter(|(e, _)| *e == event)
                .map(|(_, h)| h.clone())
                .collect();
            if !handlers.is_empty() {
                break handlers;
            }
            match path.parent() {
                Some(parent) => path = parent,
                None => {
                    tracing::debug!(event = event.name(), "no handler");
                    return Ok(false);
                }
            }
        };

        let (writes, rerender) = self.context(&path, |cursor| {
            let mut ctx = EventCtx {
                cursor,
                event,
                raw: &raw,
                writes: Vec::new(),
            };
            let mut rerender: Vec<MarkId> = Vec::new();
            for handler in &handlers {
                let returned = handler(&mut ctx).map_err(|source| Error::Handler {
                    event: event.name(),
                    source,
                })?;
                if let Some(mark) = returned {
                    if !rerender.contains(&mark) {
                        rerender.push(mark);
                    }
                }
            }
            Ok::<_, Error>((ctx.writes, rerender))
        })??;

        tracing::debug!(
            event = event.name(),
            handlers = handlers.len(),
            writes = writes.len(),
            rerender = rerender.len(),
            "dispatched",
        );

        for write in writes {
            match write {
                Write::Def { name, value } => {
                    let id = if value.is_null() { 0 } else { next_id() };
                    self.scene_mut(&path)?
                        .defs
                        .insert(name, DefState { id, value });
                }
                Write::Property { mark, name, value } => self.set(mark, name, value)?,
            }
        }
        for mark in rerender {
            self.render_mark(mark, renderer)?;
        }
        Ok(true)
    }
}
