//! In-memory desktop used by the unit tests

use anyhow::{bail, Result};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use x11rb::protocol::xproto::{ConfigureWindowAux, Gravity, StackMode};

use crate::backend::{DisplayRegistry, WindowSystem};
use crate::display::Display;
use crate::geometry::Rect;
use crate::window::{is_eligible, WindowId, WindowInfo};
use crate::x11_utils::{bounds_request, FrameExtents};

struct FakeWindow {
    title: String,
    visible: bool,
    rect: Rect,
}

/// Displays plus a bottom-to-top stack of windows
#[derive(Default)]
pub struct FakeDesktop {
    displays: Vec<Display>,
    windows: RefCell<HashMap<u32, FakeWindow>>,
    stacking: RefCell<Vec<u32>>,
    failing_apply: HashSet<u32>,
    vanishing: HashSet<u32>,
    fail_enumeration: bool,
    enumerate_calls: Cell<usize>,
    applied: RefCell<Vec<u32>>,
}

impl FakeDesktop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_display(mut self, name: &str, bounds: Rect) -> Self {
        let index = self.displays.len();
        self.displays.push(Display::new(index, name, index == 0, bounds));
        self
    }

    pub fn with_window(self, id: u32, title: &str, rect: Rect) -> Self {
        self.insert(id, title, true, rect)
    }

    pub fn with_hidden_window(self, id: u32, title: &str, rect: Rect) -> Self {
        self.insert(id, title, false, rect)
    }

    fn insert(self, id: u32, title: &str, visible: bool, rect: Rect) -> Self {
        self.windows.borrow_mut().insert(
            id,
            FakeWindow {
                title: title.to_string(),
                visible,
                rect,
            },
        );
        self.stacking.borrow_mut().push(id);
        self
    }

    /// The window manager answers `BadWindow` for this window's configure request
    pub fn failing_apply(mut self, id: u32) -> Self {
        self.failing_apply.insert(id);
        self
    }

    /// Window is in the snapshot but destroyed before its geometry is read
    pub fn vanishing(mut self, id: u32) -> Self {
        self.vanishing.insert(id);
        self
    }

    pub fn failing_enumeration(mut self) -> Self {
        self.fail_enumeration = true;
        self
    }

    pub fn rect_of(&self, id: u32) -> Rect {
        self.windows.borrow()[&id].rect
    }

    pub fn stacking_order(&self) -> Vec<u32> {
        self.stacking.borrow().clone()
    }

    pub fn enumerate_calls(&self) -> usize {
        self.enumerate_calls.get()
    }

    pub fn apply_calls(&self) -> usize {
        self.applied.borrow().len()
    }

    /// Apply a configure request the way an undecorated X server would:
    /// geometry from the set fields, restacking only when a stack mode is set
    pub fn configure(&self, id: u32, aux: &ConfigureWindowAux) -> Result<()> {
        let mut windows = self.windows.borrow_mut();
        let Some(w) = windows.get_mut(&id) else {
            bail!("X11 error BadWindow for window {}", WindowId(id));
        };
        let left = aux.x.unwrap_or(w.rect.left);
        let top = aux.y.unwrap_or(w.rect.top);
        let width = aux.width.unwrap_or(w.rect.width() as u32);
        let height = aux.height.unwrap_or(w.rect.height() as u32);
        w.rect = Rect::from_origin_size(left, top, width, height);

        if let Some(mode) = aux.stack_mode {
            let mut stacking = self.stacking.borrow_mut();
            stacking.retain(|other| *other != id);
            if mode == StackMode::BELOW {
                stacking.insert(0, id);
            } else {
                stacking.push(id);
            }
        }
        Ok(())
    }
}

impl DisplayRegistry for FakeDesktop {
    fn list_displays(&self) -> Result<Vec<Display>> {
        Ok(self.displays.clone())
    }
}

impl WindowSystem for FakeDesktop {
    fn enumerate_eligible_windows(&self) -> Result<Vec<WindowInfo>> {
        self.enumerate_calls.set(self.enumerate_calls.get() + 1);
        if self.fail_enumeration {
            bail!("Failed to query _NET_CLIENT_LIST_STACKING property");
        }
        let windows = self.windows.borrow();
        Ok(self
            .stacking
            .borrow()
            .iter()
            .filter_map(|id| {
                let w = &windows[id];
                is_eligible(w.visible, Some(w.title.as_str())).then(|| WindowInfo::new(WindowId(*id), w.title.clone()))
            })
            .collect())
    }

    fn window_rect(&self, window: WindowId) -> Result<Rect> {
        if self.vanishing.contains(&window.0) {
            bail!("X11 error BadWindow for window {}", window);
        }
        match self.windows.borrow().get(&window.0) {
            Some(w) => Ok(w.rect),
            None => bail!("X11 error BadWindow for window {}", window),
        }
    }

    fn apply_bounds(&self, window: WindowId, rect: Rect) -> Result<()> {
        self.applied.borrow_mut().push(window.0);
        if self.failing_apply.contains(&window.0) {
            bail!("X11 error BadWindow for window {}", window);
        }
        self.configure(window.0, &bounds_request(rect, FrameExtents::default(), Gravity::NORTH_WEST))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_restacks_only_with_stack_mode() {
        let desk = FakeDesktop::new()
            .with_window(1, "Bottom", Rect::new(0, 0, 10, 10))
            .with_window(2, "Top", Rect::new(0, 0, 10, 10));

        desk.configure(1, &ConfigureWindowAux::new().x(5)).unwrap();
        assert_eq!(desk.stacking_order(), vec![1, 2]);
        assert_eq!(desk.rect_of(1), Rect::new(5, 0, 15, 10));

        desk.configure(1, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE)).unwrap();
        assert_eq!(desk.stacking_order(), vec![2, 1]);
    }
}
