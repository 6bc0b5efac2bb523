use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::randr::{self, ConnectionExt as RandrExt};
use x11rb::properties::WmSizeHints;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::backend::{DisplayRegistry, WindowSystem};
use crate::constants::{randr as randr_consts, x11};
use crate::display::Display;
use crate::geometry::Rect;
use crate::window::{is_eligible, WindowId, WindowInfo};

/// Pre-cached X11 atoms to avoid repeated roundtrips
pub struct CachedAtoms {
    pub wm_name: Atom,
    pub net_wm_name: Atom,
    pub utf8_string: Atom,
    pub net_wm_pid: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_hidden: Atom,
    pub net_client_list: Atom,
    pub net_client_list_stacking: Atom,
    pub net_frame_extents: Atom,
}

fn intern(conn: &RustConnection, name: &str) -> Result<Atom> {
    Ok(conn
        .intern_atom(false, name.as_bytes())
        .context(format!("Failed to intern {} atom", name))?
        .reply()
        .context(format!("Failed to get reply for {} atom", name))?
        .atom)
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        Ok(Self {
            wm_name: intern(conn, "WM_NAME")?,
            net_wm_name: intern(conn, "_NET_WM_NAME")?,
            utf8_string: intern(conn, "UTF8_STRING")?,
            net_wm_pid: intern(conn, "_NET_WM_PID")?,
            net_wm_state: intern(conn, "_NET_WM_STATE")?,
            net_wm_state_hidden: intern(conn, "_NET_WM_STATE_HIDDEN")?,
            net_client_list: intern(conn, "_NET_CLIENT_LIST")?,
            net_client_list_stacking: intern(conn, "_NET_CLIENT_LIST_STACKING")?,
            net_frame_extents: intern(conn, "_NET_FRAME_EXTENTS")?,
        })
    }
}

/// Live X11 session: RandR monitors plus EWMH-managed client windows
pub struct X11Desktop {
    conn: RustConnection,
    root: Window,
    screen_width: u16,
    screen_height: u16,
    atoms: CachedAtoms,
}

impl X11Desktop {
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None)
            .context("Failed to connect to X11 server. Is DISPLAY set correctly?")?;
        let screen = &conn.setup().roots[screen_num];
        let (root, screen_width, screen_height) =
            (screen.root, screen.width_in_pixels, screen.height_in_pixels);
        info!(
            screen = screen_num,
            width = screen_width,
            height = screen_height,
            "Connected to X11 server"
        );

        // Pre-cache atoms once at startup (eliminates roundtrip overhead)
        let atoms = CachedAtoms::new(&conn).context("Failed to cache X11 atoms at startup")?;

        Ok(Self {
            conn,
            root,
            screen_width,
            screen_height,
            atoms,
        })
    }

    /// Monitors from RandR 1.5, or `None` when the server cannot report them
    #[tracing::instrument(skip(self))]
    fn randr_monitors(&self) -> Result<Option<Vec<Display>>> {
        if self
            .conn
            .extension_information(randr::X11_EXTENSION_NAME)
            .context("Failed to query RandR extension")?
            .is_none()
        {
            debug!("RandR extension not present");
            return Ok(None);
        }

        let version = self
            .conn
            .randr_query_version(randr_consts::MAJOR_VERSION, randr_consts::MINOR_VERSION)
            .context("Failed to query RandR version")?
            .reply()
            .context("Failed to get reply for RandR version query")?;
        if (version.major_version, version.minor_version)
            < (randr_consts::MAJOR_VERSION, randr_consts::MINOR_VERSION)
        {
            debug!(
                major = version.major_version,
                minor = version.minor_version,
                "RandR too old for GetMonitors"
            );
            return Ok(None);
        }

        let reply = self
            .conn
            .randr_get_monitors(self.root, true)
            .context("Failed to request RandR monitor list")?
            .reply()
            .context("Failed to get RandR monitor list")?;

        let mut displays = Vec::with_capacity(reply.monitors.len());
        for (index, monitor) in reply.monitors.iter().enumerate() {
            let name = self.atom_name(monitor.name).unwrap_or_else(|e| {
                warn!(index = index, error = %e, "Cannot resolve monitor name");
                format!("monitor-{index}")
            });
            displays.push(Display::new(
                index,
                name,
                monitor.primary,
                Rect::from_origin_size(
                    monitor.x as i32,
                    monitor.y as i32,
                    monitor.width as u32,
                    monitor.height as u32,
                ),
            ));
        }
        Ok(Some(displays))
    }

    fn atom_name(&self, atom: Atom) -> Result<String> {
        let reply = self
            .conn
            .get_atom_name(atom)
            .context(format!("Failed to request name of atom {}", atom))?
            .reply()
            .context(format!("Failed to get name of atom {}", atom))?;
        Ok(String::from_utf8_lossy(&reply.name).into_owned())
    }

    /// Managed top-level windows, bottom-to-top when the WM publishes stacking
    #[tracing::instrument(skip(self))]
    fn client_list(&self) -> Result<Vec<Window>> {
        for atom in [self.atoms.net_client_list_stacking, self.atoms.net_client_list] {
            let prop = self
                .conn
                .get_property(false, self.root, atom, AtomEnum::WINDOW, 0, u32::MAX)
                .context("Failed to query client list property")?
                .reply()
                .context("Failed to get client list from X11 server")?;
            if let Some(windows) = prop.value32() {
                let windows: Vec<Window> = windows.collect();
                if !windows.is_empty() {
                    return Ok(windows);
                }
            }
        }

        debug!("No EWMH client list, falling back to root children");
        Ok(self
            .conn
            .query_tree(self.root)
            .context("Failed to query root window tree")?
            .reply()
            .context("Failed to get root window tree")?
            .children)
    }

    /// Snapshot entry for `window`, or `None` when it is filtered out
    fn inspect(&self, window: Window) -> Result<Option<WindowInfo>> {
        let attrs = self
            .conn
            .get_window_attributes(window)
            .context(format!("Failed to query attributes for window {}", window))?
            .reply()
            .context(format!("Failed to get attributes reply for window {}", window))?;

        // Menus and tooltips are override-redirect; they only show up through
        // the QueryTree fallback
        if attrs.override_redirect {
            return Ok(None);
        }

        let visible = attrs.map_state == MapState::VIEWABLE && !self.is_hidden(window)?;
        if !visible || self.is_own_window(window)? {
            return Ok(None);
        }

        let title = self.title(window)?;
        Ok(is_eligible(visible, title.as_deref())
            .then(|| WindowInfo::new(WindowId(window), title.unwrap_or_default())))
    }

    fn is_hidden(&self, window: Window) -> Result<bool> {
        let prop = self
            .conn
            .get_property(false, window, self.atoms.net_wm_state, AtomEnum::ATOM, 0, 1024)
            .context(format!("Failed to query _NET_WM_STATE for window {}", window))?
            .reply()
            .context(format!("Failed to get _NET_WM_STATE reply for window {}", window))?;
        Ok(prop
            .value32()
            .is_some_and(|mut states| states.any(|s| s == self.atoms.net_wm_state_hidden)))
    }

    fn is_own_window(&self, window: Window) -> Result<bool> {
        let prop = self
            .conn
            .get_property(false, window, self.atoms.net_wm_pid, AtomEnum::CARDINAL, 0, 1)
            .context(format!("Failed to query _NET_WM_PID property for window {}", window))?
            .reply()
            .context(format!("Failed to get _NET_WM_PID reply for window {}", window))?;
        if prop.value.len() < x11::PID_PROPERTY_SIZE {
            return Ok(false);
        }
        let pid = u32::from_ne_bytes(
            prop.value[0..x11::PID_PROPERTY_SIZE]
                .try_into()
                .context("Invalid PID property format (expected 4 bytes)")?,
        );
        Ok(pid == std::process::id())
    }

    /// `_NET_WM_NAME` (UTF-8) with `WM_NAME` as fallback
    fn title(&self, window: Window) -> Result<Option<String>> {
        let net_name = self
            .conn
            .get_property(false, window, self.atoms.net_wm_name, self.atoms.utf8_string, 0, x11::MAX_TITLE_LENGTH)
            .context(format!("Failed to query _NET_WM_NAME property for window {}", window))?
            .reply()
            .context(format!("Failed to get _NET_WM_NAME reply for window {}", window))?;
        if !net_name.value.is_empty() {
            return Ok(Some(String::from_utf8_lossy(&net_name.value).into_owned()));
        }

        let name = self
            .conn
            .get_property(false, window, self.atoms.wm_name, AtomEnum::ANY, 0, x11::MAX_TITLE_LENGTH)
            .context(format!("Failed to query WM_NAME property for window {}", window))?
            .reply()
            .context(format!("Failed to get WM_NAME reply for window {}", window))?;
        if name.value.is_empty() {
            Ok(None)
        } else {
            Ok(Some(String::from_utf8_lossy(&name.value).into_owned()))
        }
    }

    fn frame_extents(&self, window: Window) -> Result<FrameExtents> {
        let prop = self
            .conn
            .get_property(false, window, self.atoms.net_frame_extents, AtomEnum::CARDINAL, 0, 4)
            .context(format!("Failed to query _NET_FRAME_EXTENTS for window {}", window))?
            .reply()
            .context(format!("Failed to get _NET_FRAME_EXTENTS reply for window {}", window))?;
        let values: Vec<u32> = prop.value32().map(|v| v.collect()).unwrap_or_default();
        Ok(FrameExtents::from_property(&values))
    }

    /// `win_gravity` from `WM_NORMAL_HINTS`, NorthWest when unset (ICCCM default)
    fn win_gravity(&self, window: Window) -> Result<Gravity> {
        let hints = WmSizeHints::get_normal_hints(&self.conn, window)
            .context(format!("Failed to query WM_NORMAL_HINTS for window {}", window))?
            .reply()
            .context(format!("Failed to get WM_NORMAL_HINTS reply for window {}", window))?;
        Ok(hints.and_then(|h| h.win_gravity).unwrap_or(Gravity::NORTH_WEST))
    }
}

/// Decoration a reparenting window manager draws around a client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameExtents {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl FrameExtents {
    /// `_NET_FRAME_EXTENTS` is left, right, top, bottom; anything else means no frame
    pub fn from_property(values: &[u32]) -> Self {
        match values {
            [left, right, top, bottom] => Self {
                left: *left,
                right: *right,
                top: *top,
                bottom: *bottom,
            },
            _ => Self::default(),
        }
    }

    /// Outer frame rectangle around a client area given in root coordinates
    pub fn outer_rect(&self, client: Rect) -> Rect {
        Rect::new(
            client.left.saturating_sub_unsigned(self.left),
            client.top.saturating_sub_unsigned(self.top),
            client.right.saturating_add_unsigned(self.right),
            client.bottom.saturating_add_unsigned(self.bottom),
        )
    }

    /// Where the client's x/y must point so the WM puts the frame at `outer`
    ///
    /// The WM keeps the gravity reference point of the requested client
    /// geometry fixed and grows the frame around it (ICCCM 4.1.2.3).
    fn request_origin(&self, outer: Rect, gravity: Gravity) -> (i32, i32) {
        let (horizontal, vertical) = (self.left + self.right, self.top + self.bottom);
        let (dx, dy) = match gravity {
            Gravity::STATIC => (self.left, self.top),
            Gravity::NORTH => (horizontal / 2, 0),
            Gravity::NORTH_EAST => (horizontal, 0),
            Gravity::WEST => (0, vertical / 2),
            Gravity::CENTER => (horizontal / 2, vertical / 2),
            Gravity::EAST => (horizontal, vertical / 2),
            Gravity::SOUTH_WEST => (0, vertical),
            Gravity::SOUTH => (horizontal / 2, vertical),
            Gravity::SOUTH_EAST => (horizontal, vertical),
            _ => (0, 0),
        };
        (
            outer.left.saturating_add_unsigned(dx),
            outer.top.saturating_add_unsigned(dy),
        )
    }
}

/// Move/resize request placing the window's outer frame at `outer`
///
/// Width and height always size the client area, so the frame is taken off
/// them. No sibling and no stack mode: the server keeps the window where it is
/// in the stack, and nothing here maps, raises or activates it.
pub fn bounds_request(outer: Rect, extents: FrameExtents, gravity: Gravity) -> ConfigureWindowAux {
    let (x, y) = extents.request_origin(outer, gravity);
    let width = outer.width() as i64 - extents.left as i64 - extents.right as i64;
    let height = outer.height() as i64 - extents.top as i64 - extents.bottom as i64;
    // X11 rejects zero-sized windows with BadValue
    ConfigureWindowAux::new()
        .x(x)
        .y(y)
        .width(width.clamp(1, u32::MAX as i64) as u32)
        .height(height.clamp(1, u32::MAX as i64) as u32)
}

impl DisplayRegistry for X11Desktop {
    fn list_displays(&self) -> Result<Vec<Display>> {
        match self.randr_monitors()? {
            Some(displays) if !displays.is_empty() => Ok(displays),
            _ => {
                warn!("RandR monitors unavailable, treating the whole screen as one display");
                Ok(vec![Display::new(
                    0,
                    randr_consts::FALLBACK_DISPLAY_NAME,
                    true,
                    Rect::from_origin_size(0, 0, self.screen_width as u32, self.screen_height as u32),
                )])
            }
        }
    }
}

impl WindowSystem for X11Desktop {
    fn enumerate_eligible_windows(&self) -> Result<Vec<WindowInfo>> {
        let candidates = self.client_list().context("Failed to get list of top-level windows")?;
        let mut windows = Vec::new();
        for window in candidates {
            match self.inspect(window) {
                Ok(Some(info)) => windows.push(info),
                Ok(None) => {}
                // Destroyed while we were looking at it
                Err(e) => debug!(window = window, error = %e, "Dropping window from snapshot"),
            }
        }
        Ok(windows)
    }

    fn window_rect(&self, window: WindowId) -> Result<Rect> {
        let geom = self
            .conn
            .get_geometry(window.0)
            .context(format!("Failed to query geometry for window {}", window))?
            .reply()
            .context(format!("Failed to get geometry reply for window {}", window))?;
        // Geometry is relative to the WM frame; translate the client origin to
        // root coordinates and grow it by the decorations
        let origin = self
            .conn
            .translate_coordinates(window.0, self.root, 0, 0)
            .context(format!("Failed to translate coordinates for window {}", window))?
            .reply()
            .context(format!("Failed to get translated coordinates for window {}", window))?;
        let client = Rect::from_origin_size(
            origin.dst_x as i32,
            origin.dst_y as i32,
            geom.width as u32,
            geom.height as u32,
        );
        Ok(self.frame_extents(window.0)?.outer_rect(client))
    }

    fn apply_bounds(&self, window: WindowId, rect: Rect) -> Result<()> {
        let extents = self.frame_extents(window.0)?;
        let gravity = self.win_gravity(window.0)?;
        debug!(window = %window, ?extents, gravity = u32::from(gravity), "Configuring window frame");
        self.conn
            .configure_window(window.0, &bounds_request(rect, extents, gravity))
            .context(format!("Failed to send configure request for window {}", window))?
            .check()
            .context(format!("X11 server rejected configure request for window {}", window))?;
        Ok(())
    }
}
