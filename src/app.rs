/*
 *  app.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  The installation: channel engine, compositor and the frame loop
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use log::{error, info, warn};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::MissedTickBehavior;

use crate::assets::AssetProvider;
use crate::config::{Config, DisplayConfig};
use crate::controls::Control;
use crate::display::{
    Compositor, DisplayCapabilities, DisplayError, DisplaySurface, Hud, VirtualGeometry,
};
use crate::engine::ChannelEngine;
use crate::input::InputEvent;
use crate::pacer::FrameClock;

/// Everything the frame loop mutates, in one place
pub struct Installation {
    display: DisplayConfig,
    engine: ChannelEngine,
    compositor: Compositor,
    assets: Box<dyn AssetProvider + Send>,
    clock: FrameClock,
}

impl Installation {
    pub fn new(config: &Config, assets: Box<dyn AssetProvider + Send>, now: Instant) -> Self {
        let geometry = VirtualGeometry::from_config(&config.display);
        Self {
            display: config.display.clone(),
            engine: ChannelEngine::from_config(config, now),
            compositor: Compositor::new(geometry, config.layout.clone(), config.channel_count),
            assets,
            clock: FrameClock::new(now),
        }
    }

    pub fn engine(&self) -> &ChannelEngine {
        &self.engine
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Returns false for `Quit`
    pub fn apply(&mut self, control: Control) -> bool {
        if control == Control::Quit {
            info!("Quit requested");
            return false;
        }
        self.compositor.apply(control);
        true
    }

    /// Monitor split for a physical canvas of `width` x `height`, keeping
    /// the current gutter. Configured widths that no longer add up to the
    /// surface are scaled to it, keeping their ratio.
    fn geometry_for(&self, width: u32, height: u32) -> VirtualGeometry {
        let display = DisplayConfig { canvas_width: width, height, ..self.display.clone() };
        let (left, _, right) = display.split();
        let bezel = self.compositor.geometry().bezel_width;
        if left + right == width {
            return VirtualGeometry::new(left, bezel, right, height);
        }

        let left_fit = (width as u64 * left as u64 / (left + right).max(1) as u64) as u32;
        warn!(
            "Configured monitors {}+{} do not fill a {} wide surface, using {}+{}",
            left,
            right,
            width,
            left_fit,
            width - left_fit
        );
        VirtualGeometry::new(left_fit, bezel, width - left_fit, height)
    }

    /// One frame: ingest, debounce, fade, relayout if the surface changed
    /// size, then render and present. Returns whether a frame was presented.
    pub fn tick(
        &mut self,
        event: Option<InputEvent>,
        now: Instant,
        surface: &mut dyn DisplaySurface,
    ) -> Result<bool, DisplayError> {
        let dt = self.clock.tick(now);
        self.engine.tick(event, now, dt);

        let (w, h) = surface.dimensions();
        let current = self.compositor.geometry();
        if (w, h) != (current.physical_width(), current.height) {
            info!("Surface is now {}x{}, rebuilding canvas", w, h);
            let geometry = self.geometry_for(w, h);
            self.compositor.reconfigure(geometry);
        }

        if !self.compositor.needs_render(self.engine.channels()) {
            return Ok(false);
        }

        let hud = self.compositor.hud_visible().then(|| {
            Hud::capture(&self.engine, self.clock.fps(), self.compositor.geometry().bezel_width)
        });
        self.compositor.render(self.engine.channels(), &*self.assets, hud.as_ref())?;
        self.compositor.present(surface)?;
        Ok(true)
    }
}

/// Requested frame rate, capped at what the surface can take
pub fn frame_rate(requested: u32, caps: &DisplayCapabilities) -> u32 {
    let cap = caps.max_fps.max(1);
    if requested > cap {
        info!("Surface tops out at {} fps, not {}", cap, requested);
    }
    requested.clamp(1, cap)
}

/// Newest pending update, older ones are dropped unread
pub fn latest_event(rx: &mut mpsc::Receiver<InputEvent>) -> Option<InputEvent> {
    let mut latest = None;
    loop {
        match rx.try_recv() {
            Ok(event) => latest = Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return latest,
        }
    }
}

/// Drive the installation at `fps` until `shutdown` resolves, the operator
/// quits, or the surface goes away.
pub async fn run_frame_loop<S>(
    mut installation: Installation,
    mut surface: Box<dyn DisplaySurface>,
    mut input: mpsc::Receiver<InputEvent>,
    mut controls: mpsc::Receiver<Control>,
    fps: u32,
    shutdown: S,
) -> Result<(), DisplayError>
where
    S: Future<Output = ()>,
{
    surface.init()?;
    surface.clear()?;

    let caps = surface.capabilities().clone();
    let fps = frame_rate(fps, &caps);
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / fps as f64));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Frame loop stopping");
                break;
            }
            _ = ticker.tick() => {
                let mut pressed = if caps.has_controls { surface.poll_controls() } else { Vec::new() };
                while let Ok(c) = controls.try_recv() {
                    pressed.push(c);
                }
                let mut quit = false;
                for control in pressed {
                    quit |= !installation.apply(control);
                }
                if quit {
                    break;
                }
                if surface.is_closed() {
                    info!("Display closed");
                    break;
                }

                let event = latest_event(&mut input);
                match installation.tick(event, Instant::now(), surface.as_mut()) {
                    Ok(_) => {}
                    Err(DisplayError::Closed) => break,
                    // keep going, next frame may succeed
                    Err(e) => error!("Display error: {}", e),
                }
            }
        }
    }

    if let Err(e) = surface.clear().and_then(|_| surface.flush()) {
        warn!("Final clear failed: {}", e);
    }
    Ok(())
}
