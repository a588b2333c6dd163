/*
 *  display/emulator_window.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Desktop window for the emulator surface
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

use log::{error, info};
use pixels::{Pixels, SurfaceTexture};
use winit::{
    dpi::PhysicalSize,
    event::{Event, VirtualKeyCode},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};
use winit_input_helper::WinitInputHelper;

use crate::controls::Control;
use crate::display::drivers::emulator::EmulatorState;
use crate::pacer::FrameClock;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const KEYMAP: &[(VirtualKeyCode, Control)] = &[
    (VirtualKeyCode::C, Control::ToggleCalibration),
    (VirtualKeyCode::Plus, Control::IncreaseBezel),
    (VirtualKeyCode::Equals, Control::IncreaseBezel),
    (VirtualKeyCode::NumpadAdd, Control::IncreaseBezel),
    (VirtualKeyCode::Minus, Control::DecreaseBezel),
    (VirtualKeyCode::Underline, Control::DecreaseBezel),
    (VirtualKeyCode::NumpadSubtract, Control::DecreaseBezel),
    (VirtualKeyCode::H, Control::ToggleHud),
];

/// Desktop window showing the presented canvas, scaled down
pub struct EmulatorWindow {
    state: Arc<Mutex<EmulatorState>>,
    clock: FrameClock,
    last_title: Instant,
}

impl EmulatorWindow {
    pub fn new(state: Arc<Mutex<EmulatorState>>) -> Self {
        let now = Instant::now();
        Self { state, clock: FrameClock::new(now), last_title: now }
    }

    fn close(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.closed = true;
        }
    }

    /// Run the window event loop on the calling (main) thread; never returns
    /// normally, the process exits with the window.
    pub fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        let (width, height, scale_down) = {
            let state = self.state.lock().map_err(|e| e.to_string())?;
            (state.width, state.height, state.scale_down)
        };

        let event_loop = EventLoop::new();
        let mut input = WinitInputHelper::new();

        // PhysicalSize avoids Wayland DPI scaling surprises
        let window = WindowBuilder::new()
            .with_title("Florafade Emulator")
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(false)
            .build(&event_loop)?;

        let window_size = window.inner_size();
        let surface_texture = SurfaceTexture::new(window_size.width, window_size.height, &window);
        let mut pixels = Pixels::new(width, height, surface_texture)?;

        info!("Emulator window {}x{} (1/{} scale)", width, height, scale_down);
        info!("Keys: C calibration, +/- bezel, H HUD, Esc/Q quit");

        event_loop.run(move |event, _, control_flow| {
            *control_flow = ControlFlow::Poll;

            if let Event::RedrawRequested(_) = event {
                self.render(pixels.frame_mut());

                if let Err(err) = pixels.render() {
                    error!("pixels.render() failed: {}", err);
                    self.close();
                    *control_flow = ControlFlow::Exit;
                    return;
                }

                let now = Instant::now();
                self.clock.tick(now);
                if now.duration_since(self.last_title) >= Duration::from_secs(1) {
                    self.last_title = now;
                    window.set_title(&format!("Florafade Emulator - {:.1} FPS", self.clock.fps()));
                }
            }

            if input.update(&event) {
                if input.close_requested()
                    || input.key_pressed(VirtualKeyCode::Escape)
                    || input.key_pressed(VirtualKeyCode::Q)
                {
                    self.close();
                    *control_flow = ControlFlow::Exit;
                    return;
                }

                let pressed: Vec<Control> = KEYMAP
                    .iter()
                    .filter(|(key, _)| input.key_pressed(*key))
                    .map(|(_, control)| *control)
                    .collect();
                if !pressed.is_empty() {
                    if let Ok(mut state) = self.state.lock() {
                        state.controls.extend(pressed);
                    }
                }
            }

            window.request_redraw();
        });
    }

    fn render(&self, frame: &mut [u8]) {
        let Ok(state) = self.state.lock() else { return };
        let n = frame.len().min(state.buffer.len());
        frame[..n].copy_from_slice(&state.buffer[..n]);
    }
}
