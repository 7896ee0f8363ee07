//! Blockfall entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent};

    use blockfall::consts::*;
    use blockfall::game::{BlockFall, TouchPhase};
    use blockfall::render::{CanvasSurface, RenderContext};
    use blockfall::services::Services;
    use blockfall::settings::Settings;

    /// Cap on a single frame's delta so a stalled tab cannot step the
    /// simulation by a huge jump
    const MAX_FRAME_MS: f32 = 100.0;

    /// Host state: the game plus the canvas it draws into
    struct Host {
        game: BlockFall,
        surface: CanvasSurface,
        last_time: f64,
        /// Device pixels per logical pixel
        view_scale: f32,
        canvas_width: f32,
        canvas_height: f32,
    }

    impl Host {
        /// Map a canvas-client position to logical screen coordinates
        fn to_logical(&self, x: f32, y: f32, dpr: f32) -> (f32, f32) {
            let scale = self.view_scale / dpr;
            (x / scale, y / scale)
        }

        fn frame(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                ((time - self.last_time) as f32).min(MAX_FRAME_MS)
            } else {
                16.0
            };
            self.last_time = time;

            self.game.update(dt);

            self.surface.save();
            self.surface.scale(self.view_scale, self.view_scale);
            self.game.render(
                &mut self.surface,
                self.canvas_width / self.view_scale,
                self.canvas_height / self.view_scale,
            );
            self.surface.restore();
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Blockfall starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        // Size the backing store for the device pixel ratio
        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width() as f64;
        let client_h = canvas.client_height() as f64;
        let width = (client_w * dpr) as u32;
        let height = (client_h * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .expect("context request failed")
            .expect("no 2d context")
            .dyn_into()
            .expect("not a 2d context");

        // Fit the logical portrait space to the canvas
        let view_scale = (width as f32 / SCREEN_WIDTH).min(height as f32 / SCREEN_HEIGHT);

        let seed = js_sys::Date::now() as u64;
        let game = BlockFall::new(seed, Settings::load(), Services::web());

        let host = Rc::new(RefCell::new(Host {
            game,
            surface: CanvasSurface::new(ctx),
            last_time: 0.0,
            view_scale,
            canvas_width: width as f32,
            canvas_height: height as f32,
        }));

        setup_input_handlers(&canvas, host.clone(), dpr as f32);
        request_animation_frame(host);

        log::info!("Blockfall running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, host: Rc<RefCell<Host>>, dpr: f32) {
        // Mouse
        {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut h = host.borrow_mut();
                let (x, y) = h.to_logical(event.offset_x() as f32, event.offset_y() as f32, dpr);
                h.game.handle_touch(TouchPhase::Began, x, y);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut h = host.borrow_mut();
                let (x, y) = h.to_logical(event.offset_x() as f32, event.offset_y() as f32, dpr);
                h.game.handle_touch(TouchPhase::Moved, x, y);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut h = host.borrow_mut();
                let (x, y) = h.to_logical(event.offset_x() as f32, event.offset_y() as f32, dpr);
                h.game.handle_touch(TouchPhase::Ended, x, y);
            });
            let _ =
                canvas.add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch
        {
            let host = host.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    let mut h = host.borrow_mut();
                    let (x, y) = h.to_logical(
                        touch.client_x() as f32 - rect.left() as f32,
                        touch.client_y() as f32 - rect.top() as f32,
                        dpr,
                    );
                    h.game.handle_touch(TouchPhase::Began, x, y);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let host = host.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    let mut h = host.borrow_mut();
                    let (x, y) = h.to_logical(
                        touch.client_x() as f32 - rect.left() as f32,
                        touch.client_y() as f32 - rect.top() as f32,
                        dpr,
                    );
                    h.game.handle_touch(TouchPhase::Moved, x, y);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let host = host.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                // changedTouches carries the lifted finger's last position
                if let Some(touch) = event.changed_touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    let mut h = host.borrow_mut();
                    let (x, y) = h.to_logical(
                        touch.client_x() as f32 - rect.left() as f32,
                        touch.client_y() as f32 - rect.top() as f32,
                        dpr,
                    );
                    h.game.handle_touch(TouchPhase::Ended, x, y);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(host: Rc<RefCell<Host>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::once(move |time: f64| {
            game_loop(host, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(host: Rc<RefCell<Host>>, time: f64) {
        host.borrow_mut().frame(time);
        request_animation_frame(host);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Blockfall (native) starting...");

    // Headless demo: drive a short scripted session through the public
    // input surface and report the outcome.
    use blockfall::game::{BlockFall, Mode, TouchPhase};
    use blockfall::services::Services;
    use blockfall::settings::Settings;

    let mut game = BlockFall::new(0xB10C_FA11, Settings::default(), Services::noop());

    // Leave the menu
    game.handle_touch(TouchPhase::Began, 100.0, 100.0);
    game.update(16.0);

    // Drag each offered shape toward the middle of the board
    let targets = [(2usize, 2usize), (5, 5), (2, 5)];
    for (i, &(cx, cy)) in targets.iter().enumerate() {
        let Some(origin) = game.slot_origin(i) else { continue };
        let target = game.cell_center(cx, cy);
        game.handle_touch(TouchPhase::Began, origin.x, origin.y);
        game.handle_touch(TouchPhase::Moved, target.x, target.y);
        game.handle_touch(TouchPhase::Ended, target.x, target.y);
        game.update(16.0);
    }

    // Let deferred work (batch respawn, animations) settle
    for _ in 0..40 {
        game.update(16.0);
    }

    println!(
        "demo finished: score {}, lines {}, mode {:?}, {} scene objects",
        game.score(),
        game.lines_cleared(),
        game.mode(),
        game.object_count()
    );
    assert_ne!(game.mode(), Mode::Menu);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
