/*
 *  tests/display_integration.rs
 *
 *  Integration tests for the frame pipeline on a mock surface
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 */

use std::time::{Duration, Instant};

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use tokio::sync::mpsc;

use florafade::app::{run_frame_loop, Installation};
use florafade::assets::AssetSet;
use florafade::config::Config;
use florafade::controls::Control;
use florafade::display::compositor::BACKGROUND_FALLBACK;
use florafade::display::{DisplayError, DisplaySurface, MockDriver};
use florafade::input::InputEvent;

/// 200x100 physical, two 100 wide monitors and a 10 px gutter
fn small_config() -> Config {
    let mut config = Config::default();
    config.channel_count = 2;
    config.display.canvas_width = 200;
    config.display.height = 100;
    config.display.bezel_width = 10;
    config.timing.rise_tau_ms = 0.0;
    config.timing.fall_tau_ms = 0.0;
    config
}

fn installation(config: &Config, now: Instant) -> Installation {
    Installation::new(config, Box::new(AssetSet::default()), now)
}

#[test]
fn test_present_blits_both_monitors() {
    let config = small_config();
    let t0 = Instant::now();
    let mut app = installation(&config, t0);
    let mut driver = MockDriver::new(200, 100);

    assert!(app.tick(None, t0, &mut driver).unwrap());

    let state = driver.state();
    let state = state.lock().unwrap();
    assert_eq!(
        state.blits,
        vec![
            (Rectangle::new(Point::zero(), Size::new(100, 100)), Point::zero()),
            (Rectangle::new(Point::new(110, 0), Size::new(100, 100)), Point::new(100, 0)),
        ]
    );
    assert_eq!(state.flush_count, 1);
    drop(state);

    // no background asset, gray everywhere
    assert_eq!(driver.get_pixel(0, 0), Some(BACKGROUND_FALLBACK));
    assert_eq!(driver.get_pixel(199, 99), Some(BACKGROUND_FALLBACK));
}

#[test]
fn test_settled_frames_are_skipped() {
    let config = small_config();
    let t0 = Instant::now();
    let mut app = installation(&config, t0);
    let mut driver = MockDriver::new(200, 100);

    assert!(app.tick(None, t0, &mut driver).unwrap());
    assert!(!app.tick(None, t0 + Duration::from_millis(16), &mut driver).unwrap());

    // an operator key makes the next frame differ
    app.apply(Control::ToggleCalibration);
    assert!(app.tick(None, t0 + Duration::from_millis(32), &mut driver).unwrap());
    assert_eq!(driver.state().lock().unwrap().flush_count, 2);
}

#[test]
fn test_covered_sensor_shows_placeholder() {
    let config = small_config();
    let t0 = Instant::now();
    let mut app = installation(&config, t0);
    let mut driver = MockDriver::new(200, 100);

    app.tick(Some(InputEvent::Line("[0,0,1,0]".into())), t0, &mut driver).unwrap();
    assert!(!app.engine().channels()[0].visible);

    app.tick(None, t0 + Duration::from_millis(130), &mut driver).unwrap();
    assert!(app.engine().channels()[0].visible);

    // slot 0 is centered at x = 40 + 65 / 2 on the left monitor
    let px = driver.get_pixel(72, 30).unwrap();
    assert!(px.r() > BACKGROUND_FALLBACK.r());
    assert_eq!(driver.get_pixel(190, 30), Some(BACKGROUND_FALLBACK));
}

#[test]
fn test_bezel_controls_move_right_source() {
    let config = small_config();
    let t0 = Instant::now();
    let mut app = installation(&config, t0);
    let mut driver = MockDriver::new(200, 100);

    app.apply(Control::IncreaseBezel);
    app.apply(Control::IncreaseBezel);
    app.apply(Control::DecreaseBezel);
    assert_eq!(app.compositor().geometry().bezel_width, 11);

    app.tick(None, t0, &mut driver).unwrap();
    let state = driver.state();
    let state = state.lock().unwrap();
    assert_eq!(state.blits[1].0.top_left, Point::new(111, 0));
    assert_eq!(state.blits[1].1, Point::new(100, 0));
}

#[test]
fn test_flush_failure_is_reported() {
    let config = small_config();
    let t0 = Instant::now();
    let mut app = installation(&config, t0);
    let mut driver = MockDriver::new(200, 100);
    driver.state().lock().unwrap().simulate_flush_failure = true;

    assert!(matches!(app.tick(None, t0, &mut driver), Err(DisplayError::Other(_))));
}

#[test]
fn test_frame_after_failed_flush_is_presented_again() {
    let config = small_config();
    let t0 = Instant::now();
    let mut app = installation(&config, t0);
    let mut driver = MockDriver::new(200, 100);
    let state = driver.state();

    assert!(app.tick(None, t0, &mut driver).unwrap());
    app.apply(Control::ToggleCalibration);
    state.lock().unwrap().simulate_flush_failure = true;
    assert!(app.tick(None, t0 + Duration::from_millis(16), &mut driver).is_err());

    // channels are settled, the calibration frame is still owed
    state.lock().unwrap().simulate_flush_failure = false;
    assert!(app.tick(None, t0 + Duration::from_millis(32), &mut driver).unwrap());
    assert_eq!(state.lock().unwrap().flush_count, 3);
    // right seam lands on the first column of the right monitor
    assert_eq!(driver.get_pixel(100, 50), Some(Rgb888::WHITE));

    assert!(!app.tick(None, t0 + Duration::from_millis(48), &mut driver).unwrap());
}

#[test]
fn test_mismatched_monitor_widths_fit_surface() {
    let mut config = small_config();
    config.display.left_width = Some(100);
    config.display.right_width = Some(100);
    let t0 = Instant::now();
    let mut app = installation(&config, t0);
    let mut driver = MockDriver::new(160, 100);
    assert_eq!(app.compositor().rebuilds(), 1);

    assert!(app.tick(None, t0, &mut driver).unwrap());
    let g = app.compositor().geometry();
    assert_eq!((g.left_width, g.bezel_width, g.right_width), (80, 10, 80));
    assert_eq!(app.compositor().rebuilds(), 2);
    {
        let state = driver.state();
        let state = state.lock().unwrap();
        assert_eq!(state.blits[1].0.top_left, Point::new(90, 0));
        assert_eq!(state.blits[1].1, Point::new(80, 0));
    }

    // settled on the new split, no further rebuilds
    for i in 1..5 {
        app.tick(None, t0 + Duration::from_millis(16 * i), &mut driver).unwrap();
    }
    assert_eq!(app.compositor().rebuilds(), 2);

    app.apply(Control::ToggleCalibration);
    assert!(app.tick(None, t0 + Duration::from_millis(100), &mut driver).unwrap());
    assert_eq!(app.compositor().rebuilds(), 2);
}

#[tokio::test]
async fn test_frame_loop_quits_on_key() {
    let config = small_config();
    let driver = MockDriver::new(200, 100);
    let state = driver.state();
    driver.press(Control::Quit);

    let (_input_tx, input_rx) = mpsc::channel::<InputEvent>(4);
    let (_controls_tx, controls_rx) = mpsc::channel::<Control>(4);
    let surface: Box<dyn DisplaySurface> = Box::new(driver);

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        run_frame_loop(
            installation(&config, Instant::now()),
            surface,
            input_rx,
            controls_rx,
            50,
            std::future::pending::<()>(),
        ),
    )
    .await;

    assert!(matches!(result, Ok(Ok(()))));
    let state = state.lock().unwrap();
    assert_eq!(state.init_count, 1);
    // once at start, once on the way out
    assert_eq!(state.clear_count, 2);
}

#[tokio::test]
async fn test_frame_loop_survives_flush_failures() {
    let config = small_config();
    let driver = MockDriver::new(200, 100);
    let state = driver.state();
    state.lock().unwrap().simulate_flush_failure = true;
    driver.press(Control::ToggleHud);

    let (_input_tx, input_rx) = mpsc::channel::<InputEvent>(4);
    let (_controls_tx, controls_rx) = mpsc::channel::<Control>(4);
    let surface: Box<dyn DisplaySurface> = Box::new(driver);

    let result = run_frame_loop(
        installation(&config, Instant::now()),
        surface,
        input_rx,
        controls_rx,
        50,
        tokio::time::sleep(Duration::from_millis(100)),
    )
    .await;

    assert!(result.is_ok());
    assert!(state.lock().unwrap().flush_count >= 2);
}
