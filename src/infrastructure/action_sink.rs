//! Pointer Action Sink
//!
//! Turns gestures into mouse actions on the host.

use crate::domain::models::Gesture;
use crate::domain::ports::ActionSink;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Host mouse primitives
pub trait PointerDevice: Send + 'static {
    fn press_left(&mut self) -> anyhow::Result<()>;
    fn release_left(&mut self) -> anyhow::Result<()>;
    fn move_relative(&mut self, dx: i32, dy: i32) -> anyhow::Result<()>;
    fn cursor_position(&mut self) -> anyhow::Result<(i32, i32)>;
    fn set_cursor_position(&mut self, x: i32, y: i32) -> anyhow::Result<()>;
    /// Vertical wheel scroll in notches, positive scrolls up
    fn scroll(&mut self, notches: f64) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerTuning {
    /// Pointer travel of a swipe drag, in pixels
    pub swipe_distance: i32,
    /// Scroll notches per unit of rotation
    pub scroll_multiplier: f64,
}

pub struct PointerActionSink<P: PointerDevice> {
    device: Mutex<P>,
    tuning: PointerTuning,
}

impl<P: PointerDevice> PointerActionSink<P> {
    pub fn new(device: P, tuning: PointerTuning) -> Self {
        Self {
            device: Mutex::new(device),
            tuning,
        }
    }

    fn apply(&self, device: &mut P, gesture: Gesture) -> anyhow::Result<()> {
        let distance = self.tuning.swipe_distance;
        match gesture {
            Gesture::ButtonPress => device.press_left(),
            Gesture::ButtonRelease => device.release_left(),
            Gesture::SwipeLeft => drag(device, -distance, 0),
            Gesture::SwipeRight => drag(device, distance, 0),
            Gesture::SwipeUp => drag(device, 0, -distance),
            Gesture::SwipeDown => drag(device, 0, distance),
            Gesture::Rotation(delta) => {
                device.scroll(delta as f64 * self.tuning.scroll_multiplier)
            }
            Gesture::BatteryLevel(level) => {
                info!("Battery level: {}%", level);
                Ok(())
            }
            Gesture::TouchLeft
            | Gesture::TouchRight
            | Gesture::TouchTop
            | Gesture::TouchBottom
            | Gesture::LongTouchLeft
            | Gesture::LongTouchRight
            | Gesture::LongTouchTop
            | Gesture::LongTouchBottom => {
                debug!("No pointer action for {:?}", gesture);
                Ok(())
            }
        }
    }
}

/// Click-drag by (dx, dy), then put the cursor back where it started
fn drag<P: PointerDevice>(device: &mut P, dx: i32, dy: i32) -> anyhow::Result<()> {
    let (x, y) = device.cursor_position()?;
    device.press_left()?;
    let moved = device.move_relative(dx, dy);
    let released = device.release_left();
    device.set_cursor_position(x, y)?;
    moved.and(released)
}

#[async_trait]
impl<P: PointerDevice> ActionSink for PointerActionSink<P> {
    async fn consume(&self, gesture: Gesture) {
        let mut device = self.device.lock().await;
        if let Err(e) = self.apply(&mut device, gesture) {
            warn!("Pointer action for {:?} failed: {:#}", gesture, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Press,
        Release,
        Move(i32, i32),
        SetPos(i32, i32),
        Scroll(f64),
    }

    #[derive(Default)]
    struct FakePointer {
        calls: std::sync::Arc<std::sync::Mutex<Vec<Call>>>,
        fail_move: bool,
    }

    impl PointerDevice for FakePointer {
        fn press_left(&mut self) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(Call::Press);
            Ok(())
        }
        fn release_left(&mut self) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(Call::Release);
            Ok(())
        }
        fn move_relative(&mut self, dx: i32, dy: i32) -> anyhow::Result<()> {
            if self.fail_move {
                anyhow::bail!("move rejected");
            }
            self.calls.lock().unwrap().push(Call::Move(dx, dy));
            Ok(())
        }
        fn cursor_position(&mut self) -> anyhow::Result<(i32, i32)> {
            Ok((400, 300))
        }
        fn set_cursor_position(&mut self, x: i32, y: i32) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(Call::SetPos(x, y));
            Ok(())
        }
        fn scroll(&mut self, notches: f64) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(Call::Scroll(notches));
            Ok(())
        }
    }

    fn sink(fail_move: bool) -> (PointerActionSink<FakePointer>, std::sync::Arc<std::sync::Mutex<Vec<Call>>>) {
        let pointer = FakePointer {
            fail_move,
            ..Default::default()
        };
        let calls = pointer.calls.clone();
        let tuning = PointerTuning {
            swipe_distance: 50,
            scroll_multiplier: 0.5,
        };
        (PointerActionSink::new(pointer, tuning), calls)
    }

    #[tokio::test]
    async fn test_button_maps_to_left_button() {
        let (sink, calls) = sink(false);
        sink.consume(Gesture::ButtonPress).await;
        sink.consume(Gesture::ButtonRelease).await;
        assert_eq!(*calls.lock().unwrap(), vec![Call::Press, Call::Release]);
    }

    #[tokio::test]
    async fn test_swipe_drags_and_restores_cursor() {
        let (sink, calls) = sink(false);
        sink.consume(Gesture::SwipeUp).await;
        sink.consume(Gesture::SwipeLeft).await;
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                Call::Press,
                Call::Move(0, -50),
                Call::Release,
                Call::SetPos(400, 300),
                Call::Press,
                Call::Move(-50, 0),
                Call::Release,
                Call::SetPos(400, 300),
            ]
        );
    }

    #[tokio::test]
    async fn test_rotation_scrolls_scaled() {
        let (sink, calls) = sink(false);
        sink.consume(Gesture::Rotation(-6)).await;
        assert_eq!(*calls.lock().unwrap(), vec![Call::Scroll(-3.0)]);
    }

    #[tokio::test]
    async fn test_touch_and_battery_have_no_effect() {
        let (sink, calls) = sink(false);
        sink.consume(Gesture::TouchLeft).await;
        sink.consume(Gesture::LongTouchBottom).await;
        sink.consume(Gesture::BatteryLevel(80)).await;
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_still_releases_button() {
        let (sink, calls) = sink(true);
        sink.consume(Gesture::SwipeRight).await;
        assert_eq!(
            *calls.lock().unwrap(),
            vec![Call::Press, Call::Release, Call::SetPos(400, 300)]
        );
    }
}
