//! Win32 `SendInput` backed pointer device

use crate::infrastructure::action_sink::PointerDevice;
use tracing::{debug, trace};
use windows::Win32::Foundation::POINT;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP,
    MOUSEEVENTF_MOVE, MOUSEEVENTF_WHEEL, MOUSEINPUT, MOUSE_EVENT_FLAGS,
};
use windows::Win32::UI::WindowsAndMessaging::{GetCursorPos, SetCursorPos};

const WHEEL_DELTA: f64 = 120.0;

pub struct InputSimulator;

impl InputSimulator {
    pub fn new() -> Self {
        Self
    }

    fn send_mouse(&self, flags: MOUSE_EVENT_FLAGS, dx: i32, dy: i32, data: i32) -> anyhow::Result<()> {
        let input = INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx,
                    dy,
                    mouseData: data as u32,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        };

        let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
        if sent != 1 {
            anyhow::bail!("SendInput rejected the event");
        }
        Ok(())
    }
}

impl PointerDevice for InputSimulator {
    fn press_left(&mut self) -> anyhow::Result<()> {
        debug!("Mouse Left Down");
        self.send_mouse(MOUSEEVENTF_LEFTDOWN, 0, 0, 0)
    }

    fn release_left(&mut self) -> anyhow::Result<()> {
        debug!("Mouse Left Up");
        self.send_mouse(MOUSEEVENTF_LEFTUP, 0, 0, 0)
    }

    fn move_relative(&mut self, dx: i32, dy: i32) -> anyhow::Result<()> {
        trace!("Moving mouse by ({}, {})", dx, dy);
        self.send_mouse(MOUSEEVENTF_MOVE, dx, dy, 0)
    }

    fn cursor_position(&mut self) -> anyhow::Result<(i32, i32)> {
        let mut point = POINT::default();
        unsafe {
            GetCursorPos(&mut point)?;
        }
        trace!("Got cursor pos: ({}, {})", point.x, point.y);
        Ok((point.x, point.y))
    }

    fn set_cursor_position(&mut self, x: i32, y: i32) -> anyhow::Result<()> {
        trace!("Setting cursor pos to ({}, {})", x, y);
        unsafe {
            SetCursorPos(x, y)?;
        }
        Ok(())
    }

    fn scroll(&mut self, notches: f64) -> anyhow::Result<()> {
        let amount = (notches * WHEEL_DELTA).round() as i32;
        if amount == 0 {
            return Ok(());
        }
        debug!("Mouse Wheel Scroll: {}", amount);
        self.send_mouse(MOUSEEVENTF_WHEEL, 0, 0, amount)
    }
}
