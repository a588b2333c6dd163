/*
 *  controls.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Operator controls for on-site calibration
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

use log::{debug, info};
use std::io::BufRead;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    ToggleCalibration,
    IncreaseBezel,
    DecreaseBezel,
    ToggleHud,
    Quit,
}

impl Control {
    /// Key binding, case-insensitive for letters
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'c' => Some(Control::ToggleCalibration),
            '+' | '=' => Some(Control::IncreaseBezel),
            '-' | '_' => Some(Control::DecreaseBezel),
            'h' => Some(Control::ToggleHud),
            'q' => Some(Control::Quit),
            _ => None,
        }
    }

    /// A terminal line holding one or more key characters, e.g. `+++`
    pub fn parse_command(line: &str) -> Vec<Self> {
        line.trim().chars().filter_map(Self::from_key).collect()
    }
}

/// Read operator commands from a terminal while running headless.
///
/// Blocking, meant for its own thread so an idle terminal never holds up
/// shutdown. Ends quietly on EOF or when the frame loop is gone.
pub fn read_commands<R: BufRead>(reader: R, tx: mpsc::Sender<Control>) {
    info!("Operator keys on stdin: c calibration, +/- bezel, h HUD, q quit");
    for line in reader.lines() {
        let Ok(line) = line else { return };
        for control in Control::parse_command(&line) {
            debug!("Control from terminal: {:?}", control);
            if tx.blocking_send(control).is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_bindings() {
        assert_eq!(Control::from_key('C'), Some(Control::ToggleCalibration));
        assert_eq!(Control::from_key('='), Some(Control::IncreaseBezel));
        assert_eq!(Control::from_key('_'), Some(Control::DecreaseBezel));
        assert_eq!(Control::from_key('h'), Some(Control::ToggleHud));
        assert_eq!(Control::from_key('x'), None);
    }

    #[test]
    fn test_parse_command_repeats() {
        assert_eq!(
            Control::parse_command(" ++-c\n"),
            vec![
                Control::IncreaseBezel,
                Control::IncreaseBezel,
                Control::DecreaseBezel,
                Control::ToggleCalibration,
            ]
        );
    }

    #[test]
    fn test_read_commands_from_terminal() {
        let data: &[u8] = b"c\n\n+\nq\n";
        let (tx, mut rx) = mpsc::channel(8);
        read_commands(data, tx);
        assert_eq!(rx.try_recv(), Ok(Control::ToggleCalibration));
        assert_eq!(rx.try_recv(), Ok(Control::IncreaseBezel));
        assert_eq!(rx.try_recv(), Ok(Control::Quit));
        assert!(rx.try_recv().is_err());
    }
}
