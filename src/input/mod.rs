/*
 *  input/mod.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Sensor input - event types, line parsing, and the source tasks
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

pub mod line;
pub mod mock;

use log::{info, error};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{InputConfig, InputKind};

/// Sample channel capacity, the frame loop only ever keeps the newest
pub const EVENT_CAPACITY: usize = 64;

/// Why an update was discarded
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("empty line")]
    Empty,
    #[error("expected {expected} values, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("value {index} is not an integer: {token:?}")]
    BadToken { index: usize, token: String },
    #[error("digital bit for channel {channel} must be 0 or 1, got {value}")]
    BitOutOfRange { channel: usize, value: i64 },
}

/// One update from an input source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Unparsed text line, e.g. `[3,4,5,6,7,1,0,1,1,0]`
    Line(String),
    /// Already numeric vector (mock generator)
    Values(Vec<i64>),
}

impl InputEvent {
    pub fn into_sample(self, channel_count: usize) -> Result<Sample, InputError> {
        match self {
            InputEvent::Line(line) => parse_line(&line, channel_count),
            InputEvent::Values(values) => Sample::from_values(&values, channel_count),
        }
    }
}

/// A validated `2N` vector, analog half first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub analog: Vec<i64>,
    pub digital: Vec<u8>,
}

impl Sample {
    pub fn from_values(values: &[i64], channel_count: usize) -> Result<Self, InputError> {
        let expected = channel_count * 2;
        if values.len() != expected {
            return Err(InputError::WrongLength { expected, actual: values.len() });
        }

        let (analog, digital) = values.split_at(channel_count);
        let digital = digital
            .iter()
            .enumerate()
            .map(|(channel, &value)| match value {
                0 | 1 => Ok(value as u8),
                _ => Err(InputError::BitOutOfRange { channel, value }),
            })
            .collect::<Result<Vec<u8>, _>>()?;

        Ok(Self { analog: analog.to_vec(), digital })
    }

    /// Raw bit for `channel`
    #[inline]
    pub fn bit(&self, channel: usize) -> bool {
        self.digital.get(channel).is_some_and(|&b| b == 1)
    }

    pub fn channel_count(&self) -> usize {
        self.digital.len()
    }
}

/// Parse one line of `analog..., digital...`; square brackets are optional.
pub fn parse_line(line: &str, channel_count: usize) -> Result<Sample, InputError> {
    let normalized: String = line
        .trim()
        .chars()
        .filter(|c| *c != '[' && *c != ']')
        .collect();
    if normalized.trim().is_empty() {
        return Err(InputError::Empty);
    }

    let values = normalized
        .split(',')
        .enumerate()
        .map(|(index, token)| {
            let token = token.trim();
            token
                .parse::<i64>()
                .map_err(|_| InputError::BadToken { index, token: token.to_string() })
        })
        .collect::<Result<Vec<i64>, _>>()?;

    Sample::from_values(&values, channel_count)
}

/// Start the configured input source; events arrive on the returned receiver.
pub fn spawn_source(
    config: &InputConfig,
    channel_count: usize,
) -> (mpsc::Receiver<InputEvent>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(EVENT_CAPACITY);

    let handle = match &config.source {
        InputKind::Mock => {
            info!(
                "Input: mock generator at {} Hz, covered probability {}",
                config.update_hz, config.covered_probability
            );
            let generator = mock::MockGenerator::from_os_rng(channel_count, config.covered_probability);
            tokio::spawn(mock::run(generator, config.update_hz, tx))
        }
        InputKind::Stdin => {
            info!("Input: reading lines from stdin");
            tokio::spawn(async move {
                if let Err(e) = line::run(tokio::io::stdin(), tx).await {
                    error!("stdin input stopped: {}", e);
                }
            })
        }
        InputKind::Device { path } => {
            info!("Input: reading lines from {}", path.display());
            let path = path.clone();
            tokio::spawn(async move {
                match tokio::fs::File::open(&path).await {
                    Ok(file) => {
                        if let Err(e) = line::run(file, tx).await {
                            error!("{} input stopped: {}", path.display(), e);
                        }
                    }
                    Err(e) => error!("Failed to open input {}: {}", path.display(), e),
                }
            })
        }
    };

    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bracketed_line() {
        let s = parse_line("[3,4,5,6,7,1,0,1,1,0]", 5).unwrap();
        assert_eq!(s.analog, vec![3, 4, 5, 6, 7]);
        assert_eq!(s.digital, vec![1, 0, 1, 1, 0]);
        assert!(!s.bit(1));
        assert!(s.bit(0));
    }

    #[test]
    fn test_parse_plain_line_with_spaces() {
        let s = parse_line("  512, 3 ,0,1,1023,0,0,0,1,1\r\n", 5).unwrap();
        assert_eq!(s.analog, vec![512, 3, 0, 1, 1023]);
        assert_eq!(s.digital, vec![0, 0, 0, 1, 1]);
    }

    #[test]
    fn test_wrong_length() {
        assert_eq!(
            parse_line("[0,1,0,1,1]", 5),
            Err(InputError::WrongLength { expected: 10, actual: 5 })
        );
    }

    #[test]
    fn test_bad_token() {
        assert_eq!(
            parse_line("1,2,x,4,5,0,0,0,0,0", 5),
            Err(InputError::BadToken { index: 2, token: "x".to_string() })
        );
    }

    #[test]
    fn test_bit_out_of_range() {
        assert_eq!(
            parse_line("1,2,3,4,5,0,2,0,0,0", 5),
            Err(InputError::BitOutOfRange { channel: 1, value: 2 })
        );
    }

    #[test]
    fn test_empty_line() {
        assert_eq!(parse_line("   ", 5), Err(InputError::Empty));
        assert_eq!(parse_line("[]", 5), Err(InputError::Empty));
    }

    #[test]
    fn test_values_event() {
        let ev = InputEvent::Values(vec![9, 9, 1, 0]);
        let s = ev.into_sample(2).unwrap();
        assert_eq!(s.channel_count(), 2);
        assert!(s.bit(0));
        assert!(!s.bit(1));
    }
}
