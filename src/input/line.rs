/*
 *  input/line.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Line reader for serial ttys, capture files and stdin
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
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

use super::InputEvent;

/// Forward every non-empty line of `reader` until EOF or the receiver goes away.
///
/// The port is expected to be configured already (baud rate etc., e.g. via
/// `stty`); a dropped connection simply ends the source.
pub async fn run<R>(reader: R, tx: mpsc::Sender<InputEvent>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!("Received: {}", line);
        if tx.send(InputEvent::Line(line.to_string())).await.is_err() {
            // frame loop has shut down
            return Ok(());
        }
    }

    info!("Input stream closed");
    Ok(())
}
