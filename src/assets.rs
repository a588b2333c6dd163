/*
 *  assets.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Channel images and background, PNG via tiny-skia, SVG via resvg
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

//! Image assets for the compositor.
//!
//! Everything is decoded up front into [`Sprite`]s holding premultiplied
//! RGBA8, the layout tiny-skia renders into. A slot whose file is missing or
//! broken is simply `None`; the compositor draws a placeholder for it.

use log::{info, warn};
use resvg::{
    render,
    usvg::{Options as UsvgOptions, Transform, Tree as UsvgTree},
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tiny_skia::Pixmap;

use crate::config::AssetsConfig;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("cannot decode {path}: {msg}")]
    Decode { path: PathBuf, msg: String },
    #[error("SVG parse error in {path}: {msg}")]
    Svg { path: PathBuf, msg: String },
}

/// Decoded image, premultiplied RGBA8, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    pub width: u32,
    pub height: u32,
    data: Vec<u8>,
}

impl Sprite {
    /// `data` must hold `width * height * 4` bytes
    pub fn from_premultiplied(width: u32, height: u32, mut data: Vec<u8>) -> Self {
        data.resize(width as usize * height as usize * 4, 0);
        Self { width, height, data }
    }

    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        let (width, height) = (pixmap.width(), pixmap.height());
        Self { width, height, data: pixmap.take() }
    }

    /// Width over height
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width as usize + x) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }
}

/// Source of renderable images, any slot may be unavailable
pub trait AssetProvider {
    fn image(&self, index: usize) -> Option<&Sprite>;
    fn background(&self) -> Option<&Sprite>;
}

/// Images held in memory, one optional sprite per channel
#[derive(Debug, Clone, Default)]
pub struct AssetSet {
    images: Vec<Option<Sprite>>,
    background: Option<Sprite>,
}

impl AssetSet {
    pub fn new(images: Vec<Option<Sprite>>, background: Option<Sprite>) -> Self {
        Self { images, background }
    }

    /// Load `image_pattern` for every channel plus the background from `dir`.
    /// Failures are logged and leave the slot empty.
    pub fn load(config: &AssetsConfig, channel_count: usize) -> Self {
        let images = (0..channel_count)
            .map(|i| {
                let name = config.image_pattern.replace("{}", &i.to_string());
                load_logged(&config.dir.join(name))
            })
            .collect::<Vec<_>>();

        let background = config
            .background
            .as_ref()
            .and_then(|name| load_logged(&config.dir.join(name)));

        let found = images.iter().filter(|s| s.is_some()).count();
        info!("Loaded {}/{} channel images from {}", found, channel_count, config.dir.display());
        Self { images, background }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl AssetProvider for AssetSet {
    fn image(&self, index: usize) -> Option<&Sprite> {
        self.images.get(index).and_then(Option::as_ref)
    }

    fn background(&self) -> Option<&Sprite> {
        self.background.as_ref()
    }
}

fn load_logged(path: &Path) -> Option<Sprite> {
    match load_sprite(path) {
        Ok(sprite) => {
            info!("Asset {} ({}x{})", path.display(), sprite.width, sprite.height);
            Some(sprite)
        }
        Err(e) => {
            warn!("Asset unavailable: {}", e);
            None
        }
    }
}

/// Decode a PNG or SVG (by extension) into a sprite
pub fn load_sprite(path: &Path) -> Result<Sprite, AssetError> {
    let bytes = fs::read(path).map_err(|source| AssetError::Io { path: path.to_path_buf(), source })?;
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));

    if is_svg {
        decode_svg(&bytes, path)
    } else {
        let pixmap = Pixmap::decode_png(&bytes)
            .map_err(|e| AssetError::Decode { path: path.to_path_buf(), msg: e.to_string() })?;
        Ok(Sprite::from_pixmap(pixmap))
    }
}

/// Rasterise an SVG at its intrinsic size
fn decode_svg(bytes: &[u8], path: &Path) -> Result<Sprite, AssetError> {
    let tree = UsvgTree::from_data(bytes, &UsvgOptions::default())
        .map_err(|e| AssetError::Svg { path: path.to_path_buf(), msg: format!("{:?}", e) })?;

    let size = tree.size();
    let (w, h) = (size.width().ceil() as u32, size.height().ceil() as u32);
    let mut pixmap = Pixmap::new(w, h).ok_or_else(|| AssetError::Decode {
        path: path.to_path_buf(),
        msg: format!("cannot allocate {}x{} pixmap", w, h),
    })?;

    render(&tree, Transform::identity(), &mut pixmap.as_mut());
    Ok(Sprite::from_pixmap(pixmap))
}
