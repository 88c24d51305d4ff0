//! In-memory stand-in for GPU textures

use anyhow::{Context, Result};
use glvideo_core::{TextureId, NO_TEXTURE};
use glvideo_decoder::{DecodedFrame, TextureUploader};
use image::RgbaImage;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

#[derive(Debug, Default)]
struct TextureTable {
    last_id: TextureId,
    textures: HashMap<TextureId, RgbaImage>,
}

/// Keeps uploaded frames as images, keyed by texture id.
///
/// Clones share the same table, so the render loop can read what the
/// session uploaded.
#[derive(Debug, Clone, Default)]
pub struct ImageTextureStore {
    table: Rc<RefCell<TextureTable>>,
}

impl ImageTextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dimensions(&self, texture: TextureId) -> Option<(u32, u32)> {
        self.table
            .borrow()
            .textures
            .get(&texture)
            .map(|image| image.dimensions())
    }

    /// Writes a texture to disk; the format follows the file extension.
    pub fn save(&self, texture: TextureId, path: &Path) -> Result<()> {
        let table = self.table.borrow();
        let image = table
            .textures
            .get(&texture)
            .with_context(|| format!("Unknown texture {texture}"))?;
        image
            .save(path)
            .with_context(|| format!("Failed to save frame to {}", path.display()))
    }
}

impl TextureUploader for ImageTextureStore {
    fn upload(&mut self, frame: &DecodedFrame) -> TextureId {
        let mut table = self.table.borrow_mut();
        table.last_id = table.last_id.wrapping_add(1).max(1);
        let id = table.last_id;
        table.textures.insert(id, frame.image.clone());
        id
    }

    fn release(&mut self, texture: TextureId) {
        if texture != NO_TEXTURE {
            self.table.borrow_mut().textures.remove(&texture);
        }
    }
}
