use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use image::ImageReader;
use tracing::warn;

use super::canvas::{Canvas, Rgba};
use crate::app::Vec2;

const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;
const TEXT_SCALE: i32 = 2;
const GLYPH_ADVANCE: i32 = (GLYPH_WIDTH + 1) * TEXT_SCALE;

struct LoadedSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

/// Lazily loads PNG sprites from an asset root and caches the result,
/// including failures, so a missing file warns once and then stays silent.
pub struct SpriteStore {
    asset_root: PathBuf,
    cache: HashMap<String, Option<LoadedSprite>>,
    warned_missing: HashSet<String>,
}

impl SpriteStore {
    pub fn new(asset_root: PathBuf) -> Self {
        Self {
            asset_root,
            cache: HashMap::new(),
            warned_missing: HashSet::new(),
        }
    }

    fn get_or_load(&mut self, key: &str) -> Option<&LoadedSprite> {
        if !self.cache.contains_key(key) {
            let loaded = self.load(key);
            if loaded.is_none() && self.warned_missing.insert(key.to_string()) {
                warn!(sprite_key = key, "sprite_missing");
            }
            self.cache.insert(key.to_string(), loaded);
        }
        self.cache.get(key).and_then(|entry| entry.as_ref())
    }

    fn load(&self, key: &str) -> Option<LoadedSprite> {
        let path = self.asset_root.join(format!("{key}.png"));
        let image = ImageReader::open(path).ok()?.decode().ok()?.into_rgba8();
        let (width, height) = image.dimensions();
        Some(LoadedSprite {
            width,
            height,
            rgba: image.into_raw(),
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct DrawState {
    offset: Vec2,
    alpha: f32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            alpha: 1.0,
        }
    }
}

/// `Canvas` implementation over a raw RGBA frame, as handed out by `pixels`.
pub struct FrameCanvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
    sprites: &'a mut SpriteStore,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl<'a> FrameCanvas<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32, sprites: &'a mut SpriteStore) -> Self {
        Self {
            frame,
            width,
            height,
            sprites,
            state: DrawState::default(),
            stack: Vec::new(),
        }
    }

    fn fill_rect_px(&mut self, x: i32, y: i32, width: i32, height: i32, color: Rgba) {
        let alpha = self.state.alpha;
        fill_rect_blended(
            self.frame,
            self.width,
            self.height,
            x,
            y,
            width,
            height,
            color,
            alpha,
        );
    }

    fn resolve(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x + self.state.offset.x).round() as i32,
            (y + self.state.offset.y).round() as i32,
        )
    }
}

impl Canvas for FrameCanvas<'_> {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Rgba) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        let (px, py) = self.resolve(x, y);
        self.fill_rect_px(px, py, width.round() as i32, height.round() as i32, color);
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        let (px, py) = self.resolve(x, y);
        let width = width.round() as i32;
        let height = height.round() as i32;
        if width <= 1 || height <= 1 {
            return;
        }
        self.fill_rect_px(px, py, width, 1, color);
        self.fill_rect_px(px, py + height - 1, width, 1, color);
        self.fill_rect_px(px, py, 1, height, color);
        self.fill_rect_px(px + width - 1, py, 1, height, color);
    }

    fn draw_sprite(&mut self, key: &str, x: f32, y: f32) {
        let (px, py) = self.resolve(x, y);
        let alpha = self.state.alpha;
        let Some(sprite) = self.sprites.get_or_load(key) else {
            return;
        };
        for row in 0..sprite.height as i32 {
            for col in 0..sprite.width as i32 {
                let source = ((row * sprite.width as i32 + col) * 4) as usize;
                let color: Rgba = [
                    sprite.rgba[source],
                    sprite.rgba[source + 1],
                    sprite.rgba[source + 2],
                    sprite.rgba[source + 3],
                ];
                blend_pixel(
                    self.frame,
                    self.width,
                    self.height,
                    px + col,
                    py + row,
                    color,
                    alpha,
                );
            }
        }
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, color: Rgba) {
        let (mut px, py) = self.resolve(x, y);
        let alpha = self.state.alpha;
        for ch in text.chars() {
            let glyph = glyph_for(ch);
            for (row_index, row_bits) in glyph.iter().enumerate() {
                let row_bits = *row_bits as i32;
                for col in 0..GLYPH_WIDTH {
                    if row_bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    fill_rect_blended(
                        self.frame,
                        self.width,
                        self.height,
                        px + col * TEXT_SCALE,
                        py + row_index as i32 * TEXT_SCALE,
                        TEXT_SCALE,
                        TEXT_SCALE,
                        color,
                        alpha,
                    );
                }
            }
            px += GLYPH_ADVANCE;
        }
    }

    fn measure_text(&self, text: &str) -> f32 {
        (text.chars().count() as i32 * GLYPH_ADVANCE) as f32
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    fn push(&mut self) {
        self.stack.push(self.state);
    }

    fn pop(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.state.offset = self.state.offset.plus(Vec2::new(dx, dy));
    }
}

#[allow(clippy::too_many_arguments)]
fn fill_rect_blended(
    frame: &mut [u8],
    frame_width: u32,
    frame_height: u32,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    color: Rgba,
    alpha: f32,
) {
    let start_x = x.max(0);
    let start_y = y.max(0);
    let end_x = (x + width).min(frame_width as i32);
    let end_y = (y + height).min(frame_height as i32);
    for py in start_y..end_y {
        for px in start_x..end_x {
            blend_pixel(frame, frame_width, frame_height, px, py, color, alpha);
        }
    }
}

fn blend_pixel(
    frame: &mut [u8],
    frame_width: u32,
    frame_height: u32,
    x: i32,
    y: i32,
    color: Rgba,
    alpha: f32,
) {
    if x < 0 || y < 0 || x >= frame_width as i32 || y >= frame_height as i32 {
        return;
    }
    let coverage = (color[3] as f32 / 255.0) * alpha.clamp(0.0, 1.0);
    if coverage <= 0.0 {
        return;
    }
    let offset = (y as usize * frame_width as usize + x as usize) * 4;
    if offset + 4 > frame.len() {
        return;
    }
    if coverage >= 1.0 {
        frame[offset] = color[0];
        frame[offset + 1] = color[1];
        frame[offset + 2] = color[2];
        frame[offset + 3] = 255;
        return;
    }
    for channel in 0..3 {
        let source = color[channel] as f32;
        let dest = frame[offset + channel] as f32;
        frame[offset + channel] = (source * coverage + dest * (1.0 - coverage)).round() as u8;
    }
    frame[offset + 3] = 255;
}

type Glyph = [u8; GLYPH_HEIGHT as usize];

const SPACE_GLYPH: Glyph = [0b000; 5];

fn glyph_for(ch: char) -> Glyph {
    match ch.to_ascii_uppercase() {
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b110, 0b100, 0b110, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b010, 0b001],
        'R' => [0b110, 0b101, 0b110, 0b110, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b011, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        _ => SPACE_GLYPH,
    }
}
