/// Asset loading with graceful fallback.
///
/// Loaders return `Result`; `Assets::load` matches every failure into a
/// placeholder (solid colour for images, `None` for audio) and logs a
/// warning.  A missing asset never stops the game.
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::imageops::FilterType;
use image::{ImageError, RgbaImage};
use thiserror::Error;
use tracing::{info, warn};

use crate::entities::{Appearance, Rgb, INVADER_HEIGHT, INVADER_WIDTH, PLAYER_HEIGHT, PLAYER_WIDTH};
use crate::geometry::Playfield;

/// Pixels with alpha below this are treated as transparent.
const ALPHA_CUTOFF: u8 = 128;

pub const BACKGROUND_FILE: &str = "background.png";
pub const PLAYER_FILE: &str = "player.png";
pub const INVADER_FILES: [&str; 3] = ["invader0.png", "invader1.png", "invader2.png"];
pub const HIT_SOUND_FILE: &str = "bullet_hit.wav";
pub const MUSIC_FILE: &str = "background.mp3";

pub const PLAYER_FALLBACK: Rgb = Rgb::GREEN;
pub const INVADER_FALLBACK: Rgb = Rgb::CYAN;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("{path} could not be read: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} could not be decoded: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
    #[error("{path} is not a RIFF/WAVE file")]
    NotWave { path: PathBuf },
    #[error("{path} is empty")]
    Empty { path: PathBuf },
}

// ── Images ────────────────────────────────────────────────────────────────────

/// Decoded RGBA bitmap, already scaled to the size it is drawn at.
#[derive(Clone, Debug)]
pub struct Sprite {
    image: RgbaImage,
}

impl Sprite {
    pub fn from_image(image: RgbaImage) -> Self {
        Sprite { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Colour at `(x, y)`, or `None` where the sprite is transparent or the
    /// coordinate is outside the bitmap.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        let px = self.image.get_pixel_checked(x, y)?;
        let [r, g, b, a] = px.0;
        (a >= ALPHA_CUTOFF).then_some(Rgb(r, g, b))
    }
}

/// Decode an image and, if `size` is given, scale it to exactly that size.
pub fn load_image(path: &Path, size: Option<(u32, u32)>) -> Result<Sprite, AssetError> {
    let decoded = image::open(path).map_err(|err| match err {
        ImageError::IoError(source) => AssetError::Io { path: path.to_path_buf(), source },
        source => AssetError::Decode { path: path.to_path_buf(), source },
    })?;
    let scaled = match size {
        Some((w, h)) if (w, h) != (decoded.width(), decoded.height()) => {
            decoded.resize_exact(w, h, FilterType::Nearest)
        }
        _ => decoded,
    };
    Ok(Sprite::from_image(scaled.to_rgba8()))
}

// ── Audio clips ───────────────────────────────────────────────────────────────

/// Encoded audio kept in memory; decoding happens at playback time.
#[derive(Clone, Debug)]
pub struct SoundClip {
    bytes: Arc<[u8]>,
}

impl SoundClip {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, AssetError> {
    let bytes = fs::read(path).map_err(|source| AssetError::Io { path: path.to_path_buf(), source })?;
    if bytes.is_empty() {
        return Err(AssetError::Empty { path: path.to_path_buf() });
    }
    Ok(bytes)
}

/// Load a sound effect.  Only RIFF/WAVE files are accepted.
pub fn load_sound(path: &Path) -> Result<SoundClip, AssetError> {
    let bytes = read_bytes(path)?;
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(AssetError::NotWave { path: path.to_path_buf() });
    }
    Ok(SoundClip { bytes: bytes.into() })
}

/// Load a background music track in any format the audio backend decodes.
pub fn load_music(path: &Path) -> Result<SoundClip, AssetError> {
    Ok(SoundClip { bytes: read_bytes(path)?.into() })
}

// ── Bundle ────────────────────────────────────────────────────────────────────

/// Everything loaded from the assets directory at startup.
#[derive(Clone, Debug)]
pub struct Assets {
    pub background: Option<Arc<Sprite>>,
    pub player: Appearance,
    pub invaders: [Appearance; 3],
    pub hit_sound: Option<SoundClip>,
    pub music: Option<SoundClip>,
}

impl Default for Assets {
    fn default() -> Self {
        Assets {
            background: None,
            player: Appearance::Placeholder(PLAYER_FALLBACK),
            invaders: [
                Appearance::Placeholder(INVADER_FALLBACK),
                Appearance::Placeholder(INVADER_FALLBACK),
                Appearance::Placeholder(INVADER_FALLBACK),
            ],
            hit_sound: None,
            music: None,
        }
    }
}

impl Assets {
    /// Load every asset from `dir`, substituting placeholders for anything
    /// missing or broken.
    pub fn load(dir: &Path, field: Playfield) -> Assets {
        let background = load_image(
            &dir.join(BACKGROUND_FILE),
            Some((field.width as u32, field.height as u32)),
        )
        .map(Arc::new);
        let background = match background {
            Ok(sprite) => Some(sprite),
            Err(err) => {
                warn!(error = %err, "background image unavailable, using plain fill");
                None
            }
        };

        let player = appearance_or(
            &dir.join(PLAYER_FILE),
            (PLAYER_WIDTH as u32, PLAYER_HEIGHT as u32),
            PLAYER_FALLBACK,
        );
        let invaders = INVADER_FILES.map(|file| {
            appearance_or(
                &dir.join(file),
                (INVADER_WIDTH as u32, INVADER_HEIGHT as u32),
                INVADER_FALLBACK,
            )
        });

        let hit_sound = match load_sound(&dir.join(HIT_SOUND_FILE)) {
            Ok(clip) => Some(clip),
            Err(err) => {
                warn!(error = %err, "hit sound unavailable, effects will be silent");
                None
            }
        };
        let music = match load_music(&dir.join(MUSIC_FILE)) {
            Ok(clip) => Some(clip),
            Err(err) => {
                warn!(error = %err, "no background music found, continuing silently");
                None
            }
        };

        let assets = Assets { background, player, invaders, hit_sound, music };
        info!(
            dir = %dir.display(),
            sprites = assets.sprite_count(),
            hit_sound = assets.hit_sound.is_some(),
            music = assets.music.is_some(),
            "assets loaded"
        );
        assets
    }

    /// Number of entity sprites (player + invaders) that decoded.
    pub fn sprite_count(&self) -> usize {
        std::iter::once(&self.player)
            .chain(self.invaders.iter())
            .filter(|look| look.is_sprite())
            .count()
    }
}

fn appearance_or(path: &Path, size: (u32, u32), fallback: Rgb) -> Appearance {
    match load_image(path, Some(size)) {
        Ok(sprite) => Appearance::Sprite(Arc::new(sprite)),
        Err(err) => {
            warn!(error = %err, "sprite unavailable, using fallback shape");
            Appearance::Placeholder(fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn write_png(path: &Path, w: u32, h: u32) {
        let mut img = RgbaImage::new(w, h);
        img.put_pixel(0, 0, Rgba([10, 20, 30, 255]));
        img.save(path).unwrap();
    }

    #[test]
    fn missing_directory_yields_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let assets = Assets::load(&dir.path().join("absent"), Playfield::default());
        assert!(assets.background.is_none());
        assert!(matches!(assets.player, Appearance::Placeholder(PLAYER_FALLBACK)));
        assert!(assets
            .invaders
            .iter()
            .all(|look| matches!(look, Appearance::Placeholder(INVADER_FALLBACK))));
        assert!(assets.hit_sound.is_none());
        assert!(assets.music.is_none());
        assert_eq!(assets.sprite_count(), 0);
    }

    #[test]
    fn sprites_are_scaled_to_entity_size() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join(PLAYER_FILE), 10, 6);
        write_png(&dir.path().join("invader1.png"), 4, 4);

        let assets = Assets::load(dir.path(), Playfield::default());
        let Appearance::Sprite(player) = &assets.player else {
            panic!("player sprite should have loaded");
        };
        assert_eq!((player.width(), player.height()), (50, 30));
        assert!(matches!(assets.invaders[0], Appearance::Placeholder(_)));
        assert!(assets.invaders[1].is_sprite());
        assert_eq!(assets.sprite_count(), 2);
    }

    #[test]
    fn transparent_pixels_read_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.png");
        write_png(&path, 2, 2);
        let sprite = load_image(&path, None).unwrap();
        assert_eq!(sprite.pixel(0, 0), Some(Rgb(10, 20, 30)));
        assert_eq!(sprite.pixel(1, 1), None);
        assert_eq!(sprite.pixel(5, 5), None);
    }

    #[test]
    fn garbage_image_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(load_image(&path, None), Err(AssetError::Decode { .. })));
    }

    #[test]
    fn sound_requires_wave_header() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.wav");
        fs::write(&bad, b"ID3 not a wave file").unwrap();
        assert!(matches!(load_sound(&bad), Err(AssetError::NotWave { .. })));

        let missing = dir.path().join("missing.wav");
        assert!(matches!(load_sound(&missing), Err(AssetError::Io { .. })));
    }
}
