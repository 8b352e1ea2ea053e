//! Color to symbol palette
//!
//! The palette maps quantized opaque colors to symbols. It is built offline
//! from a set of candidate symbols with representative colors, persisted as a
//! plain-text table (`<argb> <symbol>` per line) and loaded once per session.

use crate::color::Argb;
use crate::error::RecordError;
use crate::symbol::Symbol;
use crate::texture::Texture;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Bucket width used when none is configured
pub const DEFAULT_BUCKET_SIZE: u8 = 20;

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "gif", "tga"];

/// Errors from loading, saving or building a palette
#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed palette table: {0}")]
    Malformed(#[from] RecordError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("bucket size must be at least 1")]
    InvalidBucketSize,
}

/// A candidate output symbol and its representative color
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolColor {
    pub symbol: Symbol,
    pub color: Argb,
}

impl SymbolColor {
    pub fn new(symbol: impl Into<Symbol>, color: Argb) -> Self {
        Self {
            symbol: symbol.into(),
            color,
        }
    }
}

/// Quantized color → symbol lookup with a fallback symbol
#[derive(Debug, Clone)]
pub struct Palette {
    entries: HashMap<Argb, Symbol>,
    bucket_size: u8,
    default_symbol: Symbol,
}

impl Palette {
    /// An empty palette; every opaque lookup yields `default_symbol`
    pub fn new(bucket_size: u8, default_symbol: impl Into<Symbol>) -> Result<Self, PaletteError> {
        if bucket_size == 0 {
            return Err(PaletteError::InvalidBucketSize);
        }
        Ok(Self {
            entries: HashMap::new(),
            bucket_size,
            default_symbol: default_symbol.into(),
        })
    }

    /// An empty palette with the default bucket size
    pub fn empty(default_symbol: impl Into<Symbol>) -> Self {
        Self {
            entries: HashMap::new(),
            bucket_size: DEFAULT_BUCKET_SIZE,
            default_symbol: default_symbol.into(),
        }
    }

    pub fn bucket_size(&self) -> u8 {
        self.bucket_size
    }

    pub fn default_symbol(&self) -> &Symbol {
        &self.default_symbol
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, key: Argb, symbol: Symbol) {
        self.entries.insert(key, symbol);
    }

    /// Exact table entry for an already-quantized key
    pub fn get(&self, key: Argb) -> Option<&Symbol> {
        self.entries.get(&key)
    }

    /// Entries sorted by key
    pub fn entries(&self) -> Vec<(Argb, &Symbol)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(k, v)| (*k, v)).collect();
        entries.sort_by_key(|(key, _)| *key);
        entries
    }

    /// Snap one channel to the nearest multiple of the bucket, never past the
    /// highest multiple that fits in a byte
    pub fn quantize_channel(channel: u8, bucket_size: u8) -> u8 {
        let bucket = bucket_size.max(1) as u32;
        let rounded = (channel as u32 + bucket / 2) / bucket * bucket;
        rounded.min(255 - 255 % bucket) as u8
    }

    /// Opaque color with every channel quantized
    pub fn quantize(&self, color: Argb) -> Argb {
        let q = |c| Self::quantize_channel(c, self.bucket_size);
        Argb::opaque(q(color.r()), q(color.g()), q(color.b()))
    }

    /// Symbol for `color`: `None` (empty) for anything not fully opaque, else
    /// the table entry for the quantized color or the default symbol
    pub fn lookup(&self, color: Argb) -> Option<Symbol> {
        if !color.is_opaque() {
            return None;
        }
        let symbol = self
            .entries
            .get(&self.quantize(color))
            .unwrap_or(&self.default_symbol);
        Some(symbol.clone())
    }

    /// Fill a palette by matching every quantized color against `candidates`
    ///
    /// Each channel runs over every multiple of the bucket up to the top
    /// bucket; the candidate with the smallest luma-weighted distance wins,
    /// the earliest one on a tie. No candidates leaves the table empty.
    pub fn build(
        candidates: &[SymbolColor],
        bucket_size: u8,
        default_symbol: impl Into<Symbol>,
    ) -> Result<Self, PaletteError> {
        let mut palette = Self::new(bucket_size, default_symbol)?;
        if candidates.is_empty() {
            warn!("Building palette without candidates");
            return Ok(palette);
        }

        let step = bucket_size as usize;
        let top = 255 - 255 % bucket_size;
        for r in (0..=top).step_by(step) {
            for g in (0..=top).step_by(step) {
                for b in (0..=top).step_by(step) {
                    let color = Argb::opaque(r, g, b);
                    if let Some(best) = nearest(candidates, color) {
                        palette.insert(color, best.symbol.clone());
                    }
                }
            }
        }
        debug!(
            "Built palette with {} entries from {} candidates",
            palette.len(),
            candidates.len()
        );
        Ok(palette)
    }

    /// Parse a persisted table
    ///
    /// Keys may be written as unsigned ARGB or as the signed 32-bit form; blank
    /// lines and `#` comments are ignored. Any other malformed line fails.
    pub fn parse(
        text: &str,
        bucket_size: u8,
        default_symbol: impl Into<Symbol>,
    ) -> Result<Self, PaletteError> {
        let mut palette = Self::new(bucket_size, default_symbol)?;
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, symbol) = parse_entry(index + 1, line)?;
            palette.insert(key, symbol);
        }
        Ok(palette)
    }

    pub fn load(
        path: &Path,
        bucket_size: u8,
        default_symbol: impl Into<Symbol>,
    ) -> Result<Self, PaletteError> {
        let text = fs::read_to_string(path)?;
        let palette = Self::parse(&text, bucket_size, default_symbol)?;
        debug!("Loaded {} palette entries from {}", palette.len(), path.display());
        Ok(palette)
    }

    /// Table text, one `<argb> <symbol>` line per entry in key order
    pub fn to_table(&self) -> String {
        let mut out = String::new();
        for (key, symbol) in self.entries() {
            let _ = writeln!(out, "{} {}", key.0, symbol);
        }
        out
    }

    pub fn save(&self, path: &Path) -> Result<(), PaletteError> {
        fs::write(path, self.to_table())?;
        Ok(())
    }
}

fn parse_entry(line_no: usize, line: &str) -> Result<(Argb, Symbol), RecordError> {
    let mut tokens = line.split_whitespace();
    let (Some(key), Some(symbol), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(RecordError::new(line_no, "expected `<argb> <symbol>`"));
    };
    let key = key
        .parse::<u32>()
        .or_else(|_| key.parse::<i32>().map(|signed| signed as u32))
        .map_err(|_| RecordError::new(line_no, format!("invalid color key {key:?}")))?;
    Ok((Argb(key), Symbol::new(symbol)))
}

/// Candidate closest to `color`, the first one on a tie
pub fn nearest(candidates: &[SymbolColor], color: Argb) -> Option<&SymbolColor> {
    let mut best: Option<(&SymbolColor, f32)> = None;
    for candidate in candidates {
        let distance = color.weighted_distance(candidate.color);
        if best.map_or(true, |(_, best_distance)| distance < best_distance) {
            best = Some((candidate, distance));
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// CSV record: `symbol,r,g,b`
#[derive(Debug, Deserialize)]
struct CandidateRecord {
    symbol: String,
    r: u8,
    g: u8,
    b: u8,
}

/// Read candidates from a CSV file with a `symbol,r,g,b` header
pub fn candidates_from_csv(path: &Path) -> Result<Vec<SymbolColor>, PaletteError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut candidates = Vec::new();
    for record in reader.deserialize() {
        let record: CandidateRecord = record?;
        candidates.push(SymbolColor::new(
            record.symbol,
            Argb::opaque(record.r, record.g, record.b),
        ));
    }
    Ok(candidates)
}

/// One candidate per image in `dir`, named by file stem and colored by the
/// image's average
///
/// Images are visited in file-name order; unreadable images are logged and
/// skipped.
pub fn candidates_from_textures(dir: &Path) -> Result<Vec<SymbolColor>, PaletteError> {
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        })
        .collect();
    paths.sort();

    let mut candidates = Vec::new();
    for path in paths {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match Texture::open(&path) {
            Ok(texture) => match texture.average_color() {
                Some(color) => candidates.push(SymbolColor::new(stem, color)),
                None => warn!("Skipping empty image {}", path.display()),
            },
            Err(err) => warn!("Skipping {}: {}", path.display(), err),
        }
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> Palette {
        Palette::new(DEFAULT_BUCKET_SIZE, "stone").expect("valid bucket")
    }

    #[test]
    fn test_quantize_rounds_then_clamps() {
        let q = palette().quantize(Argb::new(255, 37, 202, 9));
        assert_eq!((q.r(), q.g(), q.b()), (40, 200, 0));

        let top = palette().quantize(Argb::opaque(255, 250, 231));
        assert_eq!((top.r(), top.g(), top.b()), (240, 240, 240));
    }

    #[test]
    fn test_quantize_is_fixed_point() {
        let palette = palette();
        for c in 0..=255u8 {
            let once = palette.quantize(Argb::opaque(c, c, c));
            assert_eq!(palette.quantize(once), once, "channel {c}");
        }
    }

    #[test]
    fn test_quantize_other_bucket_sizes() {
        assert_eq!(Palette::quantize_channel(255, 1), 255);
        assert_eq!(Palette::quantize_channel(3, 7), 0);
        assert_eq!(Palette::quantize_channel(4, 7), 7);
        assert_eq!(Palette::quantize_channel(255, 7), 252);
        assert!(Palette::new(0, "stone").is_err());
    }

    #[test]
    fn test_lookup_translucent_is_empty() {
        let mut palette = palette();
        palette.insert(Argb::opaque(0, 0, 0), Symbol::new("coal"));
        assert_eq!(palette.lookup(Argb::new(128, 0, 0, 0)), None);
        assert_eq!(palette.lookup(Argb::new(0, 0, 0, 0)), None);
        assert_eq!(palette.lookup(Argb::new(255, 3, 4, 9)), Some(Symbol::new("coal")));
    }

    #[test]
    fn test_lookup_miss_uses_default() {
        assert_eq!(
            palette().lookup(Argb::opaque(10, 10, 10)),
            Some(Symbol::new("stone"))
        );
    }

    #[test]
    fn test_build_covers_every_bucket() {
        let candidates = vec![
            SymbolColor::new("black", Argb::opaque(0, 0, 0)),
            SymbolColor::new("white", Argb::opaque(255, 255, 255)),
        ];
        let palette = Palette::build(&candidates, 20, "stone").expect("build");
        // 0, 20, ... 240: thirteen steps per channel
        assert_eq!(palette.len(), 13 * 13 * 13);
        assert_eq!(palette.get(Argb::opaque(0, 20, 0)), Some(&Symbol::new("black")));
        assert_eq!(palette.get(Argb::opaque(240, 240, 220)), Some(&Symbol::new("white")));
    }

    #[test]
    fn test_build_uses_luma_weights() {
        // Pure green is closer to white than pure blue under the luma weights
        let candidates = vec![
            SymbolColor::new("black", Argb::opaque(0, 0, 0)),
            SymbolColor::new("white", Argb::opaque(240, 240, 240)),
        ];
        let palette = Palette::build(&candidates, 20, "stone").expect("build");
        assert_eq!(palette.get(Argb::opaque(0, 240, 0)), Some(&Symbol::new("white")));
        assert_eq!(palette.get(Argb::opaque(0, 0, 240)), Some(&Symbol::new("black")));
    }

    #[test]
    fn test_nearest_tie_keeps_first() {
        let candidates = vec![
            SymbolColor::new("first", Argb::opaque(100, 100, 100)),
            SymbolColor::new("second", Argb::opaque(100, 100, 100)),
        ];
        let best = nearest(&candidates, Argb::opaque(90, 90, 90));
        assert_eq!(best.map(|c| c.symbol.as_str()), Some("first"));
        assert!(nearest(&[], Argb::opaque(0, 0, 0)).is_none());
    }

    #[test]
    fn test_table_accepts_signed_and_unsigned_keys() {
        // -16777216 is opaque black as a signed 32-bit integer
        let text = "# table\n-16777216 coal\n\n4294967295 snow\n";
        let palette = Palette::parse(text, 20, "stone").expect("parse");
        assert_eq!(palette.get(Argb::opaque(0, 0, 0)), Some(&Symbol::new("coal")));
        assert_eq!(palette.get(Argb::opaque(255, 255, 255)), Some(&Symbol::new("snow")));
    }

    #[test]
    fn test_table_rejects_malformed_lines() {
        assert!(matches!(
            Palette::parse("12 stone extra\n", 20, "stone"),
            Err(PaletteError::Malformed(RecordError { line: 1, .. }))
        ));
        assert!(matches!(
            Palette::parse("ok\nnotanumber stone\n", 20, "stone"),
            Err(PaletteError::Malformed(_))
        ));
    }

    #[test]
    fn test_table_writes_sorted_unsigned() {
        let mut palette = palette();
        palette.insert(Argb::opaque(255, 255, 255), Symbol::new("snow"));
        palette.insert(Argb::opaque(0, 0, 0), Symbol::new("coal"));
        assert_eq!(palette.to_table(), "4278190080 coal\n4294967295 snow\n");

        let reparsed = Palette::parse(&palette.to_table(), 20, "stone").expect("parse");
        assert_eq!(reparsed.entries(), palette.entries());
    }

    #[test]
    fn test_candidates_from_csv() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("colors.csv");
        fs::write(&path, "symbol,r,g,b\nsand,219,207,163\ncoal,20,20,20\n").expect("write");
        let candidates = candidates_from_csv(&path).expect("csv");
        assert_eq!(
            candidates,
            vec![
                SymbolColor::new("sand", Argb::opaque(219, 207, 163)),
                SymbolColor::new("coal", Argb::opaque(20, 20, 20)),
            ]
        );

        fs::write(&path, "symbol,r,g,b\nsand,300,0,0\n").expect("write");
        assert!(matches!(candidates_from_csv(&path), Err(PaletteError::Csv(_))));
    }

    #[test]
    fn test_candidates_from_textures() {
        let dir = tempfile::tempdir().expect("tempdir");
        let red = image::RgbaImage::from_pixel(2, 2, image::Rgba([200, 0, 0, 255]));
        red.save(dir.path().join("redstone.png")).expect("save");
        fs::write(dir.path().join("broken.png"), b"garbage").expect("write");
        fs::write(dir.path().join("notes.txt"), b"ignored").expect("write");

        let candidates = candidates_from_textures(dir.path()).expect("scan");
        assert_eq!(
            candidates,
            vec![SymbolColor::new("redstone", Argb::opaque(200, 0, 0))]
        );
    }
}
