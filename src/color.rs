//! Colors as seen by drawing surfaces, and their packed 32-bit form used across the C boundary.

/// A color with red, green, blue and alpha channels, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(Serialize, Deserialize)]
pub struct RGBA(pub u8, pub u8, pub u8, pub u8);

impl RGBA {
    /// Fully transparent black. As a foreground color, it means "unset".
    pub const TRANSPARENT : RGBA = RGBA(0, 0, 0, 0);
    /// Default foreground
    pub const BLACK : RGBA = RGBA(0, 0, 0, 0xff);

    /// Decodes a color packed as `0xAARRGGBB`.
    pub const fn from_argb(argb : u32) -> RGBA {
        RGBA(
            (argb >> 16) as u8,
            (argb >> 8)  as u8,
            argb         as u8,
            (argb >> 24) as u8,
        )
    }

    /// Packs the color as `0xAARRGGBB`.
    pub const fn to_argb(self) -> u32 {
        let RGBA(r, g, b, a) = self;
        (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
    }

    /// Is the alpha channel zero?
    pub const fn is_transparent(self) -> bool {
        self.3 == 0
    }

    /// Channels as floats in `[0, 1]`, in the order red, green, blue, alpha.
    pub fn to_unit_floats(self) -> (f64, f64, f64, f64) {
        #[inline]
        fn u8_to_f64(x : u8) -> f64 { f64::from(x) / 255. }
        let RGBA(r, g, b, a) = self;
        (u8_to_f64(r), u8_to_f64(g), u8_to_f64(b), u8_to_f64(a))
    }
}
