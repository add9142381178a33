use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 94, g: 178, b: 255 };
pub const ACCENT: Color = Color::TrueColor { r: 255, g: 196, b: 87 };
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::TrueColor { r: 208, g: 208, b: 208 };
pub const CDN: Color = Color::TrueColor { r: 120, g: 220, b: 140 };
pub const IPV4_ADDR: Color = Color::TrueColor { r: 130, g: 170, b: 255 };
pub const IPV6_ADDR: Color = Color::TrueColor { r: 199, g: 146, b: 234 };
pub const EVIDENCE: Color = Color::TrueColor { r: 160, g: 160, b: 160 };
pub const FAILURE: Color = Color::TrueColor { r: 240, g: 113, b: 120 };
