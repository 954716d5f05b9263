//! Colors for sockets and connections.

use nodal_core::PortType;

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB` (the `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        if bytes.len() != 6 {
            return None;
        }
        let r = hex_val(bytes[0])? << 4 | hex_val(bytes[1])?;
        let g = hex_val(bytes[2])? << 4 | hex_val(bytes[3])?;
        let b = hex_val(bytes[4])? << 4 | hex_val(bytes[5])?;
        Some(Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            1.0,
        ))
    }
}

pub const LIGHT_GRAY: Color = Color::rgba(0.827, 0.827, 0.827, 1.0);

/// Socket color of a port type; unknown types are light gray.
pub fn socket_color(port_type: PortType) -> Color {
    let hex = match port_type.as_str() {
        "Matrix3" | "Matrix4" => "#cc6666",
        "Vector2" | "Vector3" => "#b5bd68",
        "Quaternion" => "#b294bb",
        "bool" => "#de935f",
        "float" => "#8abeb7",
        "int" => "#81a2be",
        "str" => "#f0c674",
        _ => return LIGHT_GRAY,
    };
    Color::from_hex(hex).unwrap_or(LIGHT_GRAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types_have_colors() {
        let int = socket_color(PortType::intern("int"));
        assert!((int.r - 0x81 as f32 / 255.0).abs() < 1e-6);
        assert_eq!(
            socket_color(PortType::intern("Vector2")),
            socket_color(PortType::intern("Vector3"))
        );
    }

    #[test]
    fn unknown_type_is_gray() {
        assert_eq!(socket_color(PortType::intern("Mesh")), LIGHT_GRAY);
    }

    #[test]
    fn rejects_short_hex() {
        assert!(Color::from_hex("#abc").is_none());
    }
}
