//! Minimal hex + ASCII dump for `read` output and `SHOW_HEX` tracing,
//! grouped 16 bytes per line in the conventional `xxd`-style layout.

pub fn dump(base: u32, bytes: &[u8]) -> String {
    let mut out = String::new();
    for (row, chunk) in bytes.chunks(16).enumerate() {
        let addr = base.wrapping_add((row * 16) as u32);
        out.push_str(&format!("{addr:08x}  "));
        for byte in chunk {
            out.push_str(&format!("{byte:02x} "));
        }
        for _ in chunk.len()..16 {
            out.push_str("   ");
        }
        out.push_str(" |");
        for &byte in chunk {
            let c = if byte.is_ascii_graphic() || byte == b' ' {
                byte as char
            } else {
                '.'
            };
            out.push(c);
        }
        out.push_str("|\n");
    }
    out
}
