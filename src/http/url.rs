//! # Decodificación de URLs
//! src/http/url.rs
//!
//! `+` pasa a espacio y `%XX` al byte con ese valor hexadecimal. Todo lo
//! demás se copia igual.
//!
//! La decodificación pierde información a propósito: `+` y `%20` terminan
//! ambos como espacio, así que re-codificar no siempre devuelve el texto
//! original. Para cualquier otro byte, decodificar `%XX` y volver a
//! codificarlo sí es reversible.

/// Decodifica `bytes`; los bytes que no son escapes pasan sin cambios,
/// sean o no UTF-8 válido.
///
/// Un escape incompleto o con dígitos no hexadecimales (`%`, `%4`, `%zz`)
/// se copia literal. La salida nunca es más larga que la entrada.
///
/// # Ejemplo
/// ```
/// use cgi_httpd::http::url::url_decode;
///
/// assert_eq!(url_decode(b"hello%20world+again"), b"hello world again");
/// assert_eq!(url_decode(b"100%"), b"100%");
/// ```
pub fn url_decode(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => match (bytes.get(i + 1), bytes.get(i + 2)) {
                (Some(&hi), Some(&lo)) => match (hex_value(hi), hex_value(lo)) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                },
                _ => {
                    out.push(b'%');
                    i += 1;
                }
            },
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }

    out
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
