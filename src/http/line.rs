//! # Lectura de líneas
//! src/http/line.rs
//!
//! Lee una línea terminada en `\n` (o `\r\n`) del stream de la conexión,
//! con un largo máximo. Nunca trunca: una línea demasiado larga es un
//! error de protocolo.

use crate::error::{ServerError, ServerResult};
use std::io::{self, BufRead, Read};

/// Lee una línea y le quita todos los `\r` y `\n` finales.
///
/// Se retornan los bytes tal cual llegaron, sin pasar por UTF-8.
/// Una línea vacía (`"\r\n"`) es válida y marca el fin de los headers.
/// Si el stream termina antes del terminador se retorna `ServerError::Io`,
/// para distinguirlo de esa línea vacía.
///
/// # Ejemplo
/// ```
/// use cgi_httpd::http::line::read_line;
/// use std::io::Cursor;
///
/// let mut input = Cursor::new(b"GET / HTTP/1.0\r\n\r\n".to_vec());
/// assert_eq!(read_line(&mut input, 1024).unwrap(), b"GET / HTTP/1.0");
/// assert!(read_line(&mut input, 1024).unwrap().is_empty());
/// ```
pub fn read_line<R: BufRead>(reader: &mut R, max_len: usize) -> ServerResult<Vec<u8>> {
    let mut buf = Vec::new();
    // Un byte extra para poder notar que la línea no cabe
    let limit = max_len as u64 + 1;
    let read = reader.by_ref().take(limit).read_until(b'\n', &mut buf)?;

    if buf.last() != Some(&b'\n') {
        if read as u64 == limit {
            return Err(ServerError::protocol(format!(
                "line exceeds {} bytes",
                max_len
            )));
        }
        return Err(ServerError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed before end of line",
        )));
    }

    while matches!(buf.last(), Some(&b'\r') | Some(&b'\n')) {
        buf.pop();
    }

    Ok(buf)
}
