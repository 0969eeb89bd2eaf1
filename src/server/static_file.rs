//! # Archivos estáticos
//! src/server/static_file.rs

use super::connection::Connection;
use crate::error::{ServerError, ServerResult};
use crate::http::response::DEFAULT_CONTENT_TYPE;
use crate::http::{Request, Response, StatusCode};
use crate::resolve::ResolvedTarget;
use log::{debug, warn};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

/// Tamaño de los bloques con que se copia el archivo al socket
const CHUNK_SIZE: usize = 8192;

/// Content-Type por extensión; sin extensión conocida, `text/html`
pub fn content_type(path: &Path) -> &'static str {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

/// Manda `200 OK` y copia el archivo tal cual hasta EOF.
///
/// Solo falla (`ServerError::Open`) si el archivo no se puede abrir; un
/// error a mitad de la copia ya no tiene cómo reportarse al cliente y
/// solo se loguea.
pub fn serve(conn: &mut Connection, target: &ResolvedTarget, request: &Request) -> ServerResult<()> {
    let file = File::open(&target.path).map_err(|source| ServerError::Open {
        path: request.path().to_string_lossy().into_owned(),
        source,
    })?;

    let head = Response::new(StatusCode::Ok)
        .with_header("Content-Type", content_type(&target.path))
        .head_bytes();

    match send(conn, &head, file) {
        Ok(bytes) => debug!("sent {} bytes from {}", bytes, target.path.display()),
        Err(e) => warn!("   ❌ transfer interrupted: {}", e),
    }
    Ok(())
}

fn send(conn: &mut Connection, head: &[u8], file: File) -> io::Result<u64> {
    let writer = conn.writer();
    writer.write_all(head)?;
    let mut source = BufReader::with_capacity(CHUNK_SIZE, file);
    let copied = io::copy(&mut source, writer)?;
    writer.flush()?;
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::TargetKind;
    use std::io::Read;
    use std::net::{TcpListener, TcpStream};
    use std::time::Duration;

    #[test]
    fn test_content_type_by_extension() {
        assert_eq!(content_type(Path::new("/www/index.html")), "text/html");
        assert_eq!(content_type(Path::new("/www/style.css")), "text/css");
        assert_eq!(content_type(Path::new("/www/logo.png")), "image/png");
    }

    #[test]
    fn test_content_type_fallback() {
        assert_eq!(content_type(Path::new("/www/README")), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_unopenable_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (stream, _) = listener.accept().unwrap();
        let mut conn = Connection::new(stream, Some(Duration::from_secs(5))).unwrap();

        // Resuelto antes, pero borrado antes de abrirse
        let target = ResolvedTarget {
            path: dir.path().join("gone.html"),
            kind: TargetKind::StaticFile,
        };
        let request = Request::parse(b"GET /gone.html HTTP/1.0\r\n\r\n").unwrap();

        let err = serve(&mut conn, &target, &request).unwrap_err();
        assert!(matches!(err, ServerError::Open { ref path, .. } if path == "/gone.html"));
        assert_eq!(err.status_code(), StatusCode::InternalServerError);

        conn.write_error(&err).unwrap();
        conn.close();

        let mut client = client;
        client.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        let text = String::from_utf8_lossy(&buf);

        assert!(text.starts_with("HTTP/1.0 500 Internal Server Error\r\n"), "got: {}", text);
        assert!(text.contains("Cannot open /gone.html: "));
        assert!(!text.contains("200 OK"));
    }
}
