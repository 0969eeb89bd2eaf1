//! # Manejo de una conexión
//! src/server/connection.rs
//!
//! Máquina de estados por conexión:
//!
//! ```text
//! Start → ParsingRequest → ResolvingPath → { Serving | Executing | Erroring } → Closed
//! ```
//!
//! Todo lo que necesita un handler viaja en `ServeContext` (solo lectura,
//! compartido) y `Connection` (exclusiva del thread). No hay estado global.

use super::{cgi, static_file};
use crate::error::{ServerError, ServerResult};
use crate::http::{Request, Response};
use crate::metrics::Outcome;
use crate::resolve::{resolve, TargetKind};
use log::{debug, info, warn};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::os::fd::OwnedFd;
use std::path::PathBuf;
use std::time::Duration;

/// Cuánto se espera al drenar input pendiente antes de cerrar
const LINGER_TIMEOUT: Duration = Duration::from_millis(100);

/// Máximo de bytes que se descartan al drenar
const LINGER_MAX_BYTES: usize = 64 * 1024;

/// Configuración de solo lectura que comparten todas las conexiones
#[derive(Debug, Clone)]
pub struct ServeContext {
    /// Document root canonizado
    pub root: PathBuf,
    pub max_line: usize,
    pub read_timeout: Option<Duration>,
}

/// Stream de una conexión aceptada.
///
/// `close` consume la conexión, así que se cierra una sola vez; si un
/// camino retorna antes, `Drop` de los streams cierra el socket igual.
pub struct Connection {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Connection {
    pub fn new(stream: TcpStream, read_timeout: Option<Duration>) -> io::Result<Self> {
        stream.set_read_timeout(read_timeout)?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            reader,
            writer: BufWriter::new(stream),
        })
    }

    pub fn reader(&mut self) -> &mut BufReader<TcpStream> {
        &mut self.reader
    }

    pub fn writer(&mut self) -> &mut BufWriter<TcpStream> {
        &mut self.writer
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Descriptor duplicado del socket, para el stdout/stderr de un hijo
    pub fn output_fd(&self) -> io::Result<OwnedFd> {
        self.writer.get_ref().try_clone().map(OwnedFd::from)
    }

    /// Escribe una página de error completa
    pub fn write_error(&mut self, err: &ServerError) -> io::Result<()> {
        let response = Response::html_error(err.status_code(), &err.to_string());
        debug!("sending {} error page", response.status());
        self.writer.write_all(&response.to_bytes())?;
        self.writer.flush()
    }

    /// Cierra la conexión.
    ///
    /// Después de mandar el FIN se descarta lo que el cliente haya dejado
    /// sin leer; si no, el kernel responde con RST y el cliente puede
    /// perder la respuesta.
    pub fn close(mut self) {
        if let Err(e) = self.writer.flush() {
            debug!("flush on close failed: {}", e);
        }

        let stream = self.writer.get_ref();
        if stream.shutdown(Shutdown::Write).is_err() {
            return;
        }
        if stream.set_read_timeout(Some(LINGER_TIMEOUT)).is_err() {
            return;
        }

        let mut buf = [0u8; 4096];
        let mut drained = 0;
        while drained < LINGER_MAX_BYTES {
            match self.reader.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => drained += n,
            }
        }
    }
}

/// Atiende una conexión completa y la cierra.
///
/// Los errores quedan contenidos acá: se convierten en una página de
/// error y nunca llegan al accept loop.
pub fn handle_connection(stream: TcpStream, ctx: &ServeContext) -> io::Result<Outcome> {
    let mut conn = Connection::new(stream, ctx.read_timeout)?;

    let outcome = match serve(&mut conn, ctx) {
        Ok(outcome) => outcome,
        Err(err) => {
            let status = err.status_code();
            warn!("   ❌ {} ({})", err, status);
            if let Err(e) = conn.write_error(&err) {
                debug!("could not send error page: {}", e);
            }
            Outcome::Error(status)
        }
    };

    conn.close();
    Ok(outcome)
}

/// Parsing, resolución y despacho. Un `Err` significa que todavía no se
/// escribió nada al cliente.
fn serve(conn: &mut Connection, ctx: &ServeContext) -> ServerResult<Outcome> {
    let request = Request::read_from(conn.reader(), ctx.max_line)?;
    info!(
        "   ✅ {} {} {}",
        request.method(),
        request.raw_path().to_string_lossy(),
        request.version()
    );
    if let Some(agent) = request.header("User-Agent") {
        debug!("      user agent: {}", agent.to_string_lossy());
    }

    let target = resolve(&ctx.root, request.path())?;

    match target.kind {
        TargetKind::StaticFile => {
            static_file::serve(conn, &target, &request)?;
            Ok(Outcome::Static)
        }
        TargetKind::Executable => {
            cgi::run(conn, &target, &request)?;
            Ok(Outcome::Cgi)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StatusCode;
    use std::fs;
    use std::net::TcpListener;
    use std::os::unix::fs::PermissionsExt;
    use std::thread;
    use tempfile::TempDir;

    fn context() -> (TempDir, ServeContext) {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        let ctx = ServeContext {
            root,
            max_line: 1024,
            read_timeout: Some(Duration::from_secs(5)),
        };
        (dir, ctx)
    }

    /// Acepta una conexión, manda `raw` desde un cliente y retorna lo que
    /// el cliente recibió junto con el resultado del handler
    fn exchange(ctx: ServeContext, raw: &[u8]) -> (Vec<u8>, Outcome) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().unwrap();

        let t = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handle_connection(stream, &ctx).unwrap()
        });

        let mut client = TcpStream::connect(addr).unwrap();
        client.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
        client.write_all(raw).unwrap();
        client.shutdown(Shutdown::Write).unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        (buf, t.join().unwrap())
    }

    #[test]
    fn test_not_found() {
        let (_dir, ctx) = context();
        let (buf, outcome) = exchange(ctx, b"GET /nonexistent HTTP/1.0\r\n\r\n");
        let text = String::from_utf8_lossy(&buf);

        assert!(text.starts_with("HTTP/1.0 404 Not Found\r\n"));
        assert!(text.contains("<H1>An error occurred</H1>"));
        assert!(text.contains("/nonexistent"));
        assert_eq!(outcome, Outcome::Error(StatusCode::NotFound));
    }

    #[test]
    fn test_parse_error_is_500() {
        let (_dir, ctx) = context();
        let (buf, outcome) = exchange(ctx, b"GETfoo\r\n\r\n");
        let text = String::from_utf8_lossy(&buf);

        assert!(text.starts_with("HTTP/1.0 500 Internal Server Error\r\n"));
        assert!(text.contains("Error parsing request: cannot parse request"));
        assert_eq!(outcome, Outcome::Error(StatusCode::InternalServerError));
    }

    #[test]
    fn test_static_index() {
        let (dir, ctx) = context();
        fs::write(dir.path().join("index.html"), b"<p>home</p>\n").unwrap();

        let (buf, outcome) = exchange(ctx, b"GET / HTTP/1.0\r\n\r\n");
        let text = String::from_utf8_lossy(&buf);

        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(text.ends_with("\r\n\r\n<p>home</p>\n"));
        assert_eq!(outcome, Outcome::Static);
    }

    #[test]
    fn test_cgi_output_verbatim() {
        let (dir, ctx) = context();
        let script = dir.path().join("hello.cgi");
        fs::write(&script, "#!/bin/sh\nprintf 'HTTP/1.0 200 OK\\r\\n\\r\\nHi'\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let (buf, outcome) = exchange(ctx, b"GET /hello.cgi HTTP/1.0\r\n\r\n");

        assert_eq!(buf, b"HTTP/1.0 200 OK\r\n\r\nHi");
        assert_eq!(outcome, Outcome::Cgi);
    }

    #[test]
    fn test_peer_closed_immediately() {
        // El cliente conecta y cierra sin mandar nada: el handler no debe colgarse
        let (_dir, ctx) = context();
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().unwrap();

        let t = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handle_connection(stream, &ctx).unwrap()
        });

        drop(TcpStream::connect(addr).unwrap());

        assert_eq!(t.join().unwrap(), Outcome::Error(StatusCode::InternalServerError));
    }
}
