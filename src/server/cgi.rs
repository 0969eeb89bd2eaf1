//! # Ejecución CGI
//! src/server/cgi.rs
//!
//! Un archivo con el bit de ejecución del dueño se corre como proceso hijo:
//!
//! - `argv[0]` es su propio path, sin más argumentos
//! - stdin: `/dev/null` (GET no tiene body)
//! - stdout y stderr: el socket del cliente
//! - entorno: el del servidor + `QUERY_STRING` + un `HTTP_<NOMBRE>` por header
//!
//! La salida del hijo ES la respuesta HTTP; el servidor no agrega ni
//! valida nada. Las variables se fijan en el `Command` de cada hijo, así
//! que dos conexiones concurrentes nunca ven el entorno de la otra.

use super::connection::Connection;
use crate::error::{ServerError, ServerResult};
use crate::http::Request;
use crate::resolve::ResolvedTarget;
use log::{debug, error};
use std::ffi::{OsStr, OsString};
use std::os::fd::OwnedFd;
use std::path::Path;
use std::process::{Command, Stdio};

pub const QUERY_STRING: &str = "QUERY_STRING";
pub const HEADER_PREFIX: &str = "HTTP_";

/// Variables que recibe un hijo CGI por un request concreto
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CgiEnvironment {
    query_string: Option<OsString>,
    vars: Vec<(OsString, OsString)>,
}

impl CgiEnvironment {
    /// `QUERY_STRING` crudo y `HTTP_<NOMBRE>` con el valor ya decodificado
    ///
    /// # Ejemplo
    /// ```
    /// use cgi_httpd::http::Request;
    /// use cgi_httpd::server::cgi::CgiEnvironment;
    ///
    /// let request = Request::parse(b"GET /a.cgi?x=%41 HTTP/1.0\r\nCookie: id=7\r\n\r\n").unwrap();
    /// let env = CgiEnvironment::from_request(&request);
    ///
    /// assert_eq!(env.get("QUERY_STRING").unwrap(), "x=%41");
    /// assert_eq!(env.get("HTTP_COOKIE").unwrap(), "id=7");
    /// ```
    pub fn from_request(request: &Request) -> Self {
        let vars = request
            .headers()
            .iter()
            .map(|(name, value)| {
                let mut var = OsString::from(HEADER_PREFIX);
                var.push(name);
                (var, value.clone())
            })
            .collect();

        Self {
            query_string: request.query_string().map(OsStr::to_os_string),
            vars,
        }
    }

    pub fn get(&self, name: &str) -> Option<&OsString> {
        if name == QUERY_STRING {
            return self.query_string.as_ref();
        }
        self.vars.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Aplica las variables a `cmd`. Sin query string se quita la que el
    /// servidor pudiera haber heredado.
    pub fn apply(&self, cmd: &mut Command) {
        match &self.query_string {
            Some(query) => cmd.env(QUERY_STRING, query),
            None => cmd.env_remove(QUERY_STRING),
        };
        cmd.envs(self.vars.iter().map(|(n, v)| (n, v)));
    }
}

/// Arma el `Command` del hijo con stdout/stderr ya apuntando a `output`
pub fn build_command(script: &Path, env: &CgiEnvironment, stdout: OwnedFd, stderr: OwnedFd) -> Command {
    let mut cmd = Command::new(script);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr));
    env.apply(&mut cmd);
    cmd
}

/// Corre el CGI y espera a que termine.
///
/// Falla con `ServerError::Process` solo si el hijo no se pudo crear
/// (incluido un `exec` fallido); en ese caso todavía no se escribió nada
/// al cliente. El exit status se loguea pero no afecta la respuesta.
pub fn run(conn: &mut Connection, target: &ResolvedTarget, request: &Request) -> ServerResult<()> {
    let process_error = |source| ServerError::Process {
        path: request.path().to_string_lossy().into_owned(),
        source,
    };

    conn.flush()?;

    let env = CgiEnvironment::from_request(request);
    let stdout = conn.output_fd().map_err(process_error)?;
    let stderr = conn.output_fd().map_err(process_error)?;

    // El Command se descarta al salir del bloque y con él las copias del
    // socket que tenía el padre
    let mut child = {
        let mut cmd = build_command(&target.path, &env, stdout, stderr);
        cmd.spawn().map_err(process_error)?
    };
    debug!("spawned CGI {} (pid {})", target.path.display(), child.id());

    match child.wait() {
        Ok(status) => {
            debug!("CGI {} exited: {}", target.path.display(), status);
        }
        Err(e) => {
            // No se puede mandar otra respuesta: el hijo ya pudo haber escrito
            error!("   ❌ waiting for CGI {} failed: {}", target.path.display(), e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::process::Output;

    fn run_with_env(script_body: &str, env: &CgiEnvironment) -> Output {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("env.cgi");
        fs::write(&script, script_body).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let mut cmd = Command::new(&script);
        cmd.stdin(Stdio::null());
        env.apply(&mut cmd);
        cmd.output().unwrap()
    }

    #[test]
    fn test_environment_from_request() {
        let raw = b"GET /x.cgi?a=1&b=%20 HTTP/1.0\r\nUser-Agent: t%2F1\r\nX-Y_z: v\r\n\r\n";
        let request = Request::parse(raw).unwrap();
        let env = CgiEnvironment::from_request(&request);

        assert_eq!(env.get(QUERY_STRING).unwrap(), "a=1&b=%20");
        assert_eq!(env.get("HTTP_USER-AGENT").unwrap(), "t/1");
        assert_eq!(env.get("HTTP_X-Y_Z").unwrap(), "v");
        assert!(env.get("HTTP_HOST").is_none());
    }

    #[test]
    fn test_no_query_string() {
        let request = Request::parse(b"GET /x.cgi HTTP/1.0\r\n\r\n").unwrap();
        let env = CgiEnvironment::from_request(&request);
        assert!(env.get(QUERY_STRING).is_none());
    }

    #[test]
    fn test_child_sees_variables() {
        let request = Request::parse(b"GET /x.cgi?q=1 HTTP/1.0\r\nCookie: k=v\r\n\r\n").unwrap();
        let env = CgiEnvironment::from_request(&request);

        let output = run_with_env("#!/bin/sh\nprintf '%s|%s' \"$QUERY_STRING\" \"$HTTP_COOKIE\"\n", &env);
        assert_eq!(String::from_utf8_lossy(&output.stdout), "q=1|k=v");
    }

    #[test]
    fn test_child_receives_raw_header_bytes() {
        let request = Request::parse(b"GET /x.cgi?n=\xe9 HTTP/1.0\r\nCookie: caf\xe9%FF\r\n\r\n").unwrap();
        let env = CgiEnvironment::from_request(&request);

        let output = run_with_env("#!/bin/sh\nprintf '%s|%s' \"$QUERY_STRING\" \"$HTTP_COOKIE\"\n", &env);
        assert_eq!(output.stdout, b"n=\xe9|caf\xe9\xff");
    }

    #[test]
    fn test_child_without_query_has_no_query_string() {
        let request = Request::parse(b"GET /x.cgi HTTP/1.0\r\n\r\n").unwrap();
        let env = CgiEnvironment::from_request(&request);

        let output = run_with_env("#!/bin/sh\nprintf '%s' \"${QUERY_STRING-unset}\"\n", &env);
        assert_eq!(String::from_utf8_lossy(&output.stdout), "unset");
    }

    #[test]
    fn test_parent_environment_untouched() {
        let request = Request::parse(b"GET /x.cgi HTTP/1.0\r\nX-Parent-Check: 1\r\n\r\n").unwrap();
        let env = CgiEnvironment::from_request(&request);
        let mut cmd = Command::new("/bin/true");
        env.apply(&mut cmd);

        assert!(std::env::var_os("HTTP_X-PARENT-CHECK").is_none());
    }
}
