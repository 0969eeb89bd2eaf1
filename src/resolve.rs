//! # Resolución de paths
//! src/resolve.rs
//!
//! Traduce el path decodificado de un request a un archivo bajo el
//! document root y decide cómo servirlo:
//!
//! ```text
//! <root>/<path> ──dir──▶ <root>/<path>/index.html
//!      │
//!      ├─ regular con bit x del dueño ─▶ Executable (CGI)
//!      ├─ regular ─────────────────────▶ StaticFile
//!      └─ no existe / fuera del root ──▶ NotFound
//! ```
//!
//! El path se canonicaliza y tiene que quedar dentro del root canonizado;
//! `..` o symlinks que salen del root se reportan como NotFound.

use crate::error::{ServerError, ServerResult};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Archivo que se sirve cuando el path apunta a un directorio
pub const INDEX_FILE: &str = "index.html";

/// Bit de ejecución del dueño (S_IXUSR)
const OWNER_EXEC: u32 = 0o100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    StaticFile,
    Executable,
}

/// Archivo resuelto, listo para servir o ejecutar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Path canónico dentro del document root
    pub path: PathBuf,
    pub kind: TargetKind,
}

/// Resuelve `request_path` bajo `root`.
///
/// `root` tiene que estar canonizado (ver `ServeContext`). Los errores de
/// resolución son siempre `ServerError::NotFound` con el path del request,
/// nunca con el path del filesystem.
pub fn resolve(root: &Path, request_path: &OsStr) -> ServerResult<ResolvedTarget> {
    let not_found = || ServerError::NotFound(request_path.to_string_lossy().into_owned());

    // root + "/" + path; `Path::join` descartaría el root si el path es absoluto
    let mut candidate = OsString::from(root.as_os_str());
    candidate.push("/");
    candidate.push(request_path);

    let mut path = contained(root, Path::new(&candidate)).ok_or_else(not_found)?;
    let mut metadata = fs::metadata(&path).map_err(|_| not_found())?;

    if metadata.is_dir() {
        path = contained(root, &path.join(INDEX_FILE)).ok_or_else(not_found)?;
        metadata = fs::metadata(&path).map_err(|_| not_found())?;
    }

    // Directorios anidados sin index, FIFOs, dispositivos, sockets
    if !metadata.is_file() {
        return Err(not_found());
    }

    let kind = if metadata.permissions().mode() & OWNER_EXEC != 0 {
        TargetKind::Executable
    } else {
        TargetKind::StaticFile
    };

    Ok(ResolvedTarget { path, kind })
}

/// Canonicaliza `candidate` y verifica que siga bajo `root`
fn contained(root: &Path, candidate: &Path) -> Option<PathBuf> {
    let canonical = fs::canonicalize(candidate).ok()?;
    canonical.starts_with(root).then_some(canonical)
}
