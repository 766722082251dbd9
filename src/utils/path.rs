use std::env;
use std::path::{Path, PathBuf};

use cfg_if::cfg_if;

/// Resolve `program` the way a shell would: names containing a path separator
/// are taken as-is, bare names are searched in every `PATH` entry.
pub fn find_executable(program: &str) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return is_executable(direct).then(|| direct.to_path_buf());
    }
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .flat_map(|dir| candidates(&dir, program))
        .find(|candidate| is_executable(candidate))
}

cfg_if! {
    if #[cfg(unix)] {
        fn candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
            vec![dir.join(program)]
        }

        fn is_executable(path: &Path) -> bool {
            use std::os::unix::fs::PermissionsExt;
            path.metadata()
                .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
                .unwrap_or(false)
        }
    } else {
        fn candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
            let mut found = vec![dir.join(program)];
            let exts = env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string());
            for ext in exts.split(';').filter(|ext| !ext.is_empty()) {
                found.push(dir.join(format!("{program}{ext}")));
            }
            found
        }

        fn is_executable(path: &Path) -> bool {
            path.is_file()
        }
    }
}
