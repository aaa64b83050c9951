//! Library-name resolution against a `-L` search path, matching the
//! original driver's `find_lib`: try each directory in order, then the
//! current directory, looking for `<name>.letin`.

use std::path::{Path, PathBuf};

pub fn find_lib(name: &str, lib_dirs: &[PathBuf]) -> Option<PathBuf> {
    let file_name = format!("{name}.letin");
    for dir in lib_dirs {
        let candidate = dir.join(&file_name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    let candidate = Path::new(&file_name);
    candidate.is_file().then(|| candidate.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_a_library_in_a_search_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("io.letin"), b"").unwrap();
        let found = find_lib("io", &[dir.path().to_path_buf()]);
        assert_eq!(found, Some(dir.path().join("io.letin")));
    }

    #[test]
    fn reports_nothing_when_no_directory_has_it() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_lib("missing", &[dir.path().to_path_buf()]), None);
    }
}
