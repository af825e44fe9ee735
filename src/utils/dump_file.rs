use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use log::debug;

/// Copy a file into the report under a section header.
///
/// Unreadable or missing files are skipped silently (debug log only) and
/// `false` is returned. Read errors after the header has been written end
/// the section early.
pub fn dump_file(sink: &mut dyn Write, title: &str, path: &Path) -> bool {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            debug!("Skipping {} ({}): {}", title, path.display(), e);
            return false;
        }
    };

    let _ = writeln!(sink, "------ {} ({}) ------", title, path.display());

    // sysfs and debugfs nodes report a size of zero, so copy until EOF instead of trusting metadata
    match io::copy(&mut file, sink) {
        Ok(_) => true,
        Err(e) => {
            debug!("Error reading {} ({}): {}", title, path.display(), e);
            let _ = writeln!(sink, "*** {}: {}", path.display(), e);
            true
        }
    }
}

/// Readability probe used by guarded sections (`access(path, R_OK)` semantics).
pub fn is_readable(path: &Path) -> bool {
    if path.is_dir() {
        std::fs::read_dir(path).is_ok()
    } else {
        File::open(path).is_ok()
    }
}
